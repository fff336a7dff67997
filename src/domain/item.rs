use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    ops::Deref,
    str::FromStr,
};

use non_empty_string::NonEmptyString;
use serde_yaml::Value;

use super::Level;

/// A validated item identifier, unique within a tree (e.g. `REQ-001`).
///
/// Identifiers appear verbatim in rendered output (headings, labels, link
/// lists), so they must be non-empty and free of whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Uid(NonEmptyString);

impl Uid {
    /// Creates a new `Uid` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUidError`] if the string is empty or contains
    /// whitespace.
    pub fn new(s: String) -> Result<Self, InvalidUidError> {
        let non_empty = NonEmptyString::new(s.clone()).map_err(|_| InvalidUidError(s.clone()))?;

        if s.chars().any(char::is_whitespace) {
            return Err(InvalidUidError(s));
        }

        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Uid {
    type Error = InvalidUidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Uid {
    type Error = InvalidUidError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for Uid {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Uid {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Uid {
    type Err = InvalidUidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Error returned when a string is not a usable item identifier.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid item identifier '{0}': must be non-empty and contain no whitespace")]
pub struct InvalidUidError(String);

/// An external file reference in the current scheme.
///
/// `path` names the referenced file; the optional `keyword` locates a line
/// within it when the reference is verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalReference {
    path: String,
    keyword: Option<String>,
}

impl ExternalReference {
    /// Creates a reference to `path`, optionally located by `keyword`.
    #[must_use]
    pub const fn new(path: String, keyword: Option<String>) -> Self {
        Self { path, keyword }
    }

    /// The referenced path as stored, unresolved.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The line-locating keyword, if any.
    #[must_use]
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }
}

/// The external references carried by an item.
///
/// The legacy single-reference scheme and the current multi-reference scheme
/// are mutually exclusive; holding them as variants makes the conflicting
/// state unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum References {
    /// No external references.
    #[default]
    None,
    /// The deprecated single-keyword scheme: one path or search keyword.
    Legacy(String),
    /// The current scheme: an ordered list of file references.
    Current(Vec<ExternalReference>),
}

impl References {
    /// `true` when no reference would render.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Legacy(_) => false,
            Self::Current(refs) => refs.is_empty(),
        }
    }
}

/// Lifecycle flags carried by an item.
///
/// These are not rendering-relevant: inactive or unreviewed items publish the
/// same as any other. They are surfaced by `check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    /// Whether the item is part of the active set.
    pub active: bool,
    /// Whether the item is derived and so exempt from parent-link coverage.
    pub derived: bool,
    /// Whether the item has been reviewed.
    pub reviewed: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            active: true,
            derived: false,
            reviewed: false,
        }
    }
}

/// A single requirement record: structured attributes plus a markdown-subset
/// text body.
///
/// Items are loaded by the storage layer and treated as read-only views during
/// a render pass.
#[derive(Debug, Clone)]
pub struct Item {
    uid: Uid,
    level: Level,
    header: Option<String>,
    text: String,
    normative: bool,
    lifecycle: Lifecycle,
    links: BTreeSet<Uid>,
    references: References,
    attributes: BTreeMap<String, Value>,
}

impl Item {
    /// Creates a normative item with the given identifier and level, no body,
    /// and no relationships.
    #[must_use]
    pub fn new(uid: Uid, level: Level) -> Self {
        Self {
            uid,
            level,
            header: None,
            text: String::new(),
            normative: true,
            lifecycle: Lifecycle::default(),
            links: BTreeSet::new(),
            references: References::None,
            attributes: BTreeMap::new(),
        }
    }

    /// The item's identifier.
    #[must_use]
    pub const fn uid(&self) -> &Uid {
        &self.uid
    }

    /// The item's level.
    #[must_use]
    pub const fn level(&self) -> &Level {
        &self.level
    }

    /// The optional free-text title.
    #[must_use]
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// The markdown-subset body text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the item states a binding requirement.
    ///
    /// Non-normative items render their header alone, with no identifier
    /// suffix and tighter heading spacing.
    #[must_use]
    pub const fn is_normative(&self) -> bool {
        self.normative
    }

    /// The item's lifecycle flags.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// The identifiers of this item's parents, in sorted order.
    pub fn links(&self) -> impl Iterator<Item = &Uid> + '_ {
        self.links.iter()
    }

    /// `true` when the item links to at least one parent.
    #[must_use]
    pub fn has_links(&self) -> bool {
        !self.links.is_empty()
    }

    /// The item's external references.
    #[must_use]
    pub const fn references(&self) -> &References {
        &self.references
    }

    /// Custom attributes: keys outside the standard schema, in sorted order.
    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Sets the header. An empty header is normalized to none.
    pub fn set_header(&mut self, header: Option<String>) {
        self.header = header.filter(|h| !h.is_empty());
    }

    /// Sets the body text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Sets whether the item is normative.
    pub fn set_normative(&mut self, normative: bool) {
        self.normative = normative;
    }

    /// Sets the lifecycle flags.
    pub fn set_lifecycle(&mut self, lifecycle: Lifecycle) {
        self.lifecycle = lifecycle;
    }

    /// Adds a parent link. Duplicates collapse.
    pub fn add_link(&mut self, parent: Uid) {
        self.links.insert(parent);
    }

    /// Sets the external references.
    pub fn set_references(&mut self, references: References) {
        self.references = references;
    }

    /// Adds a custom attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }
}
