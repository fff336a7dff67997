use std::{fmt, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;

use super::Item;

/// A validated document prefix: the identifier namespace of a document (e.g.
/// `REQ`), also its output file stem.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Prefix(NonEmptyString);

impl Prefix {
    /// Creates a new `Prefix` from a string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPrefixError`] if the string is empty or contains
    /// whitespace.
    pub fn new(s: String) -> Result<Self, InvalidPrefixError> {
        let non_empty =
            NonEmptyString::new(s.clone()).map_err(|_| InvalidPrefixError(s.clone()))?;

        if s.chars().any(char::is_whitespace) {
            return Err(InvalidPrefixError(s));
        }

        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for Prefix {
    type Error = InvalidPrefixError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Prefix {
    type Error = InvalidPrefixError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for Prefix {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Prefix {
    type Err = InvalidPrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Error returned when a string is not a usable document prefix.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid document prefix '{0}': must be non-empty and contain no whitespace")]
pub struct InvalidPrefixError(String);

/// An ordered collection of [`Item`]s sharing a prefix namespace.
///
/// A document may name a parent document by prefix; that expresses tree
/// structure, not ownership.
#[derive(Debug, Clone)]
pub struct Document {
    prefix: Prefix,
    parent: Option<Prefix>,
    title: Option<String>,
    items: Vec<Item>,
}

impl Document {
    /// Creates an empty root document.
    #[must_use]
    pub const fn new(prefix: Prefix) -> Self {
        Self {
            prefix,
            parent: None,
            title: None,
            items: Vec::new(),
        }
    }

    /// The document's prefix.
    #[must_use]
    pub const fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// The prefix of the parent document, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Prefix> {
        self.parent.as_ref()
    }

    /// The human-readable title used by the published wrapper, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Sets the parent prefix.
    pub fn set_parent(&mut self, parent: Option<Prefix>) {
        self.parent = parent;
    }

    /// Sets the title. An empty title is normalized to none.
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title.filter(|t| !t.is_empty());
    }

    /// Appends an item in load order.
    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// The document's items, in load order.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// The document's items in render order: ascending level, stable on ties
    /// (items sharing a level keep their load order).
    #[must_use]
    pub fn items_by_level(&self) -> Vec<&Item> {
        let mut items: Vec<&Item> = self.items.iter().collect();
        items.sort_by(|a, b| a.level().cmp(b.level()));
        items
    }
}
