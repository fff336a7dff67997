//! YAML schemas for item and document files.
//!
//! Files on disk hold one flat YAML mapping each. The structs here mirror
//! that layout and convert into the domain types; every key the item schema
//! does not recognize is kept as a custom attribute.

use std::{collections::BTreeMap, io};

use nonempty::nonempty;
use serde::Deserialize;
use serde_yaml::Value;

use crate::domain::{
    Document, ExternalReference, InvalidPrefixError, InvalidUidError, Item, Level, Lifecycle,
    Prefix, References, Uid,
};

/// Errors that can occur when parsing an item or document file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The file could not be read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The YAML is malformed or a recognized field has the wrong shape.
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// Both the legacy `ref` field and the `references` list are populated.
    #[error("both `ref` and `references` are populated")]
    ConflictingReferences,

    /// A link target or file stem is not a valid item identifier.
    #[error(transparent)]
    Uid(#[from] InvalidUidError),

    /// The document prefix or parent prefix is invalid.
    #[error(transparent)]
    Prefix(#[from] InvalidPrefixError),
}

/// On-disk form of a single item.
///
/// `level` tolerates the number forms YAML readers produce as well as the
/// dotted string form. Unrecognized keys land in `extra` and become custom
/// attributes on the converted [`Item`].
#[derive(Debug, Deserialize)]
pub(crate) struct ItemFile {
    #[serde(default = "default_level")]
    level: Level,
    #[serde(default)]
    header: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default = "default_true")]
    normative: bool,
    #[serde(default = "default_true")]
    active: bool,
    #[serde(default)]
    derived: bool,
    #[serde(default)]
    reviewed: bool,
    #[serde(default)]
    links: Vec<LinkEntry>,
    #[serde(default, rename = "ref")]
    legacy_ref: Option<String>,
    #[serde(default)]
    references: Option<Vec<ReferenceEntry>>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

/// A single entry in the `links` sequence.
///
/// Plain strings are the common form. Writers that fingerprint their links
/// store single-entry mappings of identifier to fingerprint instead; the
/// fingerprint is irrelevant for publishing and is dropped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LinkEntry {
    Plain(String),
    Fingerprinted(BTreeMap<String, Value>),
}

impl LinkEntry {
    fn into_uid(self) -> Result<Uid, InvalidUidError> {
        match self {
            Self::Plain(uid) => Uid::new(uid),
            Self::Fingerprinted(map) => Uid::new(map.into_keys().next().unwrap_or_default()),
        }
    }
}

/// A single entry in the current-scheme `references` sequence.
///
/// The on-disk mapping also carries a `type` key (always `file`); it is
/// ignored here, as unknown keys are everywhere below the item level.
#[derive(Debug, Deserialize)]
struct ReferenceEntry {
    path: String,
    #[serde(default)]
    keyword: Option<String>,
}

impl ItemFile {
    /// Reads an item file from a reader.
    pub(crate) fn read<R: io::Read>(reader: R) -> Result<Self, ParseError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Converts the parsed file into a domain [`Item`] with the given
    /// identifier.
    pub(crate) fn into_item(self, uid: Uid) -> Result<Item, ParseError> {
        let references = self.references()?;

        let mut item = Item::new(uid, self.level);
        item.set_header(self.header);
        item.set_text(self.text);
        item.set_normative(self.normative);
        item.set_lifecycle(Lifecycle {
            active: self.active,
            derived: self.derived,
            reviewed: self.reviewed,
        });
        for link in self.links {
            item.add_link(link.into_uid()?);
        }
        item.set_references(references);
        for (key, value) in self.extra {
            item.set_attribute(key, value);
        }

        Ok(item)
    }

    fn references(&self) -> Result<References, ParseError> {
        let legacy = self.legacy_ref.as_deref().filter(|s| !s.is_empty());
        let current = self.references.as_deref().filter(|r| !r.is_empty());

        match (legacy, current) {
            (Some(_), Some(_)) => Err(ParseError::ConflictingReferences),
            (Some(keyword), None) => Ok(References::Legacy(keyword.to_string())),
            (None, Some(entries)) => Ok(References::Current(
                entries
                    .iter()
                    .map(|entry| {
                        ExternalReference::new(entry.path.clone(), entry.keyword.clone())
                    })
                    .collect(),
            )),
            (None, None) => Ok(References::None),
        }
    }
}

/// On-disk form of a document marker file.
#[derive(Debug, Deserialize)]
pub(crate) struct DocumentFile {
    prefix: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

impl DocumentFile {
    /// Reads a document marker file from a reader.
    pub(crate) fn read<R: io::Read>(reader: R) -> Result<Self, ParseError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Converts the parsed file into an (empty) domain [`Document`].
    pub(crate) fn into_document(self) -> Result<Document, ParseError> {
        let mut document = Document::new(Prefix::new(self.prefix)?);
        document.set_parent(self.parent.map(Prefix::new).transpose()?);
        document.set_title(self.title);
        Ok(document)
    }
}

fn default_level() -> Level {
    Level::new(nonempty![1, 0])
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn parse_item(yaml: &str) -> Item {
        let file = ItemFile::read(Cursor::new(yaml)).unwrap();
        file.into_item(Uid::new("req1".to_string()).unwrap())
            .unwrap()
    }

    #[test]
    fn minimal_item_uses_defaults() {
        let item = parse_item("level: 1.2\n");

        assert_eq!(item.level().to_string(), "1.2");
        assert_eq!(item.header(), None);
        assert_eq!(item.text(), "");
        assert!(item.is_normative());
        assert!(item.lifecycle().active);
        assert!(!item.lifecycle().derived);
        assert!(!item.lifecycle().reviewed);
        assert!(!item.has_links());
        assert!(item.references().is_empty());
        assert!(item.attributes().is_empty());
    }

    #[test]
    fn missing_level_defaults_to_one() {
        let item = parse_item("text: something\n");

        assert_eq!(item.level().to_string(), "1.0");
        assert_eq!(item.level().depth(), 1);
    }

    #[test]
    fn numeric_and_string_levels_parse_alike() {
        let from_number = parse_item("level: 2.0\n");
        let from_string = parse_item("level: '2.0'\n");

        assert_eq!(from_number.level(), from_string.level());
        assert_eq!(from_number.level().to_string(), "2.0");
    }

    #[test]
    fn recognized_fields_populate_the_item() {
        let item = parse_item(concat!(
            "level: 2.1\n",
            "header: Scope\n",
            "text: |\n",
            "  The system shall exist.\n",
            "normative: false\n",
            "active: false\n",
            "derived: true\n",
            "reviewed: true\n",
            "links:\n",
            "- sys1\n",
            "- sys2\n",
        ));

        assert_eq!(item.header(), Some("Scope"));
        assert_eq!(item.text(), "The system shall exist.\n");
        assert!(!item.is_normative());
        assert!(!item.lifecycle().active);
        assert!(item.lifecycle().derived);
        assert!(item.lifecycle().reviewed);
        let links: Vec<_> = item.links().map(Uid::as_str).collect();
        assert_eq!(links, vec!["sys1", "sys2"]);
    }

    #[test]
    fn fingerprinted_links_drop_the_fingerprint() {
        let item = parse_item(concat!(
            "level: 1\n",
            "links:\n",
            "- sys2: 7wg1tQaDDGSXpVzypsjyCA\n",
            "- sys1\n",
        ));

        let links: Vec<_> = item.links().map(Uid::as_str).collect();
        assert_eq!(links, vec!["sys1", "sys2"]);
    }

    #[test]
    fn unrecognized_keys_become_custom_attributes() {
        let item = parse_item(concat!(
            "level: 1.2\n",
            "text: words\n",
            "invented-by: jane@example.com\n",
            "CUSTOM-ATTRIB: true\n",
        ));

        assert_eq!(item.attributes().len(), 2);
        assert_eq!(
            item.attributes().get("invented-by"),
            Some(&Value::String("jane@example.com".to_string()))
        );
        assert_eq!(
            item.attributes().get("CUSTOM-ATTRIB"),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn legacy_ref_parses() {
        let item = parse_item("level: 1\nref: abc123\n");

        assert_eq!(item.references(), &References::Legacy("abc123".to_string()));
    }

    #[test]
    fn empty_legacy_ref_means_no_references() {
        let item = parse_item("level: 1\nref: ''\n");

        assert!(item.references().is_empty());
    }

    #[test]
    fn current_references_parse_with_optional_keyword() {
        let item = parse_item(concat!(
            "level: 1\n",
            "references:\n",
            "- path: src/lib.rs\n",
            "  type: file\n",
            "- path: docs/notes.txt\n",
            "  keyword: handshake\n",
        ));

        let References::Current(references) = item.references() else {
            panic!("expected current-scheme references");
        };
        assert_eq!(references.len(), 2);
        assert_eq!(references[0].path(), "src/lib.rs");
        assert_eq!(references[0].keyword(), None);
        assert_eq!(references[1].path(), "docs/notes.txt");
        assert_eq!(references[1].keyword(), Some("handshake"));
    }

    #[test]
    fn populating_both_reference_schemes_is_rejected() {
        let file = ItemFile::read(Cursor::new(concat!(
            "level: 1\n",
            "ref: abc123\n",
            "references:\n",
            "- path: src/lib.rs\n",
        )))
        .unwrap();

        let result = file.into_item(Uid::new("req1".to_string()).unwrap());

        assert!(matches!(result, Err(ParseError::ConflictingReferences)));
    }

    #[test]
    fn empty_reference_list_does_not_conflict_with_legacy_ref() {
        let item = parse_item("level: 1\nref: abc123\nreferences: []\n");

        assert_eq!(item.references(), &References::Legacy("abc123".to_string()));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let result = ItemFile::read(Cursor::new("level: [unclosed\n"));

        assert!(matches!(result, Err(ParseError::Yaml(_))));
    }

    #[test]
    fn invalid_link_identifier_is_rejected() {
        let file = ItemFile::read(Cursor::new("level: 1\nlinks:\n- 'has space'\n")).unwrap();

        let result = file.into_item(Uid::new("req1".to_string()).unwrap());

        assert!(matches!(result, Err(ParseError::Uid(_))));
    }

    #[test]
    fn document_file_parses_prefix_parent_and_title() {
        let file = DocumentFile::read(Cursor::new(concat!(
            "prefix: TST\n",
            "parent: SYS\n",
            "title: Test Specification\n",
        )))
        .unwrap();
        let document = file.into_document().unwrap();

        assert_eq!(document.prefix().as_str(), "TST");
        assert_eq!(document.parent().map(Prefix::as_str), Some("SYS"));
        assert_eq!(document.title(), Some("Test Specification"));
    }

    #[test]
    fn document_file_requires_a_prefix() {
        let result = DocumentFile::read(Cursor::new("title: No prefix here\n"));

        assert!(matches!(result, Err(ParseError::Yaml(_))));
    }

    #[test]
    fn document_prefix_with_whitespace_is_rejected() {
        let file = DocumentFile::read(Cursor::new("prefix: 'not ok'\n")).unwrap();

        let result = file.into_document();

        assert!(matches!(result, Err(ParseError::Prefix(_))));
    }
}
