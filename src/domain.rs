//! Domain models for requirements publishing.
//!
//! This module contains the core item and document types, the publication
//! settings, and the tree that arranges documents for rendering.

/// Requirement items: identifiers, lifecycle, links, and references.
pub mod item;
pub use item::{ExternalReference, InvalidUidError, Item, Lifecycle, References, Uid};

mod level;
pub use level::{InvalidLevelError, Level};

mod document;
pub use document::{Document, InvalidPrefixError, Prefix};

mod settings;
pub use settings::Settings;

pub mod tree;
pub use tree::{Tree, TreeError};
