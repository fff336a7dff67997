//! Plain-text requirements publishing.
//!
//! Requirement items are YAML documents stored in a directory tree. This
//! crate loads them, arranges their documents for publication, and renders
//! them into LaTeX artifacts ready to compile.

pub mod domain;
pub use domain::{Document, Item, Level, Prefix, Settings, Tree, Uid};

pub mod publish;
pub use publish::{Format, Latex, PublishError, publish};

/// Filesystem storage for requirement documents.
pub mod storage;
pub use storage::{FileResolver, LoadError, load_tree};
