pub mod directory;
mod resolver;
mod yaml;

pub use directory::{DOCUMENT_MARKER, InvalidItemsError, LoadError, load_tree};
pub use resolver::FileResolver;
pub use yaml::ParseError;
