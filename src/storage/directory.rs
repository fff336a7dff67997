//! Filesystem discovery and loading of requirement documents.
//!
//! A directory containing a [`DOCUMENT_MARKER`] file is a document; every
//! sibling `*.yml`/`*.yaml` file whose name does not start with a dot is an
//! item in that document, identified by its file stem. Item files parse in
//! parallel, and every parse failure is reported together with its path
//! rather than one at a time.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use nonempty::NonEmpty;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, instrument};
use walkdir::WalkDir;

use super::yaml::{DocumentFile, ItemFile, ParseError};
use crate::domain::{Document, Item, Tree, TreeError, Uid};

/// Marker file that turns a directory into a document.
pub const DOCUMENT_MARKER: &str = ".document.yml";

/// Errors that can occur when loading a tree from disk.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A document marker file or directory listing could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A document marker file could not be parsed.
    #[error("invalid document file {path}: {source}")]
    Document {
        /// The marker file that failed to parse.
        path: PathBuf,
        /// What went wrong.
        source: ParseError,
    },

    /// One or more item files could not be parsed.
    #[error(transparent)]
    Items(#[from] InvalidItemsError),

    /// Two documents share a prefix, or two items share an identifier.
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// A batch of item files that failed to parse.
#[derive(Debug, thiserror::Error)]
pub struct InvalidItemsError {
    failures: NonEmpty<(PathBuf, ParseError)>,
}

impl fmt::Display for InvalidItemsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const MAX_DISPLAY: usize = 5;

        write!(f, "invalid item files: ")?;

        let total = self.failures.len();

        let displayed: Vec<String> = self
            .failures
            .iter()
            .take(MAX_DISPLAY)
            .map(|(path, error)| format!("{}: {error}", path.display()))
            .collect();

        let msg = displayed.join(", ");

        if total <= MAX_DISPLAY {
            write!(f, "{msg}")
        } else {
            write!(f, "{msg}... (and {} more)", total - MAX_DISPLAY)
        }
    }
}

/// Loads every document under `root` into a [`Tree`].
///
/// Documents may nest; a nested document owns only the item files directly
/// beside its own marker. Hidden directories (names starting with a dot,
/// which covers the `.publish` configuration directory) are never descended
/// into.
///
/// # Errors
///
/// Returns an error if a marker file cannot be read or parsed, if any item
/// file is malformed (all such files are collected and reported together),
/// or if two documents collide on a prefix or two items on an identifier.
#[instrument]
pub fn load_tree(root: &Path) -> Result<Tree, LoadError> {
    let mut documents = Vec::new();
    let mut failures = Vec::new();

    for dir in document_directories(root) {
        let mut document = read_document(&dir.join(DOCUMENT_MARKER))?;

        let paths = item_paths(&dir)?;
        let (items, errors): (Vec<_>, Vec<_>) = paths
            .par_iter()
            .map(|path| read_item(path).map_err(|error| (path.clone(), error)))
            .partition(Result::is_ok);

        for item in items.into_iter().map(Result::unwrap) {
            document.add_item(item);
        }
        failures.extend(errors.into_iter().map(Result::unwrap_err));

        documents.push(document);
    }

    if let Some(failures) = NonEmpty::from_vec(failures) {
        return Err(InvalidItemsError { failures }.into());
    }

    let mut tree = Tree::default();
    for document in documents {
        tree.insert(document)?;
    }

    debug!(
        documents = tree.document_count(),
        items = tree.item_count(),
        "loaded tree"
    );

    Ok(tree)
}

fn document_directories(root: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| !is_hidden_directory(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == DOCUMENT_MARKER)
        .filter_map(|entry| entry.path().parent().map(Path::to_path_buf))
        .collect();
    dirs.sort();
    dirs
}

fn is_hidden_directory(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

fn read_document(path: &Path) -> Result<Document, LoadError> {
    let file = fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    DocumentFile::read(io::BufReader::new(file))
        .and_then(DocumentFile::into_document)
        .map_err(|source| LoadError::Document {
            path: path.to_path_buf(),
            source,
        })
}

fn item_paths(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_item_file(path))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_item_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let hidden = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_none_or(|name| name.starts_with('.'));
    let yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yml" | "yaml"));
    !hidden && yaml
}

fn read_item(path: &Path) -> Result<Item, ParseError> {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let uid = Uid::new(stem)?;

    let file = fs::File::open(path)?;
    ItemFile::read(io::BufReader::new(file))?.into_item(uid)
}
