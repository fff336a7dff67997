//! Locates the targets of external references under the requirements root.

use std::{
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use regex::Regex;
use walkdir::WalkDir;

use crate::{
    domain::ExternalReference,
    publish::{ResolveReference, ResolvedReference},
};

/// Resolves references by searching the requirements root on disk.
///
/// A current-scheme reference resolves when its path exists under the root;
/// the optional keyword narrows the result to a 1-based line in that file. A
/// legacy reference resolves against the first file, in path order, whose
/// name matches the keyword or whose contents mention it. Unreadable and
/// binary files are skipped, as are item files themselves (the keyword being
/// searched for is stored in them).
#[derive(Debug)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    /// Creates a resolver rooted at the given directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResolveReference for FileResolver {
    fn resolve(&self, reference: &ExternalReference) -> Option<ResolvedReference> {
        let target = self.root.join(reference.path());
        if !target.is_file() {
            return None;
        }

        let line = reference
            .keyword()
            .and_then(|keyword| keyword_line(&target, keyword));

        Some(ResolvedReference {
            path: reference.path().to_string(),
            line,
        })
    }

    fn resolve_legacy(&self, keyword: &str) -> Option<ResolvedReference> {
        for path in search_paths(&self.root) {
            let relative = path.strip_prefix(&self.root).unwrap_or(&path);

            if path.file_name().and_then(|name| name.to_str()) == Some(keyword) {
                return Some(ResolvedReference {
                    path: relative.display().to_string(),
                    line: None,
                });
            }

            if is_item_extension(&path) {
                continue;
            }

            if let Some(line) = keyword_line(&path, keyword) {
                return Some(ResolvedReference {
                    path: relative.display().to_string(),
                    line: Some(line),
                });
            }
        }

        None
    }
}

/// Finds the first line mentioning `keyword`, bounded so that a bare
/// substring inside a longer word does not count.
fn keyword_line(path: &Path, keyword: &str) -> Option<NonZeroUsize> {
    let pattern = Regex::new(&format!(r"(\b|\W){}(\b|\W)", regex::escape(keyword))).ok()?;
    let contents = fs::read_to_string(path).ok()?;

    contents
        .lines()
        .position(|line| pattern.is_match(line))
        .and_then(|index| NonZeroUsize::new(index + 1))
}

fn search_paths(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden_directory(entry))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
}

fn is_hidden_directory(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_item_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "yml" | "yaml"))
}
