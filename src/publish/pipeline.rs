//! Writes rendered documents and their supporting artifacts to disk.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, instrument};

use super::{RenderContext, document_lines, for_extension, join_lines, tree_documents};
use crate::{
    domain::{Settings, Tree},
    storage::FileResolver,
};

/// Errors that can occur while writing publication artifacts.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// No output format is registered for the requested extension.
    #[error("unsupported output format `{0}`")]
    UnsupportedFormat(String),

    /// An artifact could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        /// The artifact that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

/// Renders every document in `tree` and writes all publication artifacts
/// into `output`.
///
/// Each document produces a body file named after its prefix and a
/// standalone `doc-` wrapper that compiles it. A `compile.sh` script and the
/// traceability matrix round out the set. `root` is the requirements root,
/// searched when reference checking is enabled. The output directory is
/// created if absent; existing artifacts are truncated.
///
/// Returns the paths written, in order.
///
/// # Errors
///
/// Returns an error if `extension` names no known format or if any artifact
/// cannot be written.
#[instrument(skip(tree, settings))]
pub fn publish(
    tree: &Tree,
    settings: &Settings,
    root: &Path,
    output: &Path,
    extension: &str,
) -> Result<Vec<PathBuf>, PublishError> {
    let format = for_extension(extension)
        .ok_or_else(|| PublishError::UnsupportedFormat(extension.to_string()))?;
    let extension = format.extension();

    fs::create_dir_all(output).map_err(|source| PublishError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    let resolver = FileResolver::new(root);
    let mut written = Vec::new();

    for (nesting, document) in tree_documents(tree) {
        let context = RenderContext::new(settings, &resolver).with_nesting(nesting);

        written.push(write_artifact(
            &output.join(format!("{}.{extension}", document.prefix())),
            &join_lines(&document_lines(format, document, context)),
        )?);

        written.push(write_artifact(
            &output.join(format!("doc-{}.{extension}", document.prefix())),
            &join_lines(&format.wrapper_lines(document)),
        )?);
    }

    written.push(write_artifact(
        &output.join("compile.sh"),
        &join_lines(&format.compile_lines(tree)),
    )?);

    written.push(write_artifact(
        &output.join(format!("traceability.{extension}")),
        &join_lines(&format.traceability_lines(tree)),
    )?);

    Ok(written)
}

fn write_artifact(path: &Path, contents: &str) -> Result<PathBuf, PublishError> {
    debug!("writing {}", path.display());

    fs::write(path, contents).map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(path.to_path_buf())
}
