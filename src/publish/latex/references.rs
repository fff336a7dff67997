//! Quote blocks for an item's external references.

use std::num::NonZeroUsize;

use crate::{domain::References, publish::ResolveReference};

/// Renders one quote line per reference.
///
/// With reference checking disabled the stored form is shown verbatim and
/// the resolver is never consulted. With checking enabled, a reference that
/// resolves shows its resolved path and keyword line; one that does not
/// falls back to the stored form.
pub(super) fn quote_lines(
    references: &References,
    check_ref: bool,
    resolver: &dyn ResolveReference,
) -> Vec<String> {
    match references {
        References::None => Vec::new(),
        References::Legacy(keyword) => {
            let resolved = check_ref
                .then(|| resolver.resolve_legacy(keyword))
                .flatten();
            vec![resolved.map_or_else(
                || quote_line(keyword, None),
                |found| quote_line(&found.path, found.line),
            )]
        }
        References::Current(references) => references
            .iter()
            .map(|reference| {
                let resolved = check_ref.then(|| resolver.resolve(reference)).flatten();
                resolved.map_or_else(
                    || quote_line(reference.path(), None),
                    |found| quote_line(&found.path, found.line),
                )
            })
            .collect(),
    }
}

/// One quote block, with the keyword's line number when one was found.
fn quote_line(path: &str, line: Option<NonZeroUsize>) -> String {
    let path = path.replace('\\', "/");
    line.map_or_else(
        || format!(r"\begin{{quote}} \verb|{path}|\end{{quote}}"),
        |line| format!(r"\begin{{quote}} \verb|{path}| (line {line})\end{{quote}}"),
    )
}
