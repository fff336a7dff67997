//! Rendering documents and trees into publishable artifacts.
//!
//! A [`Format`] turns items into lines of output; everything else in this
//! module is the plumbing shared between formats: the render context, the
//! reference resolver seam, and the document and tree iteration helpers.
//! Filenames and I/O live in [`pipeline`].

use std::num::NonZeroUsize;

use crate::domain::{Document, ExternalReference, Item, Settings, Tree};

pub mod latex;
pub use latex::Latex;

pub mod pipeline;
pub use pipeline::{PublishError, publish};

/// Extra heading depth applied to every item in a document.
///
/// When a tree is published in one pass, child documents continue their
/// parent's heading hierarchy instead of restarting at the top level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Nesting(usize);

impl Nesting {
    /// A nesting of `offset` extra heading levels.
    #[must_use]
    pub const fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// The number of extra heading levels.
    #[must_use]
    pub const fn offset(self) -> usize {
        self.0
    }
}

/// An external reference resolved against the tree's working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// Path to the referenced file, relative to the tree root.
    pub path: String,

    /// One-based line of the first keyword match, when one was found.
    pub line: Option<NonZeroUsize>,
}

/// Looks up external references in the environment a tree was loaded from.
///
/// Rendering itself never touches the filesystem; an implementation decides
/// what a reference path or keyword means.
pub trait ResolveReference {
    /// Resolves a path reference, locating its keyword if one is given.
    fn resolve(&self, reference: &ExternalReference) -> Option<ResolvedReference>;

    /// Resolves a bare keyword by searching for a file that matches it.
    fn resolve_legacy(&self, keyword: &str) -> Option<ResolvedReference>;
}

/// A resolver that never finds anything.
///
/// Rendering falls back to the stored form of each reference, which is also
/// the behaviour when reference checking is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl ResolveReference for NoResolver {
    fn resolve(&self, _reference: &ExternalReference) -> Option<ResolvedReference> {
        None
    }

    fn resolve_legacy(&self, _keyword: &str) -> Option<ResolvedReference> {
        None
    }
}

/// Everything a format needs to render one item.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    settings: &'a Settings,
    nesting: Nesting,
    resolver: &'a dyn ResolveReference,
}

impl<'a> RenderContext<'a> {
    /// A context with no extra heading depth.
    #[must_use]
    pub fn new(settings: &'a Settings, resolver: &'a dyn ResolveReference) -> Self {
        Self {
            settings,
            nesting: Nesting::default(),
            resolver,
        }
    }

    /// The same context, offset by `nesting` extra heading levels.
    #[must_use]
    pub const fn with_nesting(mut self, nesting: Nesting) -> Self {
        self.nesting = nesting;
        self
    }

    /// The publication settings in force.
    #[must_use]
    pub const fn settings(&self) -> &'a Settings {
        self.settings
    }

    /// The heading-depth offset of the document being rendered.
    #[must_use]
    pub const fn nesting(&self) -> Nesting {
        self.nesting
    }

    /// The reference resolver.
    #[must_use]
    pub const fn resolver(&self) -> &'a dyn ResolveReference {
        self.resolver
    }
}

/// A publishable output format.
///
/// Formats render line sequences. Joining lines into file content, choosing
/// filenames, and writing artifacts are the pipeline's concern.
pub trait Format {
    /// The file extension of artifacts in this format, without the dot.
    fn extension(&self) -> &'static str;

    /// The lines for one item, ending with a blank separator line.
    fn item_lines(&self, item: &Item, context: RenderContext<'_>) -> Vec<String>;

    /// The lines of the standalone wrapper that compiles one document.
    fn wrapper_lines(&self, document: &Document) -> Vec<String>;

    /// The lines of the script that turns published artifacts into output.
    fn compile_lines(&self, tree: &Tree) -> Vec<String>;

    /// The lines of the traceability matrix for `tree`.
    fn traceability_lines(&self, tree: &Tree) -> Vec<String>;
}

/// Looks up the format that publishes files with `extension`.
#[must_use]
pub fn for_extension(extension: &str) -> Option<&'static dyn Format> {
    match extension {
        "tex" => Some(&Latex),
        _ => None,
    }
}

/// Renders every item of `document` in level order.
pub fn document_lines<F>(
    format: &F,
    document: &Document,
    context: RenderContext<'_>,
) -> Vec<String>
where
    F: Format + ?Sized,
{
    document
        .items_by_level()
        .into_iter()
        .flat_map(|item| format.item_lines(item, context))
        .collect()
}

/// The documents of `tree` in publication order, paired with their nesting.
pub fn tree_documents(tree: &Tree) -> impl Iterator<Item = (Nesting, &Document)> {
    tree.documents_depth_first()
        .into_iter()
        .map(|(depth, document)| (Nesting::new(depth), document))
}

/// Joins rendered lines into file content with a trailing newline.
#[must_use]
pub fn join_lines(lines: &[String]) -> String {
    let mut content = lines.join("\n");
    content.push('\n');
    content
}
