//! The LaTeX output format.
//!
//! Rendering is line-oriented: an item becomes a sequence of lines, one
//! blank line separates the stages of an item, and the pipeline joins the
//! lines with newlines when it writes files. The exact strings matter here;
//! the tests pin them down.

use tracing::trace;

use crate::domain::{Document, Item, Tree, Uid};

use super::{Format, RenderContext, tree_documents};

mod attributes;
mod inline;
mod references;

/// The LaTeX [`Format`].
///
/// Output targets `pdflatex` with the `hyperref`, `zref-user`, `graphicx`,
/// and `longtable` packages, which the generated wrapper documents load.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latex;

impl Format for Latex {
    fn extension(&self) -> &'static str {
        "tex"
    }

    fn item_lines(&self, item: &Item, context: RenderContext<'_>) -> Vec<String> {
        trace!(uid = %item.uid(), "rendering item");
        let settings = context.settings();

        // Non-normative headers sit tight against their body text; every
        // other heading is followed by a blank line.
        let tight = !item.is_normative() && item.header().is_some() && settings.enable_headers;

        let mut lines = vec![heading_line(item, context)];
        if !tight {
            lines.push(String::new());
        }

        let mut body = body_lines(item.text());
        if !item.attributes().is_empty() {
            body.extend(attributes::table_lines(item.attributes()));
        }
        if !body.is_empty() {
            lines.extend(body);
            lines.push(String::new());
        }

        if item.has_links() {
            lines.push(links_line(item, settings.publish_child_links));
            lines.push(String::new());
        }

        let quotes =
            references::quote_lines(item.references(), settings.check_ref, context.resolver());
        if !quotes.is_empty() {
            lines.extend(quotes);
            lines.push(String::new());
        }

        // A tight heading with nothing below it still terminates the item.
        if lines.last().is_some_and(|line| !line.is_empty()) {
            lines.push(String::new());
        }

        lines
    }

    fn wrapper_lines(&self, document: &Document) -> Vec<String> {
        let title = document
            .title()
            .unwrap_or_else(|| document.prefix().as_str());

        vec![
            r"\documentclass[a4paper]{article}".to_string(),
            r"\usepackage{graphicx}".to_string(),
            r"\usepackage{longtable}".to_string(),
            r"\usepackage{zref-user}".to_string(),
            r"\usepackage{hyperref}".to_string(),
            format!(r"\title{{{}}}", inline::escape(title)),
            r"\begin{document}".to_string(),
            r"\maketitle".to_string(),
            r"\tableofcontents".to_string(),
            format!(r"\input{{{}.tex}}", document.prefix()),
            r"\end{document}".to_string(),
        ]
    }

    fn compile_lines(&self, tree: &Tree) -> Vec<String> {
        let mut lines = vec!["#!/bin/sh".to_string()];
        for (_, document) in tree_documents(tree) {
            // Two passes, so labels and the table of contents settle.
            let command = format!("pdflatex -halt-on-error doc-{}.tex", document.prefix());
            lines.push(command.clone());
            lines.push(command);
        }
        lines
    }

    fn traceability_lines(&self, tree: &Tree) -> Vec<String> {
        let documents = tree.documents_depth_first();

        let mut column_spec = String::with_capacity(documents.len() * 2 + 1);
        for _ in &documents {
            column_spec.push_str("|l");
        }
        column_spec.push('|');

        let header = documents
            .iter()
            .map(|(_, document)| format!(r"\textbf{{{}}}", document.prefix()))
            .collect::<Vec<_>>()
            .join(" & ");

        let mut lines = vec![
            format!(r"\begin{{longtable}}{{{column_spec}}}"),
            r"\caption{Traceability matrix.}\label{tbl:trace}\zlabel{tbl:trace}\\".to_string(),
            r"\hline".to_string(),
            format!(r"{header}\\"),
            r"\hline".to_string(),
        ];

        for row in tree.traceability() {
            let cells = row
                .into_iter()
                .map(|cell| {
                    cell.map_or_else(
                        || " ".to_string(),
                        |uid| format!(r"\hyperref[{uid}]{{{uid}}}"),
                    )
                })
                .collect::<Vec<_>>()
                .join(" & ");
            lines.push(format!(r"{cells}\\"));
            lines.push(r"\hline".to_string());
        }

        lines.push(r"\end{longtable}".to_string());
        lines
    }
}

/// The heading command for a combined level-plus-nesting depth.
///
/// Depth is capped at the deepest supported command, so deeply nested levels
/// and documents keep producing valid headings.
const fn heading_command(depth: usize) -> &'static str {
    match depth {
        0 | 1 => "section",
        2 => "subsection",
        _ => "subsubsection",
    }
}

fn heading_line(item: &Item, context: RenderContext<'_>) -> String {
    let settings = context.settings();
    let uid = item.uid();

    // Normative items follow the body-numbering setting; heading items
    // follow the heading-numbering setting.
    let numbered = if item.is_normative() {
        settings.publish_body_levels
    } else {
        settings.publish_heading_levels
    };
    let star = if numbered { "" } else { "*" };

    let command = heading_command(context.nesting().offset() + item.level().depth());

    let title = match item.header() {
        Some(header) if item.is_normative() && settings.enable_headers => {
            format!(r"{}{{ \small{{}}{uid}}}", inline::format(header))
        }
        Some(header) if !item.is_normative() => inline::format(header),
        _ => uid.to_string(),
    };

    format!(r"\{command}{star}{{{title}}}\label{{{uid}}}\zlabel{{{uid}}}")
}

fn body_lines(text: &str) -> Vec<String> {
    let mut body: Vec<String> = Vec::new();
    for line in text.lines() {
        if let Some(image) = inline::parse_image(line) {
            attach_line_break(&mut body);
            body.extend(figure_lines(&image));
        } else {
            body.push(inline::format(line));
        }
    }
    while body.last().is_some_and(String::is_empty) {
        body.pop();
    }
    body
}

/// Terminates the paragraph before a figure with a line-break marker.
fn attach_line_break(body: &mut [String]) {
    if let Some(line) = body.iter_mut().rev().find(|line| !line.is_empty()) {
        line.push_str(r"\\");
    }
}

fn figure_lines(image: &inline::Image<'_>) -> [String; 3] {
    let display = image.title.unwrap_or(image.alt);
    let label: String = display.chars().filter(|c| !c.is_whitespace()).collect();

    [
        r"\begin{figure}[h!]\center".to_string(),
        format!(
            r"\includegraphics[width=0.8\textwidth]{{{path}}}\label{{fig:{label}}}\zlabel{{fig:{label}}}\caption{{{caption}}}",
            path = image.path,
            caption = inline::format(display),
        ),
        r"\end{figure}".to_string(),
    ]
}

fn links_line(item: &Item, child_links: bool) -> String {
    let label = if child_links { "Parent links" } else { "Links" };
    let uids = item
        .links()
        .map(Uid::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(r"\textbf{{{label}: {uids}}}")
}

#[cfg(test)]
mod tests {
    use serde_yaml::Value;
    use test_case::test_case;

    use super::*;
    use crate::{
        domain::{ExternalReference, References, Settings},
        publish::{
            Nesting, NoResolver, ResolveReference, ResolvedReference, document_lines, join_lines,
        },
    };

    fn item(uid: &str, level: &str) -> Item {
        Item::new(uid.parse().unwrap(), level.parse().unwrap())
    }

    fn render(item: &Item, settings: &Settings) -> String {
        let context = RenderContext::new(settings, &NoResolver);
        join_lines(&Latex.item_lines(item, context))
    }

    #[test]
    fn plain_normative_item_renders_identifier_heading_and_body() {
        let mut item = item("REQ-001", "1.0");
        item.set_text("Test of a single text line.");

        assert_eq!(
            render(&item, &Settings::default()),
            concat!(
                r"\section{REQ-001}\label{REQ-001}\zlabel{REQ-001}", "\n",
                "\n",
                "Test of a single text line.", "\n",
                "\n",
            )
        );
    }

    #[test]
    fn empty_item_renders_only_the_heading() {
        let item = item("REQ-001", "1.0");

        assert_eq!(
            render(&item, &Settings::default()),
            concat!(r"\section{REQ-001}\label{REQ-001}\zlabel{REQ-001}", "\n", "\n")
        );
    }

    #[test_case(true, r"\subsection{Heading}\label{req3}\zlabel{req3}" ; "numbered")]
    #[test_case(false, r"\subsection*{Heading}\label{req3}\zlabel{req3}" ; "starred")]
    fn heading_levels_govern_non_normative_numbering(enabled: bool, expected: &str) {
        let mut item = item("req3", "1.1.0");
        item.set_normative(false);
        item.set_header(Some("Heading".to_string()));

        let settings = Settings {
            publish_heading_levels: enabled,
            ..Settings::default()
        };

        assert_eq!(render(&item, &settings), format!("{expected}\n\n"));
    }

    #[test_case(true, r"\subsection{REQ-001}\label{REQ-001}\zlabel{REQ-001}" ; "numbered")]
    #[test_case(false, r"\subsection*{REQ-001}\label{REQ-001}\zlabel{REQ-001}" ; "starred")]
    fn body_levels_govern_normative_numbering(enabled: bool, heading: &str) {
        let mut item = item("REQ-001", "1.1");
        item.set_text("Test of a single text line.");

        let settings = Settings {
            publish_body_levels: enabled,
            ..Settings::default()
        };

        assert_eq!(
            render(&item, &settings),
            format!("{heading}\n\nTest of a single text line.\n\n")
        );
    }

    #[test]
    fn header_annotates_a_normative_heading() {
        let mut item = item("REQ-001", "1.0");
        item.set_header(Some("Header name".to_string()));
        item.set_text("Test of a single text line.");

        assert_eq!(
            render(&item, &Settings::default()),
            concat!(
                r"\section{Header name{ \small{}REQ-001}}\label{REQ-001}\zlabel{REQ-001}", "\n",
                "\n",
                "Test of a single text line.", "\n",
                "\n",
            )
        );
    }

    #[test]
    fn disabling_headers_leaves_the_identifier_alone() {
        let mut item = item("REQ-001", "1.0");
        item.set_header(Some("Header name".to_string()));
        item.set_text("Test of a single text line.");

        let settings = Settings {
            enable_headers: false,
            ..Settings::default()
        };

        assert_eq!(
            render(&item, &settings),
            concat!(
                r"\section{REQ-001}\label{REQ-001}\zlabel{REQ-001}", "\n",
                "\n",
                "Test of a single text line.", "\n",
                "\n",
            )
        );
    }

    #[test]
    fn non_normative_header_sits_tight_against_its_body() {
        let mut item = item("REQ-001", "1.0");
        item.set_normative(false);
        item.set_header(Some("Header name".to_string()));
        item.set_text("Test of a single text line.");

        // One newline after the heading, not a blank line.
        assert_eq!(
            render(&item, &Settings::default()),
            concat!(
                r"\section{Header name}\label{REQ-001}\zlabel{REQ-001}", "\n",
                "Test of a single text line.", "\n",
                "\n",
            )
        );
    }

    #[test]
    fn non_normative_header_keeps_the_blank_line_when_headers_are_disabled() {
        let mut item = item("REQ-001", "1.0");
        item.set_normative(false);
        item.set_header(Some("Header name".to_string()));
        item.set_text("Test of a single text line.");

        let settings = Settings {
            enable_headers: false,
            ..Settings::default()
        };

        assert_eq!(
            render(&item, &settings),
            concat!(
                r"\section{Header name}\label{REQ-001}\zlabel{REQ-001}", "\n",
                "\n",
                "Test of a single text line.", "\n",
                "\n",
            )
        );
    }

    #[test]
    fn header_markup_is_formatted() {
        let mut item = item("REQ-001", "1.0");
        item.set_header(Some("Header with **bold**".to_string()));

        let rendered = render(&item, &Settings::default());
        assert!(rendered.contains(r"\textbf{bold}"));
        assert!(!rendered.contains("**"));
    }

    #[test_case(1, "section" ; "top level")]
    #[test_case(2, "subsection" ; "second level")]
    #[test_case(3, "subsubsection" ; "third level")]
    #[test_case(7, "subsubsection" ; "deeper levels reuse the deepest command")]
    fn heading_commands_cap_at_subsubsection(depth: usize, expected: &str) {
        assert_eq!(heading_command(depth), expected);
    }

    #[test]
    fn level_depth_selects_the_heading_command() {
        let deep = item("REQ-001", "1.1.1.1");
        let rendered = render(&deep, &Settings::default());
        assert!(rendered.starts_with(r"\subsubsection{"));
    }

    #[test]
    fn nesting_deepens_the_heading_command() {
        let item = item("TST-001", "1.0");
        let settings = Settings::default();
        let context = RenderContext::new(&settings, &NoResolver).with_nesting(Nesting::new(1));

        let lines = Latex.item_lines(&item, context);
        assert!(lines[0].starts_with(r"\subsection{"));
    }

    #[test]
    fn links_render_before_references() {
        let mut item = item("req4", "1.1");
        item.set_text("This shall...");
        item.add_link("sys4".parse().unwrap());
        item.set_references(References::Legacy("project.sublime-project".to_string()));

        assert_eq!(
            render(&item, &Settings::default()),
            concat!(
                r"\subsection{req4}\label{req4}\zlabel{req4}", "\n",
                "\n",
                "This shall...", "\n",
                "\n",
                r"\textbf{Parent links: sys4}", "\n",
                "\n",
                r"\begin{quote} \verb|project.sublime-project|\end{quote}", "\n",
                "\n",
            )
        );
    }

    #[test_case(true, r"\textbf{Parent links: sys1, sys4}" ; "parent links label")]
    #[test_case(false, r"\textbf{Links: sys1, sys4}" ; "links label")]
    fn child_links_setting_switches_the_label(enabled: bool, expected: &str) {
        let mut item = item("req4", "1.1");
        item.add_link("sys4".parse().unwrap());
        item.add_link("sys1".parse().unwrap());

        let settings = Settings {
            publish_child_links: enabled,
            ..Settings::default()
        };

        assert!(render(&item, &settings).contains(expected));
    }

    #[test]
    fn attribute_table_glues_to_the_body() {
        let mut item = item("REQ-001", "1.0");
        item.set_text("Test of custom attributes.");
        item.set_attribute("CUSTOM-ATTRIB", Value::Bool(true));
        item.set_attribute(
            "invented-by",
            Value::String("jane@example.com".to_string()),
        );

        assert_eq!(
            render(&item, &Settings::default()),
            concat!(
                r"\section{REQ-001}\label{REQ-001}\zlabel{REQ-001}", "\n",
                "\n",
                "Test of custom attributes.", "\n",
                r"\begin{longtable}{|l|l|}", "\n",
                r"Attribute & Value\\", "\n",
                r"\hline", "\n",
                "CUSTOM-ATTRIB & True", "\n",
                "invented-by & jane@example.com", "\n",
                r"\end{longtable}", "\n",
                "\n",
            )
        );
    }

    #[test]
    fn image_with_title_becomes_a_figure() {
        let mut item = item("REQ-001", "1.0");
        item.set_text(
            "Test of image with title.\n\n![Alt text](assets/context.png \"Context Diagram\")",
        );

        assert_eq!(
            render(&item, &Settings::default()),
            concat!(
                r"\section{REQ-001}\label{REQ-001}\zlabel{REQ-001}", "\n",
                "\n",
                r"Test of image with title.\\", "\n",
                "\n",
                r"\begin{figure}[h!]\center", "\n",
                r"\includegraphics[width=0.8\textwidth]{assets/context.png}\label{fig:ContextDiagram}\zlabel{fig:ContextDiagram}\caption{Context Diagram}", "\n",
                r"\end{figure}", "\n",
                "\n",
            )
        );
    }

    #[test]
    fn image_without_title_labels_from_alt_text() {
        let mut item = item("REQ-001", "1.0");
        item.set_text("Intro line.\n\n![Alt Text Only](assets/context.png)");

        let rendered = render(&item, &Settings::default());
        assert!(rendered.contains(r"\label{fig:AltTextOnly}\zlabel{fig:AltTextOnly}"));
        assert!(rendered.contains(r"\caption{Alt Text Only}"));
        assert!(rendered.contains("Intro line.\\\\\n"));
    }

    #[test]
    fn figure_label_strips_whitespace_but_keeps_punctuation() {
        let mut item = item("REQ-001", "1.0");
        item.set_text("![alt](assets/rev.png \"Rev. 2 Diagram\")");

        let rendered = render(&item, &Settings::default());
        assert!(rendered.contains(r"\label{fig:Rev.2Diagram}\zlabel{fig:Rev.2Diagram}"));
    }

    #[test]
    fn unresolved_references_render_identically_under_both_check_settings() {
        let mut item = item("req3", "1.1.1");
        item.set_text("Heading text.");
        item.set_references(References::Current(vec![ExternalReference::new(
            "path/to/file".to_string(),
            None,
        )]));

        let unchecked = render(
            &item,
            &Settings {
                check_ref: false,
                ..Settings::default()
            },
        );
        let checked = render(&item, &Settings::default());

        assert_eq!(unchecked, checked);
        assert!(checked.contains(r"\begin{quote} \verb|path/to/file|\end{quote}"));
    }

    #[test]
    fn resolver_line_numbers_flow_into_the_item() {
        struct FixedResolver(ResolvedReference);

        impl ResolveReference for FixedResolver {
            fn resolve(&self, _reference: &ExternalReference) -> Option<ResolvedReference> {
                Some(self.0.clone())
            }

            fn resolve_legacy(&self, _keyword: &str) -> Option<ResolvedReference> {
                Some(self.0.clone())
            }
        }

        let mut item = item("req3", "1.1.1");
        item.set_text("Heading text.");
        item.set_references(References::Current(vec![ExternalReference::new(
            "file1".to_string(),
            Some("keyword".to_string()),
        )]));

        let resolver = FixedResolver(ResolvedReference {
            path: "path/to/mock/file1".to_string(),
            line: std::num::NonZeroUsize::new(3),
        });
        let settings = Settings::default();
        let context = RenderContext::new(&settings, &resolver);

        let rendered = join_lines(&Latex.item_lines(&item, context));
        assert!(rendered.contains(r"\begin{quote} \verb|path/to/mock/file1| (line 3)\end{quote}"));
    }

    #[test]
    fn wrapper_inputs_the_document_body() {
        let mut document = Document::new("REQ".try_into().unwrap());
        document.set_title(Some("System Requirements".to_string()));

        let lines = Latex.wrapper_lines(&document);
        assert_eq!(lines[0], r"\documentclass[a4paper]{article}");
        assert!(lines.contains(&r"\title{System Requirements}".to_string()));
        assert!(lines.contains(&r"\input{REQ.tex}".to_string()));
        assert_eq!(lines.last().unwrap(), r"\end{document}");
    }

    #[test]
    fn wrapper_title_falls_back_to_the_prefix() {
        let document = Document::new("REQ".try_into().unwrap());
        assert!(
            Latex
                .wrapper_lines(&document)
                .contains(&r"\title{REQ}".to_string())
        );
    }

    #[test]
    fn compile_script_runs_two_passes_per_document() {
        let mut tree = crate::domain::Tree::default();
        tree.insert(Document::new("REQ".try_into().unwrap())).unwrap();
        tree.insert(Document::new("TST".try_into().unwrap())).unwrap();

        let lines = Latex.compile_lines(&tree);
        assert_eq!(lines[0], "#!/bin/sh");
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines
                .iter()
                .filter(|line| *line == "pdflatex -halt-on-error doc-REQ.tex")
                .count(),
            2
        );
    }

    #[test]
    fn traceability_matrix_hyperlinks_each_cell() {
        let mut tree = crate::domain::Tree::default();

        let mut req = Document::new("REQ".try_into().unwrap());
        req.add_item(item("REQ-001", "1.0"));
        tree.insert(req).unwrap();

        let mut tst = Document::new("TST".try_into().unwrap());
        tst.set_parent(Some("REQ".try_into().unwrap()));
        let mut test_item = item("TST-001", "1.0");
        test_item.add_link("REQ-001".parse().unwrap());
        tst.add_item(test_item);
        tree.insert(tst).unwrap();

        assert_eq!(
            Latex.traceability_lines(&tree),
            [
                r"\begin{longtable}{|l|l|}",
                r"\caption{Traceability matrix.}\label{tbl:trace}\zlabel{tbl:trace}\\",
                r"\hline",
                r"\textbf{REQ} & \textbf{TST}\\",
                r"\hline",
                r"\hyperref[REQ-001]{REQ-001} & \hyperref[TST-001]{TST-001}\\",
                r"\hline",
                r"\end{longtable}",
            ]
        );
    }

    #[test]
    fn unlinked_matrix_cells_hold_a_space() {
        let mut tree = crate::domain::Tree::default();

        let mut req = Document::new("REQ".try_into().unwrap());
        req.add_item(item("REQ-001", "1.0"));
        tree.insert(req).unwrap();

        let mut tst = Document::new("TST".try_into().unwrap());
        tst.set_parent(Some("REQ".try_into().unwrap()));
        tree.insert(tst).unwrap();

        let lines = Latex.traceability_lines(&tree);
        assert!(lines.contains(&r"\hyperref[REQ-001]{REQ-001} &  \\".to_string()));
    }

    #[test]
    fn child_documents_continue_heading_depth() {
        let mut tree = crate::domain::Tree::default();

        let mut req = Document::new("REQ".try_into().unwrap());
        req.add_item(item("REQ-001", "1.0"));
        tree.insert(req).unwrap();

        let mut tst = Document::new("TST".try_into().unwrap());
        tst.set_parent(Some("REQ".try_into().unwrap()));
        tst.add_item(item("TST-001", "1.0"));
        tree.insert(tst).unwrap();

        let settings = Settings::default();
        let base = RenderContext::new(&settings, &NoResolver);

        let rendered: Vec<String> = tree_documents(&tree)
            .map(|(nesting, document)| {
                join_lines(&document_lines(
                    &Latex,
                    document,
                    base.with_nesting(nesting),
                ))
            })
            .collect();

        assert!(rendered[0].starts_with(r"\section{REQ-001}"));
        assert!(rendered[1].starts_with(r"\subsection{TST-001}"));
    }

    #[test]
    fn items_with_equal_levels_keep_load_order() {
        let mut document = Document::new("REQ".try_into().unwrap());
        let mut first = item("REQ-010", "2.0");
        first.set_text("First at this level.");
        let mut second = item("REQ-002", "2.0");
        second.set_text("Second at this level.");
        document.add_item(first);
        document.add_item(second);

        let settings = Settings::default();
        let context = RenderContext::new(&settings, &NoResolver);
        let rendered = join_lines(&document_lines(&Latex, &document, context));

        let first_at = rendered.find("REQ-010").unwrap();
        let second_at = rendered.find("REQ-002").unwrap();
        assert!(first_at < second_at);
    }
}
