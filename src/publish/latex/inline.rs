//! Escaping and inline markup for item text.
//!
//! Item text is plain prose with a small markdown subset: `**bold**`,
//! `*italic*`, `_italic_`, and `[text](url)` links. Everything else is
//! emitted literally, so special characters are escaped before the markup
//! is rewritten.

use std::sync::LazyLock;

use regex::Regex;

static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

static STAR_ITALIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.*?)\*").unwrap());

// Runs after escaping, so the source underscores arrive as `\_`.
static UNDERSCORE_ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\_(.*?)\\_").unwrap());

static HYPERLINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]*)\)").unwrap());

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^!\[(?<alt>[^\]]*)\]\(\s*(?<path>[^)\s"]+)(?:\s+"(?<title>[^"]*)")?\s*\)$"#)
        .unwrap()
});

/// Escapes the characters that carry meaning in the output.
///
/// Escaping happens before markup rewriting, so the rewritten commands are
/// the only unescaped markup in the result.
pub(super) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        match character {
            '\\' => escaped.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                escaped.push('\\');
                escaped.push(character);
            }
            '~' => escaped.push_str(r"\textasciitilde{}"),
            '^' => escaped.push_str(r"\textasciicircum{}"),
            _ => escaped.push(character),
        }
    }
    escaped
}

/// Escapes `text` and rewrites its inline markup.
///
/// Bold is rewritten before italics so that `**` is never consumed as two
/// empty italic spans. Unpaired markers are left as ordinary text.
pub(super) fn format(text: &str) -> String {
    let escaped = escape(text);
    let formatted = BOLD_RE.replace_all(&escaped, r"\textbf{${1}}");
    let formatted = STAR_ITALIC_RE.replace_all(&formatted, r"\textit{${1}}");
    let formatted = UNDERSCORE_ITALIC_RE.replace_all(&formatted, r"\textit{${1}}");
    HYPERLINK_RE
        .replace_all(&formatted, r"\href{${2}}{${1}}")
        .into_owned()
}

/// A body line that consists of a markdown image: `![alt](path "title")`.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Image<'a> {
    pub alt: &'a str,
    pub path: &'a str,
    pub title: Option<&'a str>,
}

/// Parses a body line as an image, if the whole line is one.
///
/// Images embedded mid-sentence stay ordinary text; only a line that is
/// nothing but an image becomes a figure.
pub(super) fn parse_image(line: &str) -> Option<Image<'_>> {
    let captures = IMAGE_RE.captures(line.trim())?;
    Some(Image {
        alt: captures.name("alt").map_or("", |m| m.as_str()),
        path: captures.name("path").map_or("", |m| m.as_str()),
        title: captures.name("title").map(|m| m.as_str()),
    })
}
