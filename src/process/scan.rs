//! Text scanning for macro documents.
//!
//! Scanning is lexical: directives are located by pattern, not by parsing the
//! document, so the splice can replace each directive's exact bytes and keep
//! everything else (whitespace, comments, attribute order) untouched.
//!
//! # Example
//!
//! ```
//! use robot_assembly::process::{inner_fragment, scan_includes};
//!
//! let doc = r#"<robot><xacro:include filename="$(find arm)/urdf/arm.xacro"/></robot>"#;
//! let found = scan_includes(doc);
//! assert_eq!(found[0].raw_path, "$(find arm)/urdf/arm.xacro");
//!
//! let part = r#"<?xml version="1.0"?><robot name="arm"><link name="a"/></robot>"#;
//! assert_eq!(inner_fragment(part), r#"<link name="a"/>"#);
//! ```

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// `<xacro:include filename="..."/>`, single or double quoted, with other
/// attributes allowed on either side, or the empty paired form.
static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<xacro:include\b[^>]*?\bfilename\s*=\s*(?:"([^"]*)"|'([^']*)')[^>]*?(?:/>|>\s*</xacro:include\s*>)"#,
    )
    .expect("include pattern is valid")
});

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));

// =============================================================================
// Inclusion directives
// =============================================================================

/// A located inclusion directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Byte range of the whole directive in the scanned text.
    pub span: Range<usize>,
    /// The `filename` attribute as written.
    pub raw_path: String,
}

/// Find every inclusion directive in `text`, left to right.
///
/// Directives inside XML comments are ignored.
pub fn scan_includes(text: &str) -> Vec<IncludeDirective> {
    let comments = comment_ranges(text);
    INCLUDE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if in_any(&comments, whole.start()) {
                return None;
            }
            let raw = caps.get(1).or_else(|| caps.get(2))?;
            Some(IncludeDirective {
                span: whole.range(),
                raw_path: raw.as_str().trim().to_string(),
            })
        })
        .collect()
}

/// Byte ranges of all XML comments in `text`.
pub(crate) fn comment_ranges(text: &str) -> Vec<Range<usize>> {
    COMMENT.find_iter(text).map(|m| m.range()).collect()
}

/// Whether `offset` falls inside any of `ranges`.
pub(crate) fn in_any(ranges: &[Range<usize>], offset: usize) -> bool {
    ranges.iter().any(|r| r.contains(&offset))
}

// =============================================================================
// Fragment extraction
// =============================================================================

/// The content of a document between its root element's tags.
pub fn inner_fragment(text: &str) -> &str {
    &text[inner_fragment_range(text)]
}

/// Byte range of [`inner_fragment`] within `text`.
///
/// One leading XML declaration is skipped, as are comments, processing
/// instructions and a doctype before the root element. A self-closing root
/// yields an empty range. Text with no root element yields everything after
/// the prolog.
pub fn inner_fragment_range(text: &str) -> Range<usize> {
    let end = text.len();
    let mut pos = skip_ws(text, 0);
    if text[pos..].starts_with("<?xml") {
        match text[pos..].find("?>") {
            Some(i) => pos += i + 2,
            None => return end..end,
        }
    }

    // Prolog
    loop {
        pos = skip_ws(text, pos);
        let rest = &text[pos..];
        let close = if rest.starts_with("<!--") {
            "-->"
        } else if rest.starts_with("<?") {
            "?>"
        } else if rest.starts_with("<!") {
            ">"
        } else {
            break;
        };
        match rest.find(close) {
            Some(i) => pos += i + close.len(),
            None => return end..end,
        }
    }

    if !text[pos..].starts_with('<') {
        return pos..end;
    }

    let name_start = pos + 1;
    let name_len = text[name_start..]
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(end - name_start);
    let name = &text[name_start..name_start + name_len];

    let Some((open_end, self_closing)) = open_tag_end(text, name_start + name_len) else {
        return end..end;
    };
    if self_closing {
        return open_end..open_end;
    }

    match closing_tag_start(text, open_end, name) {
        Some(close) => open_end..close,
        None => open_end..end,
    }
}

fn skip_ws(text: &str, from: usize) -> usize {
    text[from..]
        .find(|c: char| !c.is_whitespace())
        .map_or(text.len(), |i| from + i)
}

/// Position just past the `>` of an open tag, and whether it was `/>`.
/// Quoted attribute values may contain `>`.
fn open_tag_end(text: &str, from: usize) -> Option<(usize, bool)> {
    let bytes = text.as_bytes();
    let mut quote = None;
    for (i, &b) in bytes.iter().enumerate().skip(from) {
        match (quote, b) {
            (Some(q), _) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(b),
            (None, b'>') => {
                let self_closing = text[from..i].trim_end().ends_with('/');
                return Some((i + 1, self_closing));
            }
            _ => {}
        }
    }
    None
}

/// Start of the last `</name>` at or after `from`.
fn closing_tag_start(text: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{name}");
    let mut search_end = text.len();
    while let Some(i) = text[from..search_end].rfind(&needle) {
        let at = from + i;
        let tail = text[at + needle.len()..].trim_start();
        if tail.starts_with('>') {
            return Some(at);
        }
        search_end = at;
    }
    None
}
