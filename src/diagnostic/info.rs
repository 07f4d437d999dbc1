//! Structured diagnostics for recoverable assembly problems.

use std::fmt;

use super::filter::DiagnosticFilter;
use super::format::{format_diagnostic, DiagnosticOptions};

// ============================================================================
// DiagnosticKind
// ============================================================================

/// Kind of a recoverable problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// An inclusion directive's target could not be resolved.
    MissingInclude,
    /// A document re-entered itself during flattening.
    IncludeCycle,
    /// A mesh or texture reference resolved to nothing fetchable.
    AssetNotFound,
    /// An included document was not valid UTF-8.
    InvalidEncoding,
}

impl DiagnosticKind {
    /// Short identifier used in formatted output.
    pub fn code(self) -> &'static str {
        match self {
            Self::MissingInclude => "missing-include",
            Self::IncludeCycle => "include-cycle",
            Self::AssetNotFound => "asset-not-found",
            Self::InvalidEncoding => "invalid-encoding",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Diagnostic
// ============================================================================

/// A single recoverable problem found while assembling a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// What went wrong.
    pub kind: DiagnosticKind,
    /// Human-readable message.
    pub message: String,
    /// The reference that failed, as written in the document.
    pub reference: String,
    /// Document containing the reference, if known.
    pub document: Option<String>,
    /// Line of the reference in `document` (1-indexed).
    pub line: Option<usize>,
    /// Source line text, for snippets.
    pub source_line: Option<String>,
}

impl Diagnostic {
    /// Create a diagnostic for `reference`.
    pub fn new(kind: DiagnosticKind, reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            reference: reference.into(),
            document: None,
            line: None,
            source_line: None,
        }
    }

    /// Attach the containing document and the byte offset of the reference.
    pub fn at(mut self, document: &str, text: &str, offset: usize) -> Self {
        let offset = offset.min(text.len());
        let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[offset..].find('\n').map_or(text.len(), |i| offset + i);
        self.document = Some(document.to_string());
        self.line = Some(text[..offset].matches('\n').count() + 1);
        self.source_line = Some(text[line_start..line_end].trim_end().to_string());
        self
    }

    /// Attach only the containing document.
    pub fn in_document(mut self, document: &str) -> Self {
        self.document = Some(document.to_string());
        self
    }

    /// Format with custom options.
    pub fn with_options<'a>(&'a self, options: &'a DiagnosticOptions) -> DiagnosticDisplay<'a> {
        DiagnosticDisplay {
            diagnostic: self,
            options,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with_options(&DiagnosticOptions::plain()).fmt(f)
    }
}

/// Display wrapper for one diagnostic with custom options.
pub struct DiagnosticDisplay<'a> {
    diagnostic: &'a Diagnostic,
    options: &'a DiagnosticOptions,
}

impl fmt::Display for DiagnosticDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = String::new();
        format_diagnostic(&mut output, self.diagnostic, self.options);
        f.write_str(&output)
    }
}

// ============================================================================
// DiagnosticSummary
// ============================================================================

/// Per-kind diagnostic counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticSummary {
    /// Unresolved inclusion directives.
    pub missing_includes: usize,
    /// Broken include cycles.
    pub include_cycles: usize,
    /// Assets replaced by placeholders.
    pub missing_assets: usize,
    /// Included documents that were not valid UTF-8.
    pub invalid_encodings: usize,
}

impl DiagnosticSummary {
    /// Total number of diagnostics.
    pub fn total(&self) -> usize {
        self.missing_includes + self.include_cycles + self.missing_assets + self.invalid_encodings
    }

    /// Whether there are no diagnostics at all.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl fmt::Display for DiagnosticSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "no warnings");
        }
        let total = self.total();
        write!(f, "{total} warning{}", if total == 1 { "" } else { "s" })?;
        let parts: Vec<String> = [
            (self.missing_includes, "missing include"),
            (self.include_cycles, "include cycle"),
            (self.missing_assets, "missing asset"),
            (self.invalid_encodings, "invalid encoding"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}{}", if n == 1 { "" } else { "s" }))
        .collect();
        write!(f, " ({})", parts.join(", "))
    }
}

// ============================================================================
// Diagnostics (Collection)
// ============================================================================

/// A collection of recoverable diagnostics, in the order they were found.
///
/// # Example
///
/// ```ignore
/// let model = session.load_from_directory(files).await?;
///
/// if !model.diagnostics.is_empty() {
///     eprintln!("{}", model.diagnostics.summary());
///     for diag in model.diagnostics.of_kind(DiagnosticKind::MissingInclude) {
///         eprintln!("{}", diag.reference);
///     }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty diagnostics collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic, logging it as a warning.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}: {}", diagnostic.kind, diagnostic.message);
        self.items.push(diagnostic);
    }

    /// Append all diagnostics from `other`.
    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Check if there are no diagnostics.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the number of diagnostics.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Iterate over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Iterate over diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    /// Count diagnostics of one kind.
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.of_kind(kind).count()
    }

    /// Get a summary of diagnostic counts.
    pub fn summary(&self) -> DiagnosticSummary {
        DiagnosticSummary {
            missing_includes: self.count(DiagnosticKind::MissingInclude),
            include_cycles: self.count(DiagnosticKind::IncludeCycle),
            missing_assets: self.count(DiagnosticKind::AssetNotFound),
            invalid_encodings: self.count(DiagnosticKind::InvalidEncoding),
        }
    }

    /// Get a slice of all diagnostics.
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.items
    }

    /// Filter out diagnostics matching any of the given filters.
    ///
    /// ```ignore
    /// let quiet = diagnostics.filter_out(&[DiagnosticFilter::kind(DiagnosticKind::AssetNotFound)]);
    /// ```
    pub fn filter_out(&self, filters: &[DiagnosticFilter]) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|d| !filters.iter().any(|f| f.matches(d)))
                .cloned()
                .collect(),
        }
    }

    /// Format with custom options.
    pub fn with_options<'a>(&'a self, options: &'a DiagnosticOptions) -> DiagnosticsDisplay<'a> {
        DiagnosticsDisplay {
            diagnostics: self,
            options,
        }
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        DiagnosticsDisplay {
            diagnostics: self,
            options: &DiagnosticOptions::default(),
        }
        .fmt(f)
    }
}

/// Display wrapper for formatting diagnostics with custom options.
pub struct DiagnosticsDisplay<'a> {
    diagnostics: &'a Diagnostics,
    options: &'a DiagnosticOptions,
}

impl fmt::Display for DiagnosticsDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diag) in self.diagnostics.items.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            diag.with_options(self.options).fmt(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Diagnostics {
        [
            Diagnostic::new(DiagnosticKind::MissingInclude, "arm.xacro", "cannot find arm.xacro"),
            Diagnostic::new(DiagnosticKind::AssetNotFound, "meshes/a.stl", "no mesh"),
            Diagnostic::new(DiagnosticKind::AssetNotFound, "meshes/b.stl", "no mesh"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_summary() {
        let summary = sample().summary();
        assert_eq!(summary.missing_includes, 1);
        assert_eq!(summary.missing_assets, 2);
        assert_eq!(summary.total(), 3);
        assert_eq!(summary.to_string(), "3 warnings (1 missing include, 2 missing assets)");
        assert_eq!(DiagnosticSummary::default().to_string(), "no warnings");
    }

    #[test]
    fn test_of_kind() {
        let diags = sample();
        let refs: Vec<_> = diags
            .of_kind(DiagnosticKind::AssetNotFound)
            .map(|d| d.reference.as_str())
            .collect();
        assert_eq!(refs, ["meshes/a.stl", "meshes/b.stl"]);
        assert_eq!(diags.count(DiagnosticKind::IncludeCycle), 0);
    }

    #[test]
    fn test_at_locates_line() {
        let text = "<robot>\n  <xacro:include filename=\"a.xacro\"/>\n</robot>";
        let offset = text.find("<xacro").unwrap();
        let diag = Diagnostic::new(DiagnosticKind::MissingInclude, "a.xacro", "missing")
            .at("pkg/robot.xacro", text, offset);
        assert_eq!(diag.line, Some(2));
        assert_eq!(diag.document.as_deref(), Some("pkg/robot.xacro"));
        assert_eq!(
            diag.source_line.as_deref(),
            Some("  <xacro:include filename=\"a.xacro\"/>")
        );
    }
}
