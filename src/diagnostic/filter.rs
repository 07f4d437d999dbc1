//! Diagnostic filtering utilities.

use super::info::{Diagnostic, DiagnosticKind};

/// Filter for excluding diagnostics.
///
/// A filter matches when every criterion it sets matches; a filter with no
/// criteria matches everything.
///
/// # Example
///
/// ```
/// use robot_assembly::diagnostic::{DiagnosticFilter, DiagnosticKind};
///
/// // Ignore missing meshes under a vendor directory
/// let filter = DiagnosticFilter::kind(DiagnosticKind::AssetNotFound)
///     .with_reference_prefix("vendor/");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticFilter {
    /// The kind to match.
    pub kind: Option<DiagnosticKind>,
    /// Prefix of the failing reference.
    pub reference_prefix: Option<String>,
    /// Prefix of the document containing the reference.
    pub document_prefix: Option<String>,
}

impl DiagnosticFilter {
    /// Match every diagnostic of `kind`.
    pub fn kind(kind: DiagnosticKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Also require the failing reference to start with `prefix`.
    pub fn with_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = Some(prefix.into());
        self
    }

    /// Also require the containing document to start with `prefix`.
    pub fn with_document_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.document_prefix = Some(prefix.into());
        self
    }

    /// Check if a diagnostic should be filtered out.
    pub(crate) fn matches(&self, diag: &Diagnostic) -> bool {
        self.kind.is_none_or(|k| k == diag.kind)
            && self
                .reference_prefix
                .as_deref()
                .is_none_or(|p| diag.reference.starts_with(p))
            && self
                .document_prefix
                .as_deref()
                .is_none_or(|p| diag.document.as_deref().is_some_and(|d| d.starts_with(p)))
    }
}
