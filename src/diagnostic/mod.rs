//! Load errors and assembly diagnostics.
//!
//! Fatal problems surface as a single [`LoadError`]; recoverable ones are
//! collected as [`Diagnostic`]s on the loaded model.

mod error;
mod filter;
mod format;
mod info;

pub use error::{LoadError, NoEntryFound};
pub use filter::DiagnosticFilter;
pub use format::{format_diagnostics, format_diagnostics_with_options, DiagnosticOptions, DisplayStyle};
pub use info::{
    Diagnostic, DiagnosticDisplay, DiagnosticKind, DiagnosticSummary, Diagnostics, DiagnosticsDisplay,
};
