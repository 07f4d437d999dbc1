//! Diagnostic formatting utilities.

use std::fmt::Write;

use super::info::{Diagnostic, Diagnostics};

// ============================================================================
// Options
// ============================================================================

/// Display style for diagnostic output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayStyle {
    /// Rich output with the offending source line.
    #[default]
    Rich,
    /// Short output with just document:line and message.
    Short,
}

/// Options for controlling diagnostic formatting.
///
/// # Example
///
/// ```
/// use robot_assembly::diagnostic::{DiagnosticOptions, DisplayStyle};
///
/// // Plain text (no ANSI colors) for logging
/// let opts = DiagnosticOptions::plain();
/// assert!(!opts.colored);
///
/// // Short format for CI output
/// let opts = DiagnosticOptions::short().with_colored(false);
/// assert_eq!(opts.style, DisplayStyle::Short);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticOptions {
    /// Whether to use ANSI colors in output.
    pub colored: bool,
    /// Display style (rich with snippets or short).
    pub style: DisplayStyle,
    /// Whether to include the source line snippet.
    pub snippets: bool,
}

impl Default for DiagnosticOptions {
    fn default() -> Self {
        Self {
            colored: true,
            style: DisplayStyle::Rich,
            snippets: true,
        }
    }
}

impl DiagnosticOptions {
    /// Create options for colored terminal output.
    pub fn colored() -> Self {
        Self::default()
    }

    /// Create options for plain text output (no ANSI colors).
    pub fn plain() -> Self {
        Self {
            colored: false,
            ..Self::default()
        }
    }

    /// Create options for short format (document:line: message).
    pub fn short() -> Self {
        Self {
            style: DisplayStyle::Short,
            snippets: false,
            ..Self::default()
        }
    }

    /// Set whether to use colors.
    pub fn with_colored(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    /// Set display style.
    pub fn with_style(mut self, style: DisplayStyle) -> Self {
        self.style = style;
        self
    }

    /// Set whether to include source snippets.
    pub fn with_snippets(mut self, snippets: bool) -> Self {
        self.snippets = snippets;
        self
    }
}

/// Box-drawing characters for source line display.
mod gutter {
    pub const HEADER: &str = "┌─";
    pub const BAR: &str = "│";
}

// ============================================================================
// Coloring
// ============================================================================

#[cfg(feature = "colored-diagnostics")]
fn colorize_warning(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.yellow().to_string()
}

#[cfg(feature = "colored-diagnostics")]
fn colorize_location(text: &str) -> String {
    use owo_colors::OwoColorize;
    text.cyan().to_string()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize_warning(text: &str) -> String {
    text.to_owned()
}

#[cfg(not(feature = "colored-diagnostics"))]
fn colorize_location(text: &str) -> String {
    text.to_owned()
}

fn paint(options: &DiagnosticOptions, text: &str, f: fn(&str) -> String) -> String {
    if options.colored { f(text) } else { text.to_owned() }
}

// ============================================================================
// Formatting
// ============================================================================

/// Format diagnostics with default (colored, rich) options.
pub fn format_diagnostics(diagnostics: &Diagnostics) -> String {
    format_diagnostics_with_options(diagnostics, &DiagnosticOptions::default())
}

/// Format diagnostics with custom options, one block per diagnostic.
pub fn format_diagnostics_with_options(diagnostics: &Diagnostics, options: &DiagnosticOptions) -> String {
    let mut output = String::new();
    for (i, diag) in diagnostics.iter().enumerate() {
        if i > 0 {
            output.push('\n');
        }
        format_diagnostic(&mut output, diag, options);
    }
    output
}

/// Append one formatted diagnostic to `output`.
pub(crate) fn format_diagnostic(output: &mut String, diag: &Diagnostic, options: &DiagnosticOptions) {
    match options.style {
        DisplayStyle::Short => format_short(output, diag, options),
        DisplayStyle::Rich => format_rich(output, diag, options),
    }
}

fn location(diag: &Diagnostic) -> Option<String> {
    let doc = diag.document.as_deref()?;
    Some(match diag.line {
        Some(line) => format!("{doc}:{line}"),
        None => doc.to_string(),
    })
}

fn format_short(output: &mut String, diag: &Diagnostic, options: &DiagnosticOptions) {
    let head = paint(options, &format!("warning[{}]", diag.kind), colorize_warning);
    match location(diag) {
        Some(loc) => {
            let _ = write!(output, "{loc}: {head}: {}", diag.message);
        }
        None => {
            let _ = write!(output, "{head}: {}", diag.message);
        }
    }
}

fn format_rich(output: &mut String, diag: &Diagnostic, options: &DiagnosticOptions) {
    let head = paint(options, &format!("warning[{}]", diag.kind), colorize_warning);
    let _ = write!(output, "{head}: {}", diag.message);

    let Some(loc) = location(diag) else {
        return;
    };
    let width = diag.line.map_or(1, |l| l.to_string().len());
    let pad = " ".repeat(width);
    let _ = write!(
        output,
        "\n{pad} {} {}",
        paint(options, gutter::HEADER, colorize_location),
        loc
    );

    if !options.snippets {
        return;
    }
    if let (Some(line), Some(text)) = (diag.line, diag.source_line.as_deref()) {
        let bar = paint(options, gutter::BAR, colorize_location);
        let _ = write!(output, "\n{pad} {bar}\n{line:>width$} {bar} {text}\n{pad} {bar}");
    }
}
