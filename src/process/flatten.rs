//! Include flattening for macro documents.
//!
//! ```text
//! flatten(root_text, root_path)
//!   │
//!   └─► expand(document)
//!         ├─► scan_includes()            directives, left to right
//!         ├─► per directive:
//!         │     substitute_package_macros → candidate keys
//!         │     index lookup / remote fetch
//!         │     ├─ miss      → drop, MissingInclude
//!         │     ├─ on stack  → drop, IncludeCycle
//!         │     └─ hit       → inner_fragment → expand(included)
//!         └─► SplicePlan::render()       one reconstruction pass
//! ```
//!
//! Every directive's replacement is computed against the original text and
//! the output is rebuilt once, so the result equals substituting all
//! directives simultaneously no matter how long each fragment is.

use std::ops::Range;
use std::sync::Arc;

use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::path::{
    is_handle, is_remote, normalize, relative_candidates, substitute_package_macros, ResolveOptions,
};
use crate::resource::file::{decode_utf8, ContentSource, VirtualFileIndex};
use crate::resource::package::{PackageRef, PackageRoot};
use crate::resource::transport::{Transport, TransportError};

use super::scan::{inner_fragment_range, scan_includes};

// =============================================================================
// Output
// =============================================================================

/// Result of flattening one root document.
#[derive(Debug, Clone, Default)]
pub struct FlattenOutput {
    /// The document with every resolvable directive replaced by its
    /// included fragment and every other directive removed.
    pub text: String,
    /// Missing includes, cycles and undecodable documents.
    pub diagnostics: Diagnostics,
    /// Keys of included documents, first-inclusion order, no duplicates.
    pub included: Vec<String>,
}

// =============================================================================
// Splice plan
// =============================================================================

#[derive(Debug)]
enum Piece {
    Keep(Range<usize>),
    Replace(String),
}

/// Ordered keep/replace pieces over one source text.
#[derive(Debug, Default)]
struct SplicePlan {
    pieces: Vec<Piece>,
    cursor: usize,
}

impl SplicePlan {
    /// Replace `span` with `text`. Spans must arrive in order and not overlap.
    fn replace(&mut self, span: Range<usize>, text: String) {
        debug_assert!(span.start >= self.cursor, "splice spans out of order");
        if span.start > self.cursor {
            self.pieces.push(Piece::Keep(self.cursor..span.start));
        }
        if !text.is_empty() {
            self.pieces.push(Piece::Replace(text));
        }
        self.cursor = span.end;
    }

    fn render(mut self, source: &str) -> String {
        if self.cursor < source.len() {
            self.pieces.push(Piece::Keep(self.cursor..source.len()));
        }
        let capacity = self
            .pieces
            .iter()
            .map(|p| match p {
                Piece::Keep(r) => r.len(),
                Piece::Replace(s) => s.len(),
            })
            .sum();
        let mut out = String::with_capacity(capacity);
        for piece in &self.pieces {
            match piece {
                Piece::Keep(r) => out.push_str(&source[r.clone()]),
                Piece::Replace(s) => out.push_str(s),
            }
        }
        out
    }
}

// =============================================================================
// Flattener
// =============================================================================

/// Recursion state shared across one flattening pass.
struct Frame {
    /// Documents on the active recursion path.
    active: Vec<String>,
    included: Vec<String>,
    diagnostics: Diagnostics,
}

enum Fetched {
    Found { key: String, bytes: Arc<[u8]> },
    Missing { tried: Vec<String> },
}

/// Expands `<xacro:include>` directives against a [`VirtualFileIndex`].
///
/// Included documents come from the index's local content or, for a
/// manifest-backed index, from the transport.
pub struct Flattener<'a, T: Transport> {
    index: &'a VirtualFileIndex,
    transport: &'a T,
    package_root: PackageRoot,
    options: ResolveOptions,
}

impl<'a, T: Transport> Flattener<'a, T> {
    /// Create a flattener re-basing package references under `package_root`.
    pub fn new(index: &'a VirtualFileIndex, transport: &'a T, package_root: PackageRoot) -> Self {
        Self {
            index,
            transport,
            package_root,
            options: ResolveOptions::default(),
        }
    }

    /// Set relative resolution options.
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Flatten `root_text`, resolving relative includes against `root_path`.
    ///
    /// Never fails: unresolvable directives are dropped and reported in
    /// [`FlattenOutput::diagnostics`].
    pub async fn flatten(&self, root_text: &str, root_path: &str) -> FlattenOutput {
        let mut frame = Frame {
            active: vec![root_path.to_string()],
            included: Vec::new(),
            diagnostics: Diagnostics::new(),
        };
        let text = self.expand(root_path, root_text, 0..root_text.len(), &mut frame).await;
        log::debug!(
            "flattened {root_path}: {} include(s), {} warning(s)",
            frame.included.len(),
            frame.diagnostics.len()
        );
        FlattenOutput {
            text,
            diagnostics: frame.diagnostics,
            included: frame.included,
        }
    }

    /// Expand the directives inside `text[body]`.
    async fn expand(&self, path: &str, text: &str, body: Range<usize>, frame: &mut Frame) -> String {
        let fragment = &text[body.clone()];
        let directives = scan_includes(fragment);
        if directives.is_empty() {
            return fragment.to_string();
        }

        let mut plan = SplicePlan::default();
        for directive in directives {
            let offset = body.start + directive.span.start;
            let raw = directive.raw_path.as_str();

            let replacement = match self.fetch(path, raw).await {
                Fetched::Missing { tried } => {
                    let message = if tried.is_empty() {
                        format!("cannot resolve include `{raw}`")
                    } else {
                        format!("cannot resolve include `{raw}` (tried {})", tried.join(", "))
                    };
                    frame.diagnostics.push(
                        Diagnostic::new(DiagnosticKind::MissingInclude, raw, message).at(path, text, offset),
                    );
                    String::new()
                }
                Fetched::Found { key, .. } if frame.active.contains(&key) => {
                    let message = format!("`{key}` includes itself through `{path}`");
                    frame.diagnostics.push(
                        Diagnostic::new(DiagnosticKind::IncludeCycle, raw, message).at(path, text, offset),
                    );
                    String::new()
                }
                Fetched::Found { key, bytes } => match decode_utf8(&bytes) {
                    Err(e) => {
                        let message = format!("`{key}` is not valid UTF-8: {e}");
                        frame.diagnostics.push(
                            Diagnostic::new(DiagnosticKind::InvalidEncoding, raw, message)
                                .at(path, text, offset),
                        );
                        String::new()
                    }
                    Ok(included) => {
                        log::debug!("including {key} into {path}");
                        if !frame.included.contains(&key) {
                            frame.included.push(key.clone());
                        }
                        frame.active.push(key.clone());
                        let inner = inner_fragment_range(included);
                        let expanded = Box::pin(self.expand(&key, included, inner, frame)).await;
                        frame.active.pop();
                        expanded
                    }
                },
            };
            plan.replace(directive.span, replacement);
        }
        plan.render(fragment)
    }

    /// Candidate keys for an include written as `raw` inside `base`.
    fn candidates(&self, base: &str, raw: &str) -> Vec<String> {
        let canonical = substitute_package_macros(raw);
        if let Some(pkg) = PackageRef::parse(&canonical) {
            return if self.index.is_remote() {
                pkg.lookup_keys(&self.package_root)
            } else {
                self.index
                    .locate_package(&pkg, &self.package_root)
                    .into_iter()
                    .collect()
            };
        }
        if is_remote(&canonical) {
            vec![canonical]
        } else if is_handle(&canonical) {
            Vec::new()
        } else if canonical.starts_with('/') {
            vec![normalize(&canonical).trim_start_matches('/').to_string()]
        } else {
            relative_candidates(base, &canonical, self.options, false)
        }
    }

    async fn fetch(&self, base: &str, raw: &str) -> Fetched {
        let tried = self.candidates(base, raw);
        for key in &tried {
            if let Some(bytes) = self.read(key).await {
                return Fetched::Found {
                    key: key.clone(),
                    bytes,
                };
            }
        }
        Fetched::Missing { tried }
    }

    async fn read(&self, key: &str) -> Option<Arc<[u8]>> {
        let url = if is_remote(key) {
            key.to_string()
        } else {
            match self.index.lookup(key)? {
                ContentSource::Local(bytes) => return Some(bytes),
                ContentSource::Remote(url) => url,
            }
        };
        match self.transport.get(&url).await {
            Ok(bytes) => Some(bytes.into()),
            Err(TransportError::NotFound(_)) => None,
            Err(e) => {
                log::warn!("failed to fetch {url}: {e}");
                None
            }
        }
    }
}
