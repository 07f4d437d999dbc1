//! Asset discovery and probing.
//!
//! Before the scene loader runs, every mesh and texture reference in the
//! flat description is resolved once. Locations outside the index are probed
//! with a metadata request; anything that cannot be fetched becomes an empty
//! placeholder so the rest of the model still loads.

use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::FxHashSet;

use super::resolver::{AssetLocation, AssetResolver};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::process::scan::{comment_ranges, in_any};
use crate::resource::transport::Transport;

static ASSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<(mesh|texture)\b[^>]*?\bfilename\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("asset pattern is valid")
});

/// Element an asset reference was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetElement {
    /// `<mesh filename="...">`
    Mesh,
    /// `<texture filename="...">`
    Texture,
}

/// A mesh or texture reference found in a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    /// The `filename` attribute as written.
    pub raw: String,
    /// Element carrying the reference.
    pub element: AssetElement,
    /// Byte offset of the element in the description.
    pub offset: usize,
}

/// Find mesh and texture references in `text`.
///
/// Each distinct reference appears once, at its first occurrence. Commented
/// out elements are ignored.
pub fn collect_asset_references(text: &str) -> Vec<AssetReference> {
    let comments = comment_ranges(text);
    let mut seen = FxHashSet::default();
    ASSET
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if in_any(&comments, whole.start()) {
                return None;
            }
            let raw = caps.get(2).or_else(|| caps.get(3))?.as_str().trim();
            if raw.is_empty() || !seen.insert(raw.to_string()) {
                return None;
            }
            let element = match caps.get(1)?.as_str() {
                "texture" => AssetElement::Texture,
                _ => AssetElement::Mesh,
            };
            Some(AssetReference {
                raw: raw.to_string(),
                element,
                offset: whole.start(),
            })
        })
        .collect()
}

// =============================================================================
// AssetPlan
// =============================================================================

/// Outcome for one asset reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAsset {
    /// The asset can be fetched at `location`.
    Located {
        /// The reference.
        reference: AssetReference,
        /// Resolved location.
        location: AssetLocation,
    },
    /// Nothing fetchable at `location`; the loader gets an empty placeholder.
    Placeholder {
        /// The reference.
        reference: AssetReference,
        /// Location that failed.
        location: AssetLocation,
    },
}

impl PlannedAsset {
    /// The reference this entry is for.
    pub fn reference(&self) -> &AssetReference {
        match self {
            Self::Located { reference, .. } | Self::Placeholder { reference, .. } => reference,
        }
    }

    /// Whether this entry is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// Resolved and probed assets of one flat description.
#[derive(Debug, Clone)]
pub struct AssetPlan {
    assets: Vec<PlannedAsset>,
    resolver: AssetResolver,
    /// One `AssetNotFound` per placeholder.
    pub diagnostics: Diagnostics,
}

impl AssetPlan {
    /// Resolve every asset reference in `text` and probe the ones outside
    /// the index.
    ///
    /// Handles are always fetchable. Any other location is checked with
    /// [`Transport::exists`] when `probe` is set; the transport decides what
    /// it can serve. Without `probe` every location is taken as fetchable.
    pub async fn prepare<T: Transport>(
        text: &str,
        document: &str,
        resolver: &AssetResolver,
        transport: &T,
        probe: bool,
    ) -> Self {
        let mut plan = Self {
            assets: Vec::new(),
            resolver: resolver.clone(),
            diagnostics: Diagnostics::new(),
        };
        for reference in collect_asset_references(text) {
            let location = resolver.resolve(&reference.raw);
            let problem = match &location {
                AssetLocation::Handle(_) => None,
                AssetLocation::Url(_) if !probe => None,
                AssetLocation::Url(url) => match transport.exists(url).await {
                    Ok(true) => None,
                    Ok(false) => Some(format!("`{}` not found at {url}", reference.raw)),
                    Err(e) => Some(format!("`{}` could not be probed: {e}", reference.raw)),
                },
            };

            match problem {
                None => {
                    log::debug!("asset {} → {location}", reference.raw);
                    plan.assets.push(PlannedAsset::Located { reference, location });
                }
                Some(message) => {
                    plan.diagnostics.push(
                        Diagnostic::new(DiagnosticKind::AssetNotFound, &reference.raw, message)
                            .at(document, text, reference.offset),
                    );
                    plan.assets.push(PlannedAsset::Placeholder { reference, location });
                }
            }
        }
        plan
    }

    /// Every planned asset, in document order.
    pub fn assets(&self) -> &[PlannedAsset] {
        &self.assets
    }

    /// Number of placeholders.
    pub fn placeholders(&self) -> usize {
        self.assets.iter().filter(|a| a.is_placeholder()).count()
    }

    /// Location for `raw` as handed to the scene loader.
    ///
    /// Placeholders resolve to the empty string. References the plan did not
    /// collect go through the load's [`AssetResolver`] unprobed.
    pub fn resolve(&self, raw: &str) -> String {
        let raw = raw.trim();
        match self.assets.iter().find(|a| a.reference().raw == raw) {
            Some(PlannedAsset::Located { location, .. }) => location.as_str().to_string(),
            Some(PlannedAsset::Placeholder { .. }) => String::new(),
            None => self.resolver.resolve(raw).as_str().to_string(),
        }
    }
}
