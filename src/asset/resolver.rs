//! Synchronous asset resolution for the scene loader.

use std::fmt;
use std::sync::Arc;

use crate::path::{
    is_anchored, is_handle, join_base, normalize, relative_candidates, resolve_relative_with,
    substitute_package_macros, ResolveOptions,
};
use crate::resource::file::{ContentSource, VirtualFileIndex};
use crate::resource::package::{PackageRef, PackageRoot};

/// Where an asset reference points after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetLocation {
    /// Ephemeral handle for content held by the index.
    Handle(String),
    /// URL or path for the scene loader to fetch.
    Url(String),
}

impl AssetLocation {
    /// The location as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Handle(s) | Self::Url(s) => s,
        }
    }

    /// Whether the content is held locally.
    pub fn is_handle(&self) -> bool {
        matches!(self, Self::Handle(_))
    }
}

impl fmt::Display for AssetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves mesh and texture references of one committed load.
///
/// Resolution order:
///
/// 1. content held by the index → ephemeral handle
/// 2. `package://` / `$(find ..)` → URL under the package base
/// 3. absolute paths, remote URLs and handles → unchanged
/// 4. anything else → relative to the entry document
///
/// Handles stay valid until the index is torn down, which happens when the
/// next load begins.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    index: Arc<VirtualFileIndex>,
    entry: String,
    package_root: PackageRoot,
    static_base: String,
    options: ResolveOptions,
    generation: u64,
}

impl AssetResolver {
    pub(crate) fn new(
        index: Arc<VirtualFileIndex>,
        entry: String,
        package_root: PackageRoot,
        static_base: String,
        options: ResolveOptions,
        generation: u64,
    ) -> Self {
        Self {
            index,
            entry,
            package_root,
            static_base,
            options,
            generation,
        }
    }

    /// Entry document the resolver is bound to.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Generation of the load the resolver is bound to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resolve a raw reference as written in the description.
    pub fn resolve(&self, raw: &str) -> AssetLocation {
        let canonical = substitute_package_macros(raw);
        let package = PackageRef::parse(&canonical);

        if let Some(handle) = self.local_handle(&canonical, package.as_ref()) {
            return AssetLocation::Handle(handle);
        }

        if let Some(pkg) = package {
            let key = pkg.rebase(&self.package_root);
            return AssetLocation::Url(self.locate(&key));
        }

        if is_anchored(&canonical) {
            return AssetLocation::Url(canonical);
        }

        let key = resolve_relative_with(&self.entry, &canonical, self.options);
        AssetLocation::Url(self.locate(&key))
    }

    /// [`resolve`](Self::resolve) as a plain string callback.
    pub fn hook(&self) -> impl Fn(&str) -> String + '_ {
        move |raw: &str| self.resolve(raw).as_str().to_string()
    }

    /// Bytes behind a handle returned by [`resolve`](Self::resolve).
    ///
    /// Returns `None` once the load's index has been torn down.
    pub fn read_handle(&self, handle: &str) -> Option<Arc<[u8]>> {
        if !is_handle(handle) {
            return None;
        }
        self.index.read_handle(handle)
    }

    /// Whether the bound index has been torn down.
    pub fn is_released(&self) -> bool {
        self.index.is_released()
    }

    fn local_handle(&self, canonical: &str, package: Option<&PackageRef>) -> Option<String> {
        if self.index.is_remote() || is_anchored(canonical) {
            return None;
        }
        let key = match package {
            Some(pkg) => self.index.locate_package(pkg, &self.package_root)?,
            None => relative_candidates(&self.entry, canonical, self.options, true)
                .into_iter()
                .find(|k| self.index.contains(k))?,
        };
        self.index.mint_handle(&key)
    }

    /// URL for an index key: remote indices prefix their base URL, local
    /// ones the static base.
    fn locate(&self, key: &str) -> String {
        match self.index.lookup(key) {
            Some(ContentSource::Remote(url)) => url,
            _ if is_anchored(key) => key.to_string(),
            _ => join_base(&self.static_base, &normalize(key)),
        }
    }
}
