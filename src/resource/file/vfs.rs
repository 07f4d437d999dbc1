//! The virtual file index.
//!
//! One index is built per load. It maps normalized relative paths to content
//! sources and never changes after it is built.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::handle::HandleRegistry;
use super::read::UploadedFile;
use crate::config::Config;
use crate::diagnostic::LoadError;
use crate::path::{join_base, normalize};
use crate::resource::package::{PackageRef, PackageRoot};

// =============================================================================
// LoadOrigin
// =============================================================================

/// Where a model comes from.
#[derive(Debug, Clone)]
pub enum LoadOrigin {
    /// One file picked by the user.
    SingleFile(UploadedFile),
    /// A folder tree (folder picker or drag-and-drop), fully enumerated.
    Directory(Vec<UploadedFile>),
    /// Remotely hosted sample files under a base URL.
    Manifest {
        /// URL prefix every path is appended to.
        base_url: String,
    },
}

/// How an index was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKind {
    /// Exactly one file, keyed by its own name.
    SingleFile,
    /// A directory tree.
    Directory,
    /// Lazily resolved remote paths.
    Manifest {
        /// URL prefix every path is appended to.
        base_url: String,
    },
}

// =============================================================================
// ContentSource
// =============================================================================

/// Where the content of one path lives.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Uploaded bytes held in memory.
    Local(Arc<[u8]>),
    /// A remote URL to fetch.
    Remote(String),
}

// =============================================================================
// VirtualFileIndex
// =============================================================================

/// In-memory mapping from normalized relative path to content source.
///
/// Keys are unique and the index is immutable once built; a new load builds
/// a new index. The index owns the [`HandleRegistry`] for any handles minted
/// from its content, released by [`teardown`](Self::teardown) or on drop.
///
/// # Example
///
/// ```
/// use robot_assembly::config::Config;
/// use robot_assembly::resource::file::{LoadOrigin, UploadedFile, VirtualFileIndex};
///
/// let files = vec![
///     UploadedFile::new("arm/urdf/arm.urdf", b"<robot/>".to_vec()),
///     UploadedFile::new("arm/meshes/base.stl", b"solid".to_vec()),
/// ];
/// let index = VirtualFileIndex::build(LoadOrigin::Directory(files), &Config::default()).unwrap();
/// assert!(index.lookup("arm/meshes/base.stl").is_some());
/// assert!(index.lookup("./arm/meshes/base.stl").is_none()); // exact match only
/// ```
pub struct VirtualFileIndex {
    kind: IndexKind,
    files: FxHashMap<String, Arc<[u8]>>,
    /// Keys in enumeration order.
    order: Vec<String>,
    handles: HandleRegistry,
}

impl VirtualFileIndex {
    /// Build an index from a load origin.
    ///
    /// Fails with [`LoadError::NoDescriptionFound`] when a local origin holds
    /// no file with a recognized description extension. Manifest origins are
    /// never checked eagerly.
    pub fn build(origin: LoadOrigin, config: &Config) -> Result<Self, LoadError> {
        let index = match origin {
            LoadOrigin::SingleFile(file) => {
                let name = file.name().to_string();
                Self::from_entries(IndexKind::SingleFile, [(name, Arc::clone(file.bytes()))])
            }
            LoadOrigin::Directory(files) => Self::from_entries(
                IndexKind::Directory,
                files.into_iter().map(|f| (f.path().to_string(), Arc::clone(f.bytes()))),
            ),
            LoadOrigin::Manifest { base_url } => {
                return Ok(Self::from_entries(IndexKind::Manifest { base_url }, []));
            }
        };

        if !index.order.iter().any(|p| config.is_candidate(p)) {
            return Err(LoadError::NoDescriptionFound);
        }
        log::debug!("built {:?} index with {} file(s)", index.kind, index.len());
        Ok(index)
    }

    fn from_entries(kind: IndexKind, entries: impl IntoIterator<Item = (String, Arc<[u8]>)>) -> Self {
        let mut files = FxHashMap::default();
        let mut order = Vec::new();
        for (path, bytes) in entries {
            let key = normalize(&path);
            if key.is_empty() || files.contains_key(&key) {
                log::warn!("skipping duplicate or empty path {path:?}");
                continue;
            }
            order.push(key.clone());
            files.insert(key, bytes);
        }
        Self {
            kind,
            files,
            order,
            handles: HandleRegistry::new(),
        }
    }

    /// How this index was built.
    pub fn kind(&self) -> &IndexKind {
        &self.kind
    }

    /// Whether paths resolve lazily against a remote base URL.
    pub fn is_remote(&self) -> bool {
        matches!(self.kind, IndexKind::Manifest { .. })
    }

    /// Look up a normalized path. Exact match only.
    ///
    /// Manifest-backed indices answer every path with a remote URL.
    pub fn lookup(&self, path: &str) -> Option<ContentSource> {
        match &self.kind {
            IndexKind::Manifest { base_url } => {
                Some(ContentSource::Remote(join_base(base_url, path)))
            }
            _ => self.files.get(path).cloned().map(ContentSource::Local),
        }
    }

    /// Local bytes for `path`, if the index holds them.
    pub fn local(&self, path: &str) -> Option<&Arc<[u8]>> {
        self.files.get(path)
    }

    /// Whether the index holds local content for `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Find the local key for a package reference.
    ///
    /// Tries [`PackageRef::lookup_keys`] in order, then any key ending in
    /// `/<name>/<path>`.
    pub fn locate_package(&self, pkg: &PackageRef, root: &PackageRoot) -> Option<String> {
        if let Some(key) = pkg.lookup_keys(root).into_iter().find(|k| self.contains(k)) {
            return Some(key);
        }
        let suffix = pkg.nested_suffix();
        self.order.iter().find(|k| k.ends_with(&suffix)).cloned()
    }

    /// Paths in enumeration order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Paths naming description documents, in enumeration order.
    pub fn candidates(&self, config: &Config) -> Vec<String> {
        self.order.iter().filter(|p| config.is_candidate(p)).cloned().collect()
    }

    /// Number of local files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the index holds no local files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Handle for the local content at `key`, minting it on first use.
    pub fn mint_handle(&self, key: &str) -> Option<String> {
        let bytes = self.files.get(key)?;
        self.handles.mint(key, bytes)
    }

    /// Bytes behind a handle minted by this index.
    pub fn read_handle(&self, handle: &str) -> Option<Arc<[u8]>> {
        self.handles.read(handle)
    }

    /// Number of live handles.
    pub fn live_handles(&self) -> usize {
        self.handles.live()
    }

    /// Whether this index has been torn down.
    pub fn is_released(&self) -> bool {
        self.handles.is_released()
    }

    /// Release every handle minted from this index. Runs at most once.
    pub fn teardown(&self) -> usize {
        self.handles.release_all()
    }
}

impl std::fmt::Debug for VirtualFileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFileIndex")
            .field("kind", &self.kind)
            .field("files", &self.order)
            .field("live_handles", &self.live_handles())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> UploadedFile {
        UploadedFile::new(path, content.as_bytes().to_vec())
    }

    #[test]
    fn test_single_file_keyed_by_name() {
        let origin = LoadOrigin::SingleFile(file("some/dir/robot.urdf", "<robot/>"));
        let index = VirtualFileIndex::build(origin, &Config::default()).unwrap();
        assert_eq!(index.kind(), &IndexKind::SingleFile);
        assert_eq!(index.paths().collect::<Vec<_>>(), ["robot.urdf"]);
    }

    #[test]
    fn test_single_file_without_description() {
        let origin = LoadOrigin::SingleFile(file("arm.stl", "solid"));
        let err = VirtualFileIndex::build(origin, &Config::default()).unwrap_err();
        assert!(matches!(err, LoadError::NoDescriptionFound));
    }

    #[test]
    fn test_directory_keys_and_candidates() {
        let origin = LoadOrigin::Directory(vec![
            file("bot/meshes/a.stl", "solid"),
            file("bot/urdf/bot.urdf.xacro", "<robot/>"),
            file("bot/./urdf/../README", "readme"),
        ]);
        let index = VirtualFileIndex::build(origin, &Config::default()).unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.contains("bot/README"));
        assert_eq!(index.candidates(&Config::default()), ["bot/urdf/bot.urdf.xacro"]);
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let origin = LoadOrigin::Directory(vec![
            file("r.urdf", "first"),
            file("./r.urdf", "second"),
        ]);
        let index = VirtualFileIndex::build(origin, &Config::default()).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(&**index.local("r.urdf").unwrap(), b"first");
    }

    #[test]
    fn test_manifest_lookup_is_lazy() {
        let origin = LoadOrigin::Manifest {
            base_url: "https://host/samples/".into(),
        };
        let index = VirtualFileIndex::build(origin, &Config::default()).unwrap();
        assert!(index.is_remote());
        assert!(index.is_empty());
        match index.lookup("bot/urdf/bot.urdf") {
            Some(ContentSource::Remote(url)) => {
                assert_eq!(url, "https://host/samples/bot/urdf/bot.urdf")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_locate_package_fallbacks() {
        let origin = LoadOrigin::Directory(vec![
            file("ws/arm_description/urdf/arm.urdf", "<robot/>"),
            file("ws/arm_description/meshes/base.stl", "solid"),
        ]);
        let index = VirtualFileIndex::build(origin, &Config::default()).unwrap();
        let root = PackageRoot::Hierarchical("ws".into());
        let pkg = PackageRef::parse("package://arm_description/meshes/base.stl").unwrap();
        assert_eq!(
            index.locate_package(&pkg, &root).as_deref(),
            Some("ws/arm_description/meshes/base.stl")
        );
        let missing = PackageRef::parse("package://arm_description/meshes/none.stl").unwrap();
        assert!(index.locate_package(&missing, &root).is_none());
    }

    #[test]
    fn test_handles_released_on_teardown() {
        let origin = LoadOrigin::Directory(vec![
            file("r.urdf", "<robot/>"),
            file("a.stl", "solid"),
        ]);
        let index = VirtualFileIndex::build(origin, &Config::default()).unwrap();
        let handle = index.mint_handle("a.stl").unwrap();
        assert!(index.mint_handle("missing.stl").is_none());
        assert_eq!(&*index.read_handle(&handle).unwrap(), b"solid");

        assert_eq!(index.teardown(), 1);
        assert_eq!(index.teardown(), 0);
        assert!(index.is_released());
        assert!(index.read_handle(&handle).is_none());
    }
}
