//! Load sessions.
//!
//! A [`LoadSession`] owns the state that outlives a single load: the
//! configuration, the transport, the generation counter and the committed
//! model's index. Each load is tagged with a generation when it begins and
//! only commits if no newer load began in the meantime.
//!
//! ```text
//! load_from_*()
//!   │
//!   ├─► begin()        generation += 1, tear down the previous index
//!   ├─► build index    VirtualFileIndex::build(origin)
//!   ├─► select entry   select_entry(candidates)
//!   ├─► read root      local bytes or transport GET
//!   ├─► flatten        Flattener::flatten()
//!   └─► commit()       stale generation → Superseded, index dropped
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::entry::select_entry;
use super::flatten::{FlattenOutput, Flattener};
use crate::asset::{AssetPlan, AssetResolver};
use crate::config::Config;
use crate::diagnostic::{DiagnosticSummary, Diagnostics, LoadError};
use crate::path::{first_segment, join_base, normalize};
use crate::resource::file::{decode_utf8, ContentSource, LoadOrigin, UploadedFile, VirtualFileIndex};
use crate::resource::manifest::SampleManifest;
use crate::resource::package::PackageRoot;
use crate::resource::transport::{NoTransport, Transport};
use crate::scene::DescriptionParser;

/// File name of the sample listing under the manifest base URL.
pub const MANIFEST_FILE: &str = "manifest.json";

// =============================================================================
// LoadedModel
// =============================================================================

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// No recoverable problems.
    Clean,
    /// Loaded, with warnings.
    WithWarnings(DiagnosticSummary),
}

impl LoadStatus {
    /// Whether the load produced no warnings.
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    fn of(diagnostics: &Diagnostics) -> Self {
        if diagnostics.is_empty() {
            Self::Clean
        } else {
            Self::WithWarnings(diagnostics.summary())
        }
    }
}

/// A flattened description, ready for the scene parser.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// The description with every include expanded.
    pub flat: String,
    /// Path of the entry document.
    pub entry: String,
    /// Generation the load committed under.
    pub generation: u64,
    /// When the load committed.
    pub loaded_at: DateTime<Utc>,
    /// Documents spliced into the entry, first-inclusion order.
    pub included: Vec<String>,
    /// Recoverable problems found while flattening.
    pub diagnostics: Diagnostics,
}

impl LoadedModel {
    /// Clean or with warnings, counting flattening diagnostics only.
    pub fn status(&self) -> LoadStatus {
        LoadStatus::of(&self.diagnostics)
    }

    /// Clean or with warnings, counting flattening diagnostics and the
    /// placeholders of `plan`.
    pub fn status_with(&self, plan: &AssetPlan) -> LoadStatus {
        let mut all = self.diagnostics.clone();
        all.extend(plan.diagnostics.clone());
        LoadStatus::of(&all)
    }
}

// =============================================================================
// LoadSession
// =============================================================================

/// The committed load's resources.
struct ActiveLoad {
    index: Arc<VirtualFileIndex>,
    entry: String,
    package_root: PackageRoot,
    generation: u64,
}

/// Versioned owner of model loads.
///
/// # Example
///
/// ```ignore
/// let session = LoadSession::new(Config::default());
/// let files = read_directory("my_robot").await?;
/// let model = session.load_from_directory(files).await?;
///
/// let plan = session.prepare_assets(&model).await?;
/// let scene = session.build_scene(&model, &plan, &parser)?;
/// ```
pub struct LoadSession<T: Transport = NoTransport> {
    config: Config,
    transport: T,
    generation: AtomicU64,
    current: Mutex<Option<Arc<ActiveLoad>>>,
}

impl LoadSession<NoTransport> {
    /// Create an offline session. Manifest loads fail.
    pub fn new(config: Config) -> Self {
        Self::with_transport(config, NoTransport)
    }
}

#[cfg(feature = "http")]
impl LoadSession<crate::resource::transport::HttpTransport> {
    /// Create a session fetching remote content over HTTP.
    pub fn with_http(config: Config) -> Self {
        let transport = crate::resource::transport::HttpTransport::new(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> LoadSession<T> {
    /// Create a session using `transport` for remote content.
    pub fn with_transport(config: Config, transport: T) -> Self {
        Self {
            config,
            transport,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// The session's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session's transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Generation of the most recently begun load (0 before any load).
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Loads
    // -------------------------------------------------------------------------

    /// Load a single uploaded description.
    pub async fn load_from_single_file(&self, file: UploadedFile) -> Result<LoadedModel, LoadError> {
        self.load(LoadOrigin::SingleFile(file), None).await
    }

    /// Load a fully enumerated folder tree.
    pub async fn load_from_directory(&self, files: Vec<UploadedFile>) -> Result<LoadedModel, LoadError> {
        self.load(LoadOrigin::Directory(files), None).await
    }

    /// Load a hosted sample by its path under the manifest base URL.
    pub async fn load_from_manifest_entry(&self, remote_path: &str) -> Result<LoadedModel, LoadError> {
        let base_url = self.manifest_base()?.to_string();
        self.load(LoadOrigin::Manifest { base_url }, Some(remote_path)).await
    }

    /// Fetch the hosted sample listing.
    pub async fn fetch_manifest(&self) -> Result<SampleManifest, LoadError> {
        let url = join_base(self.manifest_base()?, MANIFEST_FILE);
        log::debug!("fetching manifest {url}");
        let bytes = self.transport.get(&url).await?;
        let text = decode_utf8(&bytes)
            .map_err(|e| LoadError::Manifest(format!("manifest is not valid UTF-8: {e}")))?;
        SampleManifest::from_json(text)
    }

    fn manifest_base(&self) -> Result<&str, LoadError> {
        self.config
            .manifest_base_url
            .as_deref()
            .ok_or_else(|| LoadError::Manifest("no manifest base URL configured".into()))
    }

    async fn load(&self, origin: LoadOrigin, requested_entry: Option<&str>) -> Result<LoadedModel, LoadError> {
        let generation = self.begin();

        let index = VirtualFileIndex::build(origin, &self.config)?;
        let (entry, package_root) = match requested_entry {
            Some(path) => {
                let entry = normalize(path);
                let root = PackageRoot::Hierarchical(first_segment(&entry).unwrap_or_default().to_string());
                (entry, root)
            }
            None => {
                let candidates = index.candidates(&self.config);
                let entry = select_entry(candidates.as_slice())?.to_string();
                let root = PackageRoot::for_entry(&entry, &self.config.static_base);
                (entry, root)
            }
        };
        log::info!("load {generation}: entry {entry}");

        let text = self.read_root(&index, &entry).await?;
        let output = if self.config.is_macro_document(&entry) {
            Flattener::new(&index, &self.transport, package_root.clone())
                .with_options(self.config.resolve_options())
                .flatten(&text, &entry)
                .await
        } else {
            log::debug!("load {generation}: {entry} is not a macro document, used as-is");
            FlattenOutput {
                text,
                diagnostics: Diagnostics::new(),
                included: Vec::new(),
            }
        };

        self.commit(ActiveLoad {
            index: Arc::new(index),
            entry: entry.clone(),
            package_root,
            generation,
        })?;

        let model = LoadedModel {
            flat: output.text,
            entry,
            generation,
            loaded_at: Utc::now(),
            included: output.included,
            diagnostics: output.diagnostics,
        };
        log::info!("load {generation} committed: {}", model.diagnostics.summary());
        Ok(model)
    }

    async fn read_root(&self, index: &VirtualFileIndex, entry: &str) -> Result<String, LoadError> {
        let bytes: Arc<[u8]> = match index.lookup(entry) {
            Some(ContentSource::Local(bytes)) => bytes,
            Some(ContentSource::Remote(url)) => self
                .transport
                .get(&url)
                .await
                .map_err(|e| LoadError::unreadable_root(entry, e))?
                .into(),
            None => return Err(LoadError::unreadable_root(entry, "not among the loaded files")),
        };
        decode_utf8(&bytes)
            .map(str::to_string)
            .map_err(|e| LoadError::unreadable_root(entry, e))
    }

    /// Start a new generation and tear down the committed model's index.
    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = self.current.lock().take() {
            let released = previous.index.teardown();
            log::debug!("load {generation} began: released {released} handle(s) of load {}", previous.generation);
        }
        generation
    }

    /// Commit `active` unless a newer load began after it.
    fn commit(&self, active: ActiveLoad) -> Result<(), LoadError> {
        let mut current = self.current.lock();
        let latest = self.generation.load(Ordering::SeqCst);
        if active.generation != latest {
            active.index.teardown();
            log::debug!("load {} superseded by load {latest}", active.generation);
            return Err(LoadError::Superseded {
                generation: active.generation,
            });
        }
        *current = Some(Arc::new(active));
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Assets and scene
    // -------------------------------------------------------------------------

    /// Asset resolver bound to the most recent committed load.
    ///
    /// `None` before the first commit and while a newer load is in flight.
    pub fn asset_resolver(&self) -> Option<AssetResolver> {
        let current = self.current.lock();
        let active = current.as_ref()?;
        Some(AssetResolver::new(
            Arc::clone(&active.index),
            active.entry.clone(),
            active.package_root.clone(),
            self.config.static_base.clone(),
            self.config.resolve_options(),
            active.generation,
        ))
    }

    /// Resolve and probe the assets of `model`.
    ///
    /// Fails with [`LoadError::Superseded`] unless `model` is the committed
    /// load.
    pub async fn prepare_assets(&self, model: &LoadedModel) -> Result<AssetPlan, LoadError> {
        let resolver = self
            .asset_resolver()
            .filter(|r| r.generation() == model.generation)
            .ok_or(LoadError::Superseded {
                generation: model.generation,
            })?;
        let plan = AssetPlan::prepare(
            &model.flat,
            &model.entry,
            &resolver,
            &self.transport,
            self.config.probe_remote_assets,
        )
        .await;
        if !plan.diagnostics.is_empty() {
            log::info!("load {}: {}", model.generation, plan.diagnostics.summary());
        }
        Ok(plan)
    }

    /// Hand `model` to `parser`, resolving assets through `plan`.
    pub fn build_scene<P: DescriptionParser>(
        &self,
        model: &LoadedModel,
        plan: &AssetPlan,
        parser: &P,
    ) -> Result<P::Scene, LoadError> {
        if model.generation != self.current_generation() {
            return Err(LoadError::Superseded {
                generation: model.generation,
            });
        }
        parser
            .parse(&model.flat, &|raw: &str| plan.resolve(raw))
            .map_err(LoadError::parse_failure)
    }
}

impl<T: Transport> Drop for LoadSession<T> {
    fn drop(&mut self) {
        if let Some(active) = self.current.get_mut().take() {
            active.index.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::diagnostic::DiagnosticKind;
    use crate::resource::file::read_directory;
    use crate::resource::transport::{MapTransport, TransportError};

    fn file(path: &str, content: &str) -> UploadedFile {
        UploadedFile::new(path, content.as_bytes().to_vec())
    }

    fn arm_files() -> Vec<UploadedFile> {
        vec![
            file(
                "arm/urdf/arm.urdf.xacro",
                "<robot name=\"arm\">\n  <xacro:include filename=\"parts/link.xacro\"/>\n</robot>\n",
            ),
            file(
                "arm/urdf/parts/link.xacro",
                "<robot><link name=\"base\"><visual><geometry><mesh filename=\"package://arm/meshes/base.stl\"/></geometry></visual></link></robot>",
            ),
            file("arm/urdf/parts/unused.xacro", "<robot/>"),
            file("arm/meshes/base.stl", "solid base"),
        ]
    }

    /// Counts links; fails on documents without a robot element.
    struct LinkCounter;

    impl DescriptionParser for LinkCounter {
        type Scene = Vec<String>;

        fn parse(&self, text: &str, resolve: &dyn Fn(&str) -> String) -> Result<Vec<String>, String> {
            if !text.contains("<robot") {
                return Err("missing <robot> element".into());
            }
            Ok(crate::asset::collect_asset_references(text)
                .iter()
                .map(|r| resolve(&r.raw))
                .collect())
        }
    }

    /// Yields once before every request, so concurrent loads interleave.
    struct Yielding(MapTransport);

    impl Transport for Yielding {
        async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            tokio::task::yield_now().await;
            self.0.get(url).await
        }

        async fn exists(&self, url: &str) -> Result<bool, TransportError> {
            tokio::task::yield_now().await;
            self.0.exists(url).await
        }
    }

    #[tokio::test]
    async fn test_directory_load() {
        let session = LoadSession::new(Config::default());
        let model = session.load_from_directory(arm_files()).await.unwrap();

        assert_eq!(model.entry, "arm/urdf/arm.urdf.xacro");
        assert_eq!(model.generation, 1);
        assert!(model.status().is_clean());
        assert_eq!(model.included, ["arm/urdf/parts/link.xacro"]);
        assert!(model.flat.starts_with("<robot name=\"arm\">\n  <link name=\"base\">"));
        assert!(!model.flat.contains("xacro:include"));
    }

    #[tokio::test]
    async fn test_single_file_load() {
        let session = LoadSession::new(Config::default());
        let model = session
            .load_from_single_file(file("downloads/r.urdf", "<robot name=\"r\"/>"))
            .await
            .unwrap();
        assert_eq!(model.entry, "r.urdf");
        assert_eq!(model.flat, "<robot name=\"r\"/>");

        let err = session
            .load_from_single_file(file("notes.txt", "hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::NoDescriptionFound));
    }

    #[tokio::test]
    async fn test_missing_include_warns() {
        let session = LoadSession::new(Config::default());
        let model = session
            .load_from_directory(vec![file(
                "bot/robot.xacro",
                "<robot><xacro:include filename=\"gone.xacro\"/></robot>",
            )])
            .await
            .unwrap();
        assert_eq!(model.flat, "<robot></robot>");
        match model.status() {
            LoadStatus::WithWarnings(summary) => assert_eq!(summary.missing_includes, 1),
            LoadStatus::Clean => panic!("expected warnings"),
        }
    }

    #[tokio::test]
    async fn test_plain_entry_is_used_as_is() {
        let text = "<robot><xacro:include filename=\"part.xacro\"/></robot>";
        let session = LoadSession::new(Config::default());
        let model = session.load_from_single_file(file("r.urdf", text)).await.unwrap();
        assert_eq!(model.flat, text);
        assert!(model.status().is_clean());
        assert!(model.included.is_empty());
    }

    #[tokio::test]
    async fn test_flat_source_package_mesh_served_by_transport() {
        let mut transport = MapTransport::new();
        transport.insert_bytes("/meshes/arm.stl", b"solid arm".to_vec());
        let session = LoadSession::with_transport(Config::default(), transport);

        let model = session
            .load_from_single_file(file(
                "r.urdf",
                "<robot><link name=\"a\"><visual><geometry><mesh filename=\"package://pkg/meshes/arm.stl\"/></geometry></visual></link></robot>",
            ))
            .await
            .unwrap();
        let plan = session.prepare_assets(&model).await.unwrap();
        assert_eq!(plan.placeholders(), 0);
        assert!(model.status_with(&plan).is_clean());

        let scene = session.build_scene(&model, &plan, &LinkCounter).unwrap();
        assert_eq!(scene, ["/meshes/arm.stl"]);
    }

    #[tokio::test]
    async fn test_unreadable_root() {
        let session = LoadSession::new(Config::default());
        let err = session
            .load_from_directory(vec![UploadedFile::new("bot/robot.urdf", vec![0xc3, 0x28])])
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::UnreadableRoot { ref path, .. } if path == "bot/robot.urdf"));
    }

    #[tokio::test]
    async fn test_new_load_releases_previous_handles() {
        let session = LoadSession::new(Config::default());
        assert!(session.asset_resolver().is_none());

        session.load_from_directory(arm_files()).await.unwrap();
        let first = session.asset_resolver().unwrap();
        let handle = first.resolve("package://arm/meshes/base.stl");
        assert!(first.read_handle(handle.as_str()).is_some());

        session
            .load_from_single_file(file("r.urdf", "<robot/>"))
            .await
            .unwrap();
        assert!(first.is_released());
        assert!(first.read_handle(handle.as_str()).is_none());

        let second = session.asset_resolver().unwrap();
        assert_eq!(second.generation(), 2);
        assert_eq!(second.entry(), "r.urdf");
    }

    #[tokio::test]
    async fn test_failed_load_leaves_no_resolver() {
        let session = LoadSession::new(Config::default());
        session.load_from_directory(arm_files()).await.unwrap();
        let first = session.asset_resolver().unwrap();

        assert!(session.load_from_directory(vec![file("a.txt", "")]).await.is_err());
        assert!(first.is_released());
        assert!(session.asset_resolver().is_none());
    }

    #[tokio::test]
    async fn test_stale_load_is_superseded() {
        let transport = MapTransport::new()
            .with("https://host/s/a/a.urdf", "<robot name=\"a\"/>")
            .with("https://host/s/b/b.urdf", "<robot name=\"b\"/>");
        let config = Config::builder().manifest_base_url("https://host/s").build();
        let session = LoadSession::with_transport(config, Yielding(transport));

        let (first, second) = tokio::join!(
            session.load_from_manifest_entry("a/a.urdf"),
            session.load_from_manifest_entry("b/b.urdf"),
        );
        let err = first.unwrap_err();
        assert!(err.is_superseded());
        assert!(matches!(err, LoadError::Superseded { generation: 1 }));

        let second = second.unwrap();
        assert_eq!(second.generation, 2);
        assert_eq!(second.flat, "<robot name=\"b\"/>");
        assert_eq!(session.asset_resolver().unwrap().generation(), 2);
    }

    #[tokio::test]
    async fn test_manifest_flow() {
        let transport = MapTransport::new()
            .with(
                "https://host/s/manifest.json",
                r#"{"samples": [{"name": "Rover", "path": "rover/urdf/rover.urdf.xacro"}]}"#,
            )
            .with(
                "https://host/s/rover/urdf/rover.urdf.xacro",
                "<robot><xacro:include filename=\"$(find rover)/urdf/wheel.xacro\"/></robot>",
            )
            .with(
                "https://host/s/rover/urdf/wheel.xacro",
                "<robot><link name=\"wheel\"><visual><geometry><mesh filename=\"package://rover/meshes/wheel.dae\"/></geometry></visual></link></robot>",
            )
            .with("https://host/s/rover/meshes/wheel.dae", "<COLLADA/>");
        let config = Config::builder().manifest_base_url("https://host/s/").build();
        let session = LoadSession::with_transport(config, transport);

        let manifest = session.fetch_manifest().await.unwrap();
        let sample = manifest.find("Rover").unwrap();
        let model = session.load_from_manifest_entry(&sample.path).await.unwrap();
        assert!(model.status().is_clean());
        assert!(model.flat.contains("<link name=\"wheel\">"));

        let plan = session.prepare_assets(&model).await.unwrap();
        assert_eq!(plan.placeholders(), 0);
        let scene = session.build_scene(&model, &plan, &LinkCounter).unwrap();
        assert_eq!(scene, ["https://host/s/rover/meshes/wheel.dae"]);
    }

    #[tokio::test]
    async fn test_manifest_requires_base_url() {
        let session = LoadSession::new(Config::default());
        assert!(matches!(session.fetch_manifest().await, Err(LoadError::Manifest(_))));
        assert!(matches!(
            session.load_from_manifest_entry("a/a.urdf").await,
            Err(LoadError::Manifest(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_asset_gets_placeholder() {
        let mut files = arm_files();
        files.push(file(
            "arm/urdf/parts/tip.xacro",
            "<robot><link name=\"tip\"><visual><geometry><mesh filename=\"package://arm/meshes/tip.stl\"/></geometry></visual></link></robot>",
        ));
        files[0] = file(
            "arm/urdf/arm.urdf.xacro",
            "<robot name=\"arm\">\n  <xacro:include filename=\"parts/link.xacro\"/>\n  <xacro:include filename=\"parts/tip.xacro\"/>\n</robot>\n",
        );

        let session = LoadSession::new(Config::default());
        let model = session.load_from_directory(files).await.unwrap();
        let plan = session.prepare_assets(&model).await.unwrap();
        assert_eq!(plan.diagnostics.count(DiagnosticKind::AssetNotFound), 1);
        assert!(model.status().is_clean());
        match model.status_with(&plan) {
            LoadStatus::WithWarnings(summary) => {
                assert_eq!(summary.missing_assets, 1);
                assert_eq!(summary.total(), 1);
            }
            LoadStatus::Clean => panic!("expected warnings"),
        }

        let scene = session.build_scene(&model, &plan, &LinkCounter).unwrap();
        assert_eq!(scene.len(), 2);
        assert!(scene[0].starts_with("blob:"));
        assert_eq!(scene[1], "");
    }

    #[tokio::test]
    async fn test_parse_failure_and_stale_model() {
        let session = LoadSession::new(Config::default());
        let model = session
            .load_from_single_file(file("r.urdf", "<!-- empty -->"))
            .await
            .unwrap();
        let plan = session.prepare_assets(&model).await.unwrap();
        let err = session.build_scene(&model, &plan, &LinkCounter).unwrap_err();
        assert!(matches!(err, LoadError::ParseFailure { ref message } if message.contains("robot")));

        session
            .load_from_single_file(file("s.urdf", "<robot/>"))
            .await
            .unwrap();
        assert!(session.prepare_assets(&model).await.unwrap_err().is_superseded());
        assert!(session.build_scene(&model, &plan, &LinkCounter).unwrap_err().is_superseded());
    }

    #[tokio::test]
    async fn test_load_from_disk() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("walker");
        fs::create_dir_all(root.join("urdf")).unwrap();
        fs::create_dir_all(root.join("meshes")).unwrap();
        fs::write(
            root.join("urdf/walker.urdf"),
            "<robot><link name=\"body\"><visual><geometry><mesh filename=\"../meshes/body.stl\"/></geometry></visual></link></robot>",
        )
        .unwrap();
        fs::write(root.join("meshes/body.stl"), "solid body").unwrap();

        let session = LoadSession::new(Config::default());
        let files = read_directory(&root).await.unwrap();
        let model = session.load_from_directory(files).await.unwrap();
        assert_eq!(model.entry, "walker/urdf/walker.urdf");

        let resolver = session.asset_resolver().unwrap();
        let location = resolver.resolve("../meshes/body.stl");
        assert_eq!(&*resolver.read_handle(location.as_str()).unwrap(), b"solid body");
    }

    #[tokio::test]
    async fn test_drop_releases_handles() {
        let session = LoadSession::new(Config::default());
        session.load_from_directory(arm_files()).await.unwrap();
        let resolver = session.asset_resolver().unwrap();
        resolver.resolve("package://arm/meshes/base.stl");
        drop(session);
        assert!(resolver.is_released());
    }
}
