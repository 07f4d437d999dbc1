//! Configuration for robot-assembly.
//!
//! A [`Config`] value is carried by each [`LoadSession`](crate::LoadSession);
//! nothing here is global. Use [`ConfigBuilder`] to override the defaults.

use std::time::Duration;

use crate::path::ResolveOptions;

/// Default timeout for remote requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for model assembly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base path that `package://` references are re-based under when the
    /// model came from a flat source (a single uploaded file).
    ///
    /// Default: `"/"`
    pub static_base: String,
    /// Base URL for the remote sample manifest and its entries.
    pub manifest_base_url: Option<String>,
    /// Resolve references in `.../urdf/<file>` documents against the package
    /// root instead of the `urdf/` directory.
    ///
    /// Default: `true`
    pub urdf_sibling_heuristic: bool,
    /// Probe remote assets with a metadata request before handing them to
    /// the scene loader.
    ///
    /// Default: `true`
    pub probe_remote_assets: bool,
    /// User-Agent string for remote requests.
    pub user_agent: String,
    /// Timeout for a single remote request.
    pub request_timeout: Duration,
    /// File extensions (without dot) recognized as plain descriptions.
    pub description_extensions: Vec<String>,
    /// File extensions (without dot) recognized as macro documents.
    pub macro_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            static_base: "/".to_string(),
            manifest_base_url: None,
            urdf_sibling_heuristic: true,
            probe_remote_assets: true,
            user_agent: concat!("robot-assembly/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            description_extensions: vec!["urdf".to_string()],
            macro_extensions: vec!["xacro".to_string()],
        }
    }
}

impl Config {
    /// Start building a configuration from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Path resolution options derived from this configuration.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            urdf_sibling: self.urdf_sibling_heuristic,
        }
    }

    /// Whether `path` names a macro document (e.g. `robot.urdf.xacro`).
    pub fn is_macro_document(&self, path: &str) -> bool {
        has_extension(path, &self.macro_extensions)
    }

    /// Whether `path` names any loadable description document.
    pub fn is_candidate(&self, path: &str) -> bool {
        self.is_macro_document(path) || has_extension(path, &self.description_extensions)
    }
}

fn has_extension(path: &str, extensions: &[String]) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
    extensions.iter().any(|ext| {
        name.len() > ext.len() + 1
            && name.ends_with(ext.to_ascii_lowercase().as_str())
            && name.as_bytes()[name.len() - ext.len() - 1] == b'.'
    })
}

/// Configuration builder for fluent API.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    static_base: Option<String>,
    manifest_base_url: Option<String>,
    urdf_sibling_heuristic: Option<bool>,
    probe_remote_assets: Option<bool>,
    user_agent: Option<String>,
    request_timeout: Option<Duration>,
    extra_description_extensions: Vec<String>,
    extra_macro_extensions: Vec<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base path for package references from flat sources.
    ///
    /// # Example
    ///
    /// ```
    /// use robot_assembly::config::ConfigBuilder;
    ///
    /// let config = ConfigBuilder::new()
    ///     .static_base("https://example.org/robots/")
    ///     .build();
    /// assert_eq!(config.static_base, "https://example.org/robots/");
    /// ```
    pub fn static_base(mut self, base: impl Into<String>) -> Self {
        self.static_base = Some(base.into());
        self
    }

    /// Set the base URL of the remote sample manifest.
    pub fn manifest_base_url(mut self, url: impl Into<String>) -> Self {
        self.manifest_base_url = Some(url.into());
        self
    }

    /// Enable or disable the urdf-sibling resolution heuristic.
    pub fn urdf_sibling_heuristic(mut self, enabled: bool) -> Self {
        self.urdf_sibling_heuristic = Some(enabled);
        self
    }

    /// Enable or disable existence probes for remote assets.
    pub fn probe_remote_assets(mut self, enabled: bool) -> Self {
        self.probe_remote_assets = Some(enabled);
        self
    }

    /// Set the User-Agent string for remote requests.
    ///
    /// Default: "robot-assembly/{version}"
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the timeout for a single remote request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Recognize an additional description extension (without dot).
    pub fn description_extension(mut self, ext: impl Into<String>) -> Self {
        self.extra_description_extensions.push(ext.into());
        self
    }

    /// Recognize an additional macro document extension (without dot).
    pub fn macro_extension(mut self, ext: impl Into<String>) -> Self {
        self.extra_macro_extensions.push(ext.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Config {
        let defaults = Config::default();
        let mut description_extensions = defaults.description_extensions;
        description_extensions.extend(self.extra_description_extensions);
        let mut macro_extensions = defaults.macro_extensions;
        macro_extensions.extend(self.extra_macro_extensions);

        Config {
            static_base: self.static_base.unwrap_or(defaults.static_base),
            manifest_base_url: self.manifest_base_url.or(defaults.manifest_base_url),
            urdf_sibling_heuristic: self
                .urdf_sibling_heuristic
                .unwrap_or(defaults.urdf_sibling_heuristic),
            probe_remote_assets: self
                .probe_remote_assets
                .unwrap_or(defaults.probe_remote_assets),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            description_extensions,
            macro_extensions,
        }
    }
}
