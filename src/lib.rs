//! # robot-assembly
//!
//! Assembles a robot description from user-supplied files into one flat
//! document a scene loader can parse.
//!
//! A model arrives as a single file, a folder tree, or a path into a hosted
//! sample manifest. The crate indexes what was supplied, picks the entry
//! document, expands `<xacro:include>` directives recursively, and resolves
//! every mesh and texture reference to something the loader can fetch:
//!
//! - **Index**: one immutable [`VirtualFileIndex`] per load
//! - **Entry**: picked by name, then by depth ([`select_entry`])
//! - **Flattening**: include expansion with cycle detection ([`Flattener`])
//! - **Assets**: local content becomes ephemeral handles, remote content is
//!   probed, anything missing becomes a placeholder ([`AssetPlan`])
//!
//! Missing includes, include cycles and missing assets never abort a load;
//! they are reported as [`Diagnostics`] on the result.
//!
//! ## Quick Start
//!
//! ```ignore
//! use robot_assembly::prelude::*;
//!
//! let session = LoadSession::new(Config::default());
//!
//! let files = read_directory("my_robot").await?;
//! let model = session.load_from_directory(files).await?;
//! let plan = session.prepare_assets(&model).await?;
//! if let LoadStatus::WithWarnings(summary) = model.status_with(&plan) {
//!     eprintln!("{summary}");
//! }
//!
//! let scene = session.build_scene(&model, &plan, &my_parser)?;
//! ```
//!
//! ## Loads supersede each other
//!
//! Each load takes the next generation of its [`LoadSession`]. Beginning a
//! load releases the previous model's handles; a load that finishes after a
//! newer one began is discarded with [`LoadError::Superseded`].
//!
//! ## Modules
//!
//! - [`config`]: Runtime configuration
//! - [`path`]: Pure path and reference transformations
//! - [`resource`]: File index, packages, transport, sample manifest
//! - [`process`]: Entry selection, flattening, load sessions
//! - [`asset`]: Asset resolution and probing
//! - [`scene`]: Description parser seam
//! - [`diagnostic`]: Errors, diagnostics and their formatting

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod asset;
pub mod config;
pub mod diagnostic;
pub mod path;
pub mod prelude;
pub mod process;
pub mod resource;
pub mod scene;

// =============================================================================
// Loading
// =============================================================================

pub use process::{
    inner_fragment, scan_includes, select_entry, FlattenOutput, Flattener, IncludeDirective,
    LoadSession, LoadStatus, LoadedModel,
};

// =============================================================================
// Assets
// =============================================================================

pub use asset::{collect_asset_references, AssetLocation, AssetPlan, AssetResolver, PlannedAsset};

// =============================================================================
// Diagnostics
// =============================================================================

pub use diagnostic::{
    // Fatal errors
    LoadError, NoEntryFound,
    // Recoverable problems
    Diagnostic, DiagnosticKind, DiagnosticSummary, Diagnostics,
    // Formatting and filtering
    DiagnosticFilter, DiagnosticOptions, DisplayStyle,
};

// =============================================================================
// Infrastructure
// =============================================================================

pub use config::{Config, ConfigBuilder};
pub use path::{normalize, resolve_relative, substitute_package_macros};
pub use resource::file::{read_directory, ContentSource, LoadOrigin, UploadedFile, VirtualFileIndex};
pub use resource::manifest::{SampleEntry, SampleManifest};
pub use resource::package::{package_to_index_key_or_url, PackageRef, PackageRoot};
pub use resource::transport::{MapTransport, NoTransport, Transport, TransportError};
#[cfg(feature = "http")]
pub use resource::transport::HttpTransport;
pub use scene::DescriptionParser;
