//! Prelude module for convenient imports.
//!
//! ```ignore
//! use robot_assembly::prelude::*;
//! ```

// Loading
pub use crate::process::{LoadSession, LoadStatus, LoadedModel};
pub use crate::resource::file::{read_directory, LoadOrigin, UploadedFile};
pub use crate::resource::manifest::{SampleEntry, SampleManifest};

// Assets & scene
pub use crate::asset::{AssetLocation, AssetPlan, AssetResolver};
pub use crate::scene::DescriptionParser;

// Diagnostics
pub use crate::diagnostic::{
    Diagnostic, DiagnosticFilter, DiagnosticKind, DiagnosticOptions, DiagnosticSummary, Diagnostics,
    DisplayStyle, LoadError,
};

// Transport
pub use crate::resource::transport::{MapTransport, NoTransport, Transport, TransportError};
#[cfg(feature = "http")]
pub use crate::resource::transport::HttpTransport;

// Configuration
pub use crate::config::{Config, ConfigBuilder};
