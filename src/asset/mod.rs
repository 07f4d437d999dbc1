//! Asset resolution for the scene loader.
//!
//! - [`AssetResolver`] - maps a raw mesh/texture reference to a location
//! - [`AssetPlan`] - resolves and probes every reference of a description

mod plan;
mod resolver;

pub use plan::{collect_asset_references, AssetElement, AssetPlan, AssetReference, PlannedAsset};
pub use resolver::{AssetLocation, AssetResolver};
