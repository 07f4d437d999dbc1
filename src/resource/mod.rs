//! Resources a load draws on: the virtual file index, package references,
//! remote transport and the sample manifest.

pub mod file;
pub mod manifest;
pub mod package;
pub mod transport;
