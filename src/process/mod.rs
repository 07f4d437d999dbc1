//! Model assembly pipeline.
//!
//! - [`select_entry`] - Picks the entry document among candidates
//! - [`scan_includes`] / [`inner_fragment`] - Lexical scanning of macro documents
//! - [`Flattener`] - Expands include directives into one flat document
//! - [`LoadSession`] - Versioned owner of loads and their resources

mod entry;
mod flatten;
mod session;
pub mod scan;

pub use entry::select_entry;
pub use flatten::{FlattenOutput, Flattener};
pub use scan::{inner_fragment, inner_fragment_range, scan_includes, IncludeDirective};
pub use session::{LoadSession, LoadStatus, LoadedModel, MANIFEST_FILE};
