//! Virtual file index with handle support.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Index Build Flow                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  LoadOrigin ──► VirtualFileIndex::build(origin, config)     │
//! │                    │                                        │
//! │                    ├─► SingleFile: key = file name          │
//! │                    │                                        │
//! │                    ├─► Directory: key = relative path       │
//! │                    │   └─► read_directory() walks the tree  │
//! │                    │                                        │
//! │                    └─► Manifest: lazy, base_url + path      │
//! │                                                             │
//! │  lookup(key) ──► ContentSource::{Local, Remote}             │
//! │  mint_handle(key) ──► "blob:<scope>-<n>/<name>"             │
//! │  teardown() ──► releases every handle, once                 │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod handle;
mod read;
mod vfs;

pub use handle::HandleRegistry;
pub use read::{decode_utf8, read_directory, UploadedFile};
pub use vfs::{ContentSource, IndexKind, LoadOrigin, VirtualFileIndex};
