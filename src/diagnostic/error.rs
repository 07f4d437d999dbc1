//! Load error type.

use thiserror::Error;

use crate::resource::transport::TransportError;

/// Error type for fatal load failures.
///
/// Recoverable problems (missing includes, include cycles, missing assets)
/// never appear here; they are reported through
/// [`Diagnostics`](super::Diagnostics) on the loaded model.
///
/// # Example
///
/// ```ignore
/// match session.load_from_directory(files).await {
///     Ok(model) if model.status().is_clean() => { /* loaded cleanly */ }
///     Ok(model) => eprintln!("{}", model.diagnostics),
///     Err(LoadError::Superseded { .. }) => { /* a newer load won */ }
///     Err(e) => eprintln!("failed to load: {e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum LoadError {
    /// No file with a recognized description extension was supplied.
    #[error("no robot description found among the supplied files")]
    NoDescriptionFound,

    /// The entry document could not be read.
    #[error("cannot read entry document {path}: {reason}")]
    UnreadableRoot {
        /// Entry document path.
        path: String,
        /// Why reading failed.
        reason: String,
    },

    /// The flattened document was rejected by the description parser.
    #[error("failed to parse robot description: {message}")]
    ParseFailure {
        /// Message from the parser.
        message: String,
    },

    /// A newer load started before this one could commit.
    #[error("load {generation} was superseded by a newer load")]
    Superseded {
        /// Generation of the discarded load.
        generation: u64,
    },

    /// The sample manifest is missing, unconfigured or malformed.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// Local I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl LoadError {
    /// Create an unreadable-root error.
    pub fn unreadable_root(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::UnreadableRoot {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a parse failure from the parser's message.
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::ParseFailure {
            message: message.into(),
        }
    }

    /// Whether this error only means a newer load took over.
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}

/// The entry point selector was given no candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no entry document among the candidates")]
pub struct NoEntryFound;

impl From<NoEntryFound> for LoadError {
    fn from(_: NoEntryFound) -> Self {
        Self::NoDescriptionFound
    }
}
