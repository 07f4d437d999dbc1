//! Remote content transport.
//!
//! Everything remote (manifest, included fragments from hosted samples,
//! asset probes) goes through a [`Transport`], so loads can run against an
//! in-memory map in tests and against HTTP in production.
//!
//! | Transport         | Use                                   |
//! |-------------------|---------------------------------------|
//! | [`NoTransport`]   | Offline; every request fails          |
//! | [`MapTransport`]  | In-memory URL → bytes, for tests      |
//! | `HttpTransport`   | HTTP via `reqwest` (feature `http`)   |

use std::future::Future;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors from remote requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Nothing exists at the URL.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },

    /// No transport is available.
    #[error("offline: cannot fetch {0}")]
    Offline(String),

    /// Connection or protocol failure.
    #[error("request failed: {0}")]
    Http(String),
}

/// Fetches remote content.
pub trait Transport: Send + Sync {
    /// Fetch the full body at `url`.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    /// Metadata-only probe: whether something is fetchable at `url`.
    ///
    /// Only a definite "not found" answer is `Ok(false)`.
    fn exists(&self, url: &str) -> impl Future<Output = Result<bool, TransportError>> + Send;
}

// =============================================================================
// NoTransport
// =============================================================================

/// Transport for offline use. Every request fails with
/// [`TransportError::Offline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransport;

impl Transport for NoTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Offline(url.to_string()))
    }

    async fn exists(&self, url: &str) -> Result<bool, TransportError> {
        Err(TransportError::Offline(url.to_string()))
    }
}

// =============================================================================
// MapTransport
// =============================================================================

/// In-memory transport keyed by URL.
///
/// # Example
///
/// ```
/// use robot_assembly::resource::transport::{MapTransport, Transport};
///
/// let mut transport = MapTransport::new();
/// transport.insert("https://host/samples/r.urdf", "<robot/>");
///
/// # tokio_test_block(async {
/// assert!(transport.exists("https://host/samples/r.urdf").await.unwrap());
/// assert!(!transport.exists("https://host/samples/none.urdf").await.unwrap());
/// # });
/// # fn tokio_test_block(f: impl std::future::Future<Output = ()>) {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapTransport {
    entries: FxHashMap<String, Vec<u8>>,
}

impl MapTransport {
    /// Create an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve text content at `url`.
    pub fn insert(&mut self, url: impl Into<String>, content: impl Into<String>) {
        self.insert_bytes(url, content.into().into_bytes());
    }

    /// Serve binary content at `url`.
    pub fn insert_bytes(&mut self, url: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.entries.insert(url.into(), content.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, url: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(url, content);
        self
    }

    /// Number of served URLs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is served.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Transport for MapTransport {
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.entries
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(url.to_string()))
    }

    async fn exists(&self, url: &str) -> Result<bool, TransportError> {
        Ok(self.entries.contains_key(url))
    }
}

// =============================================================================
// HttpTransport
// =============================================================================

#[cfg(feature = "http")]
pub use http::HttpTransport;

#[cfg(feature = "http")]
mod http {
    use reqwest::{Client, StatusCode};

    use super::{Transport, TransportError};
    use crate::config::Config;

    /// HTTP transport backed by `reqwest`.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        client: Client,
    }

    impl HttpTransport {
        /// Create a transport using the user agent and timeout from `config`.
        pub fn new(config: &Config) -> Self {
            let client = Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(config.request_timeout)
                .build()
                .unwrap_or_else(|_| Client::new());
            Self::with_client(client)
        }

        /// Wrap an existing client.
        pub fn with_client(client: Client) -> Self {
            Self { client }
        }
    }

    impl Default for HttpTransport {
        fn default() -> Self {
            Self::new(&Config::default())
        }
    }

    fn status_error(url: &str, status: StatusCode) -> TransportError {
        if status == StatusCode::NOT_FOUND {
            TransportError::NotFound(url.to_string())
        } else {
            TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }
        }
    }

    impl Transport for HttpTransport {
        async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
            log::debug!("GET {url}");
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| TransportError::Http(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(status_error(url, status));
            }
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError::Http(e.to_string()))?;
            Ok(body.to_vec())
        }

        async fn exists(&self, url: &str) -> Result<bool, TransportError> {
            log::debug!("HEAD {url}");
            let response = self
                .client
                .head(url)
                .send()
                .await
                .map_err(|e| TransportError::Http(e.to_string()))?;

            let status = response.status();
            match status {
                s if s.is_success() => Ok(true),
                StatusCode::NOT_FOUND | StatusCode::GONE => Ok(false),
                s => Err(status_error(url, s)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_map_transport() {
        let transport = MapTransport::new().with("https://h/a.urdf", "<robot/>");
        assert_eq!(transport.get("https://h/a.urdf").await.unwrap(), b"<robot/>");
        assert_eq!(
            transport.get("https://h/b.urdf").await.unwrap_err(),
            TransportError::NotFound("https://h/b.urdf".into())
        );
        assert!(transport.exists("https://h/a.urdf").await.unwrap());
        assert!(!transport.exists("https://h/b.urdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_no_transport_is_offline() {
        let err = NoTransport.get("https://h/a.urdf").await.unwrap_err();
        assert!(matches!(err, TransportError::Offline(_)));
        assert!(NoTransport.exists("https://h/a.urdf").await.is_err());
    }

    #[test]
    fn test_error_display() {
        let err = TransportError::Status {
            url: "https://h/a".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "https://h/a returned status 503");
    }
}
