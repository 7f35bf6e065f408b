//! Bibliographic source adapters behind a common trait.
//!
//! Every external API is wrapped by a type implementing [`Source`]. An
//! adapter translates a [`SearchQuery`] into the wire parameters of its API,
//! performs the request through the shared [`HttpClient`](crate::utils::HttpClient),
//! and normalizes the records it gets back into [`Paper`]s. Records that
//! cannot be turned into a valid paper are dropped one by one; only failures
//! of the request as a whole surface as a [`SourceError`].
//!
//! Adapters are collected in a [`SourceRegistry`], built once at startup
//! from the [`Config`](crate::config::Config):
//!
//! ```rust,no_run
//! use hedwig::config::Config;
//! use hedwig::sources::SourceRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SourceRegistry::new(&Config::default())?;
//! for source in registry.all() {
//!     println!("{} ({})", source.name(), source.id());
//! }
//! # Ok(())
//! # }
//! ```

mod arxiv;
mod crossref;
pub mod mock;
mod openalex;
mod registry;

pub use arxiv::ArxivSource;
pub use crossref::CrossRefSource;
pub use mock::MockSource;
pub use openalex::OpenAlexSource;
pub use registry::{SourceCapabilities, SourceRegistry};

use async_trait::async_trait;

use crate::models::{Paper, SearchQuery, SourceType};

/// The Source trait defines the interface every bibliographic source implements.
///
/// # Implementing a New Source
///
/// 1. Add a variant to [`SourceType`]
/// 2. Create a struct that implements `Source`
/// 3. Register it in `SourceRegistry::new()`
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Which of the known sources this adapter serves
    fn source_type(&self) -> SourceType;

    /// Stable identifier, e.g. "arxiv"
    fn id(&self) -> &str {
        self.source_type().id()
    }

    /// Human-readable name, e.g. "arXiv"
    fn name(&self) -> &str {
        self.source_type().name()
    }

    /// What the source honors server-side
    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    /// Search for papers matching the query.
    ///
    /// Returns at most `query.max_results()` papers in the order the source
    /// ranked them.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError>;
}

/// Errors that can occur when querying a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The request or the retry deadline timed out
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The source answered with an unexpected status
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimit,

    /// The response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_builder() {
            SourceError::InvalidRequest(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::InvalidRequest(format!("bad URL: {}", err))
    }
}
