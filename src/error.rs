//! Crate-level error type.

use crate::config::ConfigError;
use crate::models::ValidationError;
use crate::sources::SourceError;

/// Errors surfaced by the public entry points
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The search request was rejected before any source was contacted
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A source could not be set up
    #[error("Source setup failed: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Whether the caller sent bad input
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
