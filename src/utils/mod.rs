//! Utility modules shared by the sources and the aggregator.
//!
//! - [`deduplicate_papers`]: Remove duplicate papers by DOI and normalized title
//! - [`HttpClient`]: reqwest client configured from the `[http]` settings
//! - [`RetryConfig`]: Configuration for retry logic with exponential backoff
//! - [`with_retry`]: Execute an operation with automatic retry on transient errors
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use hedwig::config::HttpConfig;
//! use hedwig::utils::{with_retry, HttpClient, RetryConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new(&HttpConfig::default())?;
//! let body = with_retry(RetryConfig::default(), || {
//!     client.get_text("https://api.openalex.org/works?search=rust")
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

mod dedup;
mod http;
mod retry;

pub use dedup::deduplicate_papers;
pub use http::HttpClient;
pub use retry::{with_retry, RetryConfig, TransientError};
