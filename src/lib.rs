//! # Hedwig
//!
//! Search research papers across arXiv, OpenAlex and Crossref at once and get
//! back one ranked, deduplicated list.
//!
//! ## Architecture
//!
//! - [`models`]: Papers, search requests and queries, and the aggregation report
//! - [`sources`]: One adapter per bibliographic API behind the [`Source`] trait
//! - [`aggregator`]: Concurrent fan-out, merge, deduplication and sorting
//! - [`mcp`]: MCP server exposing the search as tools
//! - [`utils`]: HTTP client, retry and deduplication helpers
//! - [`config`]: Layered configuration
//! - [`ui`]: Terminal output helpers for the CLI
//!
//! ```rust,no_run
//! use hedwig::{Aggregator, SearchRequest, SortBy};
//! use hedwig::config::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), hedwig::Error> {
//! let aggregator = Aggregator::from_config(&Config::default())?;
//! let report = aggregator
//!     .search_request(SearchRequest::new("graph neural networks").sort_by(SortBy::Date))
//!     .await?;
//! for paper in &report.papers {
//!     println!("{} ({})", paper.title(), paper.source());
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use aggregator::Aggregator;
pub use error::Error;
pub use models::{AggregationReport, Paper, SearchQuery, SearchRequest, SortBy, SourceType};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
