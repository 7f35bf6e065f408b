//! Core data models for research papers, search queries and reports.

mod paper;
mod report;
mod search;

pub use paper::{Author, Paper, PaperBuilder, PaperError, PaperRecord, SourceType, UnknownSource};
pub use report::{AggregationReport, SearchParams, SourceResult};
pub use search::{
    parse_source_list, DateRange, SearchQuery, SearchRequest, SortBy, ValidationError,
    DEFAULT_MAX_RESULTS, MAX_QUERY_LENGTH, MAX_RESULTS, MIN_RESULTS,
};
