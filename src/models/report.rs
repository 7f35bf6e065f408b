//! Aggregated search report returned to callers.

use serde::Serialize;
use std::collections::BTreeMap;

use super::paper::{Paper, SourceType};
use super::search::{SearchQuery, SortBy};

/// What a single source contributed to a search
#[derive(Debug, Clone, Serialize)]
pub struct SourceResult {
    /// Papers as returned by the source, before deduplication
    pub papers: Vec<Paper>,

    /// Number of papers returned by the source
    pub count: usize,

    /// Failure diagnostic, when the source could not be searched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceResult {
    /// Create a result for a source that answered
    pub fn success(papers: Vec<Paper>) -> Self {
        Self {
            count: papers.len(),
            papers,
            error: None,
        }
    }

    /// Create a result for a source that failed
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            papers: Vec::new(),
            count: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// The search parameters that were actually applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchParams {
    pub max_results: usize,
    pub sort_by: SortBy,
    pub sources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

impl From<&SearchQuery> for SearchParams {
    fn from(query: &SearchQuery) -> Self {
        let range = query.date_range();
        Self {
            max_results: query.max_results(),
            sort_by: query.sort_by(),
            sources: query
                .enabled_sources()
                .iter()
                .map(|s| s.id().to_string())
                .collect(),
            date_from: range.from.map(|d| d.to_string()),
            date_to: range.to.map(|d| d.to_string()),
        }
    }
}

/// Merged, deduplicated, sorted and bounded search result
#[derive(Debug, Clone, Serialize)]
pub struct AggregationReport {
    /// The query string as supplied
    pub query: String,

    /// Number of papers in `papers`
    pub total_results: usize,

    /// Final ordered papers
    pub papers: Vec<Paper>,

    /// Per-source breakdown keyed by source id
    pub sources: BTreeMap<String, SourceResult>,

    /// Effective search parameters
    pub search_params: SearchParams,
}

impl AggregationReport {
    /// Assemble a report from the final paper list and per-source outcomes
    pub fn new(
        query: &SearchQuery,
        papers: Vec<Paper>,
        per_source: Vec<(SourceType, SourceResult)>,
    ) -> Self {
        Self {
            query: query.query().to_string(),
            total_results: papers.len(),
            papers,
            sources: per_source
                .into_iter()
                .map(|(source, result)| (source.id().to_string(), result))
                .collect(),
            search_params: SearchParams::from(query),
        }
    }

    /// Result entry for one source, if it was searched
    pub fn source(&self, source: SourceType) -> Option<&SourceResult> {
        self.sources.get(source.id())
    }

    /// Sources that failed, with their diagnostics
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sources
            .iter()
            .filter_map(|(id, result)| result.error.as_deref().map(|e| (id.as_str(), e)))
    }
}
