//! Concurrent fan-out over the enabled sources and merge of their results.
//!
//! # Pipeline
//!
//! 1. Resolve the enabled sources from the query
//! 2. Spawn one task per source; every task is started before any is awaited
//! 3. Join the tasks in enabled-source order, turning errors and panics into
//!    per-source diagnostics
//! 4. Concatenate the successful lists in enabled-source order
//! 5. Deduplicate by DOI and normalized title, first occurrence wins
//! 6. Sort according to the query
//! 7. Truncate to `max_results`
//! 8. Assemble the [`AggregationReport`]
//!
//! A failing source never fails the search; the report carries its
//! diagnostic instead.

mod rank;

pub use rank::sort_papers;

use futures_util::future::join_all;
use std::sync::Arc;
use tracing::Instrument;

use crate::config::Config;
use crate::error::Error;
use crate::models::{AggregationReport, Paper, SearchQuery, SearchRequest, SourceResult, SourceType};
use crate::sources::SourceRegistry;
use crate::utils::deduplicate_papers;

/// Diagnostic for a requested source that has no adapter
const NOT_CONFIGURED: &str = "source is not configured";

/// What one source task produced
#[derive(Debug)]
enum SourceOutcome {
    Papers(Vec<Paper>),
    Failed(String),
}

/// Searches every enabled source concurrently and merges the results
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
}

impl Aggregator {
    /// Create an aggregator over the given sources
    pub fn new(registry: SourceRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    /// Build the source registry from configuration
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Ok(Self::new(SourceRegistry::new(config)?))
    }

    /// The registered sources
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Validate a raw request, then search.
    ///
    /// No source is contacted when validation fails.
    pub async fn search_request(&self, request: SearchRequest) -> Result<AggregationReport, Error> {
        let query = request.validate()?;
        Ok(self.search(&query).await)
    }

    /// Search all sources enabled by `query` and merge their results
    pub async fn search(&self, query: &SearchQuery) -> AggregationReport {
        let span = tracing::info_span!(
            "search",
            query = %query.query(),
            sources = query.enabled_sources().len(),
            max_results = query.max_results(),
        );
        self.run(query).instrument(span).await
    }

    async fn run(&self, query: &SearchQuery) -> AggregationReport {
        let outcomes = self.fan_out(query).await;

        let mut merged: Vec<Paper> = Vec::new();
        let mut per_source: Vec<(SourceType, SourceResult)> = Vec::with_capacity(outcomes.len());

        for (source, outcome) in outcomes {
            match outcome {
                SourceOutcome::Papers(papers) => {
                    tracing::debug!(%source, count = papers.len(), "Source returned results");
                    merged.extend(papers.iter().cloned());
                    per_source.push((source, SourceResult::success(papers)));
                }
                SourceOutcome::Failed(error) => {
                    tracing::warn!(%source, %error, "Source query failed");
                    per_source.push((source, SourceResult::failure(error)));
                }
            }
        }

        let merged_count = merged.len();
        let mut papers = deduplicate_papers(merged);
        sort_papers(&mut papers, query.sort_by());
        papers.truncate(query.max_results());

        tracing::info!(
            merged = merged_count,
            returned = papers.len(),
            "Search complete"
        );

        AggregationReport::new(query, papers, per_source)
    }

    /// Query every enabled source concurrently.
    ///
    /// Outcomes come back in enabled-source order regardless of which task
    /// finished first.
    async fn fan_out(&self, query: &SearchQuery) -> Vec<(SourceType, SourceOutcome)> {
        let shared = Arc::new(query.clone());

        let handles: Vec<_> = query
            .enabled_sources()
            .iter()
            .map(|&source_type| {
                let handle = self.registry.get(source_type).map(|source| {
                    let source = Arc::clone(source);
                    let query = Arc::clone(&shared);
                    tokio::spawn(
                        async move {
                            match source.search(&query).await {
                                Ok(papers) => SourceOutcome::Papers(papers),
                                Err(e) => SourceOutcome::Failed(e.to_string()),
                            }
                        }
                        .in_current_span(),
                    )
                });
                (source_type, handle)
            })
            .collect();

        join_all(handles.into_iter().map(|(source_type, handle)| async move {
            let outcome = match handle {
                Some(handle) => handle.await.unwrap_or_else(|e| {
                    SourceOutcome::Failed(format!("source task failed: {}", e))
                }),
                None => SourceOutcome::Failed(NOT_CONFIGURED.to_string()),
            };
            (source_type, outcome)
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortBy;
    use crate::sources::mock::make_paper;
    use crate::sources::MockSource;

    fn registry(sources: Vec<MockSource>) -> SourceRegistry {
        let mut registry = SourceRegistry::empty();
        for source in sources {
            registry.register(Arc::new(source));
        }
        registry
    }

    #[tokio::test]
    async fn test_merge_in_enabled_order() {
        let aggregator = Aggregator::new(registry(vec![
            MockSource::new(SourceType::Arxiv)
                .with_papers(vec![make_paper(SourceType::Arxiv, "1", "From arXiv")]),
            MockSource::new(SourceType::OpenAlex)
                .with_papers(vec![make_paper(SourceType::OpenAlex, "W1", "From OpenAlex")]),
        ]));

        let query = SearchRequest::new("q")
            .sources(["openalex", "arxiv"])
            .validate()
            .unwrap();
        let report = aggregator.search(&query).await;

        let ids: Vec<&str> = report.papers.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["openalex:W1", "arxiv:1"]);
    }

    #[tokio::test]
    async fn test_unconfigured_source_reported() {
        let aggregator = Aggregator::new(registry(vec![MockSource::new(SourceType::Arxiv)]));

        let query = SearchQuery::new("q").unwrap();
        let report = aggregator.search(&query).await;

        assert_eq!(report.sources.len(), 3);
        assert_eq!(
            report.source(SourceType::CrossRef).unwrap().error.as_deref(),
            Some(NOT_CONFIGURED)
        );
        assert!(!report.source(SourceType::Arxiv).unwrap().is_failure());
    }

    #[tokio::test]
    async fn test_search_request_validation_error() {
        let aggregator = Aggregator::new(SourceRegistry::empty());

        let err = aggregator
            .search_request(SearchRequest::new("   "))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_sort_and_truncate_after_dedup() {
        let aggregator = Aggregator::new(registry(vec![MockSource::new(SourceType::OpenAlex)
            .with_papers(vec![
                crate::sources::mock::paper_builder(SourceType::OpenAlex, "a", "A")
                    .citation_count(1)
                    .build()
                    .unwrap(),
                crate::sources::mock::paper_builder(SourceType::OpenAlex, "b", "B")
                    .citation_count(9)
                    .build()
                    .unwrap(),
                crate::sources::mock::paper_builder(SourceType::OpenAlex, "a2", "a")
                    .citation_count(50)
                    .build()
                    .unwrap(),
            ])]));

        let query = SearchRequest::new("q")
            .sources(["openalex"])
            .sort_by(SortBy::CitationCount)
            .max_results(1)
            .validate()
            .unwrap();
        let report = aggregator.search(&query).await;

        assert_eq!(report.total_results, 1);
        assert_eq!(report.papers[0].id(), "openalex:b");
        assert_eq!(report.source(SourceType::OpenAlex).unwrap().count, 3);
    }
}
