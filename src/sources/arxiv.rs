//! arXiv source implementation (Atom feed API).

use async_trait::async_trait;
use chrono::NaiveDate;
use feed_rs::model::Entry;
use feed_rs::parser;
use url::Url;

use crate::models::{Author, DateRange, Paper, PaperBuilder, SearchQuery, SortBy, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{with_retry, HttpClient, RetryConfig};

/// Base URL for arXiv API
const ARXIV_BASE_URL: &str = "http://export.arxiv.org";
const QUERY_PATH: &str = "/api/query";

/// Lower bound used when only `date_to` is given
const EARLIEST_SUBMISSION: &str = "19910101";
/// Upper bound used when only `date_from` is given
const LATEST_SUBMISSION: &str = "99991231";

/// arXiv preprint source
///
/// Supports:
/// - Search by query
/// - Submission date filtering
/// - Sorting by submission date
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    retry: RetryConfig,
    base_url: String,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new(client: HttpClient, retry: RetryConfig) -> Self {
        Self {
            client,
            retry,
            base_url: ARXIV_BASE_URL.to_string(),
        }
    }

    /// Point the source at another host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the `search_query` expression: every word must match
    fn build_search_query(query: &SearchQuery) -> String {
        let mut parts: Vec<String> = query
            .query()
            .split_whitespace()
            .map(|word| format!("all:{}", word))
            .collect();

        if let Some(clause) = Self::date_clause(query.date_range()) {
            parts.push(clause);
        }

        parts.join(" AND ")
    }

    fn date_clause(range: DateRange) -> Option<String> {
        if range.is_empty() {
            return None;
        }
        let day = |date: Option<NaiveDate>, fallback: &str| {
            date.map(|d| d.format("%Y%m%d").to_string())
                .unwrap_or_else(|| fallback.to_string())
        };
        Some(format!(
            "submittedDate:[{}0000 TO {}2359]",
            day(range.from, EARLIEST_SUBMISSION),
            day(range.to, LATEST_SUBMISSION)
        ))
    }

    fn sort_param(sort_by: SortBy) -> &'static str {
        match sort_by {
            SortBy::Date => "submittedDate",
            // No citation data on arXiv
            SortBy::Relevance | SortBy::CitationCount => "relevance",
        }
    }

    fn search_url(&self, query: &SearchQuery) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, QUERY_PATH))?;
        url.query_pairs_mut()
            .append_pair("search_query", &Self::build_search_query(query))
            .append_pair("start", "0")
            .append_pair("max_results", &query.max_results().to_string())
            .append_pair("sortBy", Self::sort_param(query.sort_by()))
            .append_pair("sortOrder", "descending");
        Ok(url)
    }

    /// Parse an Atom feed entry into a Paper
    fn parse_entry(entry: &Entry) -> Result<Paper, SourceError> {
        let local_id = entry
            .id
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SourceError::Parse("missing entry id".to_string()))?;

        let title = entry
            .title
            .as_ref()
            .map(|t| collapse_whitespace(&t.content))
            .unwrap_or_default();

        let abstract_text = entry
            .summary
            .as_ref()
            .map(|s| collapse_whitespace(&s.content))
            .unwrap_or_default();

        let authors = entry
            .authors
            .iter()
            .map(|a| a.name.trim())
            .filter(|name| !name.is_empty())
            .map(Author::new)
            .collect();

        let url = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .map(|l| l.href.clone())
            .unwrap_or_else(|| entry.id.clone());

        let categories = entry.categories.iter().map(|c| c.term.clone()).collect();

        let mut builder =
            PaperBuilder::new(format!("arxiv:{}", local_id), title, url, SourceType::Arxiv)
                .authors(authors)
                .abstract_text(abstract_text)
                .categories(categories);
        if let Some(published) = entry.published {
            builder = builder.published_date(published.naive_utc());
        }

        builder
            .build()
            .map_err(|e| SourceError::Parse(format!("entry {}: {}", local_id, e)))
    }

    fn parse_feed(body: &str) -> Result<Vec<Paper>, SourceError> {
        let feed = parser::parse(body.as_bytes())
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        Ok(feed
            .entries
            .iter()
            .filter_map(|entry| match Self::parse_entry(entry) {
                Ok(paper) => Some(paper),
                Err(e) => {
                    tracing::debug!(source = "arxiv", error = %e, "Skipping malformed entry");
                    None
                }
            })
            .collect())
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Source for ArxivSource {
    fn source_type(&self) -> SourceType {
        SourceType::Arxiv
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH | SourceCapabilities::DATE_FILTER | SourceCapabilities::SORT_BY_DATE
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        let url = self.search_url(query)?;
        tracing::debug!(source = "arxiv", %url, "Searching");

        let body = with_retry(self.retry, || self.client.get_text(url.as_str())).await?;
        let mut papers = Self::parse_feed(&body)?;
        papers.truncate(query.max_results());
        Ok(papers)
    }
}
