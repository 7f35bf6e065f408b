//! Search request and validated query models.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use super::paper::SourceType;

/// Smallest accepted result bound
pub const MIN_RESULTS: usize = 1;
/// Largest accepted result bound
pub const MAX_RESULTS: usize = 50;
/// Result bound used when a request does not specify one
pub const DEFAULT_MAX_RESULTS: usize = 5;
/// Longest accepted query string, in characters
pub const MAX_QUERY_LENGTH: usize = 500;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Sort field for search results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Date,
    #[serde(alias = "citations")]
    CitationCount,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Relevance => "relevance",
            SortBy::Date => "date",
            SortBy::CitationCount => "citation_count",
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortBy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "date" => Ok(SortBy::Date),
            "citation_count" | "citations" => Ok(SortBy::CitationCount),
            other => Err(ValidationError::UnknownSortCriterion(other.to_string())),
        }
    }
}

/// Problems found while validating a search request
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Search query cannot be empty")]
    EmptyQuery,

    #[error("Search query cannot exceed 500 characters")]
    QueryTooLong,

    #[error("Max results must be between 1 and 50, got {0}")]
    MaxResultsOutOfRange(usize),

    #[error("Sources list cannot be empty if provided")]
    EmptySources,

    #[error("Invalid source '{name}'. Valid sources are: {valid}")]
    UnknownSource { name: String, valid: String },

    #[error("Unknown sort criterion '{0}'. Use relevance, date or citation_count")]
    UnknownSortCriterion(String),

    #[error("Invalid {field} '{value}': date must be in YYYY-MM-DD format")]
    MalformedDate { field: &'static str, value: String },

    #[error("date_from ({from}) must not be after date_to ({to})")]
    InvertedDateRange { from: NaiveDate, to: NaiveDate },
}

/// Raw search parameters as received from a caller (CLI, MCP tool, library user).
///
/// Nothing is checked here; call [`SearchRequest::validate`] to obtain a
/// [`SearchQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Research problem or topic to search for
    pub query: String,

    /// Maximum number of results to return
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Sort criterion
    #[serde(default)]
    pub sort_by: SortBy,

    /// Sources to search; all sources when absent
    #[serde(default, deserialize_with = "deserialize_source_list")]
    pub sources: Option<Vec<String>>,

    /// Inclusive lower date bound (YYYY-MM-DD)
    #[serde(default)]
    pub date_from: Option<String>,

    /// Inclusive upper date bound (YYYY-MM-DD)
    #[serde(default)]
    pub date_to: Option<String>,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

/// Accept either a JSON list of names or a single comma-separated string
fn deserialize_source_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SourceList {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Option::<SourceList>::deserialize(deserializer)? {
        None => None,
        Some(SourceList::List(list)) => Some(list),
        // an empty string means "no restriction"
        Some(SourceList::Csv(csv)) => Some(parse_source_list(&csv)).filter(|list| !list.is_empty()),
    })
}

/// Split a comma-separated source list, dropping empty segments
pub fn parse_source_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl SearchRequest {
    /// Create a new request with default parameters
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: DEFAULT_MAX_RESULTS,
            sort_by: SortBy::default(),
            sources: None,
            date_from: None,
            date_to: None,
        }
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Set sort criterion
    pub fn sort_by(mut self, sort: SortBy) -> Self {
        self.sort_by = sort;
        self
    }

    /// Restrict the search to the named sources
    pub fn sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Set the inclusive lower date bound
    pub fn date_from(mut self, date: impl Into<String>) -> Self {
        self.date_from = Some(date.into());
        self
    }

    /// Set the inclusive upper date bound
    pub fn date_to(mut self, date: impl Into<String>) -> Self {
        self.date_to = Some(date.into());
        self
    }

    /// Check every parameter and produce an immutable [`SearchQuery`]
    pub fn validate(self) -> Result<SearchQuery, ValidationError> {
        if self.query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        if self.query.chars().count() > MAX_QUERY_LENGTH {
            return Err(ValidationError::QueryTooLong);
        }
        if !(MIN_RESULTS..=MAX_RESULTS).contains(&self.max_results) {
            return Err(ValidationError::MaxResultsOutOfRange(self.max_results));
        }

        let sources = match self.sources {
            None => SourceType::ALL.to_vec(),
            Some(names) => resolve_sources(&names)?,
        };

        let date_range = DateRange {
            from: parse_date("date_from", self.date_from.as_deref())?,
            to: parse_date("date_to", self.date_to.as_deref())?,
        };
        if let (Some(from), Some(to)) = (date_range.from, date_range.to) {
            if from > to {
                return Err(ValidationError::InvertedDateRange { from, to });
            }
        }

        Ok(SearchQuery {
            query: self.query,
            max_results: self.max_results,
            sort_by: self.sort_by,
            sources,
            date_range,
        })
    }
}

impl TryFrom<SearchRequest> for SearchQuery {
    type Error = ValidationError;

    fn try_from(request: SearchRequest) -> Result<Self, Self::Error> {
        request.validate()
    }
}

fn resolve_sources(names: &[String]) -> Result<Vec<SourceType>, ValidationError> {
    if names.is_empty() {
        return Err(ValidationError::EmptySources);
    }

    let mut resolved = Vec::with_capacity(names.len());
    for name in names {
        let source = name
            .parse::<SourceType>()
            .map_err(|_| ValidationError::UnknownSource {
                name: name.clone(),
                valid: SourceType::known_ids(),
            })?;
        if !resolved.contains(&source) {
            resolved.push(source);
        }
    }
    Ok(resolved)
}

fn parse_date(field: &'static str, value: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    value
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| {
                ValidationError::MalformedDate {
                    field,
                    value: raw.to_string(),
                }
            })
        })
        .transpose()
}

/// Inclusive publication date bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn is_empty(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Validated, immutable search parameters shared by every source adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    query: String,
    max_results: usize,
    sort_by: SortBy,
    sources: Vec<SourceType>,
    date_range: DateRange,
}

impl SearchQuery {
    /// Shorthand for validating a request with defaults for everything but the text
    pub fn new(query: impl Into<String>) -> Result<Self, ValidationError> {
        SearchRequest::new(query).validate()
    }

    /// The query string exactly as supplied
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Trimmed, lower-cased query text
    pub fn normalized_query(&self) -> String {
        self.query.trim().to_lowercase()
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    /// Sources to query, in fan-out order
    pub fn enabled_sources(&self) -> &[SourceType] {
        &self.sources
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }
}
