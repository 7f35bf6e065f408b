//! OpenAlex source implementation.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

use crate::models::{Author, Paper, PaperBuilder, SearchQuery, SortBy, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{with_retry, HttpClient, RetryConfig};

const OPENALEX_API_BASE: &str = "https://api.openalex.org";
const DOI_URL_PREFIX: &str = "https://doi.org/";
const MAX_CATEGORIES: usize = 5;

/// OpenAlex research source
///
/// Uses the OpenAlex REST API. Setting a contact email routes requests to
/// the polite pool.
#[derive(Debug, Clone)]
pub struct OpenAlexSource {
    client: HttpClient,
    retry: RetryConfig,
    base_url: String,
    mailto: Option<String>,
}

impl OpenAlexSource {
    /// Create a new OpenAlex source
    pub fn new(client: HttpClient, retry: RetryConfig) -> Self {
        Self {
            client,
            retry,
            base_url: OPENALEX_API_BASE.to_string(),
            mailto: None,
        }
    }

    /// Point the source at another host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Contact email sent as `mailto` (recommended for better rate limits)
    pub fn with_mailto(mut self, mailto: impl Into<String>) -> Self {
        self.mailto = Some(mailto.into());
        self
    }

    fn sort_param(sort_by: SortBy) -> &'static str {
        match sort_by {
            SortBy::Relevance => "relevance_score:desc",
            SortBy::Date => "publication_date:desc",
            SortBy::CitationCount => "cited_by_count:desc",
        }
    }

    fn filter_param(query: &SearchQuery) -> String {
        let range = query.date_range();
        let mut filters = Vec::new();
        if let Some(from) = range.from {
            filters.push(format!("from_publication_date:{}", from));
        }
        if let Some(to) = range.to {
            filters.push(format!("to_publication_date:{}", to));
        }
        filters.push("has_abstract:true".to_string());
        filters.join(",")
    }

    fn search_url(&self, query: &SearchQuery) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!("{}/works", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("search", query.query().trim())
                .append_pair("per-page", &query.max_results().to_string())
                .append_pair("sort", Self::sort_param(query.sort_by()))
                .append_pair("filter", &Self::filter_param(query));
            if let Some(mailto) = &self.mailto {
                pairs.append_pair("mailto", mailto);
            }
        }
        Ok(url)
    }

    /// Convert one work into a Paper
    fn parse_work(work: OAWork) -> Result<Paper, SourceError> {
        let openalex_id = work
            .id
            .as_deref()
            .and_then(|id| id.rsplit('/').next())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| SourceError::Parse("work without id".to_string()))?
            .to_string();

        let abstract_text = work
            .r#abstract
            .filter(|a| !a.trim().is_empty())
            .or_else(|| work.abstract_inverted_index.as_ref().map(rebuild_abstract))
            .unwrap_or_default();

        let authors = work
            .authorships
            .into_iter()
            .filter_map(|authorship| {
                let name = authorship
                    .author
                    .display_name
                    .filter(|n| !n.trim().is_empty())?;
                let mut author = Author::new(name);
                if let Some(orcid) = authorship.author.orcid {
                    author = author.with_orcid(orcid);
                }
                if let Some(affiliation) = authorship
                    .institutions
                    .into_iter()
                    .find_map(|i| i.display_name)
                {
                    author = author.with_affiliation(affiliation);
                }
                Some(author)
            })
            .collect();

        let categories = work
            .concepts
            .into_iter()
            .filter_map(|c| c.display_name)
            .take(MAX_CATEGORIES)
            .collect();

        let doi = work
            .doi
            .map(|doi| doi.trim_start_matches(DOI_URL_PREFIX).to_string())
            .filter(|doi| !doi.is_empty());

        let url = match &doi {
            Some(doi) => format!("{}{}", DOI_URL_PREFIX, doi),
            None => work.id.clone().unwrap_or_default(),
        };

        let title = work.title.or(work.display_name).unwrap_or_default();

        let mut builder = PaperBuilder::new(
            format!("openalex:{}", openalex_id),
            title,
            url,
            SourceType::OpenAlex,
        )
        .authors(authors)
        .abstract_text(abstract_text)
        .categories(categories)
        .citation_count(work.cited_by_count.unwrap_or(0));

        if let Some(date) = work.publication_date.as_deref() {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| SourceError::Parse(format!("bad publication_date '{}': {}", date, e)))?;
            builder = builder.published_date(date.and_time(chrono::NaiveTime::MIN));
        }
        if let Some(doi) = doi {
            builder = builder.doi(doi);
        }

        builder
            .build()
            .map_err(|e| SourceError::Parse(format!("work {}: {}", openalex_id, e)))
    }

    fn collect_papers(data: WorksResponse) -> Vec<Paper> {
        data.results
            .into_iter()
            .filter_map(|work| match Self::parse_work(work) {
                Ok(paper) => Some(paper),
                Err(e) => {
                    tracing::debug!(source = "openalex", error = %e, "Skipping malformed work");
                    None
                }
            })
            .collect()
    }
}

/// Rebuild plain text from an inverted index of word -> positions
fn rebuild_abstract(index: &HashMap<String, Vec<usize>>) -> String {
    let mut positioned: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&p| (p, word.as_str())))
        .collect();
    positioned.sort_by_key(|(position, _)| *position);
    positioned
        .into_iter()
        .map(|(_, word)| word)
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Source for OpenAlexSource {
    fn source_type(&self) -> SourceType {
        SourceType::OpenAlex
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
            | SourceCapabilities::DATE_FILTER
            | SourceCapabilities::SORT_BY_DATE
            | SourceCapabilities::SORT_BY_CITATIONS
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        let url = self.search_url(query)?;
        tracing::debug!(source = "openalex", %url, "Searching");

        let data: WorksResponse =
            with_retry(self.retry, || self.client.get_json(url.as_str())).await?;
        let mut papers = Self::collect_papers(data);
        papers.truncate(query.max_results());
        Ok(papers)
    }
}

// OpenAlex API response types

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<OAWork>,
}

#[derive(Debug, Deserialize)]
struct OAWork {
    id: Option<String>,
    title: Option<String>,
    display_name: Option<String>,
    doi: Option<String>,
    publication_date: Option<String>,
    r#abstract: Option<String>,
    abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
    #[serde(default)]
    authorships: Vec<OAAuthorship>,
    #[serde(default)]
    concepts: Vec<OAConcept>,
    cited_by_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OAAuthorship {
    author: OAAuthor,
    #[serde(default)]
    institutions: Vec<OAInstitution>,
}

#[derive(Debug, Deserialize)]
struct OAAuthor {
    display_name: Option<String>,
    orcid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAInstitution {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAConcept {
    display_name: Option<String>,
}
