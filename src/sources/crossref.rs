//! Crossref source implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use url::Url;

use crate::models::{Author, Paper, PaperBuilder, SearchQuery, SortBy, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};
use crate::utils::{with_retry, HttpClient, RetryConfig};

const CROSSREF_API_BASE: &str = "https://api.crossref.org";
const DOI_URL_PREFIX: &str = "https://doi.org/";
const MAX_CATEGORIES: usize = 5;

/// Crossref research source
///
/// The polite pool is selected through the client's User-Agent, so a
/// contact address is configured on the [`HttpClient`] rather than here.
#[derive(Debug, Clone)]
pub struct CrossRefSource {
    client: HttpClient,
    retry: RetryConfig,
    base_url: String,
}

impl CrossRefSource {
    /// Create a new Crossref source
    pub fn new(client: HttpClient, retry: RetryConfig) -> Self {
        Self {
            client,
            retry,
            base_url: CROSSREF_API_BASE.to_string(),
        }
    }

    /// Point the source at another host
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn sort_param(sort_by: SortBy) -> &'static str {
        match sort_by {
            SortBy::Relevance => "relevance",
            SortBy::Date => "published",
            SortBy::CitationCount => "is-referenced-by-count",
        }
    }

    fn filter_param(query: &SearchQuery) -> String {
        let range = query.date_range();
        let mut filters = vec!["type:journal-article,type:proceedings-article".to_string()];
        if let Some(from) = range.from {
            filters.push(format!("from-pub-date:{}", from));
        }
        if let Some(to) = range.to {
            filters.push(format!("until-pub-date:{}", to));
        }
        filters.push("has-abstract:true".to_string());
        filters.join(",")
    }

    fn search_url(&self, query: &SearchQuery) -> Result<Url, SourceError> {
        let mut url = Url::parse(&format!("{}/works", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("query", query.query().trim())
            .append_pair("rows", &query.max_results().to_string())
            .append_pair("sort", Self::sort_param(query.sort_by()))
            .append_pair("order", "desc")
            .append_pair("filter", &Self::filter_param(query));
        Ok(url)
    }

    /// Convert one work item into a Paper
    fn parse_item(item: CRItem) -> Result<Paper, SourceError> {
        let doi = item.doi.filter(|d| !d.trim().is_empty());
        let id = match (&doi, &item.url) {
            (Some(doi), _) => format!("crossref:{}", doi),
            (None, Some(url)) => format!("crossref:{}", url),
            (None, None) => return Err(SourceError::Parse("item without DOI or URL".to_string())),
        };

        let title = item.title.into_iter().next().unwrap_or_default();
        let abstract_text = item.r#abstract.as_deref().map(strip_markup).unwrap_or_default();

        let authors = item
            .author
            .into_iter()
            .filter_map(|a| {
                let family = a.family.filter(|f| !f.trim().is_empty())?;
                let name = match a.given {
                    Some(given) => format!("{} {}", given.trim(), family.trim()),
                    None => family,
                };
                let mut author = Author::new(name);
                if let Some(affiliation) = a.affiliation.into_iter().find_map(|af| af.name) {
                    author = author.with_affiliation(affiliation);
                }
                if let Some(orcid) = a.orcid {
                    author = author.with_orcid(orcid);
                }
                Some(author)
            })
            .collect();

        let categories = item.subject.into_iter().take(MAX_CATEGORIES).collect();

        let url = match &doi {
            Some(doi) => format!("{}{}", DOI_URL_PREFIX, doi),
            None => item.url.clone().unwrap_or_default(),
        };

        let mut builder = PaperBuilder::new(id.clone(), title, url, SourceType::CrossRef)
            .authors(authors)
            .abstract_text(abstract_text)
            .categories(categories)
            .citation_count(item.is_referenced_by_count.unwrap_or(0));

        if let Some(date) = item
            .published_print
            .or(item.published_online)
            .and_then(|d| d.to_datetime())
        {
            builder = builder.published_date(date);
        }
        if let Some(doi) = doi {
            builder = builder.doi(doi);
        }

        builder
            .build()
            .map_err(|e| SourceError::Parse(format!("item {}: {}", id, e)))
    }

    fn collect_papers(data: CRResponse) -> Vec<Paper> {
        data.message
            .items
            .into_iter()
            .filter_map(|item| match Self::parse_item(item) {
                Ok(paper) => Some(paper),
                Err(e) => {
                    tracing::debug!(source = "crossref", error = %e, "Skipping malformed item");
                    None
                }
            })
            .collect()
    }
}

/// JATS heading plus any remaining tag
static MARKUP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<jats:title>.*?</jats:title>|<[^>]+>").expect("valid regex")
});

/// Remove JATS/XML markup from an abstract, including its heading
fn strip_markup(text: &str) -> String {
    MARKUP_RE
        .replace_all(text, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl Source for CrossRefSource {
    fn source_type(&self) -> SourceType {
        SourceType::CrossRef
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
            | SourceCapabilities::DATE_FILTER
            | SourceCapabilities::SORT_BY_DATE
            | SourceCapabilities::SORT_BY_CITATIONS
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        let url = self.search_url(query)?;
        tracing::debug!(source = "crossref", %url, "Searching");

        let data: CRResponse = with_retry(self.retry, || self.client.get_json(url.as_str())).await?;
        let mut papers = Self::collect_papers(data);
        papers.truncate(query.max_results());
        Ok(papers)
    }
}

// Crossref API response types

#[derive(Debug, Deserialize)]
struct CRResponse {
    message: CRMessage,
}

#[derive(Debug, Deserialize)]
struct CRMessage {
    #[serde(default)]
    items: Vec<CRItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CRItem {
    #[serde(rename = "DOI")]
    doi: Option<String>,
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(default)]
    title: Vec<String>,
    r#abstract: Option<String>,
    #[serde(default)]
    author: Vec<CRAuthor>,
    #[serde(default)]
    subject: Vec<String>,
    published_print: Option<CRDate>,
    published_online: Option<CRDate>,
    is_referenced_by_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CRAuthor {
    given: Option<String>,
    family: Option<String>,
    #[serde(rename = "ORCID")]
    orcid: Option<String>,
    #[serde(default)]
    affiliation: Vec<CRAffiliation>,
}

#[derive(Debug, Deserialize)]
struct CRAffiliation {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CRDate {
    #[serde(rename = "date-parts", default)]
    date_parts: Vec<Vec<Option<i32>>>,
}

impl CRDate {
    /// First date-parts entry; missing month or day default to 1
    fn to_datetime(&self) -> Option<NaiveDateTime> {
        let parts = self.date_parts.first()?;
        let year = (*parts.first()?)?;
        let month = parts.get(1).copied().flatten().unwrap_or(1);
        let day = parts.get(2).copied().flatten().unwrap_or(1);
        NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)?
            .and_hms_opt(0, 0, 0)
    }
}
