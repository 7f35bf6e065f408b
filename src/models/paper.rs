//! Paper model representing a normalized research paper from any source.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The source/repository where the paper was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Arxiv,
    OpenAlex,
    CrossRef,
}

impl SourceType {
    /// Every known source, in canonical fan-out order
    pub const ALL: [SourceType; 3] = [SourceType::Arxiv, SourceType::OpenAlex, SourceType::CrossRef];

    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            SourceType::Arxiv => "arXiv",
            SourceType::OpenAlex => "OpenAlex",
            SourceType::CrossRef => "Crossref",
        }
    }

    /// Returns the source identifier (used in paper ids, requests and reports)
    pub fn id(&self) -> &'static str {
        match self {
            SourceType::Arxiv => "arxiv",
            SourceType::OpenAlex => "openalex",
            SourceType::CrossRef => "crossref",
        }
    }

    /// Comma-separated list of every known source id
    pub fn known_ids() -> String {
        Self::ALL.iter().map(|s| s.id()).collect::<Vec<_>>().join(", ")
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SourceType {
    type Err = UnknownSource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim();
        Self::ALL
            .into_iter()
            .find(|source| source.id() == id)
            .ok_or_else(|| UnknownSource(id.to_string()))
    }
}

/// A source name that is not part of the known source set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown source '{0}'")]
pub struct UnknownSource(pub String);

/// A paper author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    affiliation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    orcid: Option<String>,
}

impl Author {
    /// Create an author with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            affiliation: None,
            orcid: None,
        }
    }

    /// Set affiliation, ignoring blank values
    pub fn with_affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.affiliation = non_blank(affiliation.into());
        self
    }

    /// Set ORCID identifier, ignoring blank values
    pub fn with_orcid(mut self, orcid: impl Into<String>) -> Self {
        self.orcid = non_blank(orcid.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn affiliation(&self) -> Option<&str> {
        self.affiliation.as_deref()
    }

    pub fn orcid(&self) -> Option<&str> {
        self.orcid.as_deref()
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Errors raised when a paper record violates the entity invariants
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaperError {
    #[error("paper id cannot be empty")]
    EmptyId,

    #[error("paper title cannot be empty")]
    EmptyTitle,

    #[error("paper abstract cannot be empty")]
    EmptyAbstract,

    #[error("paper must have at least one author")]
    NoAuthors,

    #[error("author name cannot be empty")]
    EmptyAuthorName,

    #[error("paper publication date is missing")]
    MissingDate,
}

/// A research paper normalized from one of the known sources.
///
/// Papers are only obtainable through [`PaperBuilder::build`], which checks the
/// invariants, and are read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "PaperRecord")]
pub struct Paper {
    id: String,
    title: String,
    authors: Vec<Author>,
    r#abstract: String,
    source: SourceType,
    published_date: NaiveDateTime,
    url: String,
    doi: Option<String>,
    categories: Vec<String>,
    citation_count: Option<u32>,
}

impl Paper {
    /// Source-prefixed identifier, e.g. `arxiv:2301.12345v1`
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn abstract_text(&self) -> &str {
        &self.r#abstract
    }

    pub fn source(&self) -> SourceType {
        self.source
    }

    pub fn published_date(&self) -> NaiveDateTime {
        self.published_date
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn citation_count(&self) -> Option<u32> {
        self.citation_count
    }

    /// The first listed author
    pub fn primary_author(&self) -> &Author {
        // build() guarantees at least one author
        &self.authors[0]
    }

    /// Display-friendly author summary
    pub fn formatted_authors(&self) -> String {
        match self.authors.len() {
            1 => self.authors[0].name.clone(),
            2 | 3 => self
                .authors
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => format!("{} et al.", self.authors[0].name),
        }
    }

    /// Title form used for duplicate detection (trimmed, lower-cased)
    pub fn normalized_title(&self) -> String {
        self.title.trim().to_lowercase()
    }
}

/// Builder for constructing validated Paper objects
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    id: String,
    title: String,
    url: String,
    source: SourceType,
    authors: Vec<Author>,
    r#abstract: String,
    published_date: Option<NaiveDateTime>,
    doi: Option<String>,
    categories: Vec<String>,
    citation_count: Option<u32>,
}

impl PaperBuilder {
    /// Create a new builder with required identity fields
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
        source: SourceType,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            url: url.into(),
            source,
            authors: Vec::new(),
            r#abstract: String::new(),
            published_date: None,
            doi: None,
            categories: Vec::new(),
            citation_count: None,
        }
    }

    /// Append an author
    pub fn author(mut self, author: Author) -> Self {
        self.authors.push(author);
        self
    }

    /// Replace the author list
    pub fn authors(mut self, authors: Vec<Author>) -> Self {
        self.authors = authors;
        self
    }

    /// Set abstract
    pub fn abstract_text(mut self, abstract_text: impl Into<String>) -> Self {
        self.r#abstract = abstract_text.into();
        self
    }

    /// Set publication date
    pub fn published_date(mut self, date: NaiveDateTime) -> Self {
        self.published_date = Some(date);
        self
    }

    /// Set DOI, ignoring blank values
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = non_blank(doi.into());
        self
    }

    /// Set categories
    pub fn categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Set citation count
    pub fn citation_count(mut self, count: u32) -> Self {
        self.citation_count = Some(count);
        self
    }

    /// Validate the invariants and build the Paper
    pub fn build(self) -> Result<Paper, PaperError> {
        if self.id.trim().is_empty() {
            return Err(PaperError::EmptyId);
        }
        let title = self.title.trim();
        if title.is_empty() {
            return Err(PaperError::EmptyTitle);
        }
        let abstract_text = self.r#abstract.trim();
        if abstract_text.is_empty() {
            return Err(PaperError::EmptyAbstract);
        }
        if self.authors.is_empty() {
            return Err(PaperError::NoAuthors);
        }
        if self.authors.iter().any(|a| a.name.is_empty()) {
            return Err(PaperError::EmptyAuthorName);
        }
        let published_date = self.published_date.ok_or(PaperError::MissingDate)?;

        Ok(Paper {
            id: self.id,
            title: title.to_string(),
            authors: self.authors,
            r#abstract: abstract_text.to_string(),
            source: self.source,
            published_date,
            url: self.url,
            doi: self.doi,
            categories: self.categories,
            citation_count: self.citation_count,
        })
    }
}

/// Wire form of a paper, including the derived display fields
#[derive(Debug, Clone, Serialize)]
pub struct PaperRecord {
    pub id: String,
    pub title: String,
    pub authors: Vec<Author>,
    pub r#abstract: String,
    pub source: SourceType,
    pub source_name: &'static str,
    #[serde(with = "iso_datetime")]
    pub published_date: NaiveDateTime,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_count: Option<u32>,
    pub formatted_authors: String,
    pub primary_author: Author,
}

impl From<Paper> for PaperRecord {
    fn from(paper: Paper) -> Self {
        let formatted_authors = paper.formatted_authors();
        let primary_author = paper.primary_author().clone();
        Self {
            id: paper.id,
            title: paper.title,
            authors: paper.authors,
            r#abstract: paper.r#abstract,
            source: paper.source,
            source_name: paper.source.name(),
            published_date: paper.published_date,
            url: paper.url,
            doi: paper.doi,
            categories: paper.categories,
            citation_count: paper.citation_count,
            formatted_authors,
            primary_author,
        }
    }
}

mod iso_datetime {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format("%Y-%m-%dT%H:%M:%S"))
    }
}
