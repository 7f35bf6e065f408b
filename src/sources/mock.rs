//! Mock source for testing purposes.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::models::{Author, Paper, PaperBuilder, SearchQuery, SourceType};
use crate::sources::{Source, SourceCapabilities, SourceError};

#[derive(Debug, Clone)]
enum Behavior {
    Papers(Vec<Paper>),
    Fail(String),
    Panic,
}

/// A source that returns canned papers, fails, or panics, optionally after a delay.
#[derive(Debug)]
pub struct MockSource {
    source_type: SourceType,
    behavior: Behavior,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockSource {
    /// A mock standing in for `source_type` that returns no papers
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            behavior: Behavior::Papers(Vec::new()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return these papers from every search
    pub fn with_papers(mut self, papers: Vec<Paper>) -> Self {
        self.behavior = Behavior::Papers(papers);
        self
    }

    /// Fail every search with a network error
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.behavior = Behavior::Fail(message.into());
        self
    }

    /// Panic inside every search
    pub fn panicking(mut self) -> Self {
        self.behavior = Behavior::Panic;
        self
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of times `search` was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn source_type(&self) -> SourceType {
        self.source_type
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    async fn search(&self, _query: &SearchQuery) -> Result<Vec<Paper>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.behavior {
            Behavior::Papers(papers) => Ok(papers.clone()),
            Behavior::Fail(message) => Err(SourceError::Network(message.clone())),
            Behavior::Panic => panic!("mock source {} panicked", self.source_type),
        }
    }
}

/// A builder pre-filled with a valid author, abstract and date
pub fn paper_builder(source_type: SourceType, local_id: &str, title: &str) -> PaperBuilder {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();

    PaperBuilder::new(
        format!("{}:{}", source_type.id(), local_id),
        title,
        format!("http://example.com/{}", local_id),
        source_type,
    )
    .author(Author::new("Test Author"))
    .abstract_text(format!("Abstract of {}", title))
    .published_date(date)
}

/// Helper function to create a mock paper for testing.
pub fn make_paper(source_type: SourceType, local_id: &str, title: &str) -> Paper {
    paper_builder(source_type, local_id, title)
        .build()
        .unwrap_or_else(|e| panic!("mock paper '{}' is invalid: {}", title, e))
}
