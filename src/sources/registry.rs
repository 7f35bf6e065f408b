//! Registry of configured source adapters.

use std::collections::HashMap;
use std::sync::Arc;

use super::{ArxivSource, CrossRefSource, OpenAlexSource, Source, SourceError};
use crate::config::Config;
use crate::models::SourceType;
use crate::utils::HttpClient;

bitflags::bitflags! {
    /// Query features a source applies on its side
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SourceCapabilities: u32 {
        const SEARCH = 1 << 0;
        const DATE_FILTER = 1 << 1;
        const SORT_BY_DATE = 1 << 2;
        const SORT_BY_CITATIONS = 1 << 3;
    }
}

impl SourceCapabilities {
    /// Short labels for display
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.contains(Self::SEARCH) {
            labels.push("search");
        }
        if self.contains(Self::DATE_FILTER) {
            labels.push("date filter");
        }
        if self.contains(Self::SORT_BY_DATE) {
            labels.push("sort by date");
        }
        if self.contains(Self::SORT_BY_CITATIONS) {
            labels.push("sort by citations");
        }
        labels
    }
}

/// Registry for all available sources
///
/// Built once at startup and shared read-only by every search.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceType, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create a registry with every source not disabled in `config`
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let disabled = config
            .sources
            .disabled_sources()
            .map_err(|e| SourceError::InvalidRequest(e.to_string()))?;
        let retry = config.retry.to_retry_config();
        let client = HttpClient::new(&config.http)?;
        let mailto = config.sources.mailto.as_deref();

        let mut registry = Self::empty();

        for source_type in SourceType::ALL {
            if disabled.contains(&source_type) {
                tracing::debug!(source = %source_type, "Source disabled by configuration");
                continue;
            }

            let base_url = config.sources.base_url(source_type);
            let source: Arc<dyn Source> = match source_type {
                SourceType::Arxiv => {
                    let mut source = ArxivSource::new(client.clone(), retry);
                    if let Some(url) = base_url {
                        source = source.with_base_url(url);
                    }
                    Arc::new(source)
                }
                SourceType::OpenAlex => {
                    let mut source = OpenAlexSource::new(client.clone(), retry);
                    if let Some(url) = base_url {
                        source = source.with_base_url(url);
                    }
                    if let Some(mailto) = mailto {
                        source = source.with_mailto(mailto);
                    }
                    Arc::new(source)
                }
                SourceType::CrossRef => {
                    // Crossref routes to its polite pool by User-Agent
                    let client = match mailto {
                        Some(mailto) => HttpClient::with_user_agent(
                            &config.http,
                            &format!("{} (mailto:{})", config.http.user_agent, mailto),
                        )?,
                        None => client.clone(),
                    };
                    let mut source = CrossRefSource::new(client, retry);
                    if let Some(url) = base_url {
                        source = source.with_base_url(url);
                    }
                    Arc::new(source)
                }
            };
            registry.register(source);
        }

        Ok(registry)
    }

    /// Create a registry with no sources
    pub fn empty() -> Self {
        Self {
            sources: HashMap::new(),
        }
    }

    /// Register a source, replacing any previous adapter of the same type
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.insert(source.source_type(), source);
    }

    /// Get a source by type
    pub fn get(&self, source_type: SourceType) -> Option<&Arc<dyn Source>> {
        self.sources.get(&source_type)
    }

    /// Get all registered sources in canonical order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        SourceType::ALL
            .iter()
            .filter_map(move |source_type| self.sources.get(source_type))
    }

    /// Get sources that support a specific capability
    pub fn with_capability(&self, capability: SourceCapabilities) -> Vec<&Arc<dyn Source>> {
        self.all()
            .filter(|s| s.capabilities().contains(capability))
            .collect()
    }

    /// Check if a source is registered
    pub fn has(&self, source_type: SourceType) -> bool {
        self.sources.contains_key(&source_type)
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
