//! Tool handlers backed by the aggregator.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::tools::{ToolError, ToolHandler};
use crate::aggregator::Aggregator;
use crate::models::{SearchRequest, SourceType};

/// Handler for searching papers across all or specific sources
#[derive(Debug)]
pub struct SearchPapersHandler {
    pub aggregator: Arc<Aggregator>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchPapersHandler {
    async fn execute(&self, args: Value) -> Result<Value, ToolError> {
        let request: SearchRequest = serde_json::from_value(args)
            .map_err(|e| ToolError::InvalidParams(format!("Invalid arguments: {}", e)))?;

        tracing::info!(query = %request.query, "search_papers called");

        let report = self.aggregator.search_request(request).await?;

        serde_json::to_value(&report).map_err(|e| ToolError::Internal(e.to_string()))
    }
}

/// One entry of the `list_sources` result
#[derive(Debug, Serialize)]
struct SourceInfo {
    id: &'static str,
    name: &'static str,
    enabled: bool,
    capabilities: Vec<&'static str>,
}

/// Handler listing the known sources
#[derive(Debug)]
pub struct ListSourcesHandler {
    pub aggregator: Arc<Aggregator>,
}

#[async_trait::async_trait]
impl ToolHandler for ListSourcesHandler {
    async fn execute(&self, _args: Value) -> Result<Value, ToolError> {
        let registry = self.aggregator.registry();

        let sources: Vec<SourceInfo> = SourceType::ALL
            .iter()
            .map(|&source_type| {
                let source = registry.get(source_type);
                SourceInfo {
                    id: source_type.id(),
                    name: source_type.name(),
                    enabled: source.is_some(),
                    capabilities: source
                        .map(|s| s.capabilities().labels())
                        .unwrap_or_default(),
                }
            })
            .collect();

        serde_json::to_value(&sources).map_err(|e| ToolError::Internal(e.to_string()))
    }
}
