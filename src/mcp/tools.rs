//! Tool registry for MCP tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use super::handlers::{ListSourcesHandler, SearchPapersHandler};
use crate::aggregator::Aggregator;
use crate::models::{SourceType, DEFAULT_MAX_RESULTS, MAX_QUERY_LENGTH, MAX_RESULTS, MIN_RESULTS};

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_papers")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Why a tool call failed
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The arguments were rejected
    #[error("{0}")]
    InvalidParams(String),

    /// Anything else
    #[error("{0}")]
    Internal(String),
}

impl From<crate::Error> for ToolError {
    fn from(err: crate::Error) -> Self {
        if err.is_validation() {
            ToolError::InvalidParams(err.to_string())
        } else {
            ToolError::Internal(err.to_string())
        }
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, ToolError>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Tool>,
}

impl ToolRegistry {
    /// Create the registry with every tool backed by `aggregator`
    pub fn new(aggregator: Arc<Aggregator>) -> Self {
        let mut registry = Self {
            tools: BTreeMap::new(),
        };

        let source_ids: Vec<&str> = SourceType::ALL.iter().map(|s| s.id()).collect();

        registry.register(Tool {
            name: "search_papers".to_string(),
            description: format!(
                "Search {} concurrently and return one deduplicated, sorted list of papers \
                 with a per-source breakdown",
                source_ids.join(", ")
            ),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Research topic or question",
                        "maxLength": MAX_QUERY_LENGTH
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of papers in the merged result",
                        "minimum": MIN_RESULTS,
                        "maximum": MAX_RESULTS,
                        "default": DEFAULT_MAX_RESULTS
                    },
                    "sort_by": {
                        "type": "string",
                        "enum": ["relevance", "date", "citation_count"],
                        "default": "relevance"
                    },
                    "sources": {
                        "description": "Sources to search; all when omitted. A list or a comma-separated string.",
                        "oneOf": [
                            {"type": "array", "items": {"type": "string", "enum": source_ids}},
                            {"type": "string"}
                        ]
                    },
                    "date_from": {
                        "type": "string",
                        "description": "Inclusive lower publication date (YYYY-MM-DD)"
                    },
                    "date_to": {
                        "type": "string",
                        "description": "Inclusive upper publication date (YYYY-MM-DD)"
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchPapersHandler {
                aggregator: aggregator.clone(),
            }),
        });

        registry.register(Tool {
            name: "list_sources".to_string(),
            description: "List the known paper sources, whether each is enabled, and what it supports"
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
            handler: Arc::new(ListSourcesHandler { aggregator }),
        });

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools, ordered by name
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::InvalidParams(format!("Unknown tool: {}", name)))?;
        tool.handler.execute(args).await
    }
}
