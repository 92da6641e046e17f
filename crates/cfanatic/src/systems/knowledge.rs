use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::System;
use crate::errors::{AgentError, AgentResult};
use crate::knowledge::KnowledgeBase;
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

/// Exposes a [`KnowledgeBase`] as the `search_knowledge_base` tool
pub struct KnowledgeSystem {
    tools: Vec<Tool>,
    knowledge_base: Arc<dyn KnowledgeBase>,
}

impl KnowledgeSystem {
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>) -> Self {
        let search_tool = Tool::new(
            "search_knowledge_base",
            "Search the local knowledge base for relevant information.",
            json!({
                "type": "object",
                "required": ["query"],
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look for, in plain words."
                    }
                }
            }),
        );

        Self {
            tools: vec![search_tool],
            knowledge_base,
        }
    }

    fn search(&self, query: &str) -> String {
        match self.knowledge_base.query(query) {
            Ok(Some(results)) => format!("Found relevant info: {}", results),
            Ok(None) => "No relevant information found in knowledge base.".to_string(),
            Err(e) => {
                tracing::warn!("Knowledge base search failed: {:#}", e);
                format!("Error searching knowledge base: {}", e)
            }
        }
    }
}

#[async_trait]
impl System for KnowledgeSystem {
    fn name(&self) -> &str {
        "knowledge"
    }

    fn description(&self) -> &str {
        "General competitive programming knowledge"
    }

    fn instructions(&self) -> &str {
        "Search here for algorithms, techniques and advice that are not about a specific user or contest."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
        match tool_call.name.as_str() {
            "search_knowledge_base" => {
                let args: SearchArgs = serde_json::from_value(tool_call.arguments)
                    .map_err(|e| AgentError::InvalidParameters(e.to_string()))?;
                Ok(vec![Content::text(self.search(&args.query))])
            }
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}
