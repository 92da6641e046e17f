use async_trait::async_trait;

use crate::errors::AgentResult;
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};

/// Core trait that defines a system that can be operated by an AI agent
#[async_trait]
pub trait System: Send + Sync {
    /// Get the name of the system
    fn name(&self) -> &str;

    /// Get the system description
    fn description(&self) -> &str;

    /// Get system instructions
    fn instructions(&self) -> &str;

    /// Get available tools
    fn tools(&self) -> &[Tool];

    /// Call a tool with the given arguments.
    ///
    /// Failures of the wrapped operation are reported as text content in an `Ok`
    /// result. An `Err` is reserved for calls the system cannot interpret, such as
    /// an unknown tool name or arguments that do not match the schema.
    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>>;
}
