use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures raised while dispatching or running a single tool call.
///
/// These never end a turn: the agent renders them as the tool's output so the
/// model can read them and decide what to do next.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum AgentError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Failures that abort a whole conversation turn without producing an answer.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("Model invocation failed: {0}")]
    Provider(#[source] anyhow::Error),

    #[error("No final answer after {0} model calls")]
    MaxIterations(usize),

    #[error("Failed to render system prompt: {0}")]
    Prompt(String),
}
