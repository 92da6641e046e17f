//! These models represent the objects passed around by the agent
//!
//! The same conversation has to be expressed in several formats:
//! - gemini contents/function declarations, sent from the agent to the LLM
//! - openai messages/tools, sent from the agent to the LLM
//! - tool calls, sent from the agent to the systems wrapping codeforces and the knowledge base
//! - json history, exchanged with whoever drives the conversation
//!
//! We always immediately convert those formats into the internal structs using to/from helpers,
//! so the internal models are not an exact match to any one of them.
pub mod content;
pub mod message;
pub mod role;
pub mod tool;
