//! Systems group related tools the agent can call.
//!
//! Each system owns a fixed set of tools and resolves a [`ToolCall`](crate::models::tool::ToolCall)
//! against them. Systems are collected into a [`ToolRegistry`] that the agent dispatches through.
pub mod codeforces;
pub mod knowledge;
mod registry;
mod system;

pub use codeforces::CodeforcesSystem;
pub use knowledge::KnowledgeSystem;
pub use registry::ToolRegistry;
pub use system::System;
