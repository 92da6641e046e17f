use std::collections::HashMap;

use super::System;
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};

/// Maps every tool name to the system that provides it
#[derive(Default)]
pub struct ToolRegistry {
    systems: Vec<Box<dyn System>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a system, rejecting it if one of its tool names is already taken
    pub fn add_system(&mut self, system: Box<dyn System>) -> AgentResult<()> {
        if let Some(tool) = system
            .tools()
            .iter()
            .find(|tool| self.index.contains_key(&tool.name))
        {
            return Err(AgentError::Internal(format!(
                "Duplicate tool name: {} (from system {})",
                tool.name,
                system.name()
            )));
        }

        let position = self.systems.len();
        for tool in system.tools() {
            self.index.insert(tool.name.clone(), position);
        }
        self.systems.push(system);
        Ok(())
    }

    pub fn systems(&self) -> impl Iterator<Item = &dyn System> {
        self.systems.iter().map(|system| &**system)
    }

    /// Every registered tool, in registration order
    pub fn tools(&self) -> Vec<Tool> {
        self.systems
            .iter()
            .flat_map(|system| system.tools().iter().cloned())
            .collect()
    }

    /// Find the system providing a tool
    pub fn get_system_for_tool(&self, name: &str) -> Option<&dyn System> {
        self.index.get(name).map(|&position| &*self.systems[position])
    }

    /// Dispatch a single tool call to the system that provides it
    pub async fn dispatch(&self, call: ToolCall) -> AgentResult<Vec<Content>> {
        let system = self
            .get_system_for_tool(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tracing::debug!(tool = call.name.as_str(), system = system.name(), "Dispatching tool call");
        system.call(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoSystem {
        name: String,
        tools: Vec<Tool>,
    }

    impl EchoSystem {
        fn new(name: &str, tool_names: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                tools: tool_names
                    .iter()
                    .map(|tool| Tool::new(*tool, "Echoes back the input", json!({"type": "object"})))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl System for EchoSystem {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "A system that echoes"
        }

        fn instructions(&self) -> &str {
            ""
        }

        fn tools(&self) -> &[Tool] {
            &self.tools
        }

        async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
            Ok(vec![Content::text(format!("{}:{}", self.name, tool_call.arguments))])
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_tool_name() {
        let mut registry = ToolRegistry::new();
        registry
            .add_system(Box::new(EchoSystem::new("first", &["alpha"])))
            .unwrap();
        registry
            .add_system(Box::new(EchoSystem::new("second", &["beta", "gamma"])))
            .unwrap();

        let output = registry
            .dispatch(ToolCall::new("gamma", json!({"x": 1})))
            .await
            .unwrap();
        assert_eq!(output, vec![Content::text("second:{\"x\":1}")]);

        let names: Vec<String> = registry.tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry
            .dispatch(ToolCall::new("missing", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, AgentError::ToolNotFound("missing".to_string()));
    }

    #[test]
    fn test_duplicate_tool_names_are_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .add_system(Box::new(EchoSystem::new("first", &["alpha"])))
            .unwrap();
        let err = registry
            .add_system(Box::new(EchoSystem::new("second", &["alpha"])))
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate tool name: alpha"));
        assert_eq!(registry.systems().count(), 1);
    }
}
