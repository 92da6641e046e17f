use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

use super::base::{Provider, Usage};
use super::configs::GoogleProviderConfig;
use super::utils::INVALID_TOOL_CALL;
use crate::errors::AgentError;
use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Schema keywords the Gemini function declaration format rejects
const UNSUPPORTED_SCHEMA_KEYS: [&str; 2] = ["default", "additionalProperties"];

pub struct GoogleProvider {
    client: Client,
    config: GoogleProviderConfig,
}

impl GoogleProvider {
    pub fn new(config: GoogleProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()?;

        Ok(Self { client, config })
    }

    fn get_usage(data: &Value) -> Usage {
        let usage = &data["usageMetadata"];

        let input_tokens = usage
            .get("promptTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let output_tokens = usage
            .get("candidatesTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32);

        let total_tokens = usage
            .get("totalTokenCount")
            .and_then(|v| v.as_i64())
            .map(|v| v as i32)
            .or_else(|| match (input_tokens, output_tokens) {
                (Some(input), Some(output)) => Some(input + output),
                _ => None,
            });

        Usage::new(input_tokens, output_tokens, total_tokens)
    }

    async fn post(&self, payload: Value) -> Result<Value> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.host.trim_end_matches('/'),
            self.config.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json().await?),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(anyhow!("Request failed: {}: {}", status, body))
            }
        }
    }
}

/// Convert internal messages into Gemini `contents` plus an optional `systemInstruction`
pub fn messages_to_google_spec(messages: &[Message]) -> (Option<Value>, Vec<Value>) {
    let mut system_parts = Vec::new();
    let mut contents: Vec<Value> = Vec::new();

    // Gemini identifies function results by name only
    let mut names_by_id = HashMap::new();

    for message in messages {
        let mut parts = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    if !text.text.is_empty() {
                        parts.push(json!({"text": text.text}));
                    }
                }
                MessageContent::ToolRequest(request) => {
                    let (name, args) = match &request.tool_call {
                        Ok(tool_call) => (tool_call.name.clone(), tool_call.arguments.clone()),
                        Err(_) => (INVALID_TOOL_CALL.to_string(), json!({})),
                    };
                    names_by_id.insert(request.id.clone(), name.clone());
                    parts.push(json!({
                        "functionCall": {
                            "name": name,
                            "args": args,
                        }
                    }));
                }
                MessageContent::ToolResponse(response) => {
                    let name = names_by_id
                        .get(&response.id)
                        .cloned()
                        .unwrap_or_else(|| INVALID_TOOL_CALL.to_string());
                    parts.push(json!({
                        "functionResponse": {
                            "name": name,
                            "response": {"content": response.text()},
                        }
                    }));
                }
            }
        }

        if parts.is_empty() {
            continue;
        }

        let role = match message.role {
            Role::System => {
                system_parts.extend(parts);
                continue;
            }
            Role::Assistant => "model",
            Role::User | Role::Tool => "user",
        };

        // Gemini expects alternating turns, so adjacent same-role entries are merged
        match contents.last_mut() {
            Some(last) if last["role"] == role => {
                if let Some(existing) = last["parts"].as_array_mut() {
                    existing.extend(parts);
                }
            }
            _ => contents.push(json!({"role": role, "parts": parts})),
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(json!({"parts": system_parts}))
    };

    (system, contents)
}

/// Convert internal tools into a single Gemini `functionDeclarations` block
pub fn tools_to_google_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut declarations = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        let mut declaration = json!({
            "name": tool.name,
            "description": tool.description,
        });

        let has_properties = tool.input_schema["properties"]
            .as_object()
            .map(|props| !props.is_empty())
            .unwrap_or(false);
        if has_properties {
            declaration["parameters"] = strip_unsupported_keys(&tool.input_schema);
        }

        declarations.push(declaration);
    }

    if declarations.is_empty() {
        return Ok(vec![]);
    }
    Ok(vec![json!({"functionDeclarations": declarations})])
}

fn strip_unsupported_keys(schema: &Value) -> Value {
    match schema {
        Value::Object(map) => {
            let cleaned: Map<String, Value> = map
                .iter()
                .filter(|(key, _)| !UNSUPPORTED_SCHEMA_KEYS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), strip_unsupported_keys(value)))
                .collect();
            Value::Object(cleaned)
        }
        Value::Array(items) => Value::Array(items.iter().map(strip_unsupported_keys).collect()),
        other => other.clone(),
    }
}

/// Convert a Gemini response into an assistant message.
///
/// Gemini does not identify function calls, so each gets a generated id.
pub fn google_response_to_message(response: &Value) -> Result<Message> {
    let candidate = response["candidates"]
        .get(0)
        .ok_or_else(|| match response.get("promptFeedback") {
            Some(feedback) => anyhow!("Gemini returned no candidates: {}", feedback),
            None => anyhow!("Gemini returned no candidates"),
        })?;

    let mut message = Message::assistant();
    let parts = candidate["content"]["parts"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    for part in parts {
        if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
            message = message.with_text(text);
        } else if let Some(call) = part.get("functionCall") {
            let id = format!("call_{}", Uuid::new_v4().simple());
            let tool_call = match call.get("name").and_then(|n| n.as_str()) {
                Some(name) if !name.is_empty() => {
                    let args = match call.get("args") {
                        None | Some(Value::Null) => json!({}),
                        Some(args) => args.clone(),
                    };
                    Ok(ToolCall::new(name, args))
                }
                _ => Err(AgentError::ToolNotFound(
                    "Function call without a name".to_string(),
                )),
            };
            message = message.with_tool_request(id, tool_call);
        }
    }

    Ok(message)
}

#[async_trait]
impl Provider for GoogleProvider {
    async fn complete(&self, messages: &[Message], tools: &[Tool]) -> Result<(Message, Usage)> {
        let (system, contents) = messages_to_google_spec(messages);
        let tools_spec = tools_to_google_spec(tools)?;

        let mut payload = json!({ "contents": contents });

        if let Some(system) = system {
            payload["systemInstruction"] = system;
        }
        if !tools_spec.is_empty() {
            payload["tools"] = json!(tools_spec);
        }

        let mut generation_config = Map::new();
        if let Some(temp) = self.config.temperature {
            generation_config.insert("temperature".to_string(), json!(temp));
        }
        if let Some(tokens) = self.config.max_tokens {
            generation_config.insert("maxOutputTokens".to_string(), json!(tokens));
        }
        if !generation_config.is_empty() {
            payload["generationConfig"] = Value::Object(generation_config);
        }

        tracing::debug!(model = %self.config.model, messages = messages.len(), "gemini request");
        let response = self.post(payload).await?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("Gemini API error: {}", error));
        }

        let message = google_response_to_message(&response)?;
        let usage = Self::get_usage(&response);

        Ok((message, usage))
    }
}
