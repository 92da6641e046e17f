use serde::{Deserialize, Serialize};

use crate::errors::{AgentResult, TurnError};
use crate::models::content::Content;
use crate::models::message::Message;
use crate::models::tool::{Tool, ToolCall};
use crate::prompt_template::load_prompt_file;
use crate::providers::base::Provider;
use crate::systems::ToolRegistry;

/// Model calls allowed in one turn before it is abandoned
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Problem tags accepted by `problemset.problems`
pub const PROBLEM_TAGS: &[&str] = &[
    "2-sat",
    "binary search",
    "bitmasks",
    "brute force",
    "chinese remainder theorem",
    "combinatorics",
    "constructive algorithms",
    "data structures",
    "dfs and similar",
    "divide and conquer",
    "dp",
    "dsu",
    "expression parsing",
    "fft",
    "flows",
    "games",
    "geometry",
    "graph matchings",
    "graphs",
    "greedy",
    "hashing",
    "implementation",
    "interactive",
    "math",
    "matrices",
    "meet-in-the-middle",
    "number theory",
    "probabilities",
    "schedules",
    "shortest paths",
    "sortings",
    "string suffix structures",
    "strings",
    "ternary search",
    "trees",
    "two pointers",
];

/// Who the conversation is on behalf of
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    /// Codeforces handle that "my" and "me" refer to
    pub user_handle: String,
    /// Model provider key for this conversation
    #[serde(skip_serializing, default)]
    pub credential: String,
}

/// Message history plus the context it is evaluated in
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub messages: Vec<Message>,
    pub context: ConversationContext,
}

impl Conversation {
    pub fn new<H: Into<String>, C: Into<String>>(user_handle: H, credential: C) -> Self {
        Self {
            messages: Vec::new(),
            context: ConversationContext {
                user_handle: user_handle.into(),
                credential: credential.into(),
            },
        }
    }

    /// Continue from a history kept by the caller
    pub fn with_history(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }
}

#[derive(Serialize)]
struct SystemInfo<'a> {
    name: &'a str,
    description: &'a str,
    instructions: &'a str,
}

#[derive(Serialize)]
struct PromptContext<'a> {
    handle: &'a str,
    tools: Vec<Tool>,
    tags: &'a [&'a str],
    systems: Vec<SystemInfo<'a>>,
}

#[derive(Debug)]
enum TurnState {
    /// Waiting on the model to answer or request tools
    Deciding,
    /// The model asked for tools; holds its message until the results are in
    ExecutingTools(Message),
    Done(String),
}

/// Agent drives a model through rounds of tool use until it produces an answer
pub struct Agent {
    tools: ToolRegistry,
    max_iterations: usize,
}

impl Agent {
    pub fn new(tools: ToolRegistry) -> Self {
        Self {
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Render the system prompt for a user
    pub fn system_prompt(&self, user_handle: &str) -> Result<String, TurnError> {
        let context = PromptContext {
            handle: user_handle,
            tools: self.tools.tools(),
            tags: PROBLEM_TAGS,
            systems: self
                .tools
                .systems()
                .map(|system| SystemInfo {
                    name: system.name(),
                    description: system.description(),
                    instructions: system.instructions(),
                })
                .collect(),
        };
        load_prompt_file("system.md", &context).map_err(|e| TurnError::Prompt(e.to_string()))
    }

    /// Run one tool call, rendering any failure as its output
    async fn dispatch_tool_call(&self, tool_call: AgentResult<ToolCall>) -> Vec<Content> {
        let result = match tool_call {
            Ok(call) => self.tools.dispatch(call).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Tool call failed");
            vec![Content::text(e.to_string())]
        })
    }

    /// Add a user message and run the conversation until the model answers.
    ///
    /// On error the conversation is left exactly as it was passed in.
    pub async fn process_conversation(
        &self,
        provider: &dyn Provider,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<String, TurnError> {
        let mut messages = conversation.messages.clone();
        messages.push(Message::user().with_text(text));

        let answer = self
            .reply(provider, &conversation.context, &mut messages)
            .await?;
        conversation.messages = messages;
        Ok(answer)
    }

    async fn reply(
        &self,
        provider: &dyn Provider,
        context: &ConversationContext,
        messages: &mut Vec<Message>,
    ) -> Result<String, TurnError> {
        if !messages.first().map(Message::is_system).unwrap_or(false) {
            let prompt = self.system_prompt(&context.user_handle)?;
            messages.insert(0, Message::system().with_text(prompt));
        }

        let tools = self.tools.tools();
        let mut iterations = 0;
        let mut state = TurnState::Deciding;

        loop {
            state = match state {
                TurnState::Deciding => {
                    if iterations >= self.max_iterations {
                        tracing::warn!(iterations, "Turn exceeded its model call budget");
                        return Err(TurnError::MaxIterations(self.max_iterations));
                    }
                    iterations += 1;

                    let (response, usage) = provider
                        .complete(messages, &tools)
                        .await
                        .map_err(TurnError::Provider)?;
                    tracing::debug!(
                        iteration = iterations,
                        total_tokens = ?usage.total_tokens,
                        "Model responded"
                    );

                    if response.tool_requests().is_empty() {
                        let answer = response.text();
                        messages.push(response);
                        TurnState::Done(answer)
                    } else {
                        TurnState::ExecutingTools(response)
                    }
                }
                TurnState::ExecutingTools(response) => {
                    let requests = response.tool_requests();
                    tracing::debug!(count = requests.len(), "Executing tool calls");

                    let futures: Vec<_> = requests
                        .iter()
                        .map(|request| self.dispatch_tool_call(request.tool_call.clone()))
                        .collect();
                    let outputs = futures::future::join_all(futures).await;

                    let results: Vec<Message> = requests
                        .iter()
                        .zip(outputs)
                        .map(|(request, output)| {
                            Message::tool().with_tool_response(request.id.clone(), output)
                        })
                        .collect();

                    messages.push(response);
                    messages.extend(results);
                    TurnState::Deciding
                }
                TurnState::Done(answer) => {
                    tracing::info!(iterations, "Turn complete");
                    return Ok(answer);
                }
            };
        }
    }
}
