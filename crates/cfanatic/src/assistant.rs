use serde::{Deserialize, Serialize};

use crate::agent::{Agent, Conversation};
use crate::errors::TurnError;
use crate::models::message::Message;
use crate::providers::base::Provider;
use crate::providers::configs::ProviderConfig;
use crate::providers::factory::get_provider;

/// The outcome of one conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Final answer text
    pub answer: String,
    /// The full history including this turn, for the caller to send back next time
    pub messages: Vec<Message>,
}

/// Entry point for conversation turns.
///
/// Each turn authenticates with the caller's own key, so the provider is built
/// per turn rather than held.
pub struct Assistant {
    agent: Agent,
    provider_config: ProviderConfig,
}

impl Assistant {
    pub fn new(agent: Agent, provider_config: ProviderConfig) -> Self {
        Self {
            agent,
            provider_config,
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    fn provider_for(&self, credential: &str) -> Result<Box<dyn Provider>, TurnError> {
        get_provider(self.provider_config.clone().with_api_key(credential))
            .map_err(TurnError::Provider)
    }

    /// Answer `message` on behalf of `user_handle`, continuing from `history`
    pub async fn process_message(
        &self,
        message: &str,
        user_handle: &str,
        credential: &str,
        history: Vec<Message>,
    ) -> Result<Turn, TurnError> {
        let mut conversation = Conversation::new(user_handle, credential).with_history(history);
        let answer = self.process_conversation(&mut conversation, message).await?;

        Ok(Turn {
            answer,
            messages: conversation.messages,
        })
    }

    /// Answer `text` and record the turn in `conversation`
    pub async fn process_conversation(
        &self,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<String, TurnError> {
        let provider = self.provider_for(&conversation.context.credential)?;
        tracing::info!(
            handle = conversation.context.user_handle.as_str(),
            history = conversation.messages.len(),
            "Processing message"
        );
        self.agent
            .process_conversation(provider.as_ref(), conversation, text)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::configs::GoogleProviderConfig;
    use crate::systems::ToolRegistry;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn gemini_server(answer: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-flash-lite-latest:generateContent"))
            .and(header("x-goog-api-key", "turn-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": answer}]}
                }]
            })))
            .mount(&server)
            .await;
        server
    }

    fn assistant_for(server: &MockServer) -> Assistant {
        let config = ProviderConfig::Google(GoogleProviderConfig {
            host: server.uri(),
            ..GoogleProviderConfig::new("")
        });
        Assistant::new(Agent::new(ToolRegistry::new()), config)
    }

    #[tokio::test]
    async fn test_process_message_uses_turn_credential() -> anyhow::Result<()> {
        let server = gemini_server("Practice more dp.").await;
        let assistant = assistant_for(&server);

        let turn = assistant
            .process_message("What should I train?", "tourist", "turn-key", vec![])
            .await?;

        assert_eq!(turn.answer, "Practice more dp.");
        assert_eq!(turn.messages.len(), 3);
        assert_eq!(turn.messages[1].text(), "What should I train?");
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_credential_is_a_turn_error() {
        let server = gemini_server("unused").await;
        let assistant = assistant_for(&server);

        let result = assistant
            .process_message("Hi", "tourist", "", vec![])
            .await;

        assert!(matches!(result, Err(TurnError::Provider(_))));
    }
}
