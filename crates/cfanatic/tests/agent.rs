use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cfanatic::agent::{Agent, Conversation};
use cfanatic::codeforces::{CodeforcesClient, CodeforcesConfig};
use cfanatic::knowledge::{Document, KeywordKnowledgeBase};
use cfanatic::models::message::Message;
use cfanatic::models::role::Role;
use cfanatic::models::tool::{Tool, ToolCall};
use cfanatic::providers::base::{Provider, Usage};
use cfanatic::systems::{CodeforcesSystem, KnowledgeSystem, ToolRegistry};

/// Plays back a fixed sequence of model replies and records what it was shown
struct ScriptedProvider {
    replies: Mutex<Vec<Message>>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Message>) -> Self {
        Self {
            replies: Mutex::new(replies),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn complete(&self, messages: &[Message], _tools: &[Tool]) -> Result<(Message, Usage)> {
        self.seen.lock().unwrap().push(messages.to_vec());
        let mut replies = self.replies.lock().unwrap();
        anyhow::ensure!(!replies.is_empty(), "script exhausted");
        Ok((replies.remove(0), Usage::default()))
    }
}

fn build_agent(server: &MockServer) -> Result<Agent> {
    let client = CodeforcesClient::new(CodeforcesConfig {
        base_url: server.uri(),
        rate_limit_delay: Duration::from_millis(10),
        timeout: Duration::from_secs(5),
    })?;

    let knowledge = KeywordKnowledgeBase::new(vec![Document {
        title: "Segment trees".to_string(),
        body: "A segment tree answers range queries in logarithmic time.".to_string(),
    }]);

    let mut registry = ToolRegistry::new();
    registry.add_system(Box::new(CodeforcesSystem::new(client)))?;
    registry.add_system(Box::new(KnowledgeSystem::new(Arc::new(knowledge))))?;
    Ok(Agent::new(registry))
}

fn tool_output(message: &Message) -> (String, String) {
    assert_eq!(message.role, Role::Tool);
    let response = message.content[0]
        .as_tool_response()
        .expect("tool message carries a tool response");
    (response.id.clone(), response.text())
}

#[tokio::test]
async fn test_turn_with_codeforces_and_knowledge_tools() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user.rating"))
        .and(query_param("handle", "tourist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": [{"contestId": 1, "oldRating": 1500, "newRating": 1900}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = build_agent(&server)?;
    let provider = ScriptedProvider::new(vec![
        Message::assistant()
            .with_tool_request(
                "rating",
                Ok(ToolCall::new("get_user_rating", json!({"handle": "tourist"}))),
            )
            .with_tool_request(
                "kb",
                Ok(ToolCall::new("search_knowledge_base", json!({"query": "segment tree"}))),
            ),
        Message::assistant().with_text("You gained 400 rating. Study segment trees next."),
    ]);

    let mut conversation = Conversation::new("tourist", "key");
    let answer = agent
        .process_conversation(&provider, &mut conversation, "How did my last contest go?")
        .await?;

    assert_eq!(answer, "You gained 400 rating. Study segment trees next.");
    assert_eq!(conversation.messages.len(), 6);

    let (id, text) = tool_output(&conversation.messages[3]);
    assert_eq!(id, "rating");
    assert!(text.contains("\"newRating\":1900"));

    let (id, text) = tool_output(&conversation.messages[4]);
    assert_eq!(id, "kb");
    assert!(text.starts_with("Found relevant info: "));
    assert!(text.contains("Segment trees"));

    let system_prompt = conversation.messages[0].text();
    assert!(system_prompt.contains("tourist"));
    assert!(system_prompt.contains("get_user_blog_entries"));
    Ok(())
}

#[tokio::test]
async fn test_upstream_failure_is_an_observation() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user.info"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": "FAILED",
            "comment": "handles: User with handle nobody_xyz not found"
        })))
        .mount(&server)
        .await;

    let agent = build_agent(&server)?;
    let provider = ScriptedProvider::new(vec![
        Message::assistant().with_tool_request(
            "1",
            Ok(ToolCall::new("get_user_info", json!({"handle": "nobody_xyz"}))),
        ),
        Message::assistant().with_text("That handle does not exist."),
    ]);

    let mut conversation = Conversation::new("tourist", "key");
    let answer = agent
        .process_conversation(&provider, &mut conversation, "Look up nobody_xyz")
        .await?;

    assert_eq!(answer, "That handle does not exist.");
    let (_, text) = tool_output(&conversation.messages[3]);
    assert!(text.starts_with("Error fetching user info: "));
    assert!(text.contains("not found"));
    Ok(())
}

#[tokio::test]
async fn test_history_is_carried_between_turns() -> Result<()> {
    let server = MockServer::start().await;
    let agent = build_agent(&server)?;
    let provider = ScriptedProvider::new(vec![
        Message::assistant().with_text("Hi!"),
        Message::assistant().with_text("You said hello."),
    ]);

    let mut conversation = Conversation::new("tourist", "key");
    agent
        .process_conversation(&provider, &mut conversation, "hello")
        .await?;
    agent
        .process_conversation(&provider, &mut conversation, "what did I say?")
        .await?;

    let seen = provider.seen.lock().unwrap();
    let second_call = &seen[1];
    assert_eq!(second_call.len(), 4);
    assert_eq!(second_call[1].text(), "hello");
    assert_eq!(second_call[2].text(), "Hi!");
    assert_eq!(second_call[3].text(), "what did I say?");
    Ok(())
}
