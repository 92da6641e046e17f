use async_trait::async_trait;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use super::System;
use crate::codeforces::{ApiResult, CodeforcesClient};
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::models::tool::{Tool, ToolCall};

const DEFAULT_SUBMISSIONS: u32 = 10;
const DEFAULT_STANDINGS_ROWS: u32 = 5;
const DEFAULT_LIMIT_KB: usize = 500;

#[derive(Debug, Deserialize)]
struct HandleArgs {
    handle: String,
}

#[derive(Debug, Deserialize)]
struct SubmissionsArgs {
    handle: String,
    #[serde(default = "default_submissions", deserialize_with = "integer")]
    count: u32,
}

#[derive(Debug, Default, Deserialize)]
struct ContestListArgs {
    #[serde(default)]
    gym: bool,
}

#[derive(Debug, Deserialize)]
struct StandingsArgs {
    #[serde(deserialize_with = "integer")]
    contest_id: u64,
    #[serde(default = "default_standings_rows", deserialize_with = "integer")]
    count: u32,
}

#[derive(Debug, Deserialize)]
struct ProblemsArgs {
    #[serde(default)]
    tags: Option<String>,
    #[serde(default = "default_limit_kb", deserialize_with = "integer")]
    limit_kb: usize,
    #[serde(default, deserialize_with = "integer")]
    start_index: usize,
}

fn default_submissions() -> u32 {
    DEFAULT_SUBMISSIONS
}

fn default_standings_rows() -> u32 {
    DEFAULT_STANDINGS_ROWS
}

fn default_limit_kb() -> usize {
    DEFAULT_LIMIT_KB
}

/// Models sometimes send whole numbers as floats (`10.0`); accept those too
fn integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64>,
{
    let value = Value::deserialize(deserializer)?;
    let number = match &value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {}", value)))
}

fn parse_args<T: DeserializeOwned>(tool: &str, arguments: Value) -> AgentResult<T> {
    // A call without arguments arrives as null, which should mean "all defaults"
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments)
        .map_err(|e| AgentError::InvalidParameters(format!("{}: {}", tool, e)))
}

/// Serialize a successful result, or describe the failure so the model can read it
fn render<T: Serialize>(result: ApiResult<T>, error_prefix: &str) -> Vec<Content> {
    match result.map(serde_json::to_value) {
        Ok(Ok(value)) => vec![Content::json(value)],
        Ok(Err(e)) => vec![Content::text(format!("{}{}", error_prefix, e))],
        Err(e) => {
            tracing::warn!("{}{}", error_prefix, e);
            vec![Content::text(format!("{}{}", error_prefix, e))]
        }
    }
}

/// Tools backed by the Codeforces API
pub struct CodeforcesSystem {
    tools: Vec<Tool>,
    client: CodeforcesClient,
}

impl CodeforcesSystem {
    pub fn new(client: CodeforcesClient) -> Self {
        let handle_schema = |description: &str| {
            json!({
                "type": "object",
                "required": ["handle"],
                "properties": {
                    "handle": {
                        "type": "string",
                        "description": description
                    }
                }
            })
        };

        let tools = vec![
            Tool::new(
                "get_user_info",
                "Get information about a Codeforces user (rank, rating, etc).",
                handle_schema("The Codeforces handle of the user."),
            ),
            Tool::new(
                "get_user_submissions",
                "Get recent submissions of a Codeforces user.",
                json!({
                    "type": "object",
                    "required": ["handle"],
                    "properties": {
                        "handle": {
                            "type": "string",
                            "description": "The Codeforces handle of the user."
                        },
                        "count": {
                            "type": "integer",
                            "default": DEFAULT_SUBMISSIONS,
                            "description": "How many of the most recent submissions to return."
                        }
                    }
                }),
            ),
            Tool::new(
                "get_user_rating",
                "Get rating history of a Codeforces user.",
                handle_schema("The Codeforces handle of the user."),
            ),
            Tool::new(
                "get_contest_list",
                "Get upcoming and past contests.",
                json!({
                    "type": "object",
                    "required": [],
                    "properties": {
                        "gym": {
                            "type": "boolean",
                            "default": false,
                            "description": "List gym contests instead of regular contests."
                        }
                    }
                }),
            ),
            Tool::new(
                "get_contest_standings",
                "Get standings for a specific contest.",
                json!({
                    "type": "object",
                    "required": ["contest_id"],
                    "properties": {
                        "contest_id": {
                            "type": "integer",
                            "description": "The id of the contest."
                        },
                        "count": {
                            "type": "integer",
                            "default": DEFAULT_STANDINGS_ROWS,
                            "description": "How many rows of the standings to return."
                        }
                    }
                }),
            ),
            Tool::new(
                "get_problems",
                "Get problems from the problemset, optionally filtered by tags. \
                The result contains 'problems', 'problemStatistics', 'next_start_index' and 'total_problems'. \
                If 'next_start_index' is not null, pass it as 'start_index' in the next call to get more data.",
                json!({
                    "type": "object",
                    "required": [],
                    "properties": {
                        "tags": {
                            "type": "string",
                            "description": "Semicolon-separated tags (e.g. 'dp;greedy')."
                        },
                        "limit_kb": {
                            "type": "integer",
                            "default": DEFAULT_LIMIT_KB,
                            "description": "Approximate size limit in KB for the response."
                        },
                        "start_index": {
                            "type": "integer",
                            "default": 0,
                            "description": "Index to start fetching from (for pagination)."
                        }
                    }
                }),
            ),
            Tool::new(
                "get_user_blog_entries",
                "Get blog entries for a user.",
                handle_schema("The Codeforces handle of the author."),
            ),
        ];

        Self { tools, client }
    }

    async fn get_user_info(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: HandleArgs = parse_args("get_user_info", arguments)?;
        Ok(render(
            self.client.get_user_info(&args.handle).await,
            "Error fetching user info: ",
        ))
    }

    async fn get_user_submissions(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: SubmissionsArgs = parse_args("get_user_submissions", arguments)?;
        Ok(render(
            self.client
                .get_user_status(&args.handle, 1, args.count)
                .await,
            "Error fetching submissions: ",
        ))
    }

    async fn get_user_rating(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: HandleArgs = parse_args("get_user_rating", arguments)?;
        Ok(render(
            self.client.get_user_rating(&args.handle).await,
            "Error fetching rating: ",
        ))
    }

    async fn get_contest_list(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: ContestListArgs = parse_args("get_contest_list", arguments)?;
        Ok(render(
            self.client.get_contest_list(args.gym).await,
            "Error fetching contests: ",
        ))
    }

    async fn get_contest_standings(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: StandingsArgs = parse_args("get_contest_standings", arguments)?;
        Ok(render(
            self.client
                .get_contest_standings(args.contest_id, 1, args.count, false)
                .await,
            "Error fetching standings: ",
        ))
    }

    async fn get_problems(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: ProblemsArgs = parse_args("get_problems", arguments)?;
        Ok(render(
            self.client
                .get_problems(args.tags.as_deref(), args.limit_kb, args.start_index)
                .await,
            "Error fetching problems: ",
        ))
    }

    async fn get_user_blog_entries(&self, arguments: Value) -> AgentResult<Vec<Content>> {
        let args: HandleArgs = parse_args("get_user_blog_entries", arguments)?;
        Ok(render(
            self.client.get_user_blog_entries(&args.handle).await,
            "Error fetching blog entries: ",
        ))
    }
}

#[async_trait]
impl System for CodeforcesSystem {
    fn name(&self) -> &str {
        "codeforces"
    }

    fn description(&self) -> &str {
        "Live data from the Codeforces API: users, submissions, ratings, contests, problems and blogs"
    }

    fn instructions(&self) -> &str {
        "Responses are raw Codeforces API objects. Prefer small counts and page through \
        get_problems with start_index instead of raising limit_kb."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_call: ToolCall) -> AgentResult<Vec<Content>> {
        match tool_call.name.as_str() {
            "get_user_info" => self.get_user_info(tool_call.arguments).await,
            "get_user_submissions" => self.get_user_submissions(tool_call.arguments).await,
            "get_user_rating" => self.get_user_rating(tool_call.arguments).await,
            "get_contest_list" => self.get_contest_list(tool_call.arguments).await,
            "get_contest_standings" => self.get_contest_standings(tool_call.arguments).await,
            "get_problems" => self.get_problems(tool_call.arguments).await,
            "get_user_blog_entries" => self.get_user_blog_entries(tool_call.arguments).await,
            _ => Err(AgentError::ToolNotFound(tool_call.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codeforces::CodeforcesConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup_system() -> (MockServer, CodeforcesSystem) {
        let mock_server = MockServer::start().await;
        let client = CodeforcesClient::new(CodeforcesConfig {
            base_url: mock_server.uri(),
            rate_limit_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        (mock_server, CodeforcesSystem::new(client))
    }

    #[tokio::test]
    async fn test_submissions_use_default_count() {
        let (server, system) = setup_system().await;
        Mock::given(method("GET"))
            .and(path("/user.status"))
            .and(query_param("handle", "tourist"))
            .and(query_param("from", "1"))
            .and(query_param("count", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "result": [{"id": 1, "verdict": "OK"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = system
            .call(ToolCall::new("get_user_submissions", json!({"handle": "tourist"})))
            .await
            .unwrap();
        assert_eq!(output, vec![Content::json(json!([{"id": 1, "verdict": "OK"}]))]);
    }

    #[tokio::test]
    async fn test_float_arguments_are_accepted() {
        let (server, system) = setup_system().await;
        Mock::given(method("GET"))
            .and(path("/contest.standings"))
            .and(query_param("contestId", "1900"))
            .and(query_param("count", "3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "OK", "result": {"rows": []}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let output = system
            .call(ToolCall::new(
                "get_contest_standings",
                json!({"contest_id": 1900.0, "count": 3}),
            ))
            .await
            .unwrap();
        assert_eq!(output, vec![Content::json(json!({"rows": []}))]);
    }

    #[tokio::test]
    async fn test_upstream_failure_becomes_text() {
        let (server, system) = setup_system().await;
        Mock::given(method("GET"))
            .and(path("/user.info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "FAILED",
                "comment": "handles: User with handle ghost not found"
            })))
            .mount(&server)
            .await;

        let output = system
            .call(ToolCall::new("get_user_info", json!({"handle": "ghost"})))
            .await
            .unwrap();
        assert_eq!(
            output,
            vec![Content::text(
                "Error fetching user info: Codeforces API Error: handles: User with handle ghost not found"
            )]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_becomes_text() {
        let (server, system) = setup_system().await;
        Mock::given(method("GET"))
            .and(path("/user.blogEntries"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let output = system
            .call(ToolCall::new("get_user_blog_entries", json!({"handle": "tourist"})))
            .await
            .unwrap();
        let text = output[0].as_text().unwrap();
        assert!(text.starts_with("Error fetching blog entries: Failed to connect to Codeforces API"));
    }

    #[tokio::test]
    async fn test_contest_list_without_arguments() {
        let (server, system) = setup_system().await;
        Mock::given(method("GET"))
            .and(path("/contest.list"))
            .and(query_param("gym", "false"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "result": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let output = system
            .call(ToolCall::new("get_contest_list", Value::Null))
            .await
            .unwrap();
        assert_eq!(output, vec![Content::json(json!([]))]);
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let (_server, system) = setup_system().await;
        let err = system
            .call(ToolCall::new("get_user_rating", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidParameters(msg) if msg.contains("handle")));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (_server, system) = setup_system().await;
        let err = system
            .call(ToolCall::new("get_weather", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, AgentError::ToolNotFound("get_weather".to_string()));
    }

    #[tokio::test]
    async fn test_problem_page_is_returned_as_json() {
        let (server, system) = setup_system().await;
        Mock::given(method("GET"))
            .and(path("/problemset.problems"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "result": {
                    "problems": [{"contestId": 1, "index": "A"}, {"contestId": 1, "index": "B"}],
                    "problemStatistics": [{"solvedCount": 5}, {"solvedCount": 3}]
                }
            })))
            .mount(&server)
            .await;

        let output = system
            .call(ToolCall::new("get_problems", json!({"start_index": 1})))
            .await
            .unwrap();
        let page = output[0].as_json().unwrap();
        assert_eq!(page["problems"], json!([{"contestId": 1, "index": "B"}]));
        assert_eq!(page["problemStatistics"], json!([{"solvedCount": 3}]));
        assert_eq!(page["next_start_index"], Value::Null);
        assert_eq!(page["total_problems"], 2);
    }
}
