use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::error::{ApiError, ApiResult};
use super::pagination::{paginate, ProblemPage};
use super::rate_limit::RateLimiter;

pub const CODEFORCES_API: &str = "https://codeforces.com/api";

#[derive(Debug, Clone)]
pub struct CodeforcesConfig {
    pub base_url: String,
    pub rate_limit_delay: Duration,
    pub timeout: Duration,
}

impl Default for CodeforcesConfig {
    fn default() -> Self {
        Self {
            base_url: CODEFORCES_API.to_string(),
            rate_limit_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

/// The `{status, result | comment}` wrapper around every API response
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProblemSet {
    #[serde(default)]
    problems: Vec<Value>,
    #[serde(default, rename = "problemStatistics")]
    problem_statistics: Vec<Value>,
}

/// Rate-limited client for the Codeforces API.
///
/// Results are passed through as upstream shaped them; only the envelope is checked.
#[derive(Clone)]
pub struct CodeforcesClient {
    client: Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
}

impl CodeforcesClient {
    pub fn new(config: CodeforcesConfig) -> ApiResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_delay)),
        })
    }

    /// Share a limiter with other clients talking to the same host
    pub fn with_rate_limiter(mut self, rate_limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = rate_limiter;
        self
    }

    pub fn rate_limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.rate_limiter)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/{}", self.base_url, method);
        tracing::debug!(method, "Requesting Codeforces API");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("HTTP error occurred: {}", e);
                ApiError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Rejections for bad arguments arrive as 400 with an envelope in the body
            let detail = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|envelope| envelope.comment)
                .unwrap_or(body);
            tracing::error!(method, %status, "Codeforces API returned an error status");
            return Err(ApiError::Transport(format!("{}: {}", status, detail)));
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ApiError::Transport(format!("invalid response body: {}", e)))?;

        if envelope.status != "OK" {
            let comment = envelope
                .comment
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::warn!(method, comment = comment.as_str(), "Codeforces API rejected request");
            return Err(ApiError::Rejected(comment));
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null))
            .map_err(|e| ApiError::Transport(format!("unexpected result for {}: {}", method, e)))
    }

    /// Returns information about one or more users (`;`-separated handles)
    pub async fn get_user_info(&self, handle: &str) -> ApiResult<Value> {
        self.request("user.info", &[("handles", handle.to_string())])
            .await
    }

    /// Returns submissions of the specified user, newest first
    pub async fn get_user_status(
        &self,
        handle: &str,
        from_index: u32,
        count: u32,
    ) -> ApiResult<Value> {
        self.request(
            "user.status",
            &[
                ("handle", handle.to_string()),
                ("from", from_index.to_string()),
                ("count", count.to_string()),
            ],
        )
        .await
    }

    /// Returns the rating history of the specified user
    pub async fn get_user_rating(&self, handle: &str) -> ApiResult<Value> {
        self.request("user.rating", &[("handle", handle.to_string())])
            .await
    }

    /// Returns upcoming and past contests, or gym contests when `gym` is set
    pub async fn get_contest_list(&self, gym: bool) -> ApiResult<Value> {
        self.request("contest.list", &[("gym", gym.to_string())])
            .await
    }

    /// Returns the contest description and the requested part of its standings
    pub async fn get_contest_standings(
        &self,
        contest_id: u64,
        from_index: u32,
        count: u32,
        show_unofficial: bool,
    ) -> ApiResult<Value> {
        self.request(
            "contest.standings",
            &[
                ("contestId", contest_id.to_string()),
                ("from", from_index.to_string()),
                ("count", count.to_string()),
                ("showUnofficial", show_unofficial.to_string()),
            ],
        )
        .await
    }

    /// Returns one page of the problemset, optionally filtered by `;`-separated tags.
    ///
    /// Upstream has no pagination for this endpoint, so the whole listing is
    /// fetched on every call and sliced by [`paginate`].
    pub async fn get_problems(
        &self,
        tags: Option<&str>,
        limit_kb: usize,
        start_index: usize,
    ) -> ApiResult<ProblemPage> {
        let mut params = Vec::new();
        if let Some(tags) = tags.filter(|t| !t.is_empty()) {
            params.push(("tags", tags.to_string()));
        }

        let problem_set: ProblemSet = self.request("problemset.problems", &params).await?;
        Ok(paginate(
            problem_set.problems,
            problem_set.problem_statistics,
            start_index,
            limit_kb,
        ))
    }

    /// Returns every blog entry written by the user
    pub async fn get_user_blog_entries(&self, handle: &str) -> ApiResult<Value> {
        self.request("user.blogEntries", &[("handle", handle.to_string())])
            .await
    }
}
