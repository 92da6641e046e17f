use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cfanatic::models::message::Message;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    handle: String,
    #[serde(default)]
    api_key: Option<String>,
    /// History returned by a previous call
    #[serde(default)]
    history: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    history: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
}

fn error_response(status: StatusCode, detail: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
        .into_response()
}

async fn chat_handler(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Response {
    let Some(credential) = state.credential_for(request.api_key.as_deref()) else {
        return error_response(StatusCode::BAD_REQUEST, "A model API key is required");
    };

    let turn = state.assistant.process_message(
        &request.message,
        &request.handle,
        &credential,
        request.history,
    );

    match timeout(state.turn_timeout, turn).await {
        Ok(Ok(turn)) => Json(ChatResponse {
            response: turn.answer,
            history: turn.messages,
        })
        .into_response(),
        Ok(Err(e)) => {
            tracing::error!(handle = request.handle.as_str(), error = %e, "Turn failed");
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
        Err(_) => {
            tracing::error!(handle = request.handle.as_str(), "Turn timed out");
            error_response(
                StatusCode::GATEWAY_TIMEOUT,
                format!("No answer within {} seconds", state.turn_timeout.as_secs()),
            )
        }
    }
}

async fn status_handler() -> &'static str {
    "ok"
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}
