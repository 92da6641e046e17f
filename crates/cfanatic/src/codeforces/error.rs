use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The request never produced a usable envelope: connection failure, non-2xx status or undecodable body
    #[error("Failed to connect to Codeforces API: {0}")]
    Transport(String),

    /// Upstream answered with `status != "OK"`
    #[error("Codeforces API Error: {0}")]
    Rejected(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}
