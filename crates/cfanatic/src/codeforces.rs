//! Access to the public Codeforces REST API.
//!
//! Every call goes through a shared [`RateLimiter`] so the host sees at most one
//! request per configured delay, and the problemset listing is cut into
//! size-bounded pages because upstream returns it in one piece.
pub mod client;
pub mod error;
pub mod pagination;
pub mod rate_limit;

pub use client::{CodeforcesClient, CodeforcesConfig};
pub use error::{ApiError, ApiResult};
pub use pagination::{paginate, ProblemPage};
pub use rate_limit::RateLimiter;
