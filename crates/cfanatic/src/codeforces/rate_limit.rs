use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Enforces a minimum delay between consecutive requests to one upstream host.
///
/// Callers wait cooperatively rather than being rejected. The timestamp lock is
/// held while sleeping, so concurrent callers queue up and each one waits the
/// full delay after the caller before it.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request: Mutex::new(None),
        }
    }

    /// Wait until a request may be issued, then record it as issued now
    pub async fn acquire(&self) {
        let mut last_request = self.last_request.lock().await;

        if let Some(previous) = *last_request {
            let ready_at = previous + self.delay;
            let now = Instant::now();
            if ready_at > now {
                tracing::debug!(
                    "Rate limiting: sleeping for {:.2} seconds",
                    (ready_at - now).as_secs_f64()
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_request = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
