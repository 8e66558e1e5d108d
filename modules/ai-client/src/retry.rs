use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::ProviderError;

/// Total attempts per provider call, including the first.
pub const MAX_ATTEMPTS: u32 = 3;

const BASE_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(4);

/// Run one provider call with bounded exponential backoff. Only retryable
/// failures (network, 429, 5xx) get another attempt; everything else is
/// returned immediately.
pub async fn with_backoff<T, F, Fut>(label: &str, mut call: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut delay = BASE_DELAY;
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_ATTEMPTS && e.is_retryable() => {
                warn!(attempt, error = %e, "{label} failed, retrying");
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
