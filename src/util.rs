//! Small shared helpers

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// Retry an async operation with exponential backoff (1s, 2s, 4s, ...)
pub(crate) async fn retry_with_backoff<F, Fut, T>(max_retries: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 0..=max_retries {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                last_error = Some(e);
                if attempt < max_retries {
                    let delay = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        "request failed (attempt {}/{}), retrying in {:?}",
                        attempt + 1,
                        max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::internal("retry loop ran no attempts")))
}

/// Truncate to at most `max_chars` characters on a char boundary
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
