//! Shared HTTP POST helper for both timestamping strategies: bounded
//! retry on transient network failure, strict 2xx status check.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use tracing::warn;

use crate::error::{Result, SigningError};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

/// POST `body` to `url` with `content_type`, retrying up to
/// [`MAX_ATTEMPTS`] times on transport-level failure (connect/timeout)
/// with exponential backoff. A non-2xx response is not retried — it's a
/// server-side answer, not a transient failure.
pub fn post_with_retries(
    client: &Client,
    url: &str,
    body: Vec<u8>,
    content_type: &'static str,
) -> Result<Vec<u8>> {
    let mut backoff = INITIAL_BACKOFF;
    let mut last_error = None;

    for attempt in 1..=MAX_ATTEMPTS {
        let outcome = client
            .post(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, body.len())
            .body(body.clone())
            .send();

        match outcome {
            Ok(response) => {
                let status = response.status();
                if !status.is_success() {
                    return Err(SigningError::Timestamp(format!(
                        "timestamp server at {url} returned {status}"
                    )));
                }
                return response
                    .bytes()
                    .map(|b| b.to_vec())
                    .map_err(|e| SigningError::Timestamp(format!("reading timestamp response: {e}")));
            }
            Err(e) if attempt < MAX_ATTEMPTS => {
                warn!(attempt, error = %e, "transient timestamp request failure, retrying");
                last_error = Some(e);
                std::thread::sleep(backoff);
                backoff *= 2;
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(SigningError::Timestamp(format!(
        "timestamp request to {url} failed after {MAX_ATTEMPTS} attempts: {}",
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}
