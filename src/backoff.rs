//! Backoff arithmetic and response classification for the retry loop.

use std::time::Duration;

use rand::Rng;
use reqwest::{header::HeaderMap, header::RETRY_AFTER, StatusCode};

use crate::RetryPolicy;

/// Exclusive upper bound of the random jitter added to exponential delays.
pub const JITTER_MAX_MS: u64 = 250;

/// How the retry loop treats a response status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum StatusClass {
    Success,
    /// 429 or any 5xx.
    Retryable,
    Fatal,
}

pub(crate) fn classify_status(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        StatusClass::Retryable
    } else {
        StatusClass::Fatal
    }
}

/// Reads `Retry-After` as whole seconds.
///
/// HTTP-date values and anything else that is not a leading integer are
/// ignored.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<u64> {
    let raw = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();
    let digits = raw
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw, |end| &raw[..end]);
    digits.parse().ok()
}

/// Deterministic part of the backoff for a 1-indexed attempt:
/// `min(max_delay_ms, base_delay_ms * 2^(attempt - 1))`.
pub fn exponential_delay_ms(policy: &RetryPolicy, attempt: usize) -> u64 {
    let exp = attempt.saturating_sub(1).min(16) as u32;
    let multiplier = 1u64 << exp;
    policy
        .base_delay_ms
        .saturating_mul(multiplier)
        .min(policy.max_delay_ms)
}

/// Delay before retrying after the given 1-indexed attempt failed.
///
/// A positive `Retry-After` hint wins and is used verbatim; otherwise the
/// exponential delay gets `[0, JITTER_MAX_MS)` of jitter.
pub fn retry_delay(policy: &RetryPolicy, attempt: usize, retry_after_secs: Option<u64>) -> Duration {
    match retry_after_secs {
        Some(secs) if secs > 0 => Duration::from_millis(secs.saturating_mul(1_000)),
        _ => {
            let jitter = rand::thread_rng().gen_range(0..JITTER_MAX_MS);
            Duration::from_millis(exponential_delay_ms(policy, attempt).saturating_add(jitter))
        }
    }
}
