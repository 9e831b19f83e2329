//! `X-RateLimit-*` response headers.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponseParts, ResponseParts};
use std::convert::Infallible;

use agora_core::types::RateLimitOutcome;

/// Budget for the current window.
pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
/// Calls left in the current window.
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
/// Window reset, unix seconds.
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Writes the three rate-limit headers for `outcome`.
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, outcome: &RateLimitOutcome) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(outcome.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(outcome.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(outcome.reset_unix()));
}

/// Response part that attaches the rate-limit headers of a checked action.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitHeaders(pub RateLimitOutcome);

impl IntoResponseParts for RateLimitHeaders {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        apply_rate_limit_headers(res.headers_mut(), &self.0);
        Ok(res)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn test_headers_are_written() {
        let reset_at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let outcome = RateLimitOutcome::at(reset_at, true, 5, 4, reset_at);
        let mut headers = HeaderMap::new();
        apply_rate_limit_headers(&mut headers, &outcome);
        assert_eq!(headers[X_RATELIMIT_LIMIT], "5");
        assert_eq!(headers[X_RATELIMIT_REMAINING], "4");
        assert_eq!(headers[X_RATELIMIT_RESET], "1700000000");
    }
}
