// src/github/error.rs

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use thiserror::Error;

/// Errors from talking to the GitHub REST and GraphQL endpoints
#[derive(Error, Debug)]
pub enum ApiError {
    /// The quota is spent; worth retrying after a pause
    #[error("Rate limited (HTTP {status}): {message}")]
    RateLimited {
        status: StatusCode,
        message: String,
        reset: Option<DateTime<Utc>>,
    },

    #[error("API error {status}: {body}")]
    Http { status: StatusCode, body: String },

    /// A GraphQL response that came back 200 but carried an `errors` list
    #[error("GraphQL errors: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    #[error("Response is missing expected data: {0}")]
    MissingData(String),

    #[error("Max retries exceeded after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<ApiError> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. })
    }

    /// Classify a non-success HTTP response.
    ///
    /// 403 and 429 count as rate limiting when the body says so or when
    /// `x-ratelimit-remaining` has hit zero. Anything else is permanent.
    pub fn from_response(
        status: StatusCode,
        body: String,
        remaining: Option<&str>,
        reset: Option<&str>,
    ) -> Self {
        let limited_status = status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS;
        let body_says_so = body.to_lowercase().contains("rate limit");
        let quota_spent = remaining.map(|r| r.trim() == "0").unwrap_or(false);

        if limited_status && (body_says_so || quota_spent) {
            let reset = reset
                .and_then(|r| r.trim().parse::<i64>().ok())
                .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
            ApiError::RateLimited {
                status,
                message: body,
                reset,
            }
        } else {
            ApiError::Http { status, body }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_403_with_rate_limit_body_is_retryable() {
        let err = ApiError::from_response(
            StatusCode::FORBIDDEN,
            r#"{"message":"API rate limit exceeded for user"}"#.to_string(),
            None,
            None,
        );
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_429_with_spent_quota_header_is_retryable() {
        let err = ApiError::from_response(
            StatusCode::TOO_MANY_REQUESTS,
            "slow down".to_string(),
            Some("0"),
            Some("1700000000"),
        );
        match err {
            ApiError::RateLimited { reset, .. } => {
                assert_eq!(reset.unwrap().timestamp(), 1_700_000_000);
            }
            other => panic!("expected RateLimited, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_403_is_permanent() {
        let err = ApiError::from_response(
            StatusCode::FORBIDDEN,
            r#"{"message":"Resource not accessible by integration"}"#.to_string(),
            Some("4999"),
            None,
        );
        assert!(!err.is_rate_limited());
        assert!(err.to_string().contains("API error 403"));
    }

    #[test]
    fn test_rate_limit_text_on_other_status_is_permanent() {
        let err = ApiError::from_response(StatusCode::NOT_FOUND, "rate limit".to_string(), None, None);
        assert!(!err.is_rate_limited());
    }
}
