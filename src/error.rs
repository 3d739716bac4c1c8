use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures reported by an inference backend for a single attempt.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The service did not answer in time. The only retryable failure.
    #[error("inference request timed out")]
    Timeout,
    #[error("{} is not set", crate::config::API_TOKEN_VAR)]
    MissingCredential,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("inference API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to decode image: {0}")]
    Decode(String),
}

impl InferenceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Terminal outcome of a failed `generate` call.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("maximum retries reached after {attempts} timed out attempts")]
    RetryExhausted { attempts: u32 },
    #[error("image generation took longer than {} seconds", .budget.as_secs())]
    BudgetExceeded { elapsed: Duration, budget: Duration },
    #[error("{0}")]
    Generic(String),
}

impl GenerationError {
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::RetryExhausted { .. } => "retry_exhausted",
            GenerationError::BudgetExceeded { .. } => "budget_exceeded",
            GenerationError::Generic(_) => "generic",
        }
    }
}

impl From<InferenceError> for GenerationError {
    fn from(err: InferenceError) -> Self {
        GenerationError::Generic(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),
    #[error("image generation failed: {0}")]
    Generation(#[from] GenerationError),
    #[error("other: {0}")]
    Other(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Generation(
                GenerationError::RetryExhausted { .. } | GenerationError::BudgetExceeded { .. },
            ) => StatusCode::GATEWAY_TIMEOUT,
            ServiceError::Generation(GenerationError::Generic(_)) => StatusCode::BAD_GATEWAY,
            ServiceError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ServiceError::Generation(err) => serde_json::json!({
                "error": self.to_string(),
                "kind": err.kind(),
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_timeouts_are_transient() {
        assert!(InferenceError::Timeout.is_transient());
        assert!(!InferenceError::MissingCredential.is_transient());
        assert!(!InferenceError::Auth("invalid token".into()).is_transient());
        assert!(
            !InferenceError::Api {
                status: 500,
                message: "boom".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn generic_keeps_underlying_message() {
        let err: GenerationError = InferenceError::Auth("Invalid credentials".into()).into();
        assert_eq!(err.kind(), "generic");
        assert_eq!(err.to_string(), "authentication failed: Invalid credentials");
    }

    #[test]
    fn budget_message_names_the_limit() {
        let err = GenerationError::BudgetExceeded {
            elapsed: Duration::from_secs(75),
            budget: Duration::from_secs(60),
        };
        assert_eq!(
            err.to_string(),
            "image generation took longer than 60 seconds"
        );
    }

    #[test]
    fn status_codes_follow_failure_kind() {
        let cases = [
            (
                ServiceError::BadRequest("Please enter a prompt!".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                GenerationError::RetryExhausted { attempts: 3 }.into(),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                GenerationError::Generic("bad".into()).into(),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
