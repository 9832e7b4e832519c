// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types with a uniform failure shape.
//!
//! Every API failure carries an optional HTTP status and a displayable
//! message, so callers can tell "server rejected" from "unreachable".

use reqwest::StatusCode;
use serde::Deserialize;

/// Client error type returned by every API operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// Malformed form input, caught before any request is sent.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// 401: missing, expired, or invalid credentials.
    #[error("{0}")]
    Auth(String),

    /// 403: the backend refused an admin-only operation.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Any other 4xx.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// 5xx.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// No response at all.
    #[error("network failure")]
    Network(String),

    /// The response body did not match the expected schema.
    #[error("Unexpected response: {0}")]
    Schema(String),
}

/// Error body shape used by the backend.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiError {
    /// Message shown when the server gives no `error` field.
    pub fn generic_message(status: u16) -> String {
        format!("HTTP error! status: {}", status)
    }

    /// Build an error from a non-2xx status and its raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let code = status.as_u16();
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| Self::generic_message(code));

        match code {
            401 => ApiError::Auth(message),
            403 => ApiError::Forbidden(message),
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::Server {
                status: code,
                message,
            },
            _ => ApiError::Rejected {
                status: code,
                message,
            },
        }
    }

    /// HTTP status, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Auth(_) => Some(401),
            ApiError::Forbidden(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Rejected { status, .. } | ApiError::Server { status, .. } => Some(*status),
            ApiError::Validation(_) | ApiError::Network(_) | ApiError::Schema(_) => None,
        }
    }

    /// Displayable message for the nearest UI boundary.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Check if this error should drop the session.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::Auth(_))
    }

    /// Check if the caller may reasonably try again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server { .. })
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let reason = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "is invalid".to_string());
                format!("{} {}", field, reason)
            })
            .collect();
        fields.sort();
        ApiError::Validation(fields.join(", "))
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
