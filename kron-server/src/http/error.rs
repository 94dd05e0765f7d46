//! API error type with IntoResponse
//!
//! Errors become plain-text responses carrying the error message:
//! validation and database failures are `400`, everything else `500`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::registration::RegistrationError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Registration failed at some step
    Registration(RegistrationError),

    /// Body was not a well-formed registration payload (400)
    MalformedBody { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Registration(RegistrationError::Validation(_))
            | Self::Registration(RegistrationError::Database(_))
            | Self::MalformedBody { .. } => StatusCode::BAD_REQUEST,
            Self::Registration(RegistrationError::Unexpected(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Registration(RegistrationError::Validation(e)) => {
                tracing::warn!(error = %e, "validation error");
                e.to_string()
            }
            Self::Registration(RegistrationError::Database(e)) => {
                tracing::error!(error = %e, "database error");
                e.to_string()
            }
            Self::Registration(RegistrationError::Unexpected(message)) => {
                tracing::error!(error = %message, "unexpected error");
                message
            }
            Self::MalformedBody { message } => {
                tracing::warn!(error = %message, "malformed request body");
                message
            }
        };

        (status, message).into_response()
    }
}

impl From<RegistrationError> for ApiError {
    fn from(e: RegistrationError) -> Self {
        Self::Registration(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::MalformedBody {
            message: rejection.body_text(),
        }
    }
}
