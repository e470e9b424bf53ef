use std::collections::BTreeMap;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::users::error::UserError;

/// Validation messages keyed by request field.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Error returned from handlers, rendered as the JSON error envelope.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    errors: Option<FieldErrors>,
    error: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    status_code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ApiError {
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Validation error".into(),
            errors: Some(errors),
            error: None,
        }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self::validation(errors)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.to_string(),
            errors: None,
            error: None,
        }
    }

    pub fn internal(message: &str, err: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
            errors: None,
            error: Some(err.to_string()),
        }
    }

    /// Maps a service error; `failure` is the message used for 5xx responses.
    pub fn from_user_error(e: UserError, failure: &str) -> Self {
        match e {
            UserError::DuplicateEmail { .. } => {
                Self::field("email", "The email has already been taken.")
            }
            UserError::InvalidWeekdayIndex { index } => Self::field(
                "week_number",
                format!("The week_number value {index} must be between 0 and 6."),
            ),
            UserError::UserNotFound { .. } => Self::unauthorized("User not found"),
            UserError::Persistence(_) | UserError::TokenIssue(_) => {
                error!(error = ?e, "{}", failure);
                Self::internal(failure, &e)
            }
        }
    }

    #[cfg(test)]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::field("body", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            message: self.message,
            errors: self.errors,
            error: self.error,
        };
        (self.status, Json(body)).into_response()
    }
}
