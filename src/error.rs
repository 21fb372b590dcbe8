use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::{auth::TokenError, response::Envelope, users::repo::StoreError};

/// A single rejected field in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("validation failed")]
    Validation(Vec<FieldViolation>),
    #[error("{message}")]
    Unauthorized {
        message: String,
        reason: Option<String>,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            reason: None,
        }
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        Self::Internal(e.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::BadRequest(m) => m.clone(),
            Self::Validation(_) => "Validation failed".into(),
            Self::Unauthorized { message, .. } => message.clone(),
            Self::NotFound(m) | Self::Conflict(m) => m.clone(),
            Self::Unavailable(_) => "Storage is unavailable".into(),
            Self::Internal(_) => "Internal server error".into(),
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::BadRequest(m) | Self::Unavailable(m) | Self::Internal(m) => Some(m.clone()),
            Self::Validation(violations) => Some(
                violations
                    .iter()
                    .map(|v| format!("{}: {}", v.field, v.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            ),
            Self::Unauthorized { reason, .. } => reason.clone(),
            Self::Conflict(m) => Some(m.clone()),
            Self::NotFound(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(%status, error = %self, "request failed");
        } else {
            warn!(%status, error = %self, "request rejected");
        }

        let data = match &self {
            Self::Validation(violations) => serde_json::to_value(violations).ok(),
            _ => None,
        };
        let body = Envelope {
            success: false,
            message: self.message(),
            data,
            error: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict { field } => {
                Self::Conflict(format!("a user with this {field} already exists"))
            }
            StoreError::Unavailable(m) => Self::Unavailable(m),
            StoreError::Database(m) => Self::Internal(m),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        Self::Unauthorized {
            message: "Invalid or expired token".into(),
            reason: Some(e.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
