//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::{AuthError, EntryActionError, ImportSubmitError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation or state-machine error)
    BadRequest(String),
    /// Caller is not allowed to touch the resource
    Unauthorized,
    /// Internal server error. The detail is logged, never sent.
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("UNAUTHORIZED", "Unauthorized"),
            ),
            AppError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { message, .. } => AppError::NotFound(message),
            RepositoryError::InvalidAction { .. } => {
                AppError::BadRequest("Unable to perform the desired action at this time".into())
            }
            RepositoryError::InconsistentParentAndAccount { .. } => {
                AppError::BadRequest("Mismatched Parent and Account IDs".into())
            }
            RepositoryError::ValidationError { message, .. } => AppError::BadRequest(message),
            RepositoryError::SessionInvalid { .. } => AppError::Unauthorized,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::NotFound => AppError::NotFound("Unable to find requested object".into()),
            AuthError::Unauthorized => AppError::Unauthorized,
            AuthError::DataInconsistency => {
                AppError::BadRequest("Referenced data is inconsistent".into())
            }
            AuthError::Store(inner) => inner.into(),
        }
    }
}

impl From<ImportSubmitError> for AppError {
    fn from(err: ImportSubmitError) -> Self {
        match err {
            ImportSubmitError::InvalidTree(inner) => AppError::BadRequest(inner.to_string()),
            ImportSubmitError::Store(inner) => inner.into(),
        }
    }
}

impl From<EntryActionError> for AppError {
    fn from(err: EntryActionError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_action_maps_to_bad_request_with_hint() {
        let err = AppError::from(RepositoryError::invalid_action("double start"));
        match err {
            AppError::BadRequest(msg) => {
                assert_eq!(msg, "Unable to perform the desired action at this time")
            }
            other => panic!("unexpected mapping: {:?}", other),
        }
    }

    #[test]
    fn unauthorized_never_becomes_not_found() {
        let err = AppError::from(AuthError::Unauthorized);
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn invalid_tree_surfaces_the_root_name_rule() {
        let err = AppError::from(ImportSubmitError::InvalidTree(
            crate::services::TreeValidationError::InvalidName,
        ));
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "Only the root name can be empty"),
            other => panic!("unexpected mapping: {:?}", other),
        }
    }
}
