//! HTTP error type and its JSON body.

use asset_features_core::{Lookup, StoreError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

/// Error returned by every API handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Malformed path or query parameter.
    #[error("{message}")]
    BadRequest { title: String, message: String },

    #[error("{message}")]
    NotFound { title: String, message: String },

    /// The store could not answer; the request may succeed later.
    #[error("{0}")]
    Unavailable(String),

    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// Configuration fault or any other server-side failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadRequest {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn not_found(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NotFound {
            title: title.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn title(&self) -> &str {
        match self {
            Self::BadRequest { title, .. } | Self::NotFound { title, .. } => title,
            Self::Unavailable(_) => "Service Unavailable",
            Self::NotImplemented(_) => "Not Implemented",
            Self::Internal(_) => "Server Error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            // A table that fails catalog validation does not exist as far as
            // the client is concerned.
            StoreError::InvalidIdentifier { value } => Self::not_found(
                "Collection Not Found",
                format!("no feature table named {value:?}"),
            ),
            StoreError::Unsupported { operation } => Self::NotImplemented(operation.to_string()),
            e if e.is_transient() => Self::Unavailable(e.to_string()),
            e => {
                error!(error = %e, "store configuration fault");
                Self::Internal(e.to_string())
            }
        }
    }
}

/// JSON error body.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_title: String,
    pub error_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u16>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error_title: self.title().to_string(),
            error_message: self.to_string(),
            error_code: status.is_server_error().then_some(status.as_u16()),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Unwraps a found value, mapping the other outcomes to 404 and 503.
///
/// # Errors
///
/// [`ApiError::NotFound`] built from `title` and `message`, or
/// [`ApiError::Unavailable`].
pub fn require<T>(
    lookup: Lookup<T>,
    title: &str,
    message: impl FnOnce() -> String,
) -> ApiResult<T> {
    match lookup {
        Lookup::Found(value) => Ok(value),
        Lookup::NotFound => Err(ApiError::not_found(title, message())),
        Lookup::Unavailable(detail) => Err(ApiError::Unavailable(detail)),
    }
}
