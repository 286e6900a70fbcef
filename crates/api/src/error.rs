//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as
//! `{ "success": false, "message": "..." }`. Server errors are captured to
//! Sentry and answered with a generic message.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use gallery_core::{ParseEnumError, PriceError, RatingError};

use crate::db::{InvalidSort, RepositoryError};
use crate::models::ArtworkFormError;
use crate::services::{AuthError, OrderError, UploadError};

/// Message sent for every 5xx response.
const SERVER_ERROR_MESSAGE: &str = "Server Error";

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order workflow failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Upload was rejected or could not be stored.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated, or not allowed to touch this resource.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated caller lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
}

impl AppError {
    /// Status code and client-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Database(e) => repository_status(e),
            Self::Auth(e) => auth_status(e),
            Self::Order(e) => order_status(e),
            Self::Upload(e) => match e {
                UploadError::Io(_) => server_error(),
                other => (StatusCode::BAD_REQUEST, other.to_string()),
            },
            Self::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            Self::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            Self::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            Self::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
            Self::Internal(_) => server_error(),
        }
    }
}

fn server_error() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        SERVER_ERROR_MESSAGE.to_string(),
    )
}

fn repository_status(e: &RepositoryError) -> (StatusCode, String) {
    match e {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
        RepositoryError::Conflict(m) => (StatusCode::BAD_REQUEST, m.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => server_error(),
    }
}

fn auth_status(e: &AuthError) -> (StatusCode, String) {
    match e {
        AuthError::InvalidEmail(inner) => (
            StatusCode::BAD_REQUEST,
            format!("Please provide a valid email ({inner})"),
        ),
        AuthError::MissingName
        | AuthError::IncorrectPassword
        | AuthError::UserAlreadyExists
        | AuthError::WeakPassword(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, e.to_string()),
        AuthError::Token(_) => (StatusCode::UNAUTHORIZED, "Token is not valid".to_string()),
        AuthError::NotAdmin => (StatusCode::FORBIDDEN, e.to_string()),
        AuthError::Repository(inner) => repository_status(inner),
        AuthError::PasswordHash => server_error(),
    }
}

fn order_status(e: &OrderError) -> (StatusCode, String) {
    match e {
        OrderError::ArtworkNotFound(_) | OrderError::NotFound => {
            (StatusCode::NOT_FOUND, e.to_string())
        }
        OrderError::NotOwner => (StatusCode::UNAUTHORIZED, e.to_string()),
        OrderError::Repository(inner) => repository_status(inner),
        OrderError::EmptyOrder
        | OrderError::InvalidQuantity
        | OrderError::MissingAddressField(_)
        | OrderError::InsufficientStock { .. }
        | OrderError::NotCancellable
        | OrderError::Transition(_) => (StatusCode::BAD_REQUEST, e.to_string()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            success: false,
            message: &message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ArtworkFormError> for AppError {
    fn from(e: ArtworkFormError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<InvalidSort> for AppError {
    fn from(e: InvalidSort) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<RatingError> for AppError {
    fn from(e: RatingError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<PriceError> for AppError {
    fn from(e: PriceError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<ParseEnumError> for AppError {
    fn from(e: ParseEnumError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(e: PathRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(e: QueryRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(e: MultipartError) -> Self {
        Self::BadRequest(e.body_text())
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}
