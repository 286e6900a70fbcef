//! Bearer token extractors.
//!
//! `RequireAuth` verifies `Authorization: Bearer <jwt>` and loads the user.
//! `RequireAdmin` additionally requires the `admin` role. The role is read
//! from the database, so a demotion takes effect before the token expires.
//! A database failure while loading the user is a server error, not a token
//! rejection.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

/// Extractor that requires a valid bearer token for an admin.
pub struct RequireAdmin(pub CurrentUser);

/// Why a request was refused by an auth extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No `Authorization: Bearer` header.
    MissingToken,
    /// Token is malformed, forged, expired, or names a deleted user.
    InvalidToken,
    /// Authenticated, but not an admin.
    NotAdmin,
}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        match rejection {
            AuthRejection::MissingToken => {
                Self::Unauthorized("No token, authorization denied".to_string())
            }
            AuthRejection::InvalidToken => Self::Unauthorized("Token is not valid".to_string()),
            AuthRejection::NotAdmin => Self::Forbidden("Not authorized as admin".to_string()),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

/// The token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthRejection::MissingToken)?;

        let claims = state
            .tokens()
            .verify(token)
            .map_err(|_| AuthRejection::InvalidToken)?;
        let user_id = claims.user_id().map_err(|_| AuthRejection::InvalidToken)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(user_id)
            .await?
            .ok_or(AuthRejection::InvalidToken)?;

        set_sentry_user(&user.id, Some(user.email.as_str()));
        Ok(Self(CurrentUser::from(user)))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "non-admin refused");
            return Err(AuthRejection::NotAdmin.into());
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.def"))), Some("abc.def"));
        assert_eq!(bearer_token(&parts_with(Some("bearer  xyz "))), Some("xyz"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            AppError::from(AuthRejection::MissingToken).to_string(),
            "Unauthorized: No token, authorization denied"
        );
        assert_eq!(
            AuthRejection::NotAdmin.into_response().status(),
            axum::http::StatusCode::FORBIDDEN
        );
    }
}
