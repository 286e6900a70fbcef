//! Authentication route handlers.
//!
//! Tokens are stateless; logout only tells the client to discard its token.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use crate::db::{RepositoryError, UserRepository};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::User;
use crate::response::{ApiJson, ApiResponse, Empty};
use crate::services::AuthService;
use crate::state::AppState;

/// Body of a successful login or registration.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
    pub user: User,
}

impl TokenResponse {
    fn issue(state: &AppState, user: User) -> Result<Self> {
        let token = state.tokens().issue(user.id, user.role)?;
        Ok(Self {
            success: true,
            token,
            user,
        })
    }
}

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Create an account and sign it in.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterBody>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.pool())
        .register(&body.name, &body.email, &body.password)
        .await?;
    let response = TokenResponse::issue(&state, user)?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Sign in.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<TokenResponse>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse::issue(&state, user)?))
}

/// Sign in to the admin surface. Non-admin credentials are refused.
///
/// POST /api/auth/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<TokenResponse>> {
    let user = AuthService::new(state.pool())
        .admin_login(&body.email, &body.password)
        .await?;
    tracing::info!(user_id = %user.id, "admin logged in");
    Ok(Json(TokenResponse::issue(&state, user)?))
}

/// The current user.
///
/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<ApiResponse<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(ApiResponse::ok(user))
}

/// Password change request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordBody {
    pub current_password: String,
    pub new_password: String,
}

/// Change password and receive a fresh token.
///
/// PUT /api/auth/updatepassword
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(body): ApiJson<UpdatePasswordBody>,
) -> Result<Json<TokenResponse>> {
    let auth = AuthService::new(state.pool());
    auth.change_password(current.id, &body.current_password, &body.new_password)
        .await?;

    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    Ok(Json(TokenResponse::issue(&state, user)?))
}

/// Log out. The client discards its token.
///
/// GET /api/auth/logout
pub async fn logout() -> ApiResponse<Empty> {
    ApiResponse::ok(Empty {})
}
