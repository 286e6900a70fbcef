//! Profile route handlers. Every route acts on the caller's own account.

use axum::extract::{Multipart, State};
use serde::Deserialize;

use gallery_core::{ArtworkId, Email, UserId};

use super::MultipartBody;
use crate::db::{ArtworkRepository, RepositoryError, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Profile, ProfileChanges, User};
use crate::response::{ApiJson, ApiPath, ApiResponse, Empty};
use crate::services::{AuthError, AuthService, UploadError, UploadKind};
use crate::state::AppState;

/// Multipart field carrying the avatar image.
const AVATAR_FIELD: &str = "avatar";

/// The caller's profile with favorites expanded.
///
/// GET /api/profile
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<Profile>> {
    Ok(ApiResponse::ok(load_profile(&state, user.id).await?))
}

/// Profile fields as sent by the client. Blank values are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
}

impl ProfileBody {
    fn into_changes(self) -> Result<ProfileChanges> {
        fn keep(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let email = keep(self.email)
            .map(|e| Email::parse(&e))
            .transpose()
            .map_err(AuthError::from)?;

        Ok(ProfileChanges {
            name: keep(self.name),
            email,
            bio: keep(self.bio),
            website: keep(self.website),
            location: keep(self.location),
            phone_number: keep(self.phone_number),
        })
    }
}

/// Update profile fields.
///
/// PUT /api/profile
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<ProfileBody>,
) -> Result<ApiResponse<User>> {
    let changes = body.into_changes()?;
    let users = UserRepository::new(state.pool());

    if let Some(email) = &changes.email
        && users.email_taken_by_other(email, user.id).await?
    {
        return Err(AppError::BadRequest("Email already in use".to_string()));
    }

    let updated = users.update_profile(user.id, &changes).await?;
    tracing::info!(user_id = %user.id, "profile updated");
    Ok(ApiResponse::ok(updated))
}

/// Body of a password change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordBody {
    pub current_password: String,
    pub new_password: String,
}

/// Change password.
///
/// PUT /api/profile/password
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<PasswordBody>,
) -> Result<ApiResponse<Empty>> {
    AuthService::new(state.pool())
        .change_password(user.id, &body.current_password, &body.new_password)
        .await?;
    Ok(ApiResponse::ok(Empty {}))
}

/// Replace the avatar image.
///
/// PUT /api/profile/avatar (multipart, field `avatar`)
pub async fn update_avatar(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    multipart: Multipart,
) -> Result<ApiResponse<User>> {
    let body = MultipartBody::read(multipart, AVATAR_FIELD).await?;
    let file = body.files.first().ok_or(UploadError::Missing)?;

    let uploads = state.uploads();
    let url = uploads.save(UploadKind::Avatar, file).await?;

    let users = UserRepository::new(state.pool());
    let previous = match users.set_avatar(user.id, &url).await {
        Ok(previous) => previous,
        Err(e) => {
            uploads.remove_all(std::slice::from_ref(&url)).await;
            return Err(e.into());
        }
    };
    if let Some(previous) = previous {
        uploads.remove_all(&[previous]).await;
    }

    let updated = users
        .get_by_id(user.id)
        .await?
        .ok_or(RepositoryError::NotFound)?;
    tracing::info!(user_id = %user.id, "avatar updated");
    Ok(ApiResponse::ok(updated))
}

/// Add or remove an artwork from favorites.
///
/// PUT /api/profile/favorites/{id}
pub async fn toggle_favorite(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(artwork): ApiPath<ArtworkId>,
) -> Result<ApiResponse<Profile>> {
    let added = UserRepository::new(state.pool())
        .toggle_favorite(user.id, artwork)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Artwork not found".to_string()),
            other => other.into(),
        })?;

    tracing::debug!(user_id = %user.id, artwork_id = %artwork, added, "favorite toggled");
    Ok(ApiResponse::ok(load_profile(&state, user.id).await?))
}

async fn load_profile(state: &AppState, id: UserId) -> Result<Profile> {
    let user = UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let favorites = ArtworkRepository::new(state.pool()).favorites_of(id).await?;
    Ok(Profile { user, favorites })
}
