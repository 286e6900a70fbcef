//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin account
//! gallery user create -e admin@example.com -n "Admin Name" -r admin
//!
//! # Promote an existing account
//! gallery user promote -e ada@example.com -r admin
//! ```
//!
//! The password is read from `--password` or `GALLERY_USER_PASSWORD`.

use gallery_api::db::{RepositoryError, UserRepository};
use gallery_api::services::{AuthError, AuthService};
use gallery_core::{Email, Role};
use thiserror::Error;

use super::migrate::{MigrationError, database_url};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Environment(#[from] MigrationError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: user, admin")]
    InvalidRole(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("No user with email: {0}")]
    UnknownUser(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

fn parse_role(role: &str) -> Result<Role, UserError> {
    role.trim()
        .to_lowercase()
        .parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))
}

/// Create a user with the given role.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error for an invalid role, a rejected account, or a database
/// failure.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<i32, UserError> {
    let role = parse_role(role)?;

    let pool = gallery_api::db::create_pool(&database_url()?).await?;

    tracing::info!("Creating user: {} ({})", email, role);
    let user = AuthService::new(&pool)
        .create_account(name, email, password, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(user.id.as_i32())
}

/// Change the role of an existing user.
///
/// # Errors
///
/// Returns an error for an invalid role or email, an unknown user, or a
/// database failure.
pub async fn set_role(email: &str, role: &str) -> Result<(), UserError> {
    let role = parse_role(role)?;
    let parsed = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let pool = gallery_api::db::create_pool(&database_url()?).await?;

    let user = UserRepository::new(&pool)
        .set_role(&parsed, role)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => UserError::UnknownUser(email.to_owned()),
            other => other.into(),
        })?;

    tracing::info!("{} is now {}", user.email, user.role);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("Admin").unwrap(), Role::Admin);
        assert_eq!(parse_role(" user ").unwrap(), Role::User);
        assert!(matches!(
            parse_role("super_admin"),
            Err(UserError::InvalidRole(_))
        ));
    }
}
