//! Database operations for the gallery `PostgreSQL` schema.
//!
//! ## Tables
//!
//! - `user` - Accounts, roles and profile fields
//! - `artwork` - Catalog entries with stock and derived average rating
//! - `artwork_review` - One review per user per artwork
//! - `favorite` - User to artwork bookmarks
//! - `order` / `order_item` - Orders with price snapshots
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p gallery-cli -- migrate
//! ```
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow` row
//! types, so the workspace builds without a live database.

pub mod artworks;
pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use artworks::{ArtworkFilter, ArtworkRepository, ArtworkSort};
pub use orders::{OrderFilter, OrderRepository, OrderSort};
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("{0}")]
    Conflict(String),
}

/// Convert a stock or line quantity to the `INTEGER` stored in the database.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` for quantities above `i32::MAX`.
pub fn quantity_to_db(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("Quantity {quantity} is out of range")))
}

/// A `sort` query parameter naming a field or direction that isn't allowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid sort: {0}")]
pub struct InvalidSort(pub String);

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_string());
    }
    RepositoryError::Database(e)
}

/// Escape `LIKE` metacharacters so user input matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
