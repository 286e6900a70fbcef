//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gallery_core::{Email, Role, UserId};

use super::artwork::Artwork;

/// A gallery account, as returned to its owner. Never carries the password hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The authenticated caller, resolved from a bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Whether the caller may modify a resource owned by `owner`.
    ///
    /// Admins may modify anything; everyone else only what they own.
    #[must_use]
    pub fn may_modify(&self, owner: Option<UserId>) -> bool {
        self.is_admin() || owner == Some(self.id)
    }
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// A user together with their favorite artworks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub favorites: Vec<Artwork>,
}

/// Profile fields a user may change about themselves.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,
    pub phone_number: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn caller(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            name: "Ada".to_string(),
            email: Email::parse("ada@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_owner_may_modify() {
        let user = caller(Role::User);
        assert!(user.may_modify(Some(UserId::new(7))));
        assert!(!user.may_modify(Some(UserId::new(8))));
        assert!(!user.may_modify(None));
    }

    #[test]
    fn test_admin_may_modify_anything() {
        let admin = caller(Role::Admin);
        assert!(admin.may_modify(Some(UserId::new(8))));
        assert!(admin.may_modify(None));
    }
}
