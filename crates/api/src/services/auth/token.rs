//! Bearer token issuance and verification (HS256 JWT).

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use gallery_core::{Role, UserId};

use super::AuthError;

/// Claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user ID.
    pub sub: String,
    /// Role at the time the token was issued.
    pub role: Role,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// The user this token was issued to.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the subject is not a user ID.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Signs and verifies bearer tokens with a shared secret.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer from the configured secret and lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, ttl_hours: u32) -> Self {
        let secret = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::hours(i64::from(ttl_hours)),
        }
    }

    /// Issue a token for a user, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, user: UserId, role: Role) -> Result<String, AuthError> {
        self.issue_at(user, role, Utc::now())
    }

    /// Issue a token as if it were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue_at(
        &self,
        user: UserId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Verify a token's signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&SecretString::from(secret), 1)
    }

    #[test]
    fn test_issue_then_verify() {
        let issuer = issuer("h7#Lq2!xV9mZ$4pW8rT1nB6cK0sJ3dF5");
        let token = issuer.issue(UserId::new(42), Role::Admin).unwrap();

        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(42));
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let issuer = issuer("h7#Lq2!xV9mZ$4pW8rT1nB6cK0sJ3dF5");
        let issued = Utc::now() - Duration::hours(3);
        let token = issuer.issue_at(UserId::new(1), Role::User, issued).unwrap();
        assert!(matches!(issuer.verify(&token), Err(AuthError::Token(_))));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = issuer("h7#Lq2!xV9mZ$4pW8rT1nB6cK0sJ3dF5")
            .issue(UserId::new(1), Role::User)
            .unwrap();
        let other = issuer("Z0@mQ5^wE2&rY8*uI4(oP6)aS1_dG7+f");
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let issuer = issuer("h7#Lq2!xV9mZ$4pW8rT1nB6cK0sJ3dF5");
        assert!(issuer.verify("not.a.token").is_err());
        assert!(issuer.verify("").is_err());
    }
}
