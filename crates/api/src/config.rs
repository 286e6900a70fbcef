//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GALLERY_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `GALLERY_JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `GALLERY_HOST` - Bind address (default: 127.0.0.1)
//! - `GALLERY_PORT` - Listen port (default: 5000)
//! - `GALLERY_JWT_TTL_HOURS` - Token lifetime in hours (default: 720)
//! - `GALLERY_UPLOAD_DIR` - Directory for uploaded images (default: uploads)
//! - `GALLERY_CORS_ORIGIN` - Browser origin allowed to call the API
//! - `GALLERY_LOG_JSON` - Emit JSON log lines when set to `1` or `true`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Substrings that mark a secret copied from documentation (lowercase).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Why the configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API server configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` connection URL, which may embed a password
    pub database_url: SecretString,
    /// Bind address
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// HS256 signing secret for bearer tokens
    pub jwt_secret: SecretString,
    /// Token lifetime in hours
    pub jwt_ttl_hours: u32,
    /// Root directory for uploaded artwork images and avatars
    pub upload_dir: PathBuf,
    /// Browser origin allowed by CORS
    pub cors_origin: Option<String>,
    /// Emit JSON formatted logs
    pub log_json: bool,
    /// Sentry DSN; error reporting is off when unset
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_ttl_hours", &self.jwt_ttl_hours)
            .field("upload_dir", &self.upload_dir)
            .field("cors_origin", &self.cors_origin)
            .field("log_json", &self.log_json)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

impl ApiConfig {
    /// Read the configuration, loading a `.env` file first if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a missing or unparsable variable, or a
    /// signing secret that fails [`check_signing_secret`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: database_url("GALLERY_DATABASE_URL")?,
            host: parse_or("GALLERY_HOST", "127.0.0.1")?,
            port: parse_or("GALLERY_PORT", "5000")?,
            jwt_secret: signing_secret("GALLERY_JWT_SECRET")?,
            jwt_ttl_hours: parse_or("GALLERY_JWT_TTL_HOURS", "720")?,
            upload_dir: parse_or("GALLERY_UPLOAD_DIR", "uploads")?,
            cors_origin: env_var("GALLERY_CORS_ORIGIN"),
            log_json: env_var("GALLERY_LOG_JSON")
                .is_some_and(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes")),
            sentry_dsn: env_var("SENTRY_DSN"),
            sentry_environment: env_var("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Address the server binds to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// A non-empty environment variable.
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn require(key: &str) -> Result<String, ConfigError> {
    env_var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// The database URL, from `key` or the conventional `DATABASE_URL`.
fn database_url(key: &str) -> Result<SecretString, ConfigError> {
    env_var(key)
        .or_else(|| env_var("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Parse `key`, or `default` when it is unset.
fn parse_or<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .as_deref()
        .unwrap_or(default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Shannon entropy of `s` in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| f64::from(n) / total)
        .map(|p| -p * p.log2())
        .sum()
}

/// Reject signing secrets that are short, look like a placeholder, or are
/// too repetitive to be random.
fn check_signing_secret(key: &str, secret: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| Err(ConfigError::InsecureSecret(key.to_string(), reason));

    let length = secret.chars().count();
    if length < MIN_JWT_SECRET_LENGTH {
        return insecure(format!(
            "must be at least {MIN_JWT_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return insecure(format!("looks like a placeholder (contains '{pattern}')"));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return insecure(format!(
            "entropy {entropy:.2} bits/char is below {MIN_ENTROPY_BITS_PER_CHAR:.1}; generate it randomly"
        ));
    }
    Ok(())
}

fn signing_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = require(key)?;
    check_signing_secret(key, &value)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    /// A config suitable for tests that never touch the database.
    pub(crate) fn test_config() -> ApiConfig {
        ApiConfig {
            database_url: SecretString::from("postgres://localhost/gallery_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 5000,
            jwt_secret: SecretString::from("q8Zr!v2Lm#T9xw4Kp$Y7nB1cJ6hD0sF3"),
            jwt_ttl_hours: 1,
            upload_dir: PathBuf::from("uploads"),
            cors_origin: None,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_entropy() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!((shannon_entropy("abab") - 1.0).abs() < 1e-9);
        assert!((shannon_entropy("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_secret_checks() {
        let config = test_config();
        assert!(check_signing_secret("K", config.jwt_secret.expose_secret()).is_ok());

        for bad in [
            "aB3$xY9!",
            "changeme-Zr!v2Lm#T9xw4Kp$Y7nB1cJ6hD0sF3",
            "ab".repeat(20).as_str(),
        ] {
            assert!(matches!(
                check_signing_secret("K", bad),
                Err(ConfigError::InsecureSecret(key, _)) if key == "K"
            ));
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = test_config().socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:5000");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", test_config());
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("gallery_test"));
        assert!(!debug_output.contains("q8Zr"));
    }
}
