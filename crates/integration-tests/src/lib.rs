//! Integration tests for the gallery API.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the database, migrate, and run the server
//! gallery migrate
//! cargo run -p gallery-api
//!
//! # Run integration tests
//! cargo test -p gallery-integration-tests -- --ignored
//! ```
//!
//! The tests talk to the server over HTTP at `GALLERY_BASE_URL`
//! (default `http://localhost:5000`) and use `GALLERY_DATABASE_URL` directly
//! to create fixtures that have no API route of their own (admin accounts,
//! artworks without image uploads). Tokens are signed locally with
//! `GALLERY_JWT_SECRET`, which must match the server's, so fixtures do not
//! use up the login rate limit.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, StatusCode};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use gallery_api::db::{ArtworkRepository, create_pool};
use gallery_api::models::{ArtworkImage, NewArtwork};
use gallery_api::services::{AuthService, TokenIssuer};
use gallery_core::{ArtworkId, Category, Dimensions, Price, Role, UserId};

/// Password used for every test account.
pub const PASSWORD: &str = "correct-horse-42";

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("GALLERY_BASE_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// A short random marker for names that must not collide between runs.
#[must_use]
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

/// A signed-in test account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub token: String,
}

/// Shared handles for one test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub pool: PgPool,
    pub tokens: TokenIssuer,
}

impl TestContext {
    pub async fn new() -> Self {
        dotenvy::dotenv().ok();
        let database_url = std::env::var("GALLERY_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .map(SecretString::from)
            .expect("GALLERY_DATABASE_URL must be set for integration tests");
        let jwt_secret = std::env::var("GALLERY_JWT_SECRET")
            .map(SecretString::from)
            .expect("GALLERY_JWT_SECRET must match the server's");

        Self {
            client: Client::new(),
            base_url: base_url(),
            pool: create_pool(&database_url).await.unwrap(),
            tokens: TokenIssuer::new(&jwt_secret, 1),
        }
    }

    /// Create an account directly and sign a token for it.
    pub async fn account(&self, role: Role) -> Account {
        let email = format!("it-{}@example.com", unique());
        let user = AuthService::new(&self.pool)
            .create_account("Integration Tester", &email, PASSWORD, role)
            .await
            .unwrap();

        Account {
            id: user.id,
            email,
            token: self.tokens.issue(user.id, user.role).unwrap(),
        }
    }

    /// Insert an artwork without going through the multipart route.
    pub async fn artwork(
        &self,
        artist: &Account,
        title: &str,
        price: &str,
        quantity: u32,
    ) -> ArtworkId {
        self.artwork_with_images(artist, title, price, quantity, &[])
            .await
    }

    /// Insert an artwork whose images point at the given URLs.
    pub async fn artwork_with_images(
        &self,
        artist: &Account,
        title: &str,
        price: &str,
        quantity: u32,
        image_urls: &[&str],
    ) -> ArtworkId {
        let new = NewArtwork {
            artist: artist.id,
            title: title.to_string(),
            description: format!("{title} for integration tests"),
            price: Price::parse(price).unwrap(),
            images: image_urls
                .iter()
                .map(|url| ArtworkImage {
                    url: (*url).to_string(),
                    alt: Some(title.to_string()),
                })
                .collect(),
            category: Category::Painting,
            dimensions: Dimensions::default(),
            medium: None,
            year: None,
            quantity,
            in_stock: quantity > 0,
            featured: false,
            tags: Vec::new(),
        };
        ArtworkRepository::new(&self.pool)
            .create(&new)
            .await
            .unwrap()
            .id
    }

    /// Send a request and decode the JSON body (`Value::Null` if none).
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await.unwrap();
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    /// Send a multipart form with a bearer token.
    pub async fn send_form(
        &self,
        method: Method,
        path: &str,
        token: &str,
        form: Form,
    ) -> (StatusCode, Value) {
        let response = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap();
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, path, token, None).await
    }

    /// Current stock of an artwork as `(quantity, inStock)`.
    pub async fn stock(&self, id: ArtworkId) -> (u64, bool) {
        let (status, body) = self.get(&format!("/api/artworks/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        (
            body["data"]["quantity"].as_u64().unwrap(),
            body["data"]["inStock"].as_bool().unwrap(),
        )
    }
}

/// A money amount from a response body, whether sent as number or string.
#[must_use]
pub fn amount(value: &Value) -> f64 {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .unwrap()
}

/// A file part with the given name and content type.
#[must_use]
pub fn file_part(file_name: &str, content_type: &str, bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str(content_type)
        .unwrap()
}

/// The 8-byte PNG signature; enough for the server, which checks type only.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A checkout body for the given `(artwork, quantity)` lines.
#[must_use]
pub fn order_body(lines: &[(ArtworkId, u32)]) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(artwork, quantity)| serde_json::json!({ "artwork": artwork, "quantity": quantity }))
        .collect();
    serde_json::json!({
        "items": items,
        "shippingAddress": {
            "street": "1 Quay St",
            "city": "Hull",
            "state": "East Riding",
            "zipCode": "HU1 1AA",
            "country": "UK"
        },
        "paymentInfo": { "method": "credit_card" }
    })
}
