//! HTTP client for the gallery REST API.
//!
//! Every endpoint answers with a `{ success, data }` or `{ success, message }`
//! envelope; this client unwraps the data or turns the message into a
//! [`ClientError::Api`].

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use gallery_api::models::NewOrder;
use gallery_core::{ArtworkId, Category, OrderId, OrderStatus, Pagination, Price, Role, UserId};

/// Default API address.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Errors returned by [`ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    #[error("not logged in; run `gallery login` first")]
    NotLoggedIn,
}

/// The signed-in account as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// An image reference on a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
}

/// The fields of an artwork the client shows and caches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ArtworkId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<ImageRef>,
    pub category: Category,
    pub quantity: u32,
    pub in_stock: bool,
    #[serde(default)]
    pub average_rating: f64,
}

impl CatalogItem {
    /// URL of the first image, used as the cart thumbnail.
    #[must_use]
    pub fn thumbnail(&self) -> Option<String> {
        self.images.first().map(|i| i.url.clone())
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub items: Vec<CatalogItem>,
    pub pagination: Pagination,
}

/// A catalog query. Empty fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub price_min: Option<String>,
    pub price_max: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl CatalogQuery {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("category", self.category.clone()),
            ("price_min", self.price_min.clone()),
            ("price_max", self.price_max.clone()),
            ("search", self.search.clone()),
            ("sort", self.sort.clone()),
            ("page", self.page.map(|p| p.to_string())),
            ("limit", self.limit.map(|l| l.to_string())),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.filter(|v| !v.is_empty()).map(|v| (key, v)))
        .collect()
    }
}

/// One line of a placed order.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineSummary {
    pub title: String,
    pub quantity: u32,
    pub price: Price,
}

/// A placed order as listed to its customer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: OrderId,
    pub items: Vec<OrderLineSummary>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct PageEnvelope<T> {
    data: Vec<T>,
    pagination: Pagination,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
}

/// Token and user returned by a successful login.
#[derive(Debug, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

/// Gallery API client.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::InvalidUrl` if `base_url` does not parse.
    pub fn new(base_url: &str, token: Option<SecretString>) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            client: Client::new(),
            base_url,
            token,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(format!("{path}: {e}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    fn authed(&self, method: Method, url: Url) -> Result<RequestBuilder, ClientError> {
        if self.token.is_none() {
            return Err(ClientError::NotLoggedIn);
        }
        Ok(self.request(method, url))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let message = response
            .json::<ErrorEnvelope>()
            .await
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string());
        debug!(status = status.as_u16(), %message, "API error");
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Sign in and return the token and user.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` for rejected credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        #[derive(Serialize)]
        struct Credentials<'a> {
            email: &'a str,
            password: &'a str,
        }

        let url = self.url("/api/auth/login")?;
        Self::send(
            self.request(Method::POST, url)
                .json(&Credentials { email, password }),
        )
        .await
    }

    /// Fetch one page of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` for an invalid query.
    #[instrument(skip(self))]
    pub async fn catalog(&self, query: &CatalogQuery) -> Result<CatalogPage, ClientError> {
        let mut url = self.url("/api/artworks")?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }

        let page: PageEnvelope<CatalogItem> =
            Self::send(self.request(Method::GET, url)).await?;
        Ok(CatalogPage {
            items: page.data,
            pagination: page.pagination,
        })
    }

    /// Fetch one artwork.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 for an unknown artwork.
    pub async fn artwork(&self, id: ArtworkId) -> Result<CatalogItem, ClientError> {
        let url = self.url(&format!("/api/artworks/{id}"))?;
        let envelope: Envelope<CatalogItem> = Self::send(self.request(Method::GET, url)).await?;
        Ok(envelope.data)
    }

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a token, or
    /// `ClientError::Api` if the server rejects the order.
    #[instrument(skip(self, order), fields(lines = order.items.len()))]
    pub async fn place_order(&self, order: &NewOrder) -> Result<OrderSummary, ClientError> {
        let url = self.url("/api/orders")?;
        let envelope: Envelope<OrderSummary> =
            Self::send(self.authed(Method::POST, url)?.json(order)).await?;
        Ok(envelope.data)
    }

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotLoggedIn` without a token.
    pub async fn my_orders(&self) -> Result<Vec<OrderSummary>, ClientError> {
        let url = self.url("/api/orders/myorders")?;
        let envelope: Envelope<Vec<OrderSummary>> =
            Self::send(self.authed(Method::GET, url)?).await?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_query_skips_empty_fields() {
        let query = CatalogQuery {
            category: Some("painting".to_string()),
            search: Some(String::new()),
            page: Some(2),
            ..CatalogQuery::default()
        };
        assert_eq!(
            query.pairs(),
            vec![("category", "painting".to_string()), ("page", "2".to_string())]
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            ApiClient::new("not a url", None),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_url_join() {
        let client = ApiClient::new("http://localhost:5000", None).unwrap();
        assert_eq!(
            client.url("/api/orders/myorders").unwrap().as_str(),
            "http://localhost:5000/api/orders/myorders"
        );
    }

    #[test]
    fn test_catalog_item_from_server_json() {
        let json = r#"{
            "id": 4, "artist": 1, "title": "Harbour", "description": "Boats",
            "price": 450.0, "images": [{"url": "/uploads/artworks/a.jpg", "alt": "Harbour"}],
            "category": "painting", "dimensions": {"unit": "cm"}, "quantity": 2,
            "inStock": true, "featured": false, "averageRating": 4.5, "tags": []
        }"#;
        let item: CatalogItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, ArtworkId::new(4));
        assert_eq!(item.price, Price::from_cents(45_000));
        assert_eq!(item.thumbnail().as_deref(), Some("/uploads/artworks/a.jpg"));
    }

    #[tokio::test]
    async fn test_authed_requests_need_token() {
        let client = ApiClient::new(DEFAULT_API_URL, None).unwrap();
        assert!(matches!(
            client.my_orders().await,
            Err(ClientError::NotLoggedIn)
        ));
    }
}
