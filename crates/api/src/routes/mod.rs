//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness
//! GET  /health/ready                    - Readiness (database)
//! GET  /uploads/*                       - Stored images
//!
//! # Artworks
//! GET    /api/artworks                  - List (filter, sort, paginate)
//! GET    /api/artworks/featured         - Featured artworks
//! GET    /api/artworks/{id}             - One artwork with reviews
//! POST   /api/artworks                  - Create (admin, multipart)
//! PUT    /api/artworks/{id}             - Update (admin + owner, multipart)
//! DELETE /api/artworks/{id}             - Delete (admin + owner)
//! GET    /api/artworks/{id}/reviews     - Reviews
//! POST   /api/artworks/{id}/reviews     - Add review (auth)
//!
//! # Orders
//! POST /api/orders                      - Place order (auth)
//! GET  /api/orders/myorders             - Caller's orders (auth)
//! PUT  /api/orders/{id}/cancel          - Cancel own pending order (auth)
//! GET  /api/orders                      - All orders (admin)
//! GET  /api/orders/{id}                 - One order (admin)
//! PUT  /api/orders/{id}/status          - Change status (admin)
//!
//! # Profile (auth)
//! GET  /api/profile                     - Profile with favorites
//! PUT  /api/profile                     - Update fields
//! PUT  /api/profile/password            - Change password
//! PUT  /api/profile/avatar              - Upload avatar (multipart)
//! PUT  /api/profile/favorites/{id}      - Toggle favorite
//!
//! # Auth (rate limited)
//! POST /api/auth/register
//! POST /api/auth/login
//! POST /api/auth/admin/login
//! GET  /api/auth/me                     - (auth)
//! PUT  /api/auth/updatepassword         - (auth)
//! GET  /api/auth/logout
//! ```

pub mod artworks;
pub mod auth;
pub mod orders;
pub mod profile;

use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{
        HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{get, post, put},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use gallery_core::PageRequest;

use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use crate::middleware::{auth_rate_limiter, request_id_middleware};
use crate::services::UploadedFile;
use crate::services::uploads::{MAX_ARTWORK_IMAGES, MAX_FILE_BYTES, PUBLIC_PREFIX};
use crate::state::AppState;

/// Largest accepted request body: a full set of artwork images plus form fields.
pub const MAX_BODY_BYTES: usize = MAX_ARTWORK_IMAGES * MAX_FILE_BYTES + 1024 * 1024;

/// Create the artwork routes router.
pub fn artwork_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(artworks::index).post(artworks::create))
        .route("/featured", get(artworks::featured))
        .route(
            "/{id}",
            get(artworks::show)
                .put(artworks::update)
                .delete(artworks::destroy),
        )
        .route(
            "/{id}/reviews",
            get(artworks::reviews).post(artworks::add_review),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/myorders", get(orders::mine))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", put(orders::cancel))
        .route("/{id}/status", put(orders::update_status))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).put(profile::update))
        .route("/password", put(profile::update_password))
        .route("/avatar", put(profile::update_avatar))
        .route("/favorites/{id}", put(profile::toggle_favorite))
}

/// Create the auth routes router, rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/admin/login", post(auth::admin_login))
        .route("/me", get(auth::me))
        .route("/updatepassword", put(auth::update_password))
        .route("/logout", get(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create all `/api` routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/artworks", artwork_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/profile", profile_routes())
        .nest("/api/auth", auth_routes())
}

/// Build the complete application: routes, static uploads and the
/// middleware stack.
pub fn app(state: AppState) -> Router {
    let uploads = ServeDir::new(state.uploads().root());
    let cors = cors_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(cors)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the configured frontend origin, or any origin when unset.
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    match config
        .cors_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok())
    {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_origin(Any),
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Text fields and files from a multipart body.
#[derive(Debug, Default)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

impl MultipartBody {
    /// Drain a multipart body. Parts named `file_field` are files; other
    /// parts are read as text.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a malformed body.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self> {
        let mut body = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let base_name = name.strip_suffix("[]").unwrap_or(&name);

            if base_name == file_field {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if bytes.is_empty() && file_name.is_empty() {
                    continue;
                }
                body.files.push(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            } else {
                let value = field.text().await?;
                body.fields.push((name, value));
            }
        }

        Ok(body)
    }
}

/// Parse `page` and `limit` query values.
///
/// Values below 1 are raised to 1 and `limit` is capped by
/// [`PageRequest::MAX_LIMIT`]; non-numeric values are rejected.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if either value is not an integer.
pub fn page_request(page: Option<&str>, limit: Option<&str>) -> Result<PageRequest> {
    fn parse(name: &str, value: Option<&str>) -> Result<Option<u32>> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };
        let n = value
            .parse::<i64>()
            .map_err(|_| AppError::BadRequest(format!("Invalid {name}: {value}")))?;
        Ok(Some(u32::try_from(n.max(1)).unwrap_or(u32::MAX)))
    }

    Ok(PageRequest::new(
        parse("page", page)?,
        parse("limit", limit)?,
    ))
}

/// Treat blank query values as absent.
pub(crate) fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_clamps() {
        let page = page_request(None, None).unwrap();
        assert_eq!((page.page(), page.limit()), (1, PageRequest::DEFAULT_LIMIT));

        let page = page_request(Some("0"), Some("-5")).unwrap();
        assert_eq!((page.page(), page.limit()), (1, 1));

        let page = page_request(Some("3"), Some("1000")).unwrap();
        assert_eq!((page.page(), page.limit()), (3, PageRequest::MAX_LIMIT));
        assert_eq!(page.offset(), 200);
    }

    #[test]
    fn test_page_request_rejects_text() {
        assert!(matches!(
            page_request(Some("two"), None),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_non_blank() {
        let blank = "  ".to_string();
        let word = " oil ".to_string();
        assert_eq!(non_blank(Some(&blank)), None);
        assert_eq!(non_blank(Some(&word)), Some("oil"));
        assert_eq!(non_blank(None), None);
    }

    mod router {
        use axum::body::{Body, to_bytes};
        use axum::http::Request;
        use gallery_core::{Role, UserId};
        use sqlx::postgres::PgPoolOptions;
        use tower::ServiceExt;

        use super::*;
        use crate::config::tests::test_config;

        fn test_state() -> AppState {
            let pool = PgPoolOptions::new()
                .acquire_timeout(std::time::Duration::from_millis(250))
                .connect_lazy("postgres://gallery@localhost:1/unreachable")
                .unwrap();
            AppState::new(test_config(), pool)
        }

        fn test_app() -> Router {
            app(test_state())
        }

        async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
            let response = app.oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap_or_default())
        }

        #[tokio::test]
        async fn test_health() {
            let app = test_app();
            let response = app
                .oneshot(Request::get("/health").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert!(response.headers().contains_key("x-request-id"));
        }

        #[tokio::test]
        async fn test_protected_route_without_token() {
            let app = test_app();
            let (status, body) = send(
                app,
                Request::get("/api/orders/myorders").body(Body::empty()).unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "No token, authorization denied");
        }

        #[tokio::test]
        async fn test_admin_route_with_forged_token() {
            let app = test_app();
            let (status, body) = send(
                app,
                Request::delete("/api/artworks/1")
                    .header(AUTHORIZATION, "Bearer not.a.jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["message"], "Token is not valid");
        }

        #[tokio::test]
        async fn test_token_signed_with_other_secret() {
            let app = test_app();
            let other = crate::services::TokenIssuer::new(
                &secrecy::SecretString::from("Z0@mQ5^wE2&rY8*uI4(oP6)aS1_dG7+f"),
                1,
            );
            let token = other.issue(UserId::new(1), Role::Admin).unwrap();
            let (status, _) = send(
                app,
                Request::get("/api/orders")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }

        #[tokio::test]
        async fn test_database_outage_is_server_error() {
            let state = test_state();
            let token = state.tokens().issue(UserId::new(1), Role::User).unwrap();
            let (status, body) = send(
                app(state),
                Request::get("/api/orders/myorders")
                    .header(AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body["success"], false);
            assert_eq!(body["message"], "Server Error");
        }

        #[tokio::test]
        async fn test_unknown_route_is_404() {
            let app = test_app();
            let response = app
                .oneshot(Request::get("/api/nothing").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_auth_checked_before_body() {
            let app = test_app();
            let (status, body) = send(
                app,
                Request::post("/api/artworks/1/reviews")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["success"], false);
        }
    }
}
