//! Integration tests for authentication and authorization.

use gallery_core::Role;
use gallery_integration_tests::{PASSWORD, TestContext, unique};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_register_then_me() {
    let ctx = TestContext::new().await;
    let email = format!("reg-{}@example.com", unique());

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "New Collector", "email": email, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());

    let token = body["token"].as_str().unwrap().to_string();
    let (status, body) = ctx.get("/api/auth/me", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], email);
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_non_admin_cannot_manage_artworks() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let user = ctx.account(Role::User).await;
    let artwork = ctx.artwork(&admin, &format!("Guarded {}", unique()), "75", 1).await;

    let (status, body) = ctx
        .send(Method::DELETE, &format!("/api/artworks/{artwork}"), Some(&user.token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Not authorized as admin");

    let (status, _) = ctx
        .send(Method::DELETE, &format!("/api/artworks/{artwork}"), None, None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get(&format!("/api/artworks/{artwork}"), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_admin_only_order_routes() {
    let ctx = TestContext::new().await;
    let user = ctx.account(Role::User).await;
    let admin = ctx.account(Role::Admin).await;

    let (status, _) = ctx.get("/api/orders", Some(&user.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx.get("/api/orders?limit=1", Some(&admin.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["perPage"], 1);
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_admin_can_delete_artwork() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let artwork = ctx.artwork(&admin, &format!("Gone {}", unique()), "5", 1).await;

    let (status, body) = ctx
        .send(Method::DELETE, &format!("/api/artworks/{artwork}"), Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = ctx.get(&format!("/api/artworks/{artwork}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
