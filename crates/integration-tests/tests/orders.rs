//! Integration tests for checkout, cancellation and stock.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`gallery migrate`)
//! - The API server running (`cargo run -p gallery-api`)
//! - `GALLERY_DATABASE_URL` and `GALLERY_JWT_SECRET` matching the server

use gallery_core::Role;
use gallery_integration_tests::{TestContext, amount, order_body, unique};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_order_decrements_stock_and_cancel_restores_it() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let buyer = ctx.account(Role::User).await;
    let artwork = ctx.artwork(&admin, &format!("Stock {}", unique()), "120.00", 2).await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/orders",
            Some(&buyer.token),
            Some(order_body(&[(artwork, 2)])),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "pending");
    assert!((amount(&body["data"]["totalAmount"]) - 240.0).abs() < f64::EPSILON);
    assert_eq!(ctx.stock(artwork).await, (0, false));

    let order_id = body["data"]["id"].as_i64().unwrap();
    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/orders/{order_id}/cancel"),
            Some(&buyer.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(ctx.stock(artwork).await, (2, true));
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_insufficient_stock_is_rejected() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let buyer = ctx.account(Role::User).await;
    let title = format!("Scarce {}", unique());
    let artwork = ctx.artwork(&admin, &title, "50", 1).await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/orders",
            Some(&buyer.token),
            Some(order_body(&[(artwork, 2)])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], format!("Insufficient stock for artwork {title}"));
    assert_eq!(ctx.stock(artwork).await, (1, true));
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_only_pending_orders_can_be_cancelled() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let buyer = ctx.account(Role::User).await;
    let artwork = ctx.artwork(&admin, &format!("Ship {}", unique()), "80", 3).await;

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/orders",
            Some(&buyer.token),
            Some(order_body(&[(artwork, 1)])),
        )
        .await;
    let order_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/api/orders/{order_id}/status"),
            Some(&admin.token),
            Some(json!({ "status": "processing" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/orders/{order_id}/cancel"),
            Some(&buyer.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Order cannot be cancelled in current status");
    assert_eq!(ctx.stock(artwork).await, (2, true));
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_other_users_cannot_cancel() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let buyer = ctx.account(Role::User).await;
    let stranger = ctx.account(Role::User).await;
    let artwork = ctx.artwork(&admin, &format!("Mine {}", unique()), "10", 1).await;

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/orders",
            Some(&buyer.token),
            Some(order_body(&[(artwork, 1)])),
        )
        .await;
    let order_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/api/orders/{order_id}/cancel"),
            Some(&stranger.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx.get("/api/orders/myorders", Some(&buyer.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"].as_i64(), Some(order_id));
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_failed_line_rolls_back_the_whole_order() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let buyer = ctx.account(Role::User).await;
    let plenty = ctx.artwork(&admin, &format!("Plenty {}", unique()), "30", 3).await;
    let short_title = format!("Short {}", unique());
    let short = ctx.artwork(&admin, &short_title, "40", 1).await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/orders",
            Some(&buyer.token),
            Some(order_body(&[(plenty, 2), (short, 2)])),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        format!("Insufficient stock for artwork {short_title}")
    );
    assert_eq!(ctx.stock(plenty).await, (3, true));
    assert_eq!(ctx.stock(short).await, (1, true));

    let (_, body) = ctx.get("/api/orders/myorders", Some(&buyer.token)).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_concurrent_checkouts_cannot_oversell() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let first = ctx.account(Role::User).await;
    let second = ctx.account(Role::User).await;
    let artwork = ctx.artwork(&admin, &format!("Last one {}", unique()), "500", 1).await;

    let body = order_body(&[(artwork, 1)]);
    let ((a, _), (b, _)) = tokio::join!(
        ctx.send(Method::POST, "/api/orders", Some(&first.token), Some(body.clone())),
        ctx.send(Method::POST, "/api/orders", Some(&second.token), Some(body)),
    );

    let mut statuses = [a, b];
    statuses.sort_by_key(StatusCode::as_u16);
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(ctx.stock(artwork).await, (0, false));
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_admin_cancel_restores_stock() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let buyer = ctx.account(Role::User).await;
    let artwork = ctx.artwork(&admin, &format!("Return {}", unique()), "75", 2).await;

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/orders",
            Some(&buyer.token),
            Some(order_body(&[(artwork, 2)])),
        )
        .await;
    let order_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(ctx.stock(artwork).await, (0, false));

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/orders/{order_id}/status"),
            Some(&admin.token),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(ctx.stock(artwork).await, (2, true));
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_order_detail_includes_item_image() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let buyer = ctx.account(Role::User).await;
    let title = format!("Pictured {}", unique());
    let url = "/uploads/artworks/pictured.png";
    let artwork = ctx
        .artwork_with_images(&admin, &title, "60", 1, &[url])
        .await;

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/orders",
            Some(&buyer.token),
            Some(order_body(&[(artwork, 1)])),
        )
        .await;
    let order_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = ctx
        .get(&format!("/api/orders/{order_id}"), Some(&admin.token))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let item = &body["data"]["items"][0];
    assert_eq!(item["title"], title.as_str());
    assert_eq!(item["image"], url);
}
