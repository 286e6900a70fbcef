//! Integration tests for reviews and rating aggregation.

use gallery_core::Role;
use gallery_integration_tests::{TestContext, unique};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_average_rating_and_duplicate_review() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let first = ctx.account(Role::User).await;
    let second = ctx.account(Role::User).await;
    let artwork = ctx.artwork(&admin, &format!("Rated {}", unique()), "300", 1).await;
    let path = format!("/api/artworks/{artwork}/reviews");

    let (status, body) = ctx
        .send(
            Method::POST,
            &path,
            Some(&first.token),
            Some(json!({ "rating": 5, "comment": "Stunning" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!((body["data"]["averageRating"].as_f64().unwrap() - 5.0).abs() < f64::EPSILON);

    let (status, body) = ctx
        .send(Method::POST, &path, Some(&second.token), Some(json!({ "rating": 2 })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!((body["data"]["averageRating"].as_f64().unwrap() - 3.5).abs() < f64::EPSILON);

    let (status, body) = ctx
        .send(Method::POST, &path, Some(&first.token), Some(json!({ "rating": 1 })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You have already reviewed this artwork");

    let (status, body) = ctx.get(&path, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "Requires running gallery-api server and database"]
async fn test_rating_out_of_range() {
    let ctx = TestContext::new().await;
    let admin = ctx.account(Role::Admin).await;
    let user = ctx.account(Role::User).await;
    let artwork = ctx.artwork(&admin, &format!("Range {}", unique()), "1", 1).await;

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/artworks/{artwork}/reviews"),
            Some(&user.token),
            Some(json!({ "rating": 6 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
