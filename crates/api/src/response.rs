//! JSON request extractors and the `{ success, data }` response envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use gallery_core::Pagination;

use crate::error::AppError;

/// `Json<T>` whose rejections render as `AppError` bodies.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path<T>` whose rejections render as `AppError` bodies.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `Query<T>` whose rejections render as `AppError` bodies.
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Successful response: `{ "success": true, "data": ... }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }

    /// The same body with status 201.
    #[must_use]
    pub const fn created(data: T) -> Created<T> {
        Created(Self::ok(data))
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// An [`ApiResponse`] sent with status 201.
#[derive(Debug)]
pub struct Created<T>(pub ApiResponse<T>);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}

/// A page of results with its pagination metadata.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T: Serialize> Paginated<T> {
    #[must_use]
    pub const fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination,
        }
    }
}

impl<T: Serialize> IntoResponse for Paginated<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Empty object for responses that carry no data (`"data": {}`).
#[derive(Debug, Default, Serialize)]
pub struct Empty {}
