//! Order route handlers.

use axum::extract::State;
use serde::Deserialize;

use gallery_core::{OrderId, OrderStatus};

use super::{non_blank, page_request};
use crate::db::{OrderFilter, OrderRepository, OrderSort};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{NewOrder, Order};
use crate::response::{ApiJson, ApiPath, ApiQuery, ApiResponse, Created, Paginated};
use crate::services::OrderService;
use crate::state::AppState;

/// Place an order from the caller's cart.
///
/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(order): ApiJson<NewOrder>,
) -> Result<Created<Order>> {
    add_breadcrumb(
        "checkout",
        "Placing order",
        &[("lines", order.items.len().to_string())],
    );

    let order = OrderService::new(state.pool()).place(user.id, order).await?;
    Ok(ApiResponse::created(order))
}

/// The caller's orders, newest first.
///
/// GET /api/orders/myorders
pub async fn mine(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<ApiResponse<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(ApiResponse::ok(orders))
}

/// Cancel one of the caller's pending orders.
///
/// PUT /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<ApiResponse<Order>> {
    let order = OrderService::new(state.pool()).cancel(user.id, id).await?;
    Ok(ApiResponse::ok(order))
}

/// Query parameters for the admin order list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// All orders, with customer name and email.
///
/// GET /api/orders?status=&sort=&page=&limit=
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Paginated<Order>> {
    let filter = OrderFilter {
        status: non_blank(query.status.as_ref())
            .map(str::parse::<OrderStatus>)
            .transpose()?,
    };
    let sort = non_blank(query.sort.as_ref())
        .map(str::parse::<OrderSort>)
        .transpose()?
        .unwrap_or_default();
    let page = page_request(query.page.as_deref(), query.limit.as_deref())?;

    let (orders, total) = OrderRepository::new(state.pool())
        .list(filter, sort, page)
        .await?;

    Ok(Paginated::new(orders, page.paginate(total)))
}

/// One order.
///
/// GET /api/orders/{id}
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<ApiResponse<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    Ok(ApiResponse::ok(order))
}

/// Body of a status change.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

/// Move an order along its lifecycle.
///
/// PUT /api/orders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<ApiResponse<Order>> {
    let next: OrderStatus = body.status.trim().parse()?;
    let order = OrderService::new(state.pool())
        .update_status(id, next)
        .await?;

    tracing::info!(order_id = %id, admin_id = %admin.id, status = %next, "admin changed order status");
    Ok(ApiResponse::ok(order))
}
