//! Order repository.
//!
//! Read queries run against the pool. Writes that touch stock run inside a
//! transaction owned by `OrderService`, so they take a `PgConnection`.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use gallery_core::{
    ArtworkId, Email, OrderId, OrderItemId, OrderStatus, PageRequest, PaymentMethod,
    PaymentStatus, Price, UserId,
};

use super::{InvalidSort, RepositoryError, quantity_to_db};
use crate::models::{CustomerSummary, Order, OrderItem, PaymentInfo, ShippingAddress};

const ORDER_COLUMNS: &str = "o.id, o.user_id, o.street, o.city, o.state, o.zip_code, o.country, \
                             o.payment_method, o.payment_status, o.transaction_id, \
                             o.total_amount, o.status, o.tracking_number, o.notes, \
                             o.created_at, o.updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    street: String,
    city: String,
    state: String,
    zip_code: String,
    country: String,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    transaction_id: Option<String>,
    total_amount: Price,
    status: OrderStatus,
    tracking_number: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    customer_name: Option<String>,
    customer_email: Option<Email>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        let customer = match (self.customer_name, self.customer_email) {
            (Some(name), Some(email)) => Some(CustomerSummary { name, email }),
            _ => None,
        };
        Order {
            id: self.id,
            user: self.user_id,
            customer,
            items,
            shipping_address: ShippingAddress {
                street: self.street,
                city: self.city,
                state: self.state,
                zip_code: self.zip_code,
                country: self.country,
            },
            payment_info: PaymentInfo {
                method: self.payment_method,
                status: self.payment_status,
                transaction_id: self.transaction_id,
            },
            total_amount: self.total_amount,
            status: self.status,
            tracking_number: self.tracking_number,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    artwork_id: Option<ArtworkId>,
    title: String,
    quantity: i32,
    price: Price,
    image: Option<String>,
}

/// A priced line ready to be written with a new order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub artwork: ArtworkId,
    pub title: String,
    pub quantity: u32,
    pub price: Price,
}

// =============================================================================
// Query parameters
// =============================================================================

/// Admin order list filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
}

/// Fields the admin order list can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSortField {
    CreatedAt,
    TotalAmount,
    Status,
}

/// Admin order list ordering: `-field` or `field:desc` for descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSort {
    pub field: OrderSortField,
    pub descending: bool,
}

impl Default for OrderSort {
    fn default() -> Self {
        Self {
            field: OrderSortField::CreatedAt,
            descending: true,
        }
    }
}

impl FromStr for OrderSort {
    type Err = InvalidSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (field, descending) = if let Some(field) = trimmed.strip_prefix('-') {
            (field, true)
        } else if let Some((field, direction)) = trimmed.split_once(':') {
            match direction.to_ascii_lowercase().as_str() {
                "asc" => (field, false),
                "desc" => (field, true),
                _ => return Err(InvalidSort(s.to_string())),
            }
        } else {
            (trimmed, false)
        };

        let field = match field {
            "createdAt" => OrderSortField::CreatedAt,
            "totalAmount" => OrderSortField::TotalAmount,
            "status" => OrderSortField::Status,
            _ => return Err(InvalidSort(s.to_string())),
        };
        Ok(Self { field, descending })
    }
}

impl OrderSort {
    fn order_by(self) -> String {
        let column = match self.field {
            OrderSortField::CreatedAt => "o.created_at",
            OrderSortField::TotalAmount => "o.total_amount",
            OrderSortField::Status => "o.status",
        };
        let direction = if self.descending { "DESC" } else { "ASC" };
        format!("{column} {direction}, o.id {direction}")
    }
}

fn admin_list_query(
    filter: OrderFilter,
    sort: OrderSort,
    page: PageRequest,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {ORDER_COLUMNS}, u.name AS customer_name, u.email AS customer_email \
         FROM gallery.order o LEFT JOIN gallery.user u ON u.id = o.user_id WHERE TRUE"
    ));
    if let Some(status) = filter.status {
        qb.push(" AND o.status = ").push_bind(status);
    }
    qb.push(" ORDER BY ").push(sort.order_by());
    qb.push(" LIMIT ")
        .push_bind(i64::from(page.limit()))
        .push(" OFFSET ")
        .push_bind(page.offset());
    qb
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order reads.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an order with its items and customer summary.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS}, u.name AS customer_name, u.email AS customer_email \
             FROM gallery.order o LEFT JOIN gallery.user u ON u.id = o.user_id \
             WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(self.attach_items(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS}, NULL::text AS customer_name, NULL::text AS customer_email \
             FROM gallery.order o WHERE o.user_id = $1 \
             ORDER BY o.created_at DESC, o.id DESC"
        ))
        .bind(user)
        .fetch_all(self.pool)
        .await?;
        self.attach_items(rows).await
    }

    /// One page of all orders, with customer summaries, and the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: OrderFilter,
        sort: OrderSort,
        page: PageRequest,
    ) -> Result<(Vec<Order>, u64), RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM gallery.order o WHERE ($1::gallery.order_status IS NULL \
             OR o.status = $1)",
        )
        .bind(filter.status)
        .fetch_one(self.pool)
        .await?;

        let mut select = admin_list_query(filter, sort, page);
        let rows = select
            .build_query_as::<OrderRow>()
            .fetch_all(self.pool)
            .await?;

        let orders = self.attach_items(rows).await?;
        Ok((orders, u64::try_from(total).unwrap_or_default()))
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();

        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            "SELECT i.id, i.order_id, i.artwork_id, i.title, i.quantity, i.price, \
                    a.images -> 0 ->> 'url' AS image \
             FROM gallery.order_item i \
             LEFT JOIN gallery.artwork a ON a.id = i.artwork_id \
             WHERE i.order_id = ANY($1) ORDER BY i.id",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in item_rows {
            let quantity = u32::try_from(item.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!(
                    "non-positive quantity on order item {}",
                    item.id
                ))
            })?;
            by_order.entry(item.order_id).or_default().push(OrderItem {
                id: item.id,
                artwork: item.artwork_id,
                title: item.title,
                quantity,
                price: item.price,
                image: item.image,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let items = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect())
    }
}

// =============================================================================
// Transactional writes
// =============================================================================

/// Insert an order and its lines. Returns the new order's ID.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if an insert fails.
pub async fn insert(
    conn: &mut PgConnection,
    user: UserId,
    shipping: &ShippingAddress,
    payment_method: PaymentMethod,
    notes: Option<&str>,
    total: Price,
    lines: &[PricedLine],
) -> Result<OrderId, RepositoryError> {
    let id = sqlx::query_scalar::<_, OrderId>(
        "INSERT INTO gallery.order \
             (user_id, street, city, state, zip_code, country, payment_method, total_amount, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(user)
    .bind(shipping.street.trim())
    .bind(shipping.city.trim())
    .bind(shipping.state.trim())
    .bind(shipping.zip_code.trim())
    .bind(shipping.country.trim())
    .bind(payment_method)
    .bind(total)
    .bind(notes)
    .fetch_one(&mut *conn)
    .await?;

    for line in lines {
        sqlx::query(
            "INSERT INTO gallery.order_item (order_id, artwork_id, title, quantity, price) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(line.artwork)
        .bind(&line.title)
        .bind(quantity_to_db(line.quantity)?)
        .bind(line.price)
        .execute(&mut *conn)
        .await?;
    }

    Ok(id)
}

/// Lock an order row. Returns its owner and status, or `None` if missing.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<(UserId, OrderStatus)>, RepositoryError> {
    let row = sqlx::query_as::<_, (UserId, OrderStatus)>(
        "SELECT user_id, status FROM gallery.order WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row)
}

/// Quantities to put back per artwork, for lines whose artwork still
/// exists, in ascending artwork order.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn restock_lines(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Vec<(ArtworkId, u32)>, RepositoryError> {
    let rows = sqlx::query_as::<_, (ArtworkId, i64)>(
        "SELECT artwork_id, SUM(quantity)::BIGINT FROM gallery.order_item \
         WHERE order_id = $1 AND artwork_id IS NOT NULL \
         GROUP BY artwork_id ORDER BY artwork_id",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(artwork, quantity)| {
            u32::try_from(quantity)
                .map(|q| (artwork, q))
                .map_err(|_| {
                    RepositoryError::DataCorruption(format!(
                        "order {id} has an invalid quantity for artwork {artwork}"
                    ))
                })
        })
        .collect()
}

/// Set an order's status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the update fails.
pub async fn set_status(
    conn: &mut PgConnection,
    id: OrderId,
    status: OrderStatus,
) -> Result<(), RepositoryError> {
    sqlx::query("UPDATE gallery.order SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_prefix_and_suffix_forms() {
        assert_eq!(OrderSort::default(), "-createdAt".parse().unwrap());
        assert_eq!(
            "totalAmount:desc".parse::<OrderSort>().unwrap(),
            "-totalAmount".parse::<OrderSort>().unwrap()
        );
        let sort: OrderSort = "status".parse().unwrap();
        assert_eq!(sort.field, OrderSortField::Status);
        assert!(!sort.descending);
    }

    #[test]
    fn test_sort_rejects_unknown_field() {
        assert!("user_id".parse::<OrderSort>().is_err());
        assert!("-notes".parse::<OrderSort>().is_err());
        assert!("status:up".parse::<OrderSort>().is_err());
    }

    #[test]
    fn test_admin_list_query_filters_status() {
        let filter = OrderFilter {
            status: Some(OrderStatus::Shipped),
        };
        let qb = admin_list_query(filter, OrderSort::default(), PageRequest::default());
        let sql = qb.sql();
        assert!(sql.contains("AND o.status = $1"), "{sql}");
        assert!(sql.contains("ORDER BY o.created_at DESC, o.id DESC LIMIT $2 OFFSET $3"), "{sql}");

        let qb = admin_list_query(OrderFilter::default(), OrderSort::default(), PageRequest::default());
        assert!(!qb.sql().contains("o.status ="));
    }
}
