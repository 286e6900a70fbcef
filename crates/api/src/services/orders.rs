//! Checkout, cancellation and status changes.
//!
//! Every operation that moves stock runs in one transaction. Artwork rows
//! are locked in ascending id order, so concurrent checkouts serialize on
//! the rows they share and any failure leaves stock untouched.

use std::collections::BTreeMap;

use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use gallery_core::{ArtworkId, OrderId, OrderStatus, Price, StatusTransitionError, UserId};

use crate::db::artworks::{lock_for_update, write_stock};
use crate::db::orders::{self, OrderRepository, PricedLine};
use crate::db::RepositoryError;
use crate::models::{NewOrder, NewOrderLine, Order};

/// Errors that can occur while placing or changing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("No order items")]
    EmptyOrder,

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Please provide {0} in the shipping address")]
    MissingAddressField(&'static str),

    #[error("Artwork not found with id {0}")]
    ArtworkNotFound(ArtworkId),

    #[error("Insufficient stock for artwork {title}")]
    InsufficientStock { title: String },

    #[error("Order not found")]
    NotFound,

    #[error("Not authorized to cancel this order")]
    NotOwner,

    #[error("Order cannot be cancelled in current status")]
    NotCancellable,

    #[error("Invalid status change: {0}")]
    Transition(#[from] StatusTransitionError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Order workflow service.
pub struct OrderService<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order for `user`, reserving stock for every line.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty order, a zero quantity or a
    /// blank address field. Returns `OrderError::ArtworkNotFound` or
    /// `OrderError::InsufficientStock` when a line cannot be filled; in that
    /// case no stock is changed.
    pub async fn place(&self, user: UserId, order: NewOrder) -> Result<Order, OrderError> {
        if let Some(field) = order.shipping_address.first_blank_field() {
            return Err(OrderError::MissingAddressField(field));
        }
        let wanted = merge_lines(&order.items)?;

        let mut tx = self.pool.begin().await?;
        let mut lines = Vec::with_capacity(wanted.len());

        for (&artwork, &quantity) in &wanted {
            let locked = lock_for_update(&mut *tx, artwork)
                .await?
                .ok_or(OrderError::ArtworkNotFound(artwork))?;

            let remaining = locked
                .stock
                .reserve(quantity)
                .map_err(|_| OrderError::InsufficientStock {
                    title: locked.title.clone(),
                })?;
            write_stock(&mut *tx, artwork, remaining).await?;

            lines.push(PricedLine {
                artwork,
                title: locked.title,
                quantity,
                price: locked.price,
            });
        }

        let total = order_total(&lines);
        let notes = order
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let id = orders::insert(
            &mut *tx,
            user,
            &order.shipping_address,
            order.payment_info.method,
            notes,
            total,
            &lines,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(order_id = %id, user_id = %user, total = %total, lines = lines.len(), "order placed");
        self.reload(id).await
    }

    /// Cancel a pending order on behalf of its owner and put its stock back.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound`, `OrderError::NotOwner`, or
    /// `OrderError::NotCancellable` for an order past `pending`.
    pub async fn cancel(&self, user: UserId, id: OrderId) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let (owner, status) = orders::lock(&mut *tx, id).await?.ok_or(OrderError::NotFound)?;
        if owner != user {
            return Err(OrderError::NotOwner);
        }
        if !status.is_cancellable() {
            return Err(OrderError::NotCancellable);
        }

        restock(&mut *tx, id).await?;
        orders::set_status(&mut *tx, id, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, user_id = %user, "order cancelled by owner");
        self.reload(id).await
    }

    /// Move an order to `next`. Cancelling restores stock.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` or `OrderError::Transition` if the
    /// lifecycle does not allow the change.
    pub async fn update_status(&self, id: OrderId, next: OrderStatus) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let (_, current) = orders::lock(&mut *tx, id).await?.ok_or(OrderError::NotFound)?;
        let next = current.transition_to(next)?;

        if next == OrderStatus::Cancelled {
            restock(&mut *tx, id).await?;
        }
        orders::set_status(&mut *tx, id, next).await?;
        tx.commit().await?;

        tracing::info!(order_id = %id, from = %current, to = %next, "order status changed");
        self.reload(id).await
    }

    async fn reload(&self, id: OrderId) -> Result<Order, OrderError> {
        OrderRepository::new(self.pool)
            .get(id)
            .await?
            .ok_or(OrderError::NotFound)
    }
}

/// Return every line of an order to stock. Artworks deleted since the order
/// was placed are skipped.
async fn restock(conn: &mut PgConnection, id: OrderId) -> Result<(), OrderError> {
    for (artwork, quantity) in orders::restock_lines(conn, id).await? {
        let Some(locked) = lock_for_update(conn, artwork).await? else {
            continue;
        };
        write_stock(conn, artwork, locked.stock.restore(quantity)).await?;
    }
    Ok(())
}

/// Validate requested lines and merge duplicates, keyed in lock order.
fn merge_lines(items: &[NewOrderLine]) -> Result<BTreeMap<ArtworkId, u32>, OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyOrder);
    }

    let mut merged = BTreeMap::new();
    for line in items {
        if line.quantity == 0 {
            return Err(OrderError::InvalidQuantity);
        }
        let entry = merged.entry(line.artwork).or_insert(0_u32);
        *entry = entry
            .checked_add(line.quantity)
            .ok_or(OrderError::InvalidQuantity)?;
    }
    Ok(merged)
}

fn order_total(lines: &[PricedLine]) -> Price {
    lines.iter().map(|l| l.price.times(l.quantity)).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(artwork: i32, quantity: u32) -> NewOrderLine {
        NewOrderLine {
            artwork: ArtworkId::new(artwork),
            quantity,
        }
    }

    #[test]
    fn test_empty_order_rejected() {
        assert!(matches!(merge_lines(&[]), Err(OrderError::EmptyOrder)));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        assert!(matches!(
            merge_lines(&[line(1, 2), line(2, 0)]),
            Err(OrderError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_duplicates_merge_in_lock_order() {
        let merged = merge_lines(&[line(9, 1), line(3, 2), line(9, 4)]).unwrap();
        let ordered: Vec<_> = merged.into_iter().collect();
        assert_eq!(
            ordered,
            vec![(ArtworkId::new(3), 2), (ArtworkId::new(9), 5)]
        );
    }

    #[test]
    fn test_overflowing_quantity_rejected() {
        assert!(matches!(
            merge_lines(&[line(1, u32::MAX), line(1, 1)]),
            Err(OrderError::InvalidQuantity)
        ));
    }

    #[test]
    fn test_total_uses_snapshot_prices() {
        let lines = [
            PricedLine {
                artwork: ArtworkId::new(1),
                title: "Dusk".to_string(),
                quantity: 2,
                price: Price::parse("120.50").unwrap(),
            },
            PricedLine {
                artwork: ArtworkId::new(2),
                title: "Tide".to_string(),
                quantity: 1,
                price: Price::parse("80").unwrap(),
            },
        ];
        assert_eq!(order_total(&lines), Price::parse("321.00").unwrap());
    }

    #[test]
    fn test_messages_match_api_contract() {
        assert_eq!(
            OrderError::ArtworkNotFound(ArtworkId::new(12)).to_string(),
            "Artwork not found with id 12"
        );
        assert_eq!(
            OrderError::InsufficientStock {
                title: "Dusk".to_string()
            }
            .to_string(),
            "Insufficient stock for artwork Dusk"
        );
    }
}
