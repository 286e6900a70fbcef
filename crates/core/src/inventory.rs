//! Stock reservation and restoration.
//!
//! An artwork carries both a quantity and an `in_stock` flag. Checkout
//! reserves against both; cancellation puts stock back and re-lists the
//! artwork.

use serde::{Deserialize, Serialize};

/// Why a reservation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StockError {
    /// Requested zero items.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    /// Not enough stock, or the artwork is unlisted.
    #[error("insufficient stock: requested {requested}, available {available}")]
    Insufficient { requested: u32, available: u32 },
}

/// The stock state of one artwork.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub quantity: u32,
    pub in_stock: bool,
}

impl Stock {
    #[must_use]
    pub const fn new(quantity: u32, in_stock: bool) -> Self {
        Self { quantity, in_stock }
    }

    /// Stock after taking `requested` items.
    ///
    /// The artwork is marked out of stock when the quantity reaches zero.
    ///
    /// # Errors
    ///
    /// Returns `StockError::InvalidQuantity` for a zero request and
    /// `StockError::Insufficient` when the artwork is unlisted or short.
    pub const fn reserve(self, requested: u32) -> Result<Self, StockError> {
        if requested == 0 {
            return Err(StockError::InvalidQuantity);
        }
        if !self.in_stock || self.quantity < requested {
            return Err(StockError::Insufficient {
                requested,
                available: if self.in_stock { self.quantity } else { 0 },
            });
        }
        let quantity = self.quantity - requested;
        Ok(Self {
            quantity,
            in_stock: if quantity == 0 { false } else { self.in_stock },
        })
    }

    /// Stock after returning `returned` items; the artwork is listed again.
    #[must_use]
    pub const fn restore(self, returned: u32) -> Self {
        Self {
            quantity: self.quantity.saturating_add(returned),
            in_stock: true,
        }
    }
}
