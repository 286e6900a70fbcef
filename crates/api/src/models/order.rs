//! Order domain types and the checkout request body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gallery_core::{
    ArtworkId, Email, OrderId, OrderItemId, OrderStatus, PaymentMethod, PaymentStatus, Price,
    UserId,
};

/// Where an order ships to. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// Name of the first blank field, if any.
    #[must_use]
    pub fn first_blank_field(&self) -> Option<&'static str> {
        [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
            ("country", &self.country),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}

/// Payment details recorded with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

/// One line of a placed order, with the price at the time of purchase.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the artwork has been deleted from the catalog.
    pub artwork: Option<ArtworkId>,
    pub title: String,
    pub quantity: u32,
    pub price: Price,
    /// First image of the artwork while it is still in the catalog.
    pub image: Option<String>,
}

/// Name and email of the customer, included on admin views.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub name: String,
    pub email: Email,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerSummary>,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub payment_info: PaymentInfo,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A requested line in the checkout body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub artwork: ArtworkId,
    pub quantity: u32,
}

/// The checkout request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<NewOrderLine>,
    pub shipping_address: ShippingAddress,
    pub payment_info: NewPaymentInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Payment details a client may send. Status is always set by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPaymentInfo {
    pub method: PaymentMethod,
}
