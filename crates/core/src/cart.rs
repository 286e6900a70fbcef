//! Client-side shopping cart.
//!
//! The cart lives on the client and is never sent to the server as such;
//! checkout turns it into an order request. Totals are recomputed after every
//! mutation so a deserialized cart is always consistent with its lines.

use serde::{Deserialize, Serialize};

use crate::types::{ArtworkId, Price};

/// Largest quantity a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 9_999;

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ArtworkId,
    pub title: String,
    pub price: Price,
    pub image: Option<String>,
    pub quantity: u32,
}

/// The cart and its derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "Vec<CartItem>", into = "Vec<CartItem>")]
pub struct Cart {
    items: Vec<CartItem>,
    total_quantity: u32,
    total_amount: Price,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cart from persisted lines, recomputing totals. Line quantities
    /// are capped at [`MAX_LINE_QUANTITY`].
    #[must_use]
    pub fn from_items(mut items: Vec<CartItem>) -> Self {
        for line in &mut items {
            line.quantity = line.quantity.min(MAX_LINE_QUANTITY);
        }
        let mut cart = Self {
            items,
            ..Self::default()
        };
        cart.recompute();
        cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub const fn total_quantity(&self) -> u32 {
        self.total_quantity
    }

    #[must_use]
    pub const fn total_amount(&self) -> Price {
        self.total_amount
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item. An existing line for the same artwork has its quantity
    /// increased instead of a second line being added. A line never holds more
    /// than [`MAX_LINE_QUANTITY`].
    pub fn add(&mut self, mut item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity = existing
                .quantity
                .saturating_add(item.quantity)
                .min(MAX_LINE_QUANTITY);
        } else {
            item.quantity = item.quantity.min(MAX_LINE_QUANTITY);
            self.items.push(item);
        }
        self.recompute();
    }

    /// Remove the line for `id`, if any.
    pub fn remove(&mut self, id: ArtworkId) {
        self.items.retain(|line| line.id != id);
        self.recompute();
    }

    /// Set the quantity of the line for `id`. Unknown ids are ignored and a
    /// quantity of zero removes the line. Quantities above
    /// [`MAX_LINE_QUANTITY`] are capped.
    ///
    /// Returns whether a line was found.
    pub fn update_quantity(&mut self, id: ArtworkId, quantity: u32) -> bool {
        let Some(line) = self.items.iter_mut().find(|line| line.id == id) else {
            return false;
        };
        line.quantity = quantity.min(MAX_LINE_QUANTITY);
        if quantity == 0 {
            self.items.retain(|line| line.id != id);
        }
        self.recompute();
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total_quantity = self
            .items
            .iter()
            .fold(0_u32, |total, line| total.saturating_add(line.quantity));
        self.total_amount = self.items.iter().map(|line| line.price.times(line.quantity)).sum();
    }
}

impl From<Vec<CartItem>> for Cart {
    fn from(items: Vec<CartItem>) -> Self {
        Self::from_items(items)
    }
}

impl From<Cart> for Vec<CartItem> {
    fn from(cart: Cart) -> Self {
        cart.items
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: i32, cents: u32, quantity: u32) -> CartItem {
        CartItem {
            id: ArtworkId::new(id),
            title: format!("Artwork {id}"),
            price: Price::from_cents(cents),
            image: None,
            quantity,
        }
    }

    #[test]
    fn test_add_merges_same_artwork() {
        let mut cart = Cart::new();
        cart.add(item(1, 10_000, 1));
        cart.add(item(1, 10_000, 2));
        cart.add(item(2, 2_500, 1));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.total_quantity(), 4);
        assert_eq!(cart.total_amount(), Price::from_cents(32_500));
    }

    #[test]
    fn test_remove_and_update() {
        let mut cart = Cart::new();
        cart.add(item(1, 1_000, 1));
        cart.add(item(2, 500, 2));

        assert!(cart.update_quantity(ArtworkId::new(2), 5));
        assert_eq!(cart.total_amount(), Price::from_cents(3_500));

        assert!(!cart.update_quantity(ArtworkId::new(9), 5));
        assert_eq!(cart.total_quantity(), 6);

        cart.remove(ArtworkId::new(1));
        assert_eq!(cart.total_quantity(), 5);
        assert_eq!(cart.total_amount(), Price::from_cents(2_500));
    }

    #[test]
    fn test_zero_quantity_removes_line() {
        let mut cart = Cart::new();
        cart.add(item(1, 1_000, 3));
        assert!(cart.update_quantity(ArtworkId::new(1), 0));
        assert!(cart.is_empty());
        assert_eq!(cart.total_amount(), Price::ZERO);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.add(item(1, 1_000, 3));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn test_line_quantities_are_capped() {
        let mut cart = Cart::new();
        cart.add(item(1, 100, u32::MAX));
        cart.add(item(2, 100, 1));
        cart.add(item(2, 100, u32::MAX));
        assert_eq!(cart.items()[0].quantity, MAX_LINE_QUANTITY);
        assert_eq!(cart.items()[1].quantity, MAX_LINE_QUANTITY);
        assert_eq!(cart.total_quantity(), 2 * MAX_LINE_QUANTITY);

        assert!(cart.update_quantity(ArtworkId::new(1), u32::MAX));
        assert_eq!(cart.items()[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_oversized_persisted_lines_load() {
        let json = format!(
            r#"[{{"id": 1, "title": "A", "price": 1.0, "image": null, "quantity": {max}}},
                {{"id": 2, "title": "B", "price": 1.0, "image": null, "quantity": 1}}]"#,
            max = u32::MAX
        );
        let cart: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(cart.total_quantity(), MAX_LINE_QUANTITY + 1);
        assert_eq!(
            cart.total_amount(),
            Price::from_cents(100 * (MAX_LINE_QUANTITY + 1))
        );
    }

    #[test]
    fn test_persisted_form_is_the_item_list() {
        let mut cart = Cart::new();
        cart.add(item(7, 4_200, 2));

        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.starts_with('['));

        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.total_quantity(), 2);
        assert_eq!(restored.total_amount(), Price::from_cents(8_400));
    }
}
