//! Shopper commands backed by the local client store.
//!
//! # Usage
//!
//! ```bash
//! gallery login -e ada@example.com
//! gallery browse --category painting --sort price
//! gallery cart add 4 --quantity 2
//! gallery cart show
//! gallery checkout --street "1 Quay St" --city Hull --state "East Riding" \
//!     --zip "HU1 1AA" --country UK --method paypal
//! gallery orders
//! ```

use secrecy::SecretString;

use gallery_api::models::{NewOrder, NewOrderLine, NewPaymentInfo, ShippingAddress};
use gallery_core::{ArtworkId, Cart, MAX_LINE_QUANTITY, PaymentMethod};

use crate::client::{ApiClient, CatalogQuery};
use crate::store::Store;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Print a line of command output.
#[allow(clippy::print_stdout)]
fn say(line: &str) {
    println!("{line}");
}

fn check_quantity(quantity: u32) -> CommandResult {
    if quantity > MAX_LINE_QUANTITY {
        return Err(format!("Quantity may be at most {MAX_LINE_QUANTITY}").into());
    }
    Ok(())
}

fn client(api_url: &str, store: &Store) -> Result<ApiClient, Box<dyn std::error::Error>> {
    let token = store.token().map(|t| SecretString::from(t.to_owned()));
    Ok(ApiClient::new(api_url, token)?)
}

/// Sign in and remember the token.
///
/// # Errors
///
/// Returns an error if the credentials are rejected or the store cannot be
/// written.
pub async fn login(api_url: &str, store: &mut Store, email: &str, password: &str) -> CommandResult {
    let session = ApiClient::new(api_url, None)?.login(email, password).await?;
    say(&format!(
        "Logged in as {} <{}>",
        session.user.name, session.user.email
    ));
    store.set_session(session.token, session.user)?;
    tracing::debug!(path = %store.path().display(), "session saved");
    Ok(())
}

/// Forget the stored token.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn logout(store: &mut Store) -> CommandResult {
    let email = store.user().map(|u| u.email.clone());
    store.clear_session()?;
    match email {
        Some(email) => say(&format!("Logged out {email}")),
        None => say("Not logged in"),
    }
    Ok(())
}

/// Fetch a catalog page, cache it and print it.
///
/// # Errors
///
/// Returns an error if the request fails or the store cannot be written.
pub async fn browse(api_url: &str, store: &mut Store, query: &CatalogQuery) -> CommandResult {
    let page = client(api_url, store)?.catalog(query).await?;

    for item in &page.items {
        let stock = if item.in_stock {
            format!("{} in stock", item.quantity)
        } else {
            "sold out".to_string()
        };
        say(&format!(
            "#{:<5} {:<40} {:>12}  {:<12} {:.1}*  {stock}",
            item.id, item.title, item.price, item.category, item.average_rating
        ));
    }
    say(&format!(
        "Page {} of {} ({} artworks)",
        page.pagination.current_page, page.pagination.pages, page.pagination.total
    ));

    store.set_catalog(page)?;
    Ok(())
}

/// Add an artwork to the cart. Uses the cached catalog when it has the
/// artwork, otherwise fetches it.
///
/// # Errors
///
/// Returns an error for an unknown artwork or a store write failure.
pub async fn cart_add(
    api_url: &str,
    store: &mut Store,
    id: ArtworkId,
    quantity: u32,
) -> CommandResult {
    if quantity == 0 {
        return Err("Quantity must be at least 1".into());
    }
    check_quantity(quantity)?;
    let artwork = match store.cached_artwork(id) {
        Some(cached) => cached.clone(),
        None => client(api_url, store)?.artwork(id).await?,
    };
    store.add_to_cart(&artwork, quantity)?;
    say(&format!("Added {quantity} x {}", artwork.title));
    print_cart(store.cart());
    Ok(())
}

/// Remove an artwork from the cart.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn cart_remove(store: &mut Store, id: ArtworkId) -> CommandResult {
    store.remove_from_cart(id)?;
    print_cart(store.cart());
    Ok(())
}

/// Change the quantity of a cart line. Zero removes the line.
///
/// # Errors
///
/// Returns an error for an oversized quantity or a store write failure.
pub fn cart_update(store: &mut Store, id: ArtworkId, quantity: u32) -> CommandResult {
    check_quantity(quantity)?;
    if !store.update_quantity(id, quantity)? {
        say(&format!("Artwork #{id} is not in the cart"));
    }
    print_cart(store.cart());
    Ok(())
}

/// Print the cart.
pub fn cart_show(store: &Store) {
    print_cart(store.cart());
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn cart_clear(store: &mut Store) -> CommandResult {
    store.clear_cart()?;
    say("Cart cleared");
    Ok(())
}

fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        say("Cart is empty");
        return;
    }
    for line in cart.items() {
        say(&format!(
            "#{:<5} {:<40} {:>3} x {:>12}",
            line.id, line.title, line.quantity, line.price
        ));
    }
    say(&format!(
        "{} items, total {}",
        cart.total_quantity(),
        cart.total_amount()
    ));
}

/// Turn the cart into a checkout request.
#[must_use]
pub fn order_from_cart(
    cart: &Cart,
    shipping_address: ShippingAddress,
    method: PaymentMethod,
    notes: Option<String>,
) -> NewOrder {
    NewOrder {
        items: cart
            .items()
            .iter()
            .map(|line| NewOrderLine {
                artwork: line.id,
                quantity: line.quantity,
            })
            .collect(),
        shipping_address,
        payment_info: NewPaymentInfo { method },
        notes,
    }
}

/// Place an order for the cart and clear it on success.
///
/// # Errors
///
/// Returns an error if the cart is empty, the caller is not logged in, or
/// the server rejects the order.
pub async fn checkout(
    api_url: &str,
    store: &mut Store,
    shipping_address: ShippingAddress,
    method: PaymentMethod,
    notes: Option<String>,
) -> CommandResult {
    if store.cart().is_empty() {
        return Err("Cart is empty".into());
    }
    let order = order_from_cart(store.cart(), shipping_address, method, notes);
    let placed = client(api_url, store)?.place_order(&order).await?;

    store.clear_cart()?;
    tracing::info!(order_id = %placed.id, "order placed");
    say(&format!(
        "Order #{} placed: {} ({})",
        placed.id, placed.total_amount, placed.status
    ));
    Ok(())
}

/// List the caller's orders.
///
/// # Errors
///
/// Returns an error if the caller is not logged in or the request fails.
pub async fn orders(api_url: &str, store: &Store) -> CommandResult {
    let orders = client(api_url, store)?.my_orders().await?;
    if orders.is_empty() {
        say("No orders yet");
    }
    for order in orders {
        say(&format!(
            "Order #{} {} {:>12} {}",
            order.id,
            order.created_at.format("%Y-%m-%d"),
            order.total_amount,
            order.status
        ));
        for line in order.items {
            say(&format!("    {} x {} @ {}", line.quantity, line.title, line.price));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gallery_core::{CartItem, Price};

    use super::*;

    #[test]
    fn test_order_from_cart() {
        let mut cart = Cart::new();
        cart.add(CartItem {
            id: ArtworkId::new(3),
            title: "Harbour".to_string(),
            price: Price::from_cents(45_000),
            image: None,
            quantity: 2,
        });
        let address = ShippingAddress {
            street: "1 Quay St".to_string(),
            city: "Hull".to_string(),
            state: "East Riding".to_string(),
            zip_code: "HU1 1AA".to_string(),
            country: "UK".to_string(),
        };

        let order = order_from_cart(&cart, address, PaymentMethod::Paypal, None);
        assert_eq!(
            order.items,
            vec![NewOrderLine {
                artwork: ArtworkId::new(3),
                quantity: 2
            }]
        );

        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["shippingAddress"]["zipCode"], "HU1 1AA");
        assert_eq!(json["paymentInfo"]["method"], "paypal");
        assert!(json.get("notes").is_none());
    }

    #[tokio::test]
    async fn test_oversized_quantities_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = Store::open(&path).unwrap();

        let err = cart_add("http://localhost:1", &mut store, ArtworkId::new(1), u32::MAX)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Quantity may be at most 9999");
        assert!(cart_update(&mut store, ArtworkId::new(1), MAX_LINE_QUANTITY + 1).is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_checkout_rejects_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path().join("store.json")).unwrap();
        let address = ShippingAddress {
            street: "a".to_string(),
            city: "b".to_string(),
            state: "c".to_string(),
            zip_code: "d".to_string(),
            country: "e".to_string(),
        };
        let err = checkout(
            "http://localhost:5000",
            &mut store,
            address,
            PaymentMethod::CreditCard,
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Cart is empty");
    }
}
