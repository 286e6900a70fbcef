//! Gallery Core - Domain types and rules.
//!
//! This crate provides the types shared by every Gallery component:
//! - `api` - The REST backend
//! - `cli` - Migrations, administration, and the shopping client
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. Anything that must hold for every order, review,
//! or cart lives here so the server and the client agree on it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, prices, statuses, categories
//! - [`rating`] - Review ratings and average computation
//! - [`inventory`] - Stock reservation and restoration
//! - [`pagination`] - Page/limit normalization and page counts
//! - [`cart`] - Client-side shopping cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod inventory;
pub mod pagination;
pub mod rating;
pub mod types;

pub use cart::{Cart, CartItem, MAX_LINE_QUANTITY};
pub use inventory::{Stock, StockError};
pub use pagination::{PageRequest, Pagination};
pub use rating::{Rating, RatingError, average_rating};
pub use types::*;
