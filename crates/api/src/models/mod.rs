//! Domain models for the API.
//!
//! These are the shapes handlers return as JSON. Database row types live
//! next to the queries that produce them.

pub mod artwork;
pub mod order;
pub mod user;

pub use artwork::{
    Artwork, ArtworkChanges, ArtworkForm, ArtworkFormError, ArtworkImage, NewArtwork, Review,
    Reviewer,
};
pub use order::{
    CustomerSummary, NewOrder, NewOrderLine, NewPaymentInfo, Order, OrderItem, PaymentInfo,
    ShippingAddress,
};
pub use user::{CurrentUser, Profile, ProfileChanges, User};
