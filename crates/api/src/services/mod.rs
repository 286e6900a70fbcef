//! Business logic that spans repositories.

pub mod auth;
pub mod orders;
pub mod uploads;

pub use auth::{AuthError, AuthService, Claims, TokenIssuer};
pub use orders::{OrderError, OrderService};
pub use uploads::{UploadError, UploadKind, UploadStore, UploadedFile};
