//! Core types for Gallery.
//!
//! This module provides type-safe wrappers for the shop's domain concepts.

pub mod artwork;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use artwork::{Category, DimensionUnit, Dimensions};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError};
pub use status::*;

/// Error returned when a string does not name a variant of a domain enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// What was being parsed (e.g. "category").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
