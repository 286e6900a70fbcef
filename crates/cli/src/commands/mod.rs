//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod shop;
pub mod users;
