//! Gallery API - REST backend for the online art gallery shop.
//!
//! Serves the artwork catalog, reviews, favorites, orders and user profiles
//! as JSON under `/api`, and stored images under `/uploads`.
//!
//! # Architecture
//!
//! - Axum web framework
//! - `PostgreSQL` via sqlx for persistence
//! - JWT bearer tokens for authentication, Argon2 for password hashing
//! - Local filesystem storage for uploaded images

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
