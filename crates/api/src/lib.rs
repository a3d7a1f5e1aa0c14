//! ProTech API - REST backend for the storefront and admin dashboard.
//!
//! # Architecture
//!
//! - Axum JSON handlers under `/api`
//! - `PostgreSQL` via sqlx for catalog, accounts, orders, and wishlists
//! - JWT bearer tokens for authentication, argon2 for password storage
//! - SMTP (lettre) order-confirmation email, fired after commit and never
//!   allowed to fail a request
//!
//! The one piece that has to be right is order creation: stock validation,
//! reservation, and the order insert run inside a single database
//! transaction, with each per-product decrement expressed as an atomic
//! conditional `UPDATE`. See [`services::orders`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
