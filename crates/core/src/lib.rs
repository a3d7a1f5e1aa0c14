//! ProTech Core - Shared domain types.
//!
//! This crate provides the common types used across the ProTech backend:
//! - `api` - REST API serving the storefront and the admin dashboard
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, validated emails, and the order/payment/role enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
