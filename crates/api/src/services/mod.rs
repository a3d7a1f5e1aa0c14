//! Business-logic services.
//!
//! - [`auth`] - registration, login, bearer-token issue/verify
//! - [`orders`] - the order lifecycle: creation, status transitions, cancellation
//! - [`email`] - order-confirmation notifier (best-effort, never blocks a request)

pub mod auth;
pub mod email;
pub mod orders;
