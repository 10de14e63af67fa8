//! Cartwheel storefront library.
//!
//! The storefront's HTTP surface, visitor cart and wishlist, and the
//! Stripe, Sanity and ShipEngine clients, exposed as a library so the binary
//! and the integration tests build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
pub use state::AppState;
