//! Cartwheel Core - Shared types library.
//!
//! This crate provides the domain types used by the storefront server and its
//! tests:
//! - cart and wishlist line items, subtotals
//! - customer checkout details and their validation
//! - product reviews and rating averages
//! - prices and minor-unit conversion
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and easy to test.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, cart items, customers, reviews, statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
