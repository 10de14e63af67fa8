//! Core types for the Cartwheel storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod customer;
pub mod id;
pub mod price;
pub mod review;
pub mod status;

pub use cart::{CartItem, MAX_UNIT_PRICE, WishlistItem, item_count, subtotal};
pub use customer::{CustomerInfo, DEFAULT_COUNTRY, MissingFields};
pub use id::*;
pub use price::{CurrencyCode, Price, to_minor_units};
pub use review::{Review, ReviewInput, ReviewValidationError, average_rating};
pub use status::*;
