//! Domain models for storefront.
//!
//! Wire types shared between routes and services live next to the service
//! that owns them; this module only holds session-scoped keys.

pub mod session;

pub use session::keys as session_keys;
