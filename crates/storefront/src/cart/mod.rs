//! Visitor cart and wishlist.
//!
//! # Layout
//!
//! - [`storage`] - string-keyed storage areas (`StorageArea`, in-memory and
//!   session-backed implementations)
//! - [`store`] - the cart/wishlist state manager (`CartStore`)
//!
//! Each request hydrates a fresh `CartStore` from the visitor's session, so
//! there is no cart state shared between requests. Concurrent requests from
//! the same visitor are last-write-wins.

pub mod storage;
pub mod store;

pub use storage::{MemoryArea, SessionArea, StorageArea, StorageError};
pub use store::CartStore;
