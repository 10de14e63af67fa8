//! Session-related types.
//!
//! Keys under which per-visitor state is stored in the session.

/// Session keys for visitor state.
pub mod keys {
    /// Key for the serialized cart item array.
    pub const CART_ITEMS: &str = "cartItems";

    /// Key for the serialized wishlist item array.
    pub const WISHLIST_ITEMS: &str = "wishlistItems";
}
