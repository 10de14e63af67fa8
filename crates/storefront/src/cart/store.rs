//! Cart and wishlist state manager.
//!
//! [`CartStore`] owns the visitor's cart and wishlist for the lifetime of a
//! request. State changes only through its operations; each mutating
//! operation runs inside a scoped save that writes the affected collection to
//! the storage area when the scope ends, including on unwind.

use std::ops::{Deref, DerefMut};

use cartwheel_core::{CartItem, Price, ProductId, WishlistItem, item_count, subtotal};
use tracing::instrument;

use super::storage::StorageArea;
use crate::models::session_keys;

/// In-memory cart and wishlist mirrored to a [`StorageArea`].
#[derive(Debug)]
pub struct CartStore<S> {
    area: S,
    cart: Vec<CartItem>,
    wishlist: Vec<WishlistItem>,
}

impl<S: StorageArea> CartStore<S> {
    /// Seed a store from the collections persisted in `area`.
    ///
    /// An absent key yields an empty collection. A value that fails to parse
    /// is discarded as a whole and logged; nothing is recovered from it.
    pub fn hydrate(area: S) -> Self {
        let cart = load_collection(&area, session_keys::CART_ITEMS);
        let wishlist = load_collection(&area, session_keys::WISHLIST_ITEMS);
        Self {
            area,
            cart,
            wishlist,
        }
    }

    /// Items currently in the cart, in insertion order.
    #[must_use]
    pub fn cart_items(&self) -> &[CartItem] {
        &self.cart
    }

    /// Items currently in the wishlist, in insertion order.
    #[must_use]
    pub fn wishlist(&self) -> &[WishlistItem] {
        &self.wishlist
    }

    /// The storage area this store writes to.
    #[must_use]
    pub const fn area(&self) -> &S {
        &self.area
    }

    /// Sum of `price × quantity` over the cart.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        subtotal(&self.cart)
    }

    /// Total units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        item_count(&self.cart)
    }

    /// Whether a product is in the wishlist.
    #[must_use]
    pub fn is_in_wishlist(&self, id: &ProductId) -> bool {
        self.wishlist.iter().any(|item| &item.id == id)
    }

    /// Add one unit of `item` to the cart.
    ///
    /// Out-of-stock items are ignored. A new line always starts at quantity 1
    /// whatever `item.quantity` says. An existing line grows by one only while
    /// it is below `item.stock`.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub fn add_to_cart(&mut self, item: CartItem) {
        if !item.is_purchasable() {
            tracing::info!("Cannot add out-of-stock product to cart");
            return;
        }

        self.with_cart(|cart| {
            if let Some(existing) = cart.iter_mut().find(|line| line.id == item.id) {
                if i64::from(existing.quantity) < item.stock {
                    existing.quantity += 1;
                } else {
                    tracing::debug!(stock = item.stock, "Cart line already at stock limit");
                }
            } else {
                cart.push(CartItem { quantity: 1, ..item });
            }
        });
    }

    /// Add `item` to the wishlist unless a product with the same id is there.
    #[instrument(skip(self, item), fields(product_id = %item.id))]
    pub fn add_to_wishlist(&mut self, item: WishlistItem) {
        self.with_wishlist(|wishlist| {
            if !wishlist.iter().any(|entry| entry.id == item.id) {
                wishlist.push(WishlistItem { quantity: 1, ..item });
            }
        });
    }

    /// Remove a cart line by product id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_from_cart(&mut self, id: &ProductId) {
        self.with_cart(|cart| cart.retain(|line| &line.id != id));
    }

    /// Remove a wishlist entry by product id.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn remove_from_wishlist(&mut self, id: &ProductId) {
        self.with_wishlist(|wishlist| wishlist.retain(|entry| &entry.id != id));
    }

    /// Take one unit off a cart line, dropping the line when it reaches zero.
    #[instrument(skip(self), fields(product_id = %id))]
    pub fn decrease_quantity(&mut self, id: &ProductId) {
        self.with_cart(|cart| {
            cart.retain_mut(|line| {
                if &line.id == id {
                    line.quantity = line.quantity.saturating_sub(1);
                }
                line.quantity > 0
            });
        });
    }

    /// Empty the cart.
    pub fn clear_cart(&mut self) {
        self.with_cart(Vec::clear);
    }

    /// Empty the wishlist.
    pub fn clear_wishlist(&mut self) {
        self.with_wishlist(Vec::clear);
    }

    fn with_cart<R>(&mut self, mutate: impl FnOnce(&mut Vec<CartItem>) -> R) -> R {
        let mut scope = ScopedSave::new(&self.area, session_keys::CART_ITEMS, &mut self.cart);
        mutate(&mut *scope)
    }

    fn with_wishlist<R>(&mut self, mutate: impl FnOnce(&mut Vec<WishlistItem>) -> R) -> R {
        let mut scope =
            ScopedSave::new(&self.area, session_keys::WISHLIST_ITEMS, &mut self.wishlist);
        mutate(&mut *scope)
    }
}

/// Read and parse one collection, falling back to empty.
fn load_collection<S: StorageArea>(area: &S, key: &str) -> Vec<CartItem> {
    let raw = match area.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read persisted collection");
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "Discarding malformed persisted collection");
        Vec::new()
    })
}

/// Mutable access to a collection that persists it when dropped.
struct ScopedSave<'a, S: StorageArea> {
    area: &'a S,
    key: &'static str,
    items: &'a mut Vec<CartItem>,
}

impl<'a, S: StorageArea> ScopedSave<'a, S> {
    const fn new(area: &'a S, key: &'static str, items: &'a mut Vec<CartItem>) -> Self {
        Self { area, key, items }
    }
}

impl<S: StorageArea> Deref for ScopedSave<'_, S> {
    type Target = Vec<CartItem>;

    fn deref(&self) -> &Self::Target {
        &*self.items
    }
}

impl<S: StorageArea> DerefMut for ScopedSave<'_, S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.items
    }
}

impl<S: StorageArea> Drop for ScopedSave<'_, S> {
    fn drop(&mut self) {
        let json = match serde_json::to_string(&*self.items) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key = self.key, error = %e, "Failed to serialize collection");
                return;
            }
        };

        if let Err(e) = self.area.set_item(self.key, &json) {
            tracing::warn!(key = self.key, error = %e, "Failed to persist collection");
        }
    }
}
