//! Cart and wishlist route handlers.
//!
//! Both collections live in the visitor's session. Every mutation answers
//! with the updated collection; unknown ids are no-ops.

use axum::Json;
use cartwheel_core::{CartItem, ProductId, WishlistItem};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::{CartStore, StorageArea};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::{AppJson, AppPath};
use crate::middleware::VisitorCart;

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartItem>,
    /// Formatted subtotal, e.g. `$25.00`.
    pub subtotal: String,
    pub item_count: u32,
}

impl<S: StorageArea> From<&CartStore<S>> for CartView {
    fn from(store: &CartStore<S>) -> Self {
        Self {
            items: store.cart_items().to_vec(),
            subtotal: store.subtotal().to_string(),
            item_count: store.item_count(),
        }
    }
}

/// Wishlist display data.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistItem>,
}

impl<S: StorageArea> From<&CartStore<S>> for WishlistView {
    fn from(store: &CartStore<S>) -> Self {
        Self {
            items: store.wishlist().to_vec(),
        }
    }
}

/// Wishlist membership answer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistMembership {
    pub in_wishlist: bool,
}

/// Body naming a single product.
#[derive(Debug, Deserialize)]
pub struct ItemRef {
    pub id: ProductId,
}

// =============================================================================
// Cart
// =============================================================================

/// Show the cart.
#[instrument(skip_all)]
pub async fn show(cart: VisitorCart) -> Json<CartView> {
    Json(CartView::from(&*cart))
}

/// Add one unit of a product to the cart.
///
/// Out-of-stock items and items already at their stock limit leave the cart
/// unchanged.
///
/// # Errors
///
/// Returns 400 if the price is negative or above the storefront maximum.
#[instrument(skip_all, fields(product_id = %item.id))]
pub async fn add(
    mut cart: VisitorCart,
    AppJson(item): AppJson<CartItem>,
) -> Result<Json<CartView>> {
    ensure_valid_price(&item)?;
    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", item.id.as_str())]));

    cart.add_to_cart(item);
    cart.commit().await;
    Ok(Json(CartView::from(&*cart)))
}

/// Decrease a line's quantity by one, removing it at zero.
#[instrument(skip_all, fields(product_id = %body.id))]
pub async fn decrease(mut cart: VisitorCart, AppJson(body): AppJson<ItemRef>) -> Json<CartView> {
    cart.decrease_quantity(&body.id);
    cart.commit().await;
    Json(CartView::from(&*cart))
}

/// Remove a line from the cart.
#[instrument(skip_all, fields(product_id = %body.id))]
pub async fn remove(mut cart: VisitorCart, AppJson(body): AppJson<ItemRef>) -> Json<CartView> {
    cart.remove_from_cart(&body.id);
    cart.commit().await;
    Json(CartView::from(&*cart))
}

/// Empty the cart.
#[instrument(skip_all)]
pub async fn clear(mut cart: VisitorCart) -> Json<CartView> {
    cart.clear_cart();
    cart.commit().await;
    Json(CartView::from(&*cart))
}

// =============================================================================
// Wishlist
// =============================================================================

/// Show the wishlist.
#[instrument(skip_all)]
pub async fn wishlist(cart: VisitorCart) -> Json<WishlistView> {
    Json(WishlistView::from(&*cart))
}

/// Add a product to the wishlist if it is not already there.
///
/// # Errors
///
/// Returns 400 if the price is negative or above the storefront maximum.
#[instrument(skip_all, fields(product_id = %item.id))]
pub async fn wishlist_add(
    mut cart: VisitorCart,
    AppJson(item): AppJson<WishlistItem>,
) -> Result<Json<WishlistView>> {
    ensure_valid_price(&item)?;

    cart.add_to_wishlist(item);
    cart.commit().await;
    Ok(Json(WishlistView::from(&*cart)))
}

/// Remove a product from the wishlist.
#[instrument(skip_all, fields(product_id = %body.id))]
pub async fn wishlist_remove(
    mut cart: VisitorCart,
    AppJson(body): AppJson<ItemRef>,
) -> Json<WishlistView> {
    cart.remove_from_wishlist(&body.id);
    cart.commit().await;
    Json(WishlistView::from(&*cart))
}

/// Empty the wishlist.
#[instrument(skip_all)]
pub async fn wishlist_clear(mut cart: VisitorCart) -> Json<WishlistView> {
    cart.clear_wishlist();
    cart.commit().await;
    Json(WishlistView::from(&*cart))
}

/// Whether a product is in the wishlist.
#[instrument(skip(cart))]
pub async fn wishlist_contains(
    cart: VisitorCart,
    AppPath(id): AppPath<ProductId>,
) -> Json<WishlistMembership> {
    Json(WishlistMembership {
        in_wishlist: cart.is_in_wishlist(&id),
    })
}

fn ensure_valid_price(item: &CartItem) -> Result<()> {
    if item.has_valid_price() {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid price".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::cart::MemoryArea;

    fn item(id: &str, price: i64, stock: i64) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: id.to_uppercase(),
            description: String::new(),
            price: Decimal::from(price),
            quantity: 1,
            image_url: String::new(),
            in_stock: true,
            stock,
        }
    }

    #[test]
    fn test_cart_view_totals() {
        let mut store = CartStore::hydrate(MemoryArea::new());
        store.add_to_cart(item("a", 10, 5));
        store.add_to_cart(item("a", 10, 5));
        store.add_to_cart(item("b", 5, 5));

        let view = CartView::from(&store);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.subtotal, "$25.00");
        assert_eq!(view.item_count, 3);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["itemCount"], 3);
        assert_eq!(json["items"][0]["inStock"], true);
    }

    #[test]
    fn test_out_of_range_price_is_rejected() {
        assert!(ensure_valid_price(&item("a", 10, 5)).is_ok());

        let mut huge = item("a", 10, 5);
        huge.price = Decimal::from_scientific("5e28").unwrap();
        assert!(matches!(ensure_valid_price(&huge), Err(AppError::BadRequest(_))));

        assert!(ensure_valid_price(&item("a", -1, 5)).is_err());
    }

    #[test]
    fn test_wishlist_membership_wire_name() {
        let json = serde_json::to_value(WishlistMembership { in_wishlist: true }).unwrap();
        assert_eq!(json, serde_json::json!({"inWishlist": true}));
    }
}
