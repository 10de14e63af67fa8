//! Cart and wishlist line items.
//!
//! Items serialize with camelCase field names (`imageUrl`, `inStock`) so the
//! persisted JSON arrays keep the shape browsers already have stored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::{CurrencyCode, Price};

/// A product line in the cart.
///
/// `quantity` is at least 1 while the item is in a cart and never exceeds
/// `stock` as it was known when the item was last added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Content store product id.
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Unit price in the store currency.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub in_stock: bool,
    /// Units available when the product page was loaded.
    #[serde(default)]
    pub stock: i64,
}

/// Wishlist entries share the cart item shape; `quantity` is always 1.
pub type WishlistItem = CartItem;

/// Highest unit price the storefront accepts, in whole currency units.
pub const MAX_UNIT_PRICE: i64 = 1_000_000;

const fn default_quantity() -> u32 {
    1
}

impl CartItem {
    /// Whether the item may be placed in a cart at all.
    #[must_use]
    pub const fn is_purchasable(&self) -> bool {
        self.in_stock && self.stock > 0
    }

    /// Whether `price` is between zero and [`MAX_UNIT_PRICE`].
    #[must_use]
    pub fn has_valid_price(&self) -> bool {
        !self.price.is_sign_negative() && self.price <= Decimal::from(MAX_UNIT_PRICE)
    }

    /// Price of the whole line (`price × quantity`), saturating at
    /// `Decimal::MAX`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price
            .checked_mul(Decimal::from(self.quantity))
            .unwrap_or(Decimal::MAX)
    }

    /// The image URL, if one is set.
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        let url = self.image_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// Sum of `price × quantity` over all items, saturating at `Decimal::MAX`.
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Price {
    let amount = items.iter().map(CartItem::line_total).fold(Decimal::ZERO, |acc, line| {
        acc.checked_add(line).unwrap_or(Decimal::MAX)
    });
    Price::new(amount, CurrencyCode::USD)
}

/// Total number of units across all items.
#[must_use]
pub fn item_count(items: &[CartItem]) -> u32 {
    items
        .iter()
        .fold(0_u32, |acc, item| acc.saturating_add(item.quantity))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            description: String::new(),
            price: Decimal::from(price),
            quantity,
            image_url: String::new(),
            in_stock: true,
            stock: 10,
        }
    }

    #[test]
    fn test_subtotal() {
        let items = vec![item("a", 10, 2), item("b", 5, 1)];
        let total = subtotal(&items);
        assert_eq!(total.amount, Decimal::from(25));
        assert_eq!(total.to_string(), "$25.00");
    }

    #[test]
    fn test_subtotal_saturates_instead_of_overflowing() {
        let mut huge = item("a", 1, 2);
        huge.price = Decimal::from_scientific("5e28").unwrap();

        assert_eq!(huge.line_total(), Decimal::MAX);
        assert_eq!(subtotal(&[huge.clone(), huge]).amount, Decimal::MAX);

        let mut big = item("b", 1, 1);
        big.price = Decimal::MAX;
        assert_eq!(subtotal(&[big.clone(), big]).amount, Decimal::MAX);
    }

    #[test]
    fn test_price_bounds() {
        assert!(item("a", 0, 1).has_valid_price());
        assert!(item("a", MAX_UNIT_PRICE, 1).has_valid_price());
        assert!(!item("a", MAX_UNIT_PRICE + 1, 1).has_valid_price());
        assert!(!item("a", -1, 1).has_valid_price());
    }

    #[test]
    fn test_subtotal_empty() {
        assert_eq!(subtotal(&[]).amount, Decimal::ZERO);
    }

    #[test]
    fn test_item_count() {
        let items = vec![item("a", 10, 2), item("b", 5, 3)];
        assert_eq!(item_count(&items), 5);
    }

    #[test]
    fn test_is_purchasable() {
        let mut it = item("a", 1, 1);
        assert!(it.is_purchasable());

        it.stock = 0;
        assert!(!it.is_purchasable());

        it.stock = 3;
        it.in_stock = false;
        assert!(!it.is_purchasable());
    }

    #[test]
    fn test_deserialize_browser_shape() {
        let json = r#"{
            "id": "p1",
            "name": "Lamp",
            "description": "Desk lamp",
            "price": 19.99,
            "quantity": 2,
            "imageUrl": "https://cdn.example.com/lamp.png",
            "inStock": true,
            "stock": 4
        }"#;
        let parsed: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id.as_str(), "p1");
        assert_eq!(parsed.price.to_string(), "19.99");
        assert_eq!(parsed.image(), Some("https://cdn.example.com/lamp.png"));
        assert!(parsed.in_stock);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_value(item("a", 3, 1)).unwrap();
        assert!(json.get("imageUrl").is_some());
        assert!(json.get("inStock").is_some());
        assert_eq!(json["price"], serde_json::json!(3.0));
    }

    #[test]
    fn test_blank_image_is_none() {
        let mut it = item("a", 1, 1);
        it.image_url = "  ".to_string();
        assert_eq!(it.image(), None);
    }
}
