//! Newtype IDs for type-safe references to external records.
//!
//! Every identifier in the storefront is issued by someone else: the content
//! store owns product ids, the payment processor owns checkout session ids and
//! the shipping carrier owns rate and label ids. They are opaque strings, so
//! the wrappers only guarantee that one kind of id is never passed where
//! another is expected.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`, `is_blank()`,
///   `is_path_safe()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use cartwheel_core::define_id;
/// define_id!(SkuId);
/// define_id!(WarehouseId);
///
/// let sku = SkuId::new("sku-1");
/// let warehouse = WarehouseId::new("sku-1");
///
/// // These are different types, so this won't compile:
/// // let _: SkuId = warehouse;
/// assert_eq!(sku.as_str(), warehouse.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Returns `true` if the ID is empty or whitespace only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Returns `true` if the ID is non-empty and made only of ASCII
            /// letters, digits, `_` and `-`, so it can stand alone as one
            /// URL path segment.
            #[must_use]
            pub fn is_path_safe(&self) -> bool {
                !self.0.is_empty()
                    && self
                        .0
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Content store document id of a product.
define_id!(ProductId);
// Payment processor checkout session id.
define_id!(CheckoutSessionId);
// Carrier rate quote id.
define_id!(RateId);
// Carrier shipping label id.
define_id!(LabelId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_is_transparent() {
        let id = ProductId::new("prod-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"prod-42\"");

        let parsed: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_is_blank() {
        assert!(ProductId::new("").is_blank());
        assert!(ProductId::new("   ").is_blank());
        assert!(!ProductId::new("a").is_blank());
    }

    #[test]
    fn test_is_path_safe() {
        assert!(CheckoutSessionId::new("cs_test_a1B2c3").is_path_safe());
        assert!(LabelId::new("se-label-1").is_path_safe());

        for hostile in ["", "..", "../carriers?x=", "a/b", "se-1%2F..", "se 1", "é"] {
            assert!(!LabelId::new(hostile).is_path_safe(), "{hostile:?}");
        }
    }

    #[test]
    fn test_display() {
        let id = CheckoutSessionId::new("cs_test_123");
        assert_eq!(id.to_string(), "cs_test_123");
    }
}
