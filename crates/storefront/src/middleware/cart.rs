//! Visitor cart extractor.
//!
//! Hydrates a [`CartStore`] from the visitor's session so handlers can work on
//! the cart and wishlist directly.

use std::ops::{Deref, DerefMut};

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::cart::{CartStore, SessionArea};
use crate::error::AppError;

/// Extractor giving a handler the visitor's cart and wishlist.
///
/// Mutations land in the session snapshot immediately; call
/// [`VisitorCart::commit`] before returning to copy them into the session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(mut cart: VisitorCart, Json(item): Json<CartItem>) -> Json<CartView> {
///     cart.add_to_cart(item);
///     cart.commit().await;
///     Json(CartView::from(&*cart))
/// }
/// ```
pub struct VisitorCart {
    store: CartStore<SessionArea>,
    session: Session,
}

/// Error returned when no session layer is installed.
pub struct MissingSession;

impl IntoResponse for MissingSession {
    fn into_response(self) -> Response {
        AppError::Internal("session layer missing, cannot load visitor cart".to_string())
            .into_response()
    }
}

impl VisitorCart {
    /// Copy changed collections back into the session.
    ///
    /// Write failures are logged, never returned.
    pub async fn commit(&self) {
        self.store.area().flush(&self.session).await;
    }
}

impl Deref for VisitorCart {
    type Target = CartStore<SessionArea>;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl DerefMut for VisitorCart {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}

impl<S> FromRequestParts<S> for VisitorCart
where
    S: Send + Sync,
{
    type Rejection = MissingSession;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(MissingSession)?;

        let area = SessionArea::load(&session).await;

        Ok(Self {
            store: CartStore::hydrate(area),
            session,
        })
    }
}
