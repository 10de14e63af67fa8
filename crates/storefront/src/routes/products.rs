//! Product read route handlers.
//!
//! Products are read straight from the content store on every request so a
//! freshly submitted review shows up immediately.

use axum::{Json, extract::State};
use cartwheel_core::ProductId;
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::AppPath;
use crate::services::Product;
use crate::state::AppState;

/// Product with its computed rating summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    /// Mean rating, `null` without reviews.
    pub average_rating: Option<f64>,
    pub review_count: usize,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            average_rating: product.average_rating(),
            review_count: product.reviews.len(),
            product,
        }
    }
}

/// Show a product.
///
/// GET /api/products/{id}
///
/// # Errors
///
/// Returns 404 if no product has the id and 502 if the content store fails.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<ProductId>,
) -> Result<Json<ProductView>> {
    let product = state
        .content()
        .get_product(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductView::from(product)))
}

/// Show a listed product by its URL slug.
///
/// GET /api/products/slug/{slug}
///
/// # Errors
///
/// Returns 404 if no listed product has the slug and 502 if the content store
/// fails.
#[instrument(skip(state))]
pub async fn show_by_slug(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<ProductView>> {
    let product = state
        .content()
        .get_product_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(ProductView::from(product)))
}

/// List the newest products.
///
/// GET /api/products
///
/// # Errors
///
/// Returns 502 if the content store fails.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = state.content().list_products().await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}
