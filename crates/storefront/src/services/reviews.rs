//! Review submission relay.

use cartwheel_core::{ProductId, Review, ReviewInput, ReviewValidationError};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use super::sanity::{ContentClient, ContentError};

/// Errors from submitting a review.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Invalid(#[from] ReviewValidationError),

    #[error("Product not found")]
    ProductNotFound(ProductId),

    #[error("content store error: {0}")]
    Store(#[from] ContentError),
}

/// Request body for a review submission.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewSubmission {
    pub product_id: ProductId,
    pub review: ReviewInput,
}

/// Validate a review and append it to its product.
///
/// Validation failures return before the content store is contacted. The
/// review is stamped with `now`.
///
/// # Errors
///
/// Returns `Invalid` for bad input, `ProductNotFound` if no product has the
/// id, and `Store` if the content store fails.
#[instrument(skip(content, submission), fields(product_id = %submission.product_id))]
pub async fn submit_review(
    content: &ContentClient,
    submission: ReviewSubmission,
    now: DateTime<Utc>,
) -> Result<Review, ReviewError> {
    let ReviewSubmission { product_id, review } = submission;

    if product_id.is_blank() {
        return Err(ReviewValidationError::MissingFields.into());
    }
    let review = review.into_review(now)?;

    if content.get_product(&product_id).await?.is_none() {
        return Err(ReviewError::ProductNotFound(product_id));
    }

    content.append_review(&product_id, &review).await?;
    tracing::info!(rating = review.rating, "Review submitted");

    Ok(review)
}
