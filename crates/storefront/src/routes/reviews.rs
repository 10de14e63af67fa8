//! Review submission route handler.

use axum::{Json, extract::State};
use cartwheel_core::Review;
use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::extract::AppJson;
use crate::services::{ReviewSubmission, submit_review};
use crate::state::AppState;

/// Successful submission answer.
#[derive(Debug, Serialize)]
pub struct ReviewSubmitted {
    pub message: &'static str,
    pub review: Review,
}

/// Submit a review for a product.
///
/// POST /api/review
///
/// # Errors
///
/// Returns 400 for invalid input, 404 for an unknown product and 500 if the
/// content store write fails.
#[instrument(skip_all, fields(product_id = %submission.product_id))]
pub async fn submit(
    State(state): State<AppState>,
    AppJson(submission): AppJson<ReviewSubmission>,
) -> Result<Json<ReviewSubmitted>> {
    let review = submit_review(state.content(), submission, Utc::now()).await?;

    Ok(Json(ReviewSubmitted {
        message: "Review submitted successfully!",
        review,
    }))
}
