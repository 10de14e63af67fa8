//! Shipping relay route handlers.

use axum::{Json, extract::State};
use cartwheel_core::{LabelId, RateId};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result, ShippingAction};
use crate::extract::{AppJson, AppPath};
use crate::services::{Package, ShipToAddress};
use crate::state::AppState;

/// Rate quote request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RatesRequest {
    /// Destination; the storefront client posts it as `shipeToAddress`.
    #[serde(rename = "shipeToAddress", alias = "shipToAddress")]
    pub ship_to_address: Option<ShipToAddress>,
    pub packages: Option<Vec<Package>>,
}

/// Rate quote answer wrapping the carrier response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesResponse {
    pub shipment_details: serde_json::Value,
}

/// Label purchase request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelRequest {
    pub rate_id: Option<RateId>,
}

/// Quote shipping rates.
///
/// POST /api/shipping/rates
///
/// # Errors
///
/// Returns 400 without an address or packages, 500 without an API key, and
/// the carrier's status code if it rejects the request.
#[instrument(skip_all)]
pub async fn rates(
    State(state): State<AppState>,
    AppJson(request): AppJson<RatesRequest>,
) -> Result<Json<RatesResponse>> {
    let (Some(ship_to), Some(packages)) = (request.ship_to_address, request.packages) else {
        return Err(AppError::BadRequest("Missing required fields".to_string()));
    };

    let shipment_details = state
        .shipping()
        .get_rates(&ship_to, &packages)
        .await
        .map_err(|e| AppError::shipping(ShippingAction::Rates, e))?;

    Ok(Json(RatesResponse { shipment_details }))
}

/// Purchase a label for a quoted rate.
///
/// POST /api/shipping/label
///
/// # Errors
///
/// Returns 400 without a rate id, 500 without an API key, and the carrier's
/// status code if it rejects the request.
#[instrument(skip_all, fields(rate_id = ?request.rate_id))]
pub async fn label(
    State(state): State<AppState>,
    AppJson(request): AppJson<LabelRequest>,
) -> Result<Json<serde_json::Value>> {
    let rate_id = request
        .rate_id
        .filter(|id| !id.is_blank())
        .ok_or_else(|| AppError::BadRequest("Rate ID is required".to_string()))?;

    let label = state
        .shipping()
        .create_label(&rate_id)
        .await
        .map_err(|e| AppError::shipping(ShippingAction::Label, e))?;

    Ok(Json(label))
}

/// Fetch tracking information for a label.
///
/// GET /api/shipping/tracking/{label_id}
///
/// # Errors
///
/// Returns 500 without an API key and the carrier's status code if it
/// rejects the request.
#[instrument(skip(state))]
pub async fn tracking(
    State(state): State<AppState>,
    AppPath(label_id): AppPath<LabelId>,
) -> Result<Json<serde_json::Value>> {
    let tracking = state
        .shipping()
        .track_label(&label_id)
        .await
        .map_err(|e| AppError::shipping(ShippingAction::Tracking, e))?;

    Ok(Json(tracking))
}
