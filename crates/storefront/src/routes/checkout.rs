//! Checkout and payment verification route handlers.
//!
//! Checkout reads the visitor's cart from the session and hands the
//! customer to Stripe. The cart is cleared only after Stripe confirms the
//! session was paid.

use axum::{Json, extract::State, response::Redirect};
use cartwheel_core::{CheckoutSessionId, CustomerInfo, PaymentStatus};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::extract::{AppForm, AppJson, AppQuery};
use crate::middleware::VisitorCart;
use crate::services::{CheckoutRedirect, Verification, begin_checkout, verify_payment};
use crate::state::AppState;

/// JSON checkout request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutRequest {
    pub customer_info: CustomerInfo,
}

/// Redirect landing query from Stripe.
#[derive(Debug, Deserialize)]
pub struct SuccessQuery {
    pub session_id: Option<CheckoutSessionId>,
}

/// JSON verification request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerifyRequest {
    pub session_id: Option<CheckoutSessionId>,
}

/// Verification answer.
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<PaidSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Summary of a paid checkout session.
#[derive(Debug, Serialize)]
pub struct PaidSession {
    pub id: CheckoutSessionId,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer_details: Option<serde_json::Value>,
    pub payment_status: PaymentStatus,
}

/// Start checkout from the checkout form and redirect to Stripe.
///
/// POST /checkout
///
/// # Errors
///
/// Returns 400 for an empty cart or missing fields, 500 if Stripe fails.
#[instrument(skip_all)]
pub async fn checkout_form(
    State(state): State<AppState>,
    cart: VisitorCart,
    AppForm(customer): AppForm<CustomerInfo>,
) -> Result<Redirect> {
    let redirect = start(&state, &cart, &customer).await?;
    Ok(Redirect::to(&redirect.url))
}

/// Create a checkout session and return its id and URL.
///
/// POST /api/checkout-session
///
/// # Errors
///
/// Returns 400 for an empty cart or missing fields, 500 if Stripe fails.
#[instrument(skip_all)]
pub async fn create_session(
    State(state): State<AppState>,
    cart: VisitorCart,
    AppJson(request): AppJson<CheckoutRequest>,
) -> Result<Json<CheckoutRedirect>> {
    let redirect = start(&state, &cart, &request.customer_info).await?;
    Ok(Json(redirect))
}

async fn start(
    state: &AppState,
    cart: &VisitorCart,
    customer: &CustomerInfo,
) -> Result<CheckoutRedirect> {
    let redirect = begin_checkout(
        state.stripe(),
        &state.config().base_url,
        cart.cart_items(),
        customer,
    )
    .await?;

    Ok(redirect)
}

/// Stripe redirect landing: verify the session and clear a paid cart.
///
/// GET /success?session_id=
///
/// # Errors
///
/// Returns 500 if Stripe cannot be reached; the cart is left as is.
#[instrument(skip_all, fields(session_id = ?query.session_id))]
pub async fn success(
    State(state): State<AppState>,
    cart: VisitorCart,
    AppQuery(query): AppQuery<SuccessQuery>,
) -> Result<Json<VerifyResponse>> {
    verify_and_settle(&state, cart, query.session_id.as_ref()).await
}

/// Verify a checkout session and clear a paid cart.
///
/// POST /api/verify-payment
///
/// # Errors
///
/// Returns 400 without a session id and 500 if Stripe cannot be reached.
#[instrument(skip_all, fields(session_id = ?request.session_id))]
pub async fn verify(
    State(state): State<AppState>,
    cart: VisitorCart,
    AppJson(request): AppJson<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let session_id = request
        .session_id
        .filter(|id| !id.is_blank())
        .ok_or_else(|| AppError::BadRequest("Session ID is required".to_string()))?;

    verify_and_settle(&state, cart, Some(&session_id)).await
}

async fn verify_and_settle(
    state: &AppState,
    mut cart: VisitorCart,
    session_id: Option<&CheckoutSessionId>,
) -> Result<Json<VerifyResponse>> {
    let response = match verify_payment(state.stripe(), session_id).await? {
        Verification::Paid(session) => {
            cart.clear_cart();
            cart.commit().await;

            VerifyResponse {
                success: true,
                session: Some(PaidSession {
                    id: session.id,
                    amount_total: session.amount_total,
                    currency: session.currency,
                    customer_details: session.customer_details,
                    payment_status: session.payment_status,
                }),
                message: None,
            }
        }
        Verification::NotPaid(_) => VerifyResponse {
            success: false,
            session: None,
            message: Some("Payment not completed"),
        },
        Verification::Unverified => VerifyResponse {
            success: false,
            session: None,
            message: Some("No session ID provided"),
        },
    };

    Ok(Json(response))
}
