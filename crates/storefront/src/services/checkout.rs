//! Checkout session initiation and payment verification.
//!
//! Validation happens before Stripe is contacted: an empty cart or a
//! checkout form with blank required fields never produces an API call.

use cartwheel_core::{
    CartItem, CheckoutSessionId, CurrencyCode, CustomerInfo, MissingFields, ProductId,
    to_minor_units,
};
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use super::stripe::{CheckoutSession, LineItem, NewCheckoutSession, StripeClient, StripeError};

/// Errors from starting a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error(transparent)]
    MissingFields(#[from] MissingFields),

    #[error("price for {0} cannot be expressed in minor units")]
    InvalidPrice(ProductId),

    #[error("payment processor error: {0}")]
    Processor(#[from] StripeError),

    #[error("checkout session {0} has no redirect URL")]
    MissingRedirect(CheckoutSessionId),
}

impl CheckoutError {
    /// Whether the error stems from the visitor's input rather than a failure.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyCart | Self::MissingFields(_))
    }
}

/// Where to send the visitor to pay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRedirect {
    pub session_id: CheckoutSessionId,
    pub url: String,
}

/// Outcome of checking a returned session.
#[derive(Debug, Clone)]
pub enum Verification {
    /// No session identifier was supplied; nothing was checked.
    Unverified,
    /// Stripe reports the session as paid.
    Paid(CheckoutSession),
    /// The session exists but is not paid.
    NotPaid(CheckoutSession),
}

impl Verification {
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        matches!(self, Self::Paid(_))
    }
}

/// Build the Stripe session parameters for a cart.
///
/// # Errors
///
/// Returns `EmptyCart` or `MissingFields` for invalid input, and
/// `InvalidPrice` if an item price overflows minor units.
pub fn build_session(
    base_url: &str,
    items: &[CartItem],
    customer: &CustomerInfo,
) -> Result<NewCheckoutSession, CheckoutError> {
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    customer.validate()?;

    let line_items = items
        .iter()
        .map(|item| {
            let unit_amount = to_minor_units(item.price)
                .ok_or_else(|| CheckoutError::InvalidPrice(item.id.clone()))?;
            Ok(LineItem {
                name: item.name.clone(),
                unit_amount,
                currency: CurrencyCode::USD.as_lower(),
                quantity: item.quantity,
                image_url: item.image().map(String::from),
            })
        })
        .collect::<Result<Vec<_>, CheckoutError>>()?;

    let base_url = base_url.trim_end_matches('/');

    Ok(NewCheckoutSession {
        line_items,
        success_url: format!("{base_url}/success?session_id={{CHECKOUT_SESSION_ID}}"),
        cancel_url: format!("{base_url}/cart"),
        customer_email: Some(customer.email.trim().to_string()),
        metadata: vec![
            ("customerName", customer.name.trim().to_string()),
            ("customerPhone", customer.phone.trim().to_string()),
            ("customerAddress", customer.address.trim().to_string()),
        ],
    })
}

/// Create a Stripe Checkout Session for the cart.
///
/// The cart itself is not touched; it is cleared only once payment is
/// verified.
///
/// # Errors
///
/// Returns a client error for invalid input and `Processor` or
/// `MissingRedirect` when Stripe fails or answers without a URL.
#[instrument(skip(stripe, items, customer), fields(items = items.len()))]
pub async fn begin_checkout(
    stripe: &StripeClient,
    base_url: &str,
    items: &[CartItem],
    customer: &CustomerInfo,
) -> Result<CheckoutRedirect, CheckoutError> {
    let params = build_session(base_url, items, customer)?;
    let session = stripe.create_checkout_session(&params).await?;

    match session.url {
        Some(url) if !url.is_empty() => Ok(CheckoutRedirect {
            session_id: session.id,
            url,
        }),
        _ => Err(CheckoutError::MissingRedirect(session.id)),
    }
}

/// Check whether a returned checkout session was paid.
///
/// # Errors
///
/// Returns the Stripe error if the session cannot be retrieved. There is no
/// retry.
#[instrument(skip(stripe))]
pub async fn verify_payment(
    stripe: &StripeClient,
    session_id: Option<&CheckoutSessionId>,
) -> Result<Verification, StripeError> {
    let Some(id) = session_id.filter(|id| !id.is_blank()) else {
        return Ok(Verification::Unverified);
    };

    let session = stripe.retrieve_checkout_session(id).await?;

    if session.payment_status.is_paid() {
        tracing::info!(session_id = %session.id, "Payment verified");
        Ok(Verification::Paid(session))
    } else {
        tracing::info!(
            session_id = %session.id,
            status = ?session.payment_status,
            "Checkout session not paid"
        );
        Ok(Verification::NotPaid(session))
    }
}
