//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{CheckoutError, ContentError, ReviewError, ShippingError, StripeError};

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Starting a checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Payment verification failed.
    #[error("Payment error: {0}")]
    Payment(#[from] StripeError),

    /// Review submission failed.
    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    /// Content store read failed.
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// A shipping call failed.
    #[error("Shipping error ({action:?}): {source}")]
    Shipping {
        action: ShippingAction,
        source: ShippingError,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Shipping operation that failed, for the client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShippingAction {
    Rates,
    Label,
    Tracking,
}

impl ShippingAction {
    const fn failure_message(self) -> &'static str {
        match self {
            Self::Rates => "Failed to fetch shipping rates",
            Self::Label => "Failed to create shipping label",
            Self::Tracking => "Failed to fetch tracking information",
        }
    }
}

impl AppError {
    /// Wrap a shipping error with the operation that produced it.
    #[must_use]
    pub const fn shipping(action: ShippingAction, source: ShippingError) -> Self {
        Self::Shipping { action, source }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Checkout(err) if err.is_client_error() => StatusCode::BAD_REQUEST,
            Self::Review(ReviewError::Invalid(_))
            | Self::Payment(StripeError::InvalidId(_))
            | Self::Shipping {
                source: ShippingError::InvalidId(_),
                ..
            }
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Review(ReviewError::ProductNotFound(_)) | Self::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::Content(_) => StatusCode::BAD_GATEWAY,
            // Carrier errors keep the carrier's status code
            Self::Shipping {
                source: ShippingError::Api { status, .. },
                ..
            } => StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Checkout(_)
            | Self::Payment(_)
            | Self::Review(_)
            | Self::Shipping { .. }
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    fn public_message(&self) -> String {
        match self {
            Self::Checkout(err) if err.is_client_error() => err.to_string(),
            Self::Checkout(_) => "Failed to process checkout. Please try again.".to_string(),
            Self::Payment(StripeError::InvalidId(_)) => "Invalid session ID".to_string(),
            Self::Payment(_) => "Failed to verify payment".to_string(),
            Self::Review(ReviewError::Invalid(err)) => err.to_string(),
            Self::Review(ReviewError::ProductNotFound(_)) => "Product not found".to_string(),
            Self::Review(ReviewError::Store(_)) => "Failed to submit review".to_string(),
            Self::Content(_) => "External service error".to_string(),
            Self::Shipping {
                source: ShippingError::NotConfigured,
                ..
            } => ShippingError::NotConfigured.to_string(),
            Self::Shipping {
                source: ShippingError::InvalidId(_),
                ..
            } => "Invalid label ID".to_string(),
            Self::Shipping {
                action,
                source: ShippingError::Api { .. },
            } => action.failure_message().to_string(),
            Self::Shipping { .. } | Self::Internal(_) => "Internal server error".to_string(),
            Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
            Self::RateLimited => "Too many requests".to_string(),
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        // Don't expose internal error details to clients
        let body = ApiError {
            error: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
