//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (database)
//!
//! # Cart
//! GET  /api/cart                       - Cart view
//! POST /api/cart/add                   - Add one unit of an item
//! POST /api/cart/decrease              - Decrease a line by one
//! POST /api/cart/remove                - Remove a line
//! POST /api/cart/clear                 - Empty the cart
//!
//! # Wishlist
//! GET  /api/wishlist                   - Wishlist view
//! POST /api/wishlist/add               - Add an item (idempotent)
//! POST /api/wishlist/remove            - Remove an item
//! POST /api/wishlist/clear             - Empty the wishlist
//! GET  /api/wishlist/contains/{id}     - Membership check
//!
//! # Checkout (rate limited)
//! POST /checkout                       - Form checkout, 303 to Stripe
//! POST /api/checkout-session           - JSON checkout
//! GET  /success?session_id=            - Stripe redirect landing
//! POST /api/verify-payment             - Verify a session
//!
//! # Products and reviews
//! GET  /api/products                   - Newest listed products
//! GET  /api/products/{id}              - Product with rating summary
//! GET  /api/products/slug/{slug}       - Listed product by URL slug
//! POST /api/review                     - Submit a review (rate limited)
//!
//! # Shipping
//! POST /api/shipping/rates             - Rate quotes
//! POST /api/shipping/label             - Label purchase
//! GET  /api/shipping/tracking/{id}     - Label tracking
//! ```

pub mod cart;
pub mod checkout;
pub mod health;
pub mod products;
pub mod reviews;
pub mod shipping;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::SessionStore;
use tracing::Span;

use crate::middleware::{
    checkout_rate_limiter, create_session_layer, request_id_middleware, review_rate_limiter,
    security_headers_middleware,
};
use crate::error::AppError;
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/decrease", post(cart::decrease))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::wishlist))
        .route("/add", post(cart::wishlist_add))
        .route("/remove", post(cart::wishlist_remove))
        .route("/clear", post(cart::wishlist_clear))
        .route("/contains/{id}", get(cart::wishlist_contains))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout", post(checkout::checkout_form))
        .route("/api/checkout-session", post(checkout::create_session))
        .route_layer(checkout_rate_limiter())
        .route("/success", get(checkout::success))
        .route("/api/verify-payment", post(checkout::verify))
}

/// Create the shipping routes router.
pub fn shipping_routes() -> Router<AppState> {
    Router::new()
        .route("/rates", post(shipping::rates))
        .route("/label", post(shipping::label))
        .route("/tracking/{label_id}", get(shipping::tracking))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api/cart", cart_routes())
        .nest("/api/wishlist", wishlist_routes())
        .merge(checkout_routes())
        .route("/api/products", get(products::list))
        .route("/api/products/{id}", get(products::show))
        .route("/api/products/slug/{slug}", get(products::show_by_slug))
        .route(
            "/api/review",
            post(reviews::submit).layer(review_rate_limiter()),
        )
        .nest("/api/shipping", shipping_routes())
        .fallback(not_found)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

/// Build the full application: routes, sessions and the middleware stack.
///
/// Sentry layers are added by the binary around the returned router.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());

    routes()
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
