//! External service clients and the business logic built on them.
//!
//! # Services
//!
//! - `stripe` - Stripe Checkout Sessions API client
//! - `checkout` - Checkout initiation and payment verification
//! - `sanity` - Sanity content store client (products, review writes)
//! - `reviews` - Review submission relay
//! - `shipengine` - ShipEngine rates, labels and tracking

pub mod checkout;
pub mod reviews;
pub mod sanity;
pub mod shipengine;
pub mod stripe;

pub use checkout::{CheckoutError, CheckoutRedirect, Verification, begin_checkout, verify_payment};
pub use reviews::{ReviewError, ReviewSubmission, submit_review};
pub use sanity::{ContentClient, ContentError, Product};
pub use shipengine::{Package, ShipToAddress, ShippingClient, ShippingError};
pub use stripe::{CheckoutSession, StripeClient, StripeError};
