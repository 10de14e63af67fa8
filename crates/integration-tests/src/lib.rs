//! End-to-end test harness for the Cartwheel storefront.
//!
//! [`TestContext`] serves the real router on an ephemeral port with
//! in-memory sessions, and points the Stripe, Sanity and ShipEngine clients
//! at `wiremock` servers. Tests drive it with a cookie-enabled client so the
//! visitor's cart survives between requests.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartwheel-integration-tests
//! ```
//!
//! No database is needed: the pool is created lazily and only the readiness
//! check would touch it.

use std::net::SocketAddr;

use cartwheel_storefront::config::{
    SanityConfig, ShipFromAddress, ShippingConfig, StorefrontConfig, StripeConfig,
};
use cartwheel_storefront::{AppState, app};
use reqwest::{Client, Response, redirect};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower_sessions::MemoryStore;
use wiremock::MockServer;

/// Stripe secret used by the harness.
pub const STRIPE_KEY: &str = "sk_test_51Hq8ZkL2mNvB7xQ4tR9wYc3";

/// Harness options.
#[derive(Debug, Clone, Copy)]
pub struct TestOptions {
    /// Configure a ShipEngine API key.
    pub shipping_key: bool,
    /// Configure a Sanity write token.
    pub sanity_token: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            shipping_key: true,
            sanity_token: true,
        }
    }
}

/// A running storefront with mocked upstream services.
pub struct TestContext {
    /// Cookie-enabled client that does not follow redirects.
    pub client: Client,
    pub base_url: String,
    pub stripe: MockServer,
    pub sanity: MockServer,
    pub shipengine: MockServer,
}

impl TestContext {
    /// Start a storefront with every upstream configured.
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    /// Start a storefront with the given options.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn with_options(options: TestOptions) -> Self {
        let stripe = MockServer::start().await;
        let sanity = MockServer::start().await;
        let shipengine = MockServer::start().await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no local address");
        let base_url = format!("http://{addr}");

        let config = StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/cartwheel_test"),
            host: addr.ip(),
            port: addr.port(),
            base_url: base_url.clone(),
            stripe: StripeConfig {
                secret_key: SecretString::from(STRIPE_KEY),
                api_base: stripe.uri(),
                api_version: "2024-12-18.acacia".to_string(),
            },
            sanity: SanityConfig {
                project_id: "test".to_string(),
                dataset: "production".to_string(),
                api_version: "2024-01-01".to_string(),
                token: options
                    .sanity_token
                    .then(|| SecretString::from("sk-sanity-write")),
                api_host: Some(sanity.uri()),
            },
            shipping: ShippingConfig {
                api_key: options
                    .shipping_key
                    .then(|| SecretString::from("TEST_shipengine_key")),
                api_base: shipengine.uri(),
                carrier_ids: vec!["se-123890".to_string()],
                ship_from: ShipFromAddress::default(),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };

        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/cartwheel_test")
            .expect("Failed to create lazy pool");
        let state = AppState::new(config, pool).expect("Failed to build app state");
        let router = app(state, MemoryStore::default());

        tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server failed");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            stripe,
            sanity,
            shipengine,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET request failed")
    }

    /// POST a JSON body to a path.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be sent.
    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    /// Current cart view.
    ///
    /// # Panics
    ///
    /// Panics if the cart cannot be fetched or parsed.
    pub async fn cart(&self) -> Value {
        self.get("/api/cart")
            .await
            .json()
            .await
            .expect("Cart response was not JSON")
    }

    /// Add an item to the cart and return the updated view.
    ///
    /// # Panics
    ///
    /// Panics if the request fails or the response is not JSON.
    pub async fn add_to_cart(&self, item: &Value) -> Value {
        self.post_json("/api/cart/add", item)
            .await
            .json()
            .await
            .expect("Cart response was not JSON")
    }
}

/// A purchasable cart item as the storefront posts it.
#[must_use]
pub fn cart_item(id: &str, price: f64, stock: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Product {id}"),
        "description": "",
        "price": price,
        "quantity": 1,
        "imageUrl": format!("https://cdn.sanity.io/images/{id}.png"),
        "inStock": true,
        "stock": stock,
    })
}

/// A complete checkout form.
#[must_use]
pub fn customer_info() -> Value {
    json!({
        "email": "ada@example.com",
        "name": "Ada Lovelace",
        "phone": "555-0100",
        "address": "1 Analytical Way",
        "city": "London",
        "state": "LDN",
        "zipCode": "12345",
        "country": "GB",
    })
}
