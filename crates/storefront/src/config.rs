//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (session storage)
//! - `STRIPE_SECRET_KEY` - Stripe secret API key
//! - `SANITY_PROJECT_ID` - Sanity project ID
//! - `SANITY_DATASET` - Sanity dataset name
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL used for checkout redirects (default: <http://localhost:3000>)
//! - `STRIPE_API_BASE` - Stripe API base URL (default: <https://api.stripe.com>)
//! - `STRIPE_API_VERSION` - Stripe API version (default: 2024-12-18.acacia)
//! - `SANITY_API_VERSION` - Sanity API version date (default: 2024-01-01)
//! - `SANITY_API_TOKEN` - Sanity write token (required for review submission)
//! - `SANITY_API_HOST` - Override for the Sanity API host
//! - `SHIPENGINE_API_KEY` - ShipEngine API key (shipping routes fail without it)
//! - `SHIPENGINE_API_BASE` - ShipEngine API base URL (default: <https://api.shipengine.com>)
//! - `SHIPENGINE_CARRIER_IDS` - Comma-separated carrier IDs for rate quotes
//! - `SHIP_FROM_NAME`, `SHIP_FROM_PHONE`, `SHIP_FROM_ADDRESS_LINE1`,
//!   `SHIP_FROM_CITY`, `SHIP_FROM_STATE`, `SHIP_FROM_POSTAL_CODE`,
//!   `SHIP_FROM_COUNTRY` - Origin address for shipments
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Default carrier IDs (UPS, `FedEx`, USPS) used for rate quotes.
const DEFAULT_CARRIER_IDS: &str = "se-123890,se-123891,se-123892";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Stripe API configuration
    pub stripe: StripeConfig,
    /// Sanity content store configuration
    pub sanity: SanityConfig,
    /// ShipEngine configuration
    pub shipping: ShippingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Stripe API configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Stripe secret API key
    pub secret_key: SecretString,
    /// API base URL (overridable for tests)
    pub api_base: String,
    /// Pinned API version sent as `Stripe-Version`
    pub api_version: String,
}

/// Sanity content store configuration.
#[derive(Debug, Clone)]
pub struct SanityConfig {
    /// Sanity project ID
    pub project_id: String,
    /// Dataset name (e.g., production)
    pub dataset: String,
    /// API version date (e.g., 2024-01-01)
    pub api_version: String,
    /// Write token; reads work without it on public datasets
    pub token: Option<SecretString>,
    /// Full API host override (e.g., a mock server URL)
    pub api_host: Option<String>,
}

impl SanityConfig {
    /// Base URL for API calls.
    #[must_use]
    pub fn api_base(&self) -> String {
        self.api_host.as_ref().map_or_else(
            || format!("https://{}.api.sanity.io", self.project_id),
            |host| host.trim_end_matches('/').to_string(),
        )
    }
}

/// ShipEngine configuration.
#[derive(Debug, Clone)]
pub struct ShippingConfig {
    /// ShipEngine API key; shipping routes report a configuration error without it
    pub api_key: Option<SecretString>,
    /// API base URL (overridable for tests)
    pub api_base: String,
    /// Carrier IDs requested for rate quotes
    pub carrier_ids: Vec<String>,
    /// Origin address for every shipment
    pub ship_from: ShipFromAddress,
}

/// Origin address for shipments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipFromAddress {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub city_locality: String,
    pub state_province: String,
    pub postal_code: String,
    pub country_code: String,
}

impl Default for ShipFromAddress {
    fn default() -> Self {
        Self {
            name: "Your Store".to_string(),
            phone: "555-123-4567".to_string(),
            address_line1: "123 Store Street".to_string(),
            city_locality: "Store City".to_string(),
            state_province: "CA".to_string(),
            postal_code: "90210".to_string(),
            country_code: "US".to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("STOREFRONT_BASE_URL".to_string(), e.to_string())
        })?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            stripe: StripeConfig::from_env()?,
            sanity: SanityConfig::from_env()?,
            shipping: ShippingConfig::from_env(),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: get_validated_secret("STRIPE_SECRET_KEY")?,
            api_base: get_env_or_default("STRIPE_API_BASE", "https://api.stripe.com"),
            api_version: get_env_or_default("STRIPE_API_VERSION", "2024-12-18.acacia"),
        })
    }
}

impl SanityConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            project_id: get_required_env("SANITY_PROJECT_ID")?,
            dataset: get_required_env("SANITY_DATASET")?,
            api_version: get_env_or_default("SANITY_API_VERSION", "2024-01-01"),
            token: get_optional_env("SANITY_API_TOKEN").map(SecretString::from),
            api_host: get_optional_env("SANITY_API_HOST"),
        })
    }
}

impl ShippingConfig {
    fn from_env() -> Self {
        let defaults = ShipFromAddress::default();

        Self {
            api_key: get_optional_env("SHIPENGINE_API_KEY").map(SecretString::from),
            api_base: get_env_or_default("SHIPENGINE_API_BASE", "https://api.shipengine.com"),
            carrier_ids: parse_list(&get_env_or_default(
                "SHIPENGINE_CARRIER_IDS",
                DEFAULT_CARRIER_IDS,
            )),
            ship_from: ShipFromAddress {
                name: get_env_or_default("SHIP_FROM_NAME", &defaults.name),
                phone: get_env_or_default("SHIP_FROM_PHONE", &defaults.phone),
                address_line1: get_env_or_default(
                    "SHIP_FROM_ADDRESS_LINE1",
                    &defaults.address_line1,
                ),
                city_locality: get_env_or_default("SHIP_FROM_CITY", &defaults.city_locality),
                state_province: get_env_or_default("SHIP_FROM_STATE", &defaults.state_province),
                postal_code: get_env_or_default("SHIP_FROM_POSTAL_CODE", &defaults.postal_code),
                country_code: get_env_or_default("SHIP_FROM_COUNTRY", &defaults.country_code),
            },
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are long random strings
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
