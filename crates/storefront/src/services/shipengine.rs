//! ShipEngine API client for rates, labels and tracking.
//!
//! Requests are shaped from storefront input; carrier responses are passed
//! back untouched.

use cartwheel_core::{LabelId, RateId};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::{ShipFromAddress, ShippingConfig};

/// Errors that can occur when interacting with the ShipEngine API.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// No API key is configured.
    #[error("ShipEngine API key not configured")]
    NotConfigured,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Label id is not a single URL path segment.
    #[error("Invalid label id: {0:?}")]
    InvalidId(LabelId),
}

/// ShipEngine API client.
///
/// Built even without an API key; every call then fails with
/// [`ShippingError::NotConfigured`] before any request is sent.
#[derive(Clone)]
pub struct ShippingClient {
    client: Option<reqwest::Client>,
    base_url: Url,
    carrier_ids: Vec<String>,
    ship_from: ShipFromAddress,
}

impl ShippingClient {
    /// Create a new ShipEngine API client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value, the API base
    /// is not a URL, or the HTTP client fails to build.
    pub fn new(config: &ShippingConfig) -> Result<Self, ShippingError> {
        let client = match &config.api_key {
            Some(key) => {
                let mut headers = HeaderMap::new();
                headers.insert(
                    "API-Key",
                    HeaderValue::from_str(key.expose_secret())
                        .map_err(|e| ShippingError::Parse(format!("Invalid API key format: {e}")))?,
                );
                Some(
                    reqwest::Client::builder()
                        .default_headers(headers)
                        .build()?,
                )
            }
            None => None,
        };

        let base_url = Url::parse(&config.api_base)
            .map_err(|e| ShippingError::Parse(format!("Invalid API base URL: {e}")))?;

        Ok(Self {
            client,
            base_url,
            carrier_ids: config.carrier_ids.clone(),
            ship_from: config.ship_from.clone(),
        })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// Quote rates for shipping `packages` to `ship_to`.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` without an API key, or the API error.
    #[instrument(skip(self, ship_to, packages), fields(packages = packages.len()))]
    pub async fn get_rates(
        &self,
        ship_to: &ShipToAddress,
        packages: &[Package],
    ) -> Result<serde_json::Value, ShippingError> {
        let client = self.client()?;
        let url = self.endpoint(&["v1", "rates"])?;
        let body = self.rate_request(ship_to, packages);

        let response = client.post(url).json(&body).send().await?;
        Self::parse(response).await
    }

    /// Purchase a 4x6 PDF label for a quoted rate.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` without an API key, or the API error.
    #[instrument(skip(self), fields(rate_id = %rate_id))]
    pub async fn create_label(&self, rate_id: &RateId) -> Result<serde_json::Value, ShippingError> {
        let client = self.client()?;
        let url = self.endpoint(&["v1", "labels"])?;
        let body = serde_json::json!({
            "rate_id": rate_id.as_str(),
            "label_layout": "4x6",
            "label_format": "pdf",
        });

        let response = client.post(url).json(&body).send().await?;
        Self::parse(response).await
    }

    /// Fetch tracking information for a label.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` if `label_id` is not path safe, `NotConfigured`
    /// without an API key, or the API error.
    #[instrument(skip(self), fields(label_id = %label_id))]
    pub async fn track_label(
        &self,
        label_id: &LabelId,
    ) -> Result<serde_json::Value, ShippingError> {
        if !label_id.is_path_safe() {
            return Err(ShippingError::InvalidId(label_id.clone()));
        }
        let client = self.client()?;
        let url = self.endpoint(&["v1", "labels", label_id.as_str(), "track"])?;

        let response = client.get(url).send().await?;
        Self::parse(response).await
    }

    fn client(&self) -> Result<&reqwest::Client, ShippingError> {
        self.client.as_ref().ok_or(ShippingError::NotConfigured)
    }

    /// Build the ShipEngine rate request body.
    /// API base joined with `segments`, each escaped as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ShippingError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ShippingError::Parse("API base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn rate_request(&self, ship_to: &ShipToAddress, packages: &[Package]) -> serde_json::Value {
        let from = &self.ship_from;

        serde_json::json!({
            "rate_options": {
                "carrier_ids": self.carrier_ids,
            },
            "shipment": {
                "ship_to": {
                    "name": ship_to.name,
                    "phone": ship_to.phone,
                    "address_line1": ship_to.address_line1,
                    "city_locality": ship_to.city_locality,
                    "state_province": ship_to.state_province,
                    "postal_code": ship_to.postal_code,
                    "country_code": ship_to.country_code,
                    "address_residential_indicator": ship_to.address_residential_indicator,
                },
                "ship_from": {
                    "name": from.name,
                    "phone": from.phone,
                    "address_line1": from.address_line1,
                    "city_locality": from.city_locality,
                    "state_province": from.state_province,
                    "postal_code": from.postal_code,
                    "country_code": from.country_code,
                    "address_residential_indicator": "no",
                },
                "packages": packages,
            },
        })
    }

    async fn parse(response: reqwest::Response) -> Result<serde_json::Value, ShippingError> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %message, "ShipEngine API error");
            return Err(ShippingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ShippingError::Parse(e.to_string()))
    }
}

/// Destination address as posted by the storefront.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShipToAddress {
    pub name: String,
    pub phone: String,
    pub address_line1: String,
    pub city_locality: String,
    pub state_province: String,
    pub postal_code: String,
    pub country_code: String,
    pub address_residential_indicator: Option<String>,
}

/// One parcel in a shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub weight: Weight,
    pub dimensions: Dimensions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub value: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub height: f64,
    pub width: f64,
    pub length: f64,
    pub unit: String,
}
