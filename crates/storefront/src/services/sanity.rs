//! Sanity content store client.
//!
//! Reads product documents through the GROQ query endpoint and appends
//! reviews through the mutation endpoint.

use cartwheel_core::{ProductId, Review, average_rating};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::config::SanityConfig;

/// Product lookup by document id, across both product document types.
const PRODUCT_BY_ID_QUERY: &str =
    r#"*[_type in ["product", "productList"] && _id == $productId][0]"#;

/// Product page lookup by URL slug.
const PRODUCT_BY_SLUG_QUERY: &str = r#"*[_type == "productList" && slug.current == $slug][0]"#;

/// Newest listed products for the storefront front page.
const FEATURED_PRODUCTS_QUERY: &str =
    r#"*[_type == "productList"] | order(_createdAt desc) [0...8]"#;

/// Errors that can occur when interacting with the Sanity API.
#[derive(Debug, Error)]
pub enum ContentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A write was attempted without an API token.
    #[error("Sanity API token not configured")]
    MissingToken,
}

/// Sanity API client.
#[derive(Clone)]
pub struct ContentClient {
    client: reqwest::Client,
    base_url: String,
    dataset: String,
    api_version: String,
    can_write: bool,
}

impl ContentClient {
    /// Create a new Sanity API client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SanityConfig) -> Result<Self, ContentError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &config.token {
            let auth_value = format!("Bearer {}", token.expose_secret());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| ContentError::Parse(format!("Invalid API token format: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base(),
            dataset: config.dataset.clone(),
            api_version: config.api_version.trim_start_matches('v').to_string(),
            can_write: config.token.is_some(),
        })
    }

    /// Fetch a product document by id.
    ///
    /// Returns `Ok(None)` if no product or product list document has the id.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, ContentError> {
        self.query(PRODUCT_BY_ID_QUERY, Some(("$productId", id.as_str())))
            .await
    }

    /// Fetch a listed product by its URL slug.
    ///
    /// Returns `Ok(None)` if no product list document has the slug.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, ContentError> {
        self.query(PRODUCT_BY_SLUG_QUERY, Some(("$slug", slug))).await
    }

    /// Fetch the eight most recently created listed products, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, ContentError> {
        let products: Option<Vec<Product>> = self.query(FEATURED_PRODUCTS_QUERY, None).await?;
        Ok(products.unwrap_or_default())
    }

    /// Run a GROQ query with at most one parameter and return its `result`.
    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        query: &str,
        param: Option<(&str, &str)>,
    ) -> Result<T, ContentError> {
        let url = format!(
            "{}/v{}/data/query/{}",
            self.base_url, self.api_version, self.dataset
        );

        let mut request = self.client.get(&url).query(&[("query", query)]);
        if let Some((name, value)) = param {
            // Query parameters are passed as JSON literals
            let literal =
                serde_json::to_string(value).map_err(|e| ContentError::Parse(e.to_string()))?;
            request = request.query(&[(name, literal.as_str())]);
        }

        let response = request.send().await?;
        let body: QueryResponse<T> = Self::parse(response).await?;
        Ok(body.result)
    }

    /// Append a review to a product's `reviews` array.
    ///
    /// Creates the array if the document has none. Array keys are generated
    /// by Sanity.
    ///
    /// # Errors
    ///
    /// Returns `MissingToken` without a write token, or the API error.
    #[instrument(skip(self, review), fields(product_id = %id))]
    pub async fn append_review(&self, id: &ProductId, review: &Review) -> Result<(), ContentError> {
        if !self.can_write {
            return Err(ContentError::MissingToken);
        }

        let url = format!(
            "{}/v{}/data/mutate/{}",
            self.base_url, self.api_version, self.dataset
        );

        let body = serde_json::json!({
            "mutations": [{
                "patch": {
                    "id": id.as_str(),
                    "setIfMissing": { "reviews": [] },
                    "insert": {
                        "after": "reviews[-1]",
                        "items": [review]
                    }
                }
            }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("autoGenerateArrayKeys", "true"), ("returnIds", "true")])
            .json(&body)
            .send()
            .await?;

        let result: MutationResponse = Self::parse(response).await?;
        tracing::info!(
            transaction_id = %result.transaction_id,
            "Review appended to product"
        );

        Ok(())
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ContentError> {
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ContentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ContentError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MutationResponse {
    #[serde(default)]
    transaction_id: String,
}

/// Product document as stored in Sanity.
///
/// Every field except the id may be missing on older documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(rename = "_type", default)]
    pub document_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<Slug>,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub discount_price: Option<Decimal>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub stock: i64,
    /// Sanity image reference, passed through untouched.
    #[serde(default)]
    pub image: Option<serde_json::Value>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub department: String,
    #[serde(default, deserialize_with = "reviews_or_empty")]
    pub reviews: Vec<Review>,
}

/// URL slug object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
}

impl Product {
    /// Mean rating over the attached reviews.
    #[must_use]
    pub fn average_rating(&self) -> Option<f64> {
        average_rating(&self.reviews)
    }
}

/// Accept `null` or a non-array `reviews` field as no reviews.
///
/// Entries that do not parse as a [`Review`] are skipped, so one hand-edited
/// review cannot make the whole product unreadable.
fn reviews_or_empty<'de, D>(deserializer: D) -> Result<Vec<Review>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let serde_json::Value::Array(entries) = serde_json::Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(review) => Some(review),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed stored review");
                None
            }
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use secrecy::SecretString;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(server: &MockServer, token: Option<&str>) -> SanityConfig {
        SanityConfig {
            project_id: "abc123".to_string(),
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            token: token.map(SecretString::from),
            api_host: Some(server.uri()),
        }
    }

    fn review() -> Review {
        Review {
            name: "Ada".to_string(),
            rating: 5,
            comment: "Sturdy and roomy".to_string(),
            date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_product_defaults_missing_fields() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "_id": "prod-1",
            "price": 12.5,
            "reviews": null
        }))
        .unwrap();

        assert_eq!(product.id.as_str(), "prod-1");
        assert_eq!(product.name, "");
        assert_eq!(product.price, Decimal::new(125, 1));
        assert!(!product.in_stock);
        assert!(product.reviews.is_empty());
        assert_eq!(product.average_rating(), None);
    }

    #[tokio::test]
    async fn test_get_product() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2024-01-01/data/query/production"))
            .and(query_param("query", PRODUCT_BY_ID_QUERY))
            .and(query_param("$productId", "\"prod-1\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {
                    "_id": "prod-1",
                    "_type": "productList",
                    "name": "Canvas Tote",
                    "price": 25,
                    "inStock": true,
                    "stock": 4,
                    "reviews": [
                        {"_key": "k1", "name": "A", "rating": 4, "comment": "ok", "date": "2024-01-01T00:00:00Z"},
                        {"_key": "k2", "name": "B", "rating": 5, "comment": "great", "date": "2024-01-02T00:00:00Z"}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ContentClient::new(&config(&server, None)).unwrap();
        let product = client
            .get_product(&ProductId::new("prod-1"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(product.name, "Canvas Tote");
        assert_eq!(product.reviews.len(), 2);
        assert_eq!(product.average_rating(), Some(4.5));
    }

    #[test]
    fn test_malformed_reviews_are_skipped() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "_id": "prod-1",
            "reviews": [
                {"name": "A", "rating": 4, "comment": "ok", "date": "2024-01-01T00:00:00Z"},
                {"name": "B", "rating": 4.5, "comment": "half star"},
                {"name": "C", "rating": null, "comment": "no stars"},
                {"name": "D", "rating": "5", "comment": "string"},
                "not a review",
                {"name": "E", "rating": 2, "comment": "meh", "date": "2024-01-03T00:00:00Z"}
            ]
        }))
        .unwrap();

        let names: Vec<&str> = product.reviews.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "E"]);
        assert_eq!(product.average_rating(), Some(3.0));
    }

    #[tokio::test]
    async fn test_get_product_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": null})),
            )
            .mount(&server)
            .await;

        let client = ContentClient::new(&config(&server, None)).unwrap();
        let product = client.get_product(&ProductId::new("nope")).await.unwrap();
        assert!(product.is_none());
    }

    #[tokio::test]
    async fn test_get_product_by_slug() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2024-01-01/data/query/production"))
            .and(query_param("query", PRODUCT_BY_SLUG_QUERY))
            .and(query_param("$slug", "\"canvas-tote\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": {
                    "_id": "prod-1",
                    "_type": "productList",
                    "name": "Canvas Tote",
                    "slug": {"_type": "slug", "current": "canvas-tote"},
                    "price": 25
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ContentClient::new(&config(&server, None)).unwrap();
        let product = client
            .get_product_by_slug("canvas-tote")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(product.id.as_str(), "prod-1");
        assert_eq!(product.slug.unwrap().current, "canvas-tote");
    }

    #[tokio::test]
    async fn test_list_products_keeps_store_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2024-01-01/data/query/production"))
            .and(query_param("query", FEATURED_PRODUCTS_QUERY))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": [
                    {"_id": "newest", "name": "Lamp", "price": 40},
                    {"_id": "older", "name": "Tote", "price": 25, "reviews": null}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ContentClient::new(&config(&server, None)).unwrap();
        let products = client.list_products().await.unwrap();

        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["newest", "older"]);
    }

    #[tokio::test]
    async fn test_list_products_null_result_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"result": null})),
            )
            .mount(&server)
            .await;

        let client = ContentClient::new(&config(&server, None)).unwrap();
        assert!(client.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_review_patch_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2024-01-01/data/mutate/production"))
            .and(query_param("autoGenerateArrayKeys", "true"))
            .and(header("authorization", "Bearer sk-write-token"))
            .and(body_partial_json(serde_json::json!({
                "mutations": [{
                    "patch": {
                        "id": "prod-1",
                        "setIfMissing": {"reviews": []},
                        "insert": {
                            "after": "reviews[-1]",
                            "items": [{"name": "Ada", "rating": 5, "comment": "Sturdy and roomy"}]
                        }
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transactionId": "tx-1",
                "results": [{"id": "prod-1", "operation": "update"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ContentClient::new(&config(&server, Some("sk-write-token"))).unwrap();
        client
            .append_review(&ProductId::new("prod-1"), &review())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_append_review_requires_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = ContentClient::new(&config(&server, None)).unwrap();
        let err = client
            .append_review(&ProductId::new("prod-1"), &review())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::MissingToken));
    }
}
