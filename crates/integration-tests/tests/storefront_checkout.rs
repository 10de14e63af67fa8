//! End-to-end tests for checkout and payment verification.

#![allow(clippy::unwrap_used)]

use cartwheel_integration_tests::{TestContext, cart_item, customer_info};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mock_session_create(ctx: &TestContext, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1",
            "payment_status": "unpaid"
        })))
        .expect(expected_calls)
        .mount(&ctx.stripe)
        .await;
}

async fn mock_session_status(ctx: &TestContext, id: &str, status: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/checkout/sessions/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "amount_total": 2000,
            "currency": "usd",
            "customer_details": {"email": "ada@example.com"},
            "payment_status": status
        })))
        .expect(1)
        .mount(&ctx.stripe)
        .await;
}

#[tokio::test]
async fn test_empty_cart_never_calls_stripe() {
    let ctx = TestContext::new().await;
    mock_session_create(&ctx, 0).await;

    let resp = ctx
        .post_json(
            "/api/checkout-session",
            &json!({"customerInfo": customer_info()}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Your cart is empty");
}

#[tokio::test]
async fn test_missing_fields_never_call_stripe() {
    let ctx = TestContext::new().await;
    mock_session_create(&ctx, 0).await;
    ctx.add_to_cart(&cart_item("a", 10.0, 5)).await;

    let mut info = customer_info();
    info["phone"] = json!("  ");
    info["zipCode"] = json!("");

    let resp = ctx
        .post_json("/api/checkout-session", &json!({"customerInfo": info}))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["error"],
        "Please fill in all required fields: phone, zipCode"
    );
}

#[tokio::test]
async fn test_form_checkout_redirects_once() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("unit_amount%5D=1999"))
        .and(body_string_contains("customer_email=ada%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1"
        })))
        .expect(1)
        .mount(&ctx.stripe)
        .await;
    ctx.add_to_cart(&cart_item("a", 19.99, 5)).await;

    let resp = ctx
        .client
        .post(ctx.url("/checkout"))
        .form(&[
            ("email", "ada@example.com"),
            ("name", "Ada Lovelace"),
            ("phone", "555-0100"),
            ("address", "1 Analytical Way"),
            ("city", "London"),
            ("state", "LDN"),
            ("zipCode", "12345"),
        ])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()["location"],
        "https://checkout.stripe.com/c/pay/cs_test_1"
    );

    // The cart survives until payment is verified
    assert_eq!(ctx.cart().await["itemCount"], 1);
}

#[tokio::test]
async fn test_json_checkout_returns_session() {
    let ctx = TestContext::new().await;
    mock_session_create(&ctx, 1).await;
    ctx.add_to_cart(&cart_item("a", 10.0, 5)).await;

    let resp = ctx
        .post_json(
            "/api/checkout-session",
            &json!({"customerInfo": customer_info()}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["sessionId"], "cs_test_1");
    assert_eq!(body["url"], "https://checkout.stripe.com/c/pay/cs_test_1");
}

#[tokio::test]
async fn test_stripe_failure_is_generic_and_keeps_cart() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {"message": "Your card was declined."}
        })))
        .expect(1)
        .mount(&ctx.stripe)
        .await;
    ctx.add_to_cart(&cart_item("a", 10.0, 5)).await;

    let resp = ctx
        .post_json(
            "/api/checkout-session",
            &json!({"customerInfo": customer_info()}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Failed to process checkout. Please try again.");
    assert_eq!(ctx.cart().await["itemCount"], 1);
}

#[tokio::test]
async fn test_paid_session_clears_cart_only() {
    let ctx = TestContext::new().await;
    mock_session_status(&ctx, "cs_paid", "paid").await;
    ctx.add_to_cart(&cart_item("a", 10.0, 5)).await;
    ctx.post_json("/api/wishlist/add", &cart_item("w", 8.0, 5))
        .await;

    let resp = ctx
        .post_json("/api/verify-payment", &json!({"sessionId": "cs_paid"}))
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["session"]["id"], "cs_paid");
    assert_eq!(body["session"]["amount_total"], 2000);
    assert_eq!(body["session"]["payment_status"], "paid");

    assert_eq!(ctx.cart().await["itemCount"], 0);
    let wishlist: Value = ctx.get("/api/wishlist").await.json().await.unwrap();
    assert_eq!(wishlist["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_success_landing_clears_paid_cart() {
    let ctx = TestContext::new().await;
    mock_session_status(&ctx, "cs_paid", "paid").await;
    ctx.add_to_cart(&cart_item("a", 10.0, 5)).await;

    let body: Value = ctx
        .get("/success?session_id=cs_paid")
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body["success"], true);
    assert_eq!(ctx.cart().await["itemCount"], 0);
}

#[tokio::test]
async fn test_unpaid_session_keeps_cart() {
    let ctx = TestContext::new().await;
    mock_session_status(&ctx, "cs_open", "unpaid").await;
    ctx.add_to_cart(&cart_item("a", 10.0, 5)).await;

    let body: Value = ctx
        .post_json("/api/verify-payment", &json!({"sessionId": "cs_open"}))
        .await
        .json()
        .await
        .unwrap();

    assert_eq!(body, json!({"success": false, "message": "Payment not completed"}));
    assert_eq!(ctx.cart().await["itemCount"], 1);
}

#[tokio::test]
async fn test_verification_error_keeps_cart() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&ctx.stripe)
        .await;
    ctx.add_to_cart(&cart_item("a", 10.0, 5)).await;

    let resp = ctx
        .post_json("/api/verify-payment", &json!({"sessionId": "cs_broken"}))
        .await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(ctx.cart().await["itemCount"], 1);
}

#[tokio::test]
async fn test_missing_session_id() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.stripe)
        .await;

    let resp = ctx.post_json("/api/verify-payment", &json!({})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Session ID is required");

    let body: Value = ctx.get("/success").await.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_session_id_cannot_leave_session_path() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&ctx.stripe)
        .await;
    ctx.add_to_cart(&cart_item("a", 10.0, 5)).await;

    let resp = ctx
        .post_json(
            "/api/verify-payment",
            &json!({"sessionId": "../../v1/customers"}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Invalid session ID");
    assert_eq!(ctx.cart().await["itemCount"], 1);
}
