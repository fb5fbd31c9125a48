//! Integration tests for `SerperClient` against a `wiremock` server.

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use grocer_discovery::{HttpSettings, SerperClient, ShoppingSearch, UpstreamError};

fn test_client(base_url: &str, max_retries: u32) -> SerperClient {
    let settings = HttpSettings {
        timeout_secs: 5,
        user_agent: "grocer-test/0.1".to_owned(),
        max_retries,
        backoff_base_ms: 0,
    };
    SerperClient::with_base_url(base_url, "serper-key", &settings)
        .expect("failed to build test SerperClient")
}

#[tokio::test]
async fn search_maps_shopping_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/shopping"))
        .and(header("x-api-key", "serper-key"))
        .and(body_json(json!({
            "q": "milk Target",
            "gl": "us",
            "hl": "en",
            "num": 20
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "searchParameters": { "q": "milk Target", "type": "shopping" },
            "shopping": [
                {
                    "title": "Good & Gather Organic 2% Reduced Fat Milk - 1 gal",
                    "source": "Target",
                    "link": "https://www.target.com/p/good-gather-organic-2-milk/-/A-1",
                    "price": "$9.19",
                    "imageUrl": "https://img.example/milk.jpg",
                    "rating": 4.6,
                    "ratingCount": 812,
                    "position": 1
                },
                {
                    "title": "Listing without a link",
                    "price": "$1.00"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let result = client.search("milk Target").await;

    assert!(result.is_ok(), "expected Ok, got: {result:?}");
    let listings = result.unwrap();
    assert_eq!(listings.len(), 1, "listing without link is dropped");

    let milk = &listings[0];
    assert_eq!(milk.title, "Good & Gather Organic 2% Reduced Fat Milk - 1 gal");
    assert_eq!(
        milk.url,
        "https://www.target.com/p/good-gather-organic-2-milk/-/A-1"
    );
    assert_eq!(milk.image_url.as_deref(), Some("https://img.example/milk.jpg"));
    assert_eq!(milk.rating, Some(4.6));
    assert_eq!(milk.reviews_count, Some(812));
    assert_eq!(milk.price, Some(Decimal::new(919, 2)));
    assert_eq!(milk.merchant.as_deref(), Some("Target"));
}

#[tokio::test]
async fn missing_shopping_array_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "searchParameters": { "q": "unobtainium" }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let listings = client.search("unobtainium").await;

    assert!(listings.is_ok(), "expected Ok, got: {listings:?}");
    assert!(listings.unwrap().is_empty());
}

#[tokio::test]
async fn forbidden_maps_to_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/shopping"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let result = client.search("milk").await;

    assert!(
        matches!(
            result,
            Err(UpstreamError::Unauthorized {
                service: "shopping search"
            })
        ),
        "expected Unauthorized, got: {result:?}"
    );
}

#[tokio::test]
async fn retries_after_503_and_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/shopping"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "shopping": [] })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 1);
    let result = client.search("milk").await;

    assert!(result.is_ok(), "expected Ok after 503 retry, got: {result:?}");
}

#[tokio::test]
async fn slow_server_times_out_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/shopping"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "shopping": [] }))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let settings = HttpSettings {
        timeout_secs: 1,
        user_agent: "grocer-test/0.1".to_owned(),
        max_retries: 2,
        backoff_base_ms: 0,
    };
    let client = SerperClient::with_base_url(&server.uri(), "serper-key", &settings)
        .expect("failed to build test SerperClient");
    let result = client.search("milk").await;

    assert!(
        matches!(result, Err(UpstreamError::Timeout { .. })),
        "expected Timeout, got: {result:?}"
    );
}
