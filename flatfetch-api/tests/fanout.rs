//! Integration tests for multi-endpoint fan-out against mock HTTP servers.

use std::time::Duration;

use flatfetch_api::{Endpoint, EndpointCollection, ExtractOptions};
use flatfetch_client::HttpClient;
use flatfetch_core::{HttpRequest, JsonSchema};
use serde::Deserialize;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn symbol_schema() -> JsonSchema {
    JsonSchema::new().field("symbol", "s")
}

async fn mount_records(server: &MockServer, route: &str, body: Value, delay: Option<Duration>) {
    let mut template = ResponseTemplate::new(200).set_body_json(body);
    if let Some(delay) = delay {
        template = template.set_delay(delay);
    }
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

fn records_endpoint(base: &str, route: &str) -> Endpoint {
    Endpoint::new(HttpRequest::get(format!("{base}{route}")))
        .with_json_path("result")
        .with_json_schema(symbol_schema())
}

/// An endpoint whose fetch fails at the transport level.
fn unreachable_endpoint() -> Endpoint {
    Endpoint::new(HttpRequest::get("http://127.0.0.1:9/records"))
        .with_json_path("result")
        .with_json_schema(symbol_schema())
}

fn symbols(records: &[flatfetch_core::Record]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            record
                .get("symbol")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[test]
fn sequential_extraction_is_ordered_across_endpoints() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        mount_records(
            &server,
            "/a",
            json!({"result": [{"s": "a1"}, {"s": "a2"}]}),
            None,
        )
        .await;
        mount_records(&server, "/b", json!({"result": [{"s": "b1"}]}), None).await;
        server
    });

    let mut collection = EndpointCollection::new();
    collection.insert(records_endpoint(&server.uri(), "/a"));
    collection.insert(records_endpoint(&server.uri(), "/b"));

    let client = HttpClient::new().unwrap();
    let records: Vec<_> = collection
        .extract(&client, &ExtractOptions::new())
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert_eq!(symbols(&records), vec!["a1", "a2", "b1"]);
}

#[test]
fn sequential_failure_preserves_earlier_records() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let server = runtime.block_on(async {
        let server = MockServer::start().await;
        mount_records(
            &server,
            "/a",
            json!({"result": [{"s": "a1"}, {"s": "a2"}]}),
            None,
        )
        .await;
        server
    });

    let mut collection = EndpointCollection::new();
    collection.insert(records_endpoint(&server.uri(), "/a"));
    collection.insert(unreachable_endpoint());

    let client = HttpClient::new().unwrap();
    let options = ExtractOptions::new();
    let mut items = collection.extract(&client, &options);

    // Records from the first endpoint are already delivered
    assert_eq!(
        items.next().unwrap().unwrap().get("symbol"),
        Some(&json!("a1"))
    );
    assert_eq!(
        items.next().unwrap().unwrap().get("symbol"),
        Some(&json!("a2"))
    );
    // The failing endpoint yields exactly one error, then the sequence ends
    assert!(items.next().unwrap().is_err());
    assert!(items.next().is_none());
}

#[tokio::test]
async fn concurrent_extraction_keeps_collection_order() {
    let server = MockServer::start().await;
    // The first endpoint finishes last; order must not change
    mount_records(
        &server,
        "/a",
        json!({"result": [{"s": "a1"}, {"s": "a2"}]}),
        Some(Duration::from_millis(300)),
    )
    .await;
    mount_records(&server, "/b", json!({"result": [{"s": "b1"}]}), None).await;

    let mut collection = EndpointCollection::new();
    collection.insert(records_endpoint(&server.uri(), "/a"));
    collection.insert(records_endpoint(&server.uri(), "/b"));

    let client = HttpClient::new().unwrap();
    let records = collection
        .extract_concurrent(&client, &ExtractOptions::new())
        .await
        .unwrap();

    assert_eq!(symbols(&records), vec!["a1", "a2", "b1"]);
}

#[tokio::test]
async fn concurrent_failure_yields_no_records() {
    let server = MockServer::start().await;
    mount_records(&server, "/a", json!({"result": [{"s": "a1"}]}), None).await;

    let mut collection = EndpointCollection::new();
    collection.insert(records_endpoint(&server.uri(), "/a"));
    collection.insert(unreachable_endpoint());

    let client = HttpClient::new().unwrap();
    let result = collection
        .extract_concurrent(&client, &ExtractOptions::new())
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn with_schema_pairs_records_with_their_schema() {
    let server = MockServer::start().await;
    mount_records(&server, "/a", json!({"result": [{"s": "a1"}]}), None).await;
    mount_records(&server, "/b", json!({"result": [{"s": "b1"}]}), None).await;

    let mut collection = EndpointCollection::new();
    collection.insert(records_endpoint(&server.uri(), "/a"));
    collection.insert(
        Endpoint::new(HttpRequest::get(format!("{}/b", server.uri())))
            .with_json_path("result")
            .with_json_schema(JsonSchema::new().field("symbol", "s").field("venue", "v")),
    );

    let client = HttpClient::new().unwrap();
    let options = ExtractOptions::new();
    let paired = collection
        .extract_with_schema_concurrent(&client, &options)
        .await
        .unwrap();

    assert_eq!(paired.len(), 2);
    // Heterogeneous schemas stay associated with their endpoint's records
    assert_eq!(paired[0].1.map(JsonSchema::len), Some(1));
    assert_eq!(paired[1].1.map(JsonSchema::len), Some(2));
}

#[tokio::test]
async fn call_time_override_applies_to_every_endpoint() {
    let server = MockServer::start().await;
    mount_records(
        &server,
        "/a",
        json!({"result": [], "alt": [{"s": "x1"}]}),
        None,
    )
    .await;

    let mut collection = EndpointCollection::new();
    collection.insert(records_endpoint(&server.uri(), "/a"));

    let client = HttpClient::new().unwrap();
    let options = ExtractOptions::new().json_path("alt");
    let records = collection
        .extract_concurrent(&client, &options)
        .await
        .unwrap();

    assert_eq!(symbols(&records), vec!["x1"]);
}

#[tokio::test]
async fn typed_extraction_materializes_instances() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Ticker {
        symbol: String,
        price: Option<f64>,
    }

    let server = MockServer::start().await;
    mount_records(
        &server,
        "/a",
        json!({"result": [{"s": "BTCUSD", "p": 42000.5}, {"s": "ETHUSD"}]}),
        None,
    )
    .await;

    let mut collection = EndpointCollection::new();
    collection.insert(
        Endpoint::new(HttpRequest::get(format!("{}/a", server.uri())))
            .with_json_path("result")
            .with_json_schema(JsonSchema::new().field("symbol", "s").field("price", "p")),
    );

    let client = HttpClient::new().unwrap();
    let tickers: Vec<Ticker> = collection
        .extract_as_concurrent(&client, &ExtractOptions::new())
        .await
        .unwrap();

    assert_eq!(
        tickers,
        vec![
            Ticker {
                symbol: "BTCUSD".to_string(),
                price: Some(42000.5)
            },
            Ticker {
                symbol: "ETHUSD".to_string(),
                price: None
            },
        ]
    );
}

#[tokio::test]
async fn typed_extraction_propagates_incompatible_records() {
    #[derive(Debug, Deserialize)]
    struct Ticker {
        #[allow(dead_code)]
        symbol: String,
    }

    let server = MockServer::start().await;
    mount_records(&server, "/a", json!({"result": [{"other": 1}]}), None).await;

    let mut collection = EndpointCollection::new();
    collection.insert(
        Endpoint::new(HttpRequest::get(format!("{}/a", server.uri()))).with_json_path("result"),
    );

    let client = HttpClient::new().unwrap();
    let result: Result<Vec<Ticker>, _> = collection
        .extract_as_concurrent(&client, &ExtractOptions::new())
        .await;

    assert!(matches!(
        result,
        Err(flatfetch_api::ApiError::Instance { .. })
    ));
}
