use std::sync::Arc;

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use binance_stream_client::StreamError;
use binance_stream_client::auth::StaticCredentials;
use binance_stream_client::rest::{ListenKeyClient, ListenKeyService};
use binance_stream_client::types::UserStreamKind;

const LISTEN_KEY: &str = "pqia91ma19a5s61cv6a81va65sdf19v8a65a1a5s61cv6a81va65sdf19v8a65a1";

fn build_client(server: &MockServer, kind: UserStreamKind) -> ListenKeyClient {
    ListenKeyClient::builder(kind)
        .base_url(server.uri())
        .credentials(Arc::new(StaticCredentials::new("test_key")))
        .max_retries(0)
        .build()
}

#[tokio::test]
async fn test_create_spot_listen_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/userDataStream"))
        .and(header("X-MBX-APIKEY", "test_key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "listenKey": LISTEN_KEY })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, UserStreamKind::Spot);
    let listen_key = client.create_listen_key().await.unwrap();

    assert_eq!(listen_key, LISTEN_KEY);
}

#[tokio::test]
async fn test_keep_alive_margin_listen_key() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/sapi/v1/userDataStream"))
        .and(query_param("listenKey", LISTEN_KEY))
        .and(header("X-MBX-APIKEY", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, UserStreamKind::Margin);
    client.keep_alive_listen_key(LISTEN_KEY).await.unwrap();
}

#[tokio::test]
async fn test_close_futures_listen_key() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/fapi/v1/listenKey"))
        .and(query_param("listenKey", LISTEN_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, UserStreamKind::Futures);
    client.release(LISTEN_KEY).await.unwrap();
}

#[tokio::test]
async fn test_service_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/fapi/v1/listenKey"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "listenKey": LISTEN_KEY })),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fapi/v1/listenKey"))
        .and(query_param("listenKey", LISTEN_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_client(&server, UserStreamKind::Futures);
    let listen_key = client.acquire().await.unwrap();
    client.renew(&listen_key).await.unwrap();
}

#[tokio::test]
async fn test_unknown_listen_key_error() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/v3/userDataStream"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": -1125,
            "msg": "This listenKey does not exist."
        })))
        .mount(&server)
        .await;

    let client = build_client(&server, UserStreamKind::Spot);
    let result = client.keep_alive_listen_key("expired").await;

    match result {
        Err(StreamError::Api(error)) => {
            assert!(error.is_unknown_listen_key());
            assert_eq!(error.msg, "This listenKey does not exist.");
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/userDataStream"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let client = build_client(&server, UserStreamKind::Spot);
    let result = client.create_listen_key().await;

    match result {
        Err(StreamError::InvalidResponse(message)) => {
            assert!(message.contains("403"));
            assert!(message.contains("Forbidden"));
        }
        other => panic!("expected an invalid response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/userDataStream"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "key": 1 })))
        .mount(&server)
        .await;

    let client = build_client(&server, UserStreamKind::Spot);
    assert!(matches!(
        client.create_listen_key().await,
        Err(StreamError::InvalidResponse(_))
    ));
}
