//! Client behaviour against a local mock node.

use axum::Router;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Json;
use dda_rpc::{ConnectFailure, RpcClient, RpcConfig, RpcError, SearchOptions, Verbosity};
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(url: &str) -> RpcClient {
    RpcClient::new(RpcConfig::new(url).with_credentials("user", "pass")).unwrap()
}

/// A node that answers every method from a fixed table.
fn node(answers: Value) -> Router {
    Router::new().route(
        "/",
        post(move |headers: HeaderMap, Json(req): Json<Value>| {
            let answers = answers.clone();
            async move {
                if !headers.contains_key("authorization") {
                    return (StatusCode::UNAUTHORIZED, String::new());
                }
                let method = req["method"].as_str().unwrap_or_default();
                let result = answers.get(method).cloned().unwrap_or(Value::Null);
                let body = json!({ "result": result, "error": null, "id": req["id"] });
                (StatusCode::OK, body.to_string())
            }
        }),
    )
}

fn fixed(status: StatusCode, body: &'static str) -> Router {
    Router::new().route("/", post(move || async move { (status, body) }))
}

#[tokio::test]
async fn block_count_ok() {
    let url = spawn(node(json!({ "getblockcount": 42 }))).await;
    assert_eq!(client(&url).get_block_count().await.unwrap(), 42);
    assert_eq!(client(&url).check_connection().await.unwrap(), 42);
}

#[tokio::test]
async fn unauthorized_maps_to_auth_failed() {
    let url = spawn(fixed(StatusCode::UNAUTHORIZED, "")).await;
    let err = client(&url).get_block_count().await.unwrap_err();
    assert!(matches!(err, RpcError::AuthFailed));
}

#[tokio::test]
async fn unavailable_maps_to_busy() {
    let url = spawn(fixed(StatusCode::SERVICE_UNAVAILABLE, "busy")).await;
    let err = client(&url).get_block_count().await.unwrap_err();
    assert!(matches!(err, RpcError::Busy));
}

#[tokio::test]
async fn rpc_error_object_maps_to_node() {
    let url = spawn(fixed(
        StatusCode::OK,
        r#"{"result":null,"error":{"code":-5,"message":"No information available about address"},"id":1}"#,
    ))
    .await;
    let err = client(&url)
        .search_raw_transactions("Dxyz", SearchOptions::first(500))
        .await
        .unwrap_err();
    assert!(err.is_unknown_address());
    assert!(matches!(err, RpcError::Node { code: Some(-5), .. }));
}

#[tokio::test]
async fn error_envelope_on_500_maps_to_node() {
    let url = spawn(fixed(
        StatusCode::INTERNAL_SERVER_ERROR,
        r#"{"result":null,"error":{"code":-22,"message":"TX decode failed"},"id":1}"#,
    ))
    .await;
    let err = client(&url).send_raw_transaction("00").await.unwrap_err();
    assert_eq!(err.to_string(), "TX decode failed");
}

#[tokio::test]
async fn other_status_maps_to_http() {
    let url = spawn(fixed(StatusCode::BAD_GATEWAY, "upstream down")).await;
    let err = client(&url).get_block_count().await.unwrap_err();
    assert!(matches!(err, RpcError::Http { status: 502, ref body } if body == "upstream down"));
}

#[tokio::test]
async fn malformed_json_maps_to_invalid_response() {
    let url = spawn(fixed(StatusCode::OK, "<html>not json")).await;
    let err = client(&url).get_block_count().await.unwrap_err();
    assert!(matches!(err, RpcError::InvalidResponse(_)));
}

#[tokio::test]
async fn wrong_result_shape_maps_to_invalid_response() {
    let url = spawn(node(json!({ "getblockcount": "many" }))).await;
    let err = client(&url).get_block_count().await.unwrap_err();
    assert!(matches!(err, RpcError::InvalidResponse(_)));
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(&format!("http://{addr}"))
        .get_block_count()
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Unreachable(ConnectFailure::Refused)), "got {err:?}");
}

#[tokio::test]
async fn missing_credentials_skips_the_call() {
    let rpc = RpcClient::new(RpcConfig::new("http://127.0.0.1:1")).unwrap();
    assert!(matches!(
        rpc.check_connection().await.unwrap_err(),
        RpcError::MissingCredentials
    ));
}

#[tokio::test]
async fn search_sends_paging_params() {
    let app = Router::new().route(
        "/",
        post(|Json(req): Json<Value>| async move {
            assert_eq!(req["jsonrpc"], "1.0");
            assert_eq!(req["params"], json!(["Daddr", 1, 10, 500, 0, false]));
            Json(json!({ "result": null, "error": null, "id": 1 }))
        }),
    );
    let url = spawn(app).await;
    let txs = client(&url)
        .search_raw_transactions("Daddr", SearchOptions { skip: 10, count: 500 })
        .await
        .unwrap();
    assert!(txs.is_empty());
}

#[tokio::test]
async fn full_block_decodes_rawtx() {
    let url = spawn(node(json!({
        "getblock": {
            "hash": "00ab", "height": 3, "time": 1_700_000_000,
            "rawtx": [{
                "txid": "cb",
                "vin": [{ "coinbase": "03", "sequence": 0 }],
                "vout": [{ "value": 12.5, "n": 0, "scriptPubKey": { "hex": "" } }]
            }]
        }
    })))
    .await;
    let block = client(&url).get_block("00ab", Verbosity::Full).await.unwrap();
    assert_eq!(block.tx_count(), Some(1));
}
