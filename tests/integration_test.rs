//! Integration tests for the Chert SDK

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use chert_sdk::rpc::RpcRequest;
use chert_sdk::signer::verify_signature;
use chert_sdk::transaction::UnsignedTransaction;
use chert_sdk::{
    ChertClient, ClientConfig, Context, Error, Network, RpcTransport, TransactionRequest,
    TransactionStatus,
};

/// In-memory node answering from per-method queues.
#[derive(Default)]
struct MockNode {
    responses: Mutex<HashMap<String, VecDeque<Value>>>,
    requests: Mutex<Vec<RpcRequest>>,
}

impl MockNode {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn respond(&self, method: &str, result: Value) {
        self.enqueue(method, json!({ "result": result }));
    }

    fn fail(&self, method: &str, error: Value) {
        self.enqueue(method, json!({ "error": error }));
    }

    fn enqueue(&self, method: &str, outcome: Value) {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(outcome);
    }

    fn requests(&self) -> Vec<RpcRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn client(self: &Arc<Self>, network: Network) -> ChertClient {
        ChertClient::with_transport(ClientConfig::default().with_network(network), self.clone())
            .unwrap()
    }
}

#[async_trait]
impl RpcTransport for MockNode {
    async fn post(&self, body: Vec<u8>) -> chert_sdk::Result<Vec<u8>> {
        let request: RpcRequest = serde_json::from_slice(&body).unwrap();
        let outcome = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&request.method)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| json!({"error": {"code": -32601, "message": "method not found"}}));
        let id = request.id;
        self.requests.lock().unwrap().push(request);

        let mut envelope = json!({ "jsonrpc": "2.0", "id": id });
        if let Value::Object(fields) = outcome {
            for (k, v) in fields {
                envelope[k] = v;
            }
        }
        Ok(serde_json::to_vec(&envelope).unwrap())
    }
}

fn tx_snapshot(hash: &str, status: &str) -> Value {
    json!({
        "hash": hash,
        "from": "tchert_sender",
        "to": "tchert_recipient",
        "amount": "100.0",
        "fee": "0.1",
        "block_height": if status == "confirmed" { json!(1201) } else { Value::Null },
        "status": status,
        "timestamp": "2024-05-01T12:00:00Z",
        "nonce": 3
    })
}

#[tokio::test(start_paused = true)]
async fn test_send_and_confirm_transfer() {
    let node = MockNode::new();
    node.respond("sendTransaction", json!({"hash": "0xabc"}));
    node.fail("getTransaction", json!({"code": -32004, "message": "transaction not found"}));
    node.respond("getTransaction", tx_snapshot("0xabc", "pending"));
    node.respond("getTransaction", tx_snapshot("0xabc", "confirmed"));

    let client = node.client(Network::Testnet);
    let wallet = client.wallet();
    let account = wallet.create_account().unwrap();
    let ctx = Context::background();

    let request = TransactionRequest::new("tchert_recipient", "100.0", "0.1")
        .with_memo("rent")
        .with_nonce(3);
    let hash = wallet.send_transaction(&ctx, &request, &account).await.unwrap();
    assert_eq!(hash, "0xabc");

    let tx = wallet.wait_for_transaction(&ctx, &hash, None).await.unwrap();
    assert_eq!(tx.status, TransactionStatus::Confirmed);
    assert_eq!(tx.block_height, Some(1201));

    let requests = node.requests();
    let methods: Vec<&str> = requests.iter().map(|r| r.method.as_str()).collect();
    assert_eq!(
        methods,
        ["sendTransaction", "getTransaction", "getTransaction", "getTransaction"]
    );

    // Ids are unique per call
    let mut ids: Vec<u64> = requests.iter().map(|r| r.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), requests.len());

    // The submitted signature verifies against the account's public key
    let sent = requests[0].params.clone().unwrap();
    let tx_json = &sent[0];
    assert_eq!(tx_json["sender"], account.address.as_str());
    assert_eq!(tx_json["recipient"], "tchert_recipient");
    assert_eq!(tx_json["nonce"], 3);
    assert_eq!(tx_json["memo"], "rent");
    let message = UnsignedTransaction::new(account.address.clone(), request)
        .signing_bytes()
        .unwrap();
    let signature = tx_json["signature"].as_str().unwrap();
    assert!(verify_signature(&account.public_key, &message, signature).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_failed_transaction_is_reported() {
    let node = MockNode::new();
    node.respond("getTransaction", tx_snapshot("0xbad", "rejected"));

    let client = node.client(Network::Testnet);
    let err = client
        .wallet()
        .wait_for_transaction(&Context::background(), "0xbad", Some(Duration::from_secs(10)))
        .await
        .unwrap_err();
    match err {
        Error::TransactionFailed { hash, status } => {
            assert_eq!(hash, "0xbad");
            assert_eq!(status, TransactionStatus::Rejected);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_watch_only_account_cannot_send() {
    let node = MockNode::new();
    let client = node.client(Network::Mainnet);
    let signing = client.wallet().create_account().unwrap();
    let watch = client
        .wallet()
        .create_watch_only_account(&signing.public_key)
        .unwrap();
    assert_eq!(watch.address, signing.address);
    assert!(watch.is_watch_only());

    let request = TransactionRequest::new("chert_recipient", "1", "0.1");
    let err = client
        .wallet()
        .send_transaction(&Context::background(), &request, &watch)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingPrivateKey));
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn test_cancelled_context_sends_nothing() {
    let node = MockNode::new();
    let client = node.client(Network::Mainnet);
    let ctx = Context::background();
    ctx.cancel();

    let err = client.get_network_status(&ctx).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert!(err.is_cancellation());
    assert!(node.requests().is_empty());
}

#[tokio::test]
async fn test_node_error_passes_through() {
    let node = MockNode::new();
    node.fail(
        "getBalance",
        json!({"code": -32602, "message": "invalid address", "data": {"address": "nope"}}),
    );
    let client = node.client(Network::Mainnet);

    let err = client
        .wallet()
        .get_balance(&Context::background(), "nope")
        .await
        .unwrap_err();
    assert_eq!(err.rpc_code(), Some(-32602));
    match err {
        Error::Rpc(rpc) => {
            assert_eq!(rpc.message, "invalid address");
            assert_eq!(rpc.data, Some(json!({"address": "nope"})));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_managers_share_one_transport() {
    let node = MockNode::new();
    node.respond("getValidators", json!({"validators": []}));
    node.respond("governance_getProposals", json!({"proposals": []}));
    let client = node.client(Network::Devnet);
    let ctx = Context::background();

    assert!(client.staking().get_validators(&ctx).await.unwrap().is_empty());
    assert!(client.governance().get_proposals(&ctx, 3).await.unwrap().is_empty());

    let requests = node.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].id < requests[1].id);
}

/// Serve a single HTTP exchange on localhost and hand back the raw request.
async fn serve_once(status: &'static str, body: String) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
    });

    (format!("http://{}", addr), rx)
}

fn request_body(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or_default()
}

#[tokio::test]
async fn test_http_rpc_envelope_and_headers() {
    let (endpoint, seen) = serve_once(
        "200 OK",
        json!({"jsonrpc": "2.0", "id": 1, "result": {"available": "5", "pending": "1", "total": "6"}})
            .to_string(),
    )
    .await;

    let config = ClientConfig::new(endpoint)
        .with_api_key("secret-key")
        .with_header("X-Trace", "abc");
    let client = ChertClient::new(config).unwrap();

    let balance = client
        .wallet()
        .get_balance(&Context::background(), "chert_addr")
        .await
        .unwrap();
    assert_eq!(balance.total, "6");

    let raw = seen.await.unwrap();
    let lower = raw.to_lowercase();
    assert!(lower.starts_with("post "));
    assert!(lower.contains("authorization: bearer secret-key"));
    assert!(lower.contains("x-trace: abc"));
    assert!(lower.contains("content-type: application/json"));
    assert!(lower.contains("user-agent: chert-sdk-rust/"));

    let envelope: Value = serde_json::from_str(request_body(&raw)).unwrap();
    assert_eq!(envelope["jsonrpc"], "2.0");
    assert_eq!(envelope["method"], "getBalance");
    assert_eq!(envelope["params"], json!(["chert_addr"]));
    assert!(envelope["id"].is_u64());
}

#[tokio::test]
async fn test_http_error_status_without_envelope() {
    let (endpoint, _seen) = serve_once("502 Bad Gateway", "upstream down".to_string()).await;
    let client = ChertClient::new(ClientConfig::new(endpoint)).unwrap();

    let err = client
        .get_network_status(&Context::background())
        .await
        .unwrap_err();
    match err {
        Error::HttpStatus { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "upstream down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rest_request_unwraps_data() {
    let (endpoint, seen) = serve_once(
        "200 OK",
        json!({"success": true, "data": {"version": "1.4.0"}}).to_string(),
    )
    .await;
    let client = ChertClient::new(ClientConfig::new(endpoint)).unwrap();

    let info: Value = client
        .request::<Value, Value>(&Context::background(), reqwest::Method::GET, "/v1/info", None)
        .await
        .unwrap();
    assert_eq!(info["version"], "1.4.0");

    let raw = seen.await.unwrap().to_lowercase();
    assert!(raw.starts_with("get /v1/info "));
    assert!(raw.contains("accept: application/json"));
}

#[tokio::test]
async fn test_rest_request_reports_api_error() {
    let (endpoint, _seen) = serve_once(
        "200 OK",
        json!({"success": false, "error": {"code": "rate_limited", "message": "slow down"}})
            .to_string(),
    )
    .await;
    let client = ChertClient::new(ClientConfig::new(endpoint)).unwrap();

    let body = json!({"name": "probe"});
    let err = client
        .request::<Value, Value>(
            &Context::background(),
            reqwest::Method::POST,
            "/v1/probe",
            Some(&body),
        )
        .await
        .unwrap_err();
    match err {
        Error::Api(api) => {
            assert_eq!(api.code, "rate_limited");
            assert_eq!(api.message, "slow down");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_endpoint_rejected() {
    let err = ChertClient::new(ClientConfig::new("ftp://example.com")).err().unwrap();
    assert!(matches!(err, Error::InvalidParameter(_)));
}
