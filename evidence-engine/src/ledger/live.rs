//! Constellation network ledger.
//!
//! Submits data application messages to an L1 node over HTTP:
//! `<l1_url>/data-application/<metagraph_id>/data`, or `<l1_url>/data`
//! when no metagraph is configured.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use evidence_core::{Pool, Shard};

use super::traits::*;
use crate::config::LedgerConfig;

/// Live ledger client.
pub struct LiveLedger {
    client: Client,
    l0_url: String,
    l1_url: String,
    metagraph_id: Option<String>,
}

impl LiveLedger {
    /// Create a client from ledger configuration.
    pub fn new(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| LedgerError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        let metagraph_id = Some(config.metagraph_id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(Self {
            client,
            l0_url: config.l0_url.trim_end_matches('/').to_string(),
            l1_url: config.l1_url.trim_end_matches('/').to_string(),
            metagraph_id,
        })
    }

    /// Build the submission URL.
    fn data_url(&self) -> String {
        match &self.metagraph_id {
            Some(id) => format!("{}/data-application/{}/data", self.l1_url, id),
            None => format!("{}/data", self.l1_url),
        }
    }

    async fn submit(&self, message: LedgerMessage) -> Result<String, LedgerError> {
        let body = SubmitRequest {
            value: &message,
            proofs: Vec::new(),
        };

        debug!(url = %self.data_url(), pool_id = %message.pool_id(), "Submitting to ledger");

        let response = self
            .client
            .post(self.data_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, pool_id = %message.pool_id(), "Ledger rejected submission");
            return Err(LedgerError::RequestFailed(format!("HTTP {}: {}", status, text)));
        }

        let submitted: SubmitResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))?;

        submitted.into_tx_id()
    }
}

/// Data submission envelope.
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    value: &'a LedgerMessage,
    /// Signature proofs; the node signs with its own key
    proofs: Vec<serde_json::Value>,
}

/// Data submission response.
#[derive(Debug, Default, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default, rename = "txId")]
    tx_id: Option<String>,
}

impl SubmitResponse {
    fn into_tx_id(self) -> Result<String, LedgerError> {
        self.hash
            .or(self.tx_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LedgerError::InvalidResponse("No transaction hash in response".to_string()))
    }
}

#[async_trait]
impl LedgerClient for LiveLedger {
    fn mode(&self) -> LedgerMode {
        LedgerMode::Live
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/node/info", self.l0_url);
        self.client
            .get(&url)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn anchor_pool(&self, pool: &Pool) -> Result<String, LedgerError> {
        self.submit(LedgerMessage::create_pool(pool)).await
    }

    async fn anchor_shard(&self, shard: &Shard) -> Result<String, LedgerError> {
        self.submit(LedgerMessage::add_shard(shard)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn config(metagraph_id: &str) -> LedgerConfig {
        LedgerConfig {
            mode: LedgerMode::Live,
            l1_url: "https://l1.example.org/".to_string(),
            metagraph_id: metagraph_id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_data_url_with_metagraph() {
        let ledger = LiveLedger::new(&config("DAG8xyz")).unwrap();
        assert_eq!(
            ledger.data_url(),
            "https://l1.example.org/data-application/DAG8xyz/data"
        );
        assert_eq!(ledger.mode(), LedgerMode::Live);
    }

    #[test]
    fn test_data_url_without_metagraph() {
        let ledger = LiveLedger::new(&config("  ")).unwrap();
        assert_eq!(ledger.data_url(), "https://l1.example.org/data");
    }

    #[test]
    fn test_response_parsing() {
        let by_hash: SubmitResponse = serde_json::from_str(r#"{"hash":"abc"}"#).unwrap();
        assert_eq!(by_hash.into_tx_id().unwrap(), "abc");

        let by_tx: SubmitResponse = serde_json::from_str(r#"{"txId":"def"}"#).unwrap();
        assert_eq!(by_tx.into_tx_id().unwrap(), "def");

        let empty: SubmitResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(empty.into_tx_id(), Err(LedgerError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_network_error() {
        let mut cfg = config("");
        cfg.l1_url = "http://127.0.0.1:9".to_string();
        cfg.l0_url = "http://127.0.0.1:9".to_string();
        cfg.request_timeout_ms = 500;
        let ledger = LiveLedger::new(&cfg).unwrap();

        assert!(!ledger.is_available().await);
        let err = ledger
            .anchor_pool(&Pool::new("pool-1", "Acme", 75, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NetworkError(_)));
    }

    /// Serve one canned HTTP response; the handle yields the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (format!("http://{addr}"), handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn local_config(url: &str, metagraph_id: &str) -> LedgerConfig {
        LedgerConfig {
            mode: LedgerMode::Live,
            l0_url: url.to_string(),
            l1_url: url.to_string(),
            metagraph_id: metagraph_id.to_string(),
            request_timeout_ms: 5_000,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_submission_returns_hash() {
        let (url, server) = serve_once("200 OK", r#"{"hash":"x"}"#).await;
        let ledger = LiveLedger::new(&local_config(&url, "DAG8xyz")).unwrap();
        let pool = Pool::new("pool-1", "Acme", 75, 1_000).with_creator("alice");

        let tx = ledger.anchor_pool(&pool).await.unwrap();
        assert_eq!(tx, "x");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /data-application/DAG8xyz/data HTTP/1.1"));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let envelope: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(envelope["value"]["CreatePool"]["poolId"], "pool-1");
        assert_eq!(envelope["proofs"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_http_error_is_request_failed() {
        let (url, server) = serve_once("500 Internal Server Error", "boom").await;
        let ledger = LiveLedger::new(&local_config(&url, "")).unwrap();

        let err = ledger
            .anchor_pool(&Pool::new("pool-1", "Acme", 75, 0))
            .await
            .unwrap_err();
        match err {
            LedgerError::RequestFailed(message) => {
                assert!(message.contains("500"));
                assert!(message.contains("boom"));
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /data HTTP/1.1"));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_invalid_response() {
        let (url, server) = serve_once("200 OK", "not json").await;
        let ledger = LiveLedger::new(&local_config(&url, "")).unwrap();

        let err = ledger
            .anchor_pool(&Pool::new("pool-1", "Acme", 75, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidResponse(_)));
        server.await.unwrap();
    }
}
