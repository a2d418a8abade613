use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::abi;
use crate::error::ChainError;

/// JSON-RPC 2.0 client for an Ethereum-compatible endpoint.
pub struct RpcClient {
    url: String,
    client: reqwest::Client,
    request_id: AtomicU64,
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl RpcClient {
    /// Every request is bounded by `timeout`.
    pub fn new(url: &str, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::ChainUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.to_string(),
            client,
            request_id: AtomicU64::new(1),
        })
    }

    pub async fn call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        debug!("RPC request {} -> {}", id, method);

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::ChainUnavailable(format!(
                "RPC HTTP error: {}",
                status
            )));
        }

        let rpc_response: JsonRpcResponse = response.json().await.map_err(|e| {
            ChainError::ChainUnavailable(format!("failed to parse RPC response: {}", e))
        })?;

        if let Some(err) = rpc_response.error {
            return Err(ChainError::ChainUnavailable(format!(
                "RPC error {}: {}",
                err.code, err.message
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| ChainError::ChainUnavailable("RPC response missing result".to_string()))
    }

    /// `eth_call` against `to` at `block`, returning the raw return data.
    pub async fn eth_call(&self, to: &str, data: &[u8], block: &str) -> Result<Vec<u8>, ChainError> {
        let params = serde_json::json!([
            {
                "to": to,
                "data": abi::to_hex_data(data),
            },
            block
        ]);
        let result = self.call("eth_call", params).await?;
        let hex = result.as_str().ok_or_else(|| {
            ChainError::ChainUnavailable(format!("eth_call returned non-string result: {}", result))
        })?;
        abi::from_hex_data(hex)
    }

    pub async fn chain_id(&self) -> Result<u64, ChainError> {
        let result = self.call("eth_chainId", serde_json::json!([])).await?;
        let quantity = result.as_str().ok_or_else(|| {
            ChainError::ChainUnavailable(format!("eth_chainId returned non-string result: {}", result))
        })?;
        parse_quantity(quantity)
    }
}

/// Parse a hex-encoded JSON-RPC quantity such as `0x89`.
fn parse_quantity(s: &str) -> Result<u64, ChainError> {
    let raw = s
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::ChainUnavailable(format!("quantity '{}' missing 0x prefix", s)))?;
    u64::from_str_radix(raw, 16)
        .map_err(|e| ChainError::ChainUnavailable(format!("invalid quantity '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(url: &str) -> RpcClient {
        RpcClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x1").unwrap(), 1);
        assert_eq!(parse_quantity("0x89").unwrap(), 137);
        assert!(parse_quantity("137").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_call_returns_result() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/")
                .body_contains("\"method\":\"eth_chainId\"");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"jsonrpc":"2.0","id":1,"result":"0x2105"}"#);
        });

        let rpc = client(&server.url("/"));
        assert_eq!(rpc.chain_id().await.unwrap(), 8453);
    }

    #[tokio::test]
    async fn test_call_rpc_error_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"execution reverted"}}"#);
        });

        let rpc = client(&server.url("/"));
        let err = rpc.call("eth_call", serde_json::json!([])).await.unwrap_err();
        assert!(matches!(err, ChainError::ChainUnavailable(_)));
        assert!(err.to_string().contains("execution reverted"));
    }

    #[tokio::test]
    async fn test_call_http_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/");
            then.status(502);
        });

        let rpc = client(&server.url("/"));
        let err = rpc.call("eth_chainId", serde_json::json!([])).await.unwrap_err();
        assert!(err.to_string().contains("RPC HTTP error"));
    }

    #[tokio::test]
    async fn test_call_timeout_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/");
            then.status(200)
                .delay(Duration::from_millis(500))
                .body(r#"{"jsonrpc":"2.0","id":1,"result":"0x1"}"#);
        });

        let rpc = RpcClient::new(&server.url("/"), Duration::from_millis(50)).unwrap();
        let err = rpc.chain_id().await.unwrap_err();
        assert!(matches!(err, ChainError::ChainUnavailable(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_unavailable() {
        let rpc = client("http://127.0.0.1:65534/v2/s3cr3tkey");
        let err = rpc.chain_id().await.unwrap_err();
        assert!(matches!(err, ChainError::ChainUnavailable(_)));
        assert!(!err.to_string().contains("s3cr3tkey"));
    }

    #[tokio::test]
    async fn test_error_response_with_null_id() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"parse error"}}"#);
        });

        let rpc = client(&server.url("/"));
        let err = rpc.chain_id().await.unwrap_err();
        assert!(err.to_string().contains("RPC error -32700: parse error"));
    }

    #[tokio::test]
    async fn test_eth_call_decodes_hex() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST)
                .path("/")
                .body_contains("\"method\":\"eth_call\"")
                .body_contains("\"data\":\"0xf4865b78");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"jsonrpc":"2.0","id":1,"result":"0x0102"}"#);
        });

        let rpc = client(&server.url("/"));
        let data = rpc
            .eth_call(
                "0x0000000000000000000000000000000000000001",
                &[0xf4, 0x86, 0x5b, 0x78],
                "latest",
            )
            .await
            .unwrap();
        assert_eq!(data, vec![1, 2]);
    }
}
