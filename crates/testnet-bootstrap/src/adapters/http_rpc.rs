//! Admin JSON-RPC client over HTTP.

use crate::domain::{EnodeAddress, NetworkConfig, NodeInfo, RpcConfig, RpcError};
use crate::ports::AdminRpc;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use tracing::trace;

/// Request id sent with every `admin_nodeInfo` call.
pub const NODE_INFO_REQUEST_ID: u64 = 67;

/// Request id sent with every `admin_addPeer` call.
pub const ADD_PEER_REQUEST_ID: u64 = 70;

const JSON_RPC_VERSION: &str = "2.0";

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a, T: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: T,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    #[allow(dead_code)]
    #[serde(default)]
    jsonrpc: String,
    #[allow(dead_code)]
    #[serde(default)]
    id: u64,
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Error type for client creation.
#[derive(Debug, thiserror::Error)]
pub enum HttpClientError {
    #[error("Failed to create HTTP client: {0}")]
    Build(#[from] reqwest::Error),
}

/// `AdminRpc` over plain HTTP POST to `http://<ip>:<rpc port>`.
///
/// One request per call with a fixed id per method. Retries are the
/// caller's business.
pub struct HttpAdminRpcClient {
    http_client: reqwest::Client,
    rpc_port: u16,
    timeout: Duration,
}

impl HttpAdminRpcClient {
    /// Create a client for the configured RPC port and per-call timeout.
    pub fn new(network: &NetworkConfig, rpc: &RpcConfig) -> Result<Self, HttpClientError> {
        Self::with_port(network.rpc_port, rpc.timeout)
    }

    pub fn with_port(rpc_port: u16, timeout: Duration) -> Result<Self, HttpClientError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            rpc_port,
            timeout,
        })
    }

    fn url_for(&self, ip: &str) -> String {
        format!("http://{}:{}", ip, self.rpc_port)
    }

    fn map_send_error(&self, url: &str, err: reqwest::Error) -> RpcError {
        if err.is_timeout() {
            RpcError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            RpcError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }

    async fn call<P: Serialize + Send, R: DeserializeOwned>(
        &self,
        ip: &str,
        method: &str,
        params: P,
        id: u64,
    ) -> Result<R, RpcError> {
        let url = self.url_for(ip);
        let request = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            method,
            params,
            id,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|err| self.map_send_error(&url, err))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(RpcError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.map_send_error(&url, err))?;
        trace!("[rpc] {} response from {}: {}", method, url, body);

        let decoded: JsonRpcResponse<R> =
            serde_json::from_str(&body).map_err(|err| RpcError::Decode {
                url: url.clone(),
                reason: err.to_string(),
            })?;

        if let Some(error) = decoded.error {
            return Err(RpcError::Remote {
                url,
                code: error.code,
                message: error.message,
            });
        }

        decoded.result.ok_or_else(|| RpcError::Decode {
            url,
            reason: "response has neither result nor error".to_string(),
        })
    }
}

#[async_trait]
impl AdminRpc for HttpAdminRpcClient {
    async fn node_info(&self, ip: &str) -> Result<NodeInfo, RpcError> {
        self.call(ip, "admin_nodeInfo", Vec::<()>::new(), NODE_INFO_REQUEST_ID)
            .await
    }

    async fn add_peer(&self, ip: &str, enode: &EnodeAddress) -> Result<bool, RpcError> {
        self.call(ip, "admin_addPeer", [enode.as_str()], ADD_PEER_REQUEST_ID)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            method: "admin_addPeer",
            params: ["enode://aa@10.0.0.2:30303"],
            id: ADD_PEER_REQUEST_ID,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["method"], "admin_addPeer");
        assert_eq!(value["params"][0], "enode://aa@10.0.0.2:30303");
        assert_eq!(value["id"], 70);
    }

    #[test]
    fn test_empty_params_serialize_as_array() {
        let request = JsonRpcRequest {
            jsonrpc: JSON_RPC_VERSION,
            method: "admin_nodeInfo",
            params: Vec::<()>::new(),
            id: NODE_INFO_REQUEST_ID,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["params"], serde_json::json!([]));
        assert_eq!(value["id"], 67);
    }

    #[test]
    fn test_url_uses_rpc_port() {
        let client = HttpAdminRpcClient::with_port(8545, Duration::from_secs(1)).unwrap();
        assert_eq!(client.url_for("172.16.0.2"), "http://172.16.0.2:8545");
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = HttpAdminRpcClient::with_port(port, Duration::from_secs(2)).unwrap();
        let err = client.node_info("127.0.0.1").await.unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err:?}");
    }
}
