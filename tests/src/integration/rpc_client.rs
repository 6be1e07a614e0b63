//! # Admin RPC Client
//!
//! Drives the reqwest-backed `HttpAdminRpcClient` against a local axum
//! server that plays a geth admin endpoint. Covers the request shape and
//! every error class the client distinguishes.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use serde_json::{json, Value};

    use testnet_bootstrap::adapters::{ADD_PEER_REQUEST_ID, NODE_INFO_REQUEST_ID};
    use testnet_bootstrap::{AdminRpc, EnodeAddress, HttpAdminRpcClient, RpcError};

    const ENODE: &str = "enode://a979fb575495b8d6db44f750317d0f4622bf4c2aa3365d6af7c284339968eef29b69ad0dce72a4d8db5ebb4968de0e3bec910127f134779fbcb0cb6d3331163c@127.0.0.1:30303";

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    #[derive(Clone, Copy)]
    enum Behaviour {
        Geth { accept_peers: bool },
        ServerError,
        Garbage,
        RemoteError,
        Slow,
    }

    struct FakeGeth {
        behaviour: Behaviour,
        requests: Mutex<Vec<Value>>,
    }

    async fn handle(State(node): State<Arc<FakeGeth>>, Json(request): Json<Value>) -> Response {
        node.requests.lock().push(request.clone());
        let id = request["id"].clone();

        match node.behaviour {
            Behaviour::Geth { accept_peers } => {
                let result = match request["method"].as_str() {
                    Some("admin_nodeInfo") => json!({
                        "id": "a979fb57",
                        "name": "Geth/v1.10.8-stable/linux-amd64/go1.16.7",
                        "enode": ENODE,
                        "enr": "enr:-Je4QH",
                        "ip": "127.0.0.1",
                        "ports": { "discovery": 30303, "listener": 30303 },
                        "protocols": {}
                    }),
                    Some("admin_addPeer") => json!(accept_peers),
                    _ => Value::Null,
                };
                Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
            }
            Behaviour::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
            Behaviour::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
            Behaviour::RemoteError => Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "the method admin_nodeInfo does not exist/is not available" }
            }))
            .into_response(),
            Behaviour::Slow => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK.into_response()
            }
        }
    }

    /// Start a fake node on an ephemeral loopback port.
    async fn spawn_node(behaviour: Behaviour) -> (Arc<FakeGeth>, u16) {
        let node = Arc::new(FakeGeth {
            behaviour,
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new()
            .route("/", post(handle))
            .with_state(Arc::clone(&node));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (node, port)
    }

    fn client(port: u16, timeout: Duration) -> HttpAdminRpcClient {
        HttpAdminRpcClient::with_port(port, timeout).unwrap()
    }

    // =============================================================================
    // HAPPY PATH
    // =============================================================================

    #[tokio::test]
    async fn test_node_info_decodes_enode() {
        let (node, port) = spawn_node(Behaviour::Geth { accept_peers: true }).await;

        let info = client(port, Duration::from_secs(2))
            .node_info("127.0.0.1")
            .await
            .unwrap();

        assert_eq!(info.enode.as_str(), ENODE);
        assert!(info.enode.is_well_formed());

        let requests = node.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["method"], "admin_nodeInfo");
        assert_eq!(requests[0]["params"], json!([]));
        assert_eq!(requests[0]["id"], NODE_INFO_REQUEST_ID);
        assert_eq!(requests[0]["jsonrpc"], "2.0");
    }

    #[tokio::test]
    async fn test_add_peer_sends_enode_and_reads_ack() {
        let (node, port) = spawn_node(Behaviour::Geth { accept_peers: true }).await;

        let accepted = client(port, Duration::from_secs(2))
            .add_peer("127.0.0.1", &EnodeAddress::new(ENODE))
            .await
            .unwrap();

        assert!(accepted);
        let requests = node.requests.lock();
        assert_eq!(requests[0]["method"], "admin_addPeer");
        assert_eq!(requests[0]["params"], json!([ENODE]));
        assert_eq!(requests[0]["id"], ADD_PEER_REQUEST_ID);
    }

    #[tokio::test]
    async fn test_add_peer_negative_ack_is_not_an_error() {
        let (_node, port) = spawn_node(Behaviour::Geth { accept_peers: false }).await;

        let accepted = client(port, Duration::from_secs(2))
            .add_peer("127.0.0.1", &EnodeAddress::new(ENODE))
            .await
            .unwrap();

        assert!(!accepted);
    }

    // =============================================================================
    // ERROR CLASSES
    // =============================================================================

    #[tokio::test]
    async fn test_non_200_is_status_error() {
        let (_node, port) = spawn_node(Behaviour::ServerError).await;

        let err = client(port, Duration::from_secs(2))
            .node_info("127.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Status { status: 500, .. }), "{err:?}");
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_garbage_body_is_decode_error() {
        let (_node, port) = spawn_node(Behaviour::Garbage).await;

        let err = client(port, Duration::from_secs(2))
            .node_info("127.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Decode { .. }), "{err:?}");
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn test_json_rpc_error_is_remote_error() {
        let (_node, port) = spawn_node(Behaviour::RemoteError).await;

        let err = client(port, Duration::from_secs(2))
            .node_info("127.0.0.1")
            .await
            .unwrap_err();

        match err {
            RpcError::Remote { code, message, .. } => {
                assert_eq!(code, -32601);
                assert!(message.contains("admin_nodeInfo"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_node_times_out() {
        let (_node, port) = spawn_node(Behaviour::Slow).await;

        let err = client(port, Duration::from_millis(200))
            .node_info("127.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Timeout { .. }), "{err:?}");
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_closed_port_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = client(port, Duration::from_secs(2))
            .node_info("127.0.0.1")
            .await
            .unwrap_err();

        assert!(matches!(err, RpcError::Transport { .. }), "{err:?}");
    }
}
