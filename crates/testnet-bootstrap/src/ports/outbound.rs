//! # Driven Ports (Outbound SPI)
//!
//! Capabilities the orchestrator needs from its host: something that starts
//! nodes, a handle to run commands inside a node, and an admin RPC client.
//! The in-memory `SimulatedCluster` (feature `test-utils`) implements all three.

use crate::domain::{
    ContainerConfig, EnodeAddress, ExecError, ExecOutput, FilesArtifactId, LaunchError, NodeId,
    NodeInfo, NodeRole, PortBinding, PortSpec, RpcError,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Request to start one node.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    pub node_id: NodeId,
    pub role: NodeRole,
    pub container: ContainerConfig,
}

/// Starts node instances inside the enclave.
///
/// Instances outlive the bootstrap call; tearing them down is the
/// launcher's business.
#[async_trait]
pub trait NodeLauncher: Send + Sync {
    /// Upload a local directory so it can be mounted into nodes.
    async fn upload_files(&self, local_dir: &str) -> Result<FilesArtifactId, LaunchError>;

    /// Start one node and return a handle to it. Does not wait for readiness.
    async fn launch(&self, request: LaunchRequest) -> Result<Arc<dyn NodeHandle>, LaunchError>;
}

/// A running node.
#[async_trait]
pub trait NodeHandle: Send + Sync {
    fn node_id(&self) -> &NodeId;

    /// Address inside the enclave network; the admin RPC listens here.
    fn private_ip(&self) -> &str;

    /// Address reachable from the host machine, if the launcher exposes one.
    fn maybe_public_ip(&self) -> Option<&str>;

    /// Declared ports.
    fn exposed_ports(&self) -> Vec<PortSpec>;

    /// Host bindings keyed by `<port>/<protocol>`.
    fn port_bindings(&self) -> BTreeMap<String, PortBinding>;

    /// Run a command inside the node.
    ///
    /// A command that runs and exits non-zero is still `Ok`; `Err` means it
    /// could not be run.
    async fn exec(&self, command: &[String]) -> Result<ExecOutput, ExecError>;
}

/// Admin JSON-RPC client. One round trip per call, no retries.
#[async_trait]
pub trait AdminRpc: Send + Sync {
    /// `admin_nodeInfo` against the node listening at `ip`.
    async fn node_info(&self, ip: &str) -> Result<NodeInfo, RpcError>;

    /// `admin_addPeer` against the node listening at `ip`.
    ///
    /// `Ok(false)` is the node's negative acknowledgement.
    async fn add_peer(&self, ip: &str, enode: &EnodeAddress) -> Result<bool, RpcError>;
}
