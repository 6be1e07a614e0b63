//! # Domain Errors
//!
//! Every failure carries the node, command or expected value it concerns so
//! the surfaced error reads as a causal chain.

use super::types::{EnodeAddress, NodeId};
use std::time::Duration;
use thiserror::Error;

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A retry budget or timeout is zero.
    #[error("Configuration value '{0}' must be greater than zero")]
    ZeroBudget(&'static str),

    /// A port is not usable.
    #[error("Configuration value '{0}' is not a valid port")]
    InvalidPort(&'static str),

    /// The log level string could not be parsed.
    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),
}

/// The node launcher could not create or start an instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("Failed to upload static files from '{path}': {reason}")]
    Upload { path: String, reason: String },

    #[error("Failed to start node '{node_id}': {reason}")]
    Start { node_id: NodeId, reason: String },
}

/// A command run inside a node failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The command could not be run at all.
    #[error("Executing command '{command}' on node '{node_id}' returned an error: {reason}")]
    Failed {
        node_id: NodeId,
        command: String,
        reason: String,
    },

    /// The command ran but exited unsuccessfully.
    #[error(
        "Executing command '{command}' on node '{node_id}' returned non-zero exit code {exit_code} with logs:\n{output}"
    )]
    NonZeroExit {
        node_id: NodeId,
        command: String,
        exit_code: i32,
        output: String,
    },
}

/// A single admin JSON-RPC round trip failed.
///
/// Transport-level failures are kept apart from decode failures so callers
/// can tell "could not reach node" from "node answered garbage".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error("Failed to send RPC request to '{url}': {reason}")]
    Transport { url: String, reason: String },

    #[error("RPC request to '{url}' timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("Received non-200 status code {status} from admin RPC API at '{url}'")]
    Status { url: String, status: u16 },

    #[error("Error parsing response from '{url}' into target shape: {reason}")]
    Decode { url: String, reason: String },

    #[error("RPC error {code} from '{url}': {message}")]
    Remote {
        url: String,
        code: i64,
        message: String,
    },
}

impl RpcError {
    /// Whether the node could not be reached (as opposed to answering badly).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// A single peer-count probe failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerCountError {
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("Expected '{expected}' peers for node '{node_id}' but got '{actual}'")]
    Mismatch {
        node_id: NodeId,
        expected: usize,
        actual: i64,
    },
}

/// Unrecoverable failure of a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Invalid bootstrap configuration")]
    Config(#[from] ConfigError),

    #[error("An error occurred launching a node")]
    Launch(#[from] LaunchError),

    #[error("Node '{node_id}' did not answer its admin endpoint after {attempts} attempts")]
    ReadinessTimeout {
        node_id: NodeId,
        attempts: u32,
        #[source]
        last_error: Option<RpcError>,
    },

    #[error("An error occurred while {operation}")]
    Exec {
        operation: String,
        #[source]
        source: ExecError,
    },

    #[error("An error occurred calling '{method}' on node '{node_id}'")]
    Rpc {
        node_id: NodeId,
        method: &'static str,
        #[source]
        source: RpcError,
    },

    #[error("Node '{node_id}' reported a malformed address record '{address}'")]
    MalformedAddress { node_id: NodeId, address: String },

    #[error("Ethereum returned 'false' response to addPeer request to add enode '{enode}' to node '{node_id}' with IP '{node_ip}'")]
    PeerRejected {
        enode: EnodeAddress,
        node_id: NodeId,
        node_ip: String,
    },

    #[error(
        "Node '{node_id}' didn't reach expected number of peers '{expected}' (last observed: {}), even after {attempts} attempts with {delay:?} between attempts",
        .last_observed.map(|n| n.to_string()).unwrap_or_else(|| "none".to_string())
    )]
    ConvergenceMismatch {
        node_id: NodeId,
        expected: usize,
        last_observed: Option<i64>,
        attempts: u32,
        delay: Duration,
    },
}
