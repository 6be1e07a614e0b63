//! # Testnet Bootstrap
//!
//! Stands up an ephemeral private Ethereum network and forces it into a
//! full peer mesh before handing it over.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Discovery alone is too slow and too unreliable for a test fixture, so
//! after the nodes are up every peer is told explicitly whom to dial:
//! - One seed (bootnode) that holds the signer key and mines
//! - N peers started with the seed's ENR as their bootnode
//! - One `admin_addPeer` per unordered pair of peers ("dial all earlier")
//! - Peer-count verification on every node with bounded retries
//!
//! ## Module Structure
//!
//! ```text
//! testnet-bootstrap/
//! ├── domain/          # Config, errors, container specs, mesh plan, peer counting
//! ├── ports/           # MeshBootstrapApi, NodeLauncher, NodeHandle, AdminRpc
//! ├── service/         # Formation engine, readiness, convergence, result assembly
//! ├── adapters/        # reqwest admin JSON-RPC client (feature `http`)
//! └── test_utils       # SimulatedCluster (feature `test-utils`)
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
#[cfg(feature = "http")]
pub use adapters::HttpAdminRpcClient;
pub use domain::{
    count_peers, plan_connections, BootstrapConfig, BootstrapError, BootstrapResult,
    ConfigError, ConnectPlan, EnodeAddress, ExecError, FilesArtifactId, LaunchError, NodeId,
    NodeInfo, NodeRole, NodeSummary, PeerCountError, PeerSet, RpcError,
};
pub use ports::{AdminRpc, LaunchRequest, MeshBootstrapApi, NodeHandle, NodeLauncher};
pub use service::{BootstrapService, MeshFormation, MeshFormationEngine};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
