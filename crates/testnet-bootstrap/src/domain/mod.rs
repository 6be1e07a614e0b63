//! # Domain Module
//!
//! Pure types and algorithms: configuration, errors, container specs,
//! mesh planning and peer-count derivation. No I/O happens here.

pub mod config;
pub mod container;
pub mod errors;
pub mod mesh;
pub mod peer_count;
pub mod result;
pub mod types;

pub use config::{
    BootstrapConfig, ConvergenceConfig, NetworkConfig, ReadinessConfig, RpcConfig,
    StaticFilesConfig, TopologyConfig,
};
pub use container::{
    bootnode_container_config, cat_command, peer_container_config, shell_command, ContainerConfig,
    ContainerConfigBuilder, ENR_COMMAND, PEERS_COMMAND,
};
pub use errors::{BootstrapError, ConfigError, ExecError, LaunchError, PeerCountError, RpcError};
pub use mesh::{plan_connections, ConnectPlan, PeerSet};
pub use peer_count::{count_peers, HANDSHAKE_ARTIFACT};
pub use result::{BootstrapResult, NodeSummary};
pub use types::{
    EnodeAddress, ExecOutput, FilesArtifactId, NodeId, NodeInfo, NodeRole, PortBinding,
    PortProtocol, PortSpec, ENODE_SCHEME,
};
