//! # Bootstrap Result
//!
//! The payload handed back to the caller once the mesh has converged.

use super::types::{NodeId, PortBinding};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-node connection metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub ip_addr_inside_network: String,
    /// Keys are `<port>/<protocol>`.
    pub exposed_ports_set: BTreeMap<String, bool>,
    pub port_bindings_on_local_machine: BTreeMap<String, PortBinding>,
}

/// Final output of a successful bootstrap run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapResult {
    pub bootnode_service_id: NodeId,
    pub node_info: BTreeMap<NodeId, NodeSummary>,
    pub signer_keystore_content: String,
    pub signer_account_password: String,
}
