//! # Domain Value Objects
//!
//! Identifiers, port declarations and the address records exchanged
//! between nodes while the mesh forms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix every geth enode URL starts with.
pub const ENODE_SCHEME: &str = "enode://";

/// Stable identifier of a launched node (the service ID in the enclave).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Role a node is launched with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// The bootnode: holds the signer keystore, mines, and is dialed by every peer.
    Seed,
    /// A regular node started with the seed's ENR as its bootnode.
    Peer,
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seed => write!(f, "seed"),
            Self::Peer => write!(f, "peer"),
        }
    }
}

/// A node's self-reported dial address (`enode://<pubkey>@<ip>:<port>`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnodeAddress(String);

impl EnodeAddress {
    /// Wrap a raw enode URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Borrow the raw URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the URL carries the `enode://` scheme.
    pub fn is_well_formed(&self) -> bool {
        self.0.starts_with(ENODE_SCHEME) && self.0.len() > ENODE_SCHEME.len()
    }
}

impl fmt::Display for EnodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport protocol of a declared port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortProtocol {
    Tcp,
    Udp,
}

impl fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

/// A port a node listens on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortSpec {
    pub number: u16,
    pub protocol: PortProtocol,
}

impl PortSpec {
    pub fn tcp(number: u16) -> Self {
        Self {
            number,
            protocol: PortProtocol::Tcp,
        }
    }

    pub fn udp(number: u16) -> Self {
        Self {
            number,
            protocol: PortProtocol::Udp,
        }
    }
}

/// Renders as `8545/tcp`, the key format used in the result payload.
impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.protocol)
    }
}

/// Where a node port is bound on the machine running the enclave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    pub interface_ip: String,
    pub interface_port: String,
}

/// Identifier of an uploaded files artifact.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilesArtifactId(String);

impl FilesArtifactId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilesArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exit code and captured output of a command run inside a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub output: String,
}

impl ExecOutput {
    pub const SUCCESS_EXIT_CODE: i32 = 0;

    pub fn is_success(&self) -> bool {
        self.exit_code == Self::SUCCESS_EXIT_CODE
    }
}

/// Payload of a successful `admin_nodeInfo` call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub enode: EnodeAddress,
    #[serde(default)]
    pub enr: String,
    #[serde(default)]
    pub ip: String,
}
