//! # Simulated Cluster
//!
//! In-memory stand-in for the enclave: launches fake geth nodes, answers the
//! admin RPC by IP and runs the handful of console commands the orchestrator
//! issues. Connections are tracked as an undirected graph so `admin.peers`
//! reflects exactly what the orchestrator caused.
//!
//! Failure knobs cover the error paths: nodes that never become ready,
//! rejected `admin_addPeer`, malformed enodes, lagging convergence, failing
//! launches and failing commands.

use crate::domain::{
    shell_command, EnodeAddress, ExecError, ExecOutput, FilesArtifactId, LaunchError, NodeId,
    NodeInfo, NodeRole, PortBinding, PortSpec, RpcError, StaticFilesConfig, ENR_COMMAND,
    PEERS_COMMAND,
};
use crate::ports::{AdminRpc, LaunchRequest, NodeHandle, NodeLauncher};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha3::{Digest, Keccak256, Keccak512};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

const DISCOVERY_PORT: u16 = 30303;
const FIRST_HOST_PORT: u16 = 49152;

/// Something the simulated cluster was asked to do, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterEvent {
    Upload { dir: String },
    Launch { node_id: NodeId, role: NodeRole },
    NodeInfo { node_id: NodeId },
    AddPeer { node_id: NodeId, enode: EnodeAddress },
    Exec { node_id: NodeId, command: String },
}

struct SimulatedNodeState {
    role: NodeRole,
    ip: String,
    enode: EnodeAddress,
    enr: String,
    exposed_ports: Vec<PortSpec>,
    port_bindings: BTreeMap<String, PortBinding>,
    entrypoint: Vec<String>,
    node_info_calls: u32,
    peer_probes: u32,
}

#[derive(Default)]
struct ClusterState {
    nodes: BTreeMap<NodeId, SimulatedNodeState>,
    by_ip: HashMap<String, NodeId>,
    edges: BTreeSet<(NodeId, NodeId)>,
    journal: Vec<ClusterEvent>,
    uploads: u32,
    bindings_assigned: u16,
    static_files: BTreeMap<String, String>,

    never_ready: HashSet<NodeId>,
    ready_after: HashMap<NodeId, u32>,
    rejecting: HashSet<NodeId>,
    malformed_enode: HashSet<NodeId>,
    failing_launch: HashSet<NodeId>,
    failing_exec: HashSet<NodeId>,
    fail_upload: bool,
    seed_enr_override: Option<String>,
    convergence_lag: u32,
    handshake_entries: usize,
}

impl ClusterState {
    fn node_by_ip(&self, ip: &str) -> Option<&NodeId> {
        self.by_ip.get(ip)
    }

    fn is_ready(&self, node_id: &NodeId) -> bool {
        if self.never_ready.contains(node_id) {
            return false;
        }
        let needed = self.ready_after.get(node_id).copied().unwrap_or(0);
        self.nodes
            .get(node_id)
            .map(|n| n.node_info_calls > needed)
            .unwrap_or(false)
    }

    fn connect(&mut self, a: &NodeId, b: &NodeId) {
        if a == b {
            return;
        }
        let edge = if a < b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        };
        self.edges.insert(edge);
    }

    fn neighbours(&self, node_id: &NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter_map(|(a, b)| {
                if a == node_id {
                    Some(b.clone())
                } else if b == node_id {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    fn node_by_enode(&self, enode: &EnodeAddress) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| &n.enode == enode)
            .map(|(id, _)| id.clone())
    }

    /// Render `admin.peers` the way the geth console prints it.
    fn render_peers(&mut self, node_id: &NodeId) -> String {
        let lag = self.convergence_lag;
        let handshakes = self.handshake_entries;

        let mut neighbours = self.neighbours(node_id);
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.peer_probes += 1;
            if node.peer_probes <= lag {
                neighbours.pop();
            }
        }

        let mut entries: Vec<String> = neighbours
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .map(|peer| peer_entry(&peer.enode, "{\n        difficulty: 1,\n        version: 66\n      }"))
            .collect();

        for index in 0..handshakes {
            let pending = EnodeAddress::new(format!(
                "enode://{}@10.255.0.{}:{}",
                hex::encode(Keccak512::digest(format!("handshake-{index}").as_bytes())),
                index + 1,
                DISCOVERY_PORT
            ));
            entries.push(peer_entry(&pending, "\"handshake\""));
        }

        format!("[{}]\n", entries.join(", "))
    }
}

fn peer_entry(enode: &EnodeAddress, eth_protocol: &str) -> String {
    format!(
        "{{\n    caps: [\"eth/66\", \"snap/1\"],\n    enode: \"{}\",\n    name: \"Geth/v1.10.8-stable/linux-amd64/go1.16.7\",\n    protocols: {{\n      eth: {}\n    }}\n}}",
        enode, eth_protocol
    )
}

fn derive_enode(node_id: &NodeId, ip: &str) -> EnodeAddress {
    let pubkey = hex::encode(Keccak512::digest(node_id.as_str().as_bytes()));
    EnodeAddress::new(format!("enode://{}@{}:{}", pubkey, ip, DISCOVERY_PORT))
}

fn derive_enr(node_id: &NodeId) -> String {
    format!(
        "enr:-{}",
        hex::encode(Keccak256::digest(node_id.as_str().as_bytes()))
    )
}

/// Simulated enclave implementing [`NodeLauncher`] and [`AdminRpc`].
///
/// Cheap to clone; clones share the same cluster.
#[derive(Clone, Default)]
pub struct SimulatedCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl SimulatedCluster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve the default signer files from the seed's mount.
    pub fn with_signer_files(
        self,
        files: &StaticFilesConfig,
        keystore: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.with_static_file(files.mounted_path(&files.keystore_file), keystore)
            .with_static_file(files.mounted_path(&files.password_file), password)
    }

    /// Content `cat <path>` returns on any node.
    pub fn with_static_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.state.lock().static_files.insert(path.into(), content.into());
        self
    }

    /// The node never answers `admin_nodeInfo`.
    pub fn never_ready(self, node_id: impl Into<NodeId>) -> Self {
        self.state.lock().never_ready.insert(node_id.into());
        self
    }

    /// The node fails its first `failures` `admin_nodeInfo` calls.
    pub fn ready_after(self, node_id: impl Into<NodeId>, failures: u32) -> Self {
        self.state.lock().ready_after.insert(node_id.into(), failures);
        self
    }

    /// `admin_addPeer` issued to this node answers `false`.
    pub fn rejecting_add_peer(self, node_id: impl Into<NodeId>) -> Self {
        self.state.lock().rejecting.insert(node_id.into());
        self
    }

    /// The node reports an enode without the `enode://` scheme.
    pub fn with_malformed_enode(self, node_id: impl Into<NodeId>) -> Self {
        self.state.lock().malformed_enode.insert(node_id.into());
        self
    }

    pub fn failing_launch(self, node_id: impl Into<NodeId>) -> Self {
        self.state.lock().failing_launch.insert(node_id.into());
        self
    }

    /// Every command on the node fails to run.
    pub fn failing_exec(self, node_id: impl Into<NodeId>) -> Self {
        self.state.lock().failing_exec.insert(node_id.into());
        self
    }

    pub fn failing_upload(self) -> Self {
        self.state.lock().fail_upload = true;
        self
    }

    /// What the seed's console prints for its ENR.
    pub fn with_seed_enr(self, enr: impl Into<String>) -> Self {
        self.state.lock().seed_enr_override = Some(enr.into());
        self
    }

    /// Each node under-reports by one peer on its first `probes` listings.
    pub fn with_convergence_lag(self, probes: u32) -> Self {
        self.state.lock().convergence_lag = probes;
        self
    }

    /// Add `count` half-open connections to every `admin.peers` listing.
    pub fn with_handshake_entries(self, count: usize) -> Self {
        self.state.lock().handshake_entries = count;
        self
    }

    /// Everything the cluster was asked to do, in order.
    pub fn journal(&self) -> Vec<ClusterEvent> {
        self.state.lock().journal.clone()
    }

    /// Launched node ids in launch order.
    pub fn launched(&self) -> Vec<NodeId> {
        self.state
            .lock()
            .journal
            .iter()
            .filter_map(|event| match event {
                ClusterEvent::Launch { node_id, .. } => Some(node_id.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(caller, target)` of every `admin_addPeer` call, in order.
    pub fn add_peer_calls(&self) -> Vec<(NodeId, EnodeAddress)> {
        self.state
            .lock()
            .journal
            .iter()
            .filter_map(|event| match event {
                ClusterEvent::AddPeer { node_id, enode } => Some((node_id.clone(), enode.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn enode_of(&self, node_id: &NodeId) -> Option<EnodeAddress> {
        self.state.lock().nodes.get(node_id).map(|n| n.enode.clone())
    }

    pub fn entrypoint_of(&self, node_id: &NodeId) -> Option<Vec<String>> {
        self.state
            .lock()
            .nodes
            .get(node_id)
            .map(|n| n.entrypoint.clone())
    }

    /// Current neighbours of a node.
    pub fn peers_of(&self, node_id: &NodeId) -> Vec<NodeId> {
        self.state.lock().neighbours(node_id)
    }

    /// Whether every pair of launched nodes is connected.
    pub fn is_full_mesh(&self) -> bool {
        let state = self.state.lock();
        let n = state.nodes.len();
        state.edges.len() == n * n.saturating_sub(1) / 2
    }
}

#[async_trait]
impl NodeLauncher for SimulatedCluster {
    async fn upload_files(&self, local_dir: &str) -> Result<FilesArtifactId, LaunchError> {
        let mut state = self.state.lock();
        state.journal.push(ClusterEvent::Upload {
            dir: local_dir.to_string(),
        });
        if state.fail_upload {
            return Err(LaunchError::Upload {
                path: local_dir.to_string(),
                reason: "simulated upload failure".to_string(),
            });
        }
        state.uploads += 1;
        Ok(FilesArtifactId::new(format!("artifact-{}", state.uploads)))
    }

    async fn launch(&self, request: LaunchRequest) -> Result<Arc<dyn NodeHandle>, LaunchError> {
        let mut state = self.state.lock();
        state.journal.push(ClusterEvent::Launch {
            node_id: request.node_id.clone(),
            role: request.role,
        });

        if state.failing_launch.contains(&request.node_id) {
            return Err(LaunchError::Start {
                node_id: request.node_id,
                reason: "simulated launch failure".to_string(),
            });
        }
        if state.nodes.contains_key(&request.node_id) {
            return Err(LaunchError::Start {
                node_id: request.node_id,
                reason: "a node with this id already exists".to_string(),
            });
        }

        let ip = format!("172.16.0.{}", state.nodes.len() + 2);
        let entrypoint = request.container.entrypoint_for(&ip);
        let exposed_ports = request.container.exposed_ports();

        let mut port_bindings = BTreeMap::new();
        for port in &exposed_ports {
            let host_port = FIRST_HOST_PORT + state.bindings_assigned;
            state.bindings_assigned += 1;
            port_bindings.insert(
                port.to_string(),
                PortBinding {
                    interface_ip: "127.0.0.1".to_string(),
                    interface_port: host_port.to_string(),
                },
            );
        }

        // A peer whose entrypoint names a running seed's ENR dials it on start.
        let command_line = entrypoint.join(" ");
        let bootnodes: Vec<NodeId> = state
            .nodes
            .iter()
            .filter(|(_, n)| n.role == NodeRole::Seed && command_line.contains(&n.enr))
            .map(|(id, _)| id.clone())
            .collect();

        let enode = if state.malformed_enode.contains(&request.node_id) {
            EnodeAddress::new(format!("{}:{}", ip, DISCOVERY_PORT))
        } else {
            derive_enode(&request.node_id, &ip)
        };
        let enr = match (&state.seed_enr_override, request.role) {
            (Some(enr), NodeRole::Seed) => enr.clone(),
            _ => derive_enr(&request.node_id),
        };

        state.nodes.insert(
            request.node_id.clone(),
            SimulatedNodeState {
                role: request.role,
                ip: ip.clone(),
                enode,
                enr,
                exposed_ports,
                port_bindings,
                entrypoint,
                node_info_calls: 0,
                peer_probes: 0,
            },
        );
        state.by_ip.insert(ip.clone(), request.node_id.clone());
        for seed in bootnodes {
            state.connect(&seed, &request.node_id);
        }

        Ok(Arc::new(SimulatedNode {
            node_id: request.node_id,
            ip,
            cluster: self.clone(),
        }))
    }
}

#[async_trait]
impl AdminRpc for SimulatedCluster {
    async fn node_info(&self, ip: &str) -> Result<NodeInfo, RpcError> {
        let mut state = self.state.lock();
        let url = format!("http://{}:8545", ip);
        let Some(node_id) = state.node_by_ip(ip).cloned() else {
            return Err(RpcError::Transport {
                url,
                reason: "no route to host".to_string(),
            });
        };
        state.journal.push(ClusterEvent::NodeInfo {
            node_id: node_id.clone(),
        });
        if let Some(node) = state.nodes.get_mut(&node_id) {
            node.node_info_calls += 1;
        }
        if !state.is_ready(&node_id) {
            return Err(RpcError::Transport {
                url,
                reason: "connection refused".to_string(),
            });
        }

        let node = state.nodes.get(&node_id).ok_or_else(|| RpcError::Transport {
            url: url.clone(),
            reason: "node vanished".to_string(),
        })?;
        Ok(NodeInfo {
            id: node.enode.as_str().trim_start_matches("enode://").chars().take(64).collect(),
            name: "Geth/v1.10.8-stable/linux-amd64/go1.16.7".to_string(),
            enode: node.enode.clone(),
            enr: node.enr.clone(),
            ip: node.ip.clone(),
        })
    }

    async fn add_peer(&self, ip: &str, enode: &EnodeAddress) -> Result<bool, RpcError> {
        let mut state = self.state.lock();
        let url = format!("http://{}:8545", ip);
        let Some(node_id) = state.node_by_ip(ip).cloned() else {
            return Err(RpcError::Transport {
                url,
                reason: "no route to host".to_string(),
            });
        };
        state.journal.push(ClusterEvent::AddPeer {
            node_id: node_id.clone(),
            enode: enode.clone(),
        });
        if state.never_ready.contains(&node_id) {
            return Err(RpcError::Transport {
                url,
                reason: "connection refused".to_string(),
            });
        }
        if state.rejecting.contains(&node_id) {
            return Ok(false);
        }
        if let Some(target) = state.node_by_enode(enode) {
            state.connect(&node_id, &target);
        }
        Ok(true)
    }
}

/// Handle to one simulated node.
pub struct SimulatedNode {
    node_id: NodeId,
    ip: String,
    cluster: SimulatedCluster,
}

#[async_trait]
impl NodeHandle for SimulatedNode {
    fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    fn private_ip(&self) -> &str {
        &self.ip
    }

    fn maybe_public_ip(&self) -> Option<&str> {
        Some("127.0.0.1")
    }

    fn exposed_ports(&self) -> Vec<PortSpec> {
        self.cluster
            .state
            .lock()
            .nodes
            .get(&self.node_id)
            .map(|n| n.exposed_ports.clone())
            .unwrap_or_default()
    }

    fn port_bindings(&self) -> BTreeMap<String, PortBinding> {
        self.cluster
            .state
            .lock()
            .nodes
            .get(&self.node_id)
            .map(|n| n.port_bindings.clone())
            .unwrap_or_default()
    }

    async fn exec(&self, command: &[String]) -> Result<ExecOutput, ExecError> {
        let mut state = self.cluster.state.lock();
        let joined = command.join(" ");
        state.journal.push(ClusterEvent::Exec {
            node_id: self.node_id.clone(),
            command: joined.clone(),
        });

        if state.failing_exec.contains(&self.node_id) {
            return Err(ExecError::Failed {
                node_id: self.node_id.clone(),
                command: joined,
                reason: "simulated exec failure".to_string(),
            });
        }

        let script = match command {
            [shell, flag, script] if shell == "/bin/sh" && flag == "-c" => script.as_str(),
            _ => joined.as_str(),
        };

        let output = if command == shell_command(ENR_COMMAND).as_slice() {
            let enr = state
                .nodes
                .get(&self.node_id)
                .map(|n| n.enr.clone())
                .unwrap_or_default();
            ExecOutput {
                exit_code: 0,
                output: format!("\"{}\"\n", enr),
            }
        } else if script == PEERS_COMMAND {
            ExecOutput {
                exit_code: 0,
                output: state.render_peers(&self.node_id),
            }
        } else if let [program, path] = command {
            if program != "cat" {
                return Ok(ExecOutput {
                    exit_code: 127,
                    output: format!("exec: {}: not found\n", program),
                });
            }
            match state.static_files.get(path) {
                Some(content) => ExecOutput {
                    exit_code: 0,
                    output: content.clone(),
                },
                None => ExecOutput {
                    exit_code: 1,
                    output: format!("cat: can't open '{}': No such file or directory\n", path),
                },
            }
        } else {
            ExecOutput {
                exit_code: 127,
                output: format!("/bin/sh: {}: not found\n", script),
            }
        };
        Ok(output)
    }
}
