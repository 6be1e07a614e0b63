//! # Peer-Mesh Formation Engine
//!
//! Drives a cluster from nothing to a verified full mesh:
//!
//! ```text
//! launch seed ─→ wait ready ─→ read seed ENR
//!                                  │
//!        ┌─────────────────────────┘
//!        ↓
//! launch peers (concurrently, --bootnodes <ENR>)
//!        ↓
//! wait every peer ready (concurrently)
//!        ↓
//! address exchange: admin_nodeInfo per peer, plan "dial all earlier"
//!        ↓
//! admin_addPeer per planned pair (first failure aborts)
//!        ↓
//! peer-count convergence on every node, seed included (concurrently)
//! ```
//!
//! Already-started nodes are not torn down on failure; that belongs to the
//! launcher.

use super::convergence::await_peer_count;
use super::exec::exec_checked;
use super::readiness::wait_for_admin_endpoint;
use crate::domain::{
    bootnode_container_config, peer_container_config, plan_connections, shell_command,
    BootstrapConfig, BootstrapError, ConnectPlan, FilesArtifactId, NodeId, NodeRole, PeerSet,
    ENR_COMMAND,
};
use crate::ports::{AdminRpc, LaunchRequest, NodeHandle, NodeLauncher};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A converged cluster.
pub struct MeshFormation {
    pub seed: Arc<dyn NodeHandle>,
    /// Peers in launch order.
    pub peers: Vec<Arc<dyn NodeHandle>>,
    /// Enode of every peer, in address-exchange order.
    pub peer_set: PeerSet,
    /// The explicit connections that were issued.
    pub plan: ConnectPlan,
}

impl MeshFormation {
    /// Seed first, then peers in launch order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<dyn NodeHandle>> {
        std::iter::once(&self.seed).chain(self.peers.iter())
    }

    /// Number of peers every node must report.
    pub fn expected_peer_count(&self) -> usize {
        self.peers.len()
    }
}

/// Orchestrates seed startup, peer startup, address exchange, explicit
/// connects and convergence verification.
pub struct MeshFormationEngine {
    config: BootstrapConfig,
    launcher: Arc<dyn NodeLauncher>,
    rpc: Arc<dyn AdminRpc>,
}

impl MeshFormationEngine {
    /// Create an engine. Fails if the configuration is unusable.
    pub fn new(
        config: BootstrapConfig,
        launcher: Arc<dyn NodeLauncher>,
        rpc: Arc<dyn AdminRpc>,
    ) -> Result<Self, BootstrapError> {
        config.validate()?;
        Ok(Self {
            config,
            launcher,
            rpc,
        })
    }

    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Run the whole sequence against an uploaded static-files artifact.
    #[instrument(skip_all, fields(run_id = %Uuid::new_v4(), peers = self.config.topology.peer_count))]
    pub async fn form_mesh(
        &self,
        artifact: &FilesArtifactId,
    ) -> Result<MeshFormation, BootstrapError> {
        let (seed, seed_enr) = self.start_seed(artifact).await?;

        let peers = self.start_peers(artifact, &seed_enr).await?;
        self.await_peers_ready(&peers).await?;

        let (peer_set, plan) = self.exchange_addresses(&peers).await?;
        self.connect_peers(&peers, &plan).await?;

        let formation = MeshFormation {
            seed,
            peers,
            peer_set,
            plan,
        };
        self.verify_convergence(&formation).await?;

        info!(
            "Mesh of {} nodes converged",
            formation.expected_peer_count() + 1
        );
        Ok(formation)
    }

    /// Launch the seed, wait for its admin endpoint and read its ENR.
    async fn start_seed(
        &self,
        artifact: &FilesArtifactId,
    ) -> Result<(Arc<dyn NodeHandle>, String), BootstrapError> {
        let node_id = NodeId::new(self.config.topology.bootnode_service_id.clone());
        let request = LaunchRequest {
            node_id: node_id.clone(),
            role: NodeRole::Seed,
            container: bootnode_container_config(&self.config, artifact),
        };

        let seed = self.launcher.launch(request).await?;
        wait_for_admin_endpoint(self.rpc.as_ref(), seed.as_ref(), &self.config.readiness).await?;

        info!(
            "Added Ethereum bootnode service with public IP: {:?} and public ports: {:?}",
            seed.maybe_public_ip(),
            seed.port_bindings()
        );

        let raw = exec_checked(seed.as_ref(), &shell_command(ENR_COMMAND))
            .await
            .map_err(|source| BootstrapError::Exec {
                operation: format!("fetching the ENR of bootnode '{}'", node_id),
                source,
            })?;

        let enr = parse_console_string(&raw);
        if enr.is_empty() {
            return Err(BootstrapError::MalformedAddress {
                node_id,
                address: raw,
            });
        }
        info!("Bootnode ENR: {}", enr);

        Ok((seed, enr))
    }

    /// Issue every peer launch without waiting for readiness in between.
    async fn start_peers(
        &self,
        artifact: &FilesArtifactId,
        seed_enr: &str,
    ) -> Result<Vec<Arc<dyn NodeHandle>>, BootstrapError> {
        let topology = &self.config.topology;
        let launches = (1..=topology.peer_count).map(|index| {
            let request = LaunchRequest {
                node_id: NodeId::new(format!("{}{}", topology.peer_service_id_prefix, index)),
                role: NodeRole::Peer,
                container: peer_container_config(&self.config, artifact, seed_enr),
            };
            self.launcher.launch(request)
        });

        let peers = try_join_all(launches).await?;
        for peer in &peers {
            info!(
                "Added Ethereum child node '{}' with public IP: {:?} and public ports: {:?}",
                peer.node_id(),
                peer.maybe_public_ip(),
                peer.port_bindings()
            );
        }
        Ok(peers)
    }

    async fn await_peers_ready(&self, peers: &[Arc<dyn NodeHandle>]) -> Result<(), BootstrapError> {
        let probes = peers.iter().map(|peer| {
            wait_for_admin_endpoint(self.rpc.as_ref(), peer.as_ref(), &self.config.readiness)
        });
        try_join_all(probes).await?;
        Ok(())
    }

    /// Fetch each peer's enode and build the connect plan.
    ///
    /// Runs on one path so every peer's connect-to list is a consistent
    /// snapshot of the peers recorded before it.
    async fn exchange_addresses(
        &self,
        peers: &[Arc<dyn NodeHandle>],
    ) -> Result<(PeerSet, ConnectPlan), BootstrapError> {
        let mut peer_set = PeerSet::new();

        for peer in peers {
            if peer_set.contains(peer.node_id()) {
                continue;
            }
            let info = self
                .rpc
                .node_info(peer.private_ip())
                .await
                .map_err(|source| BootstrapError::Rpc {
                    node_id: peer.node_id().clone(),
                    method: "admin_nodeInfo",
                    source,
                })?;

            if !info.enode.is_well_formed() {
                return Err(BootstrapError::MalformedAddress {
                    node_id: peer.node_id().clone(),
                    address: info.enode.to_string(),
                });
            }
            info!("Node '{}' enode: {}", peer.node_id(), info.enode);
            peer_set.insert(peer.node_id().clone(), info.enode);
        }

        let plan = plan_connections(&peer_set);
        Ok((peer_set, plan))
    }

    /// Issue `admin_addPeer` for every planned pair. Fatal on first failure.
    async fn connect_peers(
        &self,
        peers: &[Arc<dyn NodeHandle>],
        plan: &ConnectPlan,
    ) -> Result<(), BootstrapError> {
        for (node_id, targets) in plan.iter() {
            let Some(peer) = peers.iter().find(|p| p.node_id() == node_id) else {
                continue;
            };
            for enode in targets {
                info!("Connecting '{}' to {}", node_id, enode);
                let accepted = self
                    .rpc
                    .add_peer(peer.private_ip(), enode)
                    .await
                    .map_err(|source| BootstrapError::Rpc {
                        node_id: node_id.clone(),
                        method: "admin_addPeer",
                        source,
                    })?;

                if !accepted {
                    return Err(BootstrapError::PeerRejected {
                        enode: enode.clone(),
                        node_id: node_id.clone(),
                        node_ip: peer.private_ip().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    async fn verify_convergence(&self, formation: &MeshFormation) -> Result<(), BootstrapError> {
        let expected = formation.expected_peer_count();
        let checks = formation
            .nodes()
            .map(|node| await_peer_count(node.as_ref(), expected, &self.config.convergence));
        try_join_all(checks).await?;
        Ok(())
    }
}

/// Strip the quoting geth's console puts around string results.
fn parse_console_string(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}
