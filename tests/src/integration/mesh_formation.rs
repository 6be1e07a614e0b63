//! # Mesh Formation Scenarios
//!
//! Whole bootstrap runs against the simulated enclave, checking the
//! properties a converged testnet must have regardless of size.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use testnet_bootstrap::domain::StaticFilesConfig;
    use testnet_bootstrap::service::verify_expected_peers;
    use testnet_bootstrap::test_utils::{ClusterEvent, SimulatedCluster};
    use testnet_bootstrap::{BootstrapConfig, BootstrapService, MeshBootstrapApi, NodeId};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn cluster() -> SimulatedCluster {
        SimulatedCluster::new().with_signer_files(&StaticFilesConfig::default(), "{}", "secret")
    }

    fn service(cluster: &SimulatedCluster, config: BootstrapConfig) -> BootstrapService {
        BootstrapService::new(config, Arc::new(cluster.clone()), Arc::new(cluster.clone()))
            .unwrap()
    }

    fn event_node(event: &ClusterEvent) -> Option<&NodeId> {
        match event {
            ClusterEvent::NodeInfo { node_id }
            | ClusterEvent::AddPeer { node_id, .. }
            | ClusterEvent::Exec { node_id, .. }
            | ClusterEvent::Launch { node_id, .. } => Some(node_id),
            ClusterEvent::Upload { .. } => None,
        }
    }

    // =============================================================================
    // CONVERGENCE
    // =============================================================================

    #[tokio::test]
    async fn test_every_node_reports_all_others_for_various_sizes() {
        for peers in 1..=6 {
            let cluster = cluster();
            let service = service(&cluster, BootstrapConfig::for_testing(peers));

            let artifact = service.upload_static_files().await.unwrap();
            let formation = service.engine().form_mesh(&artifact).await.unwrap();

            for node in formation.nodes() {
                verify_expected_peers(node.as_ref(), peers)
                    .await
                    .unwrap_or_else(|e| panic!("{peers} peers: {e}"));
            }
            assert!(cluster.is_full_mesh(), "{peers} peers");
            assert_eq!(cluster.add_peer_calls().len(), peers * (peers - 1) / 2);
        }
    }

    #[tokio::test]
    async fn test_no_pair_is_dialed_twice() {
        let cluster = cluster();
        let service = service(&cluster, BootstrapConfig::for_testing(5));

        service
            .bootstrap(&testnet_bootstrap::FilesArtifactId::new("a"))
            .await
            .unwrap();

        let mut pairs = HashSet::new();
        for (caller, target) in cluster.add_peer_calls() {
            let caller_enode = cluster.enode_of(&caller).unwrap();
            assert_ne!(caller_enode, target, "{caller} dialed itself");
            let pair = if caller_enode.as_str() < target.as_str() {
                (caller_enode, target)
            } else {
                (target, caller_enode)
            };
            assert!(pairs.insert(pair), "pair dialed twice");
        }
        assert_eq!(pairs.len(), 10);
    }

    #[tokio::test]
    async fn test_convergence_with_lag_and_handshakes() {
        let cluster = cluster().with_convergence_lag(3).with_handshake_entries(1);
        let service = service(&cluster, BootstrapConfig::for_testing(3));

        let result = service
            .bootstrap(&testnet_bootstrap::FilesArtifactId::new("a"))
            .await
            .unwrap();

        assert_eq!(result.node_info.len(), 4);
    }

    // =============================================================================
    // ORDERING
    // =============================================================================

    #[tokio::test]
    async fn test_nothing_targets_a_node_before_it_answers() {
        let cluster = cluster()
            .ready_after("bootnode", 2)
            .ready_after("ethereum-node-1", 1)
            .ready_after("ethereum-node-3", 2);
        let service = service(&cluster, BootstrapConfig::for_testing(3));

        service
            .bootstrap(&testnet_bootstrap::FilesArtifactId::new("a"))
            .await
            .unwrap();

        // Readiness needs `ready_after + 1` probes; nothing else may reach a
        // node before that many probes went out.
        let needed = |id: &NodeId| match id.as_str() {
            "bootnode" | "ethereum-node-3" => 3,
            "ethereum-node-1" => 2,
            _ => 1,
        };
        let mut probes: std::collections::HashMap<NodeId, u32> = Default::default();
        for event in cluster.journal() {
            let Some(node_id) = event_node(&event).cloned() else {
                continue;
            };
            match event {
                ClusterEvent::NodeInfo { .. } => *probes.entry(node_id).or_default() += 1,
                ClusterEvent::Launch { .. } => {}
                _ => assert!(
                    probes.get(&node_id).copied().unwrap_or(0) >= needed(&node_id),
                    "{node_id} targeted before ready: {event:?}"
                ),
            }
        }
    }

    #[tokio::test]
    async fn test_peers_launch_only_after_seed_enr_is_known() {
        let cluster = cluster();
        let service = service(&cluster, BootstrapConfig::for_testing(2));

        service
            .bootstrap(&testnet_bootstrap::FilesArtifactId::new("a"))
            .await
            .unwrap();

        let journal = cluster.journal();
        let enr_read = journal
            .iter()
            .position(|e| {
                matches!(e, ClusterEvent::Exec { command, .. } if command.contains("admin.nodeInfo.enr"))
            })
            .unwrap();
        let first_peer_launch = journal
            .iter()
            .position(|e| {
                matches!(e, ClusterEvent::Launch { node_id, .. } if node_id.as_str() != "bootnode")
            })
            .unwrap();
        assert!(enr_read < first_peer_launch);
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_no_convergence_probe() {
        let cluster = cluster().rejecting_add_peer("ethereum-node-3");
        let service = service(&cluster, BootstrapConfig::for_testing(3));

        let err = service
            .bootstrap(&testnet_bootstrap::FilesArtifactId::new("a"))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("ethereum-node-3"));
        assert!(!cluster.journal().iter().any(|e| {
            matches!(e, ClusterEvent::Exec { command, .. } if command.contains("admin.peers"))
        }));
    }
}
