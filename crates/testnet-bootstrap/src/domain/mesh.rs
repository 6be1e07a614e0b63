//! # Mesh Planning
//!
//! Address exchange state and the "connect to all earlier" fan-out.
//!
//! Each peer is asked to dial every peer recorded strictly before it, so an
//! unordered pair `{a, b}` gets exactly one `admin_addPeer` call and `n` peers
//! need `n * (n - 1) / 2` calls in total. Connections are bidirectional once
//! established, which is what makes the single call per pair sufficient.

use super::types::{EnodeAddress, NodeId};
use std::collections::HashSet;

/// Enode records of every started peer, in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    entries: Vec<(NodeId, EnodeAddress)>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a peer's enode. Returns `false` if the node was already recorded.
    pub fn insert(&mut self, node_id: NodeId, enode: EnodeAddress) -> bool {
        if self.contains(&node_id) {
            return false;
        }
        self.entries.push((node_id, enode));
        true
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.entries.iter().any(|(id, _)| id == node_id)
    }

    pub fn get(&self, node_id: &NodeId) -> Option<&EnodeAddress> {
        self.entries
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, enode)| enode)
    }

    /// Snapshot of every enode recorded so far.
    pub fn snapshot(&self) -> Vec<EnodeAddress> {
        self.entries.iter().map(|(_, enode)| enode.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NodeId, EnodeAddress)> {
        self.entries.iter()
    }
}

/// Per-peer lists of enodes to dial explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectPlan {
    entries: Vec<(NodeId, Vec<EnodeAddress>)>,
}

impl ConnectPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a peer's connect-to list.
    pub fn push(&mut self, node_id: NodeId, targets: Vec<EnodeAddress>) {
        self.entries.push((node_id, targets));
    }

    pub fn targets(&self, node_id: &NodeId) -> Option<&[EnodeAddress]> {
        self.entries
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, targets)| targets.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NodeId, Vec<EnodeAddress>)> {
        self.entries.iter()
    }

    /// Total number of `admin_addPeer` calls the plan issues.
    pub fn call_count(&self) -> usize {
        self.entries.iter().map(|(_, targets)| targets.len()).sum()
    }

    /// Whether every unordered pair of planned peers is dialed exactly once
    /// and no peer dials itself.
    pub fn covers_each_pair_once(&self, peers: &PeerSet) -> bool {
        let mut seen = HashSet::new();
        for (node_id, targets) in &self.entries {
            let Some(own) = peers.get(node_id) else {
                return false;
            };
            for target in targets {
                if target == own {
                    return false;
                }
                let pair = if own.as_str() < target.as_str() {
                    (own.clone(), target.clone())
                } else {
                    (target.clone(), own.clone())
                };
                if !seen.insert(pair) {
                    return false;
                }
            }
        }
        let n = peers.len();
        seen.len() == n * n.saturating_sub(1) / 2
    }
}

/// Build the plan for peers already in iteration order: each peer dials
/// every peer listed before it.
pub fn plan_connections(peers: &PeerSet) -> ConnectPlan {
    let mut plan = ConnectPlan::new();
    let mut earlier: Vec<EnodeAddress> = Vec::with_capacity(peers.len());
    for (node_id, enode) in peers.iter() {
        plan.push(node_id.clone(), earlier.clone());
        earlier.push(enode.clone());
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers(names: &[&str]) -> PeerSet {
        let mut set = PeerSet::new();
        for name in names {
            set.insert(
                NodeId::new(*name),
                EnodeAddress::new(format!("enode://{name}@10.0.0.1:30303")),
            );
        }
        set
    }

    #[test]
    fn test_three_peers_connect_to_all_earlier() {
        let set = peers(&["a", "b", "c"]);
        let plan = plan_connections(&set);

        let a = set.get(&NodeId::new("a")).cloned().unwrap();
        let b = set.get(&NodeId::new("b")).cloned().unwrap();

        assert_eq!(plan.targets(&NodeId::new("a")).unwrap(), &[] as &[EnodeAddress]);
        assert_eq!(plan.targets(&NodeId::new("b")).unwrap(), &[a.clone()]);
        assert_eq!(plan.targets(&NodeId::new("c")).unwrap(), &[a, b]);
        assert!(plan.covers_each_pair_once(&set));
    }

    #[test]
    fn test_call_count_is_n_choose_two() {
        for n in 0..8usize {
            let names: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let set = peers(&refs);
            let plan = plan_connections(&set);
            assert_eq!(plan.call_count(), n * n.saturating_sub(1) / 2);
            assert!(plan.covers_each_pair_once(&set));
        }
    }

    #[test]
    fn test_peer_set_rejects_duplicate_node() {
        let mut set = PeerSet::new();
        assert!(set.insert(NodeId::new("a"), EnodeAddress::new("enode://1@x:1")));
        assert!(!set.insert(NodeId::new("a"), EnodeAddress::new("enode://2@x:1")));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&NodeId::new("a")).unwrap().as_str(), "enode://1@x:1");
    }

    #[test]
    fn test_duplicate_pair_detected() {
        let set = peers(&["a", "b"]);
        let a = set.get(&NodeId::new("a")).cloned().unwrap();
        let b = set.get(&NodeId::new("b")).cloned().unwrap();

        let mut plan = ConnectPlan::new();
        plan.push(NodeId::new("a"), vec![b]);
        plan.push(NodeId::new("b"), vec![a]);
        assert!(!plan.covers_each_pair_once(&set));
    }
}
