//! # Bootstrap Configuration
//!
//! Every constant the orchestration depends on (ports, network id, retry
//! budgets, timeouts, file names) lives here and is handed to the engine at
//! construction time, so tests can run with tiny budgets.
//!
//! ## Environment Overrides
//!
//! `BootstrapConfig::from_env()` starts from the defaults and applies any of:
//!
//! | Variable | Field |
//! |---|---|
//! | `TESTNET_PEER_COUNT` | `topology.peer_count` |
//! | `TESTNET_NETWORK_ID` | `network.network_id` |
//! | `TESTNET_IMAGE` | `network.image` |
//! | `TESTNET_RPC_PORT` | `network.rpc_port` |
//! | `TESTNET_READINESS_RETRIES` | `readiness.retries` |
//! | `TESTNET_READINESS_RETRY_DELAY_MS` | `readiness.retry_delay` |
//! | `TESTNET_PEER_COUNT_ATTEMPTS` | `convergence.max_attempts` |
//! | `TESTNET_PEER_COUNT_DELAY_MS` | `convergence.attempt_delay` |
//! | `TESTNET_RPC_TIMEOUT_SECS` | `rpc.timeout` |

use super::errors::ConfigError;
use super::types::PortSpec;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Complete bootstrap configuration.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    /// Node image, ports and chain parameters.
    pub network: NetworkConfig,
    /// Service identifiers and cluster size.
    pub topology: TopologyConfig,
    /// Admin endpoint readiness polling.
    pub readiness: ReadinessConfig,
    /// Peer-count convergence polling.
    pub convergence: ConvergenceConfig,
    /// Admin RPC client settings.
    pub rpc: RpcConfig,
    /// Static files shipped to the nodes.
    pub files: StaticFilesConfig,
}

impl BootstrapConfig {
    /// Load defaults and apply `TESTNET_*` environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(count) = env_override::<usize>("TESTNET_PEER_COUNT") {
            config.topology.peer_count = count;
        }
        if let Some(network_id) = env_override::<u64>("TESTNET_NETWORK_ID") {
            config.network.network_id = network_id;
        }
        if let Ok(image) = std::env::var("TESTNET_IMAGE") {
            info!("Using node image '{}' from environment", image);
            config.network.image = image;
        }
        if let Some(port) = env_override::<u16>("TESTNET_RPC_PORT") {
            config.network.rpc_port = port;
        }
        if let Some(retries) = env_override::<u32>("TESTNET_READINESS_RETRIES") {
            config.readiness.retries = retries;
        }
        if let Some(ms) = env_override::<u64>("TESTNET_READINESS_RETRY_DELAY_MS") {
            config.readiness.retry_delay = Duration::from_millis(ms);
        }
        if let Some(attempts) = env_override::<u32>("TESTNET_PEER_COUNT_ATTEMPTS") {
            config.convergence.max_attempts = attempts;
        }
        if let Some(ms) = env_override::<u64>("TESTNET_PEER_COUNT_DELAY_MS") {
            config.convergence.attempt_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = env_override::<u64>("TESTNET_RPC_TIMEOUT_SECS") {
            config.rpc.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Defaults with no waiting between polls and small retry budgets.
    pub fn for_testing(peer_count: usize) -> Self {
        let mut config = Self::default();
        config.topology.peer_count = peer_count;
        config.readiness = ReadinessConfig {
            initial_delay: Duration::ZERO,
            retries: 3,
            retry_delay: Duration::ZERO,
        };
        config.convergence = ConvergenceConfig {
            max_attempts: 5,
            attempt_delay: Duration::ZERO,
        };
        config.rpc.timeout = Duration::from_secs(2);
        config
    }

    /// Reject budgets that would make a run fail (or hang) before it starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.readiness.retries == 0 {
            return Err(ConfigError::ZeroBudget("readiness.retries"));
        }
        if self.convergence.max_attempts == 0 {
            return Err(ConfigError::ZeroBudget("convergence.max_attempts"));
        }
        if self.network.rpc_port == 0 {
            return Err(ConfigError::InvalidPort("network.rpc_port"));
        }
        if self.rpc.timeout.is_zero() {
            return Err(ConfigError::ZeroBudget("rpc.timeout"));
        }
        Ok(())
    }

    /// Total number of nodes in the cluster, seed included.
    pub fn total_nodes(&self) -> usize {
        self.topology.peer_count + 1
    }
}

fn env_override<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}='{}': not a valid value", key, raw);
            None
        }
    }
}

/// Node image, ports and chain parameters.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Docker image every node runs.
    pub image: String,
    /// Chain network id passed to `geth --networkid`.
    pub network_id: u64,
    /// HTTP admin JSON-RPC port.
    pub rpc_port: u16,
    /// WebSocket port.
    pub ws_port: u16,
    /// devp2p listening/discovery port (TCP and UDP).
    pub discovery_port: u16,
    /// Placeholder the launcher swaps for the node's private IP.
    pub private_ip_placeholder: String,
    /// Account unlocked on the seed for mining.
    pub signer_address: String,
}

impl NetworkConfig {
    pub const RPC_PORT_ID: &'static str = "rpc";
    pub const WS_PORT_ID: &'static str = "ws";
    pub const TCP_DISCOVERY_PORT_ID: &'static str = "tcpDiscovery";
    pub const UDP_DISCOVERY_PORT_ID: &'static str = "udpDiscovery";

    /// Ports every node declares, keyed by port id.
    pub fn used_ports(&self) -> Vec<(&'static str, PortSpec)> {
        vec![
            (Self::RPC_PORT_ID, PortSpec::tcp(self.rpc_port)),
            (Self::WS_PORT_ID, PortSpec::tcp(self.ws_port)),
            (Self::TCP_DISCOVERY_PORT_ID, PortSpec::tcp(self.discovery_port)),
            (Self::UDP_DISCOVERY_PORT_ID, PortSpec::udp(self.discovery_port)),
        ]
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            image: "ethereum/client-go:v1.10.8".to_string(),
            network_id: 881239,
            rpc_port: 8545,
            ws_port: 8546,
            discovery_port: 30303,
            private_ip_placeholder: "KURTOSIS_PRIVATE_IP_ADDR_PLACEHOLDER".to_string(),
            signer_address: "0x14f6136b48b74b147926c9f24323d16c1e54a026".to_string(),
        }
    }
}

/// Service identifiers and cluster size.
#[derive(Debug, Clone)]
pub struct TopologyConfig {
    pub bootnode_service_id: String,
    /// Peers are named `<prefix><n>` for `n` in `1..=peer_count`.
    pub peer_service_id_prefix: String,
    /// Number of peers started next to the seed.
    pub peer_count: usize,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            bootnode_service_id: "bootnode".to_string(),
            peer_service_id_prefix: "ethereum-node-".to_string(),
            peer_count: 2,
        }
    }
}

/// Bounded polling of a node's admin endpoint.
#[derive(Debug, Clone)]
pub struct ReadinessConfig {
    pub initial_delay: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            retries: 30,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Bounded polling of a node's peer count.
#[derive(Debug, Clone)]
pub struct ConvergenceConfig {
    pub max_attempts: u32,
    pub attempt_delay: Duration,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            attempt_delay: Duration::from_millis(500),
        }
    }
}

/// Admin RPC client settings.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Per-call timeout, independent of any retry ceiling.
    pub timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Static files uploaded once and mounted into every node.
#[derive(Debug, Clone)]
pub struct StaticFilesConfig {
    /// Directory uploaded as the files artifact.
    pub static_files_dir: String,
    /// Where the artifact is mounted inside each node.
    pub mountpoint: String,
    pub genesis_file: String,
    pub password_file: String,
    pub keystore_file: String,
}

impl StaticFilesConfig {
    /// Absolute path of a static file inside a node.
    pub fn mounted_path(&self, file_name: &str) -> String {
        let mountpoint = self.mountpoint.trim_end_matches('/');
        if file_name.is_empty() {
            format!("{}/", mountpoint)
        } else {
            format!("{}/{}", mountpoint, file_name.trim_start_matches('/'))
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            static_files_dir: "/static-files".to_string(),
            mountpoint: "/files".to_string(),
            genesis_file: "genesis.json".to_string(),
            password_file: "password.txt".to_string(),
            keystore_file: "UTC--2021-08-11T21-30-29.861585000Z--14f6136b48b74b147926c9f24323d16c1e54a026"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BootstrapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total_nodes(), 3);
        assert_eq!(config.rpc.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_zero_budgets_rejected() {
        let mut config = BootstrapConfig::default();
        config.readiness.retries = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroBudget("readiness.retries"))
        );

        let mut config = BootstrapConfig::default();
        config.convergence.max_attempts = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroBudget("convergence.max_attempts"))
        );
    }

    #[test]
    fn test_mounted_path() {
        let files = StaticFilesConfig::default();
        assert_eq!(files.mounted_path("genesis.json"), "/files/genesis.json");
        assert_eq!(files.mounted_path(""), "/files/");
    }

    #[test]
    fn test_used_ports_cover_rpc_ws_and_discovery() {
        let ports: Vec<String> = NetworkConfig::default()
            .used_ports()
            .into_iter()
            .map(|(_, spec)| spec.to_string())
            .collect();
        assert_eq!(ports, vec!["8545/tcp", "8546/tcp", "30303/tcp", "30303/udp"]);
    }
}
