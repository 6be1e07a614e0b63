use super::engine::MeshFormationEngine;
use crate::domain::{BootstrapConfig, BootstrapError};
use crate::ports::{AdminRpc, NodeLauncher};
use std::sync::Arc;

/// Bootstrap service implementing the driving port.
///
/// Owns the formation engine and the launcher used for uploads. Callers go
/// through [`MeshBootstrapApi`](crate::ports::MeshBootstrapApi).
///
/// # Example
///
/// ```rust,ignore
/// use testnet_bootstrap::adapters::HttpAdminRpcClient;
/// use testnet_bootstrap::ports::MeshBootstrapApi;
/// use testnet_bootstrap::service::BootstrapService;
///
/// let config = BootstrapConfig::from_env();
/// let rpc = Arc::new(HttpAdminRpcClient::new(&config.network, &config.rpc)?);
/// let service = BootstrapService::new(config, launcher, rpc)?;
///
/// let artifact = service.upload_static_files().await?;
/// let result = service.bootstrap(&artifact).await?;
/// ```
pub struct BootstrapService {
    pub(crate) engine: MeshFormationEngine,
    pub(crate) launcher: Arc<dyn NodeLauncher>,
}

impl BootstrapService {
    /// Create a new bootstrap service.
    ///
    /// # Arguments
    ///
    /// * `config` - Validated before anything is launched
    /// * `launcher` - Starts nodes and uploads files
    /// * `rpc` - Admin JSON-RPC client
    pub fn new(
        config: BootstrapConfig,
        launcher: Arc<dyn NodeLauncher>,
        rpc: Arc<dyn AdminRpc>,
    ) -> Result<Self, BootstrapError> {
        let engine = MeshFormationEngine::new(config, Arc::clone(&launcher), rpc)?;
        Ok(Self { engine, launcher })
    }

    pub fn config(&self) -> &BootstrapConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &MeshFormationEngine {
        &self.engine
    }
}
