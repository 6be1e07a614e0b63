//! The executable module: serialized params in, serialized result out.

use crate::api_objects::ExecuteParams;
use anyhow::{Context, Result};
use std::sync::Arc;
use testnet_bootstrap::{
    AdminRpc, BootstrapConfig, BootstrapService, MeshBootstrapApi, NodeLauncher,
};
use tracing::{debug, info};

/// Starts a bootnode plus peers, meshes them and reports connection details.
pub struct EthereumTestnetModule {
    service: BootstrapService,
}

impl EthereumTestnetModule {
    pub fn new(
        config: BootstrapConfig,
        launcher: Arc<dyn NodeLauncher>,
        rpc: Arc<dyn AdminRpc>,
    ) -> Result<Self> {
        let service = BootstrapService::new(config, launcher, rpc)
            .context("An error occurred validating the bootstrap configuration")?;
        Ok(Self { service })
    }

    /// Run one bootstrap and return the result as pretty-printed JSON.
    pub async fn execute(&self, serialized_params: &str) -> Result<String> {
        info!(
            "Ethereum testnet module received serialized execute params '{}'",
            serialized_params
        );
        let _params = parse_execute_params(serialized_params)?;

        let artifact = self
            .service
            .upload_static_files()
            .await
            .context("An error occurred uploading the static files")?;

        let result = self
            .service
            .bootstrap(&artifact)
            .await
            .context("An error occurred starting the Ethereum nodes")?;

        let serialized = serde_json::to_string_pretty(&result)
            .context("An error occurred serializing the result")?;
        debug!("Ethereum testnet module result:\n{}", serialized);
        Ok(serialized)
    }
}

/// Decode execute params. Blank input is the same as `{}`.
fn parse_execute_params(serialized_params: &str) -> Result<ExecuteParams> {
    if serialized_params.trim().is_empty() {
        return Ok(ExecuteParams::default());
    }
    serde_json::from_str(serialized_params).with_context(|| {
        format!(
            "An error occurred deserializing the serialized params '{}'",
            serialized_params
        )
    })
}
