//! Reads init args, installs logging and builds the executable module.

use crate::api_objects::ModuleInitArgs;
use crate::module::EthereumTestnetModule;
use anyhow::{Context, Result};
use std::str::FromStr;
use std::sync::Arc;
use testnet_bootstrap::{BootstrapConfig, ConfigError, HttpAdminRpcClient, NodeLauncher};
use tracing::{debug, info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Builds an [`EthereumTestnetModule`] from serialized init args.
pub struct TestnetModuleConfigurator {
    config: BootstrapConfig,
}

impl Default for TestnetModuleConfigurator {
    fn default() -> Self {
        Self::new(BootstrapConfig::from_env())
    }
}

impl TestnetModuleConfigurator {
    pub fn new(config: BootstrapConfig) -> Self {
        Self { config }
    }

    /// Parse init args, set the log level and return a module talking to
    /// nodes over HTTP.
    pub fn parse_params_and_create_module(
        &self,
        serialized_init_args: &str,
        launcher: Arc<dyn NodeLauncher>,
    ) -> Result<EthereumTestnetModule> {
        let args = parse_init_args(serialized_init_args)?;
        init_logging(args.log_level()).context("An error occurred setting the log level")?;

        let rpc = HttpAdminRpcClient::new(&self.config.network, &self.config.rpc)
            .context("An error occurred creating the admin RPC client")?;

        let module = EthereumTestnetModule::new(self.config.clone(), launcher, Arc::new(rpc))
            .context("An error occurred creating the Ethereum testnet module")?;
        info!("Ethereum testnet module configured");
        Ok(module)
    }
}

/// Decode init args. Blank input means defaults.
pub fn parse_init_args(serialized_init_args: &str) -> Result<ModuleInitArgs> {
    if serialized_init_args.trim().is_empty() {
        return Ok(ModuleInitArgs::default());
    }
    serde_json::from_str(serialized_init_args).with_context(|| {
        format!(
            "An error occurred deserializing the module init args '{}'",
            serialized_init_args
        )
    })
}

/// Parse a level name such as `info` or `DEBUG`.
pub fn parse_log_level(log_level: &str) -> Result<Level, ConfigError> {
    Level::from_str(log_level.trim())
        .map_err(|_| ConfigError::InvalidLogLevel(log_level.to_string()))
}

/// Install the fmt subscriber at `log_level` unless `RUST_LOG` says otherwise.
///
/// A subscriber that is already installed is left in place.
pub fn init_logging(log_level: &str) -> Result<(), ConfigError> {
    let level = parse_log_level(log_level)?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.as_str().to_lowercase()))
        .map_err(|_| ConfigError::InvalidLogLevel(log_level.to_string()))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_ansi(false);

    if let Err(err) = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        debug!("Keeping the existing subscriber: {}", err);
    }
    Ok(())
}
