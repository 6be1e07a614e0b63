//! JSON objects exchanged with the harness.

use serde::{Deserialize, Serialize};

pub use testnet_bootstrap::BootstrapResult as ExecuteResult;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Arguments the harness passes once, when the module is loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInitArgs {
    /// Missing, `null` and blank all mean [`DEFAULT_LOG_LEVEL`].
    #[serde(rename = "logLevel", default)]
    pub log_level: Option<String>,
}

impl ModuleInitArgs {
    /// The level to install, falling back to the default when unset.
    pub fn log_level(&self) -> &str {
        match self.log_level.as_deref().map(str::trim) {
            Some(level) if !level.is_empty() => level,
            _ => DEFAULT_LOG_LEVEL,
        }
    }
}

/// Params of one `execute` call. Nothing is configurable per call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteParams {}
