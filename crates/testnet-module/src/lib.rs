//! # Testnet Module
//!
//! The surface an execution harness drives: a configurator that reads the
//! init args and installs logging, and an executable module that turns
//! serialized params into a serialized bootstrap result.
//!
//! ```text
//! init args ──→ TestnetModuleConfigurator ──→ EthereumTestnetModule
//!                (log level, config)              │
//!                                                 ↓ execute("{}")
//!                                    upload files → bootstrap → JSON result
//! ```

pub mod api_objects;
pub mod configurator;
pub mod module;

pub use api_objects::{ExecuteParams, ExecuteResult, ModuleInitArgs};
pub use configurator::TestnetModuleConfigurator;
pub use module::EthereumTestnetModule;
