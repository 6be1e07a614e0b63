//! # Testnet Bootstrap Test Suite
//!
//! Cross-crate integration tests.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── mesh_formation.rs   # Whole-cluster scenarios on the simulated enclave
//!     ├── rpc_client.rs       # reqwest admin client against a local axum server
//!     └── module_execute.rs   # Configurator + module end to end
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p testnet-tests
//! cargo test -p testnet-tests integration::rpc_client
//! ```

pub mod integration;
