//! Integration scenarios.

pub mod mesh_formation;
pub mod module_execute;
pub mod rpc_client;
