//! # Ports Layer - Hexagonal Architecture Boundaries
//!
//! - **Driving Ports (Inbound):** the bootstrap API the harness calls
//! - **Driven Ports (Outbound):** launcher, node handle and admin RPC the
//!   host provides

pub mod inbound;
pub mod outbound;

pub use inbound::MeshBootstrapApi;
pub use outbound::{AdminRpc, LaunchRequest, NodeHandle, NodeLauncher};
