//! # Bootstrap Service
//!
//! Implements `MeshBootstrapApi` on top of the driven ports. The formation
//! engine does the sequencing; readiness and convergence are bounded retry
//! loops it calls into; the assembler turns a converged mesh into the result
//! payload.

mod api;
mod assembler;
mod convergence;
mod core;
mod engine;
mod exec;
mod readiness;

pub use assembler::{assemble_result, node_summary, read_static_file};
pub use convergence::{await_peer_count, verify_expected_peers};
pub use core::BootstrapService;
pub use engine::{MeshFormation, MeshFormationEngine};
pub use readiness::wait_for_admin_endpoint;
