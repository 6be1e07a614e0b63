//! # Driving Ports (Inbound API)
//!
//! What this crate offers to the execution harness.

use crate::domain::{BootstrapError, BootstrapResult, FilesArtifactId};
use async_trait::async_trait;

/// Stand up the cluster, mesh it, and hand back its metadata.
#[async_trait]
pub trait MeshBootstrapApi: Send + Sync {
    /// Upload the static files the nodes mount.
    async fn upload_static_files(&self) -> Result<FilesArtifactId, BootstrapError>;

    /// Start seed and peers from an uploaded artifact, connect them into a
    /// full mesh and verify convergence.
    async fn bootstrap(&self, artifact: &FilesArtifactId)
        -> Result<BootstrapResult, BootstrapError>;
}
