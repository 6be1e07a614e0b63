use super::assembler::assemble_result;
use crate::domain::{BootstrapError, BootstrapResult, FilesArtifactId};
use crate::ports::MeshBootstrapApi;
use crate::service::BootstrapService;
use async_trait::async_trait;
use tracing::info;

#[async_trait]
impl MeshBootstrapApi for BootstrapService {
    async fn upload_static_files(&self) -> Result<FilesArtifactId, BootstrapError> {
        let dir = &self.config().files.static_files_dir;
        let artifact = self.launcher.upload_files(dir).await?;
        info!("Uploaded static files from '{}' as artifact '{}'", dir, artifact);
        Ok(artifact)
    }

    async fn bootstrap(
        &self,
        artifact: &FilesArtifactId,
    ) -> Result<BootstrapResult, BootstrapError> {
        let formation = self.engine.form_mesh(artifact).await?;
        assemble_result(self.config(), &formation).await
    }
}
