//! Builds the caller-facing result from a converged mesh.

use super::engine::MeshFormation;
use super::exec::exec_checked;
use crate::domain::{
    cat_command, BootstrapConfig, BootstrapError, BootstrapResult, NodeSummary, StaticFilesConfig,
};
use crate::ports::NodeHandle;
use std::collections::BTreeMap;

/// Read a mounted static file from inside `node`.
pub async fn read_static_file(
    node: &dyn NodeHandle,
    files: &StaticFilesConfig,
    file_name: &str,
) -> Result<String, BootstrapError> {
    let command = cat_command(&files.mounted_path(file_name));
    exec_checked(node, &command)
        .await
        .map_err(|source| BootstrapError::Exec {
            operation: format!(
                "reading static file '{}' from node '{}'",
                file_name,
                node.node_id()
            ),
            source,
        })
}

/// Connection metadata for one node.
pub fn node_summary(node: &dyn NodeHandle) -> NodeSummary {
    let exposed_ports_set = node
        .exposed_ports()
        .into_iter()
        .map(|port| (port.to_string(), true))
        .collect();

    NodeSummary {
        ip_addr_inside_network: node.private_ip().to_string(),
        exposed_ports_set,
        port_bindings_on_local_machine: node.port_bindings(),
    }
}

/// Collect per-node metadata plus the signer secrets read from the seed.
pub async fn assemble_result(
    config: &BootstrapConfig,
    formation: &MeshFormation,
) -> Result<BootstrapResult, BootstrapError> {
    let seed = formation.seed.as_ref();
    let signer_keystore_content =
        read_static_file(seed, &config.files, &config.files.keystore_file).await?;
    let signer_account_password =
        read_static_file(seed, &config.files, &config.files.password_file).await?;

    let node_info: BTreeMap<_, _> = formation
        .nodes()
        .map(|node| (node.node_id().clone(), node_summary(node.as_ref())))
        .collect();

    Ok(BootstrapResult {
        bootnode_service_id: seed.node_id().clone(),
        node_info,
        signer_keystore_content,
        signer_account_password,
    })
}
