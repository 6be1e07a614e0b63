//! # Container Specs
//!
//! What the launcher is asked to start for each role: image, declared
//! ports, geth entrypoint and the static-files mount.

use super::config::BootstrapConfig;
use super::types::{FilesArtifactId, PortSpec};
use std::collections::BTreeMap;

/// Command that prints the local node's ENR through the IPC console.
pub const ENR_COMMAND: &str = "geth attach data/geth.ipc --exec admin.nodeInfo.enr";

/// Command that lists the local node's connected peers through the IPC console.
pub const PEERS_COMMAND: &str = "geth attach data/geth.ipc --exec admin.peers";

/// Wrap a console command for execution through a shell.
pub fn shell_command(cmd: &str) -> Vec<String> {
    vec!["/bin/sh".to_string(), "-c".to_string(), cmd.to_string()]
}

/// Print a file without going through a shell, so the path stays one argument.
pub fn cat_command(path: &str) -> Vec<String> {
    vec!["cat".to_string(), path.to_string()]
}

/// Everything the launcher needs to start one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    pub image: String,
    /// Declared ports keyed by port id.
    pub used_ports: BTreeMap<String, PortSpec>,
    pub entrypoint: Vec<String>,
    /// Files artifacts and where they are mounted.
    pub files: BTreeMap<FilesArtifactId, String>,
    /// Token in `entrypoint` the launcher replaces with the node's private IP.
    pub private_ip_placeholder: Option<String>,
}

impl ContainerConfig {
    /// Port declarations in the `<number>/<protocol>` form.
    pub fn exposed_ports(&self) -> Vec<PortSpec> {
        self.used_ports.values().copied().collect()
    }

    /// Entrypoint with the private-IP placeholder substituted.
    pub fn entrypoint_for(&self, private_ip: &str) -> Vec<String> {
        match &self.private_ip_placeholder {
            Some(placeholder) => self
                .entrypoint
                .iter()
                .map(|arg| arg.replace(placeholder.as_str(), private_ip))
                .collect(),
            None => self.entrypoint.clone(),
        }
    }
}

/// Builder for [`ContainerConfig`].
#[derive(Debug, Clone)]
pub struct ContainerConfigBuilder {
    config: ContainerConfig,
}

impl ContainerConfigBuilder {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            config: ContainerConfig {
                image: image.into(),
                used_ports: BTreeMap::new(),
                entrypoint: Vec::new(),
                files: BTreeMap::new(),
                private_ip_placeholder: None,
            },
        }
    }

    pub fn with_used_ports<'a>(
        mut self,
        ports: impl IntoIterator<Item = (&'a str, PortSpec)>,
    ) -> Self {
        self.config
            .used_ports
            .extend(ports.into_iter().map(|(id, spec)| (id.to_string(), spec)));
        self
    }

    pub fn with_entrypoint_override(mut self, args: Vec<String>) -> Self {
        self.config.entrypoint = args;
        self
    }

    pub fn with_files(mut self, artifact: FilesArtifactId, mountpoint: impl Into<String>) -> Self {
        self.config.files.insert(artifact, mountpoint.into());
        self
    }

    pub fn with_private_ip_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.private_ip_placeholder = Some(placeholder.into());
        self
    }

    pub fn build(self) -> ContainerConfig {
        self.config
    }
}

/// Container for the seed: initialises the genesis, unlocks the signer and mines.
pub fn bootnode_container_config(
    config: &BootstrapConfig,
    artifact: &FilesArtifactId,
) -> ContainerConfig {
    let net = &config.network;
    let files = &config.files;
    let placeholder = &net.private_ip_placeholder;

    let script = format!(
        "geth init --datadir data {genesis} && \
         geth \
         --keystore {keystore_dir} \
         --datadir data \
         --networkid {network_id} \
         -http \
         --http.api admin,eth,net,web3,miner,personal,txpool,debug \
         --http.addr=0.0.0.0 \
         --http.port={rpc_port} \
         --http.corsdomain '*' \
         --http.vhosts=* \
         --nat extip:{placeholder} \
         --port={discovery_port} \
         --unlock {signer} \
         --mine \
         --allow-insecure-unlock \
         --netrestrict {placeholder}/24 \
         --password {password}",
        genesis = files.mounted_path(&files.genesis_file),
        keystore_dir = files.mounted_path(""),
        network_id = net.network_id,
        rpc_port = net.rpc_port,
        placeholder = placeholder,
        discovery_port = net.discovery_port,
        signer = net.signer_address,
        password = files.mounted_path(&files.password_file),
    );

    ContainerConfigBuilder::new(&net.image)
        .with_used_ports(net.used_ports())
        .with_entrypoint_override(vec!["/bin/sh".to_string(), "-c".to_string(), script])
        .with_files(artifact.clone(), &files.mountpoint)
        .with_private_ip_placeholder(placeholder)
        .build()
}

/// Container for a peer: same genesis, dials the seed through `--bootnodes`.
///
/// No key material is referenced.
pub fn peer_container_config(
    config: &BootstrapConfig,
    artifact: &FilesArtifactId,
    bootnode_enr: &str,
) -> ContainerConfig {
    let net = &config.network;
    let files = &config.files;
    let placeholder = &net.private_ip_placeholder;

    let script = format!(
        "geth init --datadir data {genesis} && \
         geth \
         --datadir data \
         --networkid {network_id} \
         -http \
         --http.api admin,eth,net,web3,miner,personal,txpool,debug \
         --http.addr=0.0.0.0 \
         --http.port={rpc_port} \
         --http.corsdomain '*' \
         --http.vhosts=* \
         --nat extip:{placeholder} \
         --gcmode archive \
         --syncmode full \
         --port={discovery_port} \
         --bootnodes {bootnode_enr}",
        genesis = files.mounted_path(&files.genesis_file),
        network_id = net.network_id,
        rpc_port = net.rpc_port,
        placeholder = placeholder,
        discovery_port = net.discovery_port,
        bootnode_enr = bootnode_enr,
    );

    ContainerConfigBuilder::new(&net.image)
        .with_used_ports(net.used_ports())
        .with_entrypoint_override(vec!["/bin/sh".to_string(), "-c".to_string(), script])
        .with_files(artifact.clone(), &files.mountpoint)
        .with_private_ip_placeholder(placeholder)
        .build()
}
