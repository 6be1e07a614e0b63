//! # Module Execution
//!
//! Configurator and executable module driven the way a harness would:
//! init args first, then `execute` with serialized params.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Value;
    use testnet_bootstrap::domain::StaticFilesConfig;
    use testnet_bootstrap::test_utils::SimulatedCluster;
    use testnet_bootstrap::BootstrapConfig;
    use testnet_module::{EthereumTestnetModule, ExecuteResult, TestnetModuleConfigurator};

    fn cluster() -> SimulatedCluster {
        SimulatedCluster::new().with_signer_files(
            &StaticFilesConfig::default(),
            "{\"address\":\"14f6136b48b74b147926c9f24323d16c1e54a026\"}",
            "password",
        )
    }

    #[tokio::test]
    async fn test_execute_end_to_end_result_shape() {
        let cluster = cluster();
        let module = EthereumTestnetModule::new(
            BootstrapConfig::for_testing(2),
            Arc::new(cluster.clone()),
            Arc::new(cluster.clone()),
        )
        .unwrap();

        let output = module.execute("{}").await.unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["bootnode_service_id"], "bootnode");
        for id in ["bootnode", "ethereum-node-1", "ethereum-node-2"] {
            let node = &value["node_info"][id];
            assert!(node["ip_addr_inside_network"].is_string(), "{id}");
            assert_eq!(node["exposed_ports_set"]["8545/tcp"], true, "{id}");
            assert!(node["port_bindings_on_local_machine"]["8545/tcp"]["interface_port"].is_string());
        }
        assert_eq!(value["signer_account_password"], "password");
        assert!(value["signer_keystore_content"]
            .as_str()
            .unwrap()
            .contains("14f6136b"));

        let typed: ExecuteResult = serde_json::from_value(value).unwrap();
        assert_eq!(typed.node_info.len(), 3);
    }

    #[tokio::test]
    async fn test_configurator_builds_module_from_init_args() {
        let configurator = TestnetModuleConfigurator::new(BootstrapConfig::for_testing(1));

        let module = configurator
            .parse_params_and_create_module(r#"{"logLevel":"debug"}"#, Arc::new(cluster()));

        assert!(module.is_ok());
    }

    #[tokio::test]
    async fn test_failed_run_reports_cause() {
        let cluster = cluster().never_ready("ethereum-node-1");
        let module = EthereumTestnetModule::new(
            BootstrapConfig::for_testing(2),
            Arc::new(cluster.clone()),
            Arc::new(cluster),
        )
        .unwrap();

        let err = module.execute("{}").await.unwrap_err();
        let rendered = format!("{err:#}");

        assert!(rendered.starts_with("An error occurred starting the Ethereum nodes"));
        assert!(rendered.contains("ethereum-node-1"));
        assert!(rendered.contains("connection refused"));
    }
}
