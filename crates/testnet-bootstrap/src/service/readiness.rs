//! Bounded polling of a node's admin endpoint.

use crate::domain::{BootstrapError, ReadinessConfig};
use crate::ports::{AdminRpc, NodeHandle};
use tokio::time::sleep;
use tracing::{debug, info};

/// Wait until `admin_nodeInfo` answers on the node's private IP.
///
/// Sleeps `initial_delay`, then makes up to `retries` attempts with
/// `retry_delay` between failures. Each attempt is bounded by the RPC
/// client's own per-call timeout; a timed-out call is one failed attempt.
pub async fn wait_for_admin_endpoint(
    rpc: &dyn AdminRpc,
    node: &dyn NodeHandle,
    policy: &ReadinessConfig,
) -> Result<(), BootstrapError> {
    sleep(policy.initial_delay).await;

    let mut last_error = None;
    for attempt in 1..=policy.retries {
        match rpc.node_info(node.private_ip()).await {
            Ok(_) => {
                info!(
                    "Node '{}' admin endpoint is up after {} attempt(s)",
                    node.node_id(),
                    attempt
                );
                return Ok(());
            }
            Err(err) => {
                debug!(
                    "Admin endpoint of '{}' not ready (attempt {}/{}): {}",
                    node.node_id(),
                    attempt,
                    policy.retries,
                    err
                );
                last_error = Some(err);
                if attempt < policy.retries {
                    sleep(policy.retry_delay).await;
                }
            }
        }
    }

    Err(BootstrapError::ReadinessTimeout {
        node_id: node.node_id().clone(),
        attempts: policy.retries,
        last_error,
    })
}
