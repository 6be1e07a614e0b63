//! Peer-count verification and its retry driver.

use super::exec::exec_checked;
use crate::domain::{
    count_peers, shell_command, BootstrapError, ConvergenceConfig, PeerCountError, PEERS_COMMAND,
};
use crate::ports::NodeHandle;
use tokio::time::sleep;
use tracing::{debug, info};

/// Check once whether `node` reports exactly `expected` peers.
///
/// Single probe, no retry: a failed command is an `Exec` error, a wrong
/// count is a `Mismatch` carrying both numbers.
pub async fn verify_expected_peers(
    node: &dyn NodeHandle,
    expected: usize,
) -> Result<(), PeerCountError> {
    let output = exec_checked(node, &shell_command(PEERS_COMMAND)).await?;
    let actual = count_peers(&output);

    if actual != expected as i64 {
        return Err(PeerCountError::Mismatch {
            node_id: node.node_id().clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Probe `node` until it reports `expected` peers or the budget runs out.
///
/// Returns the number of attempts used. Command failures count as failed
/// attempts here rather than aborting the run.
pub async fn await_peer_count(
    node: &dyn NodeHandle,
    expected: usize,
    policy: &ConvergenceConfig,
) -> Result<u32, BootstrapError> {
    let mut last_observed = None;

    for attempt in 1..=policy.max_attempts {
        match verify_expected_peers(node, expected).await {
            Ok(()) => {
                info!(
                    "Node '{}' reached {} peers after {} attempt(s)",
                    node.node_id(),
                    expected,
                    attempt
                );
                return Ok(attempt);
            }
            Err(err) => {
                if let PeerCountError::Mismatch { actual, .. } = &err {
                    last_observed = Some(*actual);
                }
                debug!(
                    "Verifying expected number of peers on node '{}' failed (attempt {}/{}):\n{}",
                    node.node_id(),
                    attempt,
                    policy.max_attempts,
                    err
                );
                if attempt < policy.max_attempts {
                    sleep(policy.attempt_delay).await;
                }
            }
        }
    }

    Err(BootstrapError::ConvergenceMismatch {
        node_id: node.node_id().clone(),
        expected,
        last_observed,
        attempts: policy.max_attempts,
        delay: policy.attempt_delay,
    })
}
