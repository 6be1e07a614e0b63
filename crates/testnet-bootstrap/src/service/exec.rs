use crate::domain::ExecError;
use crate::ports::NodeHandle;
use tracing::trace;

/// Run a command and fold a non-zero exit code into an error.
pub(crate) async fn exec_checked(
    node: &dyn NodeHandle,
    command: &[String],
) -> Result<String, ExecError> {
    let output = node.exec(command).await?;
    trace!(
        "[exec] '{}' on '{}' exited {} with output:\n{}",
        command.join(" "),
        node.node_id(),
        output.exit_code,
        output.output
    );

    if !output.is_success() {
        return Err(ExecError::NonZeroExit {
            node_id: node.node_id().clone(),
            command: command.join(" "),
            exit_code: output.exit_code,
            output: output.output,
        });
    }
    Ok(output.output)
}
