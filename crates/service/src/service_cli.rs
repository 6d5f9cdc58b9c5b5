use crate::{BulkCopier, ServiceError};
use async_trait::async_trait;
use lambda_runtime::tracing;
use std::process::Output;
use tokio::process::Command;

/// Default program name, resolved through `PATH`
pub const DEFAULT_AWS_CLI: &str = "aws";

const OWNER_FULL_CONTROL: &str = "bucket-owner-full-control";

/// `BulkCopier` which shells out to `aws s3 cp --recursive`.
#[derive(Debug, Clone)]
pub struct AwsCliCopier {
    program: String,
}

impl AwsCliCopier {
    pub fn new(program: impl Into<String>) -> Self {
        AwsCliCopier {
            program: program.into(),
        }
    }
}

impl Default for AwsCliCopier {
    fn default() -> Self {
        AwsCliCopier::new(DEFAULT_AWS_CLI)
    }
}

#[async_trait]
impl BulkCopier for AwsCliCopier {
    async fn copy_prefix(&self, source_uri: &str, destination_uri: &str) -> Result<(), ServiceError> {
        tracing::debug!(program = %self.program, source_uri, destination_uri, "Starting bulk copy");

        let output: Output = Command::new(&self.program)
            .args(["s3", "cp", source_uri, destination_uri])
            .args(["--recursive", "--acl", OWNER_FULL_CONTROL, "--only-show-errors"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| ServiceError::Command {
                program: self.program.clone(),
                status: "not started".to_string(),
                stderr: err.to_string(),
            })?;

        if !output.status.success() {
            return Err(ServiceError::Command {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn succeeds_when_program_exits_cleanly() {
        let copier: AwsCliCopier = AwsCliCopier::new("true");

        copier
            .copy_prefix("s3://exports/task/", "s3://destination/task/")
            .await
            .expect("Exit status 0 should be success");
    }

    #[tokio::test]
    async fn fails_on_non_zero_exit() {
        let copier: AwsCliCopier = AwsCliCopier::new("false");

        let result = copier
            .copy_prefix("s3://exports/task/", "s3://destination/task/")
            .await;

        assert!(matches!(result, Err(ServiceError::Command { .. })));
    }

    #[tokio::test]
    async fn fails_when_program_is_missing() {
        let copier: AwsCliCopier = AwsCliCopier::new("/nonexistent/aws");

        let result = copier
            .copy_prefix("s3://exports/task/", "s3://destination/task/")
            .await;

        assert!(matches!(result, Err(ServiceError::Command { status, .. }) if status == "not started"));
    }
}
