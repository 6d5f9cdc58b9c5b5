use crate::error::PipelineError;
use model::env::{
    DB_NAME, SNAPSHOT_BUCKET_NAME, SNAPSHOT_TASK_KEY, SNAPSHOT_TASK_ROLE, TRANSFER_ACCESS_POINT,
    TRANSFER_PREFIX,
};

/// Deployment settings, read fresh for every invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub base_name: String,
    pub bucket_name: String,
    pub export_role_arn: String,
    pub export_key_arn: String,
    pub transfer_access_point: String,
    pub transfer_prefix: Option<String>,
}

impl PipelineConfig {
    pub fn from_env() -> Result<PipelineConfig, PipelineError> {
        PipelineConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<PipelineConfig, PipelineError> {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &'static str| optional(key).ok_or(PipelineError::MissingConfig(key));

        Ok(PipelineConfig {
            base_name: required(DB_NAME)?,
            bucket_name: required(SNAPSHOT_BUCKET_NAME)?,
            export_role_arn: required(SNAPSHOT_TASK_ROLE)?,
            export_key_arn: required(SNAPSHOT_TASK_KEY)?,
            transfer_access_point: required(TRANSFER_ACCESS_POINT)?,
            transfer_prefix: optional(TRANSFER_PREFIX),
        })
    }
}
