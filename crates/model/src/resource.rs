use crate::ModelError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The parts of an ARN the pipeline correlates on.
///
/// `arn:aws:rds:us-west-2:123456789012:cluster-snapshot:rds:sales-2021-05-12-10-40`
/// has resource type `cluster-snapshot` and resource id `rds:sales-2021-05-12-10-40`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceArn {
    pub arn: String,
    pub region: String,
    pub account_id: String,
    pub resource_type: String,
    pub resource_id: String,
}

impl ResourceArn {
    pub fn parse(arn: &str) -> Result<ResourceArn, ModelError> {
        let parts: Vec<&str> = arn.splitn(7, ':').collect();

        match parts.as_slice() {
            ["arn", _partition, _service, region, account_id, resource_type, resource_id]
                if !resource_id.is_empty() =>
            {
                Ok(ResourceArn {
                    arn: arn.to_string(),
                    region: region.to_string(),
                    account_id: account_id.to_string(),
                    resource_type: resource_type.to_string(),
                    resource_id: resource_id.to_string(),
                })
            }
            _ => Err(ModelError::MalformedArn(arn.to_string())),
        }
    }
}

/// Key/value tag applied to resources the pipeline creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTag {
    pub key: String,
    pub value: String,
}

impl ResourceTag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        ResourceTag {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterSnapshot {
    pub identifier: String,
    pub arn: String,
    pub engine: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Request to restore a snapshot into a new provisioned cluster.
#[derive(Debug, Clone)]
pub struct RestoreClusterRequest {
    pub cluster_identifier: String,
    pub snapshot_identifier: String,
    pub engine: String,
}

/// Request to export a snapshot to S3.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub export_task_identifier: String,
    pub source_arn: String,
    pub bucket_name: String,
    pub iam_role_arn: String,
    pub kms_key_id: String,
}

/// Serializable view of an RDS export task.
/// Timestamps are kept as RFC 3339 strings so the whole thing can be logged as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportTaskDescriptor {
    pub export_task_identifier: String,
    pub source_arn: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_prefix: Option<String>,
    pub status: Option<String>,
    pub snapshot_time: Option<String>,
    pub task_start_time: Option<String>,
}

impl ExportTaskDescriptor {
    /// Prefix the export task wrote its objects under.
    /// RDS always nests the output in a folder named after the task.
    pub fn object_prefix(&self) -> String {
        match self.s3_prefix.as_deref().map(|p| p.trim_matches('/')) {
            Some(prefix) if !prefix.is_empty() => {
                format!("{}/{}", prefix, self.export_task_identifier)
            }
            _ => self.export_task_identifier.clone(),
        }
    }
}

/// A single page of an object listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    pub next_continuation_token: Option<String>,
}
