use async_trait::async_trait;
use aws_sdk_rds::error::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use model::Error;
use model::resource::{
    ClusterSnapshot, ExportRequest, ExportTaskDescriptor, ObjectPage, ResourceTag,
    RestoreClusterRequest,
};
use std::fmt::Debug;
use thiserror::Error;

pub mod service_cli;
pub mod service_rds;
pub mod service_s3;

/// The RDS operations the pipeline drives.
/// Every mutating call returns as soon as the request is accepted.
#[async_trait]
pub trait DatabaseControlPlane: Send + Sync {
    async fn describe_cluster_snapshot(
        &self,
        snapshot_identifier: &str,
    ) -> Result<Option<ClusterSnapshot>, ServiceError>;

    /// Returns the ARN of the cluster being created.
    async fn restore_cluster_from_snapshot(
        &self,
        request: RestoreClusterRequest,
    ) -> Result<String, ServiceError>;

    /// Returns the ARN of the snapshot being created.
    async fn create_cluster_snapshot(
        &self,
        cluster_identifier: &str,
        snapshot_identifier: &str,
    ) -> Result<String, ServiceError>;

    async fn add_tags(&self, resource_arn: &str, tags: &[ResourceTag]) -> Result<(), ServiceError>;

    async fn start_export_task(
        &self,
        request: ExportRequest,
    ) -> Result<ExportTaskDescriptor, ServiceError>;

    async fn describe_export_task(
        &self,
        export_task_identifier: &str,
    ) -> Result<Option<ExportTaskDescriptor>, ServiceError>;

    async fn delete_cluster_snapshot(&self, snapshot_identifier: &str) -> Result<(), ServiceError>;

    /// Deletes without taking a final snapshot.
    async fn delete_cluster(&self, cluster_identifier: &str) -> Result<(), ServiceError>;
}

/// Object storage used by the ownership transfer fallback.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, ServiceError>;

    /// Copy a single object granting the destination bucket owner full control.
    async fn copy_object_to_owner(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), ServiceError>;
}

/// Recursive copy between two `s3://` locations in one go.
#[async_trait]
pub trait BulkCopier: Send + Sync {
    async fn copy_prefix(&self, source_uri: &str, destination_uri: &str) -> Result<(), ServiceError>;
}

/// Errors from the control-plane and storage services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{operation} failed: {message}")]
    Request {
        operation: &'static str,
        message: String,
        #[source]
        source: Error,
    },
    /// The resource was already created, usually by an earlier delivery of the same event
    #[error("{operation} failed, {resource} already exists")]
    AlreadyExists {
        operation: &'static str,
        resource: String,
    },
    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
    #[error("`{program}` failed ({status}): {stderr}")]
    Command {
        program: String,
        status: String,
        stderr: String,
    },
}

impl ServiceError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ServiceError::AlreadyExists { .. })
    }
}

pub(crate) fn is_already_exists_code(code: &str) -> bool {
    code.contains("AlreadyExists")
}

/// Error code reported by the service, if the request got that far.
pub(crate) fn service_error_code<E, R>(err: &SdkError<E, R>) -> Option<&str>
where
    E: ProvideErrorMetadata,
{
    err.as_service_error().and_then(|service_err| service_err.code())
}

/// Convert an SDK failure, classifying "already exists" responses.
pub(crate) fn sdk_failure<E, R>(
    operation: &'static str,
    resource: &str,
    err: SdkError<E, R>,
) -> ServiceError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    if service_error_code(&err).is_some_and(is_already_exists_code) {
        return ServiceError::AlreadyExists {
            operation,
            resource: resource.to_string(),
        };
    }

    ServiceError::Request {
        operation,
        message: DisplayErrorContext(&err).to_string(),
        source: err.into(),
    }
}
