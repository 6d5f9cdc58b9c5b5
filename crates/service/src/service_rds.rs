use crate::{DatabaseControlPlane, ServiceError, sdk_failure, service_error_code};
use async_trait::async_trait;
use aws_sdk_rds::operation::describe_db_cluster_snapshots::DescribeDbClusterSnapshotsOutput;
use aws_sdk_rds::operation::describe_export_tasks::DescribeExportTasksOutput;
use aws_sdk_rds::operation::start_export_task::StartExportTaskOutput;
use aws_sdk_rds::types::{DbClusterSnapshot, ExportTask, Tag};
use aws_smithy_types::DateTime;
use lambda_runtime::tracing;
use aws_smithy_types::date_time::Format;
use model::event::AUTOMATED_SNAPSHOT_PREFIX;
use model::resource::{
    ClusterSnapshot, ExportRequest, ExportTaskDescriptor, ResourceTag, RestoreClusterRequest,
};

const SNAPSHOT_NOT_FOUND: &str = "DBClusterSnapshotNotFoundFault";
const EXPORT_TASK_NOT_FOUND: &str = "ExportTaskNotFound";
const PROVISIONED_ENGINE_MODE: &str = "provisioned";
const AUTOMATED_SNAPSHOT_TYPE: &str = "automated";

/// `DatabaseControlPlane` backed by the RDS API.
#[derive(Clone)]
pub struct RdsControlPlane {
    rds: aws_sdk_rds::Client,
}

impl RdsControlPlane {
    pub fn new(rds: aws_sdk_rds::Client) -> Self {
        RdsControlPlane { rds }
    }
}

#[async_trait]
impl DatabaseControlPlane for RdsControlPlane {
    async fn describe_cluster_snapshot(
        &self,
        snapshot_identifier: &str,
    ) -> Result<Option<ClusterSnapshot>, ServiceError> {
        let result = self
            .rds
            .describe_db_cluster_snapshots()
            .db_cluster_snapshot_identifier(snapshot_identifier)
            // Automated snapshots are only listed when asked for by type
            .set_snapshot_type(
                snapshot_identifier
                    .starts_with(AUTOMATED_SNAPSHOT_PREFIX)
                    .then(|| AUTOMATED_SNAPSHOT_TYPE.to_string()),
            )
            .send()
            .await;

        let output: DescribeDbClusterSnapshotsOutput = match result {
            Ok(output) => output,
            Err(err) if service_error_code(&err) == Some(SNAPSHOT_NOT_FOUND) => return Ok(None),
            Err(err) => {
                return Err(sdk_failure("DescribeDBClusterSnapshots", snapshot_identifier, err));
            }
        };

        Ok(output.db_cluster_snapshots().first().map(cluster_snapshot))
    }

    async fn restore_cluster_from_snapshot(
        &self,
        request: RestoreClusterRequest,
    ) -> Result<String, ServiceError> {
        let output = self
            .rds
            .restore_db_cluster_from_snapshot()
            .db_cluster_identifier(&request.cluster_identifier)
            .snapshot_identifier(&request.snapshot_identifier)
            .engine(&request.engine)
            .engine_mode(PROVISIONED_ENGINE_MODE)
            .send()
            .await
            .map_err(|err| {
                sdk_failure("RestoreDBClusterFromSnapshot", &request.cluster_identifier, err)
            })?;

        output
            .db_cluster()
            .and_then(|cluster| cluster.db_cluster_arn())
            .map(str::to_string)
            .ok_or(ServiceError::MissingField {
                operation: "RestoreDBClusterFromSnapshot",
                field: "DBClusterArn",
            })
    }

    async fn create_cluster_snapshot(
        &self,
        cluster_identifier: &str,
        snapshot_identifier: &str,
    ) -> Result<String, ServiceError> {
        let output = self
            .rds
            .create_db_cluster_snapshot()
            .db_cluster_identifier(cluster_identifier)
            .db_cluster_snapshot_identifier(snapshot_identifier)
            .send()
            .await
            .map_err(|err| sdk_failure("CreateDBClusterSnapshot", snapshot_identifier, err))?;

        output
            .db_cluster_snapshot()
            .and_then(|snapshot| snapshot.db_cluster_snapshot_arn())
            .map(str::to_string)
            .ok_or(ServiceError::MissingField {
                operation: "CreateDBClusterSnapshot",
                field: "DBClusterSnapshotArn",
            })
    }

    async fn add_tags(&self, resource_arn: &str, tags: &[ResourceTag]) -> Result<(), ServiceError> {
        let tags: Vec<Tag> = tags
            .iter()
            .map(|tag| Tag::builder().key(&tag.key).value(&tag.value).build())
            .collect();

        self.rds
            .add_tags_to_resource()
            .resource_name(resource_arn)
            .set_tags(Some(tags))
            .send()
            .await
            .map_err(|err| sdk_failure("AddTagsToResource", resource_arn, err))?;

        Ok(())
    }

    async fn start_export_task(
        &self,
        request: ExportRequest,
    ) -> Result<ExportTaskDescriptor, ServiceError> {
        let output: StartExportTaskOutput = self
            .rds
            .start_export_task()
            .export_task_identifier(&request.export_task_identifier)
            .source_arn(&request.source_arn)
            .s3_bucket_name(&request.bucket_name)
            .iam_role_arn(&request.iam_role_arn)
            .kms_key_id(&request.kms_key_id)
            .send()
            .await
            .map_err(|err| sdk_failure("StartExportTask", &request.export_task_identifier, err))?;

        Ok(ExportTaskDescriptor {
            export_task_identifier: output
                .export_task_identifier()
                .unwrap_or(&request.export_task_identifier)
                .to_string(),
            source_arn: output.source_arn().map(str::to_string),
            s3_bucket: output.s3_bucket().map(str::to_string),
            s3_prefix: output.s3_prefix().map(str::to_string),
            status: output.status().map(str::to_string),
            snapshot_time: output.snapshot_time().and_then(rfc3339),
            task_start_time: output.task_start_time().and_then(rfc3339),
        })
    }

    async fn describe_export_task(
        &self,
        export_task_identifier: &str,
    ) -> Result<Option<ExportTaskDescriptor>, ServiceError> {
        let result = self
            .rds
            .describe_export_tasks()
            .export_task_identifier(export_task_identifier)
            .send()
            .await;

        let output: DescribeExportTasksOutput = match result {
            Ok(output) => output,
            Err(err) if service_error_code(&err) == Some(EXPORT_TASK_NOT_FOUND) => return Ok(None),
            Err(err) => return Err(sdk_failure("DescribeExportTasks", export_task_identifier, err)),
        };

        Ok(output
            .export_tasks()
            .iter()
            .find(|task| task.export_task_identifier() == Some(export_task_identifier))
            .map(export_task))
    }

    async fn delete_cluster_snapshot(&self, snapshot_identifier: &str) -> Result<(), ServiceError> {
        let result = self
            .rds
            .delete_db_cluster_snapshot()
            .db_cluster_snapshot_identifier(snapshot_identifier)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_db_cluster_snapshot_not_found_fault()) => {
                tracing::debug!(snapshot = snapshot_identifier, "Cluster snapshot already deleted");
                Ok(())
            }
            Err(err) => Err(sdk_failure("DeleteDBClusterSnapshot", snapshot_identifier, err)),
        }
    }

    async fn delete_cluster(&self, cluster_identifier: &str) -> Result<(), ServiceError> {
        let result = self
            .rds
            .delete_db_cluster()
            .db_cluster_identifier(cluster_identifier)
            .skip_final_snapshot(true)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_db_cluster_not_found_fault()) => {
                tracing::debug!(cluster = cluster_identifier, "Cluster already deleted");
                Ok(())
            }
            Err(err) => Err(sdk_failure("DeleteDBCluster", cluster_identifier, err)),
        }
    }
}

fn cluster_snapshot(snapshot: &DbClusterSnapshot) -> ClusterSnapshot {
    ClusterSnapshot {
        identifier: snapshot
            .db_cluster_snapshot_identifier()
            .unwrap_or_default()
            .to_string(),
        arn: snapshot.db_cluster_snapshot_arn().unwrap_or_default().to_string(),
        engine: snapshot.engine().map(str::to_string),
        created_at: snapshot
            .snapshot_create_time()
            .and_then(|time| chrono::DateTime::from_timestamp(time.secs(), time.subsec_nanos())),
    }
}

fn export_task(task: &ExportTask) -> ExportTaskDescriptor {
    ExportTaskDescriptor {
        export_task_identifier: task.export_task_identifier().unwrap_or_default().to_string(),
        source_arn: task.source_arn().map(str::to_string),
        s3_bucket: task.s3_bucket().map(str::to_string),
        s3_prefix: task.s3_prefix().map(str::to_string),
        status: task.status().map(str::to_string),
        snapshot_time: task.snapshot_time().and_then(rfc3339),
        task_start_time: task.task_start_time().and_then(rfc3339),
    }
}

/// SDK timestamps aren't serializable, so render them before they reach a log line.
fn rfc3339(time: &DateTime) -> Option<String> {
    time.fmt(Format::DateTime).ok()
}
