use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::lineage_filter::LineageFilter;
use crate::ownership::transfer_ownership;
use crate::stages::{StageOutcome, resolve_export_task_id};
use lambda_runtime::tracing;
use model::event::LifecycleEvent;
use model::resource::ExportTaskDescriptor;
use service::ServiceError;

/// Hand the exported objects over and tear down the temporary cluster and snapshot.
///
/// Runs the same way whether the export completed or failed, so a failed export
/// never leaves the provisioned cluster running.
pub async fn clean_up(
    ctx: &PipelineContext<'_>,
    event: &LifecycleEvent,
) -> Result<StageOutcome, PipelineError> {
    if !LineageFilter::new(&ctx.lineage).admits_manual_snapshot(event.subject_name()) {
        return Ok(StageOutcome::Filtered);
    }

    match resolve_export_task_id(ctx).await {
        Ok((_, export_task_id)) => transfer_export(ctx, event, &export_task_id).await?,
        // An earlier delivery got as far as deleting the snapshot; the cluster may remain
        Err(PipelineError::SnapshotNotFound(snapshot)) => tracing::warn!(
            snapshot = %snapshot,
            "Manual snapshot already deleted, skipping ownership transfer"
        ),
        Err(err) => return Err(err),
    }

    delete_temporary_resources(ctx).await?;

    Ok(StageOutcome::Requested(ctx.lineage.provisioned_cluster_name()))
}

async fn transfer_export(
    ctx: &PipelineContext<'_>,
    event: &LifecycleEvent,
    export_task_id: &str,
) -> Result<(), PipelineError> {
    tracing::info!(export_task_id, kind = ?event.kind(), "Cleaning up after export");

    let task: Option<ExportTaskDescriptor> = ctx.database.describe_export_task(export_task_id).await?;
    match task {
        Some(task) => {
            tracing::info!(status = task.status.as_deref().unwrap_or_default(), "Found export task");
            // A failed transfer aborts before teardown; the snapshot is needed to
            // re-derive the task id when the notification is redelivered.
            transfer_ownership(ctx, &task).await?;
        }
        None => tracing::warn!(export_task_id, "Export task not found, skipping ownership transfer"),
    }

    Ok(())
}

/// Delete the manual snapshot then the cluster. The cluster is still deleted when
/// the snapshot deletion fails; all failures are reported together.
async fn delete_temporary_resources(ctx: &PipelineContext<'_>) -> Result<(), PipelineError> {
    let snapshot_identifier: String = ctx.lineage.snapshot_name();
    let cluster_identifier: String = ctx.lineage.provisioned_cluster_name();
    let mut failures: Vec<ServiceError> = Vec::new();

    match ctx.database.delete_cluster_snapshot(&snapshot_identifier).await {
        Ok(()) => tracing::info!(snapshot = snapshot_identifier, "Deleted manual snapshot"),
        Err(err) => {
            tracing::error!(snapshot = snapshot_identifier, error = %err, "Failed to delete manual snapshot");
            failures.push(err);
        }
    }

    match ctx.database.delete_cluster(&cluster_identifier).await {
        Ok(()) => tracing::info!(cluster = cluster_identifier, "Deleted provisioned cluster"),
        Err(err) => {
            tracing::error!(cluster = cluster_identifier, error = %err, "Failed to delete provisioned cluster");
            failures.push(err);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::CleanupIncomplete(failures))
    }
}
