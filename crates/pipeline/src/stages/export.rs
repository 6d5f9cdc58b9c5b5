use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::lineage_filter::LineageFilter;
use crate::stages::{StageOutcome, resolve_export_task_id};
use lambda_runtime::tracing;
use model::event::LifecycleEvent;
use model::resource::{ExportRequest, ExportTaskDescriptor};

/// Export the manual snapshot to the configured bucket.
pub async fn start_export(
    ctx: &PipelineContext<'_>,
    event: &LifecycleEvent,
) -> Result<StageOutcome, PipelineError> {
    if !LineageFilter::new(&ctx.lineage).admits_manual_snapshot(event.subject_name()) {
        return Ok(StageOutcome::Filtered);
    }

    let (snapshot, export_task_id) = resolve_export_task_id(ctx).await?;

    tracing::info!(
        snapshot = snapshot.identifier,
        export_task_id,
        bucket = ctx.config.bucket_name,
        "Starting snapshot export"
    );

    let task: ExportTaskDescriptor = ctx
        .database
        .start_export_task(ExportRequest {
            export_task_identifier: export_task_id.clone(),
            source_arn: snapshot.arn,
            bucket_name: ctx.config.bucket_name.clone(),
            iam_role_arn: ctx.config.export_role_arn.clone(),
            kms_key_id: ctx.config.export_key_arn.clone(),
        })
        .await?;

    tracing::info!(
        task = serde_json::to_string(&task).unwrap_or_default(),
        "Snapshot export task started"
    );

    Ok(StageOutcome::Requested(export_task_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestPipeline, event};

    #[tokio::test]
    async fn missing_manual_snapshot_is_an_error() {
        let pipeline: TestPipeline = TestPipeline::new();

        let result = start_export(&pipeline.ctx(), &event("RDS-EVENT-0075", "sales-snapshot")).await;

        assert!(matches!(result, Err(PipelineError::SnapshotNotFound(name)) if name == "sales-snapshot"));
        assert!(pipeline.database.started_exports().is_empty());
    }

    #[tokio::test]
    async fn snapshot_without_creation_time_is_an_error() {
        let pipeline: TestPipeline = TestPipeline::new();
        pipeline
            .database
            .insert_snapshot(test_utils::cluster_snapshot("sales-snapshot", None));

        let result = start_export(&pipeline.ctx(), &event("RDS-EVENT-0075", "sales-snapshot")).await;

        assert!(matches!(result, Err(PipelineError::IncompleteSnapshot { .. })));
        assert!(pipeline.database.started_exports().is_empty());
    }

    #[tokio::test]
    async fn replayed_export_fails_as_already_exists() {
        let pipeline: TestPipeline = TestPipeline::new();
        pipeline.database.insert_snapshot(test_utils::cluster_snapshot(
            "sales-snapshot",
            Some(test_utils::snapshot_created_at()),
        ));
        let notification = event("RDS-EVENT-0075", "sales-snapshot");

        start_export(&pipeline.ctx(), &notification).await.unwrap();
        let replay = start_export(&pipeline.ctx(), &notification).await;

        assert!(matches!(replay, Err(PipelineError::Service(err)) if err.is_already_exists()));
        assert_eq!(2, pipeline.database.started_exports().len());
    }
}
