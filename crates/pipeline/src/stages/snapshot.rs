use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::lineage_filter::LineageFilter;
use crate::stages::{StageOutcome, temporary_tags};
use lambda_runtime::tracing;
use model::event::LifecycleEvent;

/// Take a manual snapshot of the restored provisioned cluster.
pub async fn snapshot_provisioned_cluster(
    ctx: &PipelineContext<'_>,
    event: &LifecycleEvent,
) -> Result<StageOutcome, PipelineError> {
    if !LineageFilter::new(&ctx.lineage).admits_provisioned_cluster(event.subject_name()) {
        return Ok(StageOutcome::Filtered);
    }

    let cluster_identifier: &str = event.subject_name();
    let snapshot_identifier: String = ctx.lineage.snapshot_name();

    tracing::info!(
        cluster = cluster_identifier,
        snapshot = snapshot_identifier,
        "Creating manual snapshot of provisioned cluster"
    );

    let snapshot_arn: String = ctx
        .database
        .create_cluster_snapshot(cluster_identifier, &snapshot_identifier)
        .await?;

    ctx.database
        .add_tags(&snapshot_arn, &temporary_tags(&ctx.lineage))
        .await?;

    tracing::info!(snapshot_arn, "Manual snapshot requested");

    Ok(StageOutcome::Requested(snapshot_identifier))
}
