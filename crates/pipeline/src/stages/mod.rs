//! One handler per pipeline stage. Each issues its control-plane request and returns;
//! the next stage is driven by the notification that request eventually produces.

use crate::context::PipelineContext;
use crate::error::PipelineError;
use model::lineage::Lineage;
use model::resource::{ClusterSnapshot, ResourceArn, ResourceTag};

pub mod cleanup;
pub mod export;
pub mod restore;
pub mod snapshot;

const TEMPORARY_TAG: &str = "temporary";
const SOURCE_DATABASE_TAG: &str = "source-database";

/// What an invocation did with its notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// A request was issued against the named resource
    Requested(String),
    /// The subject belongs to another lineage
    Filtered,
    /// Not a notification the pipeline acts on
    Ignored,
}

/// Marks resources created by the pipeline so operators can tell they are short-lived.
pub(crate) fn temporary_tags(lineage: &Lineage) -> Vec<ResourceTag> {
    vec![
        ResourceTag::new(TEMPORARY_TAG, "true"),
        ResourceTag::new(SOURCE_DATABASE_TAG, lineage.base_name()),
    ]
}

/// Look up the lineage's manual snapshot and derive its export task id.
/// Shared by the export and cleanup stages so both always agree on the id.
pub(crate) async fn resolve_export_task_id(
    ctx: &PipelineContext<'_>,
) -> Result<(ClusterSnapshot, String), PipelineError> {
    let snapshot_name: String = ctx.lineage.snapshot_name();

    let snapshot: ClusterSnapshot = ctx
        .database
        .describe_cluster_snapshot(&snapshot_name)
        .await?
        .ok_or_else(|| PipelineError::SnapshotNotFound(snapshot_name.clone()))?;

    let created_at = snapshot.created_at.ok_or_else(|| PipelineError::IncompleteSnapshot {
        snapshot: snapshot_name.clone(),
        field: "SnapshotCreateTime",
    })?;
    let snapshot_arn: ResourceArn = ResourceArn::parse(&snapshot.arn)?;

    let export_task_id: String = ctx
        .lineage
        .export_task_id(created_at.date_naive(), &snapshot_arn);

    Ok((snapshot, export_task_id))
}
