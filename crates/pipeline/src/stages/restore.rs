use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::lineage_filter::LineageFilter;
use crate::stages::{StageOutcome, temporary_tags};
use lambda_runtime::tracing;
use model::event::LifecycleEvent;
use model::resource::{ClusterSnapshot, RestoreClusterRequest};

/// Restore an automated serverless snapshot into a new provisioned cluster.
pub async fn restore_to_provisioned(
    ctx: &PipelineContext<'_>,
    event: &LifecycleEvent,
) -> Result<StageOutcome, PipelineError> {
    if !LineageFilter::new(&ctx.lineage).admits_source_snapshot(event.subject_name())? {
        return Ok(StageOutcome::Filtered);
    }

    // Prefer the ARN, it resolves regardless of the snapshot type
    let snapshot_identifier: String = event
        .subject_arn
        .as_ref()
        .map(|arn| arn.arn.clone())
        .unwrap_or_else(|| event.subject_identifier.clone());
    let cluster_identifier: String = ctx.lineage.provisioned_cluster_name();

    let source: ClusterSnapshot = ctx
        .database
        .describe_cluster_snapshot(&event.subject_identifier)
        .await?
        .ok_or_else(|| PipelineError::SnapshotNotFound(event.subject_identifier.clone()))?;
    let engine: String = source.engine.ok_or_else(|| PipelineError::IncompleteSnapshot {
        snapshot: event.subject_identifier.clone(),
        field: "Engine",
    })?;

    tracing::info!(
        snapshot = snapshot_identifier,
        cluster = cluster_identifier,
        engine,
        "Restoring snapshot to a provisioned cluster"
    );

    let cluster_arn: String = ctx
        .database
        .restore_cluster_from_snapshot(RestoreClusterRequest {
            cluster_identifier: cluster_identifier.clone(),
            snapshot_identifier,
            engine,
        })
        .await?;

    ctx.database
        .add_tags(&cluster_arn, &temporary_tags(&ctx.lineage))
        .await?;

    tracing::info!(cluster_arn, "Provisioned cluster restore requested");

    Ok(StageOutcome::Requested(cluster_identifier))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TestPipeline, event};
    use model::ModelError;
    use test_utils::ControlPlaneCall;

    #[tokio::test]
    async fn undated_snapshot_name_fails_without_calls() {
        let pipeline: TestPipeline = TestPipeline::new();

        let result = restore_to_provisioned(&pipeline.ctx(), &event("RDS-EVENT-0169", "rds:sales")).await;

        assert!(matches!(
            result,
            Err(PipelineError::Model(ModelError::MalformedSnapshotName(_)))
        ));
        assert!(pipeline.database.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_source_snapshot_is_an_error() {
        let pipeline: TestPipeline = TestPipeline::new();

        let result = restore_to_provisioned(
            &pipeline.ctx(),
            &event("RDS-EVENT-0169", "rds:sales-2021-05-12-10-40"),
        )
        .await;

        assert!(matches!(result, Err(PipelineError::SnapshotNotFound(_))));
        assert_eq!(
            vec![ControlPlaneCall::DescribeClusterSnapshot(
                "rds:sales-2021-05-12-10-40".to_string()
            )],
            pipeline.database.calls()
        );
    }

    #[tokio::test]
    async fn restores_from_identifier_when_no_arn_given() {
        let pipeline: TestPipeline = TestPipeline::new();
        pipeline.database.insert_snapshot(test_utils::cluster_snapshot(
            "rds:sales-2021-05-12-10-40",
            Some(test_utils::snapshot_created_at()),
        ));

        let outcome: StageOutcome = restore_to_provisioned(
            &pipeline.ctx(),
            &event("RDS-EVENT-0169", "rds:sales-2021-05-12-10-40"),
        )
        .await
        .unwrap();

        assert_eq!(StageOutcome::Requested("sales-fordatalake".to_string()), outcome);
        assert!(pipeline.database.mutating_calls().contains(&ControlPlaneCall::RestoreCluster {
            cluster: "sales-fordatalake".to_string(),
            snapshot: "rds:sales-2021-05-12-10-40".to_string(),
            engine: "aurora-postgresql".to_string(),
        }));
    }
}
