//! Moves exported objects to the separately owned data lake location.
//!
//! The export bucket's objects belong to this account, so each copy sets the
//! `bucket-owner-full-control` ACL for the destination owner. The bulk copy is tried
//! first; if it fails for any reason every object is copied individually instead.

use crate::context::PipelineContext;
use crate::error::PipelineError;
use lambda_runtime::tracing;
use model::resource::{ExportTaskDescriptor, ObjectPage};
use service::ServiceError;

/// Which path completed the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPath {
    Bulk,
    PerObject { copied: usize },
}

pub async fn transfer_ownership(
    ctx: &PipelineContext<'_>,
    task: &ExportTaskDescriptor,
) -> Result<TransferPath, PipelineError> {
    let bucket: &str = task.s3_bucket.as_deref().unwrap_or(&ctx.config.bucket_name);
    let prefix: String = task.object_prefix();

    let source_uri: String = format!("s3://{bucket}/{prefix}/");
    let destination_uri: String = format!(
        "s3://{}/{}/",
        ctx.config.transfer_access_point,
        destination_key(ctx, &prefix)
    );

    match ctx.copier.copy_prefix(&source_uri, &destination_uri).await {
        Ok(()) => {
            tracing::info!(source = %source_uri, destination = %destination_uri, "Transferred export with bulk copy");
            return Ok(TransferPath::Bulk);
        }
        Err(err) => tracing::warn!(
            error = %err,
            "Bulk copy failed, copying objects individually"
        ),
    }

    // Trailing slash keeps sibling prefixes such as `<task>-retry/` out of the listing
    let copied: usize = copy_objects_individually(ctx, bucket, &format!("{prefix}/")).await?;

    Ok(TransferPath::PerObject { copied })
}

/// Walk the listing one page at a time, copying as we go.
/// Per-object failures don't stop the walk; they are reported together at the end.
async fn copy_objects_individually(
    ctx: &PipelineContext<'_>,
    bucket: &str,
    prefix: &str,
) -> Result<usize, PipelineError> {
    let mut continuation_token: Option<String> = None;
    let mut copied: usize = 0;
    let mut failed: usize = 0;
    let mut first_error: Option<ServiceError> = None;

    loop {
        let page: ObjectPage = ctx
            .objects
            .list_objects_page(bucket, prefix, continuation_token.take())
            .await?;

        for key in &page.keys {
            let result = ctx
                .objects
                .copy_object_to_owner(
                    bucket,
                    key,
                    &ctx.config.transfer_access_point,
                    &destination_key(ctx, key),
                )
                .await;

            match result {
                Ok(()) => copied += 1,
                Err(err) => {
                    tracing::warn!(key, error = %err, "Failed to copy object");
                    failed += 1;
                    first_error.get_or_insert(err);
                }
            }
        }

        match page.next_continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    if let Some(first_error) = first_error {
        return Err(PipelineError::TransferIncomplete {
            copied,
            failed,
            first_error,
        });
    }

    tracing::info!(copied, "Transferred export object by object");

    Ok(copied)
}

fn destination_key(ctx: &PipelineContext<'_>, key: &str) -> String {
    match ctx.config.transfer_prefix.as_deref().map(|p| p.trim_matches('/')) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}/{key}"),
        _ => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::test_support::{TestPipeline, test_config};
    use test_utils::{ObjectCopy, RecordingObjectStore, ScriptedCopier, TEST_ACCESS_POINT, TEST_BUCKET};

    const TASK_ID: &str = "sales-2021-05-12-9012";

    fn export_task(s3_prefix: Option<&str>) -> ExportTaskDescriptor {
        ExportTaskDescriptor {
            export_task_identifier: TASK_ID.to_string(),
            s3_bucket: Some(TEST_BUCKET.to_string()),
            s3_prefix: s3_prefix.map(str::to_string),
            status: Some("COMPLETE".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn bulk_copy_success_skips_listing() {
        let pipeline: TestPipeline = TestPipeline::new();

        let path: TransferPath = transfer_ownership(&pipeline.ctx(), &export_task(Some("exports/")))
            .await
            .unwrap();

        assert_eq!(TransferPath::Bulk, path);
        assert_eq!(
            vec![(
                format!("s3://{TEST_BUCKET}/exports/{TASK_ID}/"),
                format!("s3://{TEST_ACCESS_POINT}/exports/{TASK_ID}/"),
            )],
            pipeline.copier.calls()
        );
        assert!(pipeline.objects.list_requests().is_empty());
    }

    #[tokio::test]
    async fn fallback_copies_every_page() {
        let pipeline: TestPipeline = TestPipeline::with(
            ScriptedCopier::failing(),
            RecordingObjectStore::with_pages(vec![
                vec!["sales-2021-05-12-9012/a.parquet", "sales-2021-05-12-9012/b.parquet"],
                vec!["sales-2021-05-12-9012/c.parquet"],
                vec!["sales-2021-05-12-9012/d.parquet"],
            ]),
        );
        let config: PipelineConfig = PipelineConfig {
            transfer_prefix: Some("raw/sales/".to_string()),
            ..test_config()
        };

        let path: TransferPath = transfer_ownership(&pipeline.ctx_with(config), &export_task(None))
            .await
            .unwrap();

        assert_eq!(TransferPath::PerObject { copied: 4 }, path);
        assert_eq!(
            vec![None, Some("page-1".to_string()), Some("page-2".to_string())],
            pipeline.objects.list_requests()
        );
        assert!(
            pipeline
                .objects
                .listed_prefixes()
                .iter()
                .all(|prefix| prefix == &format!("{TASK_ID}/"))
        );

        let copies: Vec<ObjectCopy> = pipeline.objects.copies();
        assert_eq!(4, copies.len());
        assert_eq!(
            ObjectCopy {
                source_bucket: TEST_BUCKET.to_string(),
                source_key: "sales-2021-05-12-9012/c.parquet".to_string(),
                destination_bucket: TEST_ACCESS_POINT.to_string(),
                destination_key: "raw/sales/sales-2021-05-12-9012/c.parquet".to_string(),
            },
            copies[2]
        );
    }

    #[tokio::test]
    async fn fallback_continues_past_failed_objects() {
        let pipeline: TestPipeline = TestPipeline::with(
            ScriptedCopier::failing(),
            RecordingObjectStore::with_pages(vec![
                vec!["sales-2021-05-12-9012/a.parquet"],
                vec!["sales-2021-05-12-9012/b.parquet", "sales-2021-05-12-9012/c.parquet"],
            ])
            .failing(&["sales-2021-05-12-9012/a.parquet"]),
        );

        let result = transfer_ownership(&pipeline.ctx(), &export_task(None)).await;

        assert!(matches!(
            result,
            Err(PipelineError::TransferIncomplete { copied: 2, failed: 1, .. })
        ));
        assert_eq!(3, pipeline.objects.copies().len());
    }

    #[tokio::test]
    async fn empty_export_copies_nothing() {
        let pipeline: TestPipeline =
            TestPipeline::with(ScriptedCopier::failing(), RecordingObjectStore::default());

        let path: TransferPath = transfer_ownership(&pipeline.ctx(), &export_task(None))
            .await
            .unwrap();

        assert_eq!(TransferPath::PerObject { copied: 0 }, path);
        assert_eq!(vec![None], pipeline.objects.list_requests());
    }

    #[tokio::test]
    async fn fallback_lists_the_same_directory_as_bulk_copy() {
        let pipeline: TestPipeline =
            TestPipeline::with(ScriptedCopier::failing(), RecordingObjectStore::default());

        transfer_ownership(&pipeline.ctx(), &export_task(Some("exports")))
            .await
            .unwrap();

        let (source_uri, _) = pipeline.copier.calls().remove(0);
        assert_eq!(format!("s3://{TEST_BUCKET}/exports/{TASK_ID}/"), source_uri);
        assert_eq!(vec![format!("exports/{TASK_ID}/")], pipeline.objects.listed_prefixes());
    }
}
