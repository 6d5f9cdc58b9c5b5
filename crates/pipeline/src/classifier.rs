use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::stages::cleanup::clean_up;
use crate::stages::export::start_export;
use crate::stages::restore::restore_to_provisioned;
use crate::stages::snapshot::snapshot_provisioned_cluster;
use crate::stages::StageOutcome;
use aws_lambda_events::sns::{SnsEvent, SnsRecord};
use lambda_runtime::tracing::{self, Instrument, Span};
use model::event::{EventKind, LifecycleEvent};
use serde_json::Value;

/// The only transport the pipeline accepts notifications from
pub const SNS_EVENT_SOURCE: &str = "aws:sns";

/// Validate the delivery envelope, then classify and dispatch its single notification.
pub async fn handle_envelope(
    ctx: &PipelineContext<'_>,
    envelope: Value,
) -> Result<StageOutcome, PipelineError> {
    let Some(records) = envelope.get("Records").and_then(Value::as_array) else {
        tracing::warn!(envelope = %envelope, "Invocation is not an SNS delivery, ignoring");
        return Ok(StageOutcome::Ignored);
    };

    let from_sns = |record: &Value| record.get("EventSource").and_then(Value::as_str) == Some(SNS_EVENT_SOURCE);
    if !records.iter().all(from_sns) {
        tracing::warn!(
            envelope = %envelope,
            "Only SNS deliveries are supported, ignoring invocation"
        );
        return Ok(StageOutcome::Ignored);
    }

    if records.len() != 1 {
        return Err(PipelineError::RecordCount(records.len()));
    }

    let sns_event: SnsEvent = serde_json::from_value(envelope).map_err(PipelineError::Envelope)?;
    let Some(record) = sns_event.records.into_iter().next() else {
        return Err(PipelineError::RecordCount(0));
    };

    let span: Span = tracing::info_span!(
        "notification",
        message_id = %record.sns.message_id,
        event_id = tracing::field::Empty,
    );

    classify_record(ctx, record).instrument(span).await
}

async fn classify_record(
    ctx: &PipelineContext<'_>,
    record: SnsRecord,
) -> Result<StageOutcome, PipelineError> {
    tracing::debug!(message = %record.sns.message, "Received notification");

    let event: LifecycleEvent = LifecycleEvent::from_message(&record.sns.message)?;
    Span::current().record("event_id", event.event_id.as_str());

    dispatch(ctx, &event).await
}

/// Route one parsed notification to its stage handler.
pub async fn dispatch(
    ctx: &PipelineContext<'_>,
    event: &LifecycleEvent,
) -> Result<StageOutcome, PipelineError> {
    let kind: EventKind = event.kind();

    tracing::info!(
        event_id = %event.event_id,
        ?kind,
        subject = event.subject_name(),
        "Classified notification"
    );

    match kind {
        EventKind::SnapshotCreated => restore_to_provisioned(ctx, event).await,
        EventKind::ClusterRestored => snapshot_provisioned_cluster(ctx, event).await,
        EventKind::ManualSnapshotCreated => start_export(ctx, event).await,
        EventKind::ExportCompleted | EventKind::ExportFailed => clean_up(ctx, event).await,
        EventKind::Unknown => {
            tracing::info!(
                event_id = %event.event_id,
                subject = %event.subject_identifier,
                base_name = ctx.lineage.base_name(),
                "Ignoring notification the pipeline doesn't act on"
            );
            Ok(StageOutcome::Ignored)
        }
    }
}
