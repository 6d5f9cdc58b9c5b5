use crate::classifier::handle_envelope;
use crate::config::PipelineConfig;
use crate::runtime::PipelineRuntime;
use crate::stages::StageOutcome;
use lambda_runtime::tracing::{self, Instrument, Span};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;

pub mod classifier;
pub mod config;
pub mod context;
pub mod error;
pub mod lineage_filter;
pub mod ownership;
pub mod runtime;
pub mod stages;

#[cfg(test)]
mod test_support;

/// The raw envelope is taken as JSON so deliveries from other transports can be
/// recognised and ignored rather than failing to deserialize.
pub type PipelineLambdaEvent = LambdaEvent<Value>;

/// Handler for a single invocation, for use with `lambda_runtime::run()`.
///
/// ```no_compile
/// let runtime: PipelineRuntime = PipelineRuntime::new(database, objects, copier);
///
/// lambda_runtime::run(service_fn(|event: PipelineLambdaEvent| pipeline_fn(&runtime, event))).await
/// ```
///
/// Errors are returned to the Lambda runtime so the notification is redelivered.
pub async fn pipeline_fn(runtime: &PipelineRuntime, event: PipelineLambdaEvent) -> Result<(), Error> {
    let span: Span = tracing::info_span!("invocation", request_id = %event.context.request_id);

    async move {
        let config: PipelineConfig = PipelineConfig::from_env()?;
        let outcome: StageOutcome = handle_envelope(&runtime.context(config), event.payload).await?;

        tracing::info!(?outcome, "Finished handling notification");

        Ok::<(), Error>(())
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_runtime::Context;
    use std::sync::Arc;
    use test_utils::{
        RecordingControlPlane, RecordingObjectStore, ScriptedCopier, setup_default_env,
        sns_envelope,
    };

    #[tokio::test]
    async fn handles_invocation_with_environment_config() {
        setup_default_env();

        let database: Arc<RecordingControlPlane> = Arc::new(RecordingControlPlane::default());
        let runtime: PipelineRuntime = PipelineRuntime::new(
            database.clone(),
            Arc::new(RecordingObjectStore::default()),
            Arc::new(ScriptedCopier::succeeding()),
        );

        let event: PipelineLambdaEvent = LambdaEvent::new(
            sns_envelope("RDS-EVENT-0170", "sales-fordatalake", None),
            Context::default(),
        );

        pipeline_fn(&runtime, event)
            .await
            .expect("Invocation should succeed");

        assert!(database.has_snapshot("sales-snapshot"));
    }

    #[tokio::test]
    async fn failing_stage_fails_invocation() {
        setup_default_env();

        let runtime: PipelineRuntime = PipelineRuntime::new(
            Arc::new(RecordingControlPlane::default()),
            Arc::new(RecordingObjectStore::default()),
            Arc::new(ScriptedCopier::succeeding()),
        );

        let event: PipelineLambdaEvent = LambdaEvent::new(
            sns_envelope("RDS-EVENT-0075", "sales-snapshot", None),
            Context::default(),
        );

        let result: Result<(), Error> = pipeline_fn(&runtime, event).await;

        assert!(result.is_err());
    }
}
