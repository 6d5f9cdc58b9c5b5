use crate::config::PipelineConfig;
use crate::context::PipelineContext;
use crate::runtime::PipelineRuntime;
use model::event::LifecycleEvent;
use std::sync::Arc;
use test_utils::{RecordingControlPlane, RecordingObjectStore, ScriptedCopier, rds_message, test_env};

/// A runtime wired to in-memory fakes which tests can inspect afterwards.
pub(crate) struct TestPipeline {
    pub runtime: PipelineRuntime,
    pub database: Arc<RecordingControlPlane>,
    pub objects: Arc<RecordingObjectStore>,
    pub copier: Arc<ScriptedCopier>,
}

impl TestPipeline {
    pub fn new() -> Self {
        TestPipeline::with(ScriptedCopier::succeeding(), RecordingObjectStore::default())
    }

    pub fn with(copier: ScriptedCopier, objects: RecordingObjectStore) -> Self {
        let database: Arc<RecordingControlPlane> = Arc::new(RecordingControlPlane::default());
        let objects: Arc<RecordingObjectStore> = Arc::new(objects);
        let copier: Arc<ScriptedCopier> = Arc::new(copier);

        TestPipeline {
            runtime: PipelineRuntime::new(database.clone(), objects.clone(), copier.clone()),
            database,
            objects,
            copier,
        }
    }

    pub fn ctx(&self) -> PipelineContext<'_> {
        self.runtime.context(test_config())
    }

    pub fn ctx_with(&self, config: PipelineConfig) -> PipelineContext<'_> {
        self.runtime.context(config)
    }
}

pub(crate) fn test_config() -> PipelineConfig {
    PipelineConfig::from_lookup(test_env).expect("Test configuration should be complete")
}

pub(crate) fn event(event_id: &str, source_id: &str) -> LifecycleEvent {
    LifecycleEvent::from_message(&rds_message(event_id, source_id, None).to_string())
        .expect("Test notification should parse")
}
