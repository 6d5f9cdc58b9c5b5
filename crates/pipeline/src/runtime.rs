use crate::config::PipelineConfig;
use crate::context::PipelineContext;
use model::lineage::Lineage;
use service::{BulkCopier, DatabaseControlPlane, ObjectStore};
use std::sync::Arc;

/// Long-lived clients shared across invocations. Holds no pipeline state.
pub struct PipelineRuntime {
    database: Arc<dyn DatabaseControlPlane>,
    objects: Arc<dyn ObjectStore>,
    copier: Arc<dyn BulkCopier>,
}

impl PipelineRuntime {
    pub fn new(
        database: Arc<dyn DatabaseControlPlane>,
        objects: Arc<dyn ObjectStore>,
        copier: Arc<dyn BulkCopier>,
    ) -> PipelineRuntime {
        PipelineRuntime {
            database,
            objects,
            copier,
        }
    }

    /// Bind the clients to the configuration read for one invocation.
    pub fn context(&self, config: PipelineConfig) -> PipelineContext<'_> {
        PipelineContext {
            lineage: Lineage::new(config.base_name.clone()),
            config,
            database: self.database.as_ref(),
            objects: self.objects.as_ref(),
            copier: self.copier.as_ref(),
        }
    }
}
