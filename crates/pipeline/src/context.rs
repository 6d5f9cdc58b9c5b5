use crate::config::PipelineConfig;
use model::lineage::Lineage;
use service::{BulkCopier, DatabaseControlPlane, ObjectStore};

/// Everything a stage handler may use during a single invocation.
pub struct PipelineContext<'a> {
    pub config: PipelineConfig,
    pub lineage: Lineage,
    pub database: &'a dyn DatabaseControlPlane,
    pub objects: &'a dyn ObjectStore,
    pub copier: &'a dyn BulkCopier,
}
