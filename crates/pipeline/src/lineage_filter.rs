//! Notifications arrive on a topic shared with every other database in the account,
//! so each stage checks the subject belongs to the configured lineage before acting.

use crate::error::PipelineError;
use lambda_runtime::tracing;
use model::lineage::{DatedSnapshot, Lineage, parse_dated_snapshot};

pub struct LineageFilter<'a> {
    lineage: &'a Lineage,
}

impl<'a> LineageFilter<'a> {
    pub fn new(lineage: &'a Lineage) -> Self {
        LineageFilter { lineage }
    }

    /// An automated snapshot of the source database.
    ///
    /// Automated snapshot names are always dated, so a name which isn't is an error
    /// rather than another database's event.
    pub fn admits_source_snapshot(&self, subject: &str) -> Result<bool, PipelineError> {
        let snapshot: DatedSnapshot = parse_dated_snapshot(subject)?;

        Ok(self.admits(subject, snapshot.name, self.lineage.base_name()))
    }

    /// The provisioned cluster restored by the first stage.
    pub fn admits_provisioned_cluster(&self, subject: &str) -> bool {
        self.admits(subject, subject, &self.lineage.provisioned_cluster_name())
    }

    /// The manual snapshot taken by the second stage.
    pub fn admits_manual_snapshot(&self, subject: &str) -> bool {
        self.admits(subject, subject, &self.lineage.snapshot_name())
    }

    fn admits(&self, subject: &str, actual: &str, expected: &str) -> bool {
        if actual == expected {
            return true;
        }

        tracing::info!(
            subject,
            expected,
            base_name = self.lineage.base_name(),
            "Ignoring notification for another lineage"
        );

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::ModelError;

    #[test]
    fn admits_source_snapshots_of_base_only() {
        let lineage: Lineage = Lineage::new("sales");
        let filter: LineageFilter = LineageFilter::new(&lineage);

        assert!(filter.admits_source_snapshot("sales-2021-05-12-10-40").unwrap());
        assert!(!filter.admits_source_snapshot("mktg-2021-05-12-10-40").unwrap());
        assert!(!filter.admits_source_snapshot("sales-fordatalake-2021-05-12-10-40").unwrap());
    }

    #[test]
    fn undated_source_snapshot_is_malformed() {
        let lineage: Lineage = Lineage::new("sales");
        let filter: LineageFilter = LineageFilter::new(&lineage);

        let result = filter.admits_source_snapshot("sales-snapshot");

        assert!(matches!(
            result,
            Err(PipelineError::Model(ModelError::MalformedSnapshotName(_)))
        ));
    }

    #[test]
    fn admits_derived_resources_by_exact_name() {
        let lineage: Lineage = Lineage::new("sales");
        let filter: LineageFilter = LineageFilter::new(&lineage);

        assert!(filter.admits_provisioned_cluster("sales-fordatalake"));
        assert!(!filter.admits_provisioned_cluster("sales"));
        assert!(!filter.admits_provisioned_cluster("mktg-fordatalake"));

        assert!(filter.admits_manual_snapshot("sales-snapshot"));
        assert!(!filter.admits_manual_snapshot("sales-snapshot-old"));
        assert!(!filter.admits_manual_snapshot("mktg-snapshot"));
    }
}
