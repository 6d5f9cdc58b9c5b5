//! Deterministic names for every resource the pipeline creates.
//!
//! Nothing is persisted between invocations, so each stage recomputes these from
//! the configured base name and whatever the notification carries.

use crate::ModelError;
use crate::resource::ResourceArn;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

const PROVISIONED_CLUSTER_SUFFIX: &str = "fordatalake";
const SNAPSHOT_SUFFIX: &str = "snapshot";

/// RDS limits export task identifiers to 60 characters
const EXPORT_TASK_ID_MAX_LEN: usize = 60;
const ACCOUNT_FRAGMENT_LEN: usize = 4;

static DATED_SNAPSHOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>.+)-(?P<taken_at>\d{4}-\d{2}-\d{2}-\d{2}-\d{2})$")
        .expect("dated snapshot pattern is valid")
});

/// The family of resources derived from one source database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lineage {
    base_name: String,
}

impl Lineage {
    pub fn new(base_name: impl Into<String>) -> Self {
        Lineage {
            base_name: base_name.into(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Name of the temporary provisioned cluster restored from the serverless snapshot.
    pub fn provisioned_cluster_name(&self) -> String {
        format!("{}-{}", self.base_name, PROVISIONED_CLUSTER_SUFFIX)
    }

    /// Name of the manual snapshot taken of the provisioned cluster.
    pub fn snapshot_name(&self) -> String {
        format!("{}-{}", self.base_name, SNAPSHOT_SUFFIX)
    }

    /// Export task id for the lineage's manual snapshot.
    ///
    /// Completion notifications only identify the snapshot, so the cleanup stage
    /// must be able to arrive at the same id from the same inputs.
    pub fn export_task_id(&self, snapshot_created_on: NaiveDate, snapshot_arn: &ResourceArn) -> String {
        let date: String = snapshot_created_on.format("%Y-%m-%d").to_string();
        let fragment: &str = account_fragment(&snapshot_arn.account_id);

        let base_budget: usize = EXPORT_TASK_ID_MAX_LEN - date.len() - fragment.len() - 2;
        let base: String = self.base_name.chars().take(base_budget).collect();

        let mut task_id: String = format!("{base}-{date}-{fragment}");
        while task_id.contains("--") {
            task_id = task_id.replace("--", "-");
        }

        task_id.trim_matches('-').to_string()
    }
}

/// Trailing characters of the account id, enough to keep ids distinct across accounts.
pub fn account_fragment(account_id: &str) -> &str {
    let start: usize = account_id.len().saturating_sub(ACCOUNT_FRAGMENT_LEN);
    account_id.get(start..).unwrap_or(account_id)
}

/// An automated snapshot name split into its database name and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedSnapshot<'a> {
    pub name: &'a str,
    pub taken_at: &'a str,
}

/// Split `<name>-YYYY-MM-DD-HH-MM`.
pub fn parse_dated_snapshot(snapshot_name: &str) -> Result<DatedSnapshot<'_>, ModelError> {
    let captures = DATED_SNAPSHOT
        .captures(snapshot_name)
        .ok_or_else(|| ModelError::MalformedSnapshotName(snapshot_name.to_string()))?;

    match (captures.name("name"), captures.name("taken_at")) {
        (Some(name), Some(taken_at)) => Ok(DatedSnapshot {
            name: name.as_str(),
            taken_at: taken_at.as_str(),
        }),
        _ => Err(ModelError::MalformedSnapshotName(snapshot_name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_arn(account_id: &str) -> ResourceArn {
        ResourceArn::parse(&format!(
            "arn:aws:rds:us-west-2:{account_id}:cluster-snapshot:sales-snapshot"
        ))
        .unwrap()
    }

    fn may_12() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 5, 12).unwrap()
    }

    #[test]
    fn derives_resource_names_from_base() {
        let lineage: Lineage = Lineage::new("sales");

        assert_eq!("sales-fordatalake", lineage.provisioned_cluster_name());
        assert_eq!("sales-snapshot", lineage.snapshot_name());
    }

    #[test]
    fn export_task_id_is_deterministic() {
        let first: String = Lineage::new("sales").export_task_id(may_12(), &snapshot_arn("123456789012"));
        let second: String = Lineage::new("sales").export_task_id(may_12(), &snapshot_arn("123456789012"));

        assert_eq!("sales-2021-05-12-9012", first);
        assert_eq!(first, second);
    }

    #[test]
    fn export_task_id_varies_with_date_and_account() {
        let lineage: Lineage = Lineage::new("sales");
        let base: String = lineage.export_task_id(may_12(), &snapshot_arn("123456789012"));

        let next_day: NaiveDate = NaiveDate::from_ymd_opt(2021, 5, 13).unwrap();
        assert_ne!(base, lineage.export_task_id(next_day, &snapshot_arn("123456789012")));
        assert_ne!(base, lineage.export_task_id(may_12(), &snapshot_arn("210987654321")));
    }

    #[test]
    fn export_task_id_fits_rds_limit() {
        let lineage: Lineage = Lineage::new("a".repeat(80));

        let task_id: String = lineage.export_task_id(may_12(), &snapshot_arn("123456789012"));

        assert_eq!(EXPORT_TASK_ID_MAX_LEN, task_id.len());
        assert!(task_id.ends_with("-2021-05-12-9012"));
    }

    #[test]
    fn export_task_id_collapses_double_hyphens() {
        let lineage: Lineage = Lineage::new("sales-");

        let task_id: String = lineage.export_task_id(may_12(), &snapshot_arn("123456789012"));

        assert_eq!("sales-2021-05-12-9012", task_id);
    }

    #[test]
    fn account_fragment_handles_short_ids() {
        assert_eq!("9012", account_fragment("123456789012"));
        assert_eq!("12", account_fragment("12"));
        assert_eq!("", account_fragment(""));
    }

    #[test]
    fn parses_dated_snapshot_names() {
        let parsed: DatedSnapshot = parse_dated_snapshot("sales-2021-05-12-10-40").unwrap();
        assert_eq!("sales", parsed.name);
        assert_eq!("2021-05-12-10-40", parsed.taken_at);

        let hyphenated: DatedSnapshot = parse_dated_snapshot("sales-eu-2021-05-12-10-40").unwrap();
        assert_eq!("sales-eu", hyphenated.name);
    }

    #[test]
    fn rejects_undated_snapshot_names() {
        for name in ["sales", "sales-snapshot", "sales-2021-05-12", "2021-05-12-10-40", "sales-2021-05-12-10-4x"] {
            assert!(
                matches!(parse_dated_snapshot(name), Err(ModelError::MalformedSnapshotName(_))),
                "{name} should be rejected"
            );
        }
    }
}
