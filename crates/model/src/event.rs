use crate::ModelError;
use crate::resource::ResourceArn;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const EVENT_CODE_PREFIX: &str = "RDS-EVENT-";

/// Prefix RDS gives to the identifiers of automated snapshots
pub const AUTOMATED_SNAPSHOT_PREFIX: &str = "rds:";

/// The RDS event notification embedded in the SNS message.
///
/// RDS has published this with spaced keys (`"Event ID"`) and more recently with
/// compact keys (`EventID`), so both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RdsNotification {
    #[serde(rename = "Event ID", alias = "EventID")]
    pub event_id: String,
    #[serde(rename = "Source ID", alias = "SourceId", alias = "SourceIdentifier", default)]
    pub source_id: Option<String>,
    #[serde(rename = "Source ARN", alias = "SourceArn", default)]
    pub source_arn: Option<String>,
    #[serde(rename = "Event Time", alias = "Date", default)]
    pub event_time: Option<String>,
    #[serde(rename = "Event Message", alias = "Message", default)]
    pub event_message: Option<String>,
}

/// Canonical form of an RDS event id, e.g. `RDS-EVENT-0169`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventCode(String);

impl EventCode {
    /// Extract the canonical code from either the short form or the
    /// documentation URL form ending in `#RDS-EVENT-0169`.
    pub fn normalize(raw: &str) -> Option<EventCode> {
        let tail: &str = raw.trim().rsplit(['#', '/']).next().unwrap_or_default();
        let upper: String = tail.to_ascii_uppercase();
        let digits: &str = upper.strip_prefix(EVENT_CODE_PREFIX)?;

        if digits.len() == 4 && digits.chars().all(|c| c.is_ascii_digit()) {
            Some(EventCode(upper))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn number(&self) -> &str {
        &self.0[EVENT_CODE_PREFIX.len()..]
    }
}

impl Display for EventCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The pipeline signal a notification maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    SnapshotCreated,
    ClusterRestored,
    ManualSnapshotCreated,
    ExportCompleted,
    ExportFailed,
    Unknown,
}

impl EventKind {
    /// Cluster event codes only; every stage drives cluster-level APIs.
    pub fn from_code(code: &EventCode) -> EventKind {
        match code.number() {
            "0169" => EventKind::SnapshotCreated,
            "0170" => EventKind::ClusterRestored,
            "0075" => EventKind::ManualSnapshotCreated,
            "0164" => EventKind::ExportCompleted,
            "0162" => EventKind::ExportFailed,
            _ => EventKind::Unknown,
        }
    }
}

/// A single lifecycle notification, parsed once per invocation.
#[derive(Debug, Clone)]
pub struct LifecycleEvent {
    pub event_id: String,
    pub code: Option<EventCode>,
    pub subject_identifier: String,
    pub subject_arn: Option<ResourceArn>,
    pub timestamp: Option<String>,
    pub raw_payload: serde_json::Value,
}

impl LifecycleEvent {
    /// Parse the JSON message body delivered by SNS.
    pub fn from_message(message: &str) -> Result<LifecycleEvent, ModelError> {
        let raw_payload: serde_json::Value = serde_json::from_str(message)?;
        let notification: RdsNotification = serde_json::from_value(raw_payload.clone())?;

        let subject_arn: Option<ResourceArn> = notification
            .source_arn
            .as_deref()
            .filter(|arn| !arn.is_empty())
            .map(ResourceArn::parse)
            .transpose()?;

        let subject_identifier: String = match (&subject_arn, notification.source_id) {
            (Some(arn), _) => arn.resource_id.clone(),
            (None, Some(source_id)) if !source_id.is_empty() => source_id,
            _ => return Err(ModelError::MissingSubject),
        };

        Ok(LifecycleEvent {
            code: EventCode::normalize(&notification.event_id),
            event_id: notification.event_id,
            subject_identifier,
            subject_arn,
            timestamp: notification.event_time,
            raw_payload,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.code
            .as_ref()
            .map(EventKind::from_code)
            .unwrap_or(EventKind::Unknown)
    }

    /// Resource name of the subject with any automated snapshot prefix removed.
    pub fn subject_name(&self) -> &str {
        self.subject_identifier
            .strip_prefix(AUTOMATED_SNAPSHOT_PREFIX)
            .unwrap_or(&self.subject_identifier)
    }
}
