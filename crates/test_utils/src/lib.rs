use chrono::{DateTime, TimeZone, Utc};
use model::env::{
    DB_NAME, SNAPSHOT_BUCKET_NAME, SNAPSHOT_TASK_KEY, SNAPSHOT_TASK_ROLE, TRANSFER_ACCESS_POINT,
};
use model::resource::ClusterSnapshot;
use serde_json::{Value, json};
use std::env;

mod fakes;

pub use fakes::{ControlPlaneCall, ObjectCopy, RecordingControlPlane, RecordingObjectStore, ScriptedCopier};

/// Test deployment values
pub const TEST_ACCOUNT_ID: &str = "123456789012";
pub const TEST_REGION: &str = "us-west-2";
pub const TEST_BASE_NAME: &str = "sales";
pub const TEST_BUCKET: &str = "exports";
pub const TEST_ROLE_ARN: &str = "arn:aws:iam::123456789012:role/snapshot-export";
pub const TEST_KEY_ARN: &str = "arn:aws:kms:us-west-2:123456789012:key/test-key";
pub const TEST_ACCESS_POINT: &str = "arn:aws:s3:us-west-2:210987654321:accesspoint/datalake";

pub const SNS_EVENT_SOURCE: &str = "aws:sns";

/// Lookup over the default test configuration, for `from_lookup` style constructors.
pub fn test_env(key: &str) -> Option<String> {
    let value: &str = match key {
        DB_NAME => TEST_BASE_NAME,
        SNAPSHOT_BUCKET_NAME => TEST_BUCKET,
        SNAPSHOT_TASK_ROLE => TEST_ROLE_ARN,
        SNAPSHOT_TASK_KEY => TEST_KEY_ARN,
        TRANSFER_ACCESS_POINT => TEST_ACCESS_POINT,
        _ => return None,
    };

    Some(value.to_string())
}

/// Setup default environment variables used in testing
pub fn setup_default_env() {
    for key in [DB_NAME, SNAPSHOT_BUCKET_NAME, SNAPSHOT_TASK_ROLE, SNAPSHOT_TASK_KEY, TRANSFER_ACCESS_POINT] {
        if let Some(value) = test_env(key) {
            unsafe {
                env::set_var(key, value);
            }
        }
    }
}

pub fn rds_arn(resource_type: &str, resource_id: &str) -> String {
    format!("arn:aws:rds:{TEST_REGION}:{TEST_ACCOUNT_ID}:{resource_type}:{resource_id}")
}

/// RDS event notification body, in the spaced key format.
pub fn rds_message(event_id: &str, source_id: &str, source_arn: Option<&str>) -> Value {
    let mut message: Value = json!({
        "Event Source": "db-cluster-snapshot",
        "Event Time": "2021-05-12 10:45:02.123",
        "Identifier Link": "https://console.aws.amazon.com/rds/home",
        "Source ID": source_id,
        "Event ID": event_id,
        "Event Message": "test notification",
    });

    if let Some(arn) = source_arn {
        message["Source ARN"] = Value::String(arn.to_string());
    }

    message
}

/// A single SNS record as delivered to Lambda.
pub fn sns_record(event_source: &str, message: &Value) -> Value {
    json!({
        "EventSource": event_source,
        "EventVersion": "1.0",
        "EventSubscriptionArn": "arn:aws:sns:us-west-2:123456789012:rds-events:subscription",
        "Sns": {
            "Type": "Notification",
            "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
            "TopicArn": "arn:aws:sns:us-west-2:123456789012:rds-events",
            "Subject": "RDS Notification Message",
            "Message": message.to_string(),
            "Timestamp": "2021-05-12T10:45:03.000Z",
            "SignatureVersion": "1",
            "Signature": "EXAMPLE",
            "SigningCertUrl": "https://sns.us-west-2.amazonaws.com/cert.pem",
            "UnsubscribeUrl": "https://sns.us-west-2.amazonaws.com/unsubscribe",
            "MessageAttributes": {}
        }
    })
}

/// Envelope holding the given records.
pub fn envelope(records: Vec<Value>) -> Value {
    json!({ "Records": records })
}

/// Envelope with one SNS record carrying an RDS notification.
pub fn sns_envelope(event_id: &str, source_id: &str, source_arn: Option<&str>) -> Value {
    envelope(vec![sns_record(
        SNS_EVENT_SOURCE,
        &rds_message(event_id, source_id, source_arn),
    )])
}

/// Creation time of the snapshots in the fakes
pub fn snapshot_created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 5, 12, 10, 40, 0).unwrap()
}

pub fn cluster_snapshot(identifier: &str, created_at: Option<DateTime<Utc>>) -> ClusterSnapshot {
    ClusterSnapshot {
        identifier: identifier.to_string(),
        arn: rds_arn("cluster-snapshot", identifier),
        engine: Some("aurora-postgresql".to_string()),
        created_at,
    }
}
