use thiserror::Error;

pub mod env;
pub mod event;
pub mod lineage;
pub mod resource;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while interpreting notification data.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An automated snapshot name that doesn't follow `<name>-YYYY-MM-DD-HH-MM`
    #[error("snapshot name `{0}` does not match <name>-YYYY-MM-DD-HH-MM")]
    MalformedSnapshotName(String),
    #[error("`{0}` is not a valid resource ARN")]
    MalformedArn(String),
    #[error("notification has no subject identifier")]
    MissingSubject,
    #[error("invalid notification payload: {0}")]
    BadPayload(#[from] serde_json::Error),
}
