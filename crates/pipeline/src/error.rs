use model::ModelError;
use service::ServiceError;
use thiserror::Error;

/// Errors which fail an invocation and so trigger redelivery.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing environment variable {0}")]
    MissingConfig(&'static str),
    #[error("expected exactly one record in the notification envelope, got {0}")]
    RecordCount(usize),
    #[error("invalid SNS envelope: {0}")]
    Envelope(#[source] serde_json::Error),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("cluster snapshot {0} not found")]
    SnapshotNotFound(String),
    #[error("cluster snapshot {snapshot} has no {field}")]
    IncompleteSnapshot {
        snapshot: String,
        field: &'static str,
    },
    #[error("ownership transfer copied {copied} objects, {failed} failed: {first_error}")]
    TransferIncomplete {
        copied: usize,
        failed: usize,
        first_error: ServiceError,
    },
    #[error("cleanup incomplete: {}", join_errors(.0))]
    CleanupIncomplete(Vec<ServiceError>),
}

fn join_errors(errors: &[ServiceError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join("; ")
}
