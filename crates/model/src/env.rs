/// Base name of the source database cluster
pub const DB_NAME: &str = "DB_NAME";
/// Bucket the snapshot export is written to
pub const SNAPSHOT_BUCKET_NAME: &str = "SNAPSHOT_BUCKET_NAME";
/// Role assumed by RDS while exporting
pub const SNAPSHOT_TASK_ROLE: &str = "SNAPSHOT_TASK_ROLE";
/// KMS key used to encrypt the export
pub const SNAPSHOT_TASK_KEY: &str = "SNAPSHOT_TASK_KEY";
/// Access point ARN receiving the exported objects after export
pub const TRANSFER_ACCESS_POINT: &str = "TRANSFER_ACCESS_POINT";
/// Optional key prefix inside the transfer access point
pub const TRANSFER_PREFIX: &str = "TRANSFER_PREFIX";
/// Optional path of the AWS CLI used for the bulk copy
pub const AWS_CLI_PATH: &str = "AWS_CLI_PATH";
/// Log filter, read once at start up
pub const LOG_LEVEL: &str = "LOG_LEVEL";
