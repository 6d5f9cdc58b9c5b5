use lambda_runtime::{Error, service_fn, tracing};
use model::env::{AWS_CLI_PATH, LOG_LEVEL};
use pipeline::runtime::PipelineRuntime;
use pipeline::{PipelineLambdaEvent, pipeline_fn};
use service::service_cli::{AwsCliCopier, DEFAULT_AWS_CLI};
use service::service_rds::RdsControlPlane;
use service::service_s3::S3ObjectStore;
use std::env;
use std::sync::Arc;

mod logger;

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init(env::var(LOG_LEVEL).ok().as_deref());

    let config = aws_config::load_from_env().await;
    let aws_cli: String = env::var(AWS_CLI_PATH).unwrap_or_else(|_| DEFAULT_AWS_CLI.to_string());

    tracing::info!(aws_cli = %aws_cli, "Starting snapshot export handler");

    let runtime: PipelineRuntime = PipelineRuntime::new(
        Arc::new(RdsControlPlane::new(aws_sdk_rds::Client::new(&config))),
        Arc::new(S3ObjectStore::new(aws_sdk_s3::Client::new(&config))),
        Arc::new(AwsCliCopier::new(aws_cli)),
    );
    let runtime_ref: &PipelineRuntime = &runtime;

    lambda_runtime::run(service_fn(move |event: PipelineLambdaEvent| async move {
        pipeline_fn(runtime_ref, event).await
    }))
    .await
}
