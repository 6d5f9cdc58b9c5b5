use crate::{ObjectStore, ServiceError, sdk_failure};
use async_trait::async_trait;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::types::ObjectCannedAcl;
use model::resource::ObjectPage;
use url::form_urlencoded::byte_serialize;

/// `ObjectStore` backed by the S3 API.
#[derive(Clone)]
pub struct S3ObjectStore {
    s3: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(s3: aws_sdk_s3::Client) -> Self {
        S3ObjectStore { s3 }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, ServiceError> {
        let output: ListObjectsV2Output = self
            .s3
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|err| sdk_failure("ListObjectsV2", bucket, err))?;

        let keys: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(str::to_string)
            .collect();

        let next_continuation_token: Option<String> = match output.is_truncated() {
            Some(true) => output.next_continuation_token().map(str::to_string),
            _ => None,
        };

        Ok(ObjectPage {
            keys,
            next_continuation_token,
        })
    }

    async fn copy_object_to_owner(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), ServiceError> {
        self.s3
            .copy_object()
            .copy_source(copy_source(source_bucket, source_key))
            .bucket(destination_bucket)
            .key(destination_key)
            .acl(ObjectCannedAcl::BucketOwnerFullControl)
            .send()
            .await
            .map_err(|err| sdk_failure("CopyObject", source_key, err))?;

        Ok(())
    }
}

/// `CopySource` must be URL-encoded; each key segment is encoded so the `/`
/// separators survive.
fn copy_source(bucket: &str, key: &str) -> String {
    let encoded_key: String = key
        .split('/')
        .map(|segment| byte_serialize(segment.as_bytes()).collect::<String>().replace('+', "%20"))
        .collect::<Vec<String>>()
        .join("/");

    format!("{bucket}/{encoded_key}")
}
