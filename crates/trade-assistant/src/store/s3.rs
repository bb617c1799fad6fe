//! S3 backend

use super::ObjectStore;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

/// Objects stored in one S3 bucket
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a client from the default AWS credential chain
    pub async fn connect(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.into()))
            .load()
            .await;
        Self::with_client(Client::new(&config), bucket)
    }

    pub fn with_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    #[tracing::instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        let output = match response {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(aws_sdk_s3::operation::get_object::GetObjectError::is_no_such_key)
                {
                    return Ok(None);
                }
                return Err(AssistantError::store(
                    key,
                    aws_sdk_s3::error::DisplayErrorContext(err),
                ));
            }
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| AssistantError::store(key, e))?;
        Ok(Some(bytes.into_bytes().to_vec()))
    }

    #[tracing::instrument(skip(self, body), fields(bucket = %self.bucket, size = body.len()))]
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| AssistantError::store(key, aws_sdk_s3::error::DisplayErrorContext(e)))?;
        Ok(())
    }

    fn name(&self) -> &str {
        "s3"
    }
}
