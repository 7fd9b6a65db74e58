//! Amazon S3 storage.

use aws_sdk_s3::{Client, primitives::ByteStream};

use crate::{aws::load_aws_config, prelude::*};

use super::{ArtifactStore, check_key};

/// Stores artifacts as objects under a prefix in an S3 bucket.
pub struct S3Store {
    /// The S3 client.
    client: Client,

    /// The bucket to write to.
    bucket: String,

    /// Prepended to every key, without leading or trailing slashes.
    prefix: String,
}

impl S3Store {
    /// Create a store using the standard AWS configuration.
    pub async fn new(bucket: &str, prefix: &str) -> Result<Self> {
        let aws_config = load_aws_config().await?;
        Ok(Self::with_client(Client::new(&aws_config), bucket, prefix))
    }

    /// Create a store using an existing client.
    pub fn with_client(client: Client, bucket: &str, prefix: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_owned(),
            prefix: prefix.trim_matches('/').to_owned(),
        }
    }

    /// The full object key for an artifact key.
    fn object_key(&self, key: &str) -> Result<String> {
        check_key(key)?;
        if self.prefix.is_empty() {
            Ok(key.to_owned())
        } else {
            Ok(format!("{}/{}", self.prefix, key))
        }
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    #[instrument(level = "debug", skip(self, data), fields(bucket = %self.bucket))]
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String> {
        let object_key = self.object_key(key)?;
        let location = format!("s3://{}/{}", self.bucket, object_key);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&object_key)
            .content_type(content_type)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .with_context(|| format!("Failed to upload {}", location))?;
        debug!(%location, bytes = data.len(), "Stored artifact");
        Ok(location)
    }
}
