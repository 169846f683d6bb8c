//! aws-sdk-s3 backed object store

use super::store::{ObjectStore, ObjectStoreError};
use crate::config::S3StorageConfig;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;

pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Build a client from the `storage` config section
    ///
    /// Static keys are used when both are configured; otherwise the default
    /// AWS credential chain applies. A custom endpoint (MinIO, LocalStack)
    /// switches to path-style addressing.
    pub async fn from_config(config: &S3StorageConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            loader = loader.credentials_provider(aws_credential_types::Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "shashin-config",
            ));
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.endpoint.is_some())
            .build();

        Self::new(S3Client::from_conf(s3_config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, ObjectStoreError> {
        let output = match self.client.get_object().bucket(bucket).key(key).send().await {
            Ok(output) => output,
            Err(err) => {
                let err = err.into_service_error();
                if err.is_no_such_key() {
                    return Err(ObjectStoreError::NoSuchKey);
                }
                let code = err.code().unwrap_or("Unknown").to_string();
                let message = err
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| err.to_string());
                return Err(ObjectStoreError::Other { code, message });
            }
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| ObjectStoreError::other("BodyReadError", e.to_string()))?;

        Ok(body.into_bytes())
    }
}
