//! S3 object-store client.
//!
//! Talks to a backend's S3-compatible data-plane endpoint with static
//! credentials from the connection configuration.  Path-style addressing
//! is forced since on-premises object stores rarely serve virtual-hosted
//! bucket names.

use aws_sdk_s3::Client;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

use super::backend::ObjectStore;
use crate::errors::BackendError;
use crate::policy::BucketPolicy;

/// Region used for request signing when the connection does not set one.
const SIGNING_REGION: &str = "us-east-1";

/// Object-store client backed by the AWS SDK.
pub struct S3ObjectStore {
    /// AWS S3 SDK client.
    client: Client,
    /// Data-plane endpoint, kept for logging.
    endpoint: String,
}

impl S3ObjectStore {
    /// Create a client for `endpoint` signing with the given static keys.
    pub async fn new(
        endpoint: &str,
        region: Option<&str>,
        access_key_id: &str,
        secret_access_key: &str,
    ) -> anyhow::Result<Self> {
        let creds = aws_sdk_s3::config::Credentials::new(
            access_key_id,
            secret_access_key,
            None, // session_token
            None, // expiry
            "bucket-provisioner-config",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(
                region.unwrap_or(SIGNING_REGION).to_string(),
            ))
            .endpoint_url(endpoint)
            .credentials_provider(creds)
            // Failures surface to the caller, which owns retries.
            .retry_config(aws_config::retry::RetryConfig::disabled())
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        info!("S3 object store client initialized: endpoint={}", endpoint);

        Ok(Self {
            client: Client::from_conf(s3_config),
            endpoint: endpoint.to_string(),
        })
    }

    /// Map an AWS SDK error to a backend error with context.
    fn map_sdk_error(context: &str, err: impl std::fmt::Display) -> BackendError {
        BackendError::Other(anyhow::anyhow!("S3 {context}: {err}"))
    }
}

impl ObjectStore for S3ObjectStore {
    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            debug!("S3 create_bucket: endpoint={} bucket={}", self.endpoint, bucket);

            match self.client.create_bucket().bucket(&bucket).send().await {
                Ok(_) => Ok(()),
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.is_bucket_already_exists()
                        || service_err.is_bucket_already_owned_by_you()
                    {
                        Err(BackendError::BucketExists { bucket })
                    } else {
                        Err(Self::map_sdk_error("create_bucket", service_err))
                    }
                }
            }
        })
    }

    fn delete_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            debug!("S3 delete_bucket: endpoint={} bucket={}", self.endpoint, bucket);

            match self.client.delete_bucket().bucket(&bucket).send().await {
                Ok(_) => Ok(()),
                Err(e) => {
                    let service_err = e.into_service_error();
                    if service_err.meta().code() == Some("NoSuchBucket") {
                        Err(BackendError::NoSuchBucket { bucket })
                    } else {
                        Err(Self::map_sdk_error("delete_bucket", service_err))
                    }
                }
            }
        })
    }

    fn get_bucket_policy(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<BucketPolicy>, BackendError>> + Send + '_>>
    {
        let bucket = bucket.to_string();
        Box::pin(async move {
            debug!("S3 get_bucket_policy: endpoint={} bucket={}", self.endpoint, bucket);

            let resp = match self.client.get_bucket_policy().bucket(&bucket).send().await {
                Ok(resp) => resp,
                Err(e) => {
                    let service_err = e.into_service_error();
                    return match service_err.meta().code() {
                        Some("NoSuchBucketPolicy") => Ok(None),
                        Some("NoSuchBucket") => Err(BackendError::NoSuchBucket { bucket }),
                        _ => Err(Self::map_sdk_error("get_bucket_policy", service_err)),
                    };
                }
            };

            match resp.policy() {
                None => Ok(None),
                Some(json) if json.trim().is_empty() => Ok(None),
                Some(json) => BucketPolicy::from_json(json)
                    .map(Some)
                    .map_err(|e| Self::map_sdk_error("get_bucket_policy decode", e)),
            }
        })
    }

    fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &BucketPolicy,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let encoded = policy.to_json();
        Box::pin(async move {
            let json = encoded.map_err(|e| Self::map_sdk_error("put_bucket_policy encode", e))?;

            debug!("S3 put_bucket_policy: endpoint={} bucket={}", self.endpoint, bucket);

            self.client
                .put_bucket_policy()
                .bucket(&bucket)
                .policy(json)
                .send()
                .await
                .map_err(|e| {
                    let service_err = e.into_service_error();
                    if service_err.meta().code() == Some("NoSuchBucket") {
                        BackendError::NoSuchBucket {
                            bucket: bucket.clone(),
                        }
                    } else {
                        Self::map_sdk_error("put_bucket_policy", service_err)
                    }
                })?;

            Ok(())
        })
    }

    fn delete_bucket_policy(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            debug!("S3 delete_bucket_policy: endpoint={} bucket={}", self.endpoint, bucket);

            match self.client.delete_bucket_policy().bucket(&bucket).send().await {
                Ok(_) => Ok(()),
                Err(e) => {
                    let service_err = e.into_service_error();
                    match service_err.meta().code() {
                        Some("NoSuchBucketPolicy") => Ok(()),
                        Some("NoSuchBucket") => Err(BackendError::NoSuchBucket { bucket }),
                        _ => Err(Self::map_sdk_error("delete_bucket_policy", service_err)),
                    }
                }
            }
        })
    }
}

// -- Tests -------------------------------------------------------------------
