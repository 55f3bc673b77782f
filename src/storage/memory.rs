//! In-memory object-store client.
//!
//! Buckets and their policies live in a `tokio::sync::RwLock<HashMap<...>>`.
//! Used as a stand-in backend in tests; behaves like an S3 endpoint for the
//! calls the provisioner makes, including the "already exists" and "no such
//! bucket" outcomes.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use super::backend::ObjectStore;
use crate::errors::BackendError;
use crate::policy::BucketPolicy;

/// In-memory object store.  Maps bucket name to its policy, if any.
#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: tokio::sync::RwLock<HashMap<String, Option<BucketPolicy>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `bucket` exists.
    pub async fn has_bucket(&self, bucket: &str) -> bool {
        self.buckets.read().await.contains_key(bucket)
    }

    /// Snapshot of the policy currently stored on `bucket`.
    pub async fn policy(&self, bucket: &str) -> Option<BucketPolicy> {
        self.buckets.read().await.get(bucket).cloned().flatten()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            let mut buckets = self.buckets.write().await;
            if buckets.contains_key(&bucket) {
                return Err(BackendError::BucketExists { bucket });
            }
            debug!("Memory create_bucket: {}", bucket);
            buckets.insert(bucket, None);
            Ok(())
        })
    }

    fn delete_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            match self.buckets.write().await.remove(&bucket) {
                Some(_) => {
                    debug!("Memory delete_bucket: {}", bucket);
                    Ok(())
                }
                None => Err(BackendError::NoSuchBucket { bucket }),
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
            match self.buckets.read().await.get(&bucket) {
                Some(policy) => Ok(policy.clone()),
                None => Err(BackendError::NoSuchBucket { bucket }),
            }
        })
    }

    fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &BucketPolicy,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let bucket = bucket.to_string();
        let policy = policy.clone();
        Box::pin(async move {
            match self.buckets.write().await.get_mut(&bucket) {
                Some(slot) => {
                    *slot = Some(policy);
                    Ok(())
                }
                None => Err(BackendError::NoSuchBucket { bucket }),
            }
        })
    }

    fn delete_bucket_policy(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let bucket = bucket.to_string();
        Box::pin(async move {
            match self.buckets.write().await.get_mut(&bucket) {
                Some(slot) => {
                    *slot = None;
                    Ok(())
                }
                None => Err(BackendError::NoSuchBucket { bucket }),
            }
        })
    }
}

// -- Tests -------------------------------------------------------------------
