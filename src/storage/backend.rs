//! Abstract object-store client trait.
//!
//! Every object-store client must implement [`ObjectStore`].  The trait
//! covers the data-plane calls the provisioner needs: bucket lifecycle and
//! bucket policy read/write.  Clients translate their native failures into
//! [`BackendError`] so the provisioner can classify them uniformly.

use std::future::Future;
use std::pin::Pin;

use crate::errors::BackendError;
use crate::policy::BucketPolicy;

/// Async object-store contract.
pub trait ObjectStore: Send + Sync + 'static {
    /// Create a bucket.  An existing bucket is [`BackendError::BucketExists`].
    fn create_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;

    /// Delete a bucket.  A missing bucket is [`BackendError::NoSuchBucket`].
    fn delete_bucket(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;

    /// Fetch the bucket's access policy, `None` when it has none.
    fn get_bucket_policy(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<BucketPolicy>, BackendError>> + Send + '_>>;

    /// Replace the bucket's access policy.
    fn put_bucket_policy(
        &self,
        bucket: &str,
        policy: &BucketPolicy,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;

    /// Remove the bucket's access policy.  Removing an absent policy succeeds.
    fn delete_bucket_policy(
        &self,
        bucket: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;
}
