//! Abstract identity client trait.
//!
//! An identity client manages per-grant users on a backend's control plane.
//! Creating a user also issues the access key the grantee will use against
//! the object store.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::errors::BackendError;

/// An S3 access key pair issued to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// A user known to the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    /// Opaque account id assigned by the identity service.
    pub account_id: String,
    /// User name the grant was requested for.  Doubles as the policy `Sid`.
    pub user_name: String,
    pub display_name: String,
    /// Keys issued with this response.  Lookups return none.
    pub access_keys: Vec<AccessKey>,
}

/// Async identity-service contract.
pub trait IdentityClient: Send + Sync + 'static {
    /// Create (or reuse) a user named `user_name` and issue it an access key.
    fn create_user(
        &self,
        user_name: &str,
        display_name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<IdentityUser, BackendError>> + Send + '_>>;

    /// Look a user up by account id, `None` when it does not exist.
    fn get_user(
        &self,
        account_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<IdentityUser>, BackendError>> + Send + '_>>;

    /// Delete a user.  A missing user is [`BackendError::NoSuchUser`].
    fn remove_user(
        &self,
        account_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>>;
}
