//! Bucket lifecycle service.
//!
//! [`Provisioner`] routes each lifecycle request to the backend it names,
//! drives that backend's object-store and identity clients, and classifies
//! failures into the caller-visible vocabulary (see [`crate::errors`]).
//!
//! Every request is independent.  The only shared state is the frozen
//! [`BackendRegistry`]; policies and credentials are never cached, so a
//! grant is a read-modify-write of the bucket policy on the backend.  Two
//! concurrent grants on the same bucket race and the last writer wins.
//!
//! A grant creates the identity before it writes the policy.  If the policy
//! write fails the identity and its access key are left behind, and every
//! retry of the grant issues another key.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use utoipa::ToSchema;

use crate::errors::{BackendError, ProvisionerError};
use crate::handle::BucketHandle;
use crate::policy::{BucketPolicy, PolicyStatement};
use crate::registry::{Backend, BackendRegistry};

/// Request parameter naming the backend.
pub const BACKEND_ID_PARAM: &str = "id";

/// Protocol key of the credential bundle returned on grant.
pub const S3_PROTOCOL: &str = "s3";

/// Credentials issued to a grantee for one protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: String,
    pub region: String,
}

/// Result of a successful grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantedAccess {
    /// Account id of the created identity; revoke takes it back.
    pub account_id: String,
    /// Credentials keyed by protocol name.
    pub credentials: BTreeMap<String, Credential>,
}

/// The lifecycle service.
pub struct Provisioner {
    name: String,
    registry: Arc<BackendRegistry>,
}

impl Provisioner {
    pub fn new(name: impl Into<String>, registry: Arc<BackendRegistry>) -> Self {
        Self {
            name: name.into(),
            registry,
        }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// `GetInfo`: the driver name.
    pub fn get_info(&self) -> Result<&str, ProvisionerError> {
        if self.name.is_empty() {
            error!("Provisioner name is empty");
            return Err(ProvisionerError::EmptyDriverName);
        }
        Ok(&self.name)
    }

    /// `CreateBucket`: create `bucket_name` on the backend named in
    /// `parameters` and return its handle.
    pub async fn create_bucket(
        &self,
        bucket_name: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<BucketHandle, ProvisionerError> {
        if bucket_name.is_empty() {
            return Err(ProvisionerError::InvalidArgument {
                message: "bucket name is empty".to_string(),
            });
        }
        let backend_id = backend_param(parameters).ok_or_else(|| {
            ProvisionerError::InvalidArgument {
                message: format!("parameter '{BACKEND_ID_PARAM}' is required"),
            }
        })?;
        let backend = self.lookup(backend_id)?;

        info!("Creating bucket {} on backend {}", bucket_name, backend.id());

        match backend.object_store().create_bucket(bucket_name).await {
            Ok(()) => {}
            Err(BackendError::BucketExists { bucket }) => {
                warn!("Bucket {} already exists on backend {}", bucket, backend.id());
                return Err(ProvisionerError::AlreadyExists { bucket });
            }
            Err(e) => {
                error!("Failed to create bucket {}: {}", bucket_name, e);
                return Err(e.into());
            }
        }

        let handle = BucketHandle::new(backend.id(), bucket_name);
        info!("Created bucket {}", handle);
        Ok(handle)
    }

    /// `DeleteBucket`: delete the bucket a handle names.  A bucket that is
    /// already gone counts as deleted.
    pub async fn delete_bucket(&self, bucket_id: &str) -> Result<(), ProvisionerError> {
        let handle = BucketHandle::decode(bucket_id)?;
        let backend = self.lookup(handle.backend_id())?;

        info!("Deleting bucket {}", handle);

        match backend.object_store().delete_bucket(handle.bucket_name()).await {
            Ok(()) => {
                info!("Deleted bucket {}", handle);
                Ok(())
            }
            Err(BackendError::NoSuchBucket { .. }) => {
                warn!("Bucket {} does not exist, nothing to delete", handle);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete bucket {}: {}", handle, e);
                Err(e.into())
            }
        }
    }

    /// `GrantBucketAccess`: create an identity for `user_name`, add its
    /// statement to the bucket policy and return its credentials.
    pub async fn grant_bucket_access(
        &self,
        bucket_id: &str,
        user_name: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<GrantedAccess, ProvisionerError> {
        if user_name.is_empty() {
            return Err(ProvisionerError::InvalidArgument {
                message: "user name is empty".to_string(),
            });
        }
        let handle = BucketHandle::decode(bucket_id)?;
        let backend = self.resolve(&handle, parameters)?;
        let bucket_name = handle.bucket_name();
        let display_name = format!("{}_{}", backend.account_name(), user_name);

        info!(
            "Granting {} (display name {}) access to bucket {}",
            user_name, display_name, handle
        );

        let user = backend
            .identity()
            .create_user(user_name, &display_name)
            .await
            .inspect_err(|e| error!("Failed to create user {}: {}", user_name, e))?;

        let key = user.access_keys.first().ok_or_else(|| {
            error!("Identity service issued no access key for {}", user_name);
            ProvisionerError::BackendFailure(anyhow::anyhow!(
                "no access key issued for user {user_name}"
            ))
        })?;

        let existing = backend
            .object_store()
            .get_bucket_policy(bucket_name)
            .await
            .inspect_err(|e| error!("Failed to fetch policy of bucket {}: {}", handle, e))?;
        if existing.is_none() {
            debug!("Bucket {} has no policy yet", handle);
        }

        let policy = BucketPolicy::merge(existing, PolicyStatement::grant(user_name, bucket_name));
        backend
            .object_store()
            .put_bucket_policy(bucket_name, &policy)
            .await
            .inspect_err(|e| error!("Failed to set policy of bucket {}: {}", handle, e))?;

        info!(
            "Granted {} access to bucket {} as account {}",
            user_name, handle, user.account_id
        );

        let credential = Credential {
            access_key_id: key.access_key_id.clone(),
            secret_access_key: key.secret_access_key.clone(),
            endpoint: backend.endpoint().to_string(),
            region: backend.region().to_string(),
        };

        Ok(GrantedAccess {
            account_id: user.account_id,
            credentials: BTreeMap::from([(S3_PROTOCOL.to_string(), credential)]),
        })
    }

    /// `RevokeBucketAccess`: drop the identity's statement from the bucket
    /// policy and delete the identity.  An identity that no longer exists
    /// counts as revoked.
    pub async fn revoke_bucket_access(
        &self,
        bucket_id: &str,
        account_id: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<(), ProvisionerError> {
        if account_id.is_empty() {
            return Err(ProvisionerError::InvalidArgument {
                message: "account id is empty".to_string(),
            });
        }
        let handle = BucketHandle::decode(bucket_id)?;
        let backend = self.resolve(&handle, parameters)?;

        info!("Revoking account {} from bucket {}", account_id, handle);

        let user = match backend.identity().get_user(account_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Account {} does not exist, nothing to revoke", account_id);
                return Ok(());
            }
            Err(e) => {
                error!("Failed to look up account {}: {}", account_id, e);
                return Err(e.into());
            }
        };

        // An empty sid would match every unnamed statement on the bucket.
        if user.user_name.is_empty() {
            warn!(
                "Account {} has no user name, leaving policy of bucket {} untouched",
                account_id, handle
            );
        } else {
            remove_statement(backend, &handle, &user.user_name).await?;
        }

        match backend.identity().remove_user(account_id).await {
            Ok(()) | Err(BackendError::NoSuchUser { .. }) => {
                info!("Revoked account {} from bucket {}", account_id, handle);
                Ok(())
            }
            Err(e) => {
                error!("Failed to delete user {}: {}", account_id, e);
                Err(e.into())
            }
        }
    }

    fn lookup(&self, backend_id: &str) -> Result<&Backend, ProvisionerError> {
        self.registry.get(backend_id).inspect_err(|e| {
            error!("Invalid backend id: {}", e);
        })
    }

    /// Pick the backend for an operation on an existing bucket.  The
    /// parameter wins when present but must agree with the handle.
    fn resolve(
        &self,
        handle: &BucketHandle,
        parameters: &HashMap<String, String>,
    ) -> Result<&Backend, ProvisionerError> {
        match backend_param(parameters) {
            Some(requested) if requested != handle.backend_id() => {
                error!("Bucket {} requested on backend {}", handle, requested);
                Err(ProvisionerError::BackendMismatch {
                    handle: handle.encode(),
                    requested: requested.to_string(),
                })
            }
            _ => self.lookup(handle.backend_id()),
        }
    }
}

fn backend_param(parameters: &HashMap<String, String>) -> Option<&str> {
    parameters
        .get(BACKEND_ID_PARAM)
        .map(String::as_str)
        .filter(|id| !id.is_empty())
}

/// Remove the statement for `sid` from the bucket policy, deleting the
/// policy once no statements remain.  A missing bucket or policy leaves
/// nothing to remove.
async fn remove_statement(
    backend: &Backend,
    handle: &BucketHandle,
    sid: &str,
) -> Result<(), ProvisionerError> {
    let store = backend.object_store();
    let bucket = handle.bucket_name();

    let mut policy = match store.get_bucket_policy(bucket).await {
        Ok(Some(policy)) => policy,
        Ok(None) | Err(BackendError::NoSuchBucket { .. }) => {
            debug!("Bucket {} has no policy to clean up", handle);
            return Ok(());
        }
        Err(e) => {
            error!("Failed to fetch policy of bucket {}: {}", handle, e);
            return Err(e.into());
        }
    };

    if !policy.remove_statement(sid) {
        debug!("Bucket {} policy has no statement for {}", handle, sid);
        return Ok(());
    }

    let result = if policy.is_empty() {
        store.delete_bucket_policy(bucket).await
    } else {
        store.put_bucket_policy(bucket, &policy).await
    };

    match result {
        Ok(()) | Err(BackendError::NoSuchBucket { .. }) => Ok(()),
        Err(e) => {
            error!("Failed to update policy of bucket {}: {}", handle, e);
            Err(e.into())
        }
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RpcCode;
    use crate::iam::client::IdentityClient;
    use crate::iam::memory::MemoryIdentityClient;
    use crate::storage::backend::ObjectStore;
    use crate::storage::memory::MemoryObjectStore;
    use std::future::Future;
    use std::pin::Pin;

    /// Object store whose every call fails with a transport error.
    struct UnreachableObjectStore;

    type BoxResult<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

    fn unreachable<'a, T: Send + 'a>() -> BoxResult<'a, T> {
        Box::pin(async { Err(BackendError::Other(anyhow::anyhow!("connection refused"))) })
    }

    impl ObjectStore for UnreachableObjectStore {
        fn create_bucket(&self, _: &str) -> BoxResult<'_, ()> {
            unreachable()
        }
        fn delete_bucket(&self, _: &str) -> BoxResult<'_, ()> {
            unreachable()
        }
        fn get_bucket_policy(&self, _: &str) -> BoxResult<'_, Option<BucketPolicy>> {
            unreachable()
        }
        fn put_bucket_policy(&self, _: &str, _: &BucketPolicy) -> BoxResult<'_, ()> {
            unreachable()
        }
        fn delete_bucket_policy(&self, _: &str) -> BoxResult<'_, ()> {
            unreachable()
        }
    }

    struct Fixture {
        provisioner: Provisioner,
        store: Arc<MemoryObjectStore>,
        iam: Arc<MemoryIdentityClient>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryObjectStore::new());
        let iam = Arc::new(MemoryIdentityClient::new());

        let mut registry = BackendRegistry::new();
        registry
            .add(
                Backend::new(
                    "east",
                    store.clone(),
                    iam.clone(),
                    "acct",
                    "http://objects.east",
                    "us-east-1",
                )
                .unwrap(),
            )
            .unwrap();
        registry
            .add(
                Backend::new(
                    "down",
                    Arc::new(UnreachableObjectStore),
                    Arc::new(MemoryIdentityClient::new()),
                    "acct",
                    "http://objects.down",
                    "us-east-1",
                )
                .unwrap(),
            )
            .unwrap();

        Fixture {
            provisioner: Provisioner::new("test.objectstorage.k8s.io", Arc::new(registry)),
            store,
            iam,
        }
    }

    fn params(id: &str) -> HashMap<String, String> {
        HashMap::from([(BACKEND_ID_PARAM.to_string(), id.to_string())])
    }

    #[test]
    fn test_get_info() {
        let f = fixture();
        assert_eq!(f.provisioner.get_info().unwrap(), "test.objectstorage.k8s.io");

        let unnamed = Provisioner::new("", Arc::new(BackendRegistry::new()));
        assert!(matches!(
            unnamed.get_info(),
            Err(ProvisionerError::EmptyDriverName)
        ));
    }

    #[tokio::test]
    async fn test_create_bucket_returns_handle() {
        let f = fixture();
        let handle = f.provisioner.create_bucket("logs", &params("east")).await.unwrap();
        assert_eq!(handle.encode(), "east:logs");
        assert!(f.store.has_bucket("logs").await);
    }

    #[tokio::test]
    async fn test_create_existing_bucket_is_already_exists() {
        let f = fixture();
        f.provisioner.create_bucket("logs", &params("east")).await.unwrap();
        let err = f.provisioner.create_bucket("logs", &params("east")).await.unwrap_err();
        assert!(matches!(err, ProvisionerError::AlreadyExists { .. }));
        assert_eq!(err.code(), RpcCode::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_bucket_unknown_backend() {
        let f = fixture();
        let err = f.provisioner.create_bucket("logs", &params("west")).await.unwrap_err();
        assert!(matches!(err, ProvisionerError::BackendNotFound { .. }));
        assert_eq!(err.code(), RpcCode::InvalidArgument);

        let err = f.provisioner.create_bucket("logs", &HashMap::new()).await.unwrap_err();
        assert_eq!(err.code(), RpcCode::InvalidArgument);

        let err = f.provisioner.create_bucket("", &params("east")).await.unwrap_err();
        assert_eq!(err.code(), RpcCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_create_bucket_backend_failure_is_retryable() {
        let f = fixture();
        let err = f.provisioner.create_bucket("logs", &params("down")).await.unwrap_err();
        assert!(matches!(err, ProvisionerError::BackendFailure(_)));
        assert!(err.code().is_retryable());
    }

    #[tokio::test]
    async fn test_delete_bucket() {
        let f = fixture();
        let handle = f.provisioner.create_bucket("logs", &params("east")).await.unwrap();
        f.provisioner.delete_bucket(&handle.encode()).await.unwrap();
        assert!(!f.store.has_bucket("logs").await);
    }

    #[tokio::test]
    async fn test_delete_missing_bucket_succeeds() {
        let f = fixture();
        f.provisioner.delete_bucket("east:never-created").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_bucket_invalid_handles() {
        let f = fixture();
        let err = f.provisioner.delete_bucket("logs").await.unwrap_err();
        assert!(matches!(err, ProvisionerError::MalformedHandle { .. }));

        let err = f.provisioner.delete_bucket("west:logs").await.unwrap_err();
        assert!(matches!(err, ProvisionerError::BackendNotFound { .. }));

        let err = f.provisioner.delete_bucket("down:logs").await.unwrap_err();
        assert_eq!(err.code(), RpcCode::Internal);
    }

    #[tokio::test]
    async fn test_grant_without_existing_policy() {
        let f = fixture();
        f.provisioner.create_bucket("logs", &params("east")).await.unwrap();

        let granted = f
            .provisioner
            .grant_bucket_access("east:logs", "alice", &params("east"))
            .await
            .unwrap();

        let policy = f.store.policy("logs").await.unwrap();
        assert_eq!(policy.statements.len(), 1);
        let st = &policy.statements[0];
        assert_eq!(st.sid, "alice");
        assert!(st.principals().iter().any(|p| p.ends_with("/alice")));
        assert!(st.resources.iter().any(|r| r.ends_with(":logs")));

        let user = f.iam.get_user(&granted.account_id).await.unwrap().unwrap();
        assert_eq!(user.user_name, "alice");
        assert_eq!(user.display_name, "acct_alice");

        let cred = &granted.credentials[S3_PROTOCOL];
        assert!(!cred.access_key_id.is_empty());
        assert!(!cred.secret_access_key.is_empty());
        assert_eq!(cred.endpoint, "http://objects.east");
        assert_eq!(cred.region, "us-east-1");
    }

    #[tokio::test]
    async fn test_repeated_grant_is_idempotent() {
        let f = fixture();
        f.provisioner.create_bucket("logs", &params("east")).await.unwrap();

        for _ in 0..2 {
            f.provisioner
                .grant_bucket_access("east:logs", "alice", &params("east"))
                .await
                .unwrap();
        }

        let policy = f.store.policy("logs").await.unwrap();
        assert_eq!(policy.statements.len(), 1);
        assert_eq!(policy.statements[0].sid, "alice");
        assert_eq!(f.iam.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_grants_for_distinct_users_accumulate() {
        let f = fixture();
        f.provisioner.create_bucket("logs", &params("east")).await.unwrap();
        for user in ["alice", "bob"] {
            f.provisioner
                .grant_bucket_access("east:logs", user, &HashMap::new())
                .await
                .unwrap();
        }

        let policy = f.store.policy("logs").await.unwrap();
        let sids: Vec<_> = policy.statements.iter().map(|s| s.sid.as_str()).collect();
        assert_eq!(sids, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_grant_backend_mismatch() {
        let f = fixture();
        let err = f
            .provisioner
            .grant_bucket_access("east:logs", "alice", &params("down"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::BackendMismatch { .. }));
        assert_eq!(err.code(), RpcCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_grant_invalid_arguments() {
        let f = fixture();
        let err = f
            .provisioner
            .grant_bucket_access("east:", "alice", &params("east"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::MalformedHandle { .. }));

        let err = f
            .provisioner
            .grant_bucket_access("west:logs", "alice", &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::BackendNotFound { .. }));

        let err = f
            .provisioner
            .grant_bucket_access("east:logs", "", &params("east"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), RpcCode::InvalidArgument);
    }

    #[tokio::test]
    async fn test_grant_policy_failure_is_retryable() {
        let f = fixture();
        let err = f
            .provisioner
            .grant_bucket_access("down:logs", "alice", &params("down"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::BackendFailure(_)));
        assert!(err.code().is_retryable());
    }

    #[tokio::test]
    async fn test_grant_on_missing_bucket_is_retryable() {
        let f = fixture();
        let err = f
            .provisioner
            .grant_bucket_access("east:logs", "alice", &params("east"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), RpcCode::Internal);
    }

    #[tokio::test]
    async fn test_revoke_removes_statement_and_user() {
        let f = fixture();
        f.provisioner.create_bucket("logs", &params("east")).await.unwrap();
        let alice = f
            .provisioner
            .grant_bucket_access("east:logs", "alice", &params("east"))
            .await
            .unwrap();
        f.provisioner
            .grant_bucket_access("east:logs", "bob", &params("east"))
            .await
            .unwrap();

        f.provisioner
            .revoke_bucket_access("east:logs", &alice.account_id, &params("east"))
            .await
            .unwrap();

        let policy = f.store.policy("logs").await.unwrap();
        assert!(policy.statement("alice").is_none());
        assert!(policy.statement("bob").is_some());
        assert!(f.iam.get_user(&alice.account_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoke_last_grant_deletes_policy() {
        let f = fixture();
        f.provisioner.create_bucket("logs", &params("east")).await.unwrap();
        let alice = f
            .provisioner
            .grant_bucket_access("east:logs", "alice", &params("east"))
            .await
            .unwrap();

        f.provisioner
            .revoke_bucket_access("east:logs", &alice.account_id, &HashMap::new())
            .await
            .unwrap();
        assert!(f.store.policy("logs").await.is_none());
        assert_eq!(f.iam.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_revoke_unknown_account_succeeds() {
        let f = fixture();
        f.provisioner
            .revoke_bucket_access("east:logs", "no-such-account", &params("east"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_revoke_after_bucket_deleted() {
        let f = fixture();
        f.provisioner.create_bucket("logs", &params("east")).await.unwrap();
        let alice = f
            .provisioner
            .grant_bucket_access("east:logs", "alice", &params("east"))
            .await
            .unwrap();
        f.provisioner.delete_bucket("east:logs").await.unwrap();

        f.provisioner
            .revoke_bucket_access("east:logs", &alice.account_id, &params("east"))
            .await
            .unwrap();
        assert_eq!(f.iam.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_revoke_invalid_arguments() {
        let f = fixture();
        let err = f
            .provisioner
            .revoke_bucket_access("logs", "acct", &params("east"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionerError::MalformedHandle { .. }));

        let err = f
            .provisioner
            .revoke_bucket_access("east:logs", "", &params("east"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), RpcCode::InvalidArgument);
    }

    /// Identity service whose lookups come back without a user name.
    #[derive(Default)]
    struct NamelessIdentityClient {
        removed: std::sync::Mutex<Vec<String>>,
    }

    impl IdentityClient for NamelessIdentityClient {
        fn create_user(
            &self,
            _: &str,
            _: &str,
        ) -> BoxResult<'_, crate::iam::client::IdentityUser> {
            unreachable()
        }

        fn get_user(
            &self,
            account_id: &str,
        ) -> BoxResult<'_, Option<crate::iam::client::IdentityUser>> {
            let user = crate::iam::client::IdentityUser {
                account_id: account_id.to_string(),
                user_name: String::new(),
                display_name: String::new(),
                access_keys: Vec::new(),
            };
            Box::pin(async move { Ok(Some(user)) })
        }

        fn remove_user(&self, account_id: &str) -> BoxResult<'_, ()> {
            self.removed.lock().unwrap().push(account_id.to_string());
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_revoke_nameless_account_keeps_unnamed_statements() {
        let store = Arc::new(MemoryObjectStore::new());
        let iam = Arc::new(NamelessIdentityClient::default());
        let mut registry = BackendRegistry::new();
        registry
            .add(
                Backend::new(
                    "east",
                    store.clone(),
                    iam.clone(),
                    "acct",
                    "http://objects.east",
                    "us-east-1",
                )
                .unwrap(),
            )
            .unwrap();
        let provisioner = Provisioner::new("test.objectstorage.k8s.io", Arc::new(registry));

        store.create_bucket("logs").await.unwrap();
        let public_read = BucketPolicy::from_json(
            r#"{"Statement":[{"Effect":"Allow","Principal":"*","Action":"s3:GetObject","Resource":"arn:aws:s3:::logs/*"}]}"#,
        )
        .unwrap();
        store.put_bucket_policy("logs", &public_read).await.unwrap();

        provisioner
            .revoke_bucket_access("east:logs", "uuid-1", &HashMap::new())
            .await
            .unwrap();

        assert_eq!(store.policy("logs").await, Some(public_read));
        assert_eq!(*iam.removed.lock().unwrap(), vec!["uuid-1".to_string()]);
    }
}
