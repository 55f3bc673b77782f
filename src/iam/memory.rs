//! In-memory identity client.
//!
//! Keeps users in a `tokio::sync::RwLock<HashMap<...>>` keyed by account id.
//! Creating a user that already exists reuses its account id and issues a
//! fresh key, mirroring the IAM proxy.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use super::client::{AccessKey, IdentityClient, IdentityUser};
use crate::errors::BackendError;

/// In-memory identity service.
#[derive(Default)]
pub struct MemoryIdentityClient {
    users: tokio::sync::RwLock<HashMap<String, IdentityUser>>,
}

impl MemoryIdentityClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users currently known.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    fn issue_key() -> AccessKey {
        let id: [u8; 10] = rand::random();
        let secret: [u8; 20] = rand::random();
        AccessKey {
            access_key_id: hex::encode(id).to_uppercase(),
            secret_access_key: hex::encode(secret),
        }
    }
}

impl IdentityClient for MemoryIdentityClient {
    fn create_user(
        &self,
        user_name: &str,
        display_name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<IdentityUser, BackendError>> + Send + '_>> {
        let user_name = user_name.to_string();
        let display_name = display_name.to_string();
        Box::pin(async move {
            let mut users = self.users.write().await;

            let account_id = users
                .values()
                .find(|u| u.user_name == user_name)
                .map(|u| u.account_id.clone())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            debug!("Memory create_user: user={} account_id={}", user_name, account_id);

            let stored = IdentityUser {
                account_id: account_id.clone(),
                user_name,
                display_name,
                access_keys: Vec::new(),
            };
            users.insert(account_id, stored.clone());

            Ok(IdentityUser {
                access_keys: vec![Self::issue_key()],
                ..stored
            })
        })
    }

    fn get_user(
        &self,
        account_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<IdentityUser>, BackendError>> + Send + '_>>
    {
        let account_id = account_id.to_string();
        Box::pin(async move { Ok(self.users.read().await.get(&account_id).cloned()) })
    }

    fn remove_user(
        &self,
        account_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let account_id = account_id.to_string();
        Box::pin(async move {
            match self.users.write().await.remove(&account_id) {
                Some(_) => Ok(()),
                None => Err(BackendError::NoSuchUser { account_id }),
            }
        })
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_issues_key() {
        let iam = MemoryIdentityClient::new();
        let user = iam.create_user("alice", "acct_alice").await.unwrap();
        assert_eq!(user.user_name, "alice");
        assert_eq!(user.access_keys.len(), 1);
        assert_eq!(user.access_keys[0].access_key_id.len(), 20);
    }

    #[tokio::test]
    async fn test_create_reuses_account() {
        let iam = MemoryIdentityClient::new();
        let first = iam.create_user("alice", "acct_alice").await.unwrap();
        let second = iam.create_user("alice", "acct_alice").await.unwrap();
        assert_eq!(first.account_id, second.account_id);
        assert_eq!(iam.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_remove_user() {
        let iam = MemoryIdentityClient::new();
        let user = iam.create_user("alice", "acct_alice").await.unwrap();

        iam.remove_user(&user.account_id).await.unwrap();
        assert!(iam.get_user(&user.account_id).await.unwrap().is_none());

        let err = iam.remove_user(&user.account_id).await.unwrap_err();
        assert!(matches!(err, BackendError::NoSuchUser { .. }));
    }
}
