//! IAM proxy identity client.
//!
//! Creates and removes object-store users through the IAM proxy exposed by
//! the backend's control plane, authenticating every call with the
//! connection's username and password (HTTP basic auth).
//!
//! Endpoints (relative to the configured control-plane endpoint):
//!   Create user + key:  `POST   /oss/iam_proxy/buckets_access_keys`
//!   Look up user:       `GET    /oss/iam_proxy/users/{uuid}`
//!   Remove user:        `DELETE /oss/iam_proxy/users/{uuid}`

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, info};

use super::client::{AccessKey, IdentityClient, IdentityUser};
use crate::errors::BackendError;

const ACCESS_KEYS_PATH: &str = "oss/iam_proxy/buckets_access_keys";
const USERS_PATH: &str = "oss/iam_proxy/users";

/// Users are created as externally managed identities.
const USER_TYPE: &str = "external";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Identity client for the IAM proxy HTTP API.
pub struct IamProxyClient {
    http: reqwest::Client,
    /// Control-plane endpoint without trailing slash.
    endpoint: String,
    username: String,
    password: String,
}

#[derive(Serialize)]
struct CreateUsersRequest<'a> {
    users: Vec<NewUser<'a>>,
}

#[derive(Serialize)]
struct NewUser<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    username: &'a str,
    display_name: &'a str,
}

#[derive(Deserialize)]
struct UsersResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct UserRecord {
    uuid: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    buckets_access_keys: Vec<AccessKey>,
}

impl From<UserRecord> for IdentityUser {
    fn from(record: UserRecord) -> Self {
        IdentityUser {
            account_id: record.uuid,
            user_name: record.username,
            display_name: record.display_name,
            access_keys: record.buckets_access_keys,
        }
    }
}

impl IamProxyClient {
    /// Create a client for the control plane at `endpoint`.
    ///
    /// `insecure` disables TLS certificate verification, for control planes
    /// serving self-signed certificates.
    pub fn new(
        endpoint: &str,
        username: &str,
        password: &str,
        insecure: bool,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .danger_accept_invalid_certs(insecure)
            .build()?;

        info!("IAM proxy client initialized: endpoint={}", endpoint);

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn map_http_error(context: &str, err: impl std::fmt::Display) -> BackendError {
        BackendError::Other(anyhow::anyhow!("IAM proxy {context}: {err}"))
    }

    /// Turn a non-success response into an error carrying its body.
    async fn unexpected_status(context: &str, resp: reqwest::Response) -> BackendError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        Self::map_http_error(context, format!("unexpected status {status}: {body}"))
    }
}

impl IdentityClient for IamProxyClient {
    fn create_user(
        &self,
        user_name: &str,
        display_name: &str,
    ) -> Pin<Box<dyn Future<Output = Result<IdentityUser, BackendError>> + Send + '_>> {
        let user_name = user_name.to_string();
        let display_name = display_name.to_string();
        Box::pin(async move {
            debug!("IAM proxy create_user: user={} display_name={}", user_name, display_name);

            let body = CreateUsersRequest {
                users: vec![NewUser {
                    kind: USER_TYPE,
                    username: &user_name,
                    display_name: &display_name,
                }],
            };

            let resp = self
                .http
                .post(self.url(ACCESS_KEYS_PATH))
                .basic_auth(&self.username, Some(&self.password))
                .json(&body)
                .send()
                .await
                .map_err(|e| Self::map_http_error("create_user", e))?;

            if !resp.status().is_success() {
                return Err(Self::unexpected_status("create_user", resp).await);
            }

            let parsed: UsersResponse = resp
                .json()
                .await
                .map_err(|e| Self::map_http_error("create_user decode", e))?;

            let record = parsed
                .users
                .into_iter()
                .next()
                .ok_or_else(|| Self::map_http_error("create_user", "response contains no user"))?;

            let mut user = IdentityUser::from(record);
            if user.user_name.is_empty() {
                user.user_name = user_name;
            }
            Ok(user)
        })
    }

    fn get_user(
        &self,
        account_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<IdentityUser>, BackendError>> + Send + '_>>
    {
        let account_id = account_id.to_string();
        Box::pin(async move {
            debug!("IAM proxy get_user: account_id={}", account_id);

            let resp = self
                .http
                .get(self.url(&format!("{USERS_PATH}/{account_id}")))
                .basic_auth(&self.username, Some(&self.password))
                .send()
                .await
                .map_err(|e| Self::map_http_error("get_user", e))?;

            match resp.status() {
                StatusCode::NOT_FOUND => Ok(None),
                s if s.is_success() => {
                    let record: UserRecord = resp
                        .json()
                        .await
                        .map_err(|e| Self::map_http_error("get_user decode", e))?;
                    Ok(Some(record.into()))
                }
                _ => Err(Self::unexpected_status("get_user", resp).await),
            }
        })
    }

    fn remove_user(
        &self,
        account_id: &str,
    ) -> Pin<Box<dyn Future<Output = Result<(), BackendError>> + Send + '_>> {
        let account_id = account_id.to_string();
        Box::pin(async move {
            debug!("IAM proxy remove_user: account_id={}", account_id);

            let resp = self
                .http
                .delete(self.url(&format!("{USERS_PATH}/{account_id}")))
                .basic_auth(&self.username, Some(&self.password))
                .send()
                .await
                .map_err(|e| Self::map_http_error("remove_user", e))?;

            match resp.status() {
                StatusCode::NOT_FOUND => Err(BackendError::NoSuchUser { account_id }),
                s if s.is_success() => Ok(()),
                _ => Err(Self::unexpected_status("remove_user", resp).await),
            }
        })
    }
}

// -- Tests -------------------------------------------------------------------
