//! Backend registry.
//!
//! Maps the backend id a caller supplies to the [`Backend`] that serves it.
//! The registry is filled once at startup (adding requires `&mut self`) and
//! then shared as an `Arc<BackendRegistry>`; request handling only ever
//! reads from it, so no locking is needed on the request path.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::{check_endpoint, Config, ConnectionConfig};
use crate::errors::ProvisionerError;
use crate::handle::SEPARATOR;
use crate::iam::client::IdentityClient;
use crate::iam::proxy::IamProxyClient;
use crate::storage::backend::ObjectStore;
use crate::storage::s3::S3ObjectStore;

/// One configured backend: an object store plus its identity service.
pub struct Backend {
    id: String,
    object_store: Arc<dyn ObjectStore>,
    identity: Arc<dyn IdentityClient>,
    /// Prefix for grantee display names.
    account_name: String,
    /// Object-store endpoint handed to grantees.
    endpoint: String,
    /// Region handed to grantees.
    region: String,
}

impl Backend {
    /// Assemble a backend.  The id must be non-empty and must not contain
    /// the handle separator, or handles naming it could not be decoded.
    pub fn new(
        id: impl Into<String>,
        object_store: Arc<dyn ObjectStore>,
        identity: Arc<dyn IdentityClient>,
        account_name: impl Into<String>,
        endpoint: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, ProvisionerError> {
        let id = id.into();
        if id.is_empty() || id.contains(SEPARATOR) {
            return Err(ProvisionerError::InvalidBackendId { id });
        }
        Ok(Self {
            id,
            object_store,
            identity,
            account_name: account_name.into(),
            endpoint: endpoint.into(),
            region: region.into(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn object_store(&self) -> &dyn ObjectStore {
        self.object_store.as_ref()
    }

    pub fn identity(&self) -> &dyn IdentityClient {
        self.identity.as_ref()
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Write-once-per-key map of backends.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Backend>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend.  Re-registering an id is a configuration error
    /// and leaves the first registration in place.
    pub fn add(&mut self, backend: Backend) -> Result<(), ProvisionerError> {
        if self.backends.contains_key(backend.id()) {
            let id = backend.id;
            error!("Failed to register backend: duplicate id {}", id);
            return Err(ProvisionerError::DuplicateBackend { id });
        }
        info!("Registered backend {}", backend.id());
        self.backends.insert(backend.id.clone(), backend);
        Ok(())
    }

    /// Look a backend up by id.
    pub fn get(&self, id: &str) -> Result<&Backend, ProvisionerError> {
        self.backends
            .get(id)
            .ok_or_else(|| ProvisionerError::BackendNotFound { id: id.to_string() })
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Build the backend for one configured connection.
pub async fn connect_backend(conn: &ConnectionConfig) -> Result<Backend, ProvisionerError> {
    info!("Creating clients for backend {}", conn.id);

    check_endpoint(&conn.identity.endpoint).await?;

    let object_store = S3ObjectStore::new(
        &conn.object_store.endpoint,
        Some(conn.region()),
        &conn.object_store.access_key,
        &conn.object_store.secret_key,
    )
    .await
    .map_err(|e| ProvisionerError::config(format!("backend {}: object store: {e:#}", conn.id)))?;

    let identity = IamProxyClient::new(
        &conn.identity.endpoint,
        &conn.identity.username,
        &conn.identity.password,
        conn.identity.insecure,
    )
    .map_err(|e| ProvisionerError::config(format!("backend {}: identity: {e:#}", conn.id)))?;

    Backend::new(
        conn.id.clone(),
        Arc::new(object_store),
        Arc::new(identity),
        conn.account_name(),
        conn.object_store.endpoint.clone(),
        conn.region(),
    )
}

/// Build the registry from every configured connection.  Any failure aborts
/// startup.
pub async fn build_registry(config: &Config) -> Result<BackendRegistry, ProvisionerError> {
    let mut registry = BackendRegistry::new();
    for conn in &config.connections {
        let backend = connect_backend(conn).await.inspect_err(|e| {
            error!("Failed to create backend {}: {}", conn.id, e);
        })?;
        registry.add(backend)?;
    }
    info!("Backend registry built: {:?}", registry.ids());
    Ok(registry)
}

// -- Tests -------------------------------------------------------------------
