//! Bucket provisioner library: multi-backend object-storage bucket
//! provisioning.
//!
//! This crate provides the components of the provisioning driver: the
//! backend registry, the bucket-handle codec, the bucket-policy builder,
//! object-store and identity clients, the lifecycle service and its JSON
//! transport.

pub mod config;
pub mod errors;
pub mod handle;
pub mod handlers;
pub mod iam;
pub mod metrics;
pub mod policy;
pub mod provisioner;
pub mod registry;
pub mod server;
pub mod storage;

use crate::config::Config;
use crate::provisioner::Provisioner;

/// Shared application state passed to all handlers via `axum::extract::State`.
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Lifecycle service over the frozen backend registry.
    pub provisioner: Provisioner,
}
