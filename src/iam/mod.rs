//! Identity clients.
//!
//! The [`client::IdentityClient`] trait abstracts over a backend's identity
//! control plane.  Implementations include the IAM proxy HTTP client and an
//! in-memory service.

pub mod client;
pub mod memory;
pub mod proxy;
