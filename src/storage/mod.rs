//! Object-store clients.
//!
//! The [`backend::ObjectStore`] trait abstracts over the data plane a
//! backend exposes.  Implementations include an S3 client for real
//! endpoints and an in-memory store.

pub mod backend;
pub mod memory;
pub mod s3;
