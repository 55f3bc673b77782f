//! Composite bucket handles.
//!
//! Callers never see a bare bucket name: `CreateBucket` returns an opaque
//! handle binding the backend id to the bucket name, and every later
//! operation on that bucket passes the handle back.
//!
//! Wire format: `<backend_id>:<bucket_name>`.  Backend ids are validated at
//! startup to never contain the separator, so decoding splits on the first
//! occurrence only and bucket names are free to contain it.

use std::fmt;
use std::str::FromStr;

use crate::errors::ProvisionerError;

/// Reserved separator between backend id and bucket name.
pub const SEPARATOR: char = ':';

/// A decoded bucket handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketHandle {
    backend_id: String,
    bucket_name: String,
}

impl BucketHandle {
    /// Bind a bucket name to the backend it lives on.
    pub fn new(backend_id: impl Into<String>, bucket_name: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            bucket_name: bucket_name.into(),
        }
    }

    /// Decode a handle previously produced by [`BucketHandle::encode`].
    ///
    /// Fails with [`ProvisionerError::MalformedHandle`] when the separator is
    /// missing or nothing follows it.  An unknown backend id is not a decode
    /// failure; that is detected at registry lookup.
    pub fn decode(handle: &str) -> Result<Self, ProvisionerError> {
        match handle.split_once(SEPARATOR) {
            Some((backend_id, bucket_name)) if !bucket_name.is_empty() => {
                Ok(Self::new(backend_id, bucket_name))
            }
            _ => Err(ProvisionerError::MalformedHandle {
                handle: handle.to_string(),
            }),
        }
    }

    /// Encode into the opaque wire string.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn backend_id(&self) -> &str {
        &self.backend_id
    }

    pub fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

impl fmt::Display for BucketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.backend_id, SEPARATOR, self.bucket_name)
    }
}

impl FromStr for BucketHandle {
    type Err = ProvisionerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

// -- Tests -------------------------------------------------------------------
