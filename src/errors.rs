//! Provisioner error types.
//!
//! Every per-request variant maps onto one of three caller-visible
//! outcomes ([`RpcCode`]): invalid argument, already exists, or internal.
//! The enum implements [`axum::response::IntoResponse`] so handlers can
//! simply return `Err(ProvisionerError::BackendNotFound { .. })`.
//!
//! Backend clients report [`BackendError`]; the provisioner decides how
//! each of those is classified for the operation at hand.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::handle::SEPARATOR;

/// Generate a 16-character hex request ID.
pub fn generate_request_id() -> String {
    let bytes: [u8; 8] = rand::random();
    hex::encode(bytes).to_uppercase()
}

/// Caller-visible status vocabulary of the remote operation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RpcCode {
    /// The request cannot succeed with these parameters. Do not retry.
    InvalidArgument,
    /// The bucket already exists. Terminal, do not retry.
    AlreadyExists,
    /// Transient backend failure. Retry with backoff.
    Internal,
}

impl RpcCode {
    /// Whether the orchestrator should re-invoke the operation.
    pub fn is_retryable(self) -> bool {
        matches!(self, RpcCode::Internal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RpcCode::InvalidArgument => "InvalidArgument",
            RpcCode::AlreadyExists => "AlreadyExists",
            RpcCode::Internal => "Internal",
        }
    }
}

/// Provisioner errors, covering both startup and per-request failures.
#[derive(Debug, Error)]
pub enum ProvisionerError {
    /// Configuration is malformed or incomplete. Fatal at startup.
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// A configured backend id cannot be used to build bucket handles.
    #[error("backend id '{id}' is invalid: it must be non-empty and cannot contain '{}'", SEPARATOR)]
    InvalidBackendId { id: String },

    /// A backend with this id was already registered.
    #[error("backend already exists for id: {id}")]
    DuplicateBackend { id: String },

    /// The caller referenced a backend that is not configured.
    #[error("no backend configured for id: {id}")]
    BackendNotFound { id: String },

    /// The bucket handle does not decode into backend id and bucket name.
    #[error("malformed bucket id: '{handle}'")]
    MalformedHandle { handle: String },

    /// The bucket handle and the request parameters name different backends.
    #[error("bucket id '{handle}' does not belong to backend '{requested}'")]
    BackendMismatch { handle: String, requested: String },

    /// A required request field is missing or empty.
    #[error("{message}")]
    InvalidArgument { message: String },

    /// The driver was started without a name.
    #[error("provisioner name is empty")]
    EmptyDriverName,

    /// The backend reports the bucket already exists.
    #[error("bucket '{bucket}' already exists")]
    AlreadyExists { bucket: String },

    /// Any other backend or network failure.
    #[error("backend failure: {0:#}")]
    BackendFailure(#[from] anyhow::Error),
}

impl ProvisionerError {
    /// Classify this error into the caller-visible status vocabulary.
    pub fn code(&self) -> RpcCode {
        match self {
            ProvisionerError::BackendNotFound { .. }
            | ProvisionerError::MalformedHandle { .. }
            | ProvisionerError::BackendMismatch { .. }
            | ProvisionerError::InvalidArgument { .. }
            | ProvisionerError::EmptyDriverName => RpcCode::InvalidArgument,
            ProvisionerError::AlreadyExists { .. } => RpcCode::AlreadyExists,
            ProvisionerError::InvalidConfiguration { .. }
            | ProvisionerError::InvalidBackendId { .. }
            | ProvisionerError::DuplicateBackend { .. }
            | ProvisionerError::BackendFailure(_) => RpcCode::Internal,
        }
    }

    /// Return the HTTP status code used on the JSON transport.
    pub fn status_code(&self) -> StatusCode {
        match self.code() {
            RpcCode::InvalidArgument => StatusCode::BAD_REQUEST,
            RpcCode::AlreadyExists => StatusCode::CONFLICT,
            RpcCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Shorthand for an [`ProvisionerError::InvalidConfiguration`].
    pub fn config(message: impl Into<String>) -> Self {
        ProvisionerError::InvalidConfiguration {
            message: message.into(),
        }
    }
}

/// JSON error body returned to callers.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: RpcCode,
    pub message: String,
    pub retryable: bool,
    pub request_id: String,
}

impl IntoResponse for ProvisionerError {
    fn into_response(self) -> Response {
        let request_id = generate_request_id();
        let code = self.code();
        // Internal details stay in the logs; callers get the classification.
        let message = match &self {
            ProvisionerError::BackendFailure(_) => "internal backend failure".to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            code,
            message,
            retryable: code.is_retryable(),
            request_id: request_id.clone(),
        };

        (
            self.status_code(),
            [("x-request-id", request_id)],
            Json(body),
        )
            .into_response()
    }
}

/// Errors reported by object-store and identity clients.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Bucket creation hit an existing bucket (owned by us or not).
    #[error("bucket '{bucket}' already exists")]
    BucketExists { bucket: String },

    /// The bucket does not exist.
    #[error("bucket '{bucket}' does not exist")]
    NoSuchBucket { bucket: String },

    /// The identity does not exist.
    #[error("user '{account_id}' does not exist")]
    NoSuchUser { account_id: String },

    /// Anything else: transport, auth, throttling, malformed responses.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<BackendError> for ProvisionerError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::BucketExists { bucket } => ProvisionerError::AlreadyExists { bucket },
            other => ProvisionerError::BackendFailure(anyhow::Error::new(other)),
        }
    }
}

// -- Tests -------------------------------------------------------------------
