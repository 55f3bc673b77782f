//! JSON request handlers for the lifecycle operations.

pub mod bucket;
pub mod provisioner;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use tracing::debug;

use crate::errors::ProvisionerError;

/// Unwrap a JSON body, turning a rejection into an invalid-argument error
/// so every failure carries the same error body.
pub(crate) fn parse_body<T>(
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ProvisionerError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            Err(ProvisionerError::InvalidArgument {
                message: rejection.body_text(),
            })
        }
    }
}
