//! Provisioner identity handler.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ProvisionerError;
use crate::metrics::record_operation;
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GetInfoResponse {
    /// Driver name, in reverse-DNS form.
    pub name: String,
}

/// `POST /v1/provisioner/info` -- Report the driver name.
#[utoipa::path(
    post,
    path = "/v1/provisioner/info",
    tag = "Provisioner",
    operation_id = "GetInfo",
    responses(
        (status = 200, description = "Driver name", body = GetInfoResponse),
        (status = 400, description = "Driver name not configured", body = crate::errors::ErrorBody)
    )
)]
pub async fn get_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<GetInfoResponse>, ProvisionerError> {
    let result = state.provisioner.get_info().map(str::to_string);
    record_operation("GetInfo", &result);
    Ok(Json(GetInfoResponse { name: result? }))
}
