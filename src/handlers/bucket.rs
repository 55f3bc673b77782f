//! Bucket lifecycle handlers: create, delete, grant and revoke.
//!
//! Each handler unwraps its JSON body, calls the [`Provisioner`] and counts
//! the outcome.  Errors render through
//! [`ProvisionerError`](crate::errors::ProvisionerError)'s `IntoResponse`.
//!
//! [`Provisioner`]: crate::provisioner::Provisioner

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::parse_body;
use crate::errors::{ErrorBody, ProvisionerError};
use crate::metrics::record_operation;
use crate::provisioner::Credential;
use crate::AppState;

// -- Request / response bodies ------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest {
    /// Name of the bucket to create on the backend.
    pub name: String,
    /// Opaque parameters; `id` selects the backend.
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketResponse {
    /// Composite handle `<backendId>:<bucketName>`.
    pub bucket_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBucketRequest {
    pub bucket_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantBucketAccessRequest {
    pub bucket_id: String,
    /// User name the access is granted to.
    pub name: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GrantBucketAccessResponse {
    /// Account id to pass back on revoke.
    pub account_id: String,
    /// Credentials keyed by protocol.
    pub credentials: BTreeMap<String, Credential>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeBucketAccessRequest {
    pub bucket_id: String,
    pub account_id: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// Empty JSON object.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct EmptyResponse {}

// -- Handlers -----------------------------------------------------------------

/// `POST /v1/buckets/create` -- Create a bucket on the selected backend.
#[utoipa::path(
    post,
    path = "/v1/buckets/create",
    tag = "Bucket",
    operation_id = "CreateBucket",
    request_body = CreateBucketRequest,
    responses(
        (status = 200, description = "Bucket created", body = CreateBucketResponse),
        (status = 400, description = "Invalid argument", body = ErrorBody),
        (status = 409, description = "Bucket already exists", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn create_bucket(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBucketRequest>, JsonRejection>,
) -> Result<Json<CreateBucketResponse>, ProvisionerError> {
    let result = async {
        let req = parse_body(payload)?;
        state
            .provisioner
            .create_bucket(&req.name, &req.parameters)
            .await
    }
    .await;
    record_operation("CreateBucket", &result);

    Ok(Json(CreateBucketResponse {
        bucket_id: result?.encode(),
    }))
}

/// `POST /v1/buckets/delete` -- Delete the bucket a handle names.
#[utoipa::path(
    post,
    path = "/v1/buckets/delete",
    tag = "Bucket",
    operation_id = "DeleteBucket",
    request_body = DeleteBucketRequest,
    responses(
        (status = 200, description = "Bucket deleted or already absent", body = EmptyResponse),
        (status = 400, description = "Invalid argument", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn delete_bucket(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DeleteBucketRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ProvisionerError> {
    let result = async {
        let req = parse_body(payload)?;
        state.provisioner.delete_bucket(&req.bucket_id).await
    }
    .await;
    record_operation("DeleteBucket", &result);

    result?;
    Ok(Json(EmptyResponse::default()))
}

/// `POST /v1/buckets/grant` -- Issue credentials scoped to one bucket.
#[utoipa::path(
    post,
    path = "/v1/buckets/grant",
    tag = "Bucket",
    operation_id = "GrantBucketAccess",
    request_body = GrantBucketAccessRequest,
    responses(
        (status = 200, description = "Access granted", body = GrantBucketAccessResponse),
        (status = 400, description = "Invalid argument", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn grant_bucket_access(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GrantBucketAccessRequest>, JsonRejection>,
) -> Result<Json<GrantBucketAccessResponse>, ProvisionerError> {
    let result = async {
        let req = parse_body(payload)?;
        state
            .provisioner
            .grant_bucket_access(&req.bucket_id, &req.name, &req.parameters)
            .await
    }
    .await;
    record_operation("GrantBucketAccess", &result);

    let granted = result?;
    Ok(Json(GrantBucketAccessResponse {
        account_id: granted.account_id,
        credentials: granted.credentials,
    }))
}

/// `POST /v1/buckets/revoke` -- Revoke an account's access to a bucket.
#[utoipa::path(
    post,
    path = "/v1/buckets/revoke",
    tag = "Bucket",
    operation_id = "RevokeBucketAccess",
    request_body = RevokeBucketAccessRequest,
    responses(
        (status = 200, description = "Access revoked or account already gone", body = EmptyResponse),
        (status = 400, description = "Invalid argument", body = ErrorBody),
        (status = 500, description = "Backend failure", body = ErrorBody)
    )
)]
pub async fn revoke_bucket_access(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RevokeBucketAccessRequest>, JsonRejection>,
) -> Result<Json<EmptyResponse>, ProvisionerError> {
    let result = async {
        let req = parse_body(payload)?;
        state
            .provisioner
            .revoke_bucket_access(&req.bucket_id, &req.account_id, &req.parameters)
            .await
    }
    .await;
    record_operation("RevokeBucketAccess", &result);

    result?;
    Ok(Json(EmptyResponse::default()))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_parameters_default_to_empty() {
        let req: CreateBucketRequest = serde_json::from_value(json!({"name": "logs"})).unwrap();
        assert_eq!(req.name, "logs");
        assert!(req.parameters.is_empty());
    }

    #[test]
    fn test_request_fields_are_camel_case() {
        let req: RevokeBucketAccessRequest = serde_json::from_value(json!({
            "bucketId": "east:logs",
            "accountId": "uuid-1",
            "parameters": {"id": "east"}
        }))
        .unwrap();
        assert_eq!(req.bucket_id, "east:logs");
        assert_eq!(req.account_id, "uuid-1");
        assert_eq!(req.parameters["id"], "east");
    }

    #[test]
    fn test_grant_response_shape() {
        let resp = GrantBucketAccessResponse {
            account_id: "uuid-1".into(),
            credentials: BTreeMap::from([(
                "s3".to_string(),
                Credential {
                    access_key_id: "AK".into(),
                    secret_access_key: "SK".into(),
                    endpoint: "http://objects".into(),
                    region: "us-east-1".into(),
                },
            )]),
        };
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "accountId": "uuid-1",
                "credentials": {"s3": {
                    "accessKeyId": "AK",
                    "secretAccessKey": "SK",
                    "endpoint": "http://objects",
                    "region": "us-east-1"
                }}
            })
        );
    }

    #[test]
    fn test_empty_response_is_empty_object() {
        assert_eq!(serde_json::to_value(EmptyResponse::default()).unwrap(), json!({}));
    }
}
