//! Axum router construction.
//!
//! The [`app`] function wires every lifecycle operation to its handler and
//! returns a ready-to-serve [`axum::Router`].  All operations are `POST`
//! with a JSON body; `/health`, `/metrics` and `/openapi.json` are plain
//! `GET` routes.

use axum::{
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::errors::generate_request_id;
use crate::handlers::{bucket, provisioner};
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

/// Value of the `server` response header.
const SERVER_NAME: &str = "bucket-provisioner";

// -- OpenAPI document -----------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bucket Provisioner API",
        version = "0.1.0",
        description = "Bucket lifecycle and access provisioning across object-storage backends"
    ),
    paths(
        health_check,
        provisioner::get_info,
        bucket::create_bucket,
        bucket::delete_bucket,
        bucket::grant_bucket_access,
        bucket::revoke_bucket_access,
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Provisioner", description = "Driver identity"),
        (name = "Bucket", description = "Bucket lifecycle and access"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all routes.
pub fn app(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/openapi.json", get(openapi_json))
        .route("/v1/provisioner/info", post(provisioner::get_info))
        .route("/v1/buckets/create", post(bucket::create_bucket))
        .route("/v1/buckets/delete", post(bucket::delete_bucket))
        .route("/v1/buckets/grant", post(bucket::grant_bucket_access))
        .route("/v1/buckets/revoke", post(bucket::revoke_bucket_access));

    if state.config.observability.metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    // Inner layers run first; metrics_middleware is outermost so it sees
    // the full request lifecycle.
    router
        .with_state(state)
        .layer(middleware::from_fn(common_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(metrics_middleware))
}

// -- Common headers middleware -----------------------------------------------

/// Adds `x-request-id`, `date` and `server` to every response.  An
/// `x-request-id` already set by the error renderer is kept.
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    if !headers.contains_key("x-request-id") {
        if let Ok(value) = HeaderValue::from_str(&generate_request_id()) {
            headers.insert("x-request-id", value);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    if let Ok(value) = HeaderValue::from_str(&date) {
        headers.insert("date", value);
    }
    headers.insert("server", HeaderValue::from_static(SERVER_NAME));

    response
}

// -- Health check ------------------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// `GET /openapi.json` -- The OpenAPI document for this router.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

// -- Tests -------------------------------------------------------------------
