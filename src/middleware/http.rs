//! HTTP-level middleware (cross-cutting concerns).
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id)
//! - Access logging / request tracing (TraceLayer)
//! - Body size limits
//! - Global timeouts
//!
//! Limits come from `HttpConfig`. Layer failures are rendered with the same
//! `{"success": false, "message": ...}` envelope as handler errors: timeouts
//! via `HandleErrorLayer`, and the body limit's plain-text 413 is rewritten
//! by `json_payload_too_large`.

use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;
use crate::error::ErrorResponse;

async fn handle_layer_error(err: BoxError) -> impl IntoResponse {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            Json(ErrorResponse::new("request timed out")),
        )
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("internal server error")),
        )
    }
}

// RequestBodyLimitLayer answers oversized requests itself, with a text body.
async fn json_payload_too_large(res: Response) -> Response {
    if res.status() != StatusCode::PAYLOAD_TOO_LARGE {
        return res;
    }
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(ErrorResponse::new("request body too large")),
    )
        .into_response()
}

/// Apply HTTP-level middleware to the given Router.
pub fn apply(router: Router, config: &HttpConfig) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        .layer(HandleErrorLayer::new(handle_layer_error))
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http());

    router
        .layer(layers)
        .layer(map_response(json_payload_too_large))
}
