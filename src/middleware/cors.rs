//! CORS headers for the auth and provisioning endpoints.
//!
//! Policy:
//! - `Access-Control-Allow-Origin` echoes the request's `Origin`, or `*` when absent.
//! - Credentials are allowed.
//! - Methods: GET, POST, OPTIONS. Headers: Content-Type, Authorization and the
//!   custom token header.
//!
//! Preflight requests are answered by the handlers themselves
//! (`200 {"success": true}`), so this layer only decorates responses instead of
//! short-circuiting `OPTIONS` like `tower_http::cors::CorsLayer` would.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderValue, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::config::AuthConfig;
use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct CorsPolicy {
    allow_headers: HeaderValue,
}

impl CorsPolicy {
    pub fn new(config: &AuthConfig) -> Result<Self, String> {
        let allow_headers =
            HeaderValue::from_str(&format!("Content-Type, Authorization, {}", config.token_header))
                .map_err(|e| format!("invalid token header for CORS: {}", e))?;
        Ok(Self { allow_headers })
    }
}

/// Apply the CORS policy to the given Router.
pub fn apply(router: Router<AppState>, policy: CorsPolicy) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(policy, cors_middleware))
}

async fn cors_middleware(
    State(policy): State<CorsPolicy>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req
        .headers()
        .get(header::ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));

    let mut res = next.run(req).await;

    let headers = res.headers_mut();
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, policy.allow_headers);
    headers.append(header::VARY, HeaderValue::from_static("Origin"));

    res
}
