//! HTTP API for inbound sync payloads

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, warn};
use wrc_core::auth::BasicCredentials;
use wrc_core::config::InboundCredentials;
use wrc_core::events::{ReceiveEvent, RequestContext};
use wrc_core::traits::{POST_ENDPOINT, PRODUCT_ENDPOINT};

use crate::ReceiverState;

/// Error code used in 401 bodies
const FORBIDDEN_CODE: &str = "rest_forbidden";

/// Per-route response texts
struct Route {
    event: ReceiveEvent,
    path: &'static str,
    success: &'static str,
    failure: &'static str,
}

const POST_ROUTE: Route = Route {
    event: ReceiveEvent::PostData,
    path: POST_ENDPOINT,
    success: "Post processed successfully",
    failure: "Error processing post request",
};

const PRODUCT_ROUTE: Route = Route {
    event: ReceiveEvent::ProductData,
    path: PRODUCT_ENDPOINT,
    success: "Product processed successfully",
    failure: "Error processing product request",
};

/// Create the API router
///
/// Only the routes whose pipeline is in receive mode are mounted; the others
/// answer 404.
pub fn router(state: Arc<ReceiverState>) -> Router {
    let mut router = Router::new().route("/health", get(health));

    if state.routing.posts.is_receiver() {
        router = router.route(POST_ENDPOINT, post(receive_post_data));
    }
    if state.routing.products.is_receiver() {
        router = router.route(PRODUCT_ENDPOINT, post(receive_product_data));
    }

    router.with_state(state)
}

/// Health check endpoint
async fn health() -> &'static str {
    "ok"
}

/// Errors an inbound request can end in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401 with a `rest_forbidden` body
    Unauthorized(&'static str),
    /// 500 with a JSON string body
    Processing(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "code": FORBIDDEN_CODE,
                    "message": message,
                    "data": { "status": StatusCode::UNAUTHORIZED.as_u16() },
                })),
            )
                .into_response(),
            ApiError::Processing(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(message)).into_response()
            }
        }
    }
}

/// Check the Basic credentials of a request
///
/// Returns the authenticated username.
pub fn permission_check(
    headers: &HeaderMap,
    expected: &InboundCredentials,
) -> Result<String, ApiError> {
    let supplied = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(BasicCredentials::parse)
        .ok_or(ApiError::Unauthorized("Authentication Required"))?;

    if !expected.matches(&supplied.username, &supplied.password) {
        warn!(username = %supplied.username, "Inbound request with invalid credentials");
        return Err(ApiError::Unauthorized("Invalid Credentials"));
    }

    Ok(supplied.username)
}

/// Receive a full post payload
async fn receive_post_data(
    State(state): State<Arc<ReceiverState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<&'static str>, ApiError> {
    receive(&state, &POST_ROUTE, &headers, &body).await
}

/// Receive a product delta
async fn receive_product_data(
    State(state): State<Arc<ReceiverState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<&'static str>, ApiError> {
    receive(&state, &PRODUCT_ROUTE, &headers, &body).await
}

async fn receive(
    state: &ReceiverState,
    route: &Route,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<&'static str>, ApiError> {
    let username = permission_check(headers, &state.credentials)?;

    // Decode manually so a bad body maps to 500 like any other processing failure
    let data: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
        error!(path = route.path, "Malformed JSON body: {}", e);
        ApiError::Processing(route.failure)
    })?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let request = RequestContext::new(route.path, username).with_content_type(content_type);

    match state.hub.dispatch(route.event, &data, &request).await {
        Ok(subscribers) => {
            info!(
                path = route.path,
                subscribers, "Processed inbound {}", route.event
            );
            Ok(Json(route.success))
        }
        Err(e) => {
            error!(path = route.path, "Failed to dispatch {}: {}", route.event, e);
            Err(ApiError::Processing(route.failure))
        }
    }
}
