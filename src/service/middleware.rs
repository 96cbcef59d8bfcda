//! Service middleware for request tracking and bearer authentication.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{info, info_span, Instrument};

use crate::store::ReviewStore;
use crate::types::UserId;

use super::routes::ApiError;
use super::state::ServiceState;

/// Correlation id header, read from the request and echoed on the response.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identity attached to requests that passed [`require_bearer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

/// Request logging middleware that adds a correlation id and timing.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        user_id = tracing::field::Empty,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    info!(
        target: "review_service::access",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Reject requests without a valid `Authorization: Bearer <token>` header.
///
/// On success the caller's [`AuthenticatedUser`] is stored in the request
/// extensions.
pub async fn require_bearer<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if header.is_empty() {
        return Err(ApiError::unauthorized("missing authorization header"));
    }

    let token = parse_bearer(header)
        .ok_or_else(|| ApiError::unauthorized("invalid authorization header format"))?;

    let user_id = state.verifier().authenticate(token).map_err(|_| {
        tracing::debug!("Bearer credential rejected");
        ApiError::unauthorized("invalid or expired token")
    })?;

    tracing::Span::current().record("user_id", user_id.as_str());
    request.extensions_mut().insert(AuthenticatedUser(user_id));

    Ok(next.run(request).await)
}

fn parse_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}
