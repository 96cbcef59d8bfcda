//! Axum routes for the review service.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Query, State,
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, ReviewError};
use crate::store::ReviewStore;
use crate::types::{
    PullRequest, PullRequestId, PullRequestShort, Stats, Team, User, UserId, UserStats,
};

use super::middleware::{request_logging_middleware, require_bearer, AuthenticatedUser};
use super::state::ServiceState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to obtain a bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// User to log in as.
    pub user_id: String,
}

/// Issued bearer credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// HS256 JWT.
    pub token: String,
}

/// Team wrapper returned by `/team/add`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamResponse {
    /// The stored team.
    pub team: Team,
}

/// Request to flip a user's active flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetIsActiveRequest {
    /// Target user.
    pub user_id: String,
    /// New flag value.
    pub is_active: bool,
}

/// User wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    /// The updated user.
    pub user: User,
}

/// Pull requests a user is assigned to review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReviewsResponse {
    /// Reviewer.
    pub user_id: UserId,
    /// Assigned pull requests, newest first.
    pub pull_requests: Vec<PullRequestShort>,
}

/// Request to create a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePullRequestRequest {
    /// Identifier for the new pull request.
    pub pull_request_id: String,
    /// Title.
    pub pull_request_name: String,
    /// Author; reviewers are drawn from their team.
    pub author_id: String,
}

/// Request to merge a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergePullRequestRequest {
    /// Pull request to merge.
    pub pull_request_id: String,
}

/// Request to replace a reviewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignRequest {
    /// Open pull request.
    pub pull_request_id: String,
    /// Reviewer to replace.
    pub old_user_id: String,
}

/// Pull request wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestResponse {
    /// The pull request after the operation.
    pub pr: PullRequest,
}

/// Result of a reassignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassignResponse {
    /// The pull request after the swap.
    pub pr: PullRequest,
    /// The reviewer that took over the slot.
    pub replaced_by: UserId,
}

/// `?team_name=` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamNameQuery {
    /// Team to fetch. Absent is `BAD_REQUEST`.
    pub team_name: Option<String>,
}

/// `?user_id=` query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserIdQuery {
    /// Target user. Absent is `BAD_REQUEST`.
    pub user_id: Option<String>,
}

/// Service health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Simple liveness response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    /// Always `"alive"`.
    pub status: String,
}

/// Readiness response with dependency status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Whether the service can take traffic.
    pub ready: bool,
    /// Whether the store answered its health check.
    pub store: bool,
    /// Failure reason when not ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error envelope: `{"error": {"code": .., "message": ..}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Code and message.
    pub error: ErrorBody,
}

/// Body of the error envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
}

/// Handler error carrying an HTTP status and the envelope contents.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: ErrorCode,
    message: String,
}

impl ApiError {
    /// Create an error with an explicit code; the status follows the code.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: status_for(code),
            code,
            message: message.into(),
        }
    }

    /// Malformed request.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Missing or rejected credential.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// HTTP status of this error.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Envelope code of this error.
    pub fn code(&self) -> ErrorCode {
        self.code
    }
}

/// HTTP status for an error code.
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::TeamExists | ErrorCode::BadRequest => StatusCode::BAD_REQUEST,
        ErrorCode::PrExists
        | ErrorCode::PrMerged
        | ErrorCode::NotAssigned
        | ErrorCode::NoCandidate => StatusCode::CONFLICT,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        if err.is_internal() {
            tracing::error!(error = %err, "Store failure");
            return Self::new(ErrorCode::InternalError, "internal server error");
        }
        tracing::debug!(code = %err.code(), error = %err, "Request rejected");
        Self::new(err.code(), err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Unparseable request body");
        Self::bad_request("invalid request body")
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Unparseable query string");
        Self::bad_request("invalid query string")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            tracing::warn!(code = %self.code, error = %self.message, "Request error");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn required(value: &str, message: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(message));
    }
    Ok(())
}

fn required_param(value: Option<String>, message: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(message)),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Issue a bearer credential for an existing user.
async fn login_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = body?;
    required(&request.user_id, "user_id is required")?;

    let user = state.directory.get_user(&UserId::new(request.user_id)).await?;
    let token = state.issuer().issue(&user).map_err(|e| {
        tracing::error!(error = %e, "Failed to issue credential");
        ApiError::new(ErrorCode::InternalError, "internal server error")
    })?;

    tracing::info!(user_id = %user.user_id, "Credential issued");
    Ok(Json(LoginResponse { token }))
}

/// Create a team and upsert its members.
async fn add_team_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    body: Result<Json<Team>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let Json(team) = body?;
    required(&team.team_name, "team_name is required")?;
    for member in &team.members {
        required(member.user_id.as_str(), "member user_id is required")?;
    }

    let team = state.directory.add_team(&team).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// Fetch a team with its members.
async fn get_team_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    query: Result<Query<TeamNameQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiError> {
    let Query(query) = query?;
    let team_name = required_param(query.team_name, "team_name query parameter is required")?;

    Ok(Json(state.directory.get_team(&team_name).await?))
}

/// Flip a user's active flag.
async fn set_is_active_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    Extension(caller): Extension<AuthenticatedUser>,
    body: Result<Json<SetIsActiveRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(request) = body?;
    required(&request.user_id, "user_id is required")?;

    let user = state
        .directory
        .set_active(&UserId::new(request.user_id), request.is_active)
        .await?;

    tracing::debug!(caller = %caller.0, user_id = %user.user_id, "Activity change by caller");
    Ok(Json(UserResponse { user }))
}

/// Pull requests a user is assigned to review.
async fn get_review_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<UserReviewsResponse>, ApiError> {
    let Query(query) = query?;
    let user_id = UserId::new(required_param(
        query.user_id,
        "user_id query parameter is required",
    )?);

    let pull_requests = state.lifecycle.reviews_for(&user_id).await?;
    Ok(Json(UserReviewsResponse {
        user_id,
        pull_requests,
    }))
}

/// Create a pull request with automatically assigned reviewers.
async fn create_pr_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    body: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiError> {
    let Json(request) = body?;
    let message = "pull_request_id, pull_request_name, and author_id are required";
    required(&request.pull_request_id, message)?;
    required(&request.pull_request_name, message)?;
    required(&request.author_id, message)?;

    let pr = state
        .lifecycle
        .create(
            PullRequestId::new(request.pull_request_id),
            request.pull_request_name,
            UserId::new(request.author_id),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

/// Merge a pull request. Repeated merges return the same state.
async fn merge_pr_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    body: Result<Json<MergePullRequestRequest>, JsonRejection>,
) -> Result<Json<PullRequestResponse>, ApiError> {
    let Json(request) = body?;
    required(&request.pull_request_id, "pull_request_id is required")?;

    let pr = state
        .lifecycle
        .merge(&PullRequestId::new(request.pull_request_id))
        .await?;
    Ok(Json(PullRequestResponse { pr }))
}

/// Replace one reviewer of an open pull request.
async fn reassign_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    body: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let Json(request) = body?;
    let message = "pull_request_id and old_user_id are required";
    required(&request.pull_request_id, message)?;
    required(&request.old_user_id, message)?;

    let (pr, replaced_by) = state
        .lifecycle
        .reassign(
            &PullRequestId::new(request.pull_request_id),
            &UserId::new(request.old_user_id),
        )
        .await?;

    Ok(Json(ReassignResponse { pr, replaced_by }))
}

/// Assignment statistics for all users and pull requests.
async fn stats_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
) -> Result<Json<Stats>, ApiError> {
    Ok(Json(state.directory.stats().await?))
}

/// Assignment statistics for one user.
async fn user_stats_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
    query: Result<Query<UserIdQuery>, QueryRejection>,
) -> Result<Json<UserStats>, ApiError> {
    let Query(query) = query?;
    let user_id = required_param(query.user_id, "user_id query parameter is required")?;

    Ok(Json(state.directory.user_stats(&UserId::new(user_id)).await?))
}

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Liveness endpoint.
///
/// Does NOT check dependencies.
async fn liveness_handler() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "alive".to_string(),
    })
}

/// Readiness endpoint.
///
/// Returns 200 if the store answers, 503 otherwise.
async fn readiness_handler<S: ReviewStore + 'static>(
    State(state): State<ServiceState<S>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    if state.store.is_healthy().await {
        (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                store: true,
                details: None,
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponse {
                ready: false,
                store: false,
                details: Some("Store unavailable".to_string()),
            }),
        )
    }
}

// ============================================================================
// Router Construction
// ============================================================================

/// Create the Axum router for the review service.
///
/// Every route except login, team creation and the health checks requires
/// a bearer credential. Each request runs inside a logging span carrying its
/// correlation id.
pub fn create_router<S: ReviewStore + 'static>(state: ServiceState<S>) -> Router {
    let protected = Router::new()
        .route("/team/get", get(get_team_handler::<S>))
        .route("/users/setIsActive", post(set_is_active_handler::<S>))
        .route("/users/getReview", get(get_review_handler::<S>))
        .route("/pullRequest/create", post(create_pr_handler::<S>))
        .route("/pullRequest/merge", post(merge_pr_handler::<S>))
        .route("/pullRequest/reassign", post(reassign_handler::<S>))
        .route("/stats", get(stats_handler::<S>))
        .route("/stats/user", get(user_stats_handler::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_bearer::<S>,
        ));

    Router::new()
        .route("/auth/login", post(login_handler::<S>))
        .route("/team/add", post(add_team_handler::<S>))
        // Health checks
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler::<S>))
        .merge(protected)
        .with_state(state)
        .layer(middleware::from_fn(request_logging_middleware))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorCode::TeamExists), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorCode::PrExists), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::NoCandidate), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorCode::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorCode::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ErrorCode::InternalError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_store_errors_are_opaque() {
        let err = ApiError::from(ReviewError::Store("connection reset by peer".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "internal server error");
    }

    #[test]
    fn test_domain_errors_keep_their_code() {
        let err = ApiError::from(ReviewError::PrMerged(PullRequestId::new("pr-1")));
        assert_eq!(err.code(), ErrorCode::PrMerged);
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
