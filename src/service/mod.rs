//! Review REST Service
//!
//! Exposes team rosters and the pull request lifecycle as a REST API.
//!
//! ## Endpoints
//!
//! - `POST /auth/login` - Issue a bearer credential for an existing user
//! - `POST /team/add` - Create a team and upsert its members
//! - `GET /team/get` - Fetch a team (auth)
//! - `POST /users/setIsActive` - Flip a user's reviewer eligibility (auth)
//! - `GET /users/getReview` - Pull requests assigned to a user (auth)
//! - `POST /pullRequest/create` - Create a pull request and assign reviewers (auth)
//! - `POST /pullRequest/merge` - Merge a pull request, idempotent (auth)
//! - `POST /pullRequest/reassign` - Replace one reviewer (auth)
//! - `GET /stats`, `GET /stats/user` - Assignment statistics (auth)
//! - `GET /health`, `GET /health/live`, `GET /health/ready` - Health checks

pub mod middleware;
pub mod routes;
pub mod state;

pub use middleware::{request_logging_middleware, require_bearer, AuthenticatedUser};
pub use routes::{create_router, ApiError, ErrorResponse};
pub use state::ServiceState;
