use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints that are unauthenticated and accessible to any client:
/// liveness, the registration/login gateway, and read-only job search.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated liveness endpoint for monitoring and load
        // balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Creates an employer or job seeker account. Admins are seeded at
        // startup and cannot register here.
        .route("/auth/register", post(handlers::register))
        // POST /auth/login
        // Verifies credentials for the requested role and sets the
        // session cookie.
        .route("/auth/login", post(handlers::login))
        // GET /job-listings?q=&category=&location=
        // Filtered job search; all provided filters must match, newest
        // postings first.
        .route("/job-listings", get(handlers::search_jobs))
        // GET /jobs/api/jobs
        // The unfiltered catalog as summaries with the employer's company.
        .route("/jobs/api/jobs", get(handlers::api_jobs))
}
