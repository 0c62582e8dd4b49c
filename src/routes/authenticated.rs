use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Routes behind the session middleware. Every handler receives a resolved
/// `AuthUser`; the employer/seeker role gates and all ownership checks are
/// applied inside the handlers, per operation.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/logout
        // Deletes the server-side session and clears the cookie.
        .route("/auth/logout", get(handlers::logout))
        // GET /me
        // The authenticated principal's profile.
        .route("/me", get(handlers::get_me))
        // --- Employer: Job Catalog ---
        // POST /jobs/employer/post_job
        // Form submission of a new posting. Title is required; salary must
        // be numeric when present.
        .route("/jobs/employer/post_job", post(handlers::post_job))
        // GET /jobs/employer/my_jobs
        // The employer's own postings.
        .route("/jobs/employer/my_jobs", get(handlers::my_jobs))
        // PUT/DELETE /jobs/{id}
        // Owner-only modify/remove. Deletion cascades the job's
        // applications inside one transaction.
        .route(
            "/jobs/{id}",
            put(handlers::update_job).delete(handlers::delete_job),
        )
        // GET /jobs/{id}/applications
        // Owner-only list of applicants for one posting.
        .route("/jobs/{id}/applications", get(handlers::job_applications))
        // --- Job Seeker: Application Ledger ---
        // POST /applications/apply/{job_id}
        // One application per (job, seeker); repeats are informational.
        .route("/applications/apply/{job_id}", post(handlers::apply))
        // GET /applications/my_applications
        // The seeker's own applications with job title and company.
        .route(
            "/applications/my_applications",
            get(handlers::my_applications),
        )
        // PUT /applications/{id}/status
        // Owner-only move through the closed status workflow.
        .route(
            "/applications/{id}/status",
            put(handlers::update_application_status),
        )
        // POST /upload/resume
        // Presigned PUT URL for a seeker's resume document.
        .route("/upload/resume", post(handlers::upload_resume))
}
