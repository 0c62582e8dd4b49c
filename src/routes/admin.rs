use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Routes nested under `/admin`. Requests pass the authentication layer
/// first; the handler then requires the admin role explicitly before
/// touching any aggregate data.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/dashboard
        // Aggregate counts of employers, seekers, jobs and applications.
        .route("/dashboard", get(handlers::admin_dashboard))
}
