use crate::{
    AppState,
    auth::{ApiError, AuthUser, new_session, session_cookie, SESSION_COOKIE, hash_password, verify_password},
    repository::Repository as _,
    models::{
        AdminDashboardStats, ApiResponse, ApplicantSummary, Application, ApplicationStatus,
        ApplicationSummary, Job, JobSummary, JobUpdate, LoginRequest, LoginResponse, NewJob,
        PostJobRequest, PresignedUrlRequest, PresignedUrlResponse, RegisterRequest, Role,
        UpdateJobRequest, UpdateStatusRequest, UserProfile,
    },
};
use axum::{
    Json,
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::Redirect,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// JobFilter
///
/// Accepted query parameters for the public job search endpoint
/// (GET /job-listings). All filters are optional; provided filters must all
/// match.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct JobFilter {
    /// Free-text search over title and description, case-insensitive.
    pub q: Option<String>,
    /// Category substring filter.
    pub category: Option<String>,
    /// Location substring filter.
    pub location: Option<String>,
}

// --- Role Gates ---

// Each gate matches the closed Role set exhaustively and yields the
// principal id on success; any other kind is denied outright.

fn require_employer(user: &AuthUser) -> Result<Uuid, ApiError> {
    match user.role {
        Role::Employer => Ok(user.id),
        Role::Admin | Role::JobSeeker => Err(ApiError::Forbidden),
    }
}

fn require_seeker(user: &AuthUser) -> Result<Uuid, ApiError> {
    match user.role {
        Role::JobSeeker => Ok(user.id),
        Role::Admin | Role::Employer => Err(ApiError::Forbidden),
    }
}

fn require_admin(user: &AuthUser) -> Result<Uuid, ApiError> {
    match user.role {
        Role::Admin => Ok(user.id),
        Role::Employer | Role::JobSeeker => Err(ApiError::Forbidden),
    }
}

// --- Field Validation ---

/// Normalizes an optional text field: trims, and treats empty as absent.
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parses a raw salary form field. Empty or missing means no salary; a
/// non-numeric value is a validation error and nothing gets written.
fn parse_salary(raw: Option<&str>) -> Result<Option<f64>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .map(Some)
            .map_err(|_| ApiError::Validation("Salary must be a number.".to_string())),
    }
}

// --- Credential Store Handlers ---

/// register
///
/// [Public Route] Creates an employer or job seeker account. Admin accounts
/// are seeded at startup and cannot be registered here. The duplicate-email
/// message intentionally confirms existence so the caller can pick another
/// address; the login endpoint never does.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered", body = ApiResponse),
        (status = 400, description = "Validation failure", body = ApiResponse),
        (status = 409, description = "Email already registered", body = ApiResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let role = Role::parse(payload.role.trim()).ok_or_else(|| {
        ApiError::Validation("Please select Employer or Job Seeker.".to_string())
    })?;

    let name = payload.name.trim();
    let email = payload.email.trim();
    if name.is_empty() || email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Name, email and password are required.".to_string(),
        ));
    }

    let password_hash = hash_password(&payload.password)?;

    match role {
        Role::Employer => {
            state
                .repo
                .create_employer(name, email, &password_hash, payload.company.as_deref())
                .await
                .ok_or_else(|| {
                    ApiError::Conflict("Employer email already registered.".to_string())
                })?;
        }
        Role::JobSeeker => {
            state
                .repo
                .create_job_seeker(name, email, &password_hash, payload.resume.as_deref())
                .await
                .ok_or_else(|| {
                    ApiError::Conflict("Job seeker email already registered.".to_string())
                })?;
        }
        Role::Admin => {
            return Err(ApiError::Validation(
                "Registration is only open to employers and job seekers.".to_string(),
            ));
        }
    }

    Ok(Json(ApiResponse::ok_redirect(
        "Registration successful. Please log in.",
        "/auth/login",
    )))
}

/// login
///
/// [Public Route] Authenticates a principal of the requested kind and
/// establishes a server-side session, returned to the client as an
/// HttpOnly cookie. Admins authenticate with their username in the `email`
/// field. Every failure path yields the same generic message.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ApiResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let role = Role::parse(payload.role.trim())
        .ok_or_else(|| ApiError::Validation("Invalid role selected.".to_string()))?;
    let identifier = payload.email.trim();

    // Per-kind lookup; the result collapses to (id, stored hash) so the
    // failure handling below is identical for every kind.
    let credentials: Option<(Uuid, String)> = match role {
        Role::Admin => state
            .repo
            .find_admin_by_username(identifier)
            .await
            .map(|admin| (admin.id, admin.password_hash)),
        Role::Employer => state
            .repo
            .find_employer_by_email(identifier)
            .await
            .map(|employer| (employer.id, employer.password_hash)),
        Role::JobSeeker => state
            .repo
            .find_seeker_by_email(identifier)
            .await
            .map(|seeker| (seeker.id, seeker.password_hash)),
    };

    let (principal_id, stored_hash) = credentials.ok_or(ApiError::InvalidCredentials)?;
    if !verify_password(&payload.password, &stored_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let session = new_session(principal_id, role);
    let token = session.token.clone();
    if !state.repo.create_session(session).await {
        return Err(ApiError::Internal);
    }

    let redirect = match role {
        Role::Admin => "/admin/dashboard",
        Role::Employer => "/jobs/employer/my_jobs",
        Role::JobSeeker => "/job-listings",
    };

    tracing::info!(principal = %principal_id, role = %role, "login succeeded");

    Ok((
        jar.add(session_cookie(&token)),
        Json(LoginResponse {
            success: true,
            message: "Login successful.".to_string(),
            user_id: Some(principal_id),
            role: Some(role),
            redirect: Some(redirect.to_string()),
        }),
    ))
}

/// logout
///
/// [Authenticated Route] Deletes the server-side session and clears the
/// cookie, then sends the client back to the public listings.
#[utoipa::path(
    get,
    path = "/auth/logout",
    responses((status = 303, description = "Session cleared"))
)]
pub async fn logout(
    _user: AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.repo.delete_session(cookie.value()).await;
    }
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/job-listings"),
    )
}

/// get_me
///
/// [Authenticated Route] The authenticated principal's public profile.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .repo
        .find_profile(user.id, user.role)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("Profile"))
}

// --- Job Catalog Handlers ---

/// search_jobs
///
/// [Public Route] Filtered job search. Empty filter strings count as
/// absent; with no filters at all this is the full catalog, newest first.
#[utoipa::path(
    get,
    path = "/job-listings",
    params(JobFilter),
    responses((status = 200, description = "Matching jobs", body = [JobSummary]))
)]
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> Json<Vec<JobSummary>> {
    let q = non_empty(filter.q);
    let category = non_empty(filter.category);
    let location = non_empty(filter.location);
    let jobs = state
        .repo
        .search_jobs(q.as_deref(), category.as_deref(), location.as_deref())
        .await;
    Json(jobs)
}

/// api_jobs
///
/// [Public Route] The unfiltered catalog as summaries enriched with the
/// employer's company name.
#[utoipa::path(
    get,
    path = "/jobs/api/jobs",
    responses((status = 200, description = "All jobs", body = [JobSummary]))
)]
pub async fn api_jobs(State(state): State<AppState>) -> Json<Vec<JobSummary>> {
    Json(state.repo.search_jobs(None, None, None).await)
}

/// post_job
///
/// [Employer Route] Creates a job posting owned by the requesting
/// employer. Title is mandatory; a non-numeric salary fails validation and
/// writes nothing.
#[utoipa::path(
    post,
    path = "/jobs/employer/post_job",
    responses(
        (status = 200, description = "Posted", body = ApiResponse),
        (status = 400, description = "Validation failure", body = ApiResponse),
        (status = 403, description = "Not an employer", body = ApiResponse)
    )
)]
pub async fn post_job(
    user: AuthUser,
    State(state): State<AppState>,
    Form(form): Form<PostJobRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let employer_id = require_employer(&user)?;

    let title = form.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::Validation("Title is required.".to_string()));
    }
    let salary = parse_salary(form.salary.as_deref())?;

    let job = NewJob {
        title,
        description: non_empty(form.description),
        location: non_empty(form.location),
        salary,
        category: non_empty(form.category),
    };

    state
        .repo
        .create_job(employer_id, job)
        .await
        .ok_or(ApiError::Internal)?;

    Ok(Json(ApiResponse::ok("Job posted successfully!")))
}

/// my_jobs
///
/// [Employer Route] Lists the requesting employer's own postings.
#[utoipa::path(
    get,
    path = "/jobs/employer/my_jobs",
    responses((status = 200, description = "Own jobs", body = [Job]))
)]
pub async fn my_jobs(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Job>>, ApiError> {
    let employer_id = require_employer(&user)?;
    Ok(Json(state.repo.jobs_by_employer(employer_id).await))
}

/// update_job
///
/// [Employer Route] Partial update of an owned posting. The repository
/// statement repeats the ownership guard, so a non-owned id affects zero
/// rows and reads as not found.
#[utoipa::path(
    put,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = UpdateJobRequest,
    responses(
        (status = 200, description = "Updated", body = Job),
        (status = 404, description = "Not found or not owner", body = ApiResponse)
    )
)]
pub async fn update_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<Job>, ApiError> {
    let employer_id = require_employer(&user)?;

    let title = match payload.title {
        Some(t) => {
            let t = t.trim().to_string();
            if t.is_empty() {
                return Err(ApiError::Validation("Title is required.".to_string()));
            }
            Some(t)
        }
        None => None,
    };
    // An explicitly empty salary clears the column; absent leaves it alone.
    let salary = match payload.salary.as_deref().map(str::trim) {
        None => None,
        Some("") => Some(None),
        Some(raw) => Some(Some(raw.parse::<f64>().map_err(|_| {
            ApiError::Validation("Salary must be a number.".to_string())
        })?)),
    };

    let update = JobUpdate {
        title,
        description: non_empty(payload.description),
        location: non_empty(payload.location),
        salary,
        category: non_empty(payload.category),
    };

    state
        .repo
        .update_job(id, employer_id, update)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound("Job"))
}

/// delete_job
///
/// [Employer Route] Deletes an owned posting, cascading removal of every
/// application against it before the job row itself goes.
#[utoipa::path(
    delete,
    path = "/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not owner", body = ApiResponse)
    )
)]
pub async fn delete_job(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let employer_id = require_employer(&user)?;
    if state.repo.delete_job(id, employer_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        // Either the job does not exist or it belongs to someone else.
        Err(ApiError::NotFound("Job"))
    }
}

// --- Application Ledger Handlers ---

/// apply
///
/// [JobSeeker Route] Applies to an existing job. The store's unique
/// constraint on (job, seeker) makes the duplicate check atomic; a repeat
/// attempt is reported as informational, not an error, and leaves exactly
/// one application in place.
#[utoipa::path(
    post,
    path = "/applications/apply/{job_id}",
    params(("job_id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Submitted or already applied", body = ApiResponse),
        (status = 404, description = "Job not found", body = ApiResponse)
    )
)]
pub async fn apply(
    user: AuthUser,
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiResponse>, ApiError> {
    let seeker_id = require_seeker(&user)?;

    state
        .repo
        .get_job(job_id)
        .await
        .ok_or(ApiError::NotFound("Job"))?;

    if state.repo.apply_to_job(job_id, seeker_id).await {
        Ok(Json(ApiResponse::ok("Application submitted successfully!")))
    } else {
        Ok(Json(ApiResponse {
            success: false,
            message: "You have already applied for this job.".to_string(),
            redirect: None,
        }))
    }
}

/// my_applications
///
/// [JobSeeker Route] The requesting seeker's own applications, enriched
/// with job title and company.
#[utoipa::path(
    get,
    path = "/applications/my_applications",
    responses((status = 200, description = "Own applications", body = [ApplicationSummary]))
)]
pub async fn my_applications(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ApplicationSummary>>, ApiError> {
    let seeker_id = require_seeker(&user)?;
    Ok(Json(state.repo.applications_for_seeker(seeker_id).await))
}

/// job_applications
///
/// [Employer Route] Lists the applicants for one of the employer's own
/// jobs. Denied for jobs owned by anyone else, whether or not they exist.
#[utoipa::path(
    get,
    path = "/jobs/{id}/applications",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Applicants", body = [ApplicantSummary]),
        (status = 403, description = "Not the owner", body = ApiResponse)
    )
)]
pub async fn job_applications(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ApplicantSummary>>, ApiError> {
    let employer_id = require_employer(&user)?;
    let job = state
        .repo
        .get_job(id)
        .await
        .ok_or(ApiError::NotFound("Job"))?;
    if job.employer_id != employer_id {
        return Err(ApiError::Forbidden);
    }
    Ok(Json(state.repo.applications_for_job(id).await))
}

/// update_application_status
///
/// [Employer Route] Moves an application through the closed status
/// workflow. The new status must be a member of the set and a legal
/// transition from the current one; the update statement re-checks job
/// ownership.
#[utoipa::path(
    put,
    path = "/applications/{id}/status",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated", body = Application),
        (status = 400, description = "Unknown status or illegal transition", body = ApiResponse),
        (status = 403, description = "Not the owner", body = ApiResponse)
    )
)]
pub async fn update_application_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Application>, ApiError> {
    let employer_id = require_employer(&user)?;

    let next = ApplicationStatus::parse(payload.status.trim()).ok_or_else(|| {
        ApiError::Validation(format!("Unknown application status {:?}.", payload.status))
    })?;

    let application = state
        .repo
        .get_application(id)
        .await
        .ok_or(ApiError::NotFound("Application"))?;
    let job = state
        .repo
        .get_job(application.job_id)
        .await
        .ok_or(ApiError::NotFound("Application"))?;
    if job.employer_id != employer_id {
        return Err(ApiError::Forbidden);
    }

    if !application.status.can_transition_to(next) {
        return Err(ApiError::Validation(format!(
            "Cannot move an application from {} to {}.",
            application.status, next
        )));
    }

    state
        .repo
        .set_application_status(id, employer_id, next)
        .await
        .map(Json)
        .ok_or(ApiError::Internal)
}

// --- Resume Upload ---

/// upload_resume
///
/// [JobSeeker Route] Issues a short-lived presigned PUT URL for a resume,
/// restricted to PDF and Word documents. The client stores the returned
/// key as its resume reference at registration or profile update.
#[utoipa::path(
    post,
    path = "/upload/resume",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Unsupported format", body = ApiResponse)
    )
)]
pub async fn upload_resume(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, ApiError> {
    let seeker_id = require_seeker(&user)?;

    let (extension, content_type) = crate::storage::resume_content_type(&payload.filename)
        .ok_or_else(|| {
            ApiError::Validation("Resume must be a PDF or Word document.".to_string())
        })?;

    let object_key = format!("resumes/{}/{}.{}", seeker_id, Uuid::new_v4(), extension);

    match state
        .storage
        .presign_resume_upload(&object_key, content_type)
        .await
    {
        Ok(url) => Ok(Json(PresignedUrlResponse {
            upload_url: url,
            resource_key: object_key,
        })),
        Err(e) => {
            tracing::error!("resume presign failed: {e}");
            Err(ApiError::Internal)
        }
    }
}

// --- Admin Handlers ---

/// admin_dashboard
///
/// [Admin Route] Aggregate counts of employers, seekers, jobs and
/// applications.
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    responses(
        (status = 200, description = "Stats", body = AdminDashboardStats),
        (status = 403, description = "Not an admin", body = ApiResponse)
    )
)]
pub async fn admin_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, ApiError> {
    require_admin(&user)?;
    Ok(Json(state.repo.get_stats().await))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salary_parses_or_rejects() {
        assert_eq!(parse_salary(None).unwrap(), None);
        assert_eq!(parse_salary(Some("")).unwrap(), None);
        assert_eq!(parse_salary(Some("120000")).unwrap(), Some(120000.0));
        assert_eq!(parse_salary(Some(" 95000.5 ")).unwrap(), Some(95000.5));
        assert!(parse_salary(Some("abc")).is_err());
    }

    #[test]
    fn empty_fields_collapse_to_absent() {
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some(" Dublin ".to_string())), Some("Dublin".to_string()));
    }

    #[test]
    fn role_gates_deny_every_other_kind() {
        let admin = AuthUser { id: Uuid::new_v4(), role: Role::Admin };
        let employer = AuthUser { id: Uuid::new_v4(), role: Role::Employer };
        let seeker = AuthUser { id: Uuid::new_v4(), role: Role::JobSeeker };

        assert!(require_employer(&employer).is_ok());
        assert!(require_employer(&admin).is_err());
        assert!(require_employer(&seeker).is_err());

        assert!(require_seeker(&seeker).is_ok());
        assert!(require_seeker(&employer).is_err());

        assert!(require_admin(&admin).is_ok());
        assert!(require_admin(&seeker).is_err());
    }
}
