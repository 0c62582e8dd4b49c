use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Principal Kinds ---

/// Role
///
/// The closed set of principal kinds. Every authorization point matches on
/// this enum exhaustively; there is no string comparison or runtime type
/// inspection anywhere in the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Employer,
    JobSeeker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employer => "employer",
            Role::JobSeeker => "jobseeker",
        }
    }

    /// Parses the wire/database representation. Unknown strings are `None`,
    /// which callers must treat as a validation failure.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "employer" => Some(Role::Employer),
            "jobseeker" => Some(Role::JobSeeker),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Application Workflow ---

/// ApplicationStatus
///
/// The closed application-state set. The stored/wire form uses the
/// human-facing labels ("Under Review", not "UnderReview"); anything outside
/// this set is rejected before any write happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum ApplicationStatus {
    Applied,
    #[serde(rename = "Under Review")]
    UnderReview,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Hired => "Hired",
        }
    }

    pub fn parse(s: &str) -> Option<ApplicationStatus> {
        match s {
            "Applied" => Some(ApplicationStatus::Applied),
            "Under Review" => Some(ApplicationStatus::UnderReview),
            "Rejected" => Some(ApplicationStatus::Rejected),
            "Hired" => Some(ApplicationStatus::Hired),
            _ => None,
        }
    }

    /// The allowed transition table. Rejected and Hired are terminal;
    /// re-asserting the current status is not a transition.
    pub fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match self {
            Applied => matches!(next, UnderReview | Rejected | Hired),
            UnderReview => matches!(next, Rejected | Hired),
            Rejected | Hired => false,
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Principal Records (Internal, Mapped to Database) ---

/// Admin principal row. Admins are seeded at startup, never registered
/// through the public endpoint, and authenticate by username.
#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

/// Employer principal row from the `employers` table.
#[derive(Debug, Clone, FromRow)]
pub struct Employer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub company: Option<String>,
}

/// JobSeeker principal row from the `job_seekers` table. `resume` holds the
/// object-storage key produced by the presigned upload flow.
#[derive(Debug, Clone, FromRow)]
pub struct JobSeeker {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub resume: Option<String>,
}

// --- Core Application Schemas ---

/// Job
///
/// A posting owned by exactly one employer. Only the title is required;
/// salary, when present, is numeric (validated at the handler boundary).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct Job {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<f64>,
    pub category: Option<String>,
    // FK to employers.id (Owner).
    pub employer_id: Uuid,
    #[ts(type = "string")]
    pub posted_at: DateTime<Utc>,
}

/// Application
///
/// A job seeker's interest in one job. At most one row exists per
/// (job, seeker) pair, enforced by the store's unique constraint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub seeker_id: Uuid,
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
}

/// Session
///
/// A server-side login session bound to (principal id, role). Created on
/// login, deleted on logout, lazily expired on lookup.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub principal_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// Input payload for `POST /auth/register`. The role arrives as a raw string
/// so the handler can reject unknown kinds (and `admin`) as validation
/// errors rather than as deserialization failures.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub role: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub company: Option<String>,
    /// Storage key from the presigned resume upload, job seekers only.
    pub resume: Option<String>,
}

/// Input payload for `POST /auth/login`. Admins supply their username in
/// the `email` field.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Form payload for `POST /jobs/employer/post_job`. Salary arrives as the
/// raw form string and must parse as a number when non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PostJobRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub category: Option<String>,
}

/// Partial update payload for `PUT /jobs/{id}`. Only provided fields are
/// written (COALESCE at the repository layer).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateJobRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Input payload for `PUT /applications/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Input payload for requesting a short-lived resume upload URL
/// (POST /upload/resume). Only the filename is needed; the server derives
/// and constrains the content type from the extension.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    #[schema(example = "cv.pdf")]
    pub filename: String,
}

// --- Validated Repository Payloads ---

/// Job fields that already passed handler validation (salary is numeric).
#[derive(Debug, Clone)]
pub struct NewJob {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<f64>,
    pub category: Option<String>,
}

/// Validated partial job update. `salary: None` leaves the column
/// unchanged; `Some(None)` clears it; `Some(Some(x))` sets it.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<Option<f64>>,
    pub category: Option<String>,
}

// --- Response Schemas (Output) ---

/// The uniform `{success, message}` envelope used by every mutating
/// endpoint, with an optional client-side redirect hint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            redirect: None,
        }
    }

    pub fn ok_redirect(message: impl Into<String>, redirect: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            redirect: Some(redirect.into()),
        }
    }
}

/// Output schema for a successful (or failed) login attempt.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

/// Public job summary enriched with the employer's company name
/// (GET /jobs/api/jobs and GET /job-listings).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow)]
#[ts(export)]
pub struct JobSummary {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub salary: Option<f64>,
    pub category: Option<String>,
    pub company: Option<String>,
    #[ts(type = "string")]
    pub posted_at: DateTime<Utc>,
}

/// A seeker-facing view of one of their applications
/// (GET /applications/my_applications).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApplicationSummary {
    pub id: Uuid,
    pub job_id: Uuid,
    pub title: String,
    pub company: Option<String>,
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
}

/// An employer-facing view of one applicant against one of their jobs
/// (GET /jobs/{id}/applications).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ApplicantSummary {
    pub id: Uuid,
    pub job_id: Uuid,
    pub seeker_id: Uuid,
    pub seeker_name: String,
    pub seeker_email: String,
    pub resume: Option<String>,
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub applied_at: DateTime<Utc>,
}

/// Output schema for the administrative statistics dashboard
/// (GET /admin/dashboard).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub employer_count: i64,
    pub seeker_count: i64,
    pub job_count: i64,
    pub application_count: i64,
}

/// Output schema for the authenticated principal's profile (GET /me).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
    pub email: Option<String>,
}

/// Output schema containing the secure, temporary URL for the
/// client-to-cloud resume transfer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to store as the seeker's resume reference.
    pub resource_key: String,
}
