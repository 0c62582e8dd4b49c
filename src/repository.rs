use crate::models::{
    Admin, AdminDashboardStats, ApplicantSummary, Application, ApplicationStatus,
    ApplicationSummary, Employer, Job, JobSeeker, JobUpdate, JobSummary, NewJob, Role, Session,
    UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// The abstract contract for all persistence operations. Handlers only ever
/// see this trait, so the Postgres implementation and the in-memory test
/// implementation are interchangeable behind `Arc<dyn Repository>`.
///
/// Ownership-scoped mutations take the acting employer's id and affect zero
/// rows on a mismatch; uniqueness invariants are enforced by the store's
/// constraints at write time, never by a prior read.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---
    // Creation returns None when the unique email/username already exists
    // for that principal kind.
    async fn create_admin(&self, username: &str, password_hash: &str) -> Option<Admin>;
    async fn create_employer(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        company: Option<&str>,
    ) -> Option<Employer>;
    async fn create_job_seeker(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        resume: Option<&str>,
    ) -> Option<JobSeeker>;

    async fn find_admin_by_username(&self, username: &str) -> Option<Admin>;
    async fn find_employer_by_email(&self, email: &str) -> Option<Employer>;
    async fn find_seeker_by_email(&self, email: &str) -> Option<JobSeeker>;
    // Resolves any principal kind to its public profile.
    async fn find_profile(&self, id: Uuid, role: Role) -> Option<UserProfile>;

    // --- Sessions ---
    async fn create_session(&self, session: Session) -> bool;
    async fn get_session(&self, token: &str) -> Option<Session>;
    async fn delete_session(&self, token: &str) -> bool;

    // --- Job Catalog ---
    // Search with optional free-text/category/location filters, newest first.
    // All filters None returns the full catalog.
    async fn search_jobs(
        &self,
        q: Option<&str>,
        category: Option<&str>,
        location: Option<&str>,
    ) -> Vec<JobSummary>;
    async fn get_job(&self, id: Uuid) -> Option<Job>;
    async fn create_job(&self, employer_id: Uuid, job: NewJob) -> Option<Job>;
    // Owner-Only: updates only if employer_id matches. COALESCE partial update.
    async fn update_job(&self, id: Uuid, employer_id: Uuid, update: JobUpdate) -> Option<Job>;
    // Owner-Only: removes dependent applications then the job, atomically.
    async fn delete_job(&self, id: Uuid, employer_id: Uuid) -> bool;
    async fn jobs_by_employer(&self, employer_id: Uuid) -> Vec<Job>;

    // --- Application Ledger ---
    // Returns false when an application for this (job, seeker) pair already
    // exists; the unique constraint is the enforcement point.
    async fn apply_to_job(&self, job_id: Uuid, seeker_id: Uuid) -> bool;
    async fn get_application(&self, id: Uuid) -> Option<Application>;
    async fn applications_for_seeker(&self, seeker_id: Uuid) -> Vec<ApplicationSummary>;
    async fn applications_for_job(&self, job_id: Uuid) -> Vec<ApplicantSummary>;
    // Owner-Only: the employer guard is repeated in the statement itself.
    async fn set_application_status(
        &self,
        id: Uuid,
        employer_id: Uuid,
        status: ApplicationStatus,
    ) -> Option<Application>;

    // --- Admin ---
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

// --- Postgres Implementation ---

/// Raw row for the `applications` table; status is stored as text and
/// parsed into the closed enum on the way out.
#[derive(FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    seeker_id: Uuid,
    status: String,
    applied_at: DateTime<Utc>,
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Application {
            id: row.id,
            job_id: row.job_id,
            seeker_id: row.seeker_id,
            status: parse_status_or_applied(row.id, &row.status),
            applied_at: row.applied_at,
        }
    }
}

#[derive(FromRow)]
struct ApplicationSummaryRow {
    id: Uuid,
    job_id: Uuid,
    title: String,
    company: Option<String>,
    status: String,
    applied_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct ApplicantSummaryRow {
    id: Uuid,
    job_id: Uuid,
    seeker_id: Uuid,
    seeker_name: String,
    seeker_email: String,
    resume: Option<String>,
    status: String,
    applied_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct SessionRow {
    token: String,
    principal_id: Uuid,
    role: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

fn parse_status_or_applied(id: Uuid, status: &str) -> ApplicationStatus {
    ApplicationStatus::parse(status).unwrap_or_else(|| {
        tracing::warn!("application {} has unknown status {:?}", id, status);
        ApplicationStatus::Applied
    })
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by
/// PostgreSQL. Unexpected storage errors are logged here and surface to the
/// caller only as empty/absent results.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const JOB_COLUMNS: &str = "id, title, description, location, salary, category, employer_id, posted_at";

#[async_trait]
impl Repository for PostgresRepository {
    async fn create_admin(&self, username: &str, password_hash: &str) -> Option<Admin> {
        sqlx::query_as::<_, Admin>(
            r#"INSERT INTO admins (id, username, password_hash) VALUES ($1, $2, $3)
               ON CONFLICT (username) DO NOTHING
               RETURNING id, username, password_hash"#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_admin error: {:?}", e);
            None
        })
    }

    async fn create_employer(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        company: Option<&str>,
    ) -> Option<Employer> {
        sqlx::query_as::<_, Employer>(
            r#"INSERT INTO employers (id, name, email, password_hash, company)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (email) DO NOTHING
               RETURNING id, name, email, password_hash, company"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(company)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_employer error: {:?}", e);
            None
        })
    }

    async fn create_job_seeker(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        resume: Option<&str>,
    ) -> Option<JobSeeker> {
        sqlx::query_as::<_, JobSeeker>(
            r#"INSERT INTO job_seekers (id, name, email, password_hash, resume)
               VALUES ($1, $2, $3, $4, $5)
               ON CONFLICT (email) DO NOTHING
               RETURNING id, name, email, password_hash, resume"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(resume)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_job_seeker error: {:?}", e);
            None
        })
    }

    async fn find_admin_by_username(&self, username: &str) -> Option<Admin> {
        sqlx::query_as::<_, Admin>(
            "SELECT id, username, password_hash FROM admins WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_admin_by_username error: {:?}", e);
            None
        })
    }

    async fn find_employer_by_email(&self, email: &str) -> Option<Employer> {
        sqlx::query_as::<_, Employer>(
            "SELECT id, name, email, password_hash, company FROM employers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_employer_by_email error: {:?}", e);
            None
        })
    }

    async fn find_seeker_by_email(&self, email: &str) -> Option<JobSeeker> {
        sqlx::query_as::<_, JobSeeker>(
            "SELECT id, name, email, password_hash, resume FROM job_seekers WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_seeker_by_email error: {:?}", e);
            None
        })
    }

    async fn find_profile(&self, id: Uuid, role: Role) -> Option<UserProfile> {
        match role {
            Role::Admin => sqlx::query_as::<_, Admin>(
                "SELECT id, username, password_hash FROM admins WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_profile error: {:?}", e);
                None
            })
            .map(|admin| UserProfile {
                id: admin.id,
                role: Role::Admin,
                name: admin.username,
                email: None,
            }),
            Role::Employer => sqlx::query_as::<_, Employer>(
                "SELECT id, name, email, password_hash, company FROM employers WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_profile error: {:?}", e);
                None
            })
            .map(|employer| UserProfile {
                id: employer.id,
                role: Role::Employer,
                name: employer.name,
                email: Some(employer.email),
            }),
            Role::JobSeeker => sqlx::query_as::<_, JobSeeker>(
                "SELECT id, name, email, password_hash, resume FROM job_seekers WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("find_profile error: {:?}", e);
                None
            })
            .map(|seeker| UserProfile {
                id: seeker.id,
                role: Role::JobSeeker,
                name: seeker.name,
                email: Some(seeker.email),
            }),
        }
    }

    async fn create_session(&self, session: Session) -> bool {
        let result = sqlx::query(
            r#"INSERT INTO sessions (token, principal_id, role, created_at, expires_at)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(&session.token)
        .bind(session.principal_id)
        .bind(session.role.as_str())
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await;
        match result {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("create_session error: {:?}", e);
                false
            }
        }
    }

    async fn get_session(&self, token: &str) -> Option<Session> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"SELECT token, principal_id, role, created_at, expires_at
               FROM sessions WHERE token = $1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_session error: {:?}", e);
            None
        })?;

        // A session row with an unparseable role is unusable.
        let role = Role::parse(&row.role)?;
        Some(Session {
            token: row.token,
            principal_id: row.principal_id,
            role,
            created_at: row.created_at,
            expires_at: row.expires_at,
        })
    }

    async fn delete_session(&self, token: &str) -> bool {
        match sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_session error: {:?}", e);
                false
            }
        }
    }

    /// Flexible search via QueryBuilder with bound parameters. Free text
    /// matches title or description case-insensitively; category and
    /// location are substring matches. Newest postings first.
    async fn search_jobs(
        &self,
        q: Option<&str>,
        category: Option<&str>,
        location: Option<&str>,
    ) -> Vec<JobSummary> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(
            r#"
            SELECT
                j.id, j.title, j.description, j.location, j.salary, j.category,
                e.company, j.posted_at
            FROM jobs j
            JOIN employers e ON j.employer_id = e.id
            WHERE TRUE
            "#,
        );

        if let Some(q) = q {
            let pattern = format!("%{}%", q);
            builder.push(" AND (j.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR j.description ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        if let Some(category) = category {
            builder.push(" AND j.category ILIKE ");
            builder.push_bind(format!("%{}%", category));
        }

        if let Some(location) = location {
            builder.push(" AND j.location ILIKE ");
            builder.push_bind(format!("%{}%", location));
        }

        builder.push(" ORDER BY j.posted_at DESC");

        match builder.build_query_as::<JobSummary>().fetch_all(&self.pool).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("search_jobs error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_job(&self, id: Uuid) -> Option<Job> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_job error: {:?}", e);
                None
            })
    }

    async fn create_job(&self, employer_id: Uuid, job: NewJob) -> Option<Job> {
        let sql = format!(
            r#"INSERT INTO jobs (id, title, description, location, salary, category, employer_id, posted_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
               RETURNING {JOB_COLUMNS}"#
        );
        sqlx::query_as::<_, Job>(&sql)
        .bind(Uuid::new_v4())
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(job.salary)
        .bind(&job.category)
        .bind(employer_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("create_job error: {:?}", e);
            None
        })
    }

    async fn update_job(&self, id: Uuid, employer_id: Uuid, update: JobUpdate) -> Option<Job> {
        let sql = format!(
            r#"
            UPDATE jobs
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                location = COALESCE($5, location),
                category = COALESCE($6, category),
                salary = CASE WHEN $7 THEN $8 ELSE salary END
            WHERE id = $1 AND employer_id = $2
            RETURNING {JOB_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Job>(&sql)
        .bind(id)
        .bind(employer_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.location)
        .bind(&update.category)
        .bind(update.salary.is_some())
        .bind(update.salary.flatten())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_job error: {:?}", e);
            None
        })
    }

    /// Removes the job's applications and then the job itself in one
    /// transaction. Affecting zero job rows (absent or not owned) rolls the
    /// whole thing back.
    async fn delete_job(&self, id: Uuid, employer_id: Uuid) -> bool {
        let mut tx = match self.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                tracing::error!("delete_job begin error: {:?}", e);
                return false;
            }
        };

        if let Err(e) = sqlx::query("DELETE FROM applications WHERE job_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
        {
            tracing::error!("delete_job applications error: {:?}", e);
            return false;
        }

        let deleted = match sqlx::query("DELETE FROM jobs WHERE id = $1 AND employer_id = $2")
            .bind(id)
            .bind(employer_id)
            .execute(&mut *tx)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_job error: {:?}", e);
                false
            }
        };

        if deleted {
            if let Err(e) = tx.commit().await {
                tracing::error!("delete_job commit error: {:?}", e);
                return false;
            }
            true
        } else {
            // Dropping the transaction rolls back the application deletes.
            false
        }
    }

    async fn jobs_by_employer(&self, employer_id: Uuid) -> Vec<Job> {
        let sql =
            format!("SELECT {JOB_COLUMNS} FROM jobs WHERE employer_id = $1 ORDER BY posted_at DESC");
        match sqlx::query_as::<_, Job>(&sql)
        .bind(employer_id)
        .fetch_all(&self.pool)
        .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!("jobs_by_employer error: {:?}", e);
                vec![]
            }
        }
    }

    /// Inserts an application. `ON CONFLICT DO NOTHING` on the
    /// (job_id, seeker_id) unique constraint makes the duplicate check
    /// atomic; true only when a new row was written.
    async fn apply_to_job(&self, job_id: Uuid, seeker_id: Uuid) -> bool {
        let result = sqlx::query(
            r#"INSERT INTO applications (id, job_id, seeker_id, status, applied_at)
               VALUES ($1, $2, $3, $4, NOW())
               ON CONFLICT (job_id, seeker_id) DO NOTHING"#,
        )
        .bind(Uuid::new_v4())
        .bind(job_id)
        .bind(seeker_id)
        .bind(ApplicationStatus::Applied.as_str())
        .execute(&self.pool)
        .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("apply_to_job error: {:?}", e);
                false
            }
        }
    }

    async fn get_application(&self, id: Uuid) -> Option<Application> {
        sqlx::query_as::<_, ApplicationRow>(
            "SELECT id, job_id, seeker_id, status, applied_at FROM applications WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_application error: {:?}", e);
            None
        })
        .map(Application::from)
    }

    async fn applications_for_seeker(&self, seeker_id: Uuid) -> Vec<ApplicationSummary> {
        let rows = sqlx::query_as::<_, ApplicationSummaryRow>(
            r#"
            SELECT a.id, a.job_id, j.title, e.company, a.status, a.applied_at
            FROM applications a
            JOIN jobs j ON a.job_id = j.id
            JOIN employers e ON j.employer_id = e.id
            WHERE a.seeker_id = $1
            ORDER BY a.applied_at DESC
            "#,
        )
        .bind(seeker_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("applications_for_seeker error: {:?}", e);
            vec![]
        });

        rows.into_iter()
            .map(|row| ApplicationSummary {
                id: row.id,
                job_id: row.job_id,
                title: row.title,
                company: row.company,
                status: parse_status_or_applied(row.id, &row.status),
                applied_at: row.applied_at,
            })
            .collect()
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Vec<ApplicantSummary> {
        let rows = sqlx::query_as::<_, ApplicantSummaryRow>(
            r#"
            SELECT a.id, a.job_id, a.seeker_id, s.name AS seeker_name,
                   s.email AS seeker_email, s.resume, a.status, a.applied_at
            FROM applications a
            JOIN job_seekers s ON a.seeker_id = s.id
            WHERE a.job_id = $1
            ORDER BY a.applied_at ASC
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("applications_for_job error: {:?}", e);
            vec![]
        });

        rows.into_iter()
            .map(|row| ApplicantSummary {
                id: row.id,
                job_id: row.job_id,
                seeker_id: row.seeker_id,
                seeker_name: row.seeker_name,
                seeker_email: row.seeker_email,
                resume: row.resume,
                status: parse_status_or_applied(row.id, &row.status),
                applied_at: row.applied_at,
            })
            .collect()
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        employer_id: Uuid,
        status: ApplicationStatus,
    ) -> Option<Application> {
        sqlx::query_as::<_, ApplicationRow>(
            r#"
            UPDATE applications a
            SET status = $3
            FROM jobs j
            WHERE a.id = $1 AND a.job_id = j.id AND j.employer_id = $2
            RETURNING a.id, a.job_id, a.seeker_id, a.status, a.applied_at
            "#,
        )
        .bind(id)
        .bind(employer_id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("set_application_status error: {:?}", e);
            None
        })
        .map(Application::from)
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        let employer_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employers")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let seeker_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM job_seekers")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let job_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        let application_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM applications")
            .fetch_one(&self.pool)
            .await
            .unwrap_or(0);
        AdminDashboardStats {
            employer_count,
            seeker_count,
            job_count,
            application_count,
        }
    }
}

// --- In-Memory Implementation (Test Double) ---

#[derive(Default)]
struct MemoryState {
    admins: Vec<Admin>,
    employers: Vec<Employer>,
    seekers: Vec<JobSeeker>,
    // Jobs are kept in insertion order, which is also chronological order.
    jobs: Vec<Job>,
    applications: Vec<Application>,
    sessions: HashMap<String, Session>,
}

/// MemoryRepository
///
/// In-memory implementation of the `Repository` trait used by the test
/// suite, mirroring the store's uniqueness and ownership semantics so the
/// full HTTP surface can be exercised without a database.
#[derive(Default)]
pub struct MemoryRepository {
    state: Mutex<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn create_admin(&self, username: &str, password_hash: &str) -> Option<Admin> {
        let mut state = self.state.lock().ok()?;
        if state.admins.iter().any(|a| a.username == username) {
            return None;
        }
        let admin = Admin {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        state.admins.push(admin.clone());
        Some(admin)
    }

    async fn create_employer(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        company: Option<&str>,
    ) -> Option<Employer> {
        let mut state = self.state.lock().ok()?;
        if state.employers.iter().any(|e| e.email == email) {
            return None;
        }
        let employer = Employer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            company: company.map(str::to_string),
        };
        state.employers.push(employer.clone());
        Some(employer)
    }

    async fn create_job_seeker(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        resume: Option<&str>,
    ) -> Option<JobSeeker> {
        let mut state = self.state.lock().ok()?;
        if state.seekers.iter().any(|s| s.email == email) {
            return None;
        }
        let seeker = JobSeeker {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            resume: resume.map(str::to_string),
        };
        state.seekers.push(seeker.clone());
        Some(seeker)
    }

    async fn find_admin_by_username(&self, username: &str) -> Option<Admin> {
        let state = self.state.lock().ok()?;
        state.admins.iter().find(|a| a.username == username).cloned()
    }

    async fn find_employer_by_email(&self, email: &str) -> Option<Employer> {
        let state = self.state.lock().ok()?;
        state.employers.iter().find(|e| e.email == email).cloned()
    }

    async fn find_seeker_by_email(&self, email: &str) -> Option<JobSeeker> {
        let state = self.state.lock().ok()?;
        state.seekers.iter().find(|s| s.email == email).cloned()
    }

    async fn find_profile(&self, id: Uuid, role: Role) -> Option<UserProfile> {
        let state = self.state.lock().ok()?;
        match role {
            Role::Admin => state.admins.iter().find(|a| a.id == id).map(|a| UserProfile {
                id: a.id,
                role: Role::Admin,
                name: a.username.clone(),
                email: None,
            }),
            Role::Employer => state
                .employers
                .iter()
                .find(|e| e.id == id)
                .map(|e| UserProfile {
                    id: e.id,
                    role: Role::Employer,
                    name: e.name.clone(),
                    email: Some(e.email.clone()),
                }),
            Role::JobSeeker => state
                .seekers
                .iter()
                .find(|s| s.id == id)
                .map(|s| UserProfile {
                    id: s.id,
                    role: Role::JobSeeker,
                    name: s.name.clone(),
                    email: Some(s.email.clone()),
                }),
        }
    }

    async fn create_session(&self, session: Session) -> bool {
        match self.state.lock() {
            Ok(mut state) => {
                state.sessions.insert(session.token.clone(), session);
                true
            }
            Err(_) => false,
        }
    }

    async fn get_session(&self, token: &str) -> Option<Session> {
        let state = self.state.lock().ok()?;
        state.sessions.get(token).cloned()
    }

    async fn delete_session(&self, token: &str) -> bool {
        match self.state.lock() {
            Ok(mut state) => state.sessions.remove(token).is_some(),
            Err(_) => false,
        }
    }

    async fn search_jobs(
        &self,
        q: Option<&str>,
        category: Option<&str>,
        location: Option<&str>,
    ) -> Vec<JobSummary> {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return vec![],
        };
        state
            .jobs
            .iter()
            .rev()
            .filter(|job| {
                let text_match = q.is_none_or(|q| {
                    contains_ci(&job.title, q)
                        || job.description.as_deref().is_some_and(|d| contains_ci(d, q))
                });
                let category_match = category.is_none_or(|c| {
                    job.category.as_deref().is_some_and(|jc| contains_ci(jc, c))
                });
                let location_match = location.is_none_or(|l| {
                    job.location.as_deref().is_some_and(|jl| contains_ci(jl, l))
                });
                text_match && category_match && location_match
            })
            .map(|job| {
                let company = state
                    .employers
                    .iter()
                    .find(|e| e.id == job.employer_id)
                    .and_then(|e| e.company.clone());
                JobSummary {
                    id: job.id,
                    title: job.title.clone(),
                    description: job.description.clone(),
                    location: job.location.clone(),
                    salary: job.salary,
                    category: job.category.clone(),
                    company,
                    posted_at: job.posted_at,
                }
            })
            .collect()
    }

    async fn get_job(&self, id: Uuid) -> Option<Job> {
        let state = self.state.lock().ok()?;
        state.jobs.iter().find(|j| j.id == id).cloned()
    }

    async fn create_job(&self, employer_id: Uuid, job: NewJob) -> Option<Job> {
        let mut state = self.state.lock().ok()?;
        let job = Job {
            id: Uuid::new_v4(),
            title: job.title,
            description: job.description,
            location: job.location,
            salary: job.salary,
            category: job.category,
            employer_id,
            posted_at: Utc::now(),
        };
        state.jobs.push(job.clone());
        Some(job)
    }

    async fn update_job(&self, id: Uuid, employer_id: Uuid, update: JobUpdate) -> Option<Job> {
        let mut state = self.state.lock().ok()?;
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == id && j.employer_id == employer_id)?;
        if let Some(title) = update.title {
            job.title = title;
        }
        if let Some(description) = update.description {
            job.description = Some(description);
        }
        if let Some(location) = update.location {
            job.location = Some(location);
        }
        if let Some(category) = update.category {
            job.category = Some(category);
        }
        if let Some(salary) = update.salary {
            job.salary = salary;
        }
        Some(job.clone())
    }

    async fn delete_job(&self, id: Uuid, employer_id: Uuid) -> bool {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return false,
        };
        let owned = state
            .jobs
            .iter()
            .any(|j| j.id == id && j.employer_id == employer_id);
        if !owned {
            return false;
        }
        state.applications.retain(|a| a.job_id != id);
        state.jobs.retain(|j| j.id != id);
        true
    }

    async fn jobs_by_employer(&self, employer_id: Uuid) -> Vec<Job> {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return vec![],
        };
        state
            .jobs
            .iter()
            .rev()
            .filter(|j| j.employer_id == employer_id)
            .cloned()
            .collect()
    }

    async fn apply_to_job(&self, job_id: Uuid, seeker_id: Uuid) -> bool {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return false,
        };
        let duplicate = state
            .applications
            .iter()
            .any(|a| a.job_id == job_id && a.seeker_id == seeker_id);
        if duplicate {
            return false;
        }
        state.applications.push(Application {
            id: Uuid::new_v4(),
            job_id,
            seeker_id,
            status: ApplicationStatus::Applied,
            applied_at: Utc::now(),
        });
        true
    }

    async fn get_application(&self, id: Uuid) -> Option<Application> {
        let state = self.state.lock().ok()?;
        state.applications.iter().find(|a| a.id == id).cloned()
    }

    async fn applications_for_seeker(&self, seeker_id: Uuid) -> Vec<ApplicationSummary> {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return vec![],
        };
        state
            .applications
            .iter()
            .rev()
            .filter(|a| a.seeker_id == seeker_id)
            .filter_map(|a| {
                let job = state.jobs.iter().find(|j| j.id == a.job_id)?;
                let company = state
                    .employers
                    .iter()
                    .find(|e| e.id == job.employer_id)
                    .and_then(|e| e.company.clone());
                Some(ApplicationSummary {
                    id: a.id,
                    job_id: a.job_id,
                    title: job.title.clone(),
                    company,
                    status: a.status,
                    applied_at: a.applied_at,
                })
            })
            .collect()
    }

    async fn applications_for_job(&self, job_id: Uuid) -> Vec<ApplicantSummary> {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return vec![],
        };
        state
            .applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .filter_map(|a| {
                let seeker = state.seekers.iter().find(|s| s.id == a.seeker_id)?;
                Some(ApplicantSummary {
                    id: a.id,
                    job_id: a.job_id,
                    seeker_id: a.seeker_id,
                    seeker_name: seeker.name.clone(),
                    seeker_email: seeker.email.clone(),
                    resume: seeker.resume.clone(),
                    status: a.status,
                    applied_at: a.applied_at,
                })
            })
            .collect()
    }

    async fn set_application_status(
        &self,
        id: Uuid,
        employer_id: Uuid,
        status: ApplicationStatus,
    ) -> Option<Application> {
        let mut state = self.state.lock().ok()?;
        let job_ids: Vec<Uuid> = state
            .jobs
            .iter()
            .filter(|j| j.employer_id == employer_id)
            .map(|j| j.id)
            .collect();
        let application = state
            .applications
            .iter_mut()
            .find(|a| a.id == id && job_ids.contains(&a.job_id))?;
        application.status = status;
        Some(application.clone())
    }

    async fn get_stats(&self) -> AdminDashboardStats {
        let state = match self.state.lock() {
            Ok(state) => state,
            Err(_) => return AdminDashboardStats::default(),
        };
        AdminDashboardStats {
            employer_count: state.employers.len() as i64,
            seeker_count: state.seekers.len() as i64,
            job_count: state.jobs.len() as i64,
            application_count: state.applications.len() as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryRepository, Uuid, Uuid) {
        let repo = MemoryRepository::new();
        let employer = repo
            .create_employer("Ada", "ada@corp.com", "hash", Some("Corp"))
            .await
            .unwrap();
        let seeker = repo
            .create_job_seeker("Bob", "bob@mail.com", "hash", None)
            .await
            .unwrap();
        (repo, employer.id, seeker.id)
    }

    fn job(title: &str, category: Option<&str>, location: Option<&str>) -> NewJob {
        NewJob {
            title: title.to_string(),
            description: None,
            location: location.map(str::to_string),
            salary: None,
            category: category.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_per_role() {
        let (repo, _, _) = seeded().await;
        assert!(
            repo.create_employer("Eve", "ada@corp.com", "hash", None)
                .await
                .is_none()
        );
        // The same email is free under the other principal kind.
        assert!(
            repo.create_job_seeker("Eve", "ada@corp.com", "hash", None)
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn search_applies_all_provided_filters() {
        let (repo, employer_id, _) = seeded().await;
        repo.create_job(employer_id, job("Rust Engineer", Some("Engineering"), Some("Dublin")))
            .await
            .unwrap();
        repo.create_job(employer_id, job("Sales Lead", Some("Sales"), Some("Dublin")))
            .await
            .unwrap();
        repo.create_job(employer_id, job("Rust Intern", Some("Engineering"), Some("Remote")))
            .await
            .unwrap();

        let all = repo.search_jobs(None, None, None).await;
        assert_eq!(all.len(), 3);
        // Newest first.
        assert_eq!(all[0].title, "Rust Intern");

        let hits = repo
            .search_jobs(Some("rust"), Some("engineer"), Some("dub"))
            .await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Rust Engineer");
    }

    #[tokio::test]
    async fn second_application_for_same_pair_is_refused() {
        let (repo, employer_id, seeker_id) = seeded().await;
        let posted = repo
            .create_job(employer_id, job("Engineer", None, None))
            .await
            .unwrap();
        assert!(repo.apply_to_job(posted.id, seeker_id).await);
        assert!(!repo.apply_to_job(posted.id, seeker_id).await);
        assert_eq!(repo.applications_for_seeker(seeker_id).await.len(), 1);
    }

    #[tokio::test]
    async fn deleting_a_job_cascades_its_applications() {
        let (repo, employer_id, seeker_id) = seeded().await;
        let posted = repo
            .create_job(employer_id, job("Engineer", None, None))
            .await
            .unwrap();
        assert!(repo.apply_to_job(posted.id, seeker_id).await);

        // A stranger cannot delete it.
        assert!(!repo.delete_job(posted.id, Uuid::new_v4()).await);
        assert!(repo.delete_job(posted.id, employer_id).await);
        assert!(repo.applications_for_seeker(seeker_id).await.is_empty());
        assert_eq!(repo.get_stats().await.application_count, 0);
    }

    #[tokio::test]
    async fn status_update_requires_owning_employer() {
        let (repo, employer_id, seeker_id) = seeded().await;
        let posted = repo
            .create_job(employer_id, job("Engineer", None, None))
            .await
            .unwrap();
        repo.apply_to_job(posted.id, seeker_id).await;
        let application = repo.applications_for_job(posted.id).await[0].clone();

        assert!(
            repo.set_application_status(
                application.id,
                Uuid::new_v4(),
                ApplicationStatus::UnderReview
            )
            .await
            .is_none()
        );

        let updated = repo
            .set_application_status(application.id, employer_id, ApplicationStatus::UnderReview)
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::UnderReview);
    }

    #[tokio::test]
    async fn sessions_store_and_delete() {
        let (repo, employer_id, _) = seeded().await;
        let session = crate::auth::new_session(employer_id, Role::Employer);
        let token = session.token.clone();
        assert!(repo.create_session(session).await);
        assert_eq!(
            repo.get_session(&token).await.unwrap().principal_id,
            employer_id
        );
        assert!(repo.delete_session(&token).await);
        assert!(repo.get_session(&token).await.is_none());
    }
}
