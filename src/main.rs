use job_board::{
    AppState,
    auth::hash_password,
    config::{AppConfig, Env},
    create_router,
    repository::{PostgresRepository, Repository, RepositoryState},
    storage::{S3ResumeStore, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Asynchronous entry point: configuration, logging, database (with
/// startup migrations and admin seeding), storage, and the HTTP server.
#[tokio::main]
async fn main() {
    // Configuration & environment loading (fail-fast on missing secrets).
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // Log filter: RUST_LOG wins, with sensible local defaults otherwise.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "job_board=debug,tower_http=info,axum=trace".into());

    // Structured logging format selected by environment: pretty output for
    // humans locally, JSON for log aggregators in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // Database initialization (Postgres) and schema migrations.
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await
        .expect("FATAL: Failed to connect to Postgres. Check DATABASE_URL.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // Seed the bootstrap admin account. The insert is a no-op when the
    // username is already taken, so this is safe on every startup.
    let admin_hash =
        hash_password(&config.admin_password).expect("FATAL: Failed to hash admin password.");
    if repo
        .create_admin(&config.admin_username, &admin_hash)
        .await
        .is_some()
    {
        tracing::info!("Seeded bootstrap admin '{}'", config.admin_username);
    }

    // Storage initialization (S3/MinIO) for resume uploads.
    let resume_store = S3ResumeStore::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // LOCAL-ONLY: provision the MinIO bucket for the Dockerized setup.
    if config.env == Env::Local {
        use job_board::storage::StorageService;
        resume_store.ensure_bucket_exists().await;
    }

    let storage = Arc::new(resume_store) as StorageState;

    let app_state = AppState {
        repo,
        storage,
        config,
    };

    let app = create_router(app_state);

    let listener = TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("FATAL: Failed to bind 0.0.0.0:3000.");

    tracing::info!("HTTP server bound successfully.");
    tracing::info!("Listening on 0.0.0.0:3000");
    tracing::info!("API Documentation (Swagger UI) available at: http://localhost:3000/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: Server error.");
}
