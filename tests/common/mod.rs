#![allow(dead_code)]

use job_board::{
    AppConfig, AppState, MemoryRepository, MockStorageService, create_router,
    repository::RepositoryState, storage::StorageState,
};
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct TestApp {
    pub address: String,
    /// The same repository handle the server uses, for direct seeding and
    /// assertions.
    pub repo: RepositoryState,
}

/// Spawns the full router on an ephemeral port, backed by the in-memory
/// repository and the mock resume store so no external services are needed.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_storage(Arc::new(MockStorageService::new())).await
}

pub async fn spawn_app_with_storage(storage: StorageState) -> TestApp {
    let repo: RepositoryState = Arc::new(MemoryRepository::new());
    let state = AppState {
        repo: repo.clone(),
        storage,
        config: AppConfig::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().expect("no local addr").port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server error");
    });

    TestApp { address, repo }
}

/// A client with a cookie store, so the session cookie set at login flows
/// into subsequent requests like a browser.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .expect("client build failed")
}

pub async fn register(
    client: &reqwest::Client,
    address: &str,
    role: &str,
    name: &str,
    email: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/auth/register", address))
        .json(&serde_json::json!({
            "role": role, "name": name, "email": email, "password": password
        }))
        .send()
        .await
        .expect("register request failed")
}

pub async fn login(
    client: &reqwest::Client,
    address: &str,
    role: &str,
    email: &str,
    password: &str,
) -> reqwest::Response {
    client
        .post(format!("{}/auth/login", address))
        .json(&serde_json::json!({
            "role": role, "email": email, "password": password
        }))
        .send()
        .await
        .expect("login request failed")
}

/// Registers and logs in, asserting both succeed. The returned client
/// carries the session cookie.
pub async fn signed_in_client(
    address: &str,
    role: &str,
    name: &str,
    email: &str,
    password: &str,
) -> reqwest::Client {
    let client = client();
    let response = register(&client, address, role, name, email, password).await;
    assert!(
        response.status().is_success(),
        "registration failed: {}",
        response.status()
    );
    let response = login(&client, address, role, email, password).await;
    assert!(
        response.status().is_success(),
        "login failed: {}",
        response.status()
    );
    client
}

/// Posts a job as the given (already signed-in) employer client.
pub async fn post_job(
    client: &reqwest::Client,
    address: &str,
    fields: &[(&str, &str)],
) -> reqwest::Response {
    client
        .post(format!("{}/jobs/employer/post_job", address))
        .form(fields)
        .send()
        .await
        .expect("post_job request failed")
}
