mod common;

use common::{signed_in_client, spawn_app, spawn_app_with_storage};
use job_board::MockStorageService;
use job_board::models::PresignedUrlResponse;
use std::sync::Arc;

#[tokio::test]
async fn test_resume_upload_issues_a_presigned_url() {
    let app = spawn_app().await;
    let seeker = signed_in_client(&app.address, "jobseeker", "Bob", "bob@mail.com", "pw").await;

    let body: PresignedUrlResponse = seeker
        .post(format!("{}/upload/resume", app.address))
        .json(&serde_json::json!({ "filename": "cv.pdf" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(body.upload_url.contains(&body.resource_key));
    assert!(body.resource_key.starts_with("resumes/"));
    assert!(body.resource_key.ends_with(".pdf"));
}

#[tokio::test]
async fn test_resume_upload_rejects_other_formats() {
    let app = spawn_app().await;
    let seeker = signed_in_client(&app.address, "jobseeker", "Bob", "bob@mail.com", "pw").await;

    let response = seeker
        .post(format!("{}/upload/resume", app.address))
        .json(&serde_json::json!({ "filename": "malware.exe" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_resume_upload_is_seeker_only() {
    let app = spawn_app().await;
    let employer = signed_in_client(&app.address, "employer", "Ada", "ada@corp.com", "pw").await;

    let response = employer
        .post(format!("{}/upload/resume", app.address))
        .json(&serde_json::json!({ "filename": "cv.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_storage_failure_reads_as_generic_internal_error() {
    let app = spawn_app_with_storage(Arc::new(MockStorageService::new_failing())).await;
    let seeker = signed_in_client(&app.address, "jobseeker", "Bob", "bob@mail.com", "pw").await;

    let response = seeker
        .post(format!("{}/upload/resume", app.address))
        .json(&serde_json::json!({ "filename": "cv.pdf" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    // The mock's error detail must not leak to the caller.
    assert_eq!(body["message"], "Something went wrong.");
}
