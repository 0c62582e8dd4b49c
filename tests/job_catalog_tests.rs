mod common;

use common::{client, post_job, signed_in_client, spawn_app};
use job_board::models::{ApiResponse, Job, JobSummary};

async fn fetch_listings(address: &str, query: &str) -> Vec<JobSummary> {
    client()
        .get(format!("{}/job-listings{}", address, query))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_search_with_no_filters_returns_everything_newest_first() {
    let app = spawn_app().await;
    let employer = signed_in_client(&app.address, "employer", "Ada", "ada@corp.com", "pw").await;

    for title in ["First", "Second", "Third"] {
        let response = post_job(&employer, &app.address, &[("title", title)]).await;
        assert!(response.status().is_success());
    }

    let listings = fetch_listings(&app.address, "").await;
    assert_eq!(
        listings.iter().map(|j| j.title.as_str()).collect::<Vec<_>>(),
        vec!["Third", "Second", "First"]
    );
}

#[tokio::test]
async fn test_search_filters_compose_and_exclude_non_matches() {
    let app = spawn_app().await;
    let employer = signed_in_client(&app.address, "employer", "Ada", "ada@corp.com", "pw").await;

    post_job(
        &employer,
        &app.address,
        &[
            ("title", "Rust Engineer"),
            ("description", "Backend work"),
            ("category", "Engineering"),
            ("location", "Dublin"),
        ],
    )
    .await;
    post_job(
        &employer,
        &app.address,
        &[
            ("title", "Sales Lead"),
            ("description", "Rust experience a plus"),
            ("category", "Sales"),
            ("location", "Dublin"),
        ],
    )
    .await;
    post_job(
        &employer,
        &app.address,
        &[
            ("title", "Rust Intern"),
            ("category", "Engineering"),
            ("location", "Remote"),
        ],
    )
    .await;

    // Free text matches title or description, case-insensitively.
    let rust = fetch_listings(&app.address, "?q=rust").await;
    assert_eq!(rust.len(), 3);

    // All provided filters must hold at once.
    let hits = fetch_listings(&app.address, "?q=RUST&category=engineer&location=dub").await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Rust Engineer");

    // Location alone.
    let remote = fetch_listings(&app.address, "?location=remote").await;
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].title, "Rust Intern");

    // A filter nothing satisfies returns nothing.
    assert!(fetch_listings(&app.address, "?category=finance").await.is_empty());

    // Empty filter strings count as absent.
    let all = fetch_listings(&app.address, "?q=&category=&location=").await;
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn test_salary_must_be_numeric_or_nothing_is_written() {
    let app = spawn_app().await;
    let employer = signed_in_client(&app.address, "employer", "Ada", "ada@corp.com", "pw").await;

    let response = post_job(
        &employer,
        &app.address,
        &[("title", "Engineer"), ("salary", "abc")],
    )
    .await;
    assert_eq!(response.status(), 400);
    let body: ApiResponse = response.json().await.unwrap();
    assert!(body.message.contains("number"));
    assert!(fetch_listings(&app.address, "").await.is_empty());

    let response = post_job(
        &employer,
        &app.address,
        &[("title", "Engineer"), ("salary", "120000")],
    )
    .await;
    assert!(response.status().is_success());
    let listings = fetch_listings(&app.address, "").await;
    assert_eq!(listings[0].salary, Some(120000.0));
}

#[tokio::test]
async fn test_title_is_required() {
    let app = spawn_app().await;
    let employer = signed_in_client(&app.address, "employer", "Ada", "ada@corp.com", "pw").await;

    let response = post_job(&employer, &app.address, &[("title", "  ")]).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_seekers_cannot_post_jobs() {
    let app = spawn_app().await;
    let seeker = signed_in_client(&app.address, "jobseeker", "Bob", "bob@mail.com", "pw").await;

    let response = post_job(&seeker, &app.address, &[("title", "Engineer")]).await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_update_is_partial_and_owner_only() {
    let app = spawn_app().await;
    let owner = signed_in_client(&app.address, "employer", "Ada", "ada@corp.com", "pw").await;
    post_job(
        &owner,
        &app.address,
        &[("title", "Engineer"), ("location", "Dublin"), ("salary", "100000")],
    )
    .await;
    let job_id = fetch_listings(&app.address, "").await[0].id;

    // A different employer cannot touch it.
    let other = signed_in_client(&app.address, "employer", "Eve", "eve@other.com", "pw").await;
    let response = other
        .put(format!("{}/jobs/{}", app.address, job_id))
        .json(&serde_json::json!({ "title": "Hijacked" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    // The owner updates the title only; everything else survives.
    let updated: Job = owner
        .put(format!("{}/jobs/{}", app.address, job_id))
        .json(&serde_json::json!({ "title": "Senior Engineer" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.title, "Senior Engineer");
    assert_eq!(updated.location.as_deref(), Some("Dublin"));
    assert_eq!(updated.salary, Some(100000.0));

    // Bad salary on update is rejected as validation too.
    let response = owner
        .put(format!("{}/jobs/{}", app.address, job_id))
        .json(&serde_json::json!({ "salary": "lots" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    // An explicitly empty salary clears the column.
    let updated: Job = owner
        .put(format!("{}/jobs/{}", app.address, job_id))
        .json(&serde_json::json!({ "salary": "" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.salary, None);
}

#[tokio::test]
async fn test_delete_is_owner_only_and_cascades_applications() {
    let app = spawn_app().await;
    let owner = signed_in_client(&app.address, "employer", "Ada", "ada@corp.com", "pw").await;
    post_job(&owner, &app.address, &[("title", "Engineer")]).await;
    let job_id = fetch_listings(&app.address, "").await[0].id;

    let seeker = signed_in_client(&app.address, "jobseeker", "Bob", "bob@mail.com", "pw").await;
    let response = seeker
        .post(format!("{}/applications/apply/{}", app.address, job_id))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // A different employer is denied even though the job exists.
    let other = signed_in_client(&app.address, "employer", "Eve", "eve@other.com", "pw").await;
    let response = other
        .delete(format!("{}/jobs/{}", app.address, job_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = owner
        .delete(format!("{}/jobs/{}", app.address, job_id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    // No orphaned application rows remain.
    let mine: Vec<serde_json::Value> = seeker
        .get(format!("{}/applications/my_applications", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(mine.is_empty());
    assert!(fetch_listings(&app.address, "").await.is_empty());
}

#[tokio::test]
async fn test_my_jobs_lists_only_own_postings() {
    let app = spawn_app().await;
    let ada = signed_in_client(&app.address, "employer", "Ada", "ada@corp.com", "pw").await;
    let eve = signed_in_client(&app.address, "employer", "Eve", "eve@other.com", "pw").await;
    post_job(&ada, &app.address, &[("title", "Ada's Job")]).await;
    post_job(&eve, &app.address, &[("title", "Eve's Job")]).await;

    let jobs: Vec<Job> = ada
        .get(format!("{}/jobs/employer/my_jobs", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].title, "Ada's Job");
}
