mod common;

use common::{client, login, register, signed_in_client, spawn_app};
use job_board::models::ApiResponse;

#[tokio::test]
async fn test_register_requires_all_fields() {
    let app = spawn_app().await;
    let client = client();

    let response = register(&client, &app.address, "employer", "", "a@x.com", "pw").await;
    assert_eq!(response.status(), 400);

    let response = register(&client, &app.address, "employer", "Ada", "a@x.com", "").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_register_rejects_unknown_and_admin_roles() {
    let app = spawn_app().await;
    let client = client();

    let response = register(&client, &app.address, "wizard", "Ada", "a@x.com", "pw").await;
    assert_eq!(response.status(), 400);

    // Admin accounts are seeded, never registered.
    let response = register(&client, &app.address, "admin", "Ada", "a@x.com", "pw").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_duplicate_email_per_role_conflicts_but_cross_role_succeeds() {
    let app = spawn_app().await;
    let client = client();

    let response = register(&client, &app.address, "jobseeker", "Ada", "a@x.com", "pw1").await;
    assert!(response.status().is_success());

    // Same email, same kind: conflict, and the message says so (by design).
    let response = register(&client, &app.address, "jobseeker", "Ada2", "a@x.com", "pw2").await;
    assert_eq!(response.status(), 409);
    let body: ApiResponse = response.json().await.unwrap();
    assert!(!body.success);
    assert!(body.message.contains("already registered"));

    // Same email under the other kind: fine.
    let response = register(&client, &app.address, "employer", "Ada", "a@x.com", "pw3").await;
    assert!(response.status().is_success());
}

#[tokio::test]
async fn test_login_succeeds_and_wrong_password_is_generic() {
    let app = spawn_app().await;
    let client = client();
    let response = register(&client, &app.address, "jobseeker", "Ada", "a@x.com", "pw1").await;
    assert!(response.status().is_success());

    let response = login(&client, &app.address, "jobseeker", "a@x.com", "pw1").await;
    assert!(response.status().is_success());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["role"], "jobseeker");
    assert!(body["user_id"].is_string());

    // Wrong password and unknown email read identically: no enumeration.
    let wrong_pw = login(&client, &app.address, "jobseeker", "a@x.com", "wrong").await;
    assert_eq!(wrong_pw.status(), 401);
    let wrong_pw_body: ApiResponse = wrong_pw.json().await.unwrap();

    let unknown = login(&client, &app.address, "jobseeker", "nobody@x.com", "pw1").await;
    assert_eq!(unknown.status(), 401);
    let unknown_body: ApiResponse = unknown.json().await.unwrap();

    assert_eq!(wrong_pw_body.message, unknown_body.message);
}

#[tokio::test]
async fn test_login_checks_the_requested_role_only() {
    let app = spawn_app().await;
    let client = client();
    let response = register(&client, &app.address, "jobseeker", "Ada", "a@x.com", "pw1").await;
    assert!(response.status().is_success());

    // The account exists as a seeker, not an employer.
    let response = login(&client, &app.address, "employer", "a@x.com", "pw1").await;
    assert_eq!(response.status(), 401);

    let response = login(&client, &app.address, "astronaut", "a@x.com", "pw1").await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_protected_routes_require_a_session() {
    let app = spawn_app().await;
    let anonymous = client();

    for path in [
        "/me",
        "/jobs/employer/my_jobs",
        "/applications/my_applications",
        "/admin/dashboard",
    ] {
        let response = anonymous
            .get(format!("{}{}", app.address, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401, "expected 401 for {path}");
    }
}

#[tokio::test]
async fn test_logout_invalidates_the_session() {
    let app = spawn_app().await;
    let seeker = signed_in_client(&app.address, "jobseeker", "Ada", "a@x.com", "pw1").await;

    let response = seeker
        .get(format!("{}/me", app.address))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = seeker
        .get(format!("{}/auth/logout", app.address))
        .send()
        .await
        .unwrap();
    // Redirect target is the public listings page.
    assert!(response.status().is_success() || response.status().is_redirection());

    let response = seeker
        .get(format!("{}/me", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_me_returns_the_principal_profile() {
    let app = spawn_app().await;
    let seeker = signed_in_client(&app.address, "jobseeker", "Ada", "a@x.com", "pw1").await;

    let body: serde_json::Value = seeker
        .get(format!("{}/me", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["role"], "jobseeker");
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["email"], "a@x.com");
}
