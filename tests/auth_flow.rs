mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn candidate_registration_creates_profile() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let token = app.register_candidate("alice", "correct-horse").await?;

    let response = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await?;

    assert_eq!(body["user"]["username"], "alice");
    assert_eq!(body["user"]["role"], "candidate");
    assert_eq!(body["profile"]["completion_percentage"], 0.0);
    assert!(body.get("company").is_none());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn seeded_recruiter_company_is_validated() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let token = app
        .register_recruiter("hr_acme", "correct-horse", Some("Acme"))
        .await?;

    let response = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await?;

    assert_eq!(body["company"]["name"], "Acme");
    assert_eq!(body["company"]["verification_status"], "validated");
    assert_eq!(body["company"]["is_verified"], true);
    assert!(body.get("profile").is_none());

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn bare_recruiter_gets_pending_placeholder_company() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let token = app
        .register_recruiter("hr_solo", "correct-horse", None)
        .await?;

    let response = app.get("/api/auth/me", Some(&token)).await?;
    let body = response_json(response).await?;

    assert_eq!(body["company"]["name"], "hr_solo's company");
    assert_eq!(body["company"]["verification_status"], "pending");
    assert_eq!(body["company"]["is_verified"], false);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn partial_company_seed_is_rejected() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": "hr_partial",
                "email": "hr_partial@example.com",
                "password": "correct-horse",
                "password_confirm": "correct-horse",
                "role": "recruiter",
                "company_name": "HalfCo",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await?;
    assert_eq!(body["field"], "company_sector");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.register_candidate("bob", "correct-horse").await?;

    let response = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": "bob2",
                "email": "bob@example.com",
                "password": "correct-horse",
                "password_confirm": "correct-horse",
                "role": "candidate",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn password_rules_are_enforced() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let short = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": "carol",
                "email": "carol@example.com",
                "password": "short",
                "password_confirm": "short",
                "role": "candidate",
            }),
            None,
        )
        .await?;
    assert_eq!(short.status(), StatusCode::BAD_REQUEST);

    let mismatch = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": "carol",
                "email": "carol@example.com",
                "password": "correct-horse",
                "password_confirm": "battery-staple",
                "role": "candidate",
            }),
            None,
        )
        .await?;
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn login_accepts_email_or_username() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.register_candidate("dora", "correct-horse").await?;

    let by_email = app.login_token("dora@example.com", "correct-horse").await;
    assert!(by_email.is_ok());

    let by_username = app.login_token("dora", "correct-horse").await;
    assert!(by_username.is_ok());

    let bad = app
        .post_json(
            "/api/auth/login",
            &json!({ "identifier": "dora", "password": "wrong" }),
            None,
        )
        .await?;
    assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn logout_revokes_only_the_presenting_token() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.register_candidate("erin", "correct-horse").await?;
    let token_a = app.login_token("erin", "correct-horse").await?;
    let token_b = app.login_token("erin", "correct-horse").await?;

    let response = app.post_json("/api/auth/logout", &json!({}), Some(&token_a)).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let after = app.get("/api/auth/me", Some(&token_a)).await?;
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);

    let still_valid = app.get("/api/auth/me", Some(&token_b)).await?;
    assert_eq!(still_valid.status(), StatusCode::OK);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn password_change_revokes_other_sessions() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.register_candidate("frank", "correct-horse").await?;
    let token_a = app.login_token("frank", "correct-horse").await?;
    let token_b = app.login_token("frank", "correct-horse").await?;

    let response = app
        .post_json(
            "/api/auth/change-password",
            &json!({
                "old_password": "correct-horse",
                "new_password": "battery-staple",
                "new_password_confirm": "battery-staple",
            }),
            Some(&token_a),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The presenting session survives, the other one does not.
    let keeper = app.get("/api/auth/me", Some(&token_a)).await?;
    assert_eq!(keeper.status(), StatusCode::OK);
    let revoked = app.get("/api/auth/me", Some(&token_b)).await?;
    assert_eq!(revoked.status(), StatusCode::UNAUTHORIZED);

    let old_login = app
        .post_json(
            "/api/auth/login",
            &json!({ "identifier": "frank", "password": "correct-horse" }),
            None,
        )
        .await?;
    assert_eq!(old_login.status(), StatusCode::UNAUTHORIZED);
    assert!(app.login_token("frank", "battery-staple").await.is_ok());

    app.cleanup().await?;
    Ok(())
}
