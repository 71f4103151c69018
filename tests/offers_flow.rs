mod common;

use anyhow::{Context, Result};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{acquire_db_lock, response_json, TestApp};
use diesel::prelude::*;
use serde_json::{json, Value};
use uuid::Uuid;

fn offer_payload(title: &str) -> Value {
    json!({
        "title": title,
        "description": "Maintain the data pipeline",
        "location": "Paris",
        "contract_type": "CDI",
        "required_skills": ["Rust", "SQL"],
        "salary_min": 40_000,
        "salary_max": 55_000,
        "expires_at": (Utc::now() + Duration::days(30)).to_rfc3339(),
    })
}

async fn create_offer(app: &TestApp, token: &str, title: &str) -> Result<Uuid> {
    let response = app
        .post_json("/api/offers", &offer_payload(title), Some(token))
        .await?;
    anyhow::ensure!(
        response.status() == StatusCode::CREATED,
        "offer creation failed with status {}",
        response.status()
    );
    let body = response_json(response).await?;
    body["id"]
        .as_str()
        .context("offer response has no id")?
        .parse()
        .context("offer id is not a uuid")
}

#[tokio::test]
async fn only_recruiters_publish_offers() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let recruiter = app
        .register_recruiter("hr_pub", "correct-horse", Some("PubCo"))
        .await?;
    let candidate = app.register_candidate("nate", "correct-horse").await?;

    let created = app
        .post_json("/api/offers", &offer_payload("Data engineer"), Some(&recruiter))
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);

    let forbidden = app
        .post_json("/api/offers", &offer_payload("Data engineer"), Some(&candidate))
        .await?;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn offer_validation_rules() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let recruiter = app
        .register_recruiter("hr_val", "correct-horse", Some("ValCo"))
        .await?;

    let mut past_expiry = offer_payload("Past");
    past_expiry["expires_at"] = json!((Utc::now() - Duration::days(1)).to_rfc3339());
    let response = app
        .post_json("/api/offers", &past_expiry, Some(&recruiter))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut inverted_salary = offer_payload("Inverted");
    inverted_salary["salary_min"] = json!(60_000);
    let response = app
        .post_json("/api/offers", &inverted_salary, Some(&recruiter))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await?;
    assert_eq!(body["field"], "salary_max");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn public_listing_excludes_expired_offers() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let recruiter = app
        .register_recruiter("hr_exp", "correct-horse", Some("ExpCo"))
        .await?;
    let fresh = create_offer(&app, &recruiter, "Fresh role").await?;
    let stale = create_offer(&app, &recruiter, "Stale role").await?;

    // Age the second offer past its expiry directly in the database.
    app.with_conn(move |conn| {
        use jobboard::schema::offers;
        let yesterday = (Utc::now() - Duration::days(1)).naive_utc();
        diesel::update(offers::table.find(stale))
            .set(offers::expires_at.eq(yesterday))
            .execute(conn)
            .context("failed to age offer")?;
        Ok(())
    })
    .await?;

    let response = app.get("/api/offers/public", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await?;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], fresh.to_string());

    // The authenticated listing keeps expired offers, flagged as such.
    let response = app.get("/api/offers", Some(&recruiter)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await?;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    let stale_entry = listed
        .iter()
        .find(|entry| entry["id"] == stale.to_string())
        .expect("expired offer missing from authenticated listing");
    assert_eq!(stale_entry["is_expired"], true);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn listing_filters_and_search() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let recruiter = app
        .register_recruiter("hr_fil", "correct-horse", Some("FilCo"))
        .await?;
    let candidate = app.register_candidate("olga", "correct-horse").await?;

    create_offer(&app, &recruiter, "Rust backend engineer").await?;
    let mut cdd = offer_payload("Support agent");
    cdd["contract_type"] = json!("CDD");
    cdd["required_skills"] = json!(["Zendesk"]);
    let response = app.post_json("/api/offers", &cdd, Some(&recruiter)).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .get("/api/offers?contract_type=CDD", Some(&candidate))
        .await?;
    let body = response_json(response).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Support agent");

    let response = app.get("/api/offers?q=backend", Some(&candidate)).await?;
    let body = response_json(response).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Rust backend engineer");

    // Skill terms match the required_skills array exactly.
    let response = app.get("/api/offers?q=Zendesk", Some(&candidate)).await?;
    let body = response_json(response).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Support agent");

    let response = app
        .get("/api/offers?ordering=sideways", Some(&candidate))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn soft_delete_hides_offer_from_non_owners() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let recruiter = app
        .register_recruiter("hr_del", "correct-horse", Some("DelCo"))
        .await?;
    let candidate = app.register_candidate("pete", "correct-horse").await?;
    let offer_id = create_offer(&app, &recruiter, "Doomed role").await?;

    let deleted = app
        .delete(&format!("/api/offers/{offer_id}"), Some(&recruiter))
        .await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let hidden = app
        .get(&format!("/api/offers/{offer_id}"), Some(&candidate))
        .await?;
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    // The owner keeps an audit view of the deleted row.
    let owner_view = app
        .get(&format!("/api/offers/{offer_id}"), Some(&recruiter))
        .await?;
    assert_eq!(owner_view.status(), StatusCode::OK);
    let body = response_json(owner_view).await?;
    assert_eq!(body["status"], "deleted");

    let mine = app.get("/api/offers/mine", Some(&recruiter)).await?;
    let body = response_json(mine).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let mine_active = app
        .get("/api/offers/mine?status=active", Some(&recruiter))
        .await?;
    let body = response_json(mine_active).await?;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let reactivate = app
        .patch_json(
            &format!("/api/offers/{offer_id}"),
            &json!({ "status": "active" }),
            Some(&recruiter),
        )
        .await?;
    assert_eq!(reactivate.status(), StatusCode::CONFLICT);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn patch_is_owner_only() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let owner = app
        .register_recruiter("hr_own", "correct-horse", Some("OwnCo"))
        .await?;
    let rival = app
        .register_recruiter("hr_rival", "correct-horse", Some("RivalCo"))
        .await?;
    let offer_id = create_offer(&app, &owner, "Contested role").await?;

    let renamed = app
        .patch_json(
            &format!("/api/offers/{offer_id}"),
            &json!({ "title": "Renamed role" }),
            Some(&owner),
        )
        .await?;
    assert_eq!(renamed.status(), StatusCode::OK);
    let body = response_json(renamed).await?;
    assert_eq!(body["title"], "Renamed role");

    let stolen = app
        .patch_json(
            &format!("/api/offers/{offer_id}"),
            &json!({ "title": "Hijacked" }),
            Some(&rival),
        )
        .await?;
    assert_eq!(stolen.status(), StatusCode::NOT_FOUND);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn suspended_offers_leave_the_listing() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let recruiter = app
        .register_recruiter("hr_sus", "correct-horse", Some("SusCo"))
        .await?;
    let candidate = app.register_candidate("quin", "correct-horse").await?;
    let offer_id = create_offer(&app, &recruiter, "On hold").await?;

    let response = app
        .patch_json(
            &format!("/api/offers/{offer_id}"),
            &json!({ "status": "suspended" }),
            Some(&recruiter),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let listing = app.get("/api/offers", Some(&candidate)).await?;
    let body = response_json(listing).await?;
    assert_eq!(body.as_array().unwrap().len(), 0);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn recommendations_match_skills_or_industries() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let recruiter = app
        .register_recruiter("hr_rec", "correct-horse", Some("RecCo"))
        .await?;
    create_offer(&app, &recruiter, "Rust backend engineer").await?;

    let blank = app.register_candidate("rosa", "correct-horse").await?;
    let response = app.get("/api/offers/recommended", Some(&blank)).await?;
    let body = response_json(response).await?;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let matching = app.register_candidate("sven", "correct-horse").await?;
    app.patch_json(
        "/api/profile/candidate",
        &json!({ "skills": "Rust, Kubernetes" }),
        Some(&matching),
    )
    .await?;
    let response = app.get("/api/offers/recommended", Some(&matching)).await?;
    let body = response_json(response).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Sector interest matches too, even without a skill overlap.
    let sector_fan = app.register_candidate("tina", "correct-horse").await?;
    app.patch_json(
        "/api/profile/preferences",
        &json!({ "preferred_industries": "Tech" }),
        Some(&sector_fan),
    )
    .await?;
    let response = app.get("/api/offers/recommended", Some(&sector_fan)).await?;
    let body = response_json(response).await?;
    assert_eq!(body.as_array().unwrap().len(), 1);

    app.cleanup().await?;
    Ok(())
}
