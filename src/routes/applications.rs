use std::time::Duration;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    Application, ApplicationStatus, CandidateProfile, Company, NewApplication, Offer, OfferStatus,
    User, UserRole,
};
use crate::schema::{applications, candidate_profiles, companies, offers, users};
use crate::state::AppState;

use super::offers::company_for_admin;
use super::profile::get_or_create_profile;

type ApplicationRow = (Application, (Offer, Company), (CandidateProfile, User));

#[derive(Serialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub offer_id: Uuid,
    pub offer_title: String,
    pub company_name: String,
    pub candidate_user_id: Uuid,
    pub candidate_username: String,
    pub candidate_first_name: Option<String>,
    pub candidate_last_name: Option<String>,
    pub status: String,
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_url: Option<String>,
    pub matching_score: f64,
    pub submitted_at: String,
    pub viewed_at: Option<String>,
}

async fn application_payload(
    state: &AppState,
    row: &ApplicationRow,
) -> AppResult<ApplicationResponse> {
    let (application, (offer, company), (_, user)) = row;

    let expiry = Duration::from_secs(state.config.upload_url_expiry_minutes * 60);
    let cv_url = if application.cv_key.is_empty() {
        None
    } else {
        Some(
            state
                .storage
                .presign_get_object(&application.cv_key, expiry)
                .await?,
        )
    };

    Ok(ApplicationResponse {
        id: application.id,
        offer_id: offer.id,
        offer_title: offer.title.clone(),
        company_name: company.name.clone(),
        candidate_user_id: user.id,
        candidate_username: user.username.clone(),
        candidate_first_name: user.first_name.clone(),
        candidate_last_name: user.last_name.clone(),
        status: application.status.clone(),
        cover_letter: application.cover_letter.clone(),
        cv_url,
        matching_score: application.matching_score,
        submitted_at: application.submitted_at.and_utc().to_rfc3339(),
        viewed_at: application.viewed_at.map(|t| t.and_utc().to_rfc3339()),
    })
}

fn load_row(conn: &mut PgConnection, application_id: Uuid) -> AppResult<Option<ApplicationRow>> {
    Ok(applications::table
        .inner_join(offers::table.inner_join(companies::table))
        .inner_join(candidate_profiles::table.inner_join(users::table))
        .filter(applications::id.eq(application_id))
        .first::<ApplicationRow>(conn)
        .optional()?)
}

/// Share of an offer's required skills the candidate declares, as a
/// percentage. An offer with no listed skills scores zero rather than a
/// trivially perfect match.
pub fn matching_score(required: &[String], candidate_skills: &[String]) -> f64 {
    if required.is_empty() {
        return 0.0;
    }
    let lowered: Vec<String> = candidate_skills.iter().map(|s| s.to_lowercase()).collect();
    let hits = required
        .iter()
        .filter(|skill| lowered.contains(&skill.to_lowercase()))
        .count();
    hits as f64 / required.len() as f64 * 100.0
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub offer_id: Uuid,
    pub cover_letter: Option<String>,
    pub cv_key: Option<String>,
}

pub async fn apply(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(payload): Json<ApplyRequest>,
) -> AppResult<(StatusCode, Json<ApplicationResponse>)> {
    auth.require_role(UserRole::Candidate, "only candidates can apply")?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    let now = Utc::now().naive_utc();
    let offer: Offer = offers::table
        .find(payload.offer_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    if offer.status != OfferStatus::Active.as_str() || !offer.is_active {
        return Err(AppError::validation("offer_id", "this offer is not open"));
    }
    if offer.is_expired(now) {
        return Err(AppError::validation("offer_id", "this offer has expired"));
    }

    // The CV attached to the application is pinned at submit time. A later
    // profile CV swap does not rewrite past applications.
    let cv_key = match payload.cv_key {
        Some(key) => {
            let prefix = format!("cv_files/{}/", auth.user_id);
            if !key.starts_with(&prefix) {
                return Err(AppError::validation("cv_key", "cv_key does not belong to you"));
            }
            key
        }
        None => profile.cv_key.clone().ok_or_else(|| {
            AppError::validation("cv_key", "upload a CV before applying")
        })?,
    };

    let score = matching_score(&offer.required_skills, &profile.skill_list());

    let new_application = NewApplication {
        id: Uuid::new_v4(),
        candidate_id: profile.id,
        offer_id: offer.id,
        cv_key,
        cover_letter: payload.cover_letter,
        status: ApplicationStatus::Sent.as_str().to_string(),
        matching_score: score,
    };

    let inserted = diesel::insert_into(applications::table)
        .values(&new_application)
        .get_result::<Application>(&mut conn);

    let (status_code, application) = match inserted {
        Ok(application) => {
            info!(offer_id = %offer.id, score, "application submitted");
            (StatusCode::CREATED, application)
        }
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            // Re-applying returns the existing application instead of
            // erroring; the client treats both shapes the same way.
            let existing: Application = applications::table
                .filter(applications::candidate_id.eq(profile.id))
                .filter(applications::offer_id.eq(offer.id))
                .first(&mut conn)?;
            (StatusCode::OK, existing)
        }
        Err(err) => return Err(AppError::from(err)),
    };

    let row = load_row(&mut conn, application.id)?.ok_or_else(AppError::not_found)?;
    Ok((status_code, Json(application_payload(&state, &row).await?)))
}

pub async fn list_applications(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<ApplicationResponse>>> {
    let mut conn = state.db()?;

    let base = applications::table
        .inner_join(offers::table.inner_join(companies::table))
        .inner_join(candidate_profiles::table.inner_join(users::table))
        .order(applications::submitted_at.desc());

    let rows: Vec<ApplicationRow> = match auth.role {
        UserRole::Candidate => {
            let profile = get_or_create_profile(&mut conn, auth.user_id)?;
            base.filter(applications::candidate_id.eq(profile.id))
                .load(&mut conn)?
        }
        UserRole::Recruiter => {
            let company = company_for_admin(&mut conn, auth.user_id)?;
            base.filter(offers::company_id.eq(company.id))
                .load(&mut conn)?
        }
    };

    let mut payloads = Vec::with_capacity(rows.len());
    for row in &rows {
        payloads.push(application_payload(&state, row).await?);
    }
    Ok(Json(payloads))
}

pub async fn get_application(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(application_id): Path<Uuid>,
) -> AppResult<Json<ApplicationResponse>> {
    let mut conn = state.db()?;
    let mut row = load_row(&mut conn, application_id)?.ok_or_else(AppError::not_found)?;

    let (application, (_, company), (_, candidate_user)) = &row;
    let is_candidate = candidate_user.id == auth.user_id;
    let is_recruiter = company.admin_id == auth.user_id;
    if !is_candidate && !is_recruiter {
        return Err(AppError::not_found());
    }

    // First recruiter read flips sent to viewed. The viewed_at guard keeps
    // concurrent reads from stamping twice.
    if is_recruiter && application.viewed_at.is_none() {
        let now = Utc::now().naive_utc();
        let updated = diesel::update(
            applications::table
                .filter(applications::id.eq(application.id))
                .filter(applications::viewed_at.is_null()),
        )
        .set((
            applications::viewed_at.eq(now),
            applications::status.eq(ApplicationStatus::Viewed.as_str()),
        ))
        .execute(&mut conn)?;

        if updated > 0 {
            row = load_row(&mut conn, application_id)?.ok_or_else(AppError::not_found)?;
        }
    }

    Ok(Json(application_payload(&state, &row).await?))
}

#[derive(Deserialize)]
pub struct UpdateApplicationRequest {
    pub status: ApplicationStatus,
}

pub async fn update_application(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<UpdateApplicationRequest>,
) -> AppResult<Json<ApplicationResponse>> {
    auth.require_role(UserRole::Recruiter, "only recruiters review applications")?;

    let mut conn = state.db()?;
    let company = company_for_admin(&mut conn, auth.user_id)?;

    let row = load_row(&mut conn, application_id)?.ok_or_else(AppError::not_found)?;
    let (application, (_, owning_company), _) = &row;
    if owning_company.id != company.id {
        return Err(AppError::not_found());
    }

    // Once out of the mailbox, never back in.
    if payload.status == ApplicationStatus::Sent {
        return Err(AppError::validation(
            "status",
            "an application cannot return to 'sent'",
        ));
    }

    let now = Utc::now().naive_utc();
    diesel::update(applications::table.find(application.id))
        .set((
            applications::status.eq(payload.status.as_str()),
            // A status change counts as having seen the application.
            applications::viewed_at.eq(application.viewed_at.unwrap_or(now)),
        ))
        .execute(&mut conn)?;

    let row = load_row(&mut conn, application_id)?.ok_or_else(AppError::not_found)?;
    info!(application_id = %application_id, status = payload.status.as_str(), "application updated");
    Ok(Json(application_payload(&state, &row).await?))
}
