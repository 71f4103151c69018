use axum::extract::{Json, Query, State};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::AppResult;
use crate::models::{CandidateProfile, User, UserRole};
use crate::schema::{candidate_profiles, users};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CandidateListQuery {
    pub available: Option<bool>,
}

#[derive(Serialize)]
pub struct CandidateSummary {
    pub user_id: Uuid,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub experience_level: Option<String>,
    pub available: bool,
    pub completion_percentage: f64,
}

/// Recruiter-side candidate directory. Only users who have started a
/// profile show up; the available filter is opt-in.
pub async fn list_candidates(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(params): Query<CandidateListQuery>,
) -> AppResult<Json<Vec<CandidateSummary>>> {
    auth.require_role(UserRole::Recruiter, "only recruiters can browse candidates")?;

    let mut conn = state.db()?;

    let mut query = candidate_profiles::table
        .inner_join(users::table)
        .filter(users::role.eq(UserRole::Candidate.as_str()))
        .into_boxed();

    if let Some(available) = params.available {
        query = query.filter(users::available.eq(available));
    }

    let rows: Vec<(CandidateProfile, User)> = query
        .order(candidate_profiles::updated_at.desc())
        .load(&mut conn)?;

    let summaries = rows
        .iter()
        .map(|(profile, user)| CandidateSummary {
            user_id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            job_title: profile.job_title.clone(),
            location: profile.location.clone(),
            skills: profile.skill_list(),
            experience_years: profile.experience_years,
            experience_level: profile.experience_level.clone(),
            available: user.available,
            completion_percentage: profile.completion_percentage(user),
        })
        .collect();

    Ok(Json(summaries))
}
