use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Company, NewOffer, Offer, OfferStatus, UserRole};
use crate::schema::{applications, companies, favorites, offers};
use crate::state::AppState;
use crate::utils::json::{patch_i32, patch_i64, patch_string, patch_string_array, Patch};

use super::profile::get_or_create_profile;

/// Recommendation feeds are capped; candidates refine with filters instead
/// of paging an unbounded list.
const RECOMMENDATION_LIMIT: i64 = 20;

#[derive(Serialize)]
pub struct OfferResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub description: String,
    pub sector: String,
    pub required_skills: Vec<String>,
    pub location: String,
    pub contract_type: String,
    pub duration_months: i32,
    pub salary_min: i64,
    pub salary_max: i64,
    pub salary_display: String,
    pub education_level: String,
    pub experience_level: String,
    pub experience_years: i32,
    pub benefits: Vec<String>,
    pub recruitment_process: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub published_at: String,
    pub expires_at: String,
    pub status: String,
    pub is_expired: bool,
}

impl OfferResponse {
    pub fn from_offer(offer: &Offer, company_name: &str) -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: offer.id,
            company_id: offer.company_id,
            company_name: company_name.to_string(),
            title: offer.title.clone(),
            description: offer.description.clone(),
            sector: offer.sector.clone(),
            required_skills: offer.required_skills.clone(),
            location: offer.location.clone(),
            contract_type: offer.contract_type.clone(),
            duration_months: offer.duration_months,
            salary_min: offer.salary_min,
            salary_max: offer.salary_max,
            salary_display: offer.salary_display(),
            education_level: offer.education_level.clone(),
            experience_level: offer.experience_level.clone(),
            experience_years: offer.experience_years,
            benefits: offer.benefits.clone(),
            recruitment_process: offer.recruitment_process.clone(),
            contact_email: offer.contact_email.clone(),
            contact_phone: offer.contact_phone.clone(),
            published_at: offer.published_at.and_utc().to_rfc3339(),
            expires_at: offer.expires_at.and_utc().to_rfc3339(),
            status: offer.status.clone(),
            is_expired: offer.is_expired(now),
        }
    }
}

fn to_responses(rows: Vec<(Offer, Company)>) -> Vec<OfferResponse> {
    rows.iter()
        .map(|(offer, company)| OfferResponse::from_offer(offer, &company.name))
        .collect()
}

/// Looks up the company administered by the authenticated recruiter.
pub fn company_for_admin(conn: &mut PgConnection, admin_id: Uuid) -> AppResult<Company> {
    companies::table
        .filter(companies::admin_id.eq(admin_id))
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::forbidden("no company is attached to this account"))
}

fn parse_rfc3339(field: &str, value: &str) -> AppResult<NaiveDateTime> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
        .map_err(|_| AppError::validation(field, format!("{field} must be an RFC 3339 timestamp")))
}

#[derive(Deserialize)]
pub struct CreateOfferRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub location: String,
    pub contract_type: String,
    #[serde(default)]
    pub duration_months: i32,
    #[serde(default)]
    pub salary_min: i64,
    #[serde(default)]
    pub salary_max: i64,
    pub salary_text: Option<String>,
    #[serde(default)]
    pub education_level: String,
    #[serde(default)]
    pub experience_level: String,
    #[serde(default)]
    pub experience_years: i32,
    #[serde(default)]
    pub benefits: Vec<String>,
    pub recruitment_process: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub expires_at: String,
}

pub async fn create_offer(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(payload): Json<CreateOfferRequest>,
) -> AppResult<(StatusCode, Json<OfferResponse>)> {
    auth.require_role(UserRole::Recruiter, "only recruiters can publish offers")?;

    if payload.title.trim().is_empty() {
        return Err(AppError::validation("title", "title is required"));
    }
    if payload.description.trim().is_empty() {
        return Err(AppError::validation("description", "description is required"));
    }
    if payload.salary_min < 0 || payload.salary_max < 0 {
        return Err(AppError::validation("salary_min", "salaries cannot be negative"));
    }
    if payload.salary_max < payload.salary_min {
        return Err(AppError::validation(
            "salary_max",
            "salary_max must be greater than or equal to salary_min",
        ));
    }

    let published_at = Utc::now().naive_utc();
    let expires_at = parse_rfc3339("expires_at", &payload.expires_at)?;
    if expires_at <= published_at {
        return Err(AppError::validation(
            "expires_at",
            "expiry must be after the publication date",
        ));
    }

    let mut conn = state.db()?;
    let company = company_for_admin(&mut conn, auth.user_id)?;

    let new_offer = NewOffer {
        id: Uuid::new_v4(),
        company_id: company.id,
        title: payload.title.trim().to_string(),
        description: payload.description,
        sector: payload.sector.unwrap_or_else(|| company.sector.clone()),
        required_skills: payload.required_skills,
        location: payload.location,
        contract_type: payload.contract_type,
        duration_months: payload.duration_months,
        salary_min: payload.salary_min,
        salary_max: payload.salary_max,
        salary_text: payload.salary_text,
        education_level: payload.education_level,
        experience_level: payload.experience_level,
        experience_years: payload.experience_years,
        benefits: payload.benefits,
        recruitment_process: payload.recruitment_process,
        contact_email: payload
            .contact_email
            .unwrap_or_else(|| company.email.clone()),
        contact_phone: payload.contact_phone,
        published_at,
        expires_at,
        status: OfferStatus::Active.as_str().to_string(),
    };

    let offer: Offer = diesel::insert_into(offers::table)
        .values(&new_offer)
        .get_result(&mut conn)?;

    info!(offer_id = %offer.id, company = %company.name, "offer published");

    Ok((
        StatusCode::CREATED,
        Json(OfferResponse::from_offer(&offer, &company.name)),
    ))
}

#[derive(Deserialize, Default)]
pub struct OfferListQuery {
    pub contract_type: Option<String>,
    pub experience_level: Option<String>,
    pub sector: Option<String>,
    pub location: Option<String>,
    pub q: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub ordering: Option<String>,
}

fn browse_offers(
    conn: &mut PgConnection,
    params: &OfferListQuery,
    exclude_expired: bool,
) -> AppResult<Vec<(Offer, Company)>> {
    let mut query = offers::table
        .inner_join(companies::table)
        .filter(offers::status.eq(OfferStatus::Active.as_str()))
        .filter(offers::is_active.eq(true))
        .into_boxed();

    // Only the public listing hides expired offers; authenticated browsing
    // still shows them (the response carries is_expired for the client).
    if exclude_expired {
        let now = Utc::now().naive_utc();
        query = query.filter(offers::expires_at.gt(now));
    }

    if let Some(contract_type) = params.contract_type.as_deref() {
        query = query.filter(offers::contract_type.eq(contract_type.to_string()));
    }
    if let Some(experience_level) = params.experience_level.as_deref() {
        query = query.filter(offers::experience_level.eq(experience_level.to_string()));
    }
    if let Some(sector) = params.sector.as_deref() {
        query = query.filter(offers::sector.eq(sector.to_string()));
    }
    if let Some(location) = params.location.as_deref() {
        query = query.filter(offers::location.eq(location.to_string()));
    }
    if let Some(q) = params.q.as_deref().filter(|q| !q.trim().is_empty()) {
        let pattern = format!("%{}%", q.trim());
        let exact = vec![q.trim().to_string()];
        query = query.filter(
            offers::title
                .ilike(pattern.clone())
                .or(offers::description.ilike(pattern))
                .or(offers::required_skills.contains(exact)),
        );
    }
    // A requested floor matches offers whose ceiling reaches it, and the
    // other way around for a requested ceiling.
    if let Some(floor) = params.salary_min {
        query = query.filter(offers::salary_max.ge(floor));
    }
    if let Some(ceiling) = params.salary_max {
        query = query.filter(offers::salary_min.le(ceiling));
    }

    query = match params.ordering.as_deref() {
        None | Some("-published_at") => query.order(offers::published_at.desc()),
        Some("published_at") => query.order(offers::published_at.asc()),
        Some("salary_min") => query.order(offers::salary_min.asc()),
        Some("-salary_min") => query.order(offers::salary_min.desc()),
        Some("salary_max") => query.order(offers::salary_max.asc()),
        Some("-salary_max") => query.order(offers::salary_max.desc()),
        Some(other) => {
            return Err(AppError::validation(
                "ordering",
                format!("unknown ordering '{other}'"),
            ))
        }
    };

    Ok(query.load(conn)?)
}

pub async fn list_offers(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Query(params): Query<OfferListQuery>,
) -> AppResult<Json<Vec<OfferResponse>>> {
    let mut conn = state.db()?;
    let rows = browse_offers(&mut conn, &params, false)?;
    Ok(Json(to_responses(rows)))
}

/// Unauthenticated browse endpoint. Stricter than the authenticated
/// listing: already-expired offers are dropped as well.
pub async fn list_public_offers(
    State(state): State<AppState>,
    Query(params): Query<OfferListQuery>,
) -> AppResult<Json<Vec<OfferResponse>>> {
    let mut conn = state.db()?;
    let rows = browse_offers(&mut conn, &params, true)?;
    Ok(Json(to_responses(rows)))
}

#[derive(Deserialize, Default)]
pub struct MyOffersQuery {
    pub status: Option<String>,
    pub contract_type: Option<String>,
}

pub async fn list_my_offers(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Query(params): Query<MyOffersQuery>,
) -> AppResult<Json<Vec<OfferResponse>>> {
    auth.require_role(UserRole::Recruiter, "only recruiters have published offers")?;

    let mut conn = state.db()?;
    let company = company_for_admin(&mut conn, auth.user_id)?;

    // Owners see their full catalogue, soft-deleted rows included.
    let mut query = offers::table
        .filter(offers::company_id.eq(company.id))
        .into_boxed();
    if let Some(status) = params.status.as_deref() {
        let status = OfferStatus::parse(status)
            .ok_or_else(|| AppError::validation("status", format!("unknown status '{status}'")))?;
        query = query.filter(offers::status.eq(status.as_str()));
    }
    if let Some(contract_type) = params.contract_type.as_deref() {
        query = query.filter(offers::contract_type.eq(contract_type.to_string()));
    }

    let rows: Vec<Offer> = query.order(offers::published_at.desc()).load(&mut conn)?;

    Ok(Json(
        rows.iter()
            .map(|offer| OfferResponse::from_offer(offer, &company.name))
            .collect(),
    ))
}

pub async fn get_offer(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
) -> AppResult<Json<OfferResponse>> {
    let mut conn = state.db()?;

    let (offer, company): (Offer, Company) = offers::table
        .inner_join(companies::table)
        .filter(offers::id.eq(offer_id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    let is_owner = company.admin_id == auth.user_id;
    if !is_owner && offer.status == OfferStatus::Deleted.as_str() {
        return Err(AppError::not_found());
    }

    Ok(Json(OfferResponse::from_offer(&offer, &company.name)))
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = offers)]
struct OfferChangeset {
    title: Option<String>,
    description: Option<String>,
    sector: Option<String>,
    required_skills: Option<Vec<String>>,
    location: Option<String>,
    contract_type: Option<String>,
    duration_months: Option<i32>,
    salary_min: Option<i64>,
    salary_max: Option<i64>,
    salary_text: Option<Option<String>>,
    education_level: Option<String>,
    experience_level: Option<String>,
    experience_years: Option<i32>,
    benefits: Option<Vec<String>>,
    recruitment_process: Option<Option<String>>,
    contact_email: Option<String>,
    contact_phone: Option<Option<String>>,
    expires_at: Option<NaiveDateTime>,
    status: Option<String>,
    is_active: Option<bool>,
}

impl OfferChangeset {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.sector.is_none()
            && self.required_skills.is_none()
            && self.location.is_none()
            && self.contract_type.is_none()
            && self.duration_months.is_none()
            && self.salary_min.is_none()
            && self.salary_max.is_none()
            && self.salary_text.is_none()
            && self.education_level.is_none()
            && self.experience_level.is_none()
            && self.experience_years.is_none()
            && self.benefits.is_none()
            && self.recruitment_process.is_none()
            && self.contact_email.is_none()
            && self.contact_phone.is_none()
            && self.expires_at.is_none()
            && self.status.is_none()
            && self.is_active.is_none()
    }
}

fn required_patch<T>(patch: Patch<T>, field: &str) -> AppResult<Option<T>> {
    match patch {
        Patch::Omitted => Ok(None),
        Patch::Null => Err(AppError::validation(field, format!("{field} cannot be null"))),
        Patch::Value(v) => Ok(Some(v)),
    }
}

pub async fn update_offer(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> AppResult<Json<OfferResponse>> {
    auth.require_role(UserRole::Recruiter, "only recruiters can edit offers")?;

    let mut conn = state.db()?;
    let company = company_for_admin(&mut conn, auth.user_id)?;

    let offer: Offer = offers::table
        .filter(offers::id.eq(offer_id))
        .filter(offers::company_id.eq(company.id))
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    // Deletion is final; the audit copy is read-only.
    if offer.status == OfferStatus::Deleted.as_str() {
        return Err(AppError::conflict("a deleted offer cannot be edited"));
    }

    let status = match patch_string(&body, "status").map_err(AppError::bad_request)? {
        Patch::Omitted => None,
        Patch::Null => return Err(AppError::validation("status", "status cannot be null")),
        Patch::Value(raw) => {
            let parsed = OfferStatus::parse(&raw)
                .ok_or_else(|| AppError::validation("status", format!("unknown status '{raw}'")))?;
            // Deletion has its own endpoint.
            if parsed == OfferStatus::Deleted {
                return Err(AppError::validation("status", "use DELETE to remove an offer"));
            }
            Some(parsed)
        }
    };

    let expires_at = match patch_string(&body, "expires_at").map_err(AppError::bad_request)? {
        Patch::Omitted => None,
        Patch::Null => {
            return Err(AppError::validation("expires_at", "expires_at cannot be null"))
        }
        Patch::Value(raw) => Some(parse_rfc3339("expires_at", &raw)?),
    };

    let changeset = OfferChangeset {
        title: required_patch(
            patch_string(&body, "title").map_err(AppError::bad_request)?,
            "title",
        )?,
        description: required_patch(
            patch_string(&body, "description").map_err(AppError::bad_request)?,
            "description",
        )?,
        sector: required_patch(
            patch_string(&body, "sector").map_err(AppError::bad_request)?,
            "sector",
        )?,
        required_skills: required_patch(
            patch_string_array(&body, "required_skills").map_err(AppError::bad_request)?,
            "required_skills",
        )?,
        location: required_patch(
            patch_string(&body, "location").map_err(AppError::bad_request)?,
            "location",
        )?,
        contract_type: required_patch(
            patch_string(&body, "contract_type").map_err(AppError::bad_request)?,
            "contract_type",
        )?,
        duration_months: required_patch(
            patch_i32(&body, "duration_months").map_err(AppError::bad_request)?,
            "duration_months",
        )?,
        salary_min: required_patch(
            patch_i64(&body, "salary_min").map_err(AppError::bad_request)?,
            "salary_min",
        )?,
        salary_max: required_patch(
            patch_i64(&body, "salary_max").map_err(AppError::bad_request)?,
            "salary_max",
        )?,
        salary_text: patch_string(&body, "salary_text")
            .map_err(AppError::bad_request)?
            .into_change(),
        education_level: required_patch(
            patch_string(&body, "education_level").map_err(AppError::bad_request)?,
            "education_level",
        )?,
        experience_level: required_patch(
            patch_string(&body, "experience_level").map_err(AppError::bad_request)?,
            "experience_level",
        )?,
        experience_years: required_patch(
            patch_i32(&body, "experience_years").map_err(AppError::bad_request)?,
            "experience_years",
        )?,
        benefits: required_patch(
            patch_string_array(&body, "benefits").map_err(AppError::bad_request)?,
            "benefits",
        )?,
        recruitment_process: patch_string(&body, "recruitment_process")
            .map_err(AppError::bad_request)?
            .into_change(),
        contact_email: required_patch(
            patch_string(&body, "contact_email").map_err(AppError::bad_request)?,
            "contact_email",
        )?,
        contact_phone: patch_string(&body, "contact_phone")
            .map_err(AppError::bad_request)?
            .into_change(),
        expires_at,
        status: status.map(|s| s.as_str().to_string()),
        is_active: status.map(|s| s == OfferStatus::Active),
    };

    // Validate the merged row, not just the delta.
    let next_min = changeset.salary_min.unwrap_or(offer.salary_min);
    let next_max = changeset.salary_max.unwrap_or(offer.salary_max);
    if next_min < 0 || next_max < 0 {
        return Err(AppError::validation("salary_min", "salaries cannot be negative"));
    }
    if next_max < next_min {
        return Err(AppError::validation(
            "salary_max",
            "salary_max must be greater than or equal to salary_min",
        ));
    }
    if let Some(expiry) = changeset.expires_at {
        if expiry <= offer.published_at {
            return Err(AppError::validation(
                "expires_at",
                "expiry must be after the publication date",
            ));
        }
    }
    if let Some(title) = changeset.title.as_deref() {
        if title.trim().is_empty() {
            return Err(AppError::validation("title", "title is required"));
        }
    }

    if changeset.is_empty() {
        return Ok(Json(OfferResponse::from_offer(&offer, &company.name)));
    }

    let updated: Offer = diesel::update(offers::table.find(offer.id))
        .set(&changeset)
        .get_result(&mut conn)?;

    Ok(Json(OfferResponse::from_offer(&updated, &company.name)))
}

/// Soft delete. The row stays behind its applications for audit, it just
/// disappears from every non-owner surface.
pub async fn delete_offer(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_role(UserRole::Recruiter, "only recruiters can delete offers")?;

    let mut conn = state.db()?;
    let company = company_for_admin(&mut conn, auth.user_id)?;

    let affected = diesel::update(
        offers::table
            .filter(offers::id.eq(offer_id))
            .filter(offers::company_id.eq(company.id)),
    )
    .set((
        offers::status.eq(OfferStatus::Deleted.as_str()),
        offers::is_active.eq(false),
    ))
    .execute(&mut conn)?;

    if affected == 0 {
        return Err(AppError::not_found());
    }

    info!(offer_id = %offer_id, "offer soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recommended_offers(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<OfferResponse>>> {
    auth.require_role(UserRole::Candidate, "recommendations are for candidates")?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    let skills = profile.skill_list();
    let industries = profile.industry_list();
    if skills.is_empty() && industries.is_empty() {
        // Nothing to match on yet.
        return Ok(Json(Vec::new()));
    }

    let now = Utc::now().naive_utc();
    let mut query = offers::table
        .inner_join(companies::table)
        .filter(offers::status.eq(OfferStatus::Active.as_str()))
        .filter(offers::is_active.eq(true))
        .filter(offers::expires_at.gt(now))
        .into_boxed();

    query = match (skills.is_empty(), industries.is_empty()) {
        (false, false) => query.filter(
            offers::required_skills
                .overlaps_with(skills)
                .or(offers::sector.eq_any(industries)),
        ),
        (false, true) => query.filter(offers::required_skills.overlaps_with(skills)),
        (true, false) => query.filter(offers::sector.eq_any(industries)),
        (true, true) => unreachable!(),
    };

    let rows: Vec<(Offer, Company)> = query
        .order(offers::published_at.desc())
        .limit(RECOMMENDATION_LIMIT)
        .load(&mut conn)?;

    Ok(Json(to_responses(rows)))
}

#[derive(Serialize)]
pub struct ContractTypeCount {
    pub contract_type: String,
    pub count: i64,
}

#[derive(Serialize)]
pub struct TopOffer {
    pub id: Uuid,
    pub title: String,
    pub application_count: i64,
}

#[derive(Serialize)]
pub struct RecruiterStats {
    pub total_offers: i64,
    pub active_offers: i64,
    pub expired_offers: i64,
    pub total_applications: i64,
    pub unviewed_applications: i64,
    pub applications_this_month: i64,
    pub total_favorites: i64,
    pub offers_by_contract_type: Vec<ContractTypeCount>,
    pub top_offers: Vec<TopOffer>,
}

/// Dashboard numbers, computed on read. Soft-deleted offers are excluded
/// everywhere except the per-offer application counts they already earned.
pub async fn recruiter_stats(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<RecruiterStats>> {
    auth.require_role(UserRole::Recruiter, "stats are for recruiters")?;

    let mut conn = state.db()?;
    let company = company_for_admin(&mut conn, auth.user_id)?;
    let now = Utc::now();
    let month_start = now
        .date_naive()
        .with_day(1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_else(|| now.naive_utc());
    let now = now.naive_utc();

    let total_offers: i64 = offers::table
        .filter(offers::company_id.eq(company.id))
        .filter(offers::status.ne(OfferStatus::Deleted.as_str()))
        .count()
        .get_result(&mut conn)?;

    let active_offers: i64 = offers::table
        .filter(offers::company_id.eq(company.id))
        .filter(offers::status.eq(OfferStatus::Active.as_str()))
        .filter(offers::is_active.eq(true))
        .filter(offers::expires_at.gt(now))
        .count()
        .get_result(&mut conn)?;

    let expired_offers: i64 = offers::table
        .filter(offers::company_id.eq(company.id))
        .filter(offers::status.ne(OfferStatus::Deleted.as_str()))
        .filter(offers::expires_at.le(now))
        .count()
        .get_result(&mut conn)?;

    let total_applications: i64 = applications::table
        .inner_join(offers::table)
        .filter(offers::company_id.eq(company.id))
        .count()
        .get_result(&mut conn)?;

    let unviewed_applications: i64 = applications::table
        .inner_join(offers::table)
        .filter(offers::company_id.eq(company.id))
        .filter(applications::viewed_at.is_null())
        .count()
        .get_result(&mut conn)?;

    let applications_this_month: i64 = applications::table
        .inner_join(offers::table)
        .filter(offers::company_id.eq(company.id))
        .filter(applications::submitted_at.ge(month_start))
        .count()
        .get_result(&mut conn)?;

    let total_favorites: i64 = favorites::table
        .inner_join(offers::table)
        .filter(offers::company_id.eq(company.id))
        .count()
        .get_result(&mut conn)?;

    let offers_by_contract_type: Vec<(String, i64)> = offers::table
        .filter(offers::company_id.eq(company.id))
        .filter(offers::status.ne(OfferStatus::Deleted.as_str()))
        .group_by(offers::contract_type)
        .select((offers::contract_type, diesel::dsl::count_star()))
        .load(&mut conn)?;

    let top_offers: Vec<(Uuid, String, i64)> = applications::table
        .inner_join(offers::table)
        .filter(offers::company_id.eq(company.id))
        .group_by((offers::id, offers::title))
        .select((offers::id, offers::title, diesel::dsl::count_star()))
        .order(diesel::dsl::count_star().desc())
        .limit(5)
        .load(&mut conn)?;

    Ok(Json(RecruiterStats {
        total_offers,
        active_offers,
        expired_offers,
        total_applications,
        unviewed_applications,
        applications_this_month,
        total_favorites,
        offers_by_contract_type: offers_by_contract_type
            .into_iter()
            .map(|(contract_type, count)| ContractTypeCount {
                contract_type,
                count,
            })
            .collect(),
        top_offers: top_offers
            .into_iter()
            .map(|(id, title, application_count)| TopOffer {
                id,
                title,
                application_count,
            })
            .collect(),
    }))
}
