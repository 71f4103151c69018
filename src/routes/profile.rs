use std::time::Duration;

use axum::extract::{Json, Multipart, State};
use axum::http::StatusCode;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{CandidateProfile, NewCandidateProfile, User, UserRole};
use crate::schema::{candidate_profiles, users};
use crate::state::AppState;
use crate::utils::json::{patch_bool, patch_i32, patch_i64, patch_string, Patch};

use super::auth::UserResponse;

/// Fetches the candidate profile for a user, creating an empty one when
/// missing. The unique index on user_id makes the create half race-safe:
/// a concurrent insert loses silently and the winner's row is returned.
pub fn get_or_create_profile(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> AppResult<CandidateProfile> {
    if let Some(profile) = candidate_profiles::table
        .filter(candidate_profiles::user_id.eq(user_id))
        .first::<CandidateProfile>(conn)
        .optional()?
    {
        return Ok(profile);
    }

    diesel::insert_into(candidate_profiles::table)
        .values(&NewCandidateProfile {
            id: Uuid::new_v4(),
            user_id,
        })
        .on_conflict(candidate_profiles::user_id)
        .do_nothing()
        .execute(conn)?;

    Ok(candidate_profiles::table
        .filter(candidate_profiles::user_id.eq(user_id))
        .first(conn)?)
}

#[derive(Serialize)]
pub struct CandidateProfileResponse {
    pub id: Uuid,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub location: Option<String>,
    pub experience_years: Option<i32>,
    pub expected_salary: Option<i64>,
    pub contract_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_url: Option<String>,
    pub cv_filename: Option<String>,
    pub preferred_job_type: Option<String>,
    pub experience_level: Option<String>,
    pub salary_range_min: Option<i32>,
    pub salary_range_max: Option<i32>,
    pub preferred_work_location: Option<String>,
    pub remote_work: bool,
    pub preferred_industries: Option<String>,
    pub completion_percentage: f64,
}

/// Builds the outward profile shape. File fields are presigned URLs; the
/// raw object keys never leave the service.
pub async fn candidate_payload(
    state: &AppState,
    profile: &CandidateProfile,
    user: &User,
) -> AppResult<CandidateProfileResponse> {
    let expiry = Duration::from_secs(state.config.upload_url_expiry_minutes * 60);

    let photo_url = match profile.photo_key.as_deref() {
        Some(key) => Some(state.storage.presign_get_object(key, expiry).await?),
        None => None,
    };
    let cv_url = match profile.cv_key.as_deref() {
        Some(key) => Some(state.storage.presign_get_object(key, expiry).await?),
        None => None,
    };

    Ok(CandidateProfileResponse {
        id: profile.id,
        job_title: profile.job_title.clone(),
        bio: profile.bio.clone(),
        skills: profile.skills.clone(),
        location: profile.location.clone(),
        experience_years: profile.experience_years,
        expected_salary: profile.expected_salary,
        contract_type: profile.contract_type.clone(),
        photo_url,
        cv_url,
        cv_filename: profile.cv_filename.clone(),
        preferred_job_type: profile.preferred_job_type.clone(),
        experience_level: profile.experience_level.clone(),
        salary_range_min: profile.salary_range_min,
        salary_range_max: profile.salary_range_max,
        preferred_work_location: profile.preferred_work_location.clone(),
        remote_work: profile.remote_work,
        preferred_industries: profile.preferred_industries.clone(),
        completion_percentage: profile.completion_percentage(user),
    })
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = users)]
struct UserInfoChangeset {
    first_name: Option<Option<String>>,
    last_name: Option<Option<String>>,
    phone: Option<Option<String>>,
}

pub async fn update_user_info(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<Value>,
) -> AppResult<Json<UserResponse>> {
    let changeset = UserInfoChangeset {
        first_name: patch_string(&body, "first_name")
            .map_err(AppError::bad_request)?
            .into_change(),
        last_name: patch_string(&body, "last_name")
            .map_err(AppError::bad_request)?
            .into_change(),
        phone: patch_string(&body, "phone")
            .map_err(AppError::bad_request)?
            .into_change(),
    };

    let mut conn = state.db()?;

    if changeset.first_name.is_none() && changeset.last_name.is_none() && changeset.phone.is_none()
    {
        let user: User = users::table.find(auth.user_id).first(&mut conn)?;
        return Ok(Json(UserResponse::from_user(&user)?));
    }

    let updated = diesel::update(users::table.find(auth.user_id))
        .set(&changeset)
        .get_result::<User>(&mut conn);

    match updated {
        Ok(user) => Ok(Json(UserResponse::from_user(&user)?)),
        Err(diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            Err(AppError::conflict("phone is already registered"))
        }
        Err(err) => Err(AppError::from(err)),
    }
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = candidate_profiles)]
struct CandidateInfoChangeset {
    job_title: Option<Option<String>>,
    bio: Option<Option<String>>,
    skills: Option<Option<String>>,
    location: Option<Option<String>>,
    experience_years: Option<Option<i32>>,
    expected_salary: Option<Option<i64>>,
    contract_type: Option<Option<String>>,
}

impl CandidateInfoChangeset {
    fn is_empty(&self) -> bool {
        self.job_title.is_none()
            && self.bio.is_none()
            && self.skills.is_none()
            && self.location.is_none()
            && self.experience_years.is_none()
            && self.expected_salary.is_none()
            && self.contract_type.is_none()
    }
}

pub async fn update_candidate_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<Value>,
) -> AppResult<Json<CandidateProfileResponse>> {
    auth.require_role(UserRole::Candidate, "only candidates have a candidate profile")?;

    let changeset = CandidateInfoChangeset {
        job_title: patch_string(&body, "job_title")
            .map_err(AppError::bad_request)?
            .into_change(),
        bio: patch_string(&body, "bio")
            .map_err(AppError::bad_request)?
            .into_change(),
        skills: patch_string(&body, "skills")
            .map_err(AppError::bad_request)?
            .into_change(),
        location: patch_string(&body, "location")
            .map_err(AppError::bad_request)?
            .into_change(),
        experience_years: patch_i32(&body, "experience_years")
            .map_err(AppError::bad_request)?
            .into_change(),
        expected_salary: patch_i64(&body, "expected_salary")
            .map_err(AppError::bad_request)?
            .into_change(),
        contract_type: patch_string(&body, "contract_type")
            .map_err(AppError::bad_request)?
            .into_change(),
    };

    let mut conn = state.db()?;
    let user: User = users::table.find(auth.user_id).first(&mut conn)?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    let profile = if changeset.is_empty() {
        profile
    } else {
        diesel::update(candidate_profiles::table.find(profile.id))
            .set(&changeset)
            .get_result::<CandidateProfile>(&mut conn)?
    };

    Ok(Json(candidate_payload(&state, &profile, &user).await?))
}

#[derive(AsChangeset, Default)]
#[diesel(table_name = candidate_profiles)]
struct JobPreferencesChangeset {
    preferred_job_type: Option<Option<String>>,
    experience_level: Option<Option<String>>,
    salary_range_min: Option<Option<i32>>,
    salary_range_max: Option<Option<i32>>,
    preferred_work_location: Option<Option<String>>,
    remote_work: Option<bool>,
    preferred_industries: Option<Option<String>>,
}

impl JobPreferencesChangeset {
    fn is_empty(&self) -> bool {
        self.preferred_job_type.is_none()
            && self.experience_level.is_none()
            && self.salary_range_min.is_none()
            && self.salary_range_max.is_none()
            && self.preferred_work_location.is_none()
            && self.remote_work.is_none()
            && self.preferred_industries.is_none()
    }
}

pub async fn update_job_preferences(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(body): Json<Value>,
) -> AppResult<Json<CandidateProfileResponse>> {
    auth.require_role(UserRole::Candidate, "only candidates have job preferences")?;

    let remote_work = match patch_bool(&body, "remote_work").map_err(AppError::bad_request)? {
        Patch::Omitted => None,
        Patch::Null => {
            return Err(AppError::validation("remote_work", "remote_work cannot be null"))
        }
        Patch::Value(v) => Some(v),
    };

    let changeset = JobPreferencesChangeset {
        preferred_job_type: patch_string(&body, "preferred_job_type")
            .map_err(AppError::bad_request)?
            .into_change(),
        experience_level: patch_string(&body, "experience_level")
            .map_err(AppError::bad_request)?
            .into_change(),
        salary_range_min: patch_i32(&body, "salary_range_min")
            .map_err(AppError::bad_request)?
            .into_change(),
        salary_range_max: patch_i32(&body, "salary_range_max")
            .map_err(AppError::bad_request)?
            .into_change(),
        preferred_work_location: patch_string(&body, "preferred_work_location")
            .map_err(AppError::bad_request)?
            .into_change(),
        remote_work,
        preferred_industries: patch_string(&body, "preferred_industries")
            .map_err(AppError::bad_request)?
            .into_change(),
    };

    let mut conn = state.db()?;
    let user: User = users::table.find(auth.user_id).first(&mut conn)?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    let profile = if changeset.is_empty() {
        profile
    } else {
        diesel::update(candidate_profiles::table.find(profile.id))
            .set(&changeset)
            .get_result::<CandidateProfile>(&mut conn)?
    };

    Ok(Json(candidate_payload(&state, &profile, &user).await?))
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub available: bool,
}

pub async fn update_availability(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(payload): Json<AvailabilityRequest>,
) -> AppResult<Json<AvailabilityResponse>> {
    auth.require_role(UserRole::Candidate, "only candidates declare availability")?;

    let mut conn = state.db()?;
    diesel::update(users::table.find(auth.user_id))
        .set(users::available.eq(payload.available))
        .execute(&mut conn)?;

    Ok(Json(AvailabilityResponse {
        available: payload.available,
    }))
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
}

struct UploadedFile {
    bytes: Vec<u8>,
    filename: String,
    content_type: Option<String>,
}

async fn read_upload(mut multipart: Multipart, field_name: &str) -> AppResult<UploadedFile> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart body: {err}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| mime_guess::from_path(&filename).first().map(|m| m.to_string()));
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(format!("failed to read upload: {err}")))?
            .to_vec();

        if bytes.is_empty() {
            return Err(AppError::validation(field_name, "uploaded file is empty"));
        }

        return Ok(UploadedFile {
            bytes,
            filename,
            content_type,
        });
    }

    Err(AppError::validation(
        field_name,
        format!("multipart field '{field_name}' is required"),
    ))
}

fn attachment_content_disposition(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .map(|ch| match ch {
            '"' | '\\' => '_',
            _ => ch,
        })
        .collect();
    let encoded =
        percent_encoding::utf8_percent_encode(&sanitized, percent_encoding::NON_ALPHANUMERIC);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

pub async fn upload_photo(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    auth.require_role(UserRole::Candidate, "only candidates have a profile photo")?;
    let upload = read_upload(multipart, "photo").await?;

    let key = format!(
        "profile_photos/{}/{}-{}",
        auth.user_id,
        Uuid::new_v4(),
        upload.filename
    );

    state
        .storage
        .put_object(&key, upload.bytes, upload.content_type, None)
        .await?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;
    let previous = profile.photo_key.clone();

    diesel::update(candidate_profiles::table.find(profile.id))
        .set(candidate_profiles::photo_key.eq(Some(key.clone())))
        .execute(&mut conn)?;

    if let Some(old_key) = previous {
        // Replacing the photo orphans the old object; drop it best-effort.
        if let Err(err) = state.storage.delete_object(&old_key).await {
            tracing::warn!(key = %old_key, error = %err, "failed to delete replaced photo");
        }
    }

    let expiry = Duration::from_secs(state.config.upload_url_expiry_minutes * 60);
    let url = state.storage.presign_get_object(&key, expiry).await?;

    info!(user_id = %auth.user_id, "profile photo updated");
    Ok(Json(UploadResponse { url }))
}

pub async fn upload_cv(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    auth.require_role(UserRole::Candidate, "only candidates upload CVs")?;
    let upload = read_upload(multipart, "cv").await?;

    let key = format!(
        "cv_files/{}/{}-{}",
        auth.user_id,
        Uuid::new_v4(),
        upload.filename
    );
    let disposition = attachment_content_disposition(&upload.filename);

    state
        .storage
        .put_object(&key, upload.bytes, upload.content_type, Some(disposition))
        .await?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;
    let previous = profile.cv_key.clone();

    diesel::update(candidate_profiles::table.find(profile.id))
        .set((
            candidate_profiles::cv_key.eq(Some(key.clone())),
            candidate_profiles::cv_filename.eq(Some(upload.filename.clone())),
        ))
        .execute(&mut conn)?;

    if let Some(old_key) = previous {
        if let Err(err) = state.storage.delete_object(&old_key).await {
            tracing::warn!(key = %old_key, error = %err, "failed to delete replaced CV");
        }
    }

    let expiry = Duration::from_secs(state.config.upload_url_expiry_minutes * 60);
    let url = state.storage.presign_get_object(&key, expiry).await?;

    info!(user_id = %auth.user_id, filename = %upload.filename, "CV updated");
    Ok(Json(UploadResponse { url }))
}

#[derive(Serialize)]
pub struct CvEntry {
    pub name: String,
    pub url: String,
    pub uploaded_at: String,
}

#[derive(Serialize)]
pub struct CvListResponse {
    pub cvs: Vec<CvEntry>,
}

pub async fn list_cvs(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<CvListResponse>> {
    auth.require_role(UserRole::Candidate, "only candidates have CVs")?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    let mut cvs = Vec::new();
    if let Some(key) = profile.cv_key.as_deref() {
        let expiry = Duration::from_secs(state.config.upload_url_expiry_minutes * 60);
        let url = state.storage.presign_get_object(key, expiry).await?;
        cvs.push(CvEntry {
            name: profile
                .cv_filename
                .clone()
                .unwrap_or_else(|| format!("CV_{}.pdf", auth.username)),
            url,
            uploaded_at: profile.updated_at.and_utc().to_rfc3339(),
        });
    }

    Ok(Json(CvListResponse { cvs }))
}

pub async fn delete_cv(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<StatusCode> {
    auth.require_role(UserRole::Candidate, "only candidates have CVs")?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    let Some(key) = profile.cv_key.clone() else {
        return Ok(StatusCode::NO_CONTENT);
    };

    diesel::update(candidate_profiles::table.find(profile.id))
        .set((
            candidate_profiles::cv_key.eq(None::<String>),
            candidate_profiles::cv_filename.eq(None::<String>),
        ))
        .execute(&mut conn)?;

    if let Err(err) = state.storage.delete_object(&key).await {
        tracing::warn!(key = %key, error = %err, "failed to delete CV object");
    }

    Ok(StatusCode::NO_CONTENT)
}
