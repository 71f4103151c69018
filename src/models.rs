use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::*;

/// Closed role tag. Stored as text in `users.role`; everything that
/// dispatches on role goes through this type, never raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Candidate,
    Recruiter,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Candidate => "candidate",
            UserRole::Recruiter => "recruiter",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "candidate" => Some(UserRole::Candidate),
            "recruiter" => Some(UserRole::Recruiter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Validated,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Validated => "validated",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferStatus {
    Active,
    Expired,
    Suspended,
    Deleted,
}

impl OfferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OfferStatus::Active => "active",
            OfferStatus::Expired => "expired",
            OfferStatus::Suspended => "suspended",
            OfferStatus::Deleted => "deleted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(OfferStatus::Active),
            "expired" => Some(OfferStatus::Expired),
            "suspended" => Some(OfferStatus::Suspended),
            "deleted" => Some(OfferStatus::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Sent,
    Viewed,
    InReview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Sent => "sent",
            ApplicationStatus::Viewed => "viewed",
            ApplicationStatus::InReview => "in_review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(ApplicationStatus::Sent),
            "viewed" => Some(ApplicationStatus::Viewed),
            "in_review" => Some(ApplicationStatus::InReview),
            "accepted" => Some(ApplicationStatus::Accepted),
            "rejected" => Some(ApplicationStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_verified: bool,
    pub available: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn role(&self) -> Option<UserRole> {
        UserRole::parse(&self.role)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = candidate_profiles)]
#[diesel(belongs_to(User))]
pub struct CandidateProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_title: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub location: Option<String>,
    pub experience_years: Option<i32>,
    pub expected_salary: Option<i64>,
    pub contract_type: Option<String>,
    pub photo_key: Option<String>,
    pub cv_key: Option<String>,
    pub cv_filename: Option<String>,
    pub preferred_job_type: Option<String>,
    pub experience_level: Option<String>,
    pub salary_range_min: Option<i32>,
    pub salary_range_max: Option<i32>,
    pub preferred_work_location: Option<String>,
    pub remote_work: bool,
    pub preferred_industries: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl CandidateProfile {
    /// Fraction of tracked fields that are filled in, as a percentage.
    ///
    /// The tracked set is fixed: nine profile fields plus the linked user's
    /// first name, last name and phone. Blank strings do not count as
    /// filled, so re-saving unchanged values never moves the number.
    pub fn completion_percentage(&self, user: &User) -> f64 {
        let profile_fields = [
            filled_text(self.job_title.as_deref()),
            self.experience_years.is_some(),
            filled_text(self.skills.as_deref()),
            filled_text(self.bio.as_deref()),
            self.expected_salary.is_some(),
            filled_text(self.location.as_deref()),
            filled_text(self.contract_type.as_deref()),
            filled_text(self.photo_key.as_deref()),
            filled_text(self.cv_key.as_deref()),
        ];
        let user_fields = [
            filled_text(user.first_name.as_deref()),
            filled_text(user.last_name.as_deref()),
            filled_text(user.phone.as_deref()),
        ];

        let total = profile_fields.len() + user_fields.len();
        let filled = profile_fields.iter().filter(|f| **f).count()
            + user_fields.iter().filter(|f| **f).count();
        filled as f64 / total as f64 * 100.0
    }

    /// Declared skills, split out of the comma-separated storage form.
    pub fn skill_list(&self) -> Vec<String> {
        split_csv(self.skills.as_deref())
    }

    pub fn industry_list(&self) -> Vec<String> {
        split_csv(self.preferred_industries.as_deref())
    }
}

fn filled_text(value: Option<&str>) -> bool {
    value.is_some_and(|s| !s.trim().is_empty())
}

pub fn split_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|raw| {
            raw.split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Debug, Insertable)]
#[diesel(table_name = candidate_profiles)]
pub struct NewCandidateProfile {
    pub id: Uuid,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = companies)]
pub struct Company {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub name: String,
    pub description: String,
    pub sector: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: String,
    pub website: Option<String>,
    pub verification_status: String,
    pub is_verified: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = companies)]
pub struct NewCompany {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub name: String,
    pub description: String,
    pub sector: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: String,
    pub website: Option<String>,
    pub verification_status: String,
    pub is_verified: bool,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = offers)]
#[diesel(belongs_to(Company))]
pub struct Offer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub sector: String,
    pub required_skills: Vec<String>,
    pub location: String,
    pub contract_type: String,
    pub duration_months: i32,
    pub salary_min: i64,
    pub salary_max: i64,
    pub salary_text: Option<String>,
    pub education_level: String,
    pub experience_level: String,
    pub experience_years: i32,
    pub benefits: Vec<String>,
    pub recruitment_process: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub published_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub status: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Offer {
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        now > self.expires_at
    }

    /// Human-readable salary line. Free text wins over the numeric range.
    pub fn salary_display(&self) -> String {
        if let Some(text) = self.salary_text.as_deref() {
            if !text.trim().is_empty() {
                return text.to_string();
            }
        }
        if self.salary_min == 0 && self.salary_max == 0 {
            return "unspecified".to_string();
        }
        if self.salary_min == self.salary_max {
            return format!("{}", self.salary_min);
        }
        format!("{} - {}", self.salary_min, self.salary_max)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = offers)]
pub struct NewOffer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub title: String,
    pub description: String,
    pub sector: String,
    pub required_skills: Vec<String>,
    pub location: String,
    pub contract_type: String,
    pub duration_months: i32,
    pub salary_min: i64,
    pub salary_max: i64,
    pub salary_text: Option<String>,
    pub education_level: String,
    pub experience_level: String,
    pub experience_years: i32,
    pub benefits: Vec<String>,
    pub recruitment_process: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub published_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub status: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = applications)]
#[diesel(belongs_to(CandidateProfile, foreign_key = candidate_id))]
#[diesel(belongs_to(Offer, foreign_key = offer_id))]
pub struct Application {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub offer_id: Uuid,
    pub cv_key: String,
    pub cover_letter: Option<String>,
    pub status: String,
    pub submitted_at: NaiveDateTime,
    pub viewed_at: Option<NaiveDateTime>,
    pub matching_score: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = applications)]
pub struct NewApplication {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub offer_id: Uuid,
    pub cv_key: String,
    pub cover_letter: Option<String>,
    pub status: String,
    pub matching_score: f64,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = favorites)]
#[diesel(belongs_to(CandidateProfile, foreign_key = candidate_id))]
#[diesel(belongs_to(Offer, foreign_key = offer_id))]
pub struct Favorite {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub offer_id: Uuid,
    pub added_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = favorites)]
pub struct NewFavorite {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub offer_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = auth_tokens)]
#[diesel(belongs_to(User))]
pub struct AuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = auth_tokens)]
pub struct NewAuthToken {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: NaiveDateTime,
}
