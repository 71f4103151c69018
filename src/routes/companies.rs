use axum::extract::{Json, Path, State};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::Company;
use crate::schema::companies;
use crate::state::AppState;

#[derive(Serialize)]
pub struct CompanyResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub sector: String,
    pub address: String,
    pub phone: Option<String>,
    pub email: String,
    pub website: Option<String>,
    pub verification_status: String,
    pub is_verified: bool,
    pub created_at: String,
}

impl CompanyResponse {
    pub fn from_company(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.clone(),
            description: company.description.clone(),
            sector: company.sector.clone(),
            address: company.address.clone(),
            phone: company.phone.clone(),
            email: company.email.clone(),
            website: company.website.clone(),
            verification_status: company.verification_status.clone(),
            is_verified: company.is_verified,
            created_at: company.created_at.and_utc().to_rfc3339(),
        }
    }
}

pub async fn list_companies(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
) -> AppResult<Json<Vec<CompanyResponse>>> {
    let mut conn = state.db()?;
    let rows: Vec<Company> = companies::table
        .order(companies::name.asc())
        .load(&mut conn)?;

    Ok(Json(rows.iter().map(CompanyResponse::from_company).collect()))
}

pub async fn get_company(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
    Path(company_id): Path<Uuid>,
) -> AppResult<Json<CompanyResponse>> {
    let mut conn = state.db()?;
    let company: Company = companies::table
        .find(company_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;

    Ok(Json(CompanyResponse::from_company(&company)))
}
