use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthenticatedUser;
use crate::error::{AppError, AppResult};
use crate::models::{Company, Favorite, NewFavorite, Offer, OfferStatus, UserRole};
use crate::schema::{companies, favorites, offers};
use crate::state::AppState;

use super::offers::OfferResponse;
use super::profile::get_or_create_profile;

#[derive(Serialize)]
pub struct FavoriteEntry {
    pub added_at: String,
    pub offer: OfferResponse,
}

pub async fn list_favorites(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Json<Vec<FavoriteEntry>>> {
    auth.require_role(UserRole::Candidate, "only candidates keep favorites")?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    let rows: Vec<(Favorite, (Offer, Company))> = favorites::table
        .inner_join(offers::table.inner_join(companies::table))
        .filter(favorites::candidate_id.eq(profile.id))
        .filter(offers::status.ne(OfferStatus::Deleted.as_str()))
        .order(favorites::added_at.desc())
        .load(&mut conn)?;

    Ok(Json(
        rows.iter()
            .map(|(favorite, (offer, company))| FavoriteEntry {
                added_at: favorite.added_at.and_utc().to_rfc3339(),
                offer: OfferResponse::from_offer(offer, &company.name),
            })
            .collect(),
    ))
}

#[derive(Serialize)]
pub struct FavoriteStatus {
    pub favorited: bool,
}

/// Idempotent add. Re-favoriting an offer is a 200 no-op.
pub async fn add_favorite(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
) -> AppResult<(StatusCode, Json<FavoriteStatus>)> {
    auth.require_role(UserRole::Candidate, "only candidates keep favorites")?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    let offer: Offer = offers::table
        .find(offer_id)
        .first(&mut conn)
        .optional()?
        .ok_or_else(AppError::not_found)?;
    if offer.status == OfferStatus::Deleted.as_str() {
        return Err(AppError::not_found());
    }

    let inserted = diesel::insert_into(favorites::table)
        .values(&NewFavorite {
            id: Uuid::new_v4(),
            candidate_id: profile.id,
            offer_id: offer.id,
        })
        .on_conflict((favorites::candidate_id, favorites::offer_id))
        .do_nothing()
        .execute(&mut conn)?;

    let status = if inserted > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(FavoriteStatus { favorited: true })))
}

/// Idempotent remove; deleting an absent favorite still succeeds.
pub async fn remove_favorite(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(offer_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    auth.require_role(UserRole::Candidate, "only candidates keep favorites")?;

    let mut conn = state.db()?;
    let profile = get_or_create_profile(&mut conn, auth.user_id)?;

    diesel::delete(
        favorites::table
            .filter(favorites::candidate_id.eq(profile.id))
            .filter(favorites::offer_id.eq(offer_id)),
    )
    .execute(&mut conn)?;

    Ok(StatusCode::NO_CONTENT)
}
