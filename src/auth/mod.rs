pub mod password;
pub mod token;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::TypedHeader;
use chrono::Utc;
use diesel::prelude::*;

use crate::{
    error::AppError,
    models::UserRole,
    schema::{auth_tokens, users},
    state::AppState,
};

/// Authenticated identity, resolved from the bearer token on every request
/// and threaded explicitly into handlers. The token hash is kept so logout
/// can revoke exactly the presenting token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: uuid::Uuid,
    pub username: String,
    pub role: UserRole,
    pub token_hash: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| AppError::unauthorized())?;

        let hashed = token::hash_token(bearer.token());
        let mut conn = state.db()?;
        let now = Utc::now().naive_utc();

        let row = auth_tokens::table
            .inner_join(users::table)
            .filter(auth_tokens::token_hash.eq(&hashed))
            .filter(auth_tokens::revoked_at.is_null())
            .filter(auth_tokens::expires_at.gt(now))
            .select((users::id, users::username, users::role))
            .first::<(uuid::Uuid, String, String)>(&mut conn)
            .optional()?;

        let (user_id, username, role) = row.ok_or_else(AppError::unauthorized)?;
        let role = UserRole::parse(&role).ok_or_else(AppError::unauthorized)?;

        Ok(AuthenticatedUser {
            user_id,
            username,
            role,
            token_hash: hashed,
        })
    }
}

impl AuthenticatedUser {
    pub fn require_role(&self, role: UserRole, message: &str) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AppError::forbidden(message))
        }
    }
}
