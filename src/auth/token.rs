use chrono::{Duration as ChronoDuration, Utc};
use diesel::prelude::*;
use diesel::PgConnection;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::NewAuthToken;
use crate::schema::auth_tokens;

/// Issues a fresh opaque token for the user and stores only its hash.
/// Returns the cleartext value exactly once, for the response body.
pub fn issue_token(
    conn: &mut PgConnection,
    user_id: Uuid,
    expiry_days: i64,
) -> AppResult<String> {
    let value = generate_token();
    let expires_at = Utc::now() + ChronoDuration::days(expiry_days);

    let new_token = NewAuthToken {
        id: Uuid::new_v4(),
        user_id,
        token_hash: hash_token(&value),
        expires_at: expires_at.naive_utc(),
    };

    diesel::insert_into(auth_tokens::table)
        .values(&new_token)
        .execute(conn)?;

    Ok(value)
}

/// Revokes the token with the given hash; a no-op when already revoked.
pub fn revoke_token(conn: &mut PgConnection, token_hash: &str) -> AppResult<()> {
    let now = Utc::now().naive_utc();
    diesel::update(
        auth_tokens::table
            .filter(auth_tokens::token_hash.eq(token_hash))
            .filter(auth_tokens::revoked_at.is_null()),
    )
    .set(auth_tokens::revoked_at.eq(now))
    .execute(conn)?;
    Ok(())
}

/// Revokes every live token of the user except the one presented.
/// Used after a password change.
pub fn revoke_other_tokens(
    conn: &mut PgConnection,
    user_id: Uuid,
    keep_hash: &str,
) -> AppResult<()> {
    let now = Utc::now().naive_utc();
    diesel::update(
        auth_tokens::table
            .filter(auth_tokens::user_id.eq(user_id))
            .filter(auth_tokens::token_hash.ne(keep_hash))
            .filter(auth_tokens::revoked_at.is_null()),
    )
    .set(auth_tokens::revoked_at.eq(now))
    .execute(conn)?;
    Ok(())
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_is_stable_and_hex() {
        let a = hash_token("abc");
        let b = hash_token("abc");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(generate_token(), generate_token());
    }
}
