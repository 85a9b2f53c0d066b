use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use chrono::{Duration, Utc};
use diesel::prelude::*;
use rand::RngCore;
use std::sync::Arc;
use tower_cookies::Cookies;
use uuid::Uuid;

use super::Session;
use crate::shared::error::ApiError;
use crate::shared::models::schema::access_code_sessions;
use crate::shared::state::AppState;

pub const SESSION_COOKIE: &str = "session_id";
const SESSION_TTL_DAYS: i64 = 7;

/// 256 bits of entropy, hex-encoded.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issue a session bound to a company and its access code. Expiry is
/// fixed at issuance; there is no rotation or sliding renewal.
pub fn create_session(
    conn: &mut PgConnection,
    company_id: Uuid,
    access_code: &str,
) -> Result<Session, ApiError> {
    let now = Utc::now();
    let session = Session {
        id: generate_session_token(),
        company_id,
        access_code: access_code.to_string(),
        created_at: now,
        expires_at: now + Duration::days(SESSION_TTL_DAYS),
    };
    diesel::insert_into(access_code_sessions::table)
        .values(&session)
        .execute(conn)?;
    Ok(session)
}

/// Resolve a token to its session. Unknown and expired tokens both
/// report unauthenticated; expiry is checked strictly.
pub fn validate_session(conn: &mut PgConnection, token: &str) -> Result<Session, ApiError> {
    let session = access_code_sessions::table
        .find(token)
        .first::<Session>(conn)
        .optional()?;
    match session {
        Some(session) if session.is_valid_at(Utc::now()) => Ok(session),
        _ => Err(ApiError::Unauthorized(
            "invalid or expired session".to_string(),
        )),
    }
}

/// Delete a session row outright (logout). Expired rows may also be
/// deleted lazily; expiry alone already invalidates them.
pub fn delete_session(conn: &mut PgConnection, token: &str) -> Result<(), ApiError> {
    diesel::delete(access_code_sessions::table.find(token)).execute(conn)?;
    Ok(())
}

/// Authenticated company extracted from the session cookie. Every
/// company-scoped handler takes this; missing or invalid sessions are
/// rejected before the handler runs.
#[derive(Debug, Clone)]
pub struct SessionCompany {
    pub company_id: Uuid,
    pub access_code: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionCompany
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .extract::<Cookies>()
            .await
            .map_err(|_| ApiError::Unauthorized("no session cookie".to_string()))?;
        let token = cookies
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| ApiError::Unauthorized("no session cookie".to_string()))?;

        let state = Arc::<AppState>::from_ref(state);
        let mut conn = state.conn.get()?;
        let session = validate_session(&mut conn, &token)?;
        Ok(SessionCompany {
            company_id: session.company_id,
            access_code: session.access_code,
        })
    }
}
