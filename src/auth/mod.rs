//! Access-code authentication and session lifecycle.
//!
//! Companies authenticate with a shared access code rather than per-user
//! credentials. A successful verification issues an opaque session token
//! carried in a cookie and persisted with a 7-day expiry.

pub mod access_code;
pub mod handlers;
pub mod session;

use axum::{
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::shared::models::schema::{access_code_sessions, companies};
use crate::shared::state::AppState;

pub use access_code::{normalize_access_code, verify_access_code};
pub use session::{create_session, validate_session, SessionCompany, SESSION_COOKIE};

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = companies)]
pub struct Company {
    pub id: Uuid,
    pub access_code: String,
    pub company_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
    pub is_trial: bool,
    pub quote_limit: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = access_code_sessions)]
pub struct Session {
    pub id: String,
    pub company_id: Uuid,
    pub access_code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is valid strictly before its expiry instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        .route("/api/auth/me", get(handlers::me))
}
