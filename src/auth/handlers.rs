use axum::{extract::State, Json};
use diesel::dsl::exists;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_cookies::{
    cookie::{time::Duration, Cookie, SameSite},
    Cookies,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::session::{create_session, delete_session, SessionCompany, SESSION_COOKIE};
use super::{access_code::verify_access_code, Company};
use crate::shared::error::ApiError;
use crate::shared::models::schema::{companies, company_settings};
use crate::shared::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub access_code: String,
}

#[derive(Serialize)]
pub struct CompanyInfo {
    pub id: Uuid,
    pub access_code: String,
    pub company_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub logo_url: Option<String>,
    pub is_trial: bool,
    pub quote_limit: Option<i32>,
}

impl From<Company> for CompanyInfo {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            access_code: company.access_code,
            company_name: company.company_name,
            email: company.email,
            phone: company.phone,
            logo_url: company.logo_url,
            is_trial: company.is_trial,
            quote_limit: company.quote_limit,
        }
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub company: CompanyInfo,
    pub needs_onboarding: bool,
}

/// Whether the company still has to set up its cost settings. Query
/// failures report `true` so the caller shows onboarding rather than
/// blocking access; this is the one deliberately fail-open check.
pub fn needs_onboarding(conn: &mut PgConnection, company_id: Uuid) -> bool {
    let has_settings = diesel::select(exists(
        company_settings::table.filter(company_settings::company_id.eq(company_id)),
    ))
    .get_result::<bool>(conn);
    match has_settings {
        Ok(has) => !has,
        Err(e) => {
            warn!("onboarding check failed for company {company_id}: {e}");
            true
        }
    }
}

/// Cookie max age matches the 7-day session row expiry so the browser
/// does not drop the cookie while the server-side session is still live.
fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(7))
        .build()
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut conn = state.conn.get()?;
    let company = verify_access_code(&mut conn, &req.access_code)
        .ok_or_else(|| ApiError::NotFound("no company for access code".to_string()))?;

    let session = create_session(&mut conn, company.id, &company.access_code)?;
    cookies.add(session_cookie(session.id));
    info!(
        "company {} authenticated with access code {}",
        company.id, company.access_code
    );

    let needs_onboarding = needs_onboarding(&mut conn, company.id);
    Ok(Json(LoginResponse {
        company: company.into(),
        needs_onboarding,
    }))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
) -> Result<Json<serde_json::Value>, ApiError> {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        let mut conn = state.conn.get()?;
        delete_session(&mut conn, cookie.value())?;
    }
    cookies.remove(session_cookie(String::new()));
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut conn = state.conn.get()?;
    let company = companies::table
        .find(auth.company_id)
        .first::<Company>(&mut conn)?;
    let needs_onboarding = needs_onboarding(&mut conn, company.id);
    Ok(Json(LoginResponse {
        company: company.into(),
        needs_onboarding,
    }))
}
