//! Quote record lifecycle: create, list, read, patch (with derived-field
//! recompute), and soft delete. Status moves only when a caller supplies
//! a target status; nothing in the system transitions a quote on its own.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::{Company, SessionCompany};
use crate::customers::upsert_customer;
use crate::pricing::{self, PricingInputs};
use crate::shared::error::ApiError;
use crate::shared::models::schema::{companies, quotes};
use crate::shared::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    Draft,
    Pending,
    Sent,
    Accepted,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Allowed transitions. Setting the current status again is a no-op
    /// and always permitted.
    pub fn can_transition_to(self, next: QuoteStatus) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Self::Draft, Self::Pending)
                | (Self::Draft, Self::Sent)
                | (Self::Pending, Self::Sent)
                | (Self::Sent, Self::Accepted)
                | (Self::Sent, Self::Rejected)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = quotes)]
pub struct Quote {
    pub id: Uuid,
    pub company_id: Uuid,
    pub customer_id: Uuid,
    pub quote_number: String,
    pub project_type: Option<String>,
    pub status: String,
    pub surfaces: serde_json::Value,
    pub paint_products: serde_json::Value,
    pub settings_snapshot: serde_json::Value,
    pub materials_cost: BigDecimal,
    pub labor_cost: BigDecimal,
    pub markup_percentage: BigDecimal,
    pub tax_rate: BigDecimal,
    pub tax_on_materials_only: bool,
    pub subtotal: BigDecimal,
    pub markup_amount: BigDecimal,
    pub tax_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub version: i32,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn pricing_inputs(&self) -> PricingInputs {
        PricingInputs {
            materials_cost: self.materials_cost.clone(),
            labor_cost: self.labor_cost.clone(),
            markup_percentage: self.markup_percentage.clone(),
            tax_rate: self.tax_rate.clone(),
            tax_on_materials_only: self.tax_on_materials_only,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

fn default_json_array() -> serde_json::Value {
    serde_json::Value::Array(Vec::new())
}

fn default_json_object() -> serde_json::Value {
    serde_json::json!({})
}

#[derive(Debug, Deserialize)]
pub struct CreateQuoteRequest {
    pub customer: CustomerInput,
    pub project_type: Option<String>,
    #[serde(default = "default_json_array")]
    pub surfaces: serde_json::Value,
    #[serde(default = "default_json_object")]
    pub paint_products: serde_json::Value,
    #[serde(default = "default_json_object")]
    pub settings_snapshot: serde_json::Value,
    #[serde(flatten)]
    pub pricing: PricingInputs,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateQuoteRequest {
    pub status: Option<String>,
    pub project_type: Option<String>,
    pub surfaces: Option<serde_json::Value>,
    pub paint_products: Option<serde_json::Value>,
    pub settings_snapshot: Option<serde_json::Value>,
    pub materials_cost: Option<BigDecimal>,
    pub labor_cost: Option<BigDecimal>,
    pub markup_percentage: Option<BigDecimal>,
    pub tax_rate: Option<BigDecimal>,
    pub tax_on_materials_only: Option<bool>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    /// Version the caller read. When present, the update is rejected with
    /// a conflict if the row has moved on; when absent the write is
    /// last-write-wins.
    pub version: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/quotes", get(list_quotes).post(create_quote))
        .route(
            "/api/quotes/:id",
            get(get_quote).patch(update_quote).delete(delete_quote),
        )
}

/// Sequential per company, over all rows including soft-deleted ones so
/// numbers are never reissued. Two creates racing to the same number hit
/// the unique (company_id, quote_number) constraint; the loser gets a
/// conflict rather than a duplicate.
fn generate_quote_number(conn: &mut PgConnection, company_id: Uuid) -> Result<String, ApiError> {
    let count: i64 = quotes::table
        .filter(quotes::company_id.eq(company_id))
        .count()
        .get_result(conn)?;
    Ok(format!("Q-{:06}", count + 1))
}

fn enforce_quote_limit(conn: &mut PgConnection, company: &Company) -> Result<(), ApiError> {
    if !company.is_trial {
        return Ok(());
    }
    let Some(limit) = company.quote_limit else {
        return Ok(());
    };
    let existing: i64 = quotes::table
        .filter(quotes::company_id.eq(company.id))
        .filter(quotes::deleted_at.is_null())
        .count()
        .get_result(conn)?;
    if existing >= i64::from(limit) {
        return Err(ApiError::Forbidden(format!(
            "trial quote limit of {limit} reached"
        )));
    }
    Ok(())
}

fn load_quote(
    conn: &mut PgConnection,
    company_id: Uuid,
    id: Uuid,
) -> Result<Quote, ApiError> {
    quotes::table
        .filter(quotes::company_id.eq(company_id))
        .filter(quotes::id.eq(id))
        .filter(quotes::deleted_at.is_null())
        .first::<Quote>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("quote not found".to_string()))
}

pub async fn create_quote(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
    Json(req): Json<CreateQuoteRequest>,
) -> Result<Json<Quote>, ApiError> {
    let mut conn = state.conn.get()?;
    let company = companies::table
        .find(auth.company_id)
        .first::<Company>(&mut conn)?;
    enforce_quote_limit(&mut conn, &company)?;

    let customer = upsert_customer(
        &mut conn,
        company.id,
        &req.customer.name,
        &req.customer.email,
        req.customer.phone.as_deref(),
        req.customer.address.as_deref(),
    )?;

    let quote_number = generate_quote_number(&mut conn, company.id)?;
    let breakdown = pricing::compute(&req.pricing).rounded();
    let now = Utc::now();
    let quote = Quote {
        id: Uuid::new_v4(),
        company_id: company.id,
        customer_id: customer.id,
        quote_number,
        project_type: req.project_type,
        status: QuoteStatus::Draft.as_str().to_string(),
        surfaces: req.surfaces,
        paint_products: req.paint_products,
        settings_snapshot: req.settings_snapshot,
        materials_cost: req.pricing.materials_cost.clone(),
        labor_cost: req.pricing.labor_cost.clone(),
        markup_percentage: req.pricing.markup_percentage.clone(),
        tax_rate: req.pricing.tax_rate.clone(),
        tax_on_materials_only: req.pricing.tax_on_materials_only,
        subtotal: breakdown.subtotal,
        markup_amount: breakdown.markup_amount,
        tax_amount: breakdown.tax_amount,
        total_amount: breakdown.total_amount,
        description: req.description,
        notes: req.notes,
        terms: req.terms,
        version: 1,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(quotes::table)
        .values(&quote)
        .execute(&mut conn)?;
    info!(
        "created quote {} for company {}",
        quote.quote_number, company.id
    );
    Ok(Json(quote))
}

pub async fn list_quotes(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Quote>>, ApiError> {
    let mut conn = state.conn.get()?;
    let mut stmt = quotes::table
        .filter(quotes::company_id.eq(auth.company_id))
        .filter(quotes::deleted_at.is_null())
        .order(quotes::created_at.desc())
        .into_boxed();
    if let Some(status) = &query.status {
        stmt = stmt.filter(quotes::status.eq(status.clone()));
    }
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);
    let rows = stmt.limit(limit).offset(offset).load::<Quote>(&mut conn)?;
    Ok(Json(rows))
}

pub async fn get_quote(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
    Path(id): Path<Uuid>,
) -> Result<Json<Quote>, ApiError> {
    let mut conn = state.conn.get()?;
    let quote = load_quote(&mut conn, auth.company_id, id)?;
    Ok(Json(quote))
}

/// Apply the patch to raw inputs and status, then recompute every
/// derived field from the merged inputs. Prior derived values are
/// overwritten, not versioned.
fn apply_update(quote: &mut Quote, req: &UpdateQuoteRequest) -> Result<(), ApiError> {
    if let Some(target) = &req.status {
        let current = QuoteStatus::parse(&quote.status).ok_or_else(|| {
            ApiError::Internal(format!("quote has unknown status {}", quote.status))
        })?;
        let next = QuoteStatus::parse(target)
            .ok_or_else(|| ApiError::Validation(format!("unknown status {target}")))?;
        if !current.can_transition_to(next) {
            return Err(ApiError::Validation(format!(
                "cannot move quote from {} to {}",
                current.as_str(),
                next.as_str()
            )));
        }
        quote.status = next.as_str().to_string();
    }
    if let Some(v) = &req.project_type {
        quote.project_type = Some(v.clone());
    }
    if let Some(v) = &req.surfaces {
        quote.surfaces = v.clone();
    }
    if let Some(v) = &req.paint_products {
        quote.paint_products = v.clone();
    }
    if let Some(v) = &req.settings_snapshot {
        quote.settings_snapshot = v.clone();
    }
    if let Some(v) = &req.materials_cost {
        quote.materials_cost = v.clone();
    }
    if let Some(v) = &req.labor_cost {
        quote.labor_cost = v.clone();
    }
    if let Some(v) = &req.markup_percentage {
        quote.markup_percentage = v.clone();
    }
    if let Some(v) = &req.tax_rate {
        quote.tax_rate = v.clone();
    }
    if let Some(v) = req.tax_on_materials_only {
        quote.tax_on_materials_only = v;
    }
    if let Some(v) = &req.description {
        quote.description = Some(v.clone());
    }
    if let Some(v) = &req.notes {
        quote.notes = Some(v.clone());
    }
    if let Some(v) = &req.terms {
        quote.terms = Some(v.clone());
    }

    let breakdown = pricing::compute(&quote.pricing_inputs()).rounded();
    quote.subtotal = breakdown.subtotal;
    quote.markup_amount = breakdown.markup_amount;
    quote.tax_amount = breakdown.tax_amount;
    quote.total_amount = breakdown.total_amount;
    Ok(())
}

pub async fn update_quote(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateQuoteRequest>,
) -> Result<Json<Quote>, ApiError> {
    let mut conn = state.conn.get()?;
    let mut quote = load_quote(&mut conn, auth.company_id, id)?;

    let expected_version = req.version.unwrap_or(quote.version);
    if expected_version != quote.version {
        return Err(ApiError::Conflict(format!(
            "quote version is {}, caller had {expected_version}",
            quote.version
        )));
    }

    apply_update(&mut quote, &req)?;
    quote.version = expected_version + 1;
    quote.updated_at = Utc::now();

    // Conditional on the version the caller read; a concurrent edit in
    // between makes this match zero rows.
    let updated = diesel::update(
        quotes::table
            .filter(quotes::id.eq(quote.id))
            .filter(quotes::company_id.eq(auth.company_id))
            .filter(quotes::version.eq(expected_version)),
    )
    .set((
        quotes::status.eq(&quote.status),
        quotes::project_type.eq(quote.project_type.clone()),
        quotes::surfaces.eq(&quote.surfaces),
        quotes::paint_products.eq(&quote.paint_products),
        quotes::settings_snapshot.eq(&quote.settings_snapshot),
        quotes::materials_cost.eq(&quote.materials_cost),
        quotes::labor_cost.eq(&quote.labor_cost),
        quotes::markup_percentage.eq(&quote.markup_percentage),
        quotes::tax_rate.eq(&quote.tax_rate),
        quotes::tax_on_materials_only.eq(quote.tax_on_materials_only),
        quotes::subtotal.eq(&quote.subtotal),
        quotes::markup_amount.eq(&quote.markup_amount),
        quotes::tax_amount.eq(&quote.tax_amount),
        quotes::total_amount.eq(&quote.total_amount),
        quotes::description.eq(quote.description.clone()),
        quotes::notes.eq(quote.notes.clone()),
        quotes::terms.eq(quote.terms.clone()),
        quotes::version.eq(quote.version),
        quotes::updated_at.eq(quote.updated_at),
    ))
    .execute(&mut conn)?;
    if updated == 0 {
        return Err(ApiError::Conflict(
            "quote was modified concurrently".to_string(),
        ));
    }
    Ok(Json(quote))
}

pub async fn delete_quote(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = state.conn.get()?;
    let deleted = diesel::update(
        quotes::table
            .filter(quotes::id.eq(id))
            .filter(quotes::company_id.eq(auth.company_id))
            .filter(quotes::deleted_at.is_null()),
    )
    .set(quotes::deleted_at.eq(Utc::now()))
    .execute(&mut conn)?;
    if deleted == 0 {
        return Err(ApiError::NotFound("quote not found".to_string()));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}
