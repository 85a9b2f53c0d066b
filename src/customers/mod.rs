//! Customer records, scoped to the authenticated company. Customers are
//! created through quote intake; this module only reads them.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::SessionCompany;
use crate::shared::error::ApiError;
use crate::shared::models::schema::customers;
use crate::shared::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Insertable, Identifiable, Selectable)]
#[diesel(table_name = customers)]
pub struct Customer {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/customers", get(list_customers))
        .route("/api/customers/:id", get(get_customer))
}

pub async fn list_customers(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let mut conn = state.conn.get()?;
    let rows = customers::table
        .filter(customers::company_id.eq(auth.company_id))
        .order(customers::created_at.desc())
        .load::<Customer>(&mut conn)?;
    Ok(Json(rows))
}

pub async fn get_customer(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, ApiError> {
    let mut conn = state.conn.get()?;
    let customer = customers::table
        .filter(customers::company_id.eq(auth.company_id))
        .filter(customers::id.eq(id))
        .first::<Customer>(&mut conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("customer not found".to_string()))?;
    Ok(Json(customer))
}

/// Upsert on (company_id, email): quote intake reuses an existing
/// customer for the same email and refreshes the contact fields.
pub fn upsert_customer(
    conn: &mut PgConnection,
    company_id: Uuid,
    name: &str,
    email: &str,
    phone: Option<&str>,
    address: Option<&str>,
) -> Result<Customer, ApiError> {
    let now = Utc::now();
    let candidate = Customer {
        id: Uuid::new_v4(),
        company_id,
        name: name.to_string(),
        email: email.to_string(),
        phone: phone.map(str::to_string),
        address: address.map(str::to_string),
        created_at: now,
        updated_at: now,
    };
    let customer = diesel::insert_into(customers::table)
        .values(&candidate)
        .on_conflict((customers::company_id, customers::email))
        .do_update()
        .set((
            customers::name.eq(name),
            customers::phone.eq(phone),
            customers::address.eq(address),
            customers::updated_at.eq(now),
        ))
        .get_result::<Customer>(conn)?;
    Ok(customer)
}
