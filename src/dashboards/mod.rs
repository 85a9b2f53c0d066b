//! Dashboard read views: per-customer quote aggregates and the recent
//! quote listing with denormalized customer fields. Read-only
//! projections, recomputed from source rows on every request.

use axum::{extract::State, routing::get, Json, Router};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::SessionCompany;
use crate::customers::Customer;
use crate::quotes::{Quote, QuoteStatus};
use crate::shared::error::ApiError;
use crate::shared::models::schema::{customers, quotes};
use crate::shared::state::AppState;

const RECENT_QUOTE_LIMIT: i64 = 20;

#[derive(Debug, Serialize)]
pub struct QuoteSummary {
    pub id: Uuid,
    pub quote_number: String,
    pub status: String,
    pub total_amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Quote> for QuoteSummary {
    fn from(quote: &Quote) -> Self {
        Self {
            id: quote.id,
            quote_number: quote.quote_number.clone(),
            status: quote.status.clone(),
            total_amount: quote.total_amount.clone(),
            created_at: quote.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CustomerStats {
    #[serde(flatten)]
    pub customer: Customer,
    pub total_quotes: i64,
    pub accepted_quotes: i64,
    pub total_revenue: BigDecimal,
    pub recent_quotes: Vec<QuoteSummary>,
}

#[derive(Debug, Serialize)]
pub struct CustomerRef {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteListItem {
    #[serde(flatten)]
    pub quote: Quote,
    pub customer: Option<CustomerRef>,
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/dashboard/customers", get(customer_dashboard))
        .route("/api/dashboard/quotes", get(recent_quotes))
}

/// Fold quotes into per-customer totals. Revenue counts accepted quotes
/// only; a customer with no quotes aggregates to zero.
pub fn aggregate_customers(customers: Vec<Customer>, quotes: &[Quote]) -> Vec<CustomerStats> {
    let mut by_customer: HashMap<Uuid, Vec<&Quote>> = HashMap::new();
    for quote in quotes {
        by_customer.entry(quote.customer_id).or_default().push(quote);
    }
    customers
        .into_iter()
        .map(|customer| {
            let rows = by_customer.remove(&customer.id).unwrap_or_default();
            let accepted: Vec<&&Quote> = rows
                .iter()
                .filter(|q| q.status == QuoteStatus::Accepted.as_str())
                .collect();
            let total_revenue = accepted
                .iter()
                .fold(BigDecimal::from(0), |acc, q| acc + &q.total_amount);
            CustomerStats {
                total_quotes: rows.len() as i64,
                accepted_quotes: accepted.len() as i64,
                total_revenue,
                recent_quotes: rows.iter().map(|q| QuoteSummary::from(*q)).collect(),
                customer,
            }
        })
        .collect()
}

pub async fn customer_dashboard(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
) -> Result<Json<Vec<CustomerStats>>, ApiError> {
    let mut conn = state.conn.get()?;
    let customer_rows = customers::table
        .filter(customers::company_id.eq(auth.company_id))
        .order(customers::created_at.desc())
        .load::<Customer>(&mut conn)?;
    let quote_rows = quotes::table
        .filter(quotes::company_id.eq(auth.company_id))
        .filter(quotes::deleted_at.is_null())
        .order(quotes::created_at.desc())
        .load::<Quote>(&mut conn)?;
    Ok(Json(aggregate_customers(customer_rows, &quote_rows)))
}

pub async fn recent_quotes(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
) -> Result<Json<Vec<QuoteListItem>>, ApiError> {
    let mut conn = state.conn.get()?;
    let quote_rows = quotes::table
        .filter(quotes::company_id.eq(auth.company_id))
        .filter(quotes::deleted_at.is_null())
        .order(quotes::created_at.desc())
        .limit(RECENT_QUOTE_LIMIT)
        .load::<Quote>(&mut conn)?;
    let customer_rows = customers::table
        .filter(customers::company_id.eq(auth.company_id))
        .load::<Customer>(&mut conn)?;
    let by_id: HashMap<Uuid, Customer> =
        customer_rows.into_iter().map(|c| (c.id, c)).collect();
    let items = quote_rows
        .into_iter()
        .map(|quote| {
            let customer = by_id.get(&quote.customer_id).map(|c| CustomerRef {
                id: c.id,
                name: c.name.clone(),
                email: c.email.clone(),
                phone: c.phone.clone(),
            });
            QuoteListItem { quote, customer }
        })
        .collect();
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn customer(company_id: Uuid, name: &str) -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            company_id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            phone: None,
            address: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn quote(company_id: Uuid, customer_id: Uuid, status: QuoteStatus, total: &str) -> Quote {
        let now = Utc::now();
        Quote {
            id: Uuid::new_v4(),
            company_id,
            customer_id,
            quote_number: "Q-000001".to_string(),
            project_type: None,
            status: status.as_str().to_string(),
            surfaces: serde_json::json!([]),
            paint_products: serde_json::json!({}),
            settings_snapshot: serde_json::json!({}),
            materials_cost: dec("0"),
            labor_cost: dec("0"),
            markup_percentage: dec("0"),
            tax_rate: dec("0"),
            tax_on_materials_only: false,
            subtotal: dec("0"),
            markup_amount: dec("0"),
            tax_amount: dec("0"),
            total_amount: dec(total),
            description: None,
            notes: None,
            terms: None,
            version: 1,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn revenue_sums_accepted_quotes_only() {
        let company_id = Uuid::new_v4();
        let alice = customer(company_id, "Alice");
        let quotes = vec![
            quote(company_id, alice.id, QuoteStatus::Accepted, "1200.50"),
            quote(company_id, alice.id, QuoteStatus::Accepted, "800.25"),
            quote(company_id, alice.id, QuoteStatus::Rejected, "5000.00"),
            quote(company_id, alice.id, QuoteStatus::Draft, "300.00"),
        ];
        let stats = aggregate_customers(vec![alice], &quotes);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].total_quotes, 4);
        assert_eq!(stats[0].accepted_quotes, 2);
        assert_eq!(stats[0].total_revenue, dec("2000.75"));
    }

    #[test]
    fn customer_with_no_quotes_aggregates_to_zero() {
        let company_id = Uuid::new_v4();
        let bob = customer(company_id, "Bob");
        let stats = aggregate_customers(vec![bob], &[]);
        assert_eq!(stats[0].total_quotes, 0);
        assert_eq!(stats[0].accepted_quotes, 0);
        assert_eq!(stats[0].total_revenue, BigDecimal::from(0));
    }

    #[test]
    fn quotes_attach_to_their_own_customer() {
        let company_id = Uuid::new_v4();
        let alice = customer(company_id, "Alice");
        let bob = customer(company_id, "Bob");
        let quotes = vec![
            quote(company_id, alice.id, QuoteStatus::Accepted, "100.00"),
            quote(company_id, bob.id, QuoteStatus::Sent, "250.00"),
        ];
        let stats = aggregate_customers(vec![alice.clone(), bob.clone()], &quotes);
        let alice_stats = stats.iter().find(|s| s.customer.id == alice.id).unwrap();
        let bob_stats = stats.iter().find(|s| s.customer.id == bob.id).unwrap();
        assert_eq!(alice_stats.total_revenue, dec("100.00"));
        assert_eq!(bob_stats.total_quotes, 1);
        assert_eq!(bob_stats.total_revenue, dec("0"));
    }
}
