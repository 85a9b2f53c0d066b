//! Company settings store: charge rates per surface, labor settings, tax
//! configuration, and the paint product catalog. The whole structure is
//! persisted as one jsonb blob per company; rehydration merges whatever
//! was stored with the documented defaults, field by field.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::SessionCompany;
use crate::shared::error::ApiError;
use crate::shared::models::schema::company_settings;
use crate::shared::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ChargeRates {
    // Interior, per square foot unless noted.
    pub walls: f64,
    pub ceilings: f64,
    /// Per linear foot.
    pub baseboards: f64,
    /// Per linear foot.
    pub crown_molding: f64,
    /// Per unit.
    pub doors: f64,
    /// Per unit.
    pub windows: f64,
    // Exterior.
    pub exterior_walls: f64,
    /// Per linear foot.
    pub fascia: f64,
    pub soffits: f64,
    /// Per unit.
    pub exterior_doors: f64,
    /// Per unit.
    pub exterior_windows: f64,
}

impl Default for ChargeRates {
    fn default() -> Self {
        Self {
            walls: 3.50,
            ceilings: 4.00,
            baseboards: 2.50,
            crown_molding: 5.00,
            doors: 125.00,
            windows: 75.00,
            exterior_walls: 4.50,
            fascia: 6.00,
            soffits: 5.00,
            exterior_doors: 150.00,
            exterior_windows: 100.00,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductivityRates {
    /// Square feet per hour.
    pub walls: f64,
    pub ceilings: f64,
    /// Linear feet per hour.
    pub baseboards: f64,
    /// Units per hour.
    pub doors: f64,
    pub windows: f64,
}

impl Default for ProductivityRates {
    fn default() -> Self {
        Self {
            walls: 150.0,
            ceilings: 100.0,
            baseboards: 60.0,
            doors: 2.0,
            windows: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LaborSettings {
    pub hourly_rate: f64,
    /// Covers workers comp, insurance and similar on-costs.
    pub overhead_multiplier: f64,
    pub productivity_rates: ProductivityRates,
}

impl Default for LaborSettings {
    fn default() -> Self {
        Self {
            hourly_rate: 45.0,
            overhead_multiplier: 1.35,
            productivity_rates: ProductivityRates::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintKind {
    Wall,
    Ceiling,
    Trim,
    Primer,
    Specialty,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaintProduct {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    #[serde(rename = "type")]
    pub kind: PaintKind,
    pub cost_per_gallon: f64,
    pub retail_price: f64,
    pub coverage_per_gallon: f64,
    pub is_preferred: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanySettings {
    pub company_name: String,
    pub tax_rate: f64,
    pub overhead_percent: f64,
    pub profit_margin: f64,
    pub charge_rates: ChargeRates,
    pub labor_settings: LaborSettings,
    pub paint_products: Vec<PaintProduct>,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            tax_rate: 8.25,
            overhead_percent: 15.0,
            profit_margin: 30.0,
            charge_rates: ChargeRates::default(),
            labor_settings: LaborSettings::default(),
            paint_products: default_paint_products(),
        }
    }
}

fn default_paint_products() -> Vec<PaintProduct> {
    vec![
        PaintProduct {
            id: "1".to_string(),
            name: "Regal Select Interior".to_string(),
            manufacturer: "Benjamin Moore".to_string(),
            kind: PaintKind::Wall,
            cost_per_gallon: 42.99,
            retail_price: 65.99,
            coverage_per_gallon: 350.0,
            is_preferred: true,
        },
        PaintProduct {
            id: "2".to_string(),
            name: "Ultra Spec Ceiling".to_string(),
            manufacturer: "Benjamin Moore".to_string(),
            kind: PaintKind::Ceiling,
            cost_per_gallon: 28.99,
            retail_price: 44.99,
            coverage_per_gallon: 400.0,
            is_preferred: true,
        },
        PaintProduct {
            id: "3".to_string(),
            name: "Advance Interior Paint".to_string(),
            manufacturer: "Benjamin Moore".to_string(),
            kind: PaintKind::Trim,
            cost_per_gallon: 54.99,
            retail_price: 79.99,
            coverage_per_gallon: 350.0,
            is_preferred: true,
        },
    ]
}

pub fn configure() -> Router<Arc<AppState>> {
    Router::new().route("/api/settings", get(get_settings).put(put_settings))
}

/// Stored partial settings merged over defaults. No row yet means pure
/// defaults; unknown keys in the stored blob are ignored.
pub fn load_settings(
    conn: &mut PgConnection,
    company_id: Uuid,
) -> Result<CompanySettings, ApiError> {
    let stored = company_settings::table
        .find(company_id)
        .select(company_settings::settings)
        .first::<serde_json::Value>(conn)
        .optional()?;
    match stored {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| ApiError::Internal(format!("stored settings are malformed: {e}"))),
        None => Ok(CompanySettings::default()),
    }
}

pub fn save_settings(
    conn: &mut PgConnection,
    company_id: Uuid,
    settings: &CompanySettings,
) -> Result<(), ApiError> {
    let value = serde_json::to_value(settings)
        .map_err(|e| ApiError::Internal(format!("settings serialization failed: {e}")))?;
    let now = Utc::now();
    diesel::insert_into(company_settings::table)
        .values((
            company_settings::company_id.eq(company_id),
            company_settings::settings.eq(&value),
            company_settings::created_at.eq(now),
            company_settings::updated_at.eq(now),
        ))
        .on_conflict(company_settings::company_id)
        .do_update()
        .set((
            company_settings::settings.eq(&value),
            company_settings::updated_at.eq(now),
        ))
        .execute(conn)?;
    Ok(())
}

pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
) -> Result<Json<CompanySettings>, ApiError> {
    let mut conn = state.conn.get()?;
    let settings = load_settings(&mut conn, auth.company_id)?;
    Ok(Json(settings))
}

pub async fn put_settings(
    State(state): State<Arc<AppState>>,
    auth: SessionCompany,
    Json(settings): Json<CompanySettings>,
) -> Result<Json<CompanySettings>, ApiError> {
    let mut conn = state.conn.get()?;
    save_settings(&mut conn, auth.company_id, &settings)?;
    Ok(Json(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_stored_settings_merge_with_defaults() {
        let stored = serde_json::json!({
            "companyName": "Brush Brothers",
            "taxRate": 6.5,
            "chargeRates": { "walls": 4.25 }
        });
        let settings: CompanySettings = serde_json::from_value(stored).unwrap();
        assert_eq!(settings.company_name, "Brush Brothers");
        assert_eq!(settings.tax_rate, 6.5);
        assert_eq!(settings.charge_rates.walls, 4.25);
        // Unspecified fields fall back to documented defaults.
        assert_eq!(settings.charge_rates.ceilings, 4.00);
        assert_eq!(settings.labor_settings.hourly_rate, 45.0);
        assert_eq!(settings.paint_products.len(), 3);
    }

    #[test]
    fn empty_blob_rehydrates_to_full_defaults() {
        let settings: CompanySettings = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(settings, CompanySettings::default());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let stored = serde_json::json!({ "legacyField": true, "profitMargin": 22.0 });
        let settings: CompanySettings = serde_json::from_value(stored).unwrap();
        assert_eq!(settings.profit_margin, 22.0);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = CompanySettings {
            company_name: "Test Painting Company".to_string(),
            ..CompanySettings::default()
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["chargeRates"]["crownMolding"], 5.00);
        assert_eq!(value["paintProducts"][0]["type"], "wall");
        let back: CompanySettings = serde_json::from_value(value).unwrap();
        assert_eq!(back, settings);
    }
}
