//! Quote pricing calculator.
//!
//! Pure arithmetic over decimal amounts: materials + labor form the
//! subtotal, markup is applied to the subtotal, tax is applied either to
//! the post-markup total or to materials only, and the final price is the
//! post-markup total plus tax. Amounts stay at full decimal precision
//! through the computation; [`round_cents`] is applied exactly once when
//! the derived fields are persisted.

use bigdecimal::{BigDecimal, RoundingMode};
use serde::{Deserialize, Serialize};

/// Raw pricing inputs as supplied on quote creation or edit. Absent
/// fields default to zero; malformed values are rejected at the HTTP
/// boundary by deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingInputs {
    #[serde(default)]
    pub materials_cost: BigDecimal,
    #[serde(default)]
    pub labor_cost: BigDecimal,
    #[serde(default)]
    pub markup_percentage: BigDecimal,
    #[serde(default)]
    pub tax_rate: BigDecimal,
    /// When set, tax is computed on the materials cost alone instead of
    /// the post-markup total.
    #[serde(default)]
    pub tax_on_materials_only: bool,
}

/// Derived financial fields, in computation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingBreakdown {
    pub subtotal: BigDecimal,
    pub markup_amount: BigDecimal,
    pub pre_tax_total: BigDecimal,
    pub tax_amount: BigDecimal,
    pub total_amount: BigDecimal,
}

pub fn compute(inputs: &PricingInputs) -> PricingBreakdown {
    let hundred = BigDecimal::from(100);
    let subtotal = &inputs.materials_cost + &inputs.labor_cost;
    let markup_amount = &subtotal * &inputs.markup_percentage / &hundred;
    let pre_tax_total = &subtotal + &markup_amount;
    let taxable_base = if inputs.tax_on_materials_only {
        inputs.materials_cost.clone()
    } else {
        pre_tax_total.clone()
    };
    let tax_amount = taxable_base * &inputs.tax_rate / &hundred;
    let total_amount = &pre_tax_total + &tax_amount;
    PricingBreakdown {
        subtotal,
        markup_amount,
        pre_tax_total,
        tax_amount,
        total_amount,
    }
}

/// Round to whole cents, half-up. Applied once, at persist time.
pub fn round_cents(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

impl PricingBreakdown {
    /// Breakdown with every field rounded to cents for persistence.
    pub fn rounded(&self) -> PricingBreakdown {
        PricingBreakdown {
            subtotal: round_cents(&self.subtotal),
            markup_amount: round_cents(&self.markup_amount),
            pre_tax_total: round_cents(&self.pre_tax_total),
            tax_amount: round_cents(&self.tax_amount),
            total_amount: round_cents(&self.total_amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn inputs(materials: &str, labor: &str, markup: &str, tax: &str) -> PricingInputs {
        PricingInputs {
            materials_cost: dec(materials),
            labor_cost: dec(labor),
            markup_percentage: dec(markup),
            tax_rate: dec(tax),
            tax_on_materials_only: false,
        }
    }

    #[test]
    fn tax_applies_to_post_markup_total() {
        let breakdown = compute(&inputs("1000", "500", "30", "8.25"));
        assert_eq!(breakdown.subtotal, dec("1500"));
        assert_eq!(breakdown.markup_amount, dec("450"));
        assert_eq!(breakdown.pre_tax_total, dec("1950"));
        assert_eq!(breakdown.tax_amount, dec("160.875"));
        assert_eq!(breakdown.total_amount, dec("2110.875"));
    }

    #[test]
    fn zero_markup_and_tax_collapses_to_subtotal() {
        let breakdown = compute(&inputs("1000", "500", "0", "0"));
        assert_eq!(breakdown.subtotal, dec("1500"));
        assert_eq!(breakdown.markup_amount, dec("0"));
        assert_eq!(breakdown.tax_amount, dec("0"));
        assert_eq!(breakdown.total_amount, dec("1500"));
    }

    #[test]
    fn materials_only_tax_base() {
        let breakdown = compute(&PricingInputs {
            tax_on_materials_only: true,
            ..inputs("1000", "500", "30", "8.25")
        });
        // Tax on materials alone, not on the marked-up total.
        assert_eq!(breakdown.tax_amount, dec("82.5"));
        assert_eq!(breakdown.total_amount, dec("2032.5"));
    }

    #[test]
    fn all_zero_inputs_produce_zero_totals() {
        let breakdown = compute(&PricingInputs::default());
        assert_eq!(breakdown.total_amount, BigDecimal::from(0));
    }

    #[test]
    fn rounding_is_half_up_to_cents() {
        assert_eq!(round_cents(&dec("160.875")), dec("160.88"));
        assert_eq!(round_cents(&dec("160.874")), dec("160.87"));
        assert_eq!(round_cents(&dec("1500")), dec("1500.00"));
    }

    #[test]
    fn missing_fields_deserialize_to_zero() {
        let parsed: PricingInputs = serde_json::from_str(r#"{"materials_cost": 250}"#).unwrap();
        assert_eq!(parsed.materials_cost, dec("250"));
        assert_eq!(parsed.labor_cost, dec("0"));
        assert!(!parsed.tax_on_materials_only);
    }

    #[test]
    fn malformed_numeric_input_is_rejected() {
        let parsed = serde_json::from_str::<PricingInputs>(r#"{"materials_cost": "abc"}"#);
        assert!(parsed.is_err());
    }
}
