//! End-to-end checks of the pricing arithmetic and lifecycle rules
//! through the public crate API.

use bigdecimal::BigDecimal;
use quoteserver::pricing::{compute, round_cents, PricingInputs};
use quoteserver::quotes::QuoteStatus;

fn dec(s: &str) -> BigDecimal {
    s.parse().unwrap()
}

#[test]
fn reference_quote_breakdown() {
    // $1000 materials, $500 labor, 30% markup, 8.25% tax on the
    // post-markup total.
    let breakdown = compute(&PricingInputs {
        materials_cost: dec("1000"),
        labor_cost: dec("500"),
        markup_percentage: dec("30"),
        tax_rate: dec("8.25"),
        tax_on_materials_only: false,
    });
    assert_eq!(breakdown.subtotal, dec("1500"));
    assert_eq!(breakdown.markup_amount, dec("450"));
    assert_eq!(breakdown.pre_tax_total, dec("1950"));
    assert_eq!(breakdown.tax_amount, dec("160.875"));
    assert_eq!(breakdown.total_amount, dec("2110.875"));
    // Cent rounding happens only when the derived fields are persisted.
    assert_eq!(round_cents(&breakdown.total_amount), dec("2110.88"));
}

#[test]
fn repeated_recompute_is_stable() {
    // Re-running the computation over the same raw inputs reproduces the
    // same derived fields, so edits cannot drift the totals.
    let inputs = PricingInputs {
        materials_cost: dec("1234.56"),
        labor_cost: dec("789.01"),
        markup_percentage: dec("17.5"),
        tax_rate: dec("6.25"),
        tax_on_materials_only: false,
    };
    let first = compute(&inputs).rounded();
    let second = compute(&inputs).rounded();
    assert_eq!(first, second);
}

#[test]
fn only_sent_quotes_reach_terminal_states() {
    for status in [
        QuoteStatus::Draft,
        QuoteStatus::Pending,
        QuoteStatus::Accepted,
        QuoteStatus::Rejected,
    ] {
        if status != QuoteStatus::Accepted {
            assert!(
                !status.can_transition_to(QuoteStatus::Accepted),
                "{status:?} must not reach accepted directly"
            );
        }
        if status != QuoteStatus::Rejected {
            assert!(
                !status.can_transition_to(QuoteStatus::Rejected),
                "{status:?} must not reach rejected directly"
            );
        }
    }
    assert!(QuoteStatus::Sent.can_transition_to(QuoteStatus::Accepted));
    assert!(QuoteStatus::Sent.can_transition_to(QuoteStatus::Rejected));
}

#[test]
fn status_strings_round_trip() {
    for status in [
        QuoteStatus::Draft,
        QuoteStatus::Pending,
        QuoteStatus::Sent,
        QuoteStatus::Accepted,
        QuoteStatus::Rejected,
    ] {
        assert_eq!(QuoteStatus::parse(status.as_str()), Some(status));
    }
    assert_eq!(QuoteStatus::parse("DRAFT"), None);
}
