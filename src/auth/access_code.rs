use chrono::Utc;
use diesel::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use super::Company;
use crate::shared::models::schema::companies;

/// Codes matching this shape auto-provision a trial company on first use.
static AUTO_PROVISION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3,10}\d{2,4}$").expect("valid access code pattern"));

pub fn normalize_access_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

pub fn is_auto_provision_candidate(code: &str) -> bool {
    AUTO_PROVISION_PATTERN.is_match(code)
}

/// What to do with a normalized code given the stored row, if any.
#[derive(Debug)]
pub(crate) enum CodeResolution {
    /// A company already holds the code; return it unmodified.
    Existing(Company),
    /// Unknown but pattern-valid; insert this trial company if absent.
    Provision(Company),
    /// Unknown and pattern-invalid; report "no such company".
    NoMatch,
}

pub(crate) fn resolve_code(existing: Option<Company>, code: &str) -> CodeResolution {
    match existing {
        Some(company) => CodeResolution::Existing(company),
        None if is_auto_provision_candidate(code) => {
            CodeResolution::Provision(trial_company(code))
        }
        None => CodeResolution::NoMatch,
    }
}

fn trial_company(code: &str) -> Company {
    let now = Utc::now();
    Company {
        id: Uuid::new_v4(),
        access_code: code.to_string(),
        company_name: format!("Company {code}"),
        email: format!("{}@example.com", code.to_lowercase()),
        phone: None,
        logo_url: None,
        is_trial: true,
        quote_limit: Some(1),
        created_at: now,
        updated_at: now,
    }
}

/// Resolve an access code to a company.
///
/// Known codes return the stored company unmodified. Unknown codes that
/// match the auto-provision pattern create a trial company with a quote
/// limit of one; the insert is `ON CONFLICT DO NOTHING` so concurrent
/// first use of the same code yields exactly one row. Anything else, and
/// any storage failure, resolves to `None` ("no such company") and the
/// failure is logged.
pub fn verify_access_code(conn: &mut PgConnection, raw_code: &str) -> Option<Company> {
    let code = normalize_access_code(raw_code);
    if code.is_empty() {
        return None;
    }

    let existing = match companies::table
        .filter(companies::access_code.eq(&code))
        .first::<Company>(conn)
        .optional()
    {
        Ok(row) => row,
        Err(e) => {
            warn!("access code lookup failed: {e}");
            return None;
        }
    };

    let candidate = match resolve_code(existing, &code) {
        CodeResolution::Existing(company) => return Some(company),
        CodeResolution::NoMatch => return None,
        CodeResolution::Provision(candidate) => candidate,
    };

    match diesel::insert_into(companies::table)
        .values(&candidate)
        .on_conflict(companies::access_code)
        .do_nothing()
        .execute(conn)
    {
        Ok(inserted) if inserted > 0 => {
            info!("auto-provisioned trial company for access code {code}");
        }
        Ok(_) => {}
        Err(e) => {
            warn!("trial company auto-provision failed for {code}: {e}");
        }
    }

    // Re-select either way; a concurrent request may have won the insert.
    match companies::table
        .filter(companies::access_code.eq(&code))
        .first::<Company>(conn)
        .optional()
    {
        Ok(company) => company,
        Err(e) => {
            warn!("access code re-lookup failed for {code}: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Mimics the insert-if-absent store: resolve against the current
    /// rows, insert only when provisioning is decided.
    fn resolve_against(store: &mut HashMap<String, Company>, code: &str) -> Option<Company> {
        match resolve_code(store.get(code).cloned(), code) {
            CodeResolution::Existing(company) => Some(company),
            CodeResolution::Provision(candidate) => {
                let company = store
                    .entry(code.to_string())
                    .or_insert(candidate)
                    .clone();
                Some(company)
            }
            CodeResolution::NoMatch => None,
        }
    }

    #[test]
    fn unknown_pattern_valid_code_provisions_exactly_once() {
        let mut store = HashMap::new();
        let first = resolve_against(&mut store, "ACME2024").unwrap();
        assert_eq!(store.len(), 1);
        assert!(first.is_trial);
        assert_eq!(first.quote_limit, Some(1));
        assert_eq!(first.company_name, "Company ACME2024");

        let second = resolve_against(&mut store, "ACME2024").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(second.id, first.id);
    }

    #[test]
    fn known_code_returns_the_stored_company_unmodified() {
        let mut store = HashMap::new();
        let stored = trial_company("BRUSH55");
        store.insert("BRUSH55".to_string(), stored.clone());
        let resolved = resolve_against(&mut store, "BRUSH55").unwrap();
        assert_eq!(resolved.id, stored.id);
        assert_eq!(resolved.updated_at, stored.updated_at);
    }

    #[test]
    fn pattern_invalid_unknown_code_is_no_match() {
        let mut store = HashMap::new();
        assert!(resolve_against(&mut store, "not-a-code").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn normalization_uppercases_and_trims() {
        assert_eq!(normalize_access_code("  acme2024 "), "ACME2024");
    }

    #[test]
    fn pattern_accepts_letters_then_digits() {
        assert!(is_auto_provision_candidate("ABC12"));
        assert!(is_auto_provision_candidate("PAINTERPRO2024"));
        assert!(is_auto_provision_candidate("ACME99"));
    }

    #[test]
    fn pattern_rejects_wrong_shapes() {
        // Too few letters, too few digits, trailing letters, lowercase.
        assert!(!is_auto_provision_candidate("AB12"));
        assert!(!is_auto_provision_candidate("ABCDE1"));
        assert!(!is_auto_provision_candidate("ABC12X"));
        assert!(!is_auto_provision_candidate("abc123"));
        assert!(!is_auto_provision_candidate(""));
        // Too many letters or digits.
        assert!(!is_auto_provision_candidate("ABCDEFGHIJK12"));
        assert!(!is_auto_provision_candidate("ABC12345"));
    }
}
