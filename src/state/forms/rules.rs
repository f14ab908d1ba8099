//! Client-side field rules shared by every wizard

use crate::state::wizard::ErrorMap;
use regex::Regex;
use std::sync::LazyLock;

/// Default ceiling for a single transfer, in whole currency units
pub const DEFAULT_MAX_AMOUNT: u64 = 1_000_000;

/// Default currency of new transfers
pub const DEFAULT_CURRENCY: &str = "XOF";

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern")
});

/// Limits and defaults applied while validating and submitting forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPolicy {
    pub max_amount: u64,
    pub currency: String,
}

impl Default for FormPolicy {
    fn default() -> Self {
        Self {
            max_amount: DEFAULT_MAX_AMOUNT,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Record `message` when `value` is blank. Returns whether it was present.
pub fn require<K: Ord + Copy>(
    errors: &mut ErrorMap<K>,
    field: K,
    value: &str,
    message: &str,
) -> bool {
    if is_blank(value) {
        errors.insert(field, message);
        false
    } else {
        true
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value.trim())
}

/// Digits with optional `+`, spaces, dots or dashes; 8 to 15 digits
pub fn is_valid_phone(value: &str) -> bool {
    let value = value.trim();
    let allowed = value
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.') || (c == '+' && i == 0));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    allowed && (8..=15).contains(&digits)
}

/// Required phone number of a plausible shape
pub fn check_phone<K: Ord + Copy>(errors: &mut ErrorMap<K>, field: K, value: &str) {
    if require(errors, field, value, "Le numéro de téléphone est requis") && !is_valid_phone(value)
    {
        errors.insert(field, "Numéro de téléphone invalide");
    }
}

/// Whole amount typed by the operator, `None` when empty or not a number
pub fn parse_amount(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

/// Amount present, numeric, positive and under the ceiling
pub fn check_amount<K: Ord + Copy>(
    errors: &mut ErrorMap<K>,
    field: K,
    raw: &str,
    policy: &FormPolicy,
) {
    if !require(errors, field, raw, "Le montant est requis") {
        return;
    }
    match parse_amount(raw) {
        None => errors.insert(field, "Le montant doit être un nombre entier"),
        Some(0) => errors.insert(field, "Le montant doit être supérieur à 0"),
        Some(amount) if amount > policy.max_amount => errors.insert(
            field,
            format!(
                "Le montant ne peut pas dépasser {} {}",
                policy.max_amount, policy.currency
            ),
        ),
        Some(_) => {}
    }
}

/// Agency chosen, known, and located in the selected country
pub fn check_agency<K: Ord + Copy>(
    errors: &mut ErrorMap<K>,
    field: K,
    country: &str,
    agency_id: &str,
    agency_name: &str,
    agency_country: &str,
) {
    if !require(errors, field, agency_id, "L'agence est requise") {
        return;
    }
    if is_blank(country) {
        errors.insert(field, "Sélectionnez d'abord un pays");
    } else if is_blank(agency_name) {
        errors.insert(field, "Agence inconnue");
    } else if agency_country != country {
        errors.insert(field, "Cette agence n'appartient pas au pays sélectionné");
    }
}
