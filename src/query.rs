//! openFDA search-query construction: filter parameters in, Lucene-style
//! boolean query string out.

use std::collections::HashSet;

use serde::Deserialize;

/// Matches every label record when no filter is supplied.
pub(crate) const MATCH_ALL: &str = "*:*";

const DEFAULT_LIMIT: i64 = 3;

const DRUG_NAME_FIELDS: [&str; 3] = [
    "openfda.brand_name",
    "openfda.generic_name",
    "openfda.substance_name",
];

/// Per-call filter set shared by every label tool.
///
/// Empty strings behave like absent filters. `limit` is clamped to the
/// upstream window at the tool boundary, not here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct SearchFilters {
    pub drug_name: Option<String>,
    pub manufacturer: Option<String>,
    pub dosage_form: Option<String>,
    pub route: Option<String>,
    pub ndc: Option<String>,
    pub limit: i64,
    pub exact_match: bool,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            drug_name: None,
            manufacturer: None,
            dosage_form: None,
            route: None,
            ndc: None,
            limit: DEFAULT_LIMIT,
            exact_match: false,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Expands a raw NDC into up to 3 candidate spellings to match the
/// inconsistent formatting of `openfda.product_ndc` upstream.
///
/// Hyphenated input keeps the original first and adds the digits-only form
/// when it carries at least 9 digits. Unhyphenated 10- or 11-digit input
/// additionally gets the 5-4-1 or 5-4-2 hyphenation. Anything else passes
/// through unchanged; blank input means "no NDC filter".
pub(crate) fn normalize_ndc(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut formats = vec![trimmed.to_string()];
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    if trimmed.contains('-') {
        if digits.len() >= 9 {
            formats.push(digits);
        }
    } else if digits.len() == 10 || digits.len() == 11 {
        formats.push(format!(
            "{}-{}-{}",
            &digits[..5],
            &digits[5..9],
            &digits[9..]
        ));
    }

    let mut seen = HashSet::new();
    formats.retain(|f| seen.insert(f.clone()));
    formats.truncate(3);
    formats
}

fn drug_name_clause(drug_name: &str, exact_match: bool) -> String {
    let terms: Vec<String> = DRUG_NAME_FIELDS
        .iter()
        .map(|field| {
            if exact_match {
                format!("{field}.exact:\"{drug_name}\"")
            } else {
                format!("{field}:\"{drug_name}\"")
            }
        })
        .collect();
    format!("({})", terms.join(" OR "))
}

fn attribute_clauses(filters: &SearchFilters) -> Vec<String> {
    let mut clauses = Vec::new();
    if let Some(manufacturer) = non_empty(filters.manufacturer.as_deref()) {
        clauses.push(format!("openfda.manufacturer_name:\"{manufacturer}\""));
    }
    if let Some(dosage_form) = non_empty(filters.dosage_form.as_deref()) {
        clauses.push(format!("openfda.dosage_form:\"{dosage_form}\""));
    }
    if let Some(route) = non_empty(filters.route.as_deref()) {
        clauses.push(format!("openfda.route:\"{route}\""));
    }
    clauses
}

/// Composes the filter set into a single openFDA `search` expression.
///
/// An NDC filter takes priority: its candidate spellings form an OR-group
/// that is returned alone when nothing else is set, or AND-ed with the
/// remaining clauses. A drug name expands to an OR-group over brand,
/// generic, and substance name; `exact_match` switches each of those field
/// comparisons to the `.exact` variant. Values are interpolated as quoted
/// literals; Lucene control characters in them are not escaped and can
/// change query semantics.
pub(crate) fn build_search(filters: &SearchFilters) -> String {
    let drug_name = non_empty(filters.drug_name.as_deref());
    let attributes = attribute_clauses(filters);

    if let Some(ndc) = non_empty(filters.ndc.as_deref()) {
        let candidates = normalize_ndc(ndc);
        if !candidates.is_empty() {
            let terms: Vec<String> = candidates
                .iter()
                .map(|c| format!("openfda.product_ndc:\"{c}\""))
                .collect();
            let ndc_clause = format!("({})", terms.join(" OR "));

            if drug_name.is_none() && attributes.is_empty() {
                return ndc_clause;
            }

            let mut parts = vec![ndc_clause];
            if let Some(name) = drug_name {
                parts.push(drug_name_clause(name, filters.exact_match));
            }
            parts.extend(attributes);
            return parts.join(" AND ");
        }
    }

    let mut parts = Vec::new();
    if let Some(name) = drug_name {
        parts.push(drug_name_clause(name, filters.exact_match));
    }
    parts.extend(attributes);

    if parts.is_empty() {
        MATCH_ALL.to_string()
    } else {
        parts.join(" AND ")
    }
}
