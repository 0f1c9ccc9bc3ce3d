//! Reshapes upstream label records into tool output values.

use serde::Serialize;

use crate::sources::openfda::LabelResult;

pub(crate) const INDICATIONS_SECTION: &str = "indications_and_usage";

/// Structured identity-plus-indications record returned by
/// `get_drug_indications`. Fields the upstream record lacks come back as
/// empty lists; a missing section is indistinguishable from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct DrugInfo {
    pub brand_names: Vec<String>,
    pub generic_names: Vec<String>,
    pub manufacturer: Vec<String>,
    pub indications: Vec<String>,
    pub ndc_codes: Vec<String>,
}

/// Extracts one label section as free text. Absent keys, non-array values,
/// and non-string elements all degrade to empty output.
pub(crate) fn section_text(record: &LabelResult, section: &str) -> Vec<String> {
    record
        .sections
        .get(section)
        .and_then(serde_json::Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn drug_info(record: &LabelResult) -> DrugInfo {
    DrugInfo {
        brand_names: record.openfda.brand_name.clone(),
        generic_names: record.openfda.generic_name.clone(),
        manufacturer: record.openfda.manufacturer_name.clone(),
        indications: section_text(record, INDICATIONS_SECTION),
        ndc_codes: record.openfda.product_ndc.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(body: serde_json::Value) -> LabelResult {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn section_text_reads_string_arrays() {
        let rec = record(serde_json::json!({
            "dosage_and_administration": ["Take one tablet daily."]
        }));
        assert_eq!(
            section_text(&rec, "dosage_and_administration"),
            vec!["Take one tablet daily."]
        );
    }

    #[test]
    fn section_text_defaults_absent_and_malformed_sections_to_empty() {
        let rec = record(serde_json::json!({
            "warnings_and_precautions": "not an array"
        }));
        assert!(section_text(&rec, "warnings_and_precautions").is_empty());
        assert!(section_text(&rec, "clinical_pharmacology").is_empty());
    }

    #[test]
    fn drug_info_defaults_missing_fields_to_empty_lists() {
        let rec = record(serde_json::json!({}));
        assert_eq!(drug_info(&rec), DrugInfo::default());
    }

    #[test]
    fn drug_info_maps_identity_and_indications() {
        let rec = record(serde_json::json!({
            "indications_and_usage": ["For relief of minor aches."],
            "openfda": {
                "brand_name": ["ASPIRIN"],
                "generic_name": ["aspirin"],
                "manufacturer_name": ["Bayer"],
                "product_ndc": ["12345-6789"]
            }
        }));

        let info = drug_info(&rec);
        assert_eq!(info.brand_names, vec!["ASPIRIN"]);
        assert_eq!(info.generic_names, vec!["aspirin"]);
        assert_eq!(info.manufacturer, vec!["Bayer"]);
        assert_eq!(info.indications, vec!["For relief of minor aches."]);
        assert_eq!(info.ndc_codes, vec!["12345-6789"]);
    }
}
