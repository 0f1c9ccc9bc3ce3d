//! Static tool table and the shared runner behind every label tool.
//!
//! The seven tools differ only in which label section they surface (and, for
//! `get_drug_indications`, the structured reshaping), so a single table
//! entry per tool drives listing and dispatch.

use serde_json::Value;

use crate::error::OpenFdaMcpError;
use crate::query::{self, SearchFilters};
use crate::sources::openfda::OpenFdaClient;
use crate::transform::{self, DrugInfo};

const MIN_LIMIT: i64 = 1;
const MAX_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy)]
pub(crate) enum ToolOutput {
    /// Concatenate the named label section across result records.
    Section(&'static str),
    /// Reshape each record into a [`DrugInfo`].
    DrugInfo,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub output: ToolOutput,
}

pub(crate) const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "get_drug_indications",
        description: "Returns FDA-approved indications. Supports filtering by drug name, NDC, \
                      manufacturer, dosage form, and route.",
        output: ToolOutput::DrugInfo,
    },
    ToolSpec {
        name: "get_drug_dosage",
        description: "Returns FDA-approved dosage and administration instructions. Supports \
                      filtering by drug name, NDC, manufacturer, dosage form, and route.",
        output: ToolOutput::Section("dosage_and_administration"),
    },
    ToolSpec {
        name: "get_specific_populations",
        description: "Returns FDA 'Use in Specific Populations' info. Supports filtering by drug \
                      name, NDC, manufacturer, dosage form, and route.",
        output: ToolOutput::Section("use_in_specific_populations"),
    },
    ToolSpec {
        name: "get_storage_handling",
        description: "Returns FDA 'How Supplied/Storage and Handling' info. Supports filtering \
                      by drug name, NDC, manufacturer, dosage form, and route.",
        output: ToolOutput::Section("how_supplied_storage_and_handling"),
    },
    ToolSpec {
        name: "get_warnings_precautions",
        description: "Returns FDA 'Warnings and Precautions' info. Supports filtering by drug \
                      name, NDC, manufacturer, dosage form, and route.",
        output: ToolOutput::Section("warnings_and_precautions"),
    },
    ToolSpec {
        name: "get_clinical_pharmacology",
        description: "Returns FDA 'Clinical Pharmacology' info. Supports filtering by drug name, \
                      NDC, manufacturer, dosage form, and route.",
        output: ToolOutput::Section("clinical_pharmacology"),
    },
    ToolSpec {
        name: "get_drug_description",
        description: "Returns FDA-approved product description. Supports filtering by drug name, \
                      NDC, manufacturer, dosage form, and route.",
        output: ToolOutput::Section("description"),
    },
];

pub(crate) fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|spec| spec.name == name)
}

fn clamp_limit(limit: i64) -> usize {
    limit.clamp(MIN_LIMIT, MAX_LIMIT) as usize
}

/// Builds the query, fetches, and shapes the result for one tool call.
/// Returns a JSON array: strings for section tools, [`DrugInfo`] records
/// for the indications tool. No results means an empty array.
pub(crate) async fn run_tool(
    client: &OpenFdaClient,
    spec: &ToolSpec,
    filters: &SearchFilters,
) -> Result<Value, OpenFdaMcpError> {
    let search = query::build_search(filters);
    let limit = clamp_limit(filters.limit);
    let response = client.label_search(&search, limit).await?;

    let value = match spec.output {
        ToolOutput::Section(section) => {
            let texts: Vec<String> = response
                .results
                .iter()
                .flat_map(|record| transform::section_text(record, section))
                .collect();
            serde_json::to_value(texts)?
        }
        ToolOutput::DrugInfo => {
            let records: Vec<DrugInfo> =
                response.results.iter().map(transform::drug_info).collect();
            serde_json::to_value(records)?
        }
    };
    Ok(value)
}
