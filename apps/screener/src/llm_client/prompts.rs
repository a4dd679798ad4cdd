// Cross-cutting prompt fragments for the inference backend.
// Stage instruction templates are external assets read from the prompts directory.

use crate::inference::OutputContract;

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON value. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Builds the system prompt for one call: the JSON-only rule plus the schema
/// the reply must satisfy.
pub fn structured_output_system(contract: &OutputContract) -> String {
    let schema = serde_json::to_string_pretty(&contract.json_schema())
        .unwrap_or_else(|_| contract.json_schema().to_string());
    format!(
        "{JSON_ONLY_SYSTEM}\n\nYour reply (\"{}\") MUST conform to this JSON Schema:\n{schema}",
        contract.name
    )
}
