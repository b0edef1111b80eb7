//! Prompt template sent to the language model

use super::ExplanationRequest;

/// Region qualifier used when none is configured
pub const DEFAULT_REGION: &str = "MY";

/// Builds the explanation prompt for a term
///
/// The response structure (Meaning, Typical Usage Context, three numbered
/// Example Sentences) is what the detail view renders, so it must not drift.
pub fn build_prompt(request: &ExplanationRequest) -> String {
    format!(
        "Explain the {region} slang term '{term}'.\n\n\
         Structure the response using Markdown:\n\
         ### Meaning\n\
         Provide the definition here.\n\n\
         ### Typical Usage Context\n\
         Describe when and how it's typically used.\n\n\
         ### Example Sentences\n\
         Provide three numbered example sentences:\n\
         1. Example 1\n\
         2. Example 2\n\
         3. Example 3\n\n\
         Keep the explanation clear and concise.",
        region = request.region,
        term = request.term,
    )
}
