//! Prompts for schema-guided extraction.
//!
//! The prompt is assembled from four parts, in this order:
//!
//! 1. a role preamble ([`DEFAULT_ROLE_PREAMBLE`], or the caller's override
//!    from [`crate::config::ExtractionConfig::system_prompt`]),
//! 2. the OCR text of the document,
//! 3. the caller's schema description, passed verbatim,
//! 4. a closing instruction demanding JSON and nothing else.
//!
//! Unit tests inspect the assembled prompt directly, so prompt regressions
//! show up without a live model.

/// Role framing placed before the document text.
pub const DEFAULT_ROLE_PREAMBLE: &str = "You are an expert real estate lawyer and you have been asked to extract the following data points from a real estate purchase agreement:";

/// Closing instruction. Models are told twice that only JSON is acceptable;
/// the output is still treated as untrusted by the aggregator.
pub const JSON_ONLY_INSTRUCTION: &str = "Now please extract details from the content and export in a JSON array format, return ONLY the JSON array:";

/// Data points for a commercial real-estate purchase agreement.
///
/// Used by the CLI when no `--schema` file is given.
pub const DEFAULT_SCHEMA: &str = r#"{
    "address": "address of the property being sold",
    "purchase_price": "purchase price amount in the form of $X",
    "deposit": "deposit amount in the form of $X",
    "deposit_timing": "if any special considerations for deposit timing",
    "due_diligence_period": "length of the due diligence period",
    "closing_date": "defined closing date in the form of YYYY-MM-DD",
    "conditions_precedent": "conditions precedent for closing",
    "casualty_condemnation_provisions": "Summarize the casualty/condemnation provisions",
    "representations_and_warranties": "In detail, list the types of representations and warranties made",
    "disclaimers": "Is there any mention of it being a sale with a disclaimer of warranties. List them if present",
    "closing_costs": "State how closing costs are allocated",
    "remedies": "Summarize the remedies for buyer/seller default",
    "broker": "Identify the broker and commission payable",
    "notice_requirements": "Note the notice requirements",
    "post_closing": "Summarize any details for post-closing requirements",
    "notes": "Make a note of any other important details that may be relevant that have not been captured above"
}"#;

/// Build the full extraction prompt for one document.
///
/// `schema` is embedded as-is; it is not parsed or validated.
pub fn build_extraction_prompt(preamble: Option<&str>, content: &str, schema: &str) -> String {
    let preamble = preamble.unwrap_or(DEFAULT_ROLE_PREAMBLE);
    format!(
        "{preamble}\n\n\
         {content}\n\n\
         Above is the content; please try to extract all data points from the content above \
         and export in a JSON array format:\n\
         {schema}\n\n\
         {JSON_ONLY_INSTRUCTION}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_sections_in_order() {
        let prompt = build_extraction_prompt(None, "DOC TEXT 123 Main St", r#"{"address": "..."}"#);

        let role = prompt.find(DEFAULT_ROLE_PREAMBLE).unwrap();
        let content = prompt.find("DOC TEXT 123 Main St").unwrap();
        let schema = prompt.find(r#"{"address": "..."}"#).unwrap();
        let closing = prompt.find(JSON_ONLY_INSTRUCTION).unwrap();

        assert!(role < content);
        assert!(content < schema);
        assert!(schema < closing);
    }

    #[test]
    fn preamble_override() {
        let prompt = build_extraction_prompt(Some("You are a title examiner."), "x", "{}");
        assert!(prompt.starts_with("You are a title examiner."));
        assert!(!prompt.contains(DEFAULT_ROLE_PREAMBLE));
    }

    #[test]
    fn schema_is_verbatim_even_when_not_json() {
        let schema = "address: street address\nprice: {broken";
        let prompt = build_extraction_prompt(None, "x", schema);
        assert!(prompt.contains(schema));
    }

    #[test]
    fn default_schema_is_valid_json() {
        let v: serde_json::Value = serde_json::from_str(DEFAULT_SCHEMA).unwrap();
        let obj = v.as_object().unwrap();
        assert!(obj.contains_key("address"));
        assert!(obj.contains_key("purchase_price"));
        assert_eq!(obj.len(), 16);
    }
}
