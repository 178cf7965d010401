//! Prompt construction for the router and extraction calls.

/// The router only sees the head of the document — enough to judge
/// relevance without paying for the full text.
pub const ROUTER_EXCERPT_CHARS: usize = 3000;

/// Truncate text at a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Cheap YES/NO relevance check over the document head.
pub fn router_prompt(ocr_text: &str) -> String {
    let excerpt = truncate_chars(ocr_text, ROUTER_EXCERPT_CHARS);
    format!(
        "Does the following text from a public document appear to contain a \
discussion, application, or vote related to a specific land use project, \
construction, solar project, or zoning change?\n\
Answer only with the single word YES or NO.\n\
\n\
---\n\
{excerpt}\n\
---"
    )
}

/// System instruction for the full extraction call.
pub fn extraction_system_prompt() -> &'static str {
    "You are a careful analyst of county planning documents: board and \
planning-commission minutes, agendas, and staff reports. You extract facts \
about solar land-use projects and the public sentiment around them. You \
answer with a single JSON object and nothing else. When a field is not \
stated in the document, use null (or an empty array) — never guess."
}

/// Full structured-extraction prompt. The JSON contract mirrors
/// `ProjectRecord` field for field.
pub fn extraction_prompt(ocr_text: &str, meeting_date_hint: Option<&str>) -> String {
    let hint = match meeting_date_hint {
        Some(date) => format!(
            "The filename suggests the meeting date may be {date}; \
confirm against the document text.\n\n"
        ),
        None => String::new(),
    };

    format!(
        "Analyze the following text from a county public document and extract \
every data point below about the solar or land-use project discussed.\n\
\n\
{hint}Return ONLY a JSON object with exactly these keys:\n\
- \"document_type\": \"agenda\" | \"minutes\" | \"staff_report\" | \"other\"\n\
- \"meeting_date\": ISO date string or null\n\
- \"applicant\": string or null\n\
- \"project_name\": string or null\n\
- \"capacity_mw\": number or null (nameplate megawatts)\n\
- \"acreage\": number or null\n\
- \"location\": string or null (address, parcel, tax map, or GPIN)\n\
- \"outcome\": \"approved\" | \"denied\" | \"recommend_approval\" | \
\"recommend_denial\" | \"deferred\" | \"unknown\"\n\
- \"vote\": null or {{\"ayes\": [names], \"nays\": [names], \"raw_line\": string or null}}\n\
- \"public_comments\": array of {{\"speaker\": string or null, \
\"position\": \"support\" | \"oppose\" | \"neutral\", \"summary\": string}}\n\
- \"decision_factors\": array of strings (concerns, findings, stated reasons)\n\
- \"overall_sentiment\": \"support\" | \"oppose\" | \"mixed\" | \"neutral\" or null\n\
- \"confidence\": number 0.0-1.0 (your confidence in this extraction)\n\
\n\
Document text:\n\
---\n\
{ocr_text}\n\
---"
    )
}
