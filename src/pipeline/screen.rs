//! Heuristic screening — regex pass over extracted text that flags pages
//! likely to discuss solar land-use matters and scrapes the obvious
//! fields. Runs entirely offline; the results are audit material and a
//! cheap cross-check against the LLM stage, not a replacement for it.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::extraction::PageExtraction;

/// Snippets are capped at this many characters for storage and export.
pub const SNIPPET_CAP: usize = 1000;

/// Terms that mark a page as a candidate: permit types, solar keywords,
/// and Virginia's 2232 comprehensive-plan review.
static CANDIDATE_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(Conditional\s+Use\s+Permit|Special\s+Use\s+Permit|Solar\b|Photovoltaic|2232)")
        .unwrap()
});

static TAB_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

static APPLICANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Applicant|Application|Project)\s*[:\-]\s*([A-Z0-9\-&.,' ]{5,120})").unwrap()
});
static CAPACITY_MW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3}(?:\.\d+)?)\s*MW\b").unwrap());
static ACRES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,4}(?:\.\d+)?)\s*acres?\b").unwrap());
static LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(Location|Address|Parcel|Tax\s*Map|GPIN|PIN)\s*[:\-]\s*([^\n]{5,160})")
        .unwrap()
});
static OUTCOME_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(approved|denied|recommend(?:ed)?\s+approval|recommend(?:ed)?\s+denial)\b")
        .unwrap()
});
static VOTE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(roll\s*call\s*vote|vote\s*(?:was\s*)?(?:taken)?(?:\s*and\s*the\s*results?\s*were)?)\s*[:\-]?\s*[^\n]{0,140}",
    )
    .unwrap()
});
static AYES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(Ayes?|Yeas?)\s*[:\-]\s*([^\n]+)").unwrap());
static NAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(Nays?|Nos?)\s*[:\-]\s*([^\n]+)").unwrap());
static DECISION_FACTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([^.]{0,140}\b(concern|because|due to|reason|findings?\s+of\s+fact|finding)[^.]{0,140})\.")
        .unwrap()
});

/// A page flagged as likely solar/land-use content.
#[derive(Debug, Clone)]
pub struct CandidateBlock {
    pub page: usize,
    /// Distinct terms that matched, for the audit trail.
    pub matched_terms: Vec<String>,
    /// Whitespace-normalized page text.
    pub text: String,
}

/// Fields scraped from a candidate block by regex alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedFields {
    pub project_or_applicant: Option<String>,
    pub mw: Option<String>,
    pub acres: Option<String>,
    pub location: Option<String>,
    pub outcome_phrase: Option<String>,
    pub vote_line: Option<String>,
    pub ayes: Option<String>,
    pub nays: Option<String>,
    #[serde(default)]
    pub decision_factor_snippets: Vec<String>,
}

impl ScrapedFields {
    pub fn is_empty(&self) -> bool {
        self.project_or_applicant.is_none()
            && self.mw.is_none()
            && self.acres.is_none()
            && self.location.is_none()
            && self.outcome_phrase.is_none()
            && self.vote_line.is_none()
            && self.ayes.is_none()
            && self.nays.is_none()
            && self.decision_factor_snippets.is_empty()
    }
}

/// Collapse runs of spaces and tabs; newlines survive so line-anchored
/// scrapes (ayes/nays, locations) keep working.
pub fn normalize_whitespace(text: &str) -> String {
    TAB_RUNS.replace_all(text, " ").to_string()
}

/// Identify pages likely to contain permit/solar content.
pub fn find_candidate_blocks(pages: &[PageExtraction]) -> Vec<CandidateBlock> {
    let mut blocks = Vec::new();
    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }
        let text = normalize_whitespace(&page.text);
        let mut terms: Vec<String> = CANDIDATE_TERMS
            .captures_iter(&text)
            .map(|c| c[1].to_string())
            .collect();
        if terms.is_empty() {
            continue;
        }
        terms.sort();
        terms.dedup();
        blocks.push(CandidateBlock {
            page: page.page_number,
            matched_terms: terms,
            text,
        });
    }
    blocks
}

/// Scrape structured fields from a candidate text block.
pub fn scrape_fields(text: &str) -> ScrapedFields {
    let mut fields = ScrapedFields::default();

    if let Some(m) = APPLICANT.captures(text) {
        fields.project_or_applicant = Some(m[2].trim().to_string());
    }
    if let Some(m) = CAPACITY_MW.captures(text) {
        fields.mw = Some(m[1].to_string());
    }
    if let Some(m) = ACRES.captures(text) {
        fields.acres = Some(m[1].to_string());
    }
    if let Some(m) = LOCATION.captures(text) {
        fields.location = Some(m[2].trim().to_string());
    }
    if let Some(m) = OUTCOME_PHRASE.find(text) {
        fields.outcome_phrase = Some(m.as_str().to_string());
    }
    if let Some(m) = VOTE_LINE.find(text) {
        fields.vote_line = Some(m.as_str().trim().to_string());
    }
    if let Some(m) = AYES.captures(text) {
        fields.ayes = Some(m[2].trim().to_string());
    }
    if let Some(m) = NAYS.captures(text) {
        fields.nays = Some(m[2].trim().to_string());
    }
    for m in DECISION_FACTOR.captures_iter(text) {
        fields
            .decision_factor_snippets
            .push(m[0].trim().to_string());
        if fields.decision_factor_snippets.len() >= 3 {
            break;
        }
    }

    fields
}

/// Truncate a snippet at a char boundary for storage.
pub fn cap_snippet(text: &str) -> String {
    text.chars().take(SNIPPET_CAP).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, text: &str) -> PageExtraction {
        PageExtraction {
            page_number: n,
            text: text.to_string(),
            confidence: 0.9,
        }
    }

    const SAMPLE_BLOCK: &str = "\
Public hearing: Conditional Use Permit 2023-04.
Applicant: Sunrise Energy LLC
The proposed photovoltaic facility would generate 80 MW on 650 acres.
Location: Tax Map 42-A, parcels along Route 58
Several residents spoke in opposition due to drainage concerns near the site.
The Commission recommended denial of the application.
Roll call vote was taken and the results were: 4-1.
Ayes: West, Updike, Edwards, Felts
Nays: Wyche
";

    #[test]
    fn candidate_pages_flagged_by_terms() {
        let pages = vec![
            page(1, "Invocation and pledge of allegiance."),
            page(2, "A Conditional Use Permit for a solar facility was heard."),
            page(3, "Water authority budget discussion."),
            page(4, "The 2232 review found the project consistent."),
        ];
        let blocks = find_candidate_blocks(&pages);
        let flagged: Vec<usize> = blocks.iter().map(|b| b.page).collect();
        assert_eq!(flagged, vec![2, 4]);
        assert!(blocks[0]
            .matched_terms
            .iter()
            .any(|t| t.eq_ignore_ascii_case("solar")));
    }

    #[test]
    fn blank_pages_skipped() {
        let pages = vec![page(1, "   \n  ")];
        assert!(find_candidate_blocks(&pages).is_empty());
    }

    #[test]
    fn matched_terms_deduplicated() {
        let pages = vec![page(1, "Solar solar SOLAR panels and more solar arrays")];
        let blocks = find_candidate_blocks(&pages);
        assert_eq!(blocks.len(), 1);
        // Case variants are distinct matches but "Solar"/"solar" dedupe to two at most
        assert!(blocks[0].matched_terms.len() <= 3);
    }

    #[test]
    fn scrape_full_block() {
        let fields = scrape_fields(SAMPLE_BLOCK);
        assert_eq!(
            fields.project_or_applicant.as_deref(),
            Some("Sunrise Energy LLC")
        );
        assert_eq!(fields.mw.as_deref(), Some("80"));
        assert_eq!(fields.acres.as_deref(), Some("650"));
        assert!(fields.location.unwrap().starts_with("Tax Map 42-A"));
        assert_eq!(fields.outcome_phrase.as_deref(), Some("recommended denial"));
        assert!(fields.vote_line.unwrap().to_lowercase().contains("roll call vote"));
        assert_eq!(fields.ayes.as_deref(), Some("West, Updike, Edwards, Felts"));
        assert_eq!(fields.nays.as_deref(), Some("Wyche"));
        assert!(!fields.decision_factor_snippets.is_empty());
        assert!(fields.decision_factor_snippets[0].contains("concerns"));
    }

    #[test]
    fn scrape_decimal_capacity_and_acreage() {
        let fields = scrape_fields("a 12.5 MW array on 99.75 acres of farmland");
        assert_eq!(fields.mw.as_deref(), Some("12.5"));
        assert_eq!(fields.acres.as_deref(), Some("99.75"));
    }

    #[test]
    fn scrape_empty_for_unrelated_text() {
        let fields = scrape_fields("The library budget was discussed at length.");
        assert!(fields.is_empty());
    }

    #[test]
    fn decision_factors_capped_at_three() {
        let text = "First concern about noise. Second concern about glare. \
                    Third concern about runoff. Fourth concern about decommissioning.";
        let fields = scrape_fields(text);
        assert_eq!(fields.decision_factor_snippets.len(), 3);
    }

    #[test]
    fn normalize_collapses_tabs_keeps_newlines() {
        let normalized = normalize_whitespace("Ayes:\tWest,   Updike\nNays: Wyche");
        assert_eq!(normalized, "Ayes: West, Updike\nNays: Wyche");
    }

    #[test]
    fn snippet_capped_at_char_boundary() {
        let long = "ä".repeat(2000);
        let capped = cap_snippet(&long);
        assert_eq!(capped.chars().count(), SNIPPET_CAP);
    }

    #[test]
    fn scraped_fields_round_trip_json() {
        let fields = scrape_fields(SAMPLE_BLOCK);
        let json = serde_json::to_string(&fields).unwrap();
        let back: ScrapedFields = serde_json::from_str(&json).unwrap();
        assert_eq!(fields, back);
    }
}
