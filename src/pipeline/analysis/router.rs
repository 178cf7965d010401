//! Relevance router — a cheap model pass that decides whether a document
//! warrants full extraction. Most agenda packets are budgets, road
//! matters, and appointments; routing them out first keeps the expensive
//! extraction calls for documents that earn them.

use super::prompt::router_prompt;
use super::types::{LlmClient, Relevance};
use super::AnalysisError;
use crate::config;

/// Ask the router model whether the document discusses a land-use /
/// solar / zoning matter. The verdict is YES-biased on the model side;
/// anything that doesn't read as YES is treated as irrelevant.
pub fn check_relevance(
    client: &dyn LlmClient,
    ocr_text: &str,
) -> Result<Relevance, AnalysisError> {
    let prompt = router_prompt(ocr_text);
    let response = client.generate(config::ROUTER_MODEL, &prompt, None)?;
    Ok(parse_verdict(&response))
}

fn parse_verdict(response: &str) -> Relevance {
    if response.to_uppercase().contains("YES") {
        Relevance::Relevant
    } else {
        Relevance::Irrelevant
    }
}
