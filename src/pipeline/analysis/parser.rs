//! Parse the extraction model's response into a `ProjectRecord`.
//!
//! Models fence their JSON more often than not, and sometimes preface it
//! with prose. The parser accepts a ```json fence anywhere in the
//! response, or a bare object. Array items that fail to deserialize are
//! dropped individually rather than failing the whole record.

use serde::Deserialize;

use super::AnalysisError;
use crate::models::{Outcome, ProjectRecord, PublicComment, Sentiment, VoteTally};

/// Parse a model response into a record plus the canonical JSON that
/// gets stored in the database.
pub fn parse_extraction_response(
    response: &str,
) -> Result<(ProjectRecord, String), AnalysisError> {
    let json_str = extract_json_block(response)?;
    let record = parse_record_json(&json_str)?;
    let canonical = serde_json::to_string(&record)
        .map_err(|e| AnalysisError::JsonParsing(e.to_string()))?;
    Ok((record, canonical))
}

/// Pull the JSON object out of the response: fenced block if present,
/// otherwise the bare trimmed body.
fn extract_json_block(response: &str) -> Result<String, AnalysisError> {
    if let Some(fence_start) = response.find("```json") {
        let content_start = fence_start + "```json".len();
        let rest = &response[content_start..];
        let fence_end = rest
            .find("```")
            .ok_or_else(|| AnalysisError::MalformedResponse("Unclosed JSON fence".into()))?;
        return Ok(rest[..fence_end].trim().to_string());
    }

    let trimmed = response.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    Err(AnalysisError::MalformedResponse(
        "No JSON object found in response".into(),
    ))
}

/// Parse the JSON string into a `ProjectRecord`, tolerating per-item
/// garbage in the arrays.
fn parse_record_json(json_str: &str) -> Result<ProjectRecord, AnalysisError> {
    #[derive(Deserialize)]
    struct RawRecord {
        document_type: Option<String>,
        meeting_date: Option<String>,
        applicant: Option<String>,
        project_name: Option<String>,
        capacity_mw: Option<f64>,
        acreage: Option<f64>,
        location: Option<String>,
        outcome: Option<serde_json::Value>,
        vote: Option<serde_json::Value>,
        public_comments: Option<Vec<serde_json::Value>>,
        decision_factors: Option<Vec<serde_json::Value>>,
        overall_sentiment: Option<serde_json::Value>,
        confidence: Option<f32>,
    }

    let raw: RawRecord =
        serde_json::from_str(json_str).map_err(|e| AnalysisError::JsonParsing(e.to_string()))?;

    let outcome: Outcome = raw
        .outcome
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default();
    let vote: Option<VoteTally> = raw.vote.and_then(|v| serde_json::from_value(v).ok());
    let overall_sentiment: Option<Sentiment> = raw
        .overall_sentiment
        .and_then(|v| serde_json::from_value(v).ok());

    let public_comments: Vec<PublicComment> =
        parse_array_lenient(raw.public_comments.as_deref());
    let decision_factors: Vec<String> = parse_array_lenient(raw.decision_factors.as_deref());

    Ok(ProjectRecord {
        document_type: raw.document_type,
        meeting_date: raw.meeting_date,
        applicant: raw.applicant,
        project_name: raw.project_name,
        capacity_mw: raw.capacity_mw,
        acreage: raw.acreage,
        location: raw.location,
        outcome,
        vote,
        public_comments,
        decision_factors,
        overall_sentiment,
        confidence: raw.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
    })
}

/// Parse an array leniently — skip items that fail to deserialize.
fn parse_array_lenient<T: for<'de> Deserialize<'de>>(
    items: Option<&[serde_json::Value]>,
) -> Vec<T> {
    match items {
        None => vec![],
        Some(arr) => arr
            .iter()
            .filter_map(|v| serde_json::from_value(v.clone()).ok())
            .collect(),
    }
}
