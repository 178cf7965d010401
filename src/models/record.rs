//! Structured record of a solar land-use matter — the data points of
//! interest the analysis stage asks the model to fill in.

use serde::{Deserialize, Serialize};

/// Decision outcome for a permit or rezoning matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Approved,
    Denied,
    RecommendApproval,
    RecommendDenial,
    Deferred,
    #[default]
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Denied => "denied",
            Self::RecommendApproval => "recommend_approval",
            Self::RecommendDenial => "recommend_denial",
            Self::Deferred => "deferred",
            Self::Unknown => "unknown",
        }
    }
}

/// Overall public sentiment expressed in a document toward the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Support,
    Oppose,
    Mixed,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Support => "support",
            Self::Oppose => "oppose",
            Self::Mixed => "mixed",
            Self::Neutral => "neutral",
        }
    }
}

/// Position taken by a single speaker during public comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Support,
    Oppose,
    Neutral,
}

/// One public comment captured in the minutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicComment {
    /// Speaker name if recorded, e.g. "J. Smith, adjacent landowner".
    pub speaker: Option<String>,
    pub position: Position,
    pub summary: String,
}

/// Roll-call vote tally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub ayes: Vec<String>,
    pub nays: Vec<String>,
    /// The raw vote line as it appears in the document, for audit.
    pub raw_line: Option<String>,
}

/// Everything the extraction model is asked to pull out of one document.
///
/// All scalar fields are optional — minutes rarely carry every data point,
/// and the parser keeps whatever the model could ground in the text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// agenda, minutes, staff_report, or other.
    pub document_type: Option<String>,
    /// ISO date of the meeting, if stated in the document.
    pub meeting_date: Option<String>,
    pub applicant: Option<String>,
    pub project_name: Option<String>,
    /// Nameplate capacity in megawatts.
    pub capacity_mw: Option<f64>,
    /// Project site acreage.
    pub acreage: Option<f64>,
    /// Address, parcel, tax map, or GPIN/PIN reference.
    pub location: Option<String>,
    #[serde(default)]
    pub outcome: Outcome,
    pub vote: Option<VoteTally>,
    #[serde(default)]
    pub public_comments: Vec<PublicComment>,
    /// Concerns, findings, and stated reasons behind the decision.
    #[serde(default)]
    pub decision_factors: Vec<String>,
    pub overall_sentiment: Option<Sentiment>,
    /// Model's self-reported confidence, 0.0-1.0.
    #[serde(default)]
    pub confidence: f32,
}

impl ProjectRecord {
    /// A record is substantive when it names a project or carries at least
    /// one concrete data point. Used to catch extractions that technically
    /// parsed but contain nothing.
    pub fn is_substantive(&self) -> bool {
        self.applicant.is_some()
            || self.project_name.is_some()
            || self.capacity_mw.is_some()
            || self.acreage.is_some()
            || self.location.is_some()
            || self.outcome != Outcome::Unknown
            || !self.public_comments.is_empty()
    }
}
