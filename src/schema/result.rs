use super::{Evidence, KnowledgeEntry, SCHEMA_VERSION};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How a label was resolved against the knowledge base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Partial,
    None,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Partial => "partial",
            MatchType::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchResult {
    pub entry: Option<KnowledgeEntry>,
    pub match_type: MatchType,
    pub boost: f32,
}

impl MatchResult {
    pub fn none() -> Self {
        Self {
            entry: None,
            match_type: MatchType::None,
            boost: 0.0,
        }
    }

    pub fn is_match(&self) -> bool {
        self.entry.is_some()
    }
}

/// Final, immutable outcome for one detector candidate.
///
/// Only the primary (highest ranked) result of a call carries `alternates`;
/// the alternates themselves have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult {
    pub final_label: String,
    pub final_confidence: f32,
    pub match_type: MatchType,
    pub source_entry: Option<KnowledgeEntry>,
    pub correction_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_rule: Option<String>,
    pub detected_label: String,
    pub detector_rank: usize,
    pub category: String,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default)]
    pub alternates: Vec<ClassificationResult>,
}

impl ClassificationResult {
    /// Neither the knowledge base nor any feature rule had anything to say.
    pub fn is_unresolved(&self) -> bool {
        self.match_type == MatchType::None && !self.correction_applied
    }

    pub(crate) fn with_alternates(mut self, alternates: Vec<ClassificationResult>) -> Self {
        self.alternates = alternates;
        self
    }
}

/// Outcome of a classify call as seen by a caller deciding on fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Resolved,
    /// Every candidate has `match_type = none` and no correction; callers may
    /// hand the image to an external descriptive service.
    Unresolved,
    NoDetections,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationReport {
    pub status: ResolutionStatus,
    pub results: Vec<ClassificationResult>,
    pub version: String,
}

impl ClassificationReport {
    pub fn from_results(results: Vec<ClassificationResult>) -> Self {
        let status = if results.is_empty() {
            ResolutionStatus::NoDetections
        } else if results.iter().all(ClassificationResult::is_unresolved) {
            ResolutionStatus::Unresolved
        } else {
            ResolutionStatus::Resolved
        };

        Self {
            status,
            results,
            version: SCHEMA_VERSION.to_string(),
        }
    }

    pub fn primary(&self) -> Option<&ClassificationResult> {
        self.results.first()
    }

    pub fn needs_fallback(&self) -> bool {
        self.status == ResolutionStatus::Unresolved
    }
}
