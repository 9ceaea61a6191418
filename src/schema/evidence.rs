use crate::schema::MatchType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    Detector,
    Knowledge,
    Feature,
}

/// One contribution to a classification result.
///
/// Evidence is a trail for callers and tooling; the resolver computes scores
/// independently and never reads evidence back.
#[derive(Debug, Serialize, Deserialize, JsonSchema, Clone, PartialEq)]
pub struct Evidence {
    pub signal: Signal,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub supports: Vec<String>,
    pub confidence: f32,
}

impl Evidence {
    /// Create evidence for the raw detector guess
    ///
    /// Confidence is the detector's own score for the label.
    pub fn detector_score(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            signal: Signal::Detector,
            key: "detector.label".into(),
            value: Some(label.into()),
            supports: vec!["final_confidence".into()],
            confidence,
        }
    }

    /// Create evidence for a knowledge base match
    ///
    /// Confidence is the boost the match contributed.
    pub fn knowledge_match(
        match_type: MatchType,
        canonical_name: impl Into<String>,
        boost: f32,
    ) -> Self {
        Self {
            signal: Signal::Knowledge,
            key: format!("knowledge.{}", match_type.as_str()),
            value: Some(canonical_name.into()),
            supports: vec![
                "final_label".into(),
                "source_entry".into(),
                "final_confidence".into(),
            ],
            confidence: boost,
        }
    }

    /// Create evidence for a feature rule that rewrote the working label
    ///
    /// Confidence is the rule's correction strength.
    pub fn rule_correction(
        rule_id: impl AsRef<str>,
        label: impl Into<String>,
        strength: f32,
    ) -> Self {
        Self {
            signal: Signal::Feature,
            key: format!("rule.{}", rule_id.as_ref()),
            value: Some(label.into()),
            supports: vec![
                "final_label".into(),
                "correction_applied".into(),
                "final_confidence".into(),
            ],
            confidence: strength,
        }
    }
}
