//! Ordered, data-driven label correction table.
//!
//! Each rule is a conjunction of predicates over the working label and the
//! feature signature. Rules are evaluated in order and the first match wins.

mod defaults;

pub use defaults::default_rules;

use crate::confidence::clamp01;
use crate::features::{BlobPattern, EnvironmentClass, FeatureSignature, HueBucket};
use crate::matcher::token_set;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Predicate {
    /// Working label contains all tokens of the target
    LabelIs(String),
    LabelAnyOf(Vec<String>),
    AspectRatioAbove(f32),
    AspectRatioAtLeast(f32),
    BlueRatioAtLeast(f32),
    EdgeVarianceAtLeast(f32),
    BlobPattern(BlobPattern),
    Environment(EnvironmentClass),
    DominantHue(HueBucket),
    DominantHueAnyOf(Vec<HueBucket>),
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    pub fn matches(&self, label: &str, signature: &FeatureSignature) -> bool {
        match self {
            Predicate::LabelIs(target) => label_contains(label, target),
            Predicate::LabelAnyOf(targets) => targets.iter().any(|t| label_contains(label, t)),
            Predicate::AspectRatioAbove(min) => signature.aspect_ratio.is_some_and(|v| v > *min),
            Predicate::AspectRatioAtLeast(min) => signature.aspect_ratio.is_some_and(|v| v >= *min),
            Predicate::BlueRatioAtLeast(min) => signature.blue_ratio.is_some_and(|v| v >= *min),
            Predicate::EdgeVarianceAtLeast(min) => {
                signature.edge_variance.is_some_and(|v| v >= *min)
            }
            Predicate::BlobPattern(expected) => {
                signature.blob_pattern_class != BlobPattern::Unknown
                    && signature.blob_pattern_class == *expected
            }
            Predicate::Environment(expected) => {
                signature.environment_class != EnvironmentClass::Unknown
                    && signature.environment_class == *expected
            }
            Predicate::DominantHue(expected) => {
                signature.dominant_hue_bucket != HueBucket::Unknown
                    && signature.dominant_hue_bucket == *expected
            }
            Predicate::DominantHueAnyOf(expected) => {
                signature.dominant_hue_bucket != HueBucket::Unknown
                    && expected.contains(&signature.dominant_hue_bucket)
            }
            Predicate::AnyOf(alternatives) => {
                alternatives.iter().any(|p| p.matches(label, signature))
            }
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Predicate::LabelIs(target) => validate_label(target),
            Predicate::LabelAnyOf(targets) => {
                if targets.is_empty() {
                    return Err("label_any_of needs at least one label".into());
                }
                targets.iter().try_for_each(|t| validate_label(t))
            }
            Predicate::AspectRatioAbove(v)
            | Predicate::AspectRatioAtLeast(v)
            | Predicate::BlueRatioAtLeast(v)
            | Predicate::EdgeVarianceAtLeast(v) => {
                if v.is_finite() {
                    Ok(())
                } else {
                    Err(format!("threshold {} is not finite", v))
                }
            }
            Predicate::BlobPattern(BlobPattern::Unknown)
            | Predicate::Environment(EnvironmentClass::Unknown)
            | Predicate::DominantHue(HueBucket::Unknown) => {
                Err("unknown feature values never match".into())
            }
            Predicate::BlobPattern(_) | Predicate::Environment(_) | Predicate::DominantHue(_) => {
                Ok(())
            }
            Predicate::DominantHueAnyOf(buckets) => {
                if buckets.is_empty() || buckets.contains(&HueBucket::Unknown) {
                    Err("dominant_hue_any_of needs known hue buckets".into())
                } else {
                    Ok(())
                }
            }
            Predicate::AnyOf(alternatives) => {
                if alternatives.is_empty() {
                    return Err("any_of needs at least one predicate".into());
                }
                alternatives.iter().try_for_each(Predicate::validate)
            }
        }
    }
}

fn label_contains(label: &str, target: &str) -> bool {
    let target = token_set(target);
    !target.is_empty() && target.is_subset(&token_set(label))
}

fn validate_label(target: &str) -> Result<(), String> {
    if token_set(target).is_empty() {
        Err(format!("label {:?} has no usable tokens", target))
    } else {
        Ok(())
    }
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::LabelIs(target) => write!(f, "label is {}", target),
            Predicate::LabelAnyOf(targets) => write!(f, "label is {}", targets.join(" or ")),
            Predicate::AspectRatioAbove(v) => write!(f, "aspect_ratio > {}", v),
            Predicate::AspectRatioAtLeast(v) => write!(f, "aspect_ratio >= {}", v),
            Predicate::BlueRatioAtLeast(v) => write!(f, "blue_ratio >= {}", v),
            Predicate::EdgeVarianceAtLeast(v) => write!(f, "edge_variance >= {}", v),
            Predicate::BlobPattern(p) => write!(f, "blob pattern {}", p.as_str()),
            Predicate::Environment(e) => write!(f, "environment {}", e.as_str()),
            Predicate::DominantHue(h) => write!(f, "dominant hue {}", h.as_str()),
            Predicate::DominantHueAnyOf(hues) => {
                let names: Vec<&str> = hues.iter().map(HueBucket::as_str).collect();
                write!(f, "dominant hue {}", names.join(" or "))
            }
            Predicate::AnyOf(alternatives) => write!(f, "({})", join(alternatives, " or ")),
        }
    }
}

/// One row of the correction table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CorrectionRule {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// All predicates must hold
    pub when: Vec<Predicate>,
    pub rewrite_to: String,
    pub strength: f32,
}

impl CorrectionRule {
    pub fn new(
        id: impl Into<String>,
        when: Vec<Predicate>,
        rewrite_to: impl Into<String>,
        strength: f32,
    ) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            when,
            rewrite_to: rewrite_to.into(),
            strength,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// A rule without predicates never fires.
    pub fn matches(&self, label: &str, signature: &FeatureSignature) -> bool {
        !self.when.is_empty() && self.when.iter().all(|p| p.matches(label, signature))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("rule id is empty".into());
        }
        if self.rewrite_to.trim().is_empty() {
            return Err(format!("rule {} has an empty rewrite target", self.id));
        }
        if !(0.0..=1.0).contains(&self.strength) {
            return Err(format!(
                "rule {} strength {} is outside [0, 1]",
                self.id, self.strength
            ));
        }
        if self.when.is_empty() {
            return Err(format!("rule {} has no predicates", self.id));
        }
        for predicate in &self.when {
            predicate
                .validate()
                .map_err(|reason| format!("rule {}: {}", self.id, reason))?;
        }
        Ok(())
    }

    pub fn condition(&self) -> String {
        join(&self.when, " and ")
    }
}

/// Outcome of running the correction table over one label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Correction {
    pub label: String,
    pub strength: f32,
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl Correction {
    pub fn unchanged(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            strength: 0.0,
            applied: false,
            rule_id: None,
        }
    }
}

/// Apply the first rule in `rules` whose predicates all hold.
///
/// A fully unknown signature (degenerate region or empty image) never
/// triggers a rewrite.
pub fn apply_corrections(
    label: &str,
    signature: &FeatureSignature,
    rules: &[CorrectionRule],
) -> Correction {
    if signature.is_unknown() {
        return Correction::unchanged(label);
    }

    match rules.iter().find(|rule| rule.matches(label, signature)) {
        Some(rule) => {
            tracing::debug!("rule {} rewrote {:?} to {:?}", rule.id, label, rule.rewrite_to);
            Correction {
                label: rule.rewrite_to.clone(),
                strength: clamp01(rule.strength),
                applied: true,
                rule_id: Some(rule.id.clone()),
            }
        }
        None => Correction::unchanged(label),
    }
}
