//! Merges detector confidence, knowledge matches and feature corrections into
//! ranked classification results.

use crate::confidence::clamp01;
use crate::config::BoostConfig;
use crate::features::FeatureSignature;
use crate::knowledge::KnowledgeSnapshot;
use crate::knowledge::category::categorize;
use crate::matcher::match_label;
use crate::rules::{CorrectionRule, apply_corrections};
use crate::schema::{ClassificationResult, DetectionCandidate, Evidence};

/// Per-call view over one knowledge snapshot and one rule table.
pub struct Resolver<'a> {
    snapshot: &'a KnowledgeSnapshot,
    rules: &'a [CorrectionRule],
    boosts: &'a BoostConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(
        snapshot: &'a KnowledgeSnapshot,
        rules: &'a [CorrectionRule],
        boosts: &'a BoostConfig,
    ) -> Self {
        Self {
            snapshot,
            rules,
            boosts,
        }
    }

    /// Run match, correct, re-match and score for a single candidate.
    pub fn resolve_candidate(
        &self,
        rank: usize,
        candidate: &DetectionCandidate,
        signature: &FeatureSignature,
    ) -> ClassificationResult {
        let detector_confidence = clamp01(candidate.confidence);

        let first = match_label(&candidate.label, self.snapshot, self.boosts);
        let working = first
            .entry
            .as_ref()
            .map_or_else(|| candidate.label.clone(), |e| e.canonical_name.clone());

        let correction = apply_corrections(&working, signature, self.rules);
        let matched = if correction.applied {
            match_label(&correction.label, self.snapshot, self.boosts)
        } else {
            first
        };

        let mut confidence = clamp01(detector_confidence + matched.boost);
        if correction.applied {
            confidence = clamp01(confidence + correction.strength);
        }

        let final_label = match (&matched.entry, correction.applied) {
            (Some(entry), _) => entry.canonical_name.clone(),
            (None, true) => correction.label.clone(),
            (None, false) => candidate.label.clone(),
        };
        let category = matched
            .entry
            .as_ref()
            .map(|e| e.category.clone())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| categorize(&final_label).to_string());

        let mut evidence = vec![Evidence::detector_score(&candidate.label, detector_confidence)];
        if let (true, Some(rule_id)) = (correction.applied, &correction.rule_id) {
            evidence.push(Evidence::rule_correction(
                rule_id,
                &correction.label,
                correction.strength,
            ));
        }
        if let Some(entry) = &matched.entry {
            evidence.push(Evidence::knowledge_match(
                matched.match_type,
                &entry.canonical_name,
                matched.boost,
            ));
        }

        tracing::debug!(
            "candidate {} {:?}: {:?} -> {:?} ({}, corrected: {}) = {:.3}",
            rank,
            candidate.label,
            working,
            final_label,
            matched.match_type.as_str(),
            correction.applied,
            confidence
        );

        ClassificationResult {
            final_label,
            final_confidence: confidence,
            match_type: matched.match_type,
            source_entry: matched.entry,
            correction_applied: correction.applied,
            correction_rule: correction.rule_id,
            detected_label: candidate.label.clone(),
            detector_rank: rank,
            category,
            evidence,
            alternates: Vec::new(),
        }
    }

    /// Resolve every candidate against its signature and rank the results.
    ///
    /// `signatures[i]` belongs to `detections[i]`; a missing signature is
    /// treated as unknown.
    pub fn resolve(
        &self,
        detections: &[DetectionCandidate],
        signatures: &[FeatureSignature],
    ) -> Vec<ClassificationResult> {
        let unknown = FeatureSignature::unknown();
        let results = detections
            .iter()
            .enumerate()
            .map(|(i, candidate)| {
                self.resolve_candidate(i, candidate, signatures.get(i).unwrap_or(&unknown))
            })
            .collect();
        rank(results)
    }
}

/// Order by descending confidence, keeping detector order on ties, and give
/// the head the remaining results as its alternates.
pub fn rank(mut results: Vec<ClassificationResult>) -> Vec<ClassificationResult> {
    results.sort_by(|a, b| b.final_confidence.total_cmp(&a.final_confidence));

    if results.len() > 1 {
        let alternates = results[1..].to_vec();
        let head = results.remove(0).with_alternates(alternates);
        results.insert(0, head);
    }
    results
}
