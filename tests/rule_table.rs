mod common;

use common::*;
use faunasense::ClassificationEngine;
use faunasense::config::{BoostConfig, FeatureThresholds, ResolverConfig};
use faunasense::features::{BlobPattern, EnvironmentClass, FeatureSignature, HueBucket};
use faunasense::knowledge::SharedKnowledge;
use faunasense::rules::{CorrectionRule, Predicate, apply_corrections, default_rules};
use faunasense::schema::DetectionCandidate;
use std::sync::Arc;

fn defaults() -> Vec<CorrectionRule> {
    default_rules(&FeatureThresholds::default(), &BoostConfig::default())
}

#[test]
fn stripes_take_priority_over_spots() {
    let signature = FeatureSignature {
        aspect_ratio: Some(1.2),
        dominant_hue_bucket: HueBucket::Orange,
        blue_ratio: Some(0.0),
        edge_variance: Some(0.05),
        blob_pattern_class: BlobPattern::Spotted,
        environment_class: EnvironmentClass::Forest,
    };
    let correction = apply_corrections("cat", &signature, &defaults());
    assert_eq!(correction.label, "tiger");
    assert_eq!(correction.rule_id.as_deref(), Some("stripes_to_tiger"));
}

#[test]
fn unknown_signature_leaves_label_alone() {
    let correction = apply_corrections("bird", &FeatureSignature::unknown(), &defaults());
    assert!(!correction.applied);
    assert_eq!(correction.label, "bird");
    assert_eq!(correction.strength, 0.0);
    assert!(correction.rule_id.is_none());
}

#[test]
fn degenerate_box_skips_corrections() {
    let detection = DetectionCandidate::new("bird", 0.6).with_box(
        faunasense::schema::BoundingBox::new(10.0, 10.0, -5.0, 20.0),
    );
    let results = engine().classify(&whale_scene(), &[detection]).unwrap();
    assert_eq!(results[0].final_label, "bird");
    assert!(!results[0].correction_applied);
    assert_eq!(results[0].final_confidence, 0.6);
}

#[test]
fn custom_table_replaces_defaults() {
    let rules = vec![CorrectionRule::new(
        "grey_is_wolf",
        vec![Predicate::DominantHue(HueBucket::Neutral)],
        "wolf",
        0.05,
    )];
    let engine = engine().with_rules(rules);
    let results = engine
        .classify(&grey_scene(), &[DetectionCandidate::new("husky", 0.5)])
        .unwrap();
    assert_eq!(results[0].final_label, "GRAY WOLF");
    assert!((results[0].final_confidence - 0.70).abs() < 1e-5);

    // Stripes no longer mean anything
    let results = engine
        .classify(&stripe_scene(), &[DetectionCandidate::new("cat", 0.5)])
        .unwrap();
    assert!(!results[0].correction_applied);
}

#[test]
fn config_rules_flow_into_engine() {
    let config: ResolverConfig = toml::from_str(
        r#"
[boosts]
correction = 0.2

[[rules]]
id = "bird_over_water"
rewrite_to = "whale"
strength = 0.2
when = [
    { kind = "label_is", value = "bird" },
    { kind = "environment", value = "aquatic" },
]
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let knowledge = SharedKnowledge::from_entries(knowledge_entries()).unwrap();
    let engine = ClassificationEngine::with_config(Arc::new(knowledge), config);
    assert_eq!(engine.rules().len(), 1);

    let results = engine
        .classify(&whale_scene(), &[DetectionCandidate::new("bird", 0.5)])
        .unwrap();
    assert_eq!(results[0].final_label, "HUMPBACK WHALE");
    assert!((results[0].final_confidence - 0.85).abs() < 1e-5);
}
