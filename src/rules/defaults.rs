use super::{CorrectionRule, Predicate};
use crate::config::{BoostConfig, FeatureThresholds};
use crate::features::{BlobPattern, EnvironmentClass, HueBucket};

/// The built-in correction table, highest priority first.
pub fn default_rules(thresholds: &FeatureThresholds, boosts: &BoostConfig) -> Vec<CorrectionRule> {
    let strength = boosts.correction;
    vec![
        CorrectionRule::new(
            "bird_to_whale",
            vec![
                Predicate::LabelIs("bird".into()),
                Predicate::AspectRatioAbove(thresholds.whale_aspect_ratio),
                Predicate::BlueRatioAtLeast(thresholds.blue_ratio_high),
            ],
            "whale",
            strength,
        )
        .with_description("long, mostly blue subject labelled as a bird"),
        CorrectionRule::new(
            "stripes_to_tiger",
            vec![Predicate::EdgeVarianceAtLeast(thresholds.stripe_edge_variance)],
            "tiger",
            strength,
        )
        .with_description("strongly directional edges read as stripes"),
        CorrectionRule::new(
            "spots_in_forest_to_leopard",
            vec![
                Predicate::BlobPattern(BlobPattern::Spotted),
                Predicate::Environment(EnvironmentClass::Forest),
            ],
            "leopard",
            strength,
        )
        .with_description("spotted coat in a forest scene"),
        CorrectionRule::new(
            "elongated_canid_to_wolf",
            vec![
                Predicate::LabelAnyOf(vec!["lion".into(), "dog".into()]),
                Predicate::AspectRatioAtLeast(thresholds.elongation_aspect_ratio),
                Predicate::AnyOf(vec![
                    Predicate::Environment(EnvironmentClass::Forest),
                    Predicate::DominantHueAnyOf(vec![HueBucket::Green, HueBucket::Blue]),
                ]),
            ],
            "wolf",
            strength,
        )
        .with_description("elongated lion or dog against forest or cool tones"),
        CorrectionRule::new(
            "golden_savanna_lion",
            vec![
                Predicate::DominantHue(HueBucket::Golden),
                Predicate::Environment(EnvironmentClass::Savanna),
            ],
            "lion",
            strength,
        )
        .with_description("golden subject on savanna"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSignature;
    use crate::rules::apply_corrections;

    fn rules() -> Vec<CorrectionRule> {
        default_rules(&FeatureThresholds::default(), &BoostConfig::default())
    }

    fn plain() -> FeatureSignature {
        FeatureSignature {
            aspect_ratio: Some(1.0),
            dominant_hue_bucket: HueBucket::Neutral,
            blue_ratio: Some(0.0),
            edge_variance: Some(0.0),
            blob_pattern_class: BlobPattern::Plain,
            environment_class: EnvironmentClass::Unknown,
        }
    }

    #[test]
    fn default_rules_are_valid() {
        for rule in rules() {
            assert!(rule.validate().is_ok(), "{}", rule.id);
        }
    }

    #[test]
    fn long_blue_bird_becomes_whale() {
        let signature = FeatureSignature {
            aspect_ratio: Some(3.0),
            blue_ratio: Some(0.7),
            ..plain()
        };
        let correction = apply_corrections("bird", &signature, &rules());
        assert_eq!(correction.label, "whale");
        assert_eq!(correction.strength, 0.10);

        // Exactly at the cutoff is not "above"
        let signature = FeatureSignature {
            aspect_ratio: Some(2.5),
            ..signature
        };
        assert!(!apply_corrections("bird", &signature, &rules()).applied);
    }

    #[test]
    fn elongated_dog_in_forest_becomes_wolf() {
        let signature = FeatureSignature {
            aspect_ratio: Some(2.0),
            environment_class: EnvironmentClass::Forest,
            ..plain()
        };
        let correction = apply_corrections("WESTERN DOMESTIC DOG", &signature, &rules());
        assert_eq!(correction.label, "wolf");
        assert_eq!(correction.rule_id.as_deref(), Some("elongated_canid_to_wolf"));
    }

    #[test]
    fn cool_toned_lion_becomes_wolf() {
        let signature = FeatureSignature {
            aspect_ratio: Some(1.8),
            dominant_hue_bucket: HueBucket::Blue,
            ..plain()
        };
        assert_eq!(apply_corrections("lion", &signature, &rules()).label, "wolf");
    }

    #[test]
    fn golden_savanna_becomes_lion() {
        let signature = FeatureSignature {
            dominant_hue_bucket: HueBucket::Golden,
            environment_class: EnvironmentClass::Savanna,
            ..plain()
        };
        assert_eq!(apply_corrections("cat", &signature, &rules()).label, "lion");
    }

    #[test]
    fn plain_signature_changes_nothing() {
        let correction = apply_corrections("elephant", &plain(), &rules());
        assert_eq!(correction, crate::rules::Correction::unchanged("elephant"));
    }
}
