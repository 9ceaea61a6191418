use super::color::{HueBucket, HueHistogram};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentClass {
    Forest,
    Savanna,
    Aquatic,
    Unknown,
}

impl EnvironmentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentClass::Forest => "forest",
            EnvironmentClass::Savanna => "savanna",
            EnvironmentClass::Aquatic => "aquatic",
            EnvironmentClass::Unknown => "unknown",
        }
    }
}

/// Classifies the scene around a subject from its whole-image hue histogram.
pub trait EnvironmentClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn classify(&self, histogram: &HueHistogram) -> EnvironmentClass;
}

/// Default heuristic: green reads as forest, golden as savanna and blue as
/// water, provided the hue covers at least `min_share` of the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueShareClassifier {
    pub min_share: f32,
}

const HUE_ENVIRONMENTS: [(HueBucket, EnvironmentClass); 3] = [
    (HueBucket::Green, EnvironmentClass::Forest),
    (HueBucket::Golden, EnvironmentClass::Savanna),
    (HueBucket::Blue, EnvironmentClass::Aquatic),
];

impl HueShareClassifier {
    pub fn new(min_share: f32) -> Self {
        Self { min_share }
    }
}

impl EnvironmentClassifier for HueShareClassifier {
    fn name(&self) -> &str {
        "hue-share"
    }

    fn classify(&self, histogram: &HueHistogram) -> EnvironmentClass {
        let mut best = EnvironmentClass::Unknown;
        let mut best_share = 0.0;
        for (bucket, environment) in HUE_ENVIRONMENTS {
            let Some(share) = histogram.share(bucket) else {
                return EnvironmentClass::Unknown;
            };
            if share >= self.min_share && share > best_share {
                best = environment;
                best_share = share;
            }
        }
        best
    }
}
