use crate::confidence::{CORRECTION_STRENGTH, EXACT_MATCH_BOOST, PARTIAL_MATCH_BOOST};
use crate::rules::{CorrectionRule, default_rules};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "FAUNASENSE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResolverConfig {
    #[serde(default)]
    pub boosts: BoostConfig,
    #[serde(default)]
    pub thresholds: FeatureThresholds,
    /// Replaces the built-in correction table when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<CorrectionRule>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoostConfig {
    pub exact: f32,
    pub partial: f32,
    pub correction: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureThresholds {
    /// Minimum width/height for the bird-to-whale rewrite
    pub whale_aspect_ratio: f32,
    pub blue_ratio_high: f32,
    /// Minimum directional edge variance treated as stripes
    pub stripe_edge_variance: f32,
    pub elongation_aspect_ratio: f32,
    pub saturation_floor: f32,
    pub value_floor: f32,
    /// Share of chromatic pixels needed before a hue can dominate
    pub chromatic_share: f32,
    /// Share of the scene a hue group needs to name the environment
    pub environment_share: f32,
    pub dark_luma: u8,
    pub spot_min_area_fraction: f32,
    pub spot_max_area_fraction: f32,
    pub spot_min_fill: f32,
    pub spot_min_count: usize,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            exact: EXACT_MATCH_BOOST,
            partial: PARTIAL_MATCH_BOOST,
            correction: CORRECTION_STRENGTH,
        }
    }
}

impl Default for FeatureThresholds {
    fn default() -> Self {
        Self {
            whale_aspect_ratio: 2.5,
            blue_ratio_high: 0.35,
            stripe_edge_variance: 0.01,
            elongation_aspect_ratio: 1.6,
            saturation_floor: 0.15,
            value_floor: 0.15,
            chromatic_share: 0.10,
            environment_share: 0.30,
            dark_luma: 40,
            spot_min_area_fraction: 0.0001,
            spot_max_area_fraction: 0.02,
            spot_min_fill: 0.6,
            spot_min_count: 5,
        }
    }
}

impl ResolverConfig {
    /// Load from `FAUNASENSE_CONFIG` or the user config dir, falling back to
    /// defaults when neither exists or the file is unusable.
    pub fn load() -> Self {
        let Some(path) = Self::config_file_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_fields = [
            ("boosts.exact", self.boosts.exact),
            ("boosts.partial", self.boosts.partial),
            ("boosts.correction", self.boosts.correction),
            ("thresholds.blue_ratio_high", self.thresholds.blue_ratio_high),
            ("thresholds.saturation_floor", self.thresholds.saturation_floor),
            ("thresholds.value_floor", self.thresholds.value_floor),
            ("thresholds.chromatic_share", self.thresholds.chromatic_share),
            ("thresholds.environment_share", self.thresholds.environment_share),
            (
                "thresholds.spot_min_area_fraction",
                self.thresholds.spot_min_area_fraction,
            ),
            (
                "thresholds.spot_max_area_fraction",
                self.thresholds.spot_max_area_fraction,
            ),
            ("thresholds.spot_min_fill", self.thresholds.spot_min_fill),
        ];
        for (field, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, format!("{} is outside [0, 1]", value)));
            }
        }

        let positive_fields = [
            ("thresholds.whale_aspect_ratio", self.thresholds.whale_aspect_ratio),
            (
                "thresholds.elongation_aspect_ratio",
                self.thresholds.elongation_aspect_ratio,
            ),
            ("thresholds.stripe_edge_variance", self.thresholds.stripe_edge_variance),
        ];
        for (field, value) in positive_fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(field, format!("{} must be a positive number", value)));
            }
        }

        if self.thresholds.spot_min_area_fraction > self.thresholds.spot_max_area_fraction {
            return Err(invalid(
                "thresholds.spot_min_area_fraction",
                "must not exceed spot_max_area_fraction",
            ));
        }

        if let Some(rules) = &self.rules {
            for (i, rule) in rules.iter().enumerate() {
                rule.validate()
                    .map_err(|reason| invalid(&format!("rules[{}]", i), reason))?;
            }
        }

        Ok(())
    }

    /// The active correction table in priority order.
    pub fn correction_rules(&self) -> Vec<CorrectionRule> {
        match &self.rules {
            Some(rules) => rules.clone(),
            None => default_rules(&self.thresholds, &self.boosts),
        }
    }

    fn config_file_path() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(explicit));
        }
        Self::config_dir().map(|mut path| {
            path.push("config.toml");
            path
        })
    }

    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("faunasense");
            path
        })
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.into(),
    }
}
