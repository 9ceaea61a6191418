use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Pixel-space rectangle reported by a detector.
///
/// Stored as floats so malformed boxes (zero or negative sizes) survive
/// deserialization and are handled by the feature analyzer instead of the
/// parser.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum BoxParseError {
    #[error("expected four comma-separated numbers (x,y,width,height)")]
    WrongArity,
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

impl FromStr for BoundingBox {
    type Err = BoxParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BoxParseError::WrongArity);
        }
        let mut values = [0.0f32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f32>()
                .map_err(|_| BoxParseError::InvalidNumber(part.to_string()))?;
        }
        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

/// A raw guess from the external object detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectionCandidate {
    pub label: String,
    pub confidence: f32,
    #[serde(
        rename = "box",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub bounding_box: Option<BoundingBox>,
}

impl DetectionCandidate {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
            bounding_box: None,
        }
    }

    pub fn with_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }
}
