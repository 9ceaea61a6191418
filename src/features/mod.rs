//! Deterministic image features for a detector region.
//!
//! Everything here is computed fresh from the pixels on every call; nothing
//! is cached between candidates or images.

pub mod blobs;
pub mod color;
pub mod edges;
pub mod environment;

pub use blobs::BlobPattern;
pub use color::{HueBucket, HueHistogram};
pub use environment::{EnvironmentClass, EnvironmentClassifier, HueShareClassifier};

use crate::config::FeatureThresholds;
use crate::schema::BoundingBox;
use image::{Rgb, RgbImage};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fixed-shape feature summary of one region.
///
/// Numeric fields are `None` and class fields `Unknown` when they could not
/// be measured. Unknown values never satisfy a correction predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FeatureSignature {
    pub aspect_ratio: Option<f32>,
    pub dominant_hue_bucket: HueBucket,
    pub blue_ratio: Option<f32>,
    pub edge_variance: Option<f32>,
    pub blob_pattern_class: BlobPattern,
    pub environment_class: EnvironmentClass,
}

impl FeatureSignature {
    pub fn unknown() -> Self {
        Self {
            aspect_ratio: None,
            dominant_hue_bucket: HueBucket::Unknown,
            blue_ratio: None,
            edge_variance: None,
            blob_pattern_class: BlobPattern::Unknown,
            environment_class: EnvironmentClass::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::unknown()
    }
}

impl Default for FeatureSignature {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Integer pixel rectangle, always non-empty and inside its image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Clip `bounding_box` to the image, or take the whole image without one.
    ///
    /// Returns `None` for an empty image, a non-finite or non-positive box,
    /// or a box that lies entirely outside the image.
    pub fn resolve(
        image_width: u32,
        image_height: u32,
        bounding_box: Option<&BoundingBox>,
    ) -> Option<Region> {
        if image_width == 0 || image_height == 0 {
            return None;
        }
        let Some(b) = bounding_box else {
            return Some(Region {
                x: 0,
                y: 0,
                width: image_width,
                height: image_height,
            });
        };

        let finite = [b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite());
        if !finite || b.width <= 0.0 || b.height <= 0.0 {
            return None;
        }

        let x0 = b.x.max(0.0).floor();
        let y0 = b.y.max(0.0).floor();
        let x1 = (b.x + b.width).min(image_width as f32).ceil();
        let y1 = (b.y + b.height).min(image_height as f32).ceil();
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(Region {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Pixels in row-major order.
    pub fn pixels(self, image: &RgbImage) -> impl Iterator<Item = &Rgb<u8>> {
        (self.y..self.y + self.height).flat_map(move |py| {
            (self.x..self.x + self.width).map(move |px| image.get_pixel(px, py))
        })
    }
}

/// Integer Rec. 601 luma.
pub(crate) fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0.map(u32::from);
    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
}

/// Analyzes regions of one image.
///
/// The environment class depends only on the whole image, so it is computed
/// once up front and shared by every candidate of the call.
pub struct FeatureAnalyzer<'a> {
    image: &'a RgbImage,
    thresholds: &'a FeatureThresholds,
    environment: EnvironmentClass,
}

impl<'a> FeatureAnalyzer<'a> {
    pub fn new(
        image: &'a RgbImage,
        thresholds: &'a FeatureThresholds,
        classifier: &dyn EnvironmentClassifier,
    ) -> Self {
        let environment = if image.width() == 0 || image.height() == 0 {
            EnvironmentClass::Unknown
        } else {
            classifier.classify(&HueHistogram::from_pixels(image.pixels(), thresholds))
        };
        tracing::debug!(
            "scene environment {} via {}",
            environment.as_str(),
            classifier.name()
        );

        Self {
            image,
            thresholds,
            environment,
        }
    }

    pub fn environment(&self) -> EnvironmentClass {
        self.environment
    }

    pub fn analyze(&self, bounding_box: Option<&BoundingBox>) -> FeatureSignature {
        let Some(region) = Region::resolve(self.image.width(), self.image.height(), bounding_box)
        else {
            tracing::warn!("degenerate region {:?}, features unknown", bounding_box);
            return FeatureSignature::unknown();
        };

        let histogram = HueHistogram::from_pixels(region.pixels(self.image), self.thresholds);

        FeatureSignature {
            aspect_ratio: Some(region.aspect_ratio()),
            dominant_hue_bucket: histogram.dominant(self.thresholds.chromatic_share),
            blue_ratio: histogram.share(HueBucket::Blue),
            edge_variance: edges::edge_variance(self.image, region),
            blob_pattern_class: blobs::blob_pattern(self.image, region, self.thresholds),
            environment_class: self.environment,
        }
    }
}

/// Analyze one region with the default hue-share environment heuristic.
pub fn analyze(
    image: &RgbImage,
    bounding_box: Option<&BoundingBox>,
    thresholds: &FeatureThresholds,
) -> FeatureSignature {
    let classifier = HueShareClassifier::new(thresholds.environment_share);
    FeatureAnalyzer::new(image, thresholds, &classifier).analyze(bounding_box)
}
