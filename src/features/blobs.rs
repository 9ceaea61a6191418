use super::{Region, luma};
use crate::config::FeatureThresholds;
use image::RgbImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BlobPattern {
    /// Enough compact, roughly round dark blobs
    Spotted,
    /// Dark components present but not spot-like
    Irregular,
    Plain,
    Unknown,
}

impl BlobPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobPattern::Spotted => "spotted",
            BlobPattern::Irregular => "irregular",
            BlobPattern::Plain => "plain",
            BlobPattern::Unknown => "unknown",
        }
    }
}

/// Connected dark component found by region growing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    pub area: usize,
    pub width: usize,
    pub height: usize,
}

impl Component {
    pub fn fill(&self) -> f32 {
        self.area as f32 / (self.width * self.height) as f32
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlobSummary {
    /// Components at or above the minimum spot area
    pub components: usize,
    pub spots: usize,
}

/// Find 4-connected components of dark pixels (luma below `dark_luma`).
pub fn dark_components(image: &RgbImage, region: Region, dark_luma: u8) -> Vec<Component> {
    let width = region.width as usize;
    let height = region.height as usize;
    let dark: Vec<bool> = region.pixels(image).map(|p| luma(p) < dark_luma).collect();
    let mut visited = vec![false; dark.len()];
    let mut components = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..dark.len() {
        if !dark[start] || visited[start] {
            continue;
        }

        visited[start] = true;
        queue.push_back(start);
        let (mut min_x, mut max_x) = (start % width, start % width);
        let (mut min_y, mut max_y) = (start / width, start / width);
        let mut area = 0;

        while let Some(index) = queue.pop_front() {
            area += 1;
            let (x, y) = (index % width, index / width);
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            let neighbors = [
                (x > 0).then(|| index - 1),
                (x + 1 < width).then(|| index + 1),
                (y > 0).then(|| index - width),
                (y + 1 < height).then(|| index + width),
            ];
            for next in neighbors.into_iter().flatten() {
                if dark[next] && !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }

        components.push(Component {
            area,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        });
    }

    components
}

/// Count components and spots in `region`.
///
/// A spot lies within the configured area band (as fractions of the region,
/// never below four pixels), fills at least `spot_min_fill` of its bounding
/// box, and has a bounding-box aspect between 1:2 and 2:1.
pub fn summarize(image: &RgbImage, region: Region, thresholds: &FeatureThresholds) -> BlobSummary {
    let pixels = region.area() as f32;
    let min_area = ((thresholds.spot_min_area_fraction * pixels).ceil() as usize).max(4);
    let max_area = (thresholds.spot_max_area_fraction * pixels).floor() as usize;

    let mut summary = BlobSummary::default();
    for component in dark_components(image, region, thresholds.dark_luma) {
        if component.area < min_area {
            continue;
        }
        summary.components += 1;
        if component.area <= max_area
            && component.fill() >= thresholds.spot_min_fill
            && (0.5..=2.0).contains(&component.aspect())
        {
            summary.spots += 1;
        }
    }
    summary
}

pub fn blob_pattern(
    image: &RgbImage,
    region: Region,
    thresholds: &FeatureThresholds,
) -> BlobPattern {
    let summary = summarize(image, region, thresholds);
    tracing::trace!(
        "blob summary: {} components, {} spots",
        summary.components,
        summary.spots
    );
    if summary.spots >= thresholds.spot_min_count.max(1) {
        BlobPattern::Spotted
    } else if summary.components > 0 {
        BlobPattern::Irregular
    } else {
        BlobPattern::Plain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const ORANGE: Rgb<u8> = Rgb([255, 140, 0]);
    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

    fn whole(image: &RgbImage) -> Region {
        Region::resolve(image.width(), image.height(), None).unwrap()
    }

    fn spotted(size: u32, spot: u32, pitch: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            if x % pitch < spot && y % pitch < spot {
                BLACK
            } else {
                ORANGE
            }
        })
    }

    #[test]
    fn components_are_four_connected() {
        // Two diagonal dark pixels are separate components
        let mut image = RgbImage::from_pixel(4, 4, ORANGE);
        image.put_pixel(1, 1, BLACK);
        image.put_pixel(2, 2, BLACK);
        let components = dark_components(&image, whole(&image), 40);
        assert_eq!(components.len(), 2);
        assert!(components.iter().all(|c| c.area == 1));
    }

    #[test]
    fn component_bounds_and_fill() {
        let mut image = RgbImage::from_pixel(10, 10, ORANGE);
        for x in 2..6 {
            image.put_pixel(x, 3, BLACK);
        }
        image.put_pixel(2, 4, BLACK);
        let components = dark_components(&image, whole(&image), 40);
        assert_eq!(
            components,
            vec![Component {
                area: 5,
                width: 4,
                height: 2
            }]
        );
        assert!((components[0].fill() - 0.625).abs() < 1e-6);
    }

    #[test]
    fn grid_of_squares_is_spotted() {
        let image = spotted(200, 12, 40);
        let summary = summarize(&image, whole(&image), &FeatureThresholds::default());
        assert_eq!(summary.spots, 25);
        assert_eq!(
            blob_pattern(&image, whole(&image), &FeatureThresholds::default()),
            BlobPattern::Spotted
        );
    }

    #[test]
    fn long_bars_are_irregular() {
        let image = RgbImage::from_fn(200, 200, |x, _| {
            if (x / 10) % 2 == 0 { ORANGE } else { BLACK }
        });
        let summary = summarize(&image, whole(&image), &FeatureThresholds::default());
        assert_eq!(summary.components, 10);
        assert_eq!(summary.spots, 0);
        assert_eq!(
            blob_pattern(&image, whole(&image), &FeatureThresholds::default()),
            BlobPattern::Irregular
        );
    }

    #[test]
    fn too_few_spots_or_none_at_all() {
        let mut image = RgbImage::from_pixel(200, 200, ORANGE);
        assert_eq!(
            blob_pattern(&image, whole(&image), &FeatureThresholds::default()),
            BlobPattern::Plain
        );
        for x in 50..60 {
            for y in 50..60 {
                image.put_pixel(x, y, BLACK);
            }
        }
        assert_eq!(
            blob_pattern(&image, whole(&image), &FeatureThresholds::default()),
            BlobPattern::Irregular
        );
    }
}
