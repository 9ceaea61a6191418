use crate::config::FeatureThresholds;
use image::Rgb;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Coarse hue class of a pixel or region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum HueBucket {
    Red,
    Orange,
    Golden,
    Green,
    Blue,
    Purple,
    /// Too dark or too washed out to carry a hue
    Neutral,
    Unknown,
}

impl HueBucket {
    /// Buckets a pixel can land in, in histogram order.
    pub const MEASURED: [HueBucket; 7] = [
        HueBucket::Red,
        HueBucket::Orange,
        HueBucket::Golden,
        HueBucket::Green,
        HueBucket::Blue,
        HueBucket::Purple,
        HueBucket::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HueBucket::Red => "red",
            HueBucket::Orange => "orange",
            HueBucket::Golden => "golden",
            HueBucket::Green => "green",
            HueBucket::Blue => "blue",
            HueBucket::Purple => "purple",
            HueBucket::Neutral => "neutral",
            HueBucket::Unknown => "unknown",
        }
    }

    pub fn is_chromatic(&self) -> bool {
        !matches!(self, HueBucket::Neutral | HueBucket::Unknown)
    }

    fn index(&self) -> Option<usize> {
        Self::MEASURED.iter().position(|b| b == self)
    }

    /// Bucket for a hue angle in degrees.
    pub fn from_hue(hue: f32) -> Self {
        match hue {
            h if !(15.0..330.0).contains(&h) => HueBucket::Red,
            h if h < 40.0 => HueBucket::Orange,
            h if h < 65.0 => HueBucket::Golden,
            h if h < 170.0 => HueBucket::Green,
            h if h < 260.0 => HueBucket::Blue,
            _ => HueBucket::Purple,
        }
    }
}

/// Hue in degrees, saturation and value in [0, 1].
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> (f32, f32, f32) {
    let [r, g, b] = pixel.0.map(|c| c as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta).rem_euclid(6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation, max)
}

pub fn bucket_for(pixel: &Rgb<u8>, thresholds: &FeatureThresholds) -> HueBucket {
    let (hue, saturation, value) = rgb_to_hsv(pixel);
    if saturation < thresholds.saturation_floor || value < thresholds.value_floor {
        HueBucket::Neutral
    } else {
        HueBucket::from_hue(hue)
    }
}

/// Pixel counts per measured hue bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HueHistogram {
    counts: [u64; 7],
    total: u64,
}

impl HueHistogram {
    pub fn from_pixels<'a>(
        pixels: impl IntoIterator<Item = &'a Rgb<u8>>,
        thresholds: &FeatureThresholds,
    ) -> Self {
        let mut histogram = Self::default();
        for pixel in pixels {
            histogram.add(bucket_for(pixel, thresholds));
        }
        histogram
    }

    pub fn add(&mut self, bucket: HueBucket) {
        if let Some(i) = bucket.index() {
            self.counts[i] += 1;
            self.total += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn count(&self, bucket: HueBucket) -> u64 {
        bucket.index().map_or(0, |i| self.counts[i])
    }

    /// Fraction of all counted pixels in `bucket`, `None` when empty.
    pub fn share(&self, bucket: HueBucket) -> Option<f32> {
        if self.total == 0 {
            return None;
        }
        Some(self.count(bucket) as f32 / self.total as f32)
    }

    pub fn chromatic(&self) -> u64 {
        self.total - self.count(HueBucket::Neutral)
    }

    /// Most populous chromatic bucket, or `Neutral` when chromatic pixels
    /// make up less than `chromatic_share` of the region.
    pub fn dominant(&self, chromatic_share: f32) -> HueBucket {
        if self.total == 0 {
            return HueBucket::Unknown;
        }
        let chromatic = self.chromatic();
        if chromatic == 0 || (chromatic as f32 / self.total as f32) < chromatic_share {
            return HueBucket::Neutral;
        }

        let mut best = HueBucket::Neutral;
        let mut best_count = 0;
        for bucket in HueBucket::MEASURED.iter().filter(|b| b.is_chromatic()) {
            let count = self.count(*bucket);
            if count > best_count {
                best = *bucket;
                best_count = count;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(r: u8, g: u8, b: u8) -> HueBucket {
        bucket_for(&Rgb([r, g, b]), &FeatureThresholds::default())
    }

    #[test]
    fn primary_colours_land_in_expected_buckets() {
        assert_eq!(bucket(220, 20, 20), HueBucket::Red);
        assert_eq!(bucket(255, 140, 0), HueBucket::Orange);
        assert_eq!(bucket(200, 160, 80), HueBucket::Golden);
        assert_eq!(bucket(0, 100, 0), HueBucket::Green);
        assert_eq!(bucket(173, 216, 230), HueBucket::Blue);
        assert_eq!(bucket(140, 40, 200), HueBucket::Purple);
    }

    #[test]
    fn dark_and_grey_pixels_are_neutral() {
        assert_eq!(bucket(0, 0, 0), HueBucket::Neutral);
        assert_eq!(bucket(128, 128, 128), HueBucket::Neutral);
        assert_eq!(bucket(20, 30, 10), HueBucket::Neutral);
    }

    #[test]
    fn hue_wraps_around_to_red() {
        assert_eq!(HueBucket::from_hue(0.0), HueBucket::Red);
        assert_eq!(HueBucket::from_hue(345.0), HueBucket::Red);
        assert_eq!(HueBucket::from_hue(15.0), HueBucket::Orange);
        assert_eq!(HueBucket::from_hue(329.9), HueBucket::Purple);
    }

    #[test]
    fn dominant_requires_enough_chromatic_pixels() {
        let mut histogram = HueHistogram::default();
        for _ in 0..95 {
            histogram.add(HueBucket::Neutral);
        }
        for _ in 0..5 {
            histogram.add(HueBucket::Green);
        }
        assert_eq!(histogram.dominant(0.10), HueBucket::Neutral);
        assert_eq!(histogram.dominant(0.05), HueBucket::Green);
    }

    #[test]
    fn dominant_ties_go_to_earlier_bucket() {
        let mut histogram = HueHistogram::default();
        histogram.add(HueBucket::Blue);
        histogram.add(HueBucket::Golden);
        assert_eq!(histogram.dominant(0.1), HueBucket::Golden);
    }

    #[test]
    fn empty_histogram_has_no_share() {
        let histogram = HueHistogram::default();
        assert_eq!(histogram.share(HueBucket::Blue), None);
        assert_eq!(histogram.dominant(0.1), HueBucket::Unknown);
        // Unknown is never counted
        let mut histogram = HueHistogram::default();
        histogram.add(HueBucket::Unknown);
        assert_eq!(histogram.total(), 0);
    }
}
