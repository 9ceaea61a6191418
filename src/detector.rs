use crate::schema::DetectionCandidate;
use image::RgbImage;

/// External object detector producing ranked label guesses for an image.
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    /// Candidates in descending confidence order, possibly empty.
    fn detect(&self, image: &RgbImage) -> Vec<DetectionCandidate>;
}

/// Replays a fixed list of candidates regardless of the image.
///
/// Lets offline detector output (the CLI's `--detections` file, test
/// fixtures) flow through the same path as a live detector.
#[derive(Debug, Clone, Default)]
pub struct StaticDetector {
    candidates: Vec<DetectionCandidate>,
}

impl StaticDetector {
    pub fn new(candidates: Vec<DetectionCandidate>) -> Self {
        Self { candidates }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn candidates(&self) -> &[DetectionCandidate] {
        &self.candidates
    }
}

impl Detector for StaticDetector {
    fn name(&self) -> &str {
        "static"
    }

    fn detect(&self, _image: &RgbImage) -> Vec<DetectionCandidate> {
        self.candidates.clone()
    }
}
