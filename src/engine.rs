use crate::config::ResolverConfig;
use crate::detector::Detector;
use crate::error::ClassifyError;
use crate::features::{
    EnvironmentClassifier, FeatureAnalyzer, FeatureSignature, HueShareClassifier,
};
use crate::knowledge::{KnowledgeError, KnowledgeRepository, KnowledgeSnapshot, SharedKnowledge};
use crate::matcher;
use crate::resolver::Resolver;
use crate::rules::CorrectionRule;
use crate::schema::{
    BoundingBox, ClassificationReport, ClassificationResult, DetectionCandidate, MatchResult,
};
use image::RgbImage;
use rayon::prelude::*;
use std::sync::Arc;

/// One independent classify invocation for [`ClassificationEngine::classify_batch`].
#[derive(Debug, Clone)]
pub struct ClassificationJob {
    pub image: RgbImage,
    pub detections: Vec<DetectionCandidate>,
}

impl ClassificationJob {
    pub fn new(image: RgbImage, detections: Vec<DetectionCandidate>) -> Self {
        Self { image, detections }
    }
}

/// Wires the matcher, feature analyzer and resolver around an injected
/// knowledge repository.
pub struct ClassificationEngine {
    knowledge: Arc<dyn KnowledgeRepository>,
    config: ResolverConfig,
    rules: Vec<CorrectionRule>,
    environment: Box<dyn EnvironmentClassifier>,
}

impl ClassificationEngine {
    pub fn new(knowledge: Arc<dyn KnowledgeRepository>) -> Self {
        Self::with_config(knowledge, ResolverConfig::default())
    }

    pub fn with_config(knowledge: Arc<dyn KnowledgeRepository>, config: ResolverConfig) -> Self {
        let rules = config.correction_rules();
        let environment = Box::new(HueShareClassifier::new(config.thresholds.environment_share));
        Self {
            knowledge,
            config,
            rules,
            environment,
        }
    }

    /// Engine over an empty knowledge base with default configuration.
    pub fn without_knowledge() -> Self {
        Self::new(Arc::new(SharedKnowledge::empty()))
    }

    /// Replace the whole correction table.
    pub fn with_rules(mut self, rules: Vec<CorrectionRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Append a rule at the lowest priority.
    pub fn register_rule(mut self, rule: CorrectionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_environment_classifier<E: EnvironmentClassifier + 'static>(
        mut self,
        classifier: E,
    ) -> Self {
        self.environment = Box::new(classifier);
        self
    }

    pub fn rules(&self) -> &[CorrectionRule] {
        &self.rules
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn knowledge(&self) -> Arc<KnowledgeSnapshot> {
        self.knowledge.snapshot()
    }

    /// Atomically swap in a fresh knowledge snapshot.
    ///
    /// Calls already in flight finish on the snapshot they started with.
    pub fn reload_knowledge(&self) -> Result<Arc<KnowledgeSnapshot>, KnowledgeError> {
        self.knowledge.reload()
    }

    /// Classify one image given its detector candidates.
    ///
    /// Returns the full ranking; the first result is primary and carries the
    /// others as alternates. No detections yields an empty list.
    pub fn classify(
        &self,
        image: &RgbImage,
        detections: &[DetectionCandidate],
    ) -> Result<Vec<ClassificationResult>, ClassifyError> {
        validate_detections(detections)?;
        if detections.is_empty() {
            tracing::debug!("no detections, nothing to classify");
            return Ok(Vec::new());
        }

        let snapshot = self.knowledge.snapshot();
        if snapshot.is_empty() {
            tracing::warn!("knowledge snapshot is empty, matches will all be none");
        }

        let analyzer =
            FeatureAnalyzer::new(image, &self.config.thresholds, self.environment.as_ref());
        let signatures: Vec<FeatureSignature> = detections
            .iter()
            .map(|d| analyzer.analyze(d.bounding_box.as_ref()))
            .collect();

        let resolver = Resolver::new(&snapshot, &self.rules, &self.config.boosts);
        let results = resolver.resolve(detections, &signatures);
        if let Some(primary) = results.first() {
            tracing::info!(
                "classified {} candidates, primary {:?} at {:.3}",
                results.len(),
                primary.final_label,
                primary.final_confidence
            );
        }
        Ok(results)
    }

    pub fn classify_report(
        &self,
        image: &RgbImage,
        detections: &[DetectionCandidate],
    ) -> Result<ClassificationReport, ClassifyError> {
        let report = ClassificationReport::from_results(self.classify(image, detections)?);
        if report.needs_fallback() {
            tracing::info!("no candidate resolved, report flagged for fallback");
        }
        Ok(report)
    }

    /// Run `detector` on the image first, then classify its candidates.
    pub fn classify_with_detector(
        &self,
        image: &RgbImage,
        detector: &dyn Detector,
    ) -> Result<ClassificationReport, ClassifyError> {
        let detections = detector.detect(image);
        tracing::debug!(
            "detector {} produced {} candidates",
            detector.name(),
            detections.len()
        );
        self.classify_report(image, &detections)
    }

    /// Classify independent jobs in parallel. Output order matches input.
    pub fn classify_batch(
        &self,
        jobs: &[ClassificationJob],
    ) -> Vec<Result<Vec<ClassificationResult>, ClassifyError>> {
        jobs.par_iter()
            .map(|job| self.classify(&job.image, &job.detections))
            .collect()
    }

    /// Match a single label against the current snapshot.
    pub fn match_label(&self, label: &str) -> MatchResult {
        matcher::match_label(label, &self.knowledge.snapshot(), &self.config.boosts)
    }

    /// Feature signature of a region using this engine's thresholds and
    /// environment classifier.
    pub fn analyze(
        &self,
        image: &RgbImage,
        bounding_box: Option<&BoundingBox>,
    ) -> FeatureSignature {
        FeatureAnalyzer::new(image, &self.config.thresholds, self.environment.as_ref())
            .analyze(bounding_box)
    }
}

fn validate_detections(detections: &[DetectionCandidate]) -> Result<(), ClassifyError> {
    for (index, candidate) in detections.iter().enumerate() {
        if candidate.label.trim().is_empty() {
            return Err(ClassifyError::EmptyLabel { index });
        }
        if !candidate.confidence.is_finite() || !(0.0..=1.0).contains(&candidate.confidence) {
            return Err(ClassifyError::InvalidConfidence {
                index,
                label: candidate.label.clone(),
                value: candidate.confidence,
            });
        }
    }
    Ok(())
}
