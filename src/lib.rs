pub mod confidence;
pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod features;
pub mod knowledge;
pub mod matcher;
pub mod resolver;
pub mod rules;
pub mod schema;

pub use engine::{ClassificationEngine, ClassificationJob};
pub use error::ClassifyError;
pub use schema::{ClassificationReport, ClassificationResult, DetectionCandidate, MatchType};
