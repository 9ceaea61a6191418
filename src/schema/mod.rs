pub mod detection;
pub mod evidence;
pub mod knowledge;
pub mod result;

// Re-export commonly used types
pub use detection::{BoundingBox, BoxParseError, DetectionCandidate};
pub use evidence::{Evidence, Signal};
pub use knowledge::KnowledgeEntry;
pub use result::{
    ClassificationReport, ClassificationResult, MatchResult, MatchType, ResolutionStatus,
};

// Schema version constants
pub const SCHEMA_VERSION: &str = "0.1.0";
