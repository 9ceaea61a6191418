use thiserror::Error;

/// Structurally invalid arguments rejected at the classify boundary.
///
/// Data-quality problems (odd boxes, empty knowledge) never surface here;
/// they degrade the result instead.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum ClassifyError {
    #[error("detection {index} ('{label}') has confidence {value}, expected a value in [0, 1]")]
    InvalidConfidence {
        index: usize,
        label: String,
        value: f32,
    },
    #[error("detection {index} has an empty label")]
    EmptyLabel { index: usize },
}
