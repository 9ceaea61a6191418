//! Default confidence adjustments and the clamp applied after every stage.
//!
//! A partial knowledge match is worth more than an exact one. Keep it that way
//! unless the tuning data says otherwise.

/// Boost for a label that equals a canonical name or alias
pub const EXACT_MATCH_BOOST: f32 = 0.15;

/// Boost for a label that overlaps a canonical name or alias by tokens
pub const PARTIAL_MATCH_BOOST: f32 = 0.20;

/// Strength added when a feature rule rewrites or confirms a label
pub const CORRECTION_STRENGTH: f32 = 0.10;

/// Clamp a score into `[0, 1]`. NaN collapses to zero.
pub fn clamp01(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_ordering() {
        assert!(EXACT_MATCH_BOOST < PARTIAL_MATCH_BOOST);
        assert!(CORRECTION_STRENGTH > 0.0);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp01(1.35), 1.0);
        assert_eq!(clamp01(-0.2), 0.0);
        assert_eq!(clamp01(0.42), 0.42);
        assert_eq!(clamp01(f32::NAN), 0.0);
        assert_eq!(clamp01(f32::INFINITY), 1.0);
    }
}
