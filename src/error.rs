//! Error taxonomy for the measurement core.
//!
//! `InvalidFormat` is the only user-correctable variant: it is surfaced at the
//! calibration confirmation boundary and never mutates state. The remaining
//! variants describe violated preconditions and abort the operation that hit
//! them.

use crate::segment::SegmentId;
use crate::units::Unit;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeasureError {
    #[error("invalid {unit} length: {input:?}")]
    InvalidFormat { input: String, unit: Unit },
    #[error("degenerate geometry: zero-length segment or singular transform")]
    DegenerateGeometry,
    #[error("fraction value out of range: {0} (expected 0..=1)")]
    PrecisionOutOfRange(f64),
    #[error("unsupported precision: {0} (expected 1/2, 1/4, 1/8, 1/16 or 1/32)")]
    UnsupportedPrecision(String),
    #[error("unknown unit: {0}")]
    UnknownUnit(String),
    #[error("calibration is not awaiting confirmation")]
    CalibrationNotReady,
    #[error("segment not found: {0}")]
    SegmentNotFound(SegmentId),
    #[error("invalid config value for {key}: {value:?}")]
    Config { key: String, value: String },
}

impl MeasureError {
    /// Whether the user can fix this error by correcting their input.
    #[must_use]
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::InvalidFormat { .. })
    }
}
