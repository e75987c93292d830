//! Shared numeric constants for the measurement core.

// ── Unit conversion ─────────────────────────────────────────────

/// Baseline page resolution: one inch is 96 surface pixels.
pub const PX_PER_INCH: f64 = 96.0;

/// One foot in surface pixels, as fixed by the page DPI baseline.
pub const PX_PER_FOOT: f64 = 1_151.999_999_983_2;

/// Millimetres per foot.
pub const MM_PER_FOOT: f64 = 304.8;

/// Centimetres per foot.
pub const CM_PER_FOOT: f64 = 30.48;

/// Metres per foot.
pub const M_PER_FOOT: f64 = 0.3048;

/// Inches per foot.
pub const INCHES_PER_FOOT: f64 = 12.0;

/// Sub-inch remainders at or below this many inches render without a fraction.
pub const FRACTION_EPSILON_IN: f64 = 0.1;

/// Pixel lengths at or below this are treated as zero.
pub const ZERO_LENGTH_PX: f64 = 1e-9;

// ── Markers ─────────────────────────────────────────────────────

/// Length of an end-cap tick in surface pixels.
pub const CAP_LENGTH_PX: f64 = 10.0;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for endpoint handles and thin lines.
pub const HANDLE_RADIUS_PX: f64 = 8.0;

// ── View ────────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.5;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 8.0;
