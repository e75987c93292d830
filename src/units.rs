//! Unit conversion: real-world lengths to and from surface pixels.
//!
//! All conversions are anchored on the page baseline of 96 pixels per inch
//! (see [`crate::consts`]). Metric factors derive from the foot constant so
//! that a foot drawn on the page converts to exactly 304.8 mm.
//!
//! Imperial lengths have two spellings: [`Unit::Foot`] is a decimal foot
//! count, while [`Unit::FootInch`] is the architectural `10'-6 1/4"` form with
//! a configurable sub-inch [`Precision`].

#[cfg(test)]
#[path = "units_test.rs"]
mod units_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CM_PER_FOOT, FRACTION_EPSILON_IN, INCHES_PER_FOOT, M_PER_FOOT, MM_PER_FOOT, PX_PER_FOOT, PX_PER_INCH,
};
use crate::error::MeasureError;

/// Display and input unit for lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    /// Raw surface pixels; the uncalibrated default.
    #[default]
    #[serde(rename = "px")]
    Pixel,
    /// Decimal feet.
    #[serde(rename = "ft")]
    Foot,
    /// Feet and inches with a quantized sub-inch fraction.
    #[serde(rename = "ftin")]
    FootInch,
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "m")]
    Meter,
}

impl Unit {
    /// Every supported unit, in menu order.
    pub const ALL: [Unit; 6] =
        [Unit::Pixel, Unit::Foot, Unit::FootInch, Unit::Millimeter, Unit::Centimeter, Unit::Meter];

    /// Short token used in scripts, config and the CLI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pixel => "px",
            Self::Foot => "ft",
            Self::FootInch => "ftin",
            Self::Millimeter => "mm",
            Self::Centimeter => "cm",
            Self::Meter => "m",
        }
    }

    /// Surface pixels per one of this unit.
    ///
    /// For [`Unit::FootInch`] the numeric value is a count of inches.
    #[must_use]
    pub fn px_per_unit(self) -> f64 {
        match self {
            Self::Pixel => 1.0,
            Self::Foot => PX_PER_FOOT,
            Self::FootInch => PX_PER_INCH,
            Self::Millimeter => PX_PER_FOOT / MM_PER_FOOT,
            Self::Centimeter => PX_PER_FOOT / CM_PER_FOOT,
            Self::Meter => PX_PER_FOOT / M_PER_FOOT,
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "px" | "pixel" | "" => Ok(Self::Pixel),
            "ft" | "foot" | "feet" => Ok(Self::Foot),
            "ftin" | "foot-inch" => Ok(Self::FootInch),
            "mm" => Ok(Self::Millimeter),
            "cm" => Ok(Self::Centimeter),
            "m" => Ok(Self::Meter),
            other => Err(MeasureError::UnknownUnit(other.to_owned())),
        }
    }
}

/// Sub-inch rounding step for [`Unit::FootInch`] display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Precision {
    Half,
    #[default]
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl Precision {
    /// Denominator of the smallest displayed fraction.
    #[must_use]
    pub fn denominator(self) -> u32 {
        match self {
            Self::Half => 2,
            Self::Quarter => 4,
            Self::Eighth => 8,
            Self::Sixteenth => 16,
            Self::ThirtySecond => 32,
        }
    }

    /// Look up the precision for a denominator.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPrecision` unless `denominator` is 2, 4, 8, 16 or 32.
    pub fn from_denominator(denominator: u32) -> Result<Self, MeasureError> {
        match denominator {
            2 => Ok(Self::Half),
            4 => Ok(Self::Quarter),
            8 => Ok(Self::Eighth),
            16 => Ok(Self::Sixteenth),
            32 => Ok(Self::ThirtySecond),
            other => Err(MeasureError::UnsupportedPrecision(other.to_string())),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1/{}", self.denominator())
    }
}

impl FromStr for Precision {
    type Err = MeasureError;

    /// Accepts either `"1/16"` or a bare `"16"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("1/").unwrap_or(trimmed);
        let denominator = digits
            .parse::<u32>()
            .map_err(|_| MeasureError::UnsupportedPrecision(trimmed.to_owned()))?;
        Self::from_denominator(denominator)
    }
}

impl TryFrom<String> for Precision {
    type Error = MeasureError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Precision> for String {
    fn from(value: Precision) -> Self {
        value.to_string()
    }
}

// =============================================================
// Conversions
// =============================================================

/// Convert a real-world value to surface pixels.
///
/// For [`Unit::FootInch`] `value` is a total inch count.
#[must_use]
pub fn to_pixels(value: f64, unit: Unit) -> f64 {
    value * unit.px_per_unit()
}

/// Convert surface pixels to a numeric real-world value.
///
/// For [`Unit::FootInch`] the result is a total inch count.
#[must_use]
pub fn from_pixels(pixels: f64, unit: Unit) -> f64 {
    pixels / unit.px_per_unit()
}

/// Parse a user-entered real-world length and convert it to pixels.
///
/// Foot-inch input goes through [`parse_foot_inch`]; every other unit takes a
/// plain decimal number. The length must be strictly positive.
///
/// # Errors
///
/// Returns `InvalidFormat` when the input does not match the unit's format or
/// is not a positive finite length.
pub fn parse_length(input: &str, unit: Unit) -> Result<f64, MeasureError> {
    let value = match unit {
        Unit::FootInch => parse_foot_inch(input)?,
        _ => input.trim().parse::<f64>().map_err(|_| invalid(input, unit))?,
    };
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(input, unit));
    }
    Ok(to_pixels(value, unit))
}

/// Parse an architectural feet-and-inches string into a total inch count.
///
/// Accepted forms (`D` is one or more ASCII digits):
/// `D'-D"`, `D'-D''`, `D'D"`, `D'D''`, `D"`, `D''`.
///
/// # Errors
///
/// Returns `InvalidFormat` for anything else.
pub fn parse_foot_inch(input: &str) -> Result<f64, MeasureError> {
    let trimmed = input.trim();
    let body = trimmed
        .strip_suffix('"')
        .or_else(|| trimmed.strip_suffix("''"))
        .ok_or_else(|| invalid(input, Unit::FootInch))?;

    let (feet, inches) = match body.split_once('\'') {
        Some((feet, rest)) => (feet, rest.strip_prefix('-').unwrap_or(rest)),
        None => ("0", body),
    };

    let feet = parse_digits(feet).ok_or_else(|| invalid(input, Unit::FootInch))?;
    let inches = parse_digits(inches).ok_or_else(|| invalid(input, Unit::FootInch))?;
    Ok(feet * INCHES_PER_FOOT + inches)
}

fn parse_digits(s: &str) -> Option<f64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.bytes().fold(0.0, |acc, b| acc * 10.0 + f64::from(b - b'0')))
}

fn invalid(input: &str, unit: Unit) -> MeasureError {
    MeasureError::InvalidFormat { input: input.to_owned(), unit }
}

// =============================================================
// Display
// =============================================================

/// Smallest `k` in `1..=denominator` with `value <= k / denominator`.
///
/// # Errors
///
/// Returns `UnsupportedPrecision` unless `denominator` is 2, 4, 8, 16 or 32,
/// and `PrecisionOutOfRange` if `value` is outside `[0, 1]` (or NaN).
pub fn quantize_fraction(value: f64, denominator: u32) -> Result<u32, MeasureError> {
    Precision::from_denominator(denominator)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(MeasureError::PrecisionOutOfRange(value));
    }
    let den = f64::from(denominator);
    Ok((1..=denominator).find(|k| value <= f64::from(*k) / den).unwrap_or(denominator))
}

/// Render a fractional inch remainder as `"k/denominator"`.
///
/// # Errors
///
/// Same as [`quantize_fraction`].
pub fn get_fraction(value: f64, denominator: u32) -> Result<String, MeasureError> {
    let k = quantize_fraction(value, denominator)?;
    Ok(format!("{k}/{denominator}"))
}

/// Format a (scaled) pixel length for display in `unit`.
///
/// Foot-inch lengths render as `5'-3 1/4"`, dropping the fraction when the
/// sub-inch remainder is at most a tenth of an inch. Every other unit renders
/// with two decimals.
///
/// # Errors
///
/// Returns `DegenerateGeometry` for a negative or non-finite length.
pub fn format_length(pixels: f64, unit: Unit, precision: Precision) -> Result<String, MeasureError> {
    if !pixels.is_finite() || pixels < 0.0 {
        return Err(MeasureError::DegenerateGeometry);
    }
    match unit {
        Unit::FootInch => format_foot_inch(pixels, precision.denominator()),
        _ => Ok(format!("{:.2}", from_pixels(pixels, unit))),
    }
}

fn format_foot_inch(pixels: f64, denominator: u32) -> Result<String, MeasureError> {
    let total_inches = from_pixels(pixels, Unit::FootInch);
    let mut feet = (total_inches / INCHES_PER_FOOT).floor();
    let remainder = (total_inches - feet * INCHES_PER_FOOT).max(0.0);
    let mut inches = remainder.floor();
    let fraction = remainder - inches;

    let mut numerator = None;
    if fraction > FRACTION_EPSILON_IN {
        let k = quantize_fraction(fraction, denominator)?;
        if k == denominator {
            inches += 1.0;
        } else {
            numerator = Some(k);
        }
    }
    if inches >= INCHES_PER_FOOT {
        feet += 1.0;
        inches -= INCHES_PER_FOOT;
    }

    Ok(match numerator {
        Some(k) => format!("{feet:.0}'-{inches:.0} {k}/{denominator}\""),
        None => format!("{feet:.0}'-{inches:.0}\""),
    })
}

// =============================================================
// Scale
// =============================================================

/// Everything a label needs to turn a pixel length into display text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    /// Multiplier from drawn pixels to baseline pixels; `1.0` when uncalibrated.
    pub factor: f64,
    pub unit: Unit,
    pub precision: Precision,
}

impl Default for Scale {
    fn default() -> Self {
        Self { factor: 1.0, unit: Unit::Pixel, precision: Precision::Quarter }
    }
}

impl Scale {
    /// Format a drawn pixel length with this scale.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` for a negative or non-finite length.
    pub fn display(&self, pixels: f64) -> Result<String, MeasureError> {
        format_length(pixels * self.factor, self.unit, self.precision)
    }
}
