//! Session configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::collections::HashMap;

use crate::error::MeasureError;
use crate::units::Precision;

pub const DEFAULT_LINE_COLOR: &str = "#ff0000";
pub const DEFAULT_CALIBRATION_COLOR: &str = "#000000";
pub const DEFAULT_ZOOM_STEP: f64 = 0.1;
pub const DEFAULT_WHEEL_PAN_STEP: f64 = 3.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Snap drawn segments to horizontal or vertical.
    pub axis_lock: bool,
    /// Initial sub-inch precision for foot-inch labels.
    pub precision: Precision,
    /// Stroke for measurement segments.
    pub line_color: String,
    /// Stroke for the calibration reference segment.
    pub calibration_color: String,
    /// Zoom change per keyboard or wheel step.
    pub zoom_step: f64,
    /// View shift per wheel notch, in screen pixels.
    pub wheel_pan_step: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            axis_lock: true,
            precision: Precision::Quarter,
            line_color: DEFAULT_LINE_COLOR.to_owned(),
            calibration_color: DEFAULT_CALIBRATION_COLOR.to_owned(),
            zoom_step: DEFAULT_ZOOM_STEP,
            wheel_pan_step: DEFAULT_WHEEL_PAN_STEP,
        }
    }
}

impl SessionConfig {
    /// Build typed session config from the process environment.
    ///
    /// Optional:
    /// - `SCALELINE_AXIS_LOCK`: `true` (default) or `false`
    /// - `SCALELINE_PRECISION`: `1/2`, `1/4` (default), `1/8`, `1/16`, `1/32`
    /// - `SCALELINE_LINE_COLOR`: default `#ff0000`
    /// - `SCALELINE_CALIBRATION_COLOR`: default `#000000`
    /// - `SCALELINE_ZOOM_STEP`: default 0.1
    /// - `SCALELINE_WHEEL_PAN_STEP`: default 3
    ///
    /// # Errors
    ///
    /// Returns `MeasureError::Config` for a malformed value.
    pub fn from_env() -> Result<Self, MeasureError> {
        // Non-UTF-8 entries cannot be ours; skip them instead of panicking.
        Self::from_vars(
            std::env::vars_os().filter_map(|(k, v)| Some((k.to_str()?.to_owned(), v.to_str()?.to_owned()))),
        )
    }

    /// Build config from arbitrary key/value pairs; unrelated keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `MeasureError::Config` for a malformed value.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, MeasureError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        let defaults = Self::default();
        let get = |key: &str| vars.get(key).map(String::as_str);

        Ok(Self {
            axis_lock: parse_bool("SCALELINE_AXIS_LOCK", get("SCALELINE_AXIS_LOCK"), defaults.axis_lock)?,
            precision: match get("SCALELINE_PRECISION") {
                Some(raw) => raw.parse().map_err(|_| config_error("SCALELINE_PRECISION", raw))?,
                None => defaults.precision,
            },
            line_color: parse_color("SCALELINE_LINE_COLOR", get("SCALELINE_LINE_COLOR"), defaults.line_color)?,
            calibration_color: parse_color(
                "SCALELINE_CALIBRATION_COLOR",
                get("SCALELINE_CALIBRATION_COLOR"),
                defaults.calibration_color,
            )?,
            zoom_step: parse_step("SCALELINE_ZOOM_STEP", get("SCALELINE_ZOOM_STEP"), defaults.zoom_step)?,
            wheel_pan_step: parse_step(
                "SCALELINE_WHEEL_PAN_STEP",
                get("SCALELINE_WHEEL_PAN_STEP"),
                defaults.wheel_pan_step,
            )?,
        })
    }
}

fn parse_bool(key: &str, raw: Option<&str>, default: bool) -> Result<bool, MeasureError> {
    match raw.map(str::trim) {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(config_error(key, other)),
    }
}

fn parse_step(key: &str, raw: Option<&str>, default: f64) -> Result<f64, MeasureError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<f64>() {
        Ok(step) if step.is_finite() && step > 0.0 => Ok(step),
        _ => Err(config_error(key, raw)),
    }
}

fn parse_color(key: &str, raw: Option<&str>, default: String) -> Result<String, MeasureError> {
    match raw.map(str::trim) {
        None => Ok(default),
        Some("") => Err(config_error(key, "")),
        Some(color) => Ok(color.to_owned()),
    }
}

fn config_error(key: &str, value: &str) -> MeasureError {
    MeasureError::Config { key: key.to_owned(), value: value.to_owned() }
}
