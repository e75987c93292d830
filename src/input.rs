//! Input model: tools, modifier keys, mouse buttons, and the session mode.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `Mode` is the single tagged state of the measurement session: every
//! non-idle variant carries the context needed to bring its gesture to a
//! terminal state on pointer-up or cancellation.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::segment::{End, SegmentId};

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Pan the view and select existing segments (default).
    #[default]
    Pan,
    /// Draw new measurement segments.
    Measure,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Meta / Command key.
    pub meta: bool,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    #[default]
    Primary,
    Middle,
    Secondary,
}

/// A keyboard key, named as the host reports it (e.g. `"Delete"`, `"Escape"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_delete(&self) -> bool {
        matches!(self.0.as_str(), "Delete" | "Backspace")
    }

    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }

    #[must_use]
    pub fn is_zoom_in(&self) -> bool {
        matches!(self.0.as_str(), "=" | "+")
    }

    #[must_use]
    pub fn is_zoom_out(&self) -> bool {
        self.0 == "-"
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// An in-progress drag on an already finalized segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectDrag {
    /// Rigid-body move; tracks the previous surface position.
    Body { last_world: Point },
    /// One endpoint follows the pointer.
    Endpoint { end: End },
}

/// The measurement session's interaction mode.
///
/// Calibration sub-phases live in the calibration engine; `Calibrating` only
/// records that pointer gestures are routed there.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Mode {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging the view.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// Stretching a freshly created measurement segment.
    Drawing { id: SegmentId },
    /// Two-point calibration is active.
    Calibrating {
        /// Fine-tuning drag on the completed calibration segment, if any.
        drag: Option<SelectDrag>,
    },
    /// A finalized segment is selected.
    Selecting { id: SegmentId, drag: Option<SelectDrag> },
}

impl Mode {
    /// Short name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Panning { .. } => "panning",
            Self::Drawing { .. } => "drawing",
            Self::Calibrating { .. } => "calibrating",
            Self::Selecting { .. } => "selecting",
        }
    }

    /// Whether a pointer gesture is currently held.
    #[must_use]
    pub fn is_gesture_active(&self) -> bool {
        matches!(
            self,
            Self::Panning { .. }
                | Self::Drawing { .. }
                | Self::Calibrating { drag: Some(_) }
                | Self::Selecting { drag: Some(_), .. }
        )
    }
}
