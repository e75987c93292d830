//! Scripted sessions: a JSON-lines event format and a driver that plays it.
//!
//! Each non-blank line that does not start with `#` is one [`ScriptEvent`],
//! tagged by `"event"`:
//!
//! ```text
//! {"event":"tool","tool":"measure"}
//! {"event":"down","x":0,"y":0}
//! {"event":"move","x":300,"y":4}
//! {"event":"up","x":300,"y":4}
//! {"event":"calibrate"}
//! {"event":"confirm","value":"10'-0\"","unit":"ftin"}
//! ```
//!
//! Segments are addressed by creation index, since their ids are random.
//! A rejected calibration input is recorded in the report and the script
//! continues, the way a user would retry at the prompt; any other failure
//! stops the replay.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use std::io::BufRead;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calibration::CalibrationPhase;
use crate::camera::Camera;
use crate::config::SessionConfig;
use crate::engine::{Action, Session};
use crate::error::MeasureError;
use crate::geometry::Point;
use crate::input::{Button, Key, Modifiers, Tool, WheelDelta};
use crate::segment::{SegmentEdit, SegmentId, SegmentKind};
use crate::surface::{HostSurface, Scene, apply_actions};
use crate::units::{Precision, Scale, Unit};

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("failed to read script: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: invalid event: {source}")]
    Parse { line: usize, source: serde_json::Error },
    #[error("line {line}: {source}")]
    Measure { line: usize, source: MeasureError },
    #[error("line {line}: no segment at index {index}")]
    UnknownSegment { line: usize, index: usize },
}

/// One scripted input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    Tool { tool: Tool },
    Viewport { width: f64, height: f64 },
    Down {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Move {
        x: f64,
        y: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Up {
        x: f64,
        y: f64,
        #[serde(default)]
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerCancel,
    Calibrate,
    Confirm {
        value: String,
        unit: Unit,
        #[serde(default)]
        precision: Option<Precision>,
    },
    Cancel,
    Select { index: usize },
    Deselect,
    Delete,
    Transform { index: usize, edit: SegmentEdit },
    Key {
        key: String,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Wheel {
        x: f64,
        y: f64,
        #[serde(default)]
        dx: f64,
        dy: f64,
        #[serde(default)]
        modifiers: Modifiers,
    },
    Precision { precision: Precision },
    Unit { unit: Unit },
}

/// A script event with its 1-based source line.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptLine {
    pub line: usize,
    pub event: ScriptEvent,
}

/// Parse a JSON-lines script.
///
/// # Errors
///
/// Returns `Io` on read failure and `Parse` for a malformed line.
pub fn parse_script<R: BufRead>(reader: R) -> Result<Vec<ScriptLine>, ReplayError> {
    let mut events = Vec::new();
    for (index, raw) in reader.lines().enumerate() {
        let raw = raw?;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line = index + 1;
        let event = serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse { line, source })?;
        events.push(ScriptLine { line, event });
    }
    Ok(events)
}

/// A calibration input the session refused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub line: usize,
    pub error: String,
}

/// A live segment as it stands at the end of a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentReport {
    pub id: SegmentId,
    pub kind: SegmentKind,
    pub a: Point,
    pub b: Point,
    pub pixels: f64,
    pub label: String,
}

/// Final state of a replayed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub scale: Scale,
    pub calibration: CalibrationPhase,
    pub camera: Camera,
    pub selection: Option<SegmentId>,
    pub segments: Vec<SegmentReport>,
    /// Number of drawables on the surface.
    pub visuals: usize,
    pub rejected: Vec<Rejection>,
}

/// Drives a [`Session`] against an in-memory [`Scene`].
pub struct Replay {
    session: Session,
    scene: Scene,
    rejected: Vec<Rejection>,
}

impl Replay {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { session: Session::new(config), scene: Scene::new(), rejected: Vec::new() }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Play every line in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failure that is not a rejected calibration input.
    pub fn run(&mut self, script: &[ScriptLine]) -> Result<(), ReplayError> {
        script.iter().try_for_each(|line| self.step(line))
    }

    /// Play one line.
    ///
    /// # Errors
    ///
    /// Returns `Measure` for session failures other than a rejected
    /// calibration input, and `UnknownSegment` for a bad index.
    pub fn step(&mut self, script_line: &ScriptLine) -> Result<(), ReplayError> {
        let line = script_line.line;
        debug!(line, event = ?script_line.event, "replay");
        match self.dispatch(line, &script_line.event) {
            Ok(actions) => {
                apply_actions(&mut self.scene, actions);
                Ok(())
            }
            Err(ReplayError::Measure { line, source }) if source.is_user_correctable() => {
                self.rejected.push(Rejection { line, error: source.to_string() });
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn dispatch(&mut self, line: usize, event: &ScriptEvent) -> Result<Vec<Action>, ReplayError> {
        let measure = |source| ReplayError::Measure { line, source };
        let session = &mut self.session;
        Ok(match event {
            ScriptEvent::Tool { tool } => session.set_tool(*tool),
            ScriptEvent::Viewport { width, height } => {
                session.set_viewport(*width, *height);
                Vec::new()
            }
            ScriptEvent::Down { x, y, button, modifiers } => {
                session.on_pointer_down(Point::new(*x, *y), *button, *modifiers)
            }
            ScriptEvent::Move { x, y, modifiers } => session.on_pointer_move(Point::new(*x, *y), *modifiers),
            ScriptEvent::Up { x, y, button, modifiers } => {
                session.on_pointer_up(Point::new(*x, *y), *button, *modifiers)
            }
            ScriptEvent::PointerCancel => session.on_pointer_cancel(),
            ScriptEvent::Calibrate => session.begin_calibration(),
            ScriptEvent::Confirm { value, unit, precision } => {
                session.confirm_calibration(value, *unit, *precision).map_err(measure)?
            }
            ScriptEvent::Cancel => session.cancel_calibration(),
            ScriptEvent::Select { index } => {
                let id = segment_at(session, line, *index)?;
                session.select_segment(id).map_err(measure)?
            }
            ScriptEvent::Deselect => session.clear_selection(),
            ScriptEvent::Delete => session.delete_selected(),
            ScriptEvent::Transform { index, edit } => {
                let id = segment_at(session, line, *index)?;
                session.transform_segment(id, *edit).map_err(measure)?
            }
            ScriptEvent::Key { key, modifiers } => session.on_key_down(Key(key.clone()), *modifiers),
            ScriptEvent::Wheel { x, y, dx, dy, modifiers } => {
                session.on_wheel(Point::new(*x, *y), WheelDelta { dx: *dx, dy: *dy }, *modifiers)
            }
            ScriptEvent::Precision { precision } => session.set_precision(*precision).map_err(measure)?,
            ScriptEvent::Unit { unit } => session.set_display_unit(*unit).map_err(measure)?,
        })
    }

    /// Snapshot the session and surface.
    #[must_use]
    pub fn report(&self) -> Report {
        let segments = self
            .session
            .segments()
            .sorted()
            .into_iter()
            .map(|segment| {
                let (a, b) = segment.endpoints();
                SegmentReport {
                    id: segment.id(),
                    kind: segment.kind(),
                    a,
                    b,
                    pixels: segment.current_length(),
                    label: segment.label().to_owned(),
                }
            })
            .collect();
        Report {
            scale: self.session.scale(),
            calibration: self.session.calibration().phase,
            camera: self.session.camera(),
            selection: self.scene.active_selection(),
            segments,
            visuals: self.scene.len(),
            rejected: self.rejected.clone(),
        }
    }
}

/// Parse and play a whole script with `config`.
///
/// # Errors
///
/// Propagates parse and replay failures.
pub fn replay<R: BufRead>(reader: R, config: SessionConfig) -> Result<Report, ReplayError> {
    let script = parse_script(reader)?;
    let mut replay = Replay::new(config);
    replay.run(&script)?;
    Ok(replay.report())
}

fn segment_at(session: &Session, line: usize, index: usize) -> Result<SegmentId, ReplayError> {
    session.segments().ids().get(index).copied().ok_or(ReplayError::UnknownSegment { line, index })
}
