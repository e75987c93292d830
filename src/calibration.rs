//! Two-point calibration: derive a scale factor from one reference segment.
//!
//! The engine walks `Idle → AwaitingPointA → AwaitingPointB → Complete` and
//! back to `Idle` on confirm or cancel. The reference segment lives in the
//! shared [`SegmentStore`] while the cycle is active so that it renders and
//! can be fine-tuned like any other segment. The scale is only ever written by
//! a successful [`CalibrationEngine::confirm`].

#[cfg(test)]
#[path = "calibration_test.rs"]
mod calibration_test;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::consts::ZERO_LENGTH_PX;
use crate::error::MeasureError;
use crate::geometry::Point;
use crate::segment::{End, Segment, SegmentId, SegmentKind, SegmentStore};
use crate::units::{Precision, Scale, Unit, parse_length};

/// Transient sub-state of a calibration cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum CalibrationPhase {
    #[default]
    Idle,
    AwaitingPointA,
    AwaitingPointB { id: SegmentId },
    /// Reference segment drawn and waiting for its real-world length.
    Complete { id: SegmentId },
}

impl CalibrationPhase {
    /// The reference segment of the active cycle, if one has been placed.
    #[must_use]
    pub fn segment(self) -> Option<SegmentId> {
        match self {
            Self::AwaitingPointB { id } | Self::Complete { id } => Some(id),
            Self::Idle | Self::AwaitingPointA => None,
        }
    }
}

/// Session-wide calibration: the persistent scale plus the transient phase.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CalibrationState {
    pub scale: Scale,
    pub phase: CalibrationPhase,
}

/// Drives the two-point calibration protocol.
#[derive(Debug, Default)]
pub struct CalibrationEngine {
    state: CalibrationState,
}

impl CalibrationEngine {
    #[must_use]
    pub fn new(precision: Precision) -> Self {
        let scale = Scale { precision, ..Scale::default() };
        Self { state: CalibrationState { scale, phase: CalibrationPhase::Idle } }
    }

    // --- Queries ---

    #[must_use]
    pub fn state(&self) -> CalibrationState {
        self.state
    }

    #[must_use]
    pub fn scale(&self) -> Scale {
        self.state.scale
    }

    #[must_use]
    pub fn phase(&self) -> CalibrationPhase {
        self.state.phase
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.phase != CalibrationPhase::Idle
    }

    // --- Protocol ---

    /// Start a fresh cycle, discarding any reference segment from a previous one.
    ///
    /// Returns the discarded segment so its visuals can be removed.
    pub fn begin(&mut self, store: &mut SegmentStore) -> Option<Segment> {
        let discarded = self.discard_segment(store);
        self.set_phase(CalibrationPhase::AwaitingPointA);
        discarded
    }

    /// Place the first point: seed a zero-length reference segment at `p`.
    ///
    /// # Errors
    ///
    /// Returns `CalibrationNotReady` unless awaiting point A.
    pub fn place_point_a(
        &mut self,
        p: Point,
        store: &mut SegmentStore,
        stroke: &str,
    ) -> Result<SegmentId, MeasureError> {
        if self.state.phase != CalibrationPhase::AwaitingPointA {
            return Err(MeasureError::CalibrationNotReady);
        }
        let segment = Segment::create(SegmentKind::Calibration, p, &self.state.scale, stroke)?;
        let id = segment.id();
        store.insert(segment);
        self.set_phase(CalibrationPhase::AwaitingPointB { id });
        Ok(id)
    }

    /// Place the second point: stretch, finalize, and complete the cycle.
    ///
    /// Returns `Ok(None)` when the click would give a zero-length segment;
    /// the engine then keeps awaiting point B.
    ///
    /// # Errors
    ///
    /// Returns `CalibrationNotReady` unless awaiting point B, and propagates
    /// geometry failures.
    pub fn place_point_b(
        &mut self,
        p: Point,
        axis_lock: bool,
        store: &mut SegmentStore,
    ) -> Result<Option<SegmentId>, MeasureError> {
        let CalibrationPhase::AwaitingPointB { id } = self.state.phase else {
            return Err(MeasureError::CalibrationNotReady);
        };
        let scale = self.state.scale;
        let segment = store.require_mut(&id)?;

        let mut stretched = segment.clone();
        stretched.update_endpoint(p, axis_lock, &scale)?;
        if stretched.is_degenerate() {
            warn!(%id, "calibration point B ignored: zero-length reference");
            return Ok(None);
        }
        stretched.finalize(&scale)?;
        stretched.set_selectable(true);
        *segment = stretched;

        self.set_phase(CalibrationPhase::Complete { id });
        Ok(Some(id))
    }

    /// Apply the user's real-world length for the reference segment.
    ///
    /// On success the new scale replaces the old one, the reference segment
    /// is removed from `store` and returned, every remaining label is
    /// re-rendered, and the engine returns to `Idle`. On failure nothing
    /// changes and the engine stays in `Complete` for a retry.
    ///
    /// # Errors
    ///
    /// - `CalibrationNotReady` unless in `Complete`
    /// - `InvalidFormat` when `input` does not parse in `unit`
    /// - `DegenerateGeometry` when the reference segment has zero length
    pub fn confirm(
        &mut self,
        input: &str,
        unit: Unit,
        precision: Option<Precision>,
        store: &mut SegmentStore,
    ) -> Result<Segment, MeasureError> {
        let CalibrationPhase::Complete { id } = self.state.phase else {
            return Err(MeasureError::CalibrationNotReady);
        };
        let real_px = parse_length(input, unit).inspect_err(|err| warn!(%err, "calibration input rejected"))?;
        let segment_px = store.get(&id).ok_or(MeasureError::SegmentNotFound(id))?.current_length();
        if segment_px <= ZERO_LENGTH_PX {
            return Err(MeasureError::DegenerateGeometry);
        }

        let scale = Scale {
            factor: real_px / segment_px,
            unit,
            precision: precision.unwrap_or(self.state.scale.precision),
        };
        store.relabel_all(&scale)?;
        let removed = store.remove(&id).ok_or(MeasureError::SegmentNotFound(id))?;

        self.state.scale = scale;
        self.set_phase(CalibrationPhase::Idle);
        info!(factor = scale.factor, unit = %scale.unit, precision = %scale.precision, "calibration confirmed");
        Ok(removed)
    }

    /// Abandon the cycle without touching the scale.
    ///
    /// Returns the reference segment, if one had been placed.
    pub fn cancel(&mut self, store: &mut SegmentStore) -> Option<Segment> {
        let discarded = self.discard_segment(store);
        self.set_phase(CalibrationPhase::Idle);
        discarded
    }

    // --- Scale settings ---

    /// Change the sub-inch precision and re-render every label.
    ///
    /// # Errors
    ///
    /// Propagates formatting failures; nothing changes on error.
    pub fn set_precision(&mut self, precision: Precision, store: &mut SegmentStore) -> Result<(), MeasureError> {
        self.rescale(Scale { precision, ..self.state.scale }, store)
    }

    /// Change the display unit and re-render every label.
    ///
    /// # Errors
    ///
    /// Propagates formatting failures; nothing changes on error.
    pub fn set_display_unit(&mut self, unit: Unit, store: &mut SegmentStore) -> Result<(), MeasureError> {
        self.rescale(Scale { unit, ..self.state.scale }, store)
    }

    /// Move an endpoint of the completed reference segment.
    ///
    /// # Errors
    ///
    /// Returns `CalibrationNotReady` unless in `Complete`; propagates geometry failures.
    pub fn adjust_endpoint(
        &mut self,
        end: End,
        p: Point,
        axis_lock: bool,
        store: &mut SegmentStore,
    ) -> Result<SegmentId, MeasureError> {
        let CalibrationPhase::Complete { id } = self.state.phase else {
            return Err(MeasureError::CalibrationNotReady);
        };
        store.require_mut(&id)?.set_endpoint(end, p, axis_lock, &self.state.scale)?;
        Ok(id)
    }

    fn rescale(&mut self, scale: Scale, store: &mut SegmentStore) -> Result<(), MeasureError> {
        store.relabel_all(&scale)?;
        self.state.scale = scale;
        Ok(())
    }

    fn discard_segment(&mut self, store: &mut SegmentStore) -> Option<Segment> {
        self.state.phase.segment().and_then(|id| store.remove(&id))
    }

    fn set_phase(&mut self, phase: CalibrationPhase) {
        debug!(from = ?self.state.phase, to = ?phase, "calibration phase");
        self.state.phase = phase;
    }
}
