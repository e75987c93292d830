use tracing::{debug, info, warn};

use crate::calibration::{CalibrationEngine, CalibrationPhase, CalibrationState};
use crate::camera::Camera;
use crate::config::SessionConfig;
use crate::error::MeasureError;
use crate::geometry::Point;
use crate::hit::{HitPart, hit_test};
use crate::input::{Button, Key, Mode, Modifiers, SelectDrag, Tool, WheelDelta};
use crate::segment::{Segment, SegmentEdit, SegmentId, SegmentKind, SegmentStore, Visual, VisualId};
use crate::units::{Precision, Scale, Unit};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from session handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    AddVisual(Visual),
    UpdateVisual(Visual),
    RemoveVisual(VisualId),
    SetSelectable { id: VisualId, selectable: bool },
    ViewChanged(Camera),
    /// Live length of the active or selected segment, for a side display.
    LengthReadout { id: SegmentId, pixels: f64, text: String },
    /// The calibration reference is drawn; the host should prompt for its real length.
    CalibrationReady { id: SegmentId, pixels: f64 },
    ScaleChanged(Scale),
    SelectionChanged(Option<SegmentId>),
    RenderNeeded,
}

/// The measurement session: segments, calibration, view, and the active mode.
///
/// Pointer positions arrive in screen space and are mapped to the surface
/// through the session's camera. Every handler returns the actions the host
/// must apply before its next redraw.
pub struct Session {
    segments: SegmentStore,
    calibration: CalibrationEngine,
    camera: Camera,
    tool: Tool,
    mode: Mode,
    config: SessionConfig,
    viewport_width: f64,
    viewport_height: f64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            segments: SegmentStore::new(),
            calibration: CalibrationEngine::new(config.precision),
            camera: Camera::default(),
            tool: Tool::default(),
            mode: Mode::Idle,
            config,
            viewport_width: 0.0,
            viewport_height: 0.0,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.tool
    }

    #[must_use]
    pub fn scale(&self) -> Scale {
        self.calibration.scale()
    }

    #[must_use]
    pub fn calibration(&self) -> CalibrationState {
        self.calibration.state()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    #[must_use]
    pub fn segment(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.get(id)
    }

    /// The selected segment, including a completed calibration reference.
    #[must_use]
    pub fn selection(&self) -> Option<SegmentId> {
        match (self.mode, self.calibration.phase()) {
            (Mode::Selecting { id, .. }, _) | (Mode::Calibrating { .. }, CalibrationPhase::Complete { id }) => Some(id),
            _ => None,
        }
    }

    // --- Viewport ---

    /// Update the viewport size, used as the keyboard zoom anchor.
    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport_width = width;
        self.viewport_height = height;
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary || self.mode.is_gesture_active() {
            return Vec::new();
        }
        let world = self.camera.screen_to_world(screen_pt);
        let result = match self.mode {
            Mode::Calibrating { .. } => self.calibration_down(world),
            Mode::Selecting { id, .. } => Ok(self.selecting_down(id, world)),
            Mode::Idle => match self.tool {
                Tool::Measure => self.start_drawing(world),
                Tool::Pan => Ok(self.pan_down(screen_pt, world)),
            },
            Mode::Panning { .. } | Mode::Drawing { .. } => Ok(Vec::new()),
        };
        guarded(result, "pointer down")
    }

    /// Pointer moved. Holding Alt suspends axis lock for this event.
    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        let world = self.camera.screen_to_world(screen_pt);
        let lock = self.config.axis_lock && !modifiers.alt;
        let result = match self.mode {
            Mode::Panning { last_screen } => {
                self.camera.pan_by(screen_pt.x - last_screen.x, screen_pt.y - last_screen.y);
                self.mode = Mode::Panning { last_screen: screen_pt };
                Ok(vec![Action::ViewChanged(self.camera), Action::RenderNeeded])
            }
            Mode::Drawing { id } => self.stretch_drawing(id, world, lock),
            Mode::Selecting { id, drag: Some(drag) } => self.drag_segment(id, drag, world, lock).map(|(drag, actions)| {
                self.mode = Mode::Selecting { id, drag: Some(drag) };
                actions
            }),
            Mode::Calibrating { drag: Some(drag) } => match self.calibration.phase() {
                CalibrationPhase::Complete { id } => self.drag_segment(id, drag, world, lock).map(|(drag, actions)| {
                    self.mode = Mode::Calibrating { drag: Some(drag) };
                    actions
                }),
                _ => Ok(Vec::new()),
            },
            Mode::Idle | Mode::Selecting { drag: None, .. } | Mode::Calibrating { drag: None } => Ok(Vec::new()),
        };
        guarded(result, "pointer move")
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        if button != Button::Primary {
            return Vec::new();
        }
        let mut actions = Vec::new();
        if let Mode::Drawing { .. } = self.mode {
            actions = self.on_pointer_move(screen_pt, modifiers);
        }
        actions.extend(self.finish_gesture());
        actions
    }

    /// The pointer left the surface or the host aborted the gesture.
    pub fn on_pointer_cancel(&mut self) -> Vec<Action> {
        self.finish_gesture()
    }

    fn start_drawing(&mut self, world: Point) -> Result<Vec<Action>, MeasureError> {
        let segment = Segment::create(SegmentKind::Measure, world, &self.scale(), self.config.line_color.as_str())?;
        let id = segment.id();
        let mut actions: Vec<Action> = segment.visuals().into_iter().map(Action::AddVisual).collect();
        actions.push(readout(&segment));
        actions.push(Action::RenderNeeded);
        self.segments.insert(segment);
        debug!(%id, x = world.x, y = world.y, "segment created");
        self.set_mode(Mode::Drawing { id });
        Ok(actions)
    }

    fn stretch_drawing(&mut self, id: SegmentId, world: Point, lock: bool) -> Result<Vec<Action>, MeasureError> {
        let scale = self.scale();
        let segment = self.segments.require_mut(&id)?;
        segment.update_endpoint(world, lock, &scale)?;
        Ok(refreshed(segment))
    }

    fn pan_down(&mut self, screen_pt: Point, world: Point) -> Vec<Action> {
        match hit_test(world, &self.segments, &self.camera, None) {
            Some(hit) => {
                self.set_mode(Mode::Selecting { id: hit.segment_id, drag: Some(drag_for(hit.part, world)) });
                self.selection_actions(hit.segment_id)
            }
            None => {
                self.set_mode(Mode::Panning { last_screen: screen_pt });
                Vec::new()
            }
        }
    }

    fn selecting_down(&mut self, selected: SegmentId, world: Point) -> Vec<Action> {
        match hit_test(world, &self.segments, &self.camera, Some(selected)) {
            Some(hit) => {
                self.set_mode(Mode::Selecting { id: hit.segment_id, drag: Some(drag_for(hit.part, world)) });
                if hit.segment_id == selected {
                    Vec::new()
                } else {
                    self.selection_actions(hit.segment_id)
                }
            }
            None => self.clear_selection(),
        }
    }

    fn calibration_down(&mut self, world: Point) -> Result<Vec<Action>, MeasureError> {
        match self.calibration.phase() {
            CalibrationPhase::AwaitingPointA => {
                let id = self.calibration.place_point_a(world, &mut self.segments, &self.config.calibration_color)?;
                let segment = self.segments.get(&id).ok_or(MeasureError::SegmentNotFound(id))?;
                let mut actions: Vec<Action> = segment.visuals().into_iter().map(Action::AddVisual).collect();
                actions.push(Action::RenderNeeded);
                Ok(actions)
            }
            CalibrationPhase::AwaitingPointB { .. } => {
                let Some(id) = self.calibration.place_point_b(world, self.config.axis_lock, &mut self.segments)? else {
                    return Ok(Vec::new());
                };
                let segment = self.segments.get(&id).ok_or(MeasureError::SegmentNotFound(id))?;
                let mut actions: Vec<Action> = segment.visuals().into_iter().map(Action::UpdateVisual).collect();
                actions.extend(selectable_actions(segment));
                actions.push(Action::CalibrationReady { id, pixels: segment.current_length() });
                actions.push(readout(segment));
                actions.push(Action::SelectionChanged(Some(id)));
                actions.push(Action::RenderNeeded);
                Ok(actions)
            }
            CalibrationPhase::Complete { id } => {
                if let Some(hit) = hit_test(world, &self.segments, &self.camera, Some(id)) {
                    if hit.segment_id == id {
                        self.mode = Mode::Calibrating { drag: Some(drag_for(hit.part, world)) };
                    }
                }
                Ok(Vec::new())
            }
            CalibrationPhase::Idle => Ok(Vec::new()),
        }
    }

    fn drag_segment(
        &mut self,
        id: SegmentId,
        drag: SelectDrag,
        world: Point,
        lock: bool,
    ) -> Result<(SelectDrag, Vec<Action>), MeasureError> {
        let scale = self.scale();
        let segment = self.segments.require_mut(&id)?;
        let next = match drag {
            SelectDrag::Body { last_world } => {
                let edit = SegmentEdit::Translate { dx: world.x - last_world.x, dy: world.y - last_world.y };
                segment.apply_edit(edit, &scale)?;
                SelectDrag::Body { last_world: world }
            }
            SelectDrag::Endpoint { end } => {
                segment.set_endpoint(end, world, lock, &scale)?;
                drag
            }
        };
        Ok((next, refreshed(segment)))
    }

    /// Bring any held gesture to its terminal state.
    fn finish_gesture(&mut self) -> Vec<Action> {
        match self.mode {
            Mode::Panning { .. } => {
                self.set_mode(Mode::Idle);
                Vec::new()
            }
            Mode::Drawing { id } => guarded(self.finish_drawing(id), "finish drawing"),
            Mode::Selecting { id, drag: Some(_) } => {
                self.mode = Mode::Selecting { id, drag: None };
                Vec::new()
            }
            Mode::Calibrating { drag: Some(_) } => {
                self.mode = Mode::Calibrating { drag: None };
                Vec::new()
            }
            Mode::Idle | Mode::Selecting { drag: None, .. } | Mode::Calibrating { drag: None } => Vec::new(),
        }
    }

    /// Finalize the drawn segment, or discard it when it has no length.
    fn finish_drawing(&mut self, id: SegmentId) -> Result<Vec<Action>, MeasureError> {
        self.set_mode(Mode::Idle);
        let scale = self.scale();
        let selectable = self.tool == Tool::Pan;
        let segment = self.segments.require_mut(&id)?;

        if segment.is_degenerate() {
            let mut actions = remove_actions(segment);
            self.segments.remove(&id);
            debug!(%id, "zero-length segment discarded");
            actions.push(Action::RenderNeeded);
            return Ok(actions);
        }

        segment.finalize(&scale)?;
        segment.set_selectable(selectable);
        let mut actions = refreshed(segment);
        actions.extend(selectable_actions(segment));
        debug!(%id, pixels = segment.current_length(), "segment finalized");
        Ok(actions)
    }

    // --- Tool ---

    /// Switch tools; the draw-mode toggle.
    ///
    /// Finished measurement segments become selectable under `Pan` and inert
    /// under `Measure`.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = self.finish_gesture();
        if tool == self.tool {
            return actions;
        }
        self.tool = tool;
        debug!(?tool, "tool changed");
        if tool == Tool::Measure {
            actions.extend(self.clear_selection());
        }

        let selectable = tool == Tool::Pan;
        for id in self.segments.ids() {
            if let Some(segment) = self.segments.get_mut(&id) {
                if segment.kind() == SegmentKind::Measure && segment.is_locked() {
                    segment.set_selectable(selectable);
                    actions.extend(selectable_actions(segment));
                }
            }
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Calibration ---

    /// Start a fresh two-point calibration cycle.
    pub fn begin_calibration(&mut self) -> Vec<Action> {
        let mut actions = self.finish_gesture();
        if let Mode::Selecting { .. } = self.mode {
            actions.push(Action::SelectionChanged(None));
        }
        if let Some(old) = self.calibration.begin(&mut self.segments) {
            actions.extend(remove_actions(&old));
        }
        self.set_mode(Mode::Calibrating { drag: None });
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Apply the real-world length of the calibration reference.
    ///
    /// # Errors
    ///
    /// Propagates [`CalibrationEngine::confirm`] failures; nothing changes on error.
    pub fn confirm_calibration(
        &mut self,
        input: &str,
        unit: Unit,
        precision: Option<Precision>,
    ) -> Result<Vec<Action>, MeasureError> {
        let removed = self.calibration.confirm(input, unit, precision, &mut self.segments)?;
        let mut actions = remove_actions(&removed);
        actions.push(Action::ScaleChanged(self.scale()));
        actions.extend(self.label_updates());
        actions.push(Action::SelectionChanged(None));
        actions.push(Action::RenderNeeded);
        self.set_mode(Mode::Idle);
        Ok(actions)
    }

    /// Abandon calibration, removing its reference segment.
    pub fn cancel_calibration(&mut self) -> Vec<Action> {
        if !self.calibration.is_active() {
            return Vec::new();
        }
        let was_complete = matches!(self.calibration.phase(), CalibrationPhase::Complete { .. });
        let mut actions =
            self.calibration.cancel(&mut self.segments).map(|seg| remove_actions(&seg)).unwrap_or_default();
        if was_complete {
            actions.push(Action::SelectionChanged(None));
        }
        if let Mode::Calibrating { .. } = self.mode {
            self.set_mode(Mode::Idle);
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Selection ---

    /// Select a finished measurement segment.
    ///
    /// # Errors
    ///
    /// Returns `SegmentNotFound` for unknown ids and calibration references.
    pub fn select_segment(&mut self, id: SegmentId) -> Result<Vec<Action>, MeasureError> {
        if self.segments.get(&id).is_none_or(|seg| seg.kind() != SegmentKind::Measure) {
            return Err(MeasureError::SegmentNotFound(id));
        }
        let mut actions = self.finish_gesture();
        actions.extend(self.cancel_calibration());
        if self.segments.get(&id).is_none() {
            // The gesture just finished was a zero-length draw of this id.
            return Err(MeasureError::SegmentNotFound(id));
        }
        self.set_mode(Mode::Selecting { id, drag: None });
        actions.extend(self.selection_actions(id));
        Ok(actions)
    }

    /// Deselect; a no-op unless a segment is selected.
    pub fn clear_selection(&mut self) -> Vec<Action> {
        let Mode::Selecting { .. } = self.mode else {
            return Vec::new();
        };
        self.set_mode(Mode::Idle);
        vec![Action::SelectionChanged(None), Action::RenderNeeded]
    }

    // --- Editing ---

    /// Delete the selected segment, if any.
    pub fn delete_selected(&mut self) -> Vec<Action> {
        match self.mode {
            Mode::Selecting { id, .. } => guarded(self.delete_segment(id), "delete"),
            _ => Vec::new(),
        }
    }

    /// Delete a segment together with its markers.
    ///
    /// Deleting the calibration reference cancels calibration.
    ///
    /// # Errors
    ///
    /// Returns `SegmentNotFound` for unknown ids.
    pub fn delete_segment(&mut self, id: SegmentId) -> Result<Vec<Action>, MeasureError> {
        if self.calibration.phase().segment() == Some(id) {
            return Ok(self.cancel_calibration());
        }
        let removed = self.segments.remove(&id).ok_or(MeasureError::SegmentNotFound(id))?;
        let mut actions = remove_actions(&removed);
        match self.mode {
            Mode::Selecting { id: selected, .. } if selected == id => {
                self.set_mode(Mode::Idle);
                actions.push(Action::SelectionChanged(None));
            }
            Mode::Drawing { id: drawing } if drawing == id => self.set_mode(Mode::Idle),
            _ => {}
        }
        info!(%id, "segment deleted");
        actions.push(Action::RenderNeeded);
        Ok(actions)
    }

    /// Apply a host move/rotate/scale edit to a segment.
    ///
    /// # Errors
    ///
    /// Returns `SegmentNotFound` for unknown ids and `DegenerateGeometry` for
    /// singular edits; the segment is unchanged on error.
    pub fn transform_segment(&mut self, id: SegmentId, edit: SegmentEdit) -> Result<Vec<Action>, MeasureError> {
        let scale = self.scale();
        let segment = self.segments.require_mut(&id)?;
        segment.apply_edit(edit, &scale)?;
        debug!(%id, ?edit, "segment transformed");
        Ok(refreshed(segment))
    }

    // --- Scale settings ---

    /// Change the foot-inch precision and re-render every label.
    ///
    /// # Errors
    ///
    /// Propagates formatting failures; nothing changes on error.
    pub fn set_precision(&mut self, precision: Precision) -> Result<Vec<Action>, MeasureError> {
        self.calibration.set_precision(precision, &mut self.segments)?;
        Ok(self.rescaled())
    }

    /// Change the display unit and re-render every label.
    ///
    /// # Errors
    ///
    /// Propagates formatting failures; nothing changes on error.
    pub fn set_display_unit(&mut self, unit: Unit) -> Result<Vec<Action>, MeasureError> {
        self.calibration.set_display_unit(unit, &mut self.segments)?;
        Ok(self.rescaled())
    }

    fn rescaled(&self) -> Vec<Action> {
        let mut actions = vec![Action::ScaleChanged(self.scale())];
        actions.extend(self.label_updates());
        actions.push(Action::RenderNeeded);
        actions
    }

    // --- Keyboard / wheel ---

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.ctrl || modifiers.meta {
            let step = if key.is_zoom_in() {
                self.config.zoom_step
            } else if key.is_zoom_out() {
                -self.config.zoom_step
            } else {
                return Vec::new();
            };
            let centre = Point::new(self.viewport_width / 2.0, self.viewport_height / 2.0);
            return self.zoom_by(centre, step);
        }

        let calibrating = self.calibration.is_active();
        if key.is_delete() {
            if calibrating { self.cancel_calibration() } else { self.delete_selected() }
        } else if key.is_escape() {
            if calibrating { self.cancel_calibration() } else { self.clear_selection() }
        } else {
            Vec::new()
        }
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if !delta.dy.is_finite() || delta.dy.abs() < f64::EPSILON {
            return Vec::new();
        }
        let direction = delta.dy.signum();
        let step = self.config.wheel_pan_step;
        if modifiers.ctrl {
            return self.zoom_by(screen_pt, -direction * self.config.zoom_step);
        }
        if modifiers.shift || modifiers.meta {
            self.camera.pan_by(direction * step, 0.0);
        } else {
            self.camera.pan_by(0.0, -direction * step);
        }
        vec![Action::ViewChanged(self.camera), Action::RenderNeeded]
    }

    fn zoom_by(&mut self, anchor: Point, step: f64) -> Vec<Action> {
        if self.camera.zoom_at(anchor, self.camera.zoom + step) {
            vec![Action::ViewChanged(self.camera), Action::RenderNeeded]
        } else {
            Vec::new()
        }
    }

    // --- Helpers ---

    fn set_mode(&mut self, mode: Mode) {
        if self.mode.name() != mode.name() {
            debug!(from = self.mode.name(), to = mode.name(), "session mode");
        }
        self.mode = mode;
    }

    fn selection_actions(&self, id: SegmentId) -> Vec<Action> {
        let mut actions = vec![Action::SelectionChanged(Some(id))];
        if let Some(segment) = self.segments.get(&id) {
            actions.push(readout(segment));
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    fn label_updates(&self) -> Vec<Action> {
        self.segments
            .sorted()
            .into_iter()
            .map(|segment| {
                let [_, _, _, label] = segment.visuals();
                Action::UpdateVisual(label)
            })
            .collect()
    }
}

/// Log and swallow a failed handler; the state is unchanged.
fn guarded(result: Result<Vec<Action>, MeasureError>, what: &str) -> Vec<Action> {
    result.unwrap_or_else(|err| {
        warn!(%err, what, "handler aborted");
        Vec::new()
    })
}

fn drag_for(part: HitPart, world: Point) -> SelectDrag {
    match part {
        HitPart::Endpoint(end) => SelectDrag::Endpoint { end },
        HitPart::Body => SelectDrag::Body { last_world: world },
    }
}

fn readout(segment: &Segment) -> Action {
    Action::LengthReadout { id: segment.id(), pixels: segment.current_length(), text: segment.label().to_owned() }
}

/// Visual updates and readout after a geometry change.
fn refreshed(segment: &Segment) -> Vec<Action> {
    let mut actions: Vec<Action> = segment.visuals().into_iter().map(Action::UpdateVisual).collect();
    actions.push(readout(segment));
    actions.push(Action::RenderNeeded);
    actions
}

fn remove_actions(segment: &Segment) -> Vec<Action> {
    segment.visual_ids().into_iter().map(Action::RemoveVisual).collect()
}

fn selectable_actions(segment: &Segment) -> Vec<Action> {
    let selectable = segment.is_selectable();
    segment.visual_ids().into_iter().map(|id| Action::SetSelectable { id, selectable }).collect()
}
