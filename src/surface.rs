//! Host surface adapter: where session actions land.
//!
//! A host (browser canvas, native viewer, test harness) implements
//! [`HostSurface`] and feeds every `Vec<Action>` returned by the session
//! through [`apply_actions`]. [`Scene`] is the in-memory implementation used
//! by the replay driver and the tests: a render list keyed by visual id.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use crate::camera::Camera;
use crate::engine::Action;
use crate::segment::{SegmentId, Visual, VisualId};
use crate::units::Scale;

/// Narrow interface the session needs from its host.
pub trait HostSurface {
    fn add_visual(&mut self, visual: Visual);
    fn update_visual(&mut self, visual: Visual);
    fn remove_visual(&mut self, id: VisualId);
    fn set_selectable(&mut self, id: VisualId, selectable: bool);
    fn set_view(&mut self, camera: Camera);
    fn request_redraw(&mut self);
    fn set_active_selection(&mut self, id: Option<SegmentId>);
    fn active_selection(&self) -> Option<SegmentId>;

    /// Side display of the active segment's length.
    fn show_length(&mut self, _id: SegmentId, _text: &str) {}

    /// The calibration reference is ready; a host would prompt for its length here.
    fn prompt_calibration(&mut self, _id: SegmentId, _pixels: f64) {}

    fn scale_changed(&mut self, _scale: Scale) {}
}

/// Apply a batch of session actions to `surface`, in order.
pub fn apply_actions<S: HostSurface + ?Sized>(surface: &mut S, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::AddVisual(visual) => surface.add_visual(visual),
            Action::UpdateVisual(visual) => surface.update_visual(visual),
            Action::RemoveVisual(id) => surface.remove_visual(id),
            Action::SetSelectable { id, selectable } => surface.set_selectable(id, selectable),
            Action::ViewChanged(camera) => surface.set_view(camera),
            Action::LengthReadout { id, text, .. } => surface.show_length(id, &text),
            Action::CalibrationReady { id, pixels } => surface.prompt_calibration(id, pixels),
            Action::ScaleChanged(scale) => surface.scale_changed(scale),
            Action::SelectionChanged(id) => surface.set_active_selection(id),
            Action::RenderNeeded => surface.request_redraw(),
        }
    }
}

/// One entry in the render list.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub visual: Visual,
    pub selectable: bool,
}

/// In-memory render list.
#[derive(Debug, Default)]
pub struct Scene {
    entries: Vec<SceneEntry>,
    camera: Camera,
    selection: Option<SegmentId>,
    readout: Option<String>,
    pending_calibration: Option<SegmentId>,
    redraws: usize,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Visuals in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: VisualId) -> Option<&SceneEntry> {
        self.entries.iter().find(|entry| entry.visual.id() == id)
    }

    /// Visuals belonging to one segment.
    #[must_use]
    pub fn owned_by(&self, owner: SegmentId) -> Vec<&Visual> {
        self.entries.iter().map(|entry| &entry.visual).filter(|visual| visual.owner() == owner).collect()
    }

    #[must_use]
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Last length shown in the side display.
    #[must_use]
    pub fn readout(&self) -> Option<&str> {
        self.readout.as_deref()
    }

    /// Calibration reference awaiting the user's real-world length.
    #[must_use]
    pub fn pending_calibration(&self) -> Option<SegmentId> {
        self.pending_calibration
    }

    #[must_use]
    pub fn redraws(&self) -> usize {
        self.redraws
    }

    fn position(&self, id: VisualId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.visual.id() == id)
    }
}

impl HostSurface for Scene {
    fn add_visual(&mut self, visual: Visual) {
        match self.position(visual.id()) {
            Some(index) => self.entries[index].visual = visual,
            None => self.entries.push(SceneEntry { visual, selectable: false }),
        }
    }

    fn update_visual(&mut self, visual: Visual) {
        if let Some(index) = self.position(visual.id()) {
            self.entries[index].visual = visual;
        }
    }

    fn remove_visual(&mut self, id: VisualId) {
        let Some(index) = self.position(id) else {
            return;
        };
        let removed = self.entries.remove(index);
        if self.pending_calibration == Some(removed.visual.owner()) {
            self.pending_calibration = None;
        }
        if self.entries.is_empty() {
            self.readout = None;
        }
    }

    fn set_selectable(&mut self, id: VisualId, selectable: bool) {
        if let Some(index) = self.position(id) {
            self.entries[index].selectable = selectable;
        }
    }

    fn set_view(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn set_active_selection(&mut self, id: Option<SegmentId>) {
        self.selection = id;
    }

    fn active_selection(&self) -> Option<SegmentId> {
        self.selection
    }

    fn show_length(&mut self, _id: SegmentId, text: &str) {
        self.readout = Some(text.to_owned());
    }

    fn prompt_calibration(&mut self, id: SegmentId, _pixels: f64) {
        self.pending_calibration = Some(id);
    }

    fn scale_changed(&mut self, _scale: Scale) {
        self.pending_calibration = None;
    }
}
