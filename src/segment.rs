//! Segment model: a measured line, its two end caps, and its length label.
//!
//! A [`Segment`] owns exactly three markers. Their placement is always derived
//! from the segment's live endpoints, so that no caller can observe a cap or
//! label that disagrees with the line. After [`Segment::finalize`] each marker
//! also carries a relationship transform (its matrix relative to the
//! segment's matrix) which is replayed on every rigid-body edit to carry
//! marker scale and skew along with the segment.
//!
//! [`SegmentStore`] owns every live segment and hands out the [`Visual`]s the
//! host surface draws. Removing a segment from the store removes all four of
//! its visuals at once.

#[cfg(test)]
#[path = "segment_test.rs"]
mod segment_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{CAP_LENGTH_PX, ZERO_LENGTH_PX};
use crate::error::MeasureError;
use crate::geometry::{
    Point, Pose, Transform, apply_relationship, axis_lock, compose_relationship, length, midpoint,
    perpendicular_angle,
};
use crate::units::Scale;

/// Unique identifier for a segment.
pub type SegmentId = Uuid;

/// Unique identifier for a drawable handed to the host surface.
pub type VisualId = Uuid;

/// What a segment is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// A user measurement that stays on the page.
    Measure,
    /// The reference line of a calibration cycle; removed on confirm or cancel.
    Calibration,
}

/// Which endpoint of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum End {
    A,
    B,
}

/// Role of a dependent marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRole {
    StartCap,
    EndCap,
    Label,
}

/// A dependent drawable glued to a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub visual: VisualId,
    pub role: MarkerRole,
    pub pose: Pose,
    /// Marker matrix relative to the segment matrix, captured at finalize.
    pub relationship: Option<Transform>,
}

/// Rigid-body edit applied to a whole segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SegmentEdit {
    Translate { dx: f64, dy: f64 },
    /// Rotation about the live midpoint.
    Rotate { degrees: f64 },
    /// Scale about the live midpoint.
    Scale { sx: f64, sy: f64 },
}

/// A drawable the host surface renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Visual {
    Line { id: VisualId, owner: SegmentId, a: Point, b: Point, stroke: String },
    Tick { id: VisualId, owner: SegmentId, pose: Pose, length: f64, stroke: String },
    Text { id: VisualId, owner: SegmentId, at: Point, text: String },
}

impl Visual {
    #[must_use]
    pub fn id(&self) -> VisualId {
        match self {
            Self::Line { id, .. } | Self::Tick { id, .. } | Self::Text { id, .. } => *id,
        }
    }

    #[must_use]
    pub fn owner(&self) -> SegmentId {
        match self {
            Self::Line { owner, .. } | Self::Tick { owner, .. } | Self::Text { owner, .. } => *owner,
        }
    }
}

/// A measured line with its end caps and label.
#[derive(Debug, Clone)]
pub struct Segment {
    id: SegmentId,
    kind: SegmentKind,
    /// Endpoints in the segment's local frame (before `transform`).
    a: Point,
    b: Point,
    /// Accumulated rigid-body edits since creation.
    transform: Transform,
    locked: bool,
    selectable: bool,
    stroke: String,
    line_visual: VisualId,
    markers: [Marker; 3],
    label_text: String,
}

impl Segment {
    /// Start a zero-length segment at `p0`.
    ///
    /// # Errors
    ///
    /// Propagates label formatting failures.
    pub fn create(
        kind: SegmentKind,
        p0: Point,
        scale: &Scale,
        stroke: impl Into<String>,
    ) -> Result<Self, MeasureError> {
        let label_text = scale.display(0.0)?;
        let angle = perpendicular_angle(p0, p0);
        let marker = |role, pose| Marker { visual: Uuid::new_v4(), role, pose, relationship: None };
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            a: p0,
            b: p0,
            transform: Transform::IDENTITY,
            locked: false,
            selectable: false,
            stroke: stroke.into(),
            line_visual: Uuid::new_v4(),
            markers: [
                marker(MarkerRole::StartCap, Pose::at(p0, angle)),
                marker(MarkerRole::EndCap, Pose::at(p0, angle)),
                marker(MarkerRole::Label, Pose::at(p0, 0.0)),
            ],
            label_text,
        })
    }

    // --- Accessors ---

    #[must_use]
    pub fn id(&self) -> SegmentId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Whether the segment has been finalized.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    pub fn set_selectable(&mut self, selectable: bool) {
        self.selectable = selectable;
    }

    #[must_use]
    pub fn markers(&self) -> &[Marker; 3] {
        &self.markers
    }

    #[must_use]
    pub fn marker(&self, role: MarkerRole) -> &Marker {
        match role {
            MarkerRole::StartCap => &self.markers[0],
            MarkerRole::EndCap => &self.markers[1],
            MarkerRole::Label => &self.markers[2],
        }
    }

    /// Current label text.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label_text
    }

    /// Accumulated rigid-body transform.
    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Live endpoints in surface coordinates.
    #[must_use]
    pub fn endpoints(&self) -> (Point, Point) {
        (self.transform.apply(self.a), self.transform.apply(self.b))
    }

    #[must_use]
    pub fn endpoint(&self, end: End) -> Point {
        match end {
            End::A => self.transform.apply(self.a),
            End::B => self.transform.apply(self.b),
        }
    }

    /// Live pixel length.
    #[must_use]
    pub fn current_length(&self) -> f64 {
        let (a, b) = self.endpoints();
        length(a, b)
    }

    /// Live length formatted with `scale`.
    ///
    /// # Errors
    ///
    /// Propagates formatting failures.
    pub fn display_length(&self, scale: &Scale) -> Result<String, MeasureError> {
        scale.display(self.current_length())
    }

    /// Whether the segment has no measurable length.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.current_length() <= ZERO_LENGTH_PX
    }

    /// The segment's pose matrix: edits applied to a frame at the local midpoint.
    #[must_use]
    pub fn matrix(&self) -> Transform {
        let mid = midpoint(self.a, self.b);
        self.transform.multiply(Transform::translate(mid.x, mid.y))
    }

    // --- Mutation ---

    /// Move endpoint B to `p` while drawing.
    ///
    /// With `lock`, B snaps so that the segment is horizontal or vertical.
    ///
    /// # Errors
    ///
    /// Propagates transform and formatting failures; the segment is unchanged on error.
    pub fn update_endpoint(&mut self, p: Point, lock: bool, scale: &Scale) -> Result<(), MeasureError> {
        self.set_endpoint(End::B, p, lock, scale)
    }

    /// Move either endpoint to the surface point `p`.
    ///
    /// With `lock`, the moved endpoint snaps against the other one. A
    /// finalized segment re-captures its marker relationships.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if a finalized segment would collapse to a
    /// point; propagates transform and formatting failures. The segment is
    /// unchanged on error.
    pub fn set_endpoint(&mut self, end: End, p: Point, lock: bool, scale: &Scale) -> Result<(), MeasureError> {
        let anchor = match end {
            End::A => self.endpoint(End::B),
            End::B => self.endpoint(End::A),
        };
        let target = if lock { axis_lock(anchor, p) } else { p };
        let local = self.transform.invert()?.apply(target);

        let mut next = self.clone();
        match end {
            End::A => next.a = local,
            End::B => next.b = local,
        }
        if next.locked && next.is_degenerate() {
            return Err(MeasureError::DegenerateGeometry);
        }
        next.sync_markers(scale)?;
        if next.locked {
            next.capture_relationships()?;
        }
        *self = next;
        Ok(())
    }

    /// Lock the segment: freeze cap angles and capture marker relationships.
    ///
    /// # Errors
    ///
    /// Propagates transform and formatting failures; the segment is unchanged on error.
    pub fn finalize(&mut self, scale: &Scale) -> Result<(), MeasureError> {
        let mut next = self.clone();
        next.sync_markers(scale)?;
        next.capture_relationships()?;
        next.locked = true;
        *self = next;
        Ok(())
    }

    /// Apply a rigid-body edit, then re-sync markers from the live endpoints.
    ///
    /// # Errors
    ///
    /// Returns `DegenerateGeometry` if the edit would make the transform
    /// singular or collapse a finalized segment to a point; the segment is
    /// unchanged on error.
    pub fn apply_edit(&mut self, edit: SegmentEdit, scale: &Scale) -> Result<(), MeasureError> {
        let (a, b) = self.endpoints();
        let pivot = midpoint(a, b);
        let op = match edit {
            SegmentEdit::Translate { dx, dy } => Transform::translate(dx, dy),
            SegmentEdit::Rotate { degrees } => Transform::about(pivot, Transform::rotate(degrees)),
            SegmentEdit::Scale { sx, sy } => Transform::about(pivot, Transform::scale(sx, sy)),
        };
        let transform = op.multiply(self.transform);
        transform.invert()?;

        let mut next = self.clone();
        next.transform = transform;
        if next.locked && next.is_degenerate() {
            return Err(MeasureError::DegenerateGeometry);
        }
        next.sync_markers(scale)?;
        *self = next;
        Ok(())
    }

    /// Re-render the label after a scale, unit, or precision change.
    ///
    /// # Errors
    ///
    /// Propagates formatting failures; the label is unchanged on error.
    pub fn relabel(&mut self, scale: &Scale) -> Result<(), MeasureError> {
        self.label_text = self.display_length(scale)?;
        Ok(())
    }

    fn sync_markers(&mut self, scale: &Scale) -> Result<(), MeasureError> {
        let (a, b) = self.endpoints();
        let label_text = scale.display(length(a, b))?;
        let angle = perpendicular_angle(a, b);
        let parent = self.matrix();

        for marker in &mut self.markers {
            let carried = marker.relationship.map(|rel| apply_relationship(parent, rel).decompose());
            marker.pose = match marker.role {
                MarkerRole::StartCap => placed(carried, a, angle),
                MarkerRole::EndCap => placed(carried, b, angle),
                MarkerRole::Label => placed(carried, midpoint(a, b), 0.0),
            };
        }
        self.label_text = label_text;
        Ok(())
    }

    fn capture_relationships(&mut self) -> Result<(), MeasureError> {
        let parent = self.matrix();
        let mut relationships = [Transform::IDENTITY; 3];
        for (slot, marker) in relationships.iter_mut().zip(&self.markers) {
            *slot = compose_relationship(parent, marker.pose.matrix())?;
        }
        for (marker, rel) in self.markers.iter_mut().zip(relationships) {
            marker.relationship = Some(rel);
        }
        Ok(())
    }

    // --- Visuals ---

    /// Ids of the line and its three markers.
    #[must_use]
    pub fn visual_ids(&self) -> [VisualId; 4] {
        [self.line_visual, self.markers[0].visual, self.markers[1].visual, self.markers[2].visual]
    }

    /// The four drawables for the current state.
    #[must_use]
    pub fn visuals(&self) -> [Visual; 4] {
        let (a, b) = self.endpoints();
        let tick = |marker: &Marker| Visual::Tick {
            id: marker.visual,
            owner: self.id,
            pose: marker.pose,
            length: CAP_LENGTH_PX,
            stroke: self.stroke.clone(),
        };
        [
            Visual::Line { id: self.line_visual, owner: self.id, a, b, stroke: self.stroke.clone() },
            tick(&self.markers[0]),
            tick(&self.markers[1]),
            Visual::Text {
                id: self.markers[2].visual,
                owner: self.id,
                at: self.markers[2].pose.position,
                text: self.label_text.clone(),
            },
        ]
    }
}

/// Marker pose at a live anchor, keeping any scale and skew carried by its relationship.
fn placed(carried: Option<Pose>, position: Point, angle: f64) -> Pose {
    match carried {
        Some(pose) => Pose { position, angle, ..pose },
        None => Pose::at(position, angle),
    }
}

// =============================================================
// Store
// =============================================================

/// In-memory store of live segments, in creation order.
#[derive(Debug, Default)]
pub struct SegmentStore {
    segments: HashMap<SegmentId, (u64, Segment)>,
    next_seq: u64,
}

impl SegmentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, segment: Segment) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.segments.insert(segment.id(), (seq, segment));
    }

    /// Remove a segment together with all of its markers.
    pub fn remove(&mut self, id: &SegmentId) -> Option<Segment> {
        self.segments.remove(id).map(|(_, segment)| segment)
    }

    #[must_use]
    pub fn get(&self, id: &SegmentId) -> Option<&Segment> {
        self.segments.get(id).map(|(_, segment)| segment)
    }

    pub fn get_mut(&mut self, id: &SegmentId) -> Option<&mut Segment> {
        self.segments.get_mut(id).map(|(_, segment)| segment)
    }

    /// Look up a segment or fail with `SegmentNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `SegmentNotFound` when `id` is not live.
    pub fn require_mut(&mut self, id: &SegmentId) -> Result<&mut Segment, MeasureError> {
        self.get_mut(id).ok_or(MeasureError::SegmentNotFound(*id))
    }

    /// All segments in creation order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&Segment> {
        let mut entries: Vec<&(u64, Segment)> = self.segments.values().collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, segment)| segment).collect()
    }

    /// Ids of all segments in creation order.
    #[must_use]
    pub fn ids(&self) -> Vec<SegmentId> {
        self.sorted().into_iter().map(Segment::id).collect()
    }

    /// Re-render every label with `scale`.
    ///
    /// All labels are formatted before any is written, so a failure leaves
    /// every segment untouched.
    ///
    /// # Errors
    ///
    /// Propagates the first formatting failure.
    pub fn relabel_all(&mut self, scale: &Scale) -> Result<(), MeasureError> {
        let labels = self
            .segments
            .iter()
            .map(|(id, (_, segment))| Ok((*id, segment.display_length(scale)?)))
            .collect::<Result<Vec<_>, MeasureError>>()?;
        for (id, text) in labels {
            if let Some((_, segment)) = self.segments.get_mut(&id) {
                segment.label_text = text;
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
