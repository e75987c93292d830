#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Camera;
use crate::consts::HANDLE_RADIUS_PX;
use crate::geometry::{Point, distance_to_segment, length};
use crate::segment::{End, Segment, SegmentId, SegmentStore};

/// Which part of a segment was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitPart {
    /// One of the two endpoint handles.
    Endpoint(End),
    /// Anywhere along the line.
    Body,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub segment_id: SegmentId,
    pub part: HitPart,
}

/// Test which segment (if any) is under `world_pt`.
///
/// Selectable segments are considered, plus the selected segment even when
/// the current tool made it inert. The selected segment's endpoint handles
/// win over everything else; otherwise the most recently created segment
/// under the pointer wins. Tolerance is [`HANDLE_RADIUS_PX`] in screen space.
#[must_use]
pub fn hit_test(
    world_pt: Point,
    store: &SegmentStore,
    camera: &Camera,
    selected: Option<SegmentId>,
) -> Option<Hit> {
    let slop = camera.screen_dist_to_world(HANDLE_RADIUS_PX);

    if let Some(seg) = selected.and_then(|id| store.get(&id)) {
        if let Some(end) = endpoint_under(seg, world_pt, slop) {
            return Some(Hit { segment_id: seg.id(), part: HitPart::Endpoint(end) });
        }
    }

    let candidate = |seg: &&Segment| seg.is_selectable() || Some(seg.id()) == selected;
    store.sorted().into_iter().rev().filter(candidate).find_map(|seg| {
        if let Some(end) = endpoint_under(seg, world_pt, slop) {
            return Some(Hit { segment_id: seg.id(), part: HitPart::Endpoint(end) });
        }
        let (a, b) = seg.endpoints();
        (distance_to_segment(world_pt, a, b) <= slop).then_some(Hit { segment_id: seg.id(), part: HitPart::Body })
    })
}

fn endpoint_under(seg: &Segment, p: Point, slop: f64) -> Option<End> {
    [End::B, End::A].into_iter().find(|end| length(seg.endpoint(*end), p) <= slop)
}
