use super::*;
use crate::segment::{Segment, SegmentKind};
use crate::units::Scale;

// =============================================================
// Helpers
// =============================================================

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn add_segment(store: &mut SegmentStore, a: Point, b: Point, selectable: bool) -> SegmentId {
    let scale = Scale::default();
    let mut seg = Segment::create(SegmentKind::Measure, a, &scale, "#ff0000").unwrap();
    seg.update_endpoint(b, false, &scale).unwrap();
    seg.finalize(&scale).unwrap();
    seg.set_selectable(selectable);
    let id = seg.id();
    store.insert(seg);
    id
}

// =============================================================
// HitPart
// =============================================================

#[test]
fn hit_part_variants_distinct() {
    assert_ne!(HitPart::Endpoint(End::A), HitPart::Endpoint(End::B));
    assert_ne!(HitPart::Endpoint(End::A), HitPart::Body);
}

// =============================================================
// hit_test
// =============================================================

#[test]
fn empty_store_hits_nothing() {
    let store = SegmentStore::new();
    assert!(hit_test(pt(0.0, 0.0), &store, &Camera::default(), None).is_none());
}

#[test]
fn body_hit_within_slop() {
    let mut store = SegmentStore::new();
    let id = add_segment(&mut store, pt(0.0, 0.0), pt(100.0, 0.0), true);
    let hit = hit_test(pt(50.0, 5.0), &store, &Camera::default(), None).unwrap();
    assert_eq!(hit, Hit { segment_id: id, part: HitPart::Body });
}

#[test]
fn body_miss_outside_slop() {
    let mut store = SegmentStore::new();
    add_segment(&mut store, pt(0.0, 0.0), pt(100.0, 0.0), true);
    assert!(hit_test(pt(50.0, 9.0), &store, &Camera::default(), None).is_none());
}

#[test]
fn endpoint_beats_body() {
    let mut store = SegmentStore::new();
    let id = add_segment(&mut store, pt(0.0, 0.0), pt(100.0, 0.0), true);
    let hit = hit_test(pt(98.0, 1.0), &store, &Camera::default(), None).unwrap();
    assert_eq!(hit, Hit { segment_id: id, part: HitPart::Endpoint(End::B) });
}

#[test]
fn non_selectable_segments_are_ignored() {
    let mut store = SegmentStore::new();
    add_segment(&mut store, pt(0.0, 0.0), pt(100.0, 0.0), false);
    assert!(hit_test(pt(50.0, 0.0), &store, &Camera::default(), None).is_none());
}

#[test]
fn newest_segment_wins_overlap() {
    let mut store = SegmentStore::new();
    add_segment(&mut store, pt(0.0, 0.0), pt(100.0, 0.0), true);
    let top = add_segment(&mut store, pt(0.0, 2.0), pt(100.0, 2.0), true);
    let hit = hit_test(pt(50.0, 1.0), &store, &Camera::default(), None).unwrap();
    assert_eq!(hit.segment_id, top);
}

#[test]
fn selected_endpoint_wins_over_newer_body() {
    let mut store = SegmentStore::new();
    let under = add_segment(&mut store, pt(0.0, 0.0), pt(100.0, 0.0), true);
    add_segment(&mut store, pt(100.0, -50.0), pt(100.0, 50.0), true);
    let hit = hit_test(pt(100.0, 0.0), &store, &Camera::default(), Some(under)).unwrap();
    assert_eq!(hit, Hit { segment_id: under, part: HitPart::Endpoint(End::B) });
}

#[test]
fn slop_shrinks_when_zoomed_in() {
    let mut store = SegmentStore::new();
    add_segment(&mut store, pt(0.0, 0.0), pt(100.0, 0.0), true);
    let cam = Camera { pan_x: 0.0, pan_y: 0.0, zoom: 4.0 };
    assert!(hit_test(pt(50.0, 5.0), &store, &cam, None).is_none());
    assert!(hit_test(pt(50.0, 1.5), &store, &cam, None).is_some());
}

#[test]
fn selected_segment_is_hit_even_when_inert() {
    let mut store = SegmentStore::new();
    let id = add_segment(&mut store, pt(0.0, 0.0), pt(100.0, 0.0), false);
    let body = hit_test(pt(50.0, 0.0), &store, &Camera::default(), Some(id)).unwrap();
    assert_eq!(body, Hit { segment_id: id, part: HitPart::Body });
    let handle = hit_test(pt(1.0, 1.0), &store, &Camera::default(), Some(id)).unwrap();
    assert_eq!(handle, Hit { segment_id: id, part: HitPart::Endpoint(End::A) });
    assert!(hit_test(pt(50.0, 0.0), &store, &Camera::default(), None).is_none());
}
