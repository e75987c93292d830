//! End-to-end sessions through the public API: scripted replays and direct
//! session driving against the in-memory scene.
#![allow(clippy::float_cmp)]

use scaleline::config::SessionConfig;
use scaleline::engine::Session;
use scaleline::error::MeasureError;
use scaleline::geometry::{Point, perpendicular_angle};
use scaleline::input::{Button, Key, Modifiers, Tool};
use scaleline::replay::{ReplayError, replay};
use scaleline::segment::{MarkerRole, SegmentEdit, SegmentId};
use scaleline::surface::{HostSurface, Scene, apply_actions};
use scaleline::units::{Unit, from_pixels, to_pixels};

// =============================================================
// Helpers
// =============================================================

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn drag(session: &mut Session, scene: &mut Scene, from: Point, to: Point, modifiers: Modifiers) {
    apply_actions(scene, session.on_pointer_down(from, Button::Primary, modifiers));
    apply_actions(scene, session.on_pointer_move(to, modifiers));
    apply_actions(scene, session.on_pointer_up(to, Button::Primary, modifiers));
}

fn click(session: &mut Session, scene: &mut Scene, p: Point) {
    apply_actions(scene, session.on_pointer_down(p, Button::Primary, Modifiers::default()));
    apply_actions(scene, session.on_pointer_up(p, Button::Primary, Modifiers::default()));
}

fn measuring() -> (Session, Scene) {
    let mut session = Session::default();
    let mut scene = Scene::new();
    apply_actions(&mut scene, session.set_tool(Tool::Measure));
    (session, scene)
}

fn calibrate(session: &mut Session, scene: &mut Scene, from: Point, to: Point) {
    apply_actions(scene, session.begin_calibration());
    click(session, scene, from);
    click(session, scene, to);
}

fn assert_caps_perpendicular(session: &Session, id: SegmentId) {
    let segment = session.segment(&id).unwrap();
    let (a, b) = segment.endpoints();
    let expected = perpendicular_angle(a, b);
    for role in [MarkerRole::StartCap, MarkerRole::EndCap] {
        let angle = segment.marker(role).pose.angle;
        assert!(approx_eq(angle, expected), "{role:?} at {angle}, expected {expected}");
    }
    assert!(approx_eq(segment.marker(MarkerRole::StartCap).pose.position.x, a.x));
    assert!(approx_eq(segment.marker(MarkerRole::EndCap).pose.position.y, b.y));
}

// =============================================================
// Drawing
// =============================================================

#[test]
fn axis_locked_drags_finalize_straight() {
    let (mut session, mut scene) = measuring();
    let drags = [
        (pt(10.0, 10.0), pt(200.0, 37.0)),
        (pt(10.0, 10.0), pt(31.0, -180.0)),
        (pt(-50.0, 5.0), pt(-260.0, 90.0)),
        (pt(0.0, 0.0), pt(40.0, 40.5)),
    ];
    for (from, to) in drags {
        drag(&mut session, &mut scene, from, to, Modifiers::default());
    }

    assert_eq!(session.segments().len(), drags.len());
    for segment in session.segments().sorted() {
        let (a, b) = segment.endpoints();
        assert!(a.x == b.x || a.y == b.y, "{a:?} -> {b:?} is not axis aligned");
    }
}

#[test]
fn alt_draws_free_angle_segment() {
    let (mut session, mut scene) = measuring();
    let alt = Modifiers { alt: true, ..Modifiers::default() };
    drag(&mut session, &mut scene, pt(0.0, 0.0), pt(30.0, 40.0), alt);

    let segment = &session.segments().sorted()[0];
    assert_eq!(segment.endpoints().1, pt(30.0, 40.0));
    assert!(approx_eq(segment.current_length(), 50.0));
}

#[test]
fn deleting_removes_exactly_four_visuals() {
    let (mut session, mut scene) = measuring();
    drag(&mut session, &mut scene, pt(0.0, 0.0), pt(100.0, 0.0), Modifiers::default());
    drag(&mut session, &mut scene, pt(0.0, 20.0), pt(0.0, 220.0), Modifiers::default());
    drag(&mut session, &mut scene, pt(50.0, 50.0), pt(90.0, 50.0), Modifiers::default());
    assert_eq!(scene.len(), 12);

    let middle = session.segments().ids()[1];
    apply_actions(&mut scene, session.delete_segment(middle).unwrap());
    assert_eq!(scene.len(), 8);
    assert!(scene.owned_by(middle).is_empty());
    for id in session.segments().ids() {
        assert_eq!(scene.owned_by(id).len(), 4);
    }
}

// =============================================================
// Editing
// =============================================================

#[test]
fn moved_segment_keeps_caps_perpendicular() {
    let (mut session, mut scene) = measuring();
    drag(&mut session, &mut scene, pt(0.0, 0.0), pt(100.0, 0.0), Modifiers::default());
    let id = session.segments().ids()[0];
    apply_actions(&mut scene, session.set_tool(Tool::Pan));

    // Grab the body and move it.
    drag(&mut session, &mut scene, pt(50.0, 0.0), pt(80.0, 40.0), Modifiers::default());
    assert_eq!(scene.active_selection(), Some(id));
    let (a, b) = session.segment(&id).unwrap().endpoints();
    assert!(approx_eq(a.x, 30.0) && approx_eq(a.y, 40.0));
    assert!(approx_eq(b.x, 130.0) && approx_eq(b.y, 40.0));
    assert_caps_perpendicular(&session, id);

    // Pull the end handle off-axis.
    let alt = Modifiers { alt: true, ..Modifiers::default() };
    drag(&mut session, &mut scene, pt(130.0, 40.0), pt(130.0, 140.0), alt);
    assert_caps_perpendicular(&session, id);
    assert!(approx_eq(session.segment(&id).unwrap().current_length(), 100.0_f64.hypot(100.0)));

    apply_actions(&mut scene, session.transform_segment(id, SegmentEdit::Rotate { degrees: 33.0 }).unwrap());
    assert_caps_perpendicular(&session, id);
}

#[test]
fn escape_clears_selection_and_delete_needs_one() {
    let (mut session, mut scene) = measuring();
    drag(&mut session, &mut scene, pt(0.0, 0.0), pt(100.0, 0.0), Modifiers::default());
    let id = session.segments().ids()[0];
    apply_actions(&mut scene, session.select_segment(id).unwrap());
    apply_actions(&mut scene, session.on_key_down(Key("Escape".into()), Modifiers::default()));
    assert_eq!(scene.active_selection(), None);

    apply_actions(&mut scene, session.on_key_down(Key("Delete".into()), Modifiers::default()));
    assert_eq!(scene.len(), 4);
}

// =============================================================
// Calibration
// =============================================================

#[test]
fn ten_foot_reference_makes_half_length_read_five_feet() {
    let (mut session, mut scene) = measuring();
    calibrate(&mut session, &mut scene, pt(0.0, 0.0), pt(300.0, 0.0));
    apply_actions(&mut scene, session.confirm_calibration("10'-0\"", Unit::FootInch, None).unwrap());

    let scale = session.scale();
    assert!(approx_eq(scale.factor, 38.4));
    assert_eq!(scale.display(300.0).unwrap(), "10'-0\"");

    drag(&mut session, &mut scene, pt(0.0, 50.0), pt(150.0, 50.0), Modifiers::default());
    assert_eq!(session.segments().sorted()[0].label(), "5'-0\"");
    assert_eq!(scene.readout(), Some("5'-0\""));
}

#[test]
fn calibration_round_trip_reports_reference_value() {
    let cases = [(Unit::Millimeter, 2500.0), (Unit::Centimeter, 42.5), (Unit::Meter, 3.75), (Unit::Foot, 12.5)];
    for (unit, real) in cases {
        let (mut session, mut scene) = measuring();
        calibrate(&mut session, &mut scene, pt(0.0, 0.0), pt(0.0, 240.0));
        apply_actions(&mut scene, session.confirm_calibration(&real.to_string(), unit, None).unwrap());

        assert!(approx_eq(session.scale().factor, to_pixels(real, unit) / 240.0));
        assert_eq!(session.scale().display(240.0).unwrap(), format!("{real:.2}"));
        assert!(approx_eq(from_pixels(240.0 * session.scale().factor, unit), real));
    }
}

#[test]
fn malformed_input_leaves_scale_untouched() {
    let (mut session, mut scene) = measuring();
    calibrate(&mut session, &mut scene, pt(0.0, 0.0), pt(300.0, 0.0));
    let before = session.calibration();

    let err = session.confirm_calibration("10-6", Unit::FootInch, None).unwrap_err();
    assert!(matches!(err, MeasureError::InvalidFormat { .. }));
    assert!(err.is_user_correctable());
    assert_eq!(session.calibration(), before);
    assert!(scene.pending_calibration().is_some());
}

// =============================================================
// Scripts
// =============================================================

const CALIBRATED_SCRIPT: &str = r#"
{"event":"tool","tool":"measure"}
{"event":"calibrate"}
{"event":"down","x":0,"y":0}
{"event":"up","x":0,"y":0}
{"event":"down","x":300,"y":2}
{"event":"up","x":300,"y":2}
{"event":"confirm","value":"ten feet six","unit":"ftin"}
{"event":"confirm","value":"10'-0\"","unit":"ftin","precision":"1/8"}
{"event":"down","x":0,"y":50}
{"event":"move","x":80,"y":52}
{"event":"up","x":80,"y":52}
{"event":"unit","unit":"mm"}
"#;

#[test]
fn scripted_session_reports_scale_and_labels() {
    let report = replay(CALIBRATED_SCRIPT.as_bytes(), SessionConfig::default()).unwrap();

    assert!(approx_eq(report.scale.factor, 38.4));
    assert_eq!(report.scale.unit, Unit::Millimeter);
    assert_eq!(report.rejected.len(), 1);
    assert_eq!(report.rejected[0].line, 8);
    assert_eq!(report.segments.len(), 1);
    // 80 px of a 300 px ten-foot reference: 2 ft 8 in.
    assert_eq!(report.segments[0].label, "812.80");
    assert_eq!(report.visuals, 4);
}

#[test]
fn script_errors_carry_line_numbers() {
    let script = "{\"event\":\"cancel\"}\n{\"event\":\"delete\",";
    let err = replay(script.as_bytes(), SessionConfig::default()).unwrap_err();
    assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
}

#[test]
fn axis_lock_can_be_disabled_by_config() {
    let config = SessionConfig::from_vars([("SCALELINE_AXIS_LOCK", "false")]).unwrap();
    let script = r#"
{"event":"tool","tool":"measure"}
{"event":"down","x":0,"y":0}
{"event":"up","x":30,"y":40}
"#;
    let report = replay(script.as_bytes(), config).unwrap();
    assert_eq!(report.segments[0].b, pt(30.0, 40.0));
    assert!(approx_eq(report.segments[0].pixels, 50.0));
}
