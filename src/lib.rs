//! Calibrated measurement overlay engine.
//!
//! Users draw line segments over a raster image; each segment carries two
//! perpendicular end caps and a text label showing its real-world length.
//! A two-point calibration turns a reference segment of known length into a
//! scale factor, after which every label re-renders in the chosen unit. The
//! host (browser canvas, native viewer, or the replay driver) feeds pointer,
//! keyboard and wheel input to a [`engine::Session`] and applies the
//! resulting [`engine::Action`]s through a [`surface::HostSurface`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Session state machine and its [`engine::Action`] output |
//! | [`segment`] | Measurement segments, their markers and the segment store |
//! | [`calibration`] | Two-point calibration workflow and the active scale |
//! | [`units`] | Unit conversion, feet-inch parsing and length formatting |
//! | [`geometry`] | Points, affine transforms and segment geometry helpers |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types, tools and the gesture modes |
//! | [`hit`] | Hit-testing against segment endpoints and bodies |
//! | [`surface`] | Host surface trait and the in-memory [`surface::Scene`] |
//! | [`replay`] | JSON-lines scripted sessions |
//! | [`config`] | Environment-driven session defaults |
//! | [`error`] | [`error::MeasureError`] |
//! | [`consts`] | Shared numeric constants (unit baselines, zoom limits, hit radii) |

pub mod calibration;
pub mod camera;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod hit;
pub mod input;
pub mod replay;
pub mod segment;
pub mod surface;
pub mod units;
