//! Core types and utilities for AR marker trajectory recording.
//!
//! This crate is intentionally small. It does *not* depend on any concrete
//! marker detector, video source or renderer: detections arrive as plain
//! [`Detection`] values and time comes from an injected [`Clock`].

mod clock;
mod logger;
mod marker;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use marker::{Detection, MalformedDetection, MarkerId, MarkerSample, CORNER_COUNT};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
