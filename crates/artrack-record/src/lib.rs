//! Marker lifecycle and time-windowed recording for AR marker trajectories.
//!
//! ## Quickstart
//!
//! ```
//! use artrack_core::{Detection, ManualClock};
//! use artrack_record::{ExportOptions, Tracker, TrackerParams};
//! use nalgebra::Point2;
//!
//! let clock = ManualClock::new(100.0);
//! let mut tracker = Tracker::new(&clock, TrackerParams::default());
//! let corners = vec![Point2::new(0.0, 0.0); 4];
//!
//! tracker.toggle_recording();
//! for _ in 0..4 {
//!     tracker.on_frame(&[Detection::new(7, Point2::new(1.0, 2.0), corners.clone())]);
//!     clock.advance(1.0);
//! }
//! tracker.toggle_recording();
//! tracker.set_trim(0.25, 0.75).unwrap();
//!
//! let snapshot = tracker.snapshot().unwrap();
//! assert_eq!(snapshot.row_count(), 3);
//! let csv = snapshot.to_delimited(&ExportOptions::default());
//! assert_eq!(csv.lines().count(), 4);
//! ```
//!
//! Frame flow:
//! 1. The detector hands over a batch of [`artrack_core::Detection`]s.
//! 2. [`Tracker::on_frame`] stamps them with the clock and updates the
//!    [`MarkerRegistry`]; history grows only while the [`RecordingSession`]
//!    is recording.
//! 3. At most once per eviction interval, markers unseen for longer than
//!    the stale timeout are dropped.
//! 4. After a stop, the [`TrimWindow`] selects a fraction of the session;
//!    [`Tracker::trim_preview`] classifies samples, and an
//!    [`ExportSnapshot`] copies the selected samples for writing.

mod export;
mod params;
mod registry;
mod session;
mod tracker;
mod trim;

pub use export::{
    suggested_file_name, ExportError, ExportOptions, ExportSnapshot, ExportSummary, TrackSnapshot,
};
pub use params::{TrackerParams, EVICTION_INTERVAL, STALE_TIMEOUT};
pub use registry::{MarkerRecord, MarkerRegistry, UpdateReport};
pub use session::{RecordingSession, SessionError, SessionState};
pub use tracker::{SaveDialog, Tracker};
pub use trim::{
    classify_history, PreviewPoint, PreviewTrack, SampleClass, TrimBounds, TrimError, TrimWindow,
};
