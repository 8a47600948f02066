//! High-level facade for AR marker trajectory recording.
//!
//! This crate re-exports the building blocks and adds the pieces an
//! application needs around them:
//! - [`Station`]: one workstation (tracker, calibration grid, detector
//!   threshold) driven by frames and [`OperatorEvent`]s,
//! - [`StationConfig`]: JSON configuration,
//! - [`replay`](mod@replay): playback of recorded detector output.
//!
//! ## Quickstart
//!
//! ```
//! use artrack::core::{Detection, ManualClock};
//! use artrack::{FixedPathDialog, OperatorEvent, Station, StationConfig};
//! use nalgebra::Point2;
//!
//! let clock = ManualClock::new(0.0);
//! let mut station = Station::new(&clock, StationConfig::default(), FixedPathDialog::cancelling());
//! let corners = vec![Point2::new(0.0, 0.0); 4];
//!
//! station.handle(OperatorEvent::RecordToggled).unwrap();
//! for _ in 0..5 {
//!     station.on_frame(&[Detection::new(1, Point2::new(5.0, 5.0), corners.clone())]);
//!     clock.advance(0.5);
//! }
//! station.handle(OperatorEvent::RecordToggled).unwrap();
//! station.handle(OperatorEvent::TrimChanged { begin: 0.0, end: 0.5 }).unwrap();
//!
//! let snapshot = station.tracker().snapshot().unwrap();
//! assert_eq!(snapshot.row_count(), 3);
//! ```

pub use artrack_core as core;
pub use artrack_grid as grid;
pub use artrack_record as record;

mod config;
pub mod replay;
mod station;

pub use config::{ConfigError, StationConfig, DEFAULT_THRESHOLD};
pub use station::{EventOutcome, FixedPathDialog, OperatorEvent, Station, StationError};
