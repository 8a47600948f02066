//! Operator-facing adapter: turns named UI events into core calls.

use std::path::{Path, PathBuf};

use artrack_core::{Clock, Detection};
use artrack_grid::{GridCalibration, GridIoError, GRID_CORNERS};
use artrack_record::{
    ExportError, ExportOptions, ExportSummary, PreviewTrack, SaveDialog, SessionError,
    SessionState, Tracker, TrimWindow, UpdateReport,
};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::config::StationConfig;

/// Discrete commands fired by the user interface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OperatorEvent {
    ThresholdChanged { value: u8 },
    RecordToggled,
    TrimChanged { begin: f64, end: f64 },
    SaveRequested,
    GridToggled { visible: bool },
    GridEditToggled { editing: bool },
    GridRowsChanged { rows: u32 },
    GridColsChanged { cols: u32 },
    PointerDown { x: i32, y: i32 },
    PointerDragged { x: i32, y: i32 },
    PointerReleased,
}

/// What an event changed.
#[derive(Clone, Debug, PartialEq)]
pub enum EventOutcome {
    Threshold(u8),
    Session(SessionState),
    Trim(TrimWindow),
    Saved(ExportSummary),
    SaveCancelled,
    Grid,
    /// Pointer event that did not touch the grid (editing off, no drag).
    Unhandled,
}

#[derive(thiserror::Error, Debug)]
pub enum StationError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Save dialog that always answers with the same destination.
///
/// Stands in for an interactive dialog in batch runs; `None` behaves like an
/// operator who always cancels.
#[derive(Clone, Debug, Default)]
pub struct FixedPathDialog {
    path: Option<PathBuf>,
}

impl FixedPathDialog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn cancelling() -> Self {
        Self { path: None }
    }
}

impl SaveDialog for FixedPathDialog {
    fn choose(&mut self, _suggested_name: &str) -> Option<PathBuf> {
        self.path.clone()
    }
}

/// One recording workstation: tracker, calibration grid and detector
/// settings, driven by frames and operator events.
pub struct Station<C: Clock, D: SaveDialog> {
    tracker: Tracker<C>,
    grid: GridCalibration,
    dialog: D,
    threshold: u8,
    export: ExportOptions,
    grid_points_path: PathBuf,
}

impl<C: Clock, D: SaveDialog> Station<C, D> {
    /// Build a station without touching the filesystem.
    pub fn new(clock: C, config: StationConfig, dialog: D) -> Self {
        let grid = GridCalibration::new([Point2::origin(); GRID_CORNERS], config.grid);
        Self::with_grid(clock, grid, config, dialog)
    }

    /// Build a station and restore the grid corners from
    /// `config.grid_points_path` if the file exists.
    pub fn open(clock: C, config: StationConfig, dialog: D) -> Result<Self, GridIoError> {
        let grid = GridCalibration::load_or_default(&config.grid_points_path, config.grid)?;
        Ok(Self::with_grid(clock, grid, config, dialog))
    }

    fn with_grid(clock: C, grid: GridCalibration, config: StationConfig, dialog: D) -> Self {
        Self {
            tracker: Tracker::new(clock, config.tracker),
            grid,
            dialog,
            threshold: config.threshold,
            export: config.export,
            grid_points_path: config.grid_points_path,
        }
    }

    pub fn tracker(&self) -> &Tracker<C> {
        &self.tracker
    }

    pub fn grid(&self) -> &GridCalibration {
        &self.grid
    }

    /// Threshold the detector should binarise with.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn export_options(&self) -> &ExportOptions {
        &self.export
    }

    pub fn grid_points_path(&self) -> &Path {
        &self.grid_points_path
    }

    pub fn is_recording(&self) -> bool {
        self.tracker.is_recording()
    }

    pub fn session_duration(&self) -> Option<f64> {
        self.tracker.session_duration()
    }

    pub fn trim_preview(&self) -> Vec<PreviewTrack> {
        self.tracker.trim_preview()
    }

    /// Feed the detections of a new video frame.
    pub fn on_frame(&mut self, detections: &[Detection]) -> UpdateReport {
        self.tracker.on_frame(detections)
    }

    /// Apply one operator event.
    ///
    /// Errors are operator-facing reports (nothing to save, trim while
    /// recording); the station stays usable after any of them.
    pub fn handle(&mut self, event: OperatorEvent) -> Result<EventOutcome, StationError> {
        log::debug!("operator event {event:?}");
        let outcome = match event {
            OperatorEvent::ThresholdChanged { value } => {
                self.threshold = value;
                EventOutcome::Threshold(value)
            }
            OperatorEvent::RecordToggled => EventOutcome::Session(self.tracker.toggle_recording()),
            OperatorEvent::TrimChanged { begin, end } => {
                EventOutcome::Trim(self.tracker.set_trim(begin, end)?)
            }
            OperatorEvent::SaveRequested => {
                match self.tracker.save_with(&mut self.dialog, &self.export)? {
                    Some(summary) => EventOutcome::Saved(summary),
                    None => EventOutcome::SaveCancelled,
                }
            }
            OperatorEvent::GridToggled { visible } => {
                self.grid.set_visible(visible);
                EventOutcome::Grid
            }
            OperatorEvent::GridEditToggled { editing } => {
                self.grid.set_editing(editing);
                EventOutcome::Grid
            }
            OperatorEvent::GridRowsChanged { rows } => {
                self.grid.set_rows(rows);
                EventOutcome::Grid
            }
            OperatorEvent::GridColsChanged { cols } => {
                self.grid.set_cols(cols);
                EventOutcome::Grid
            }
            OperatorEvent::PointerDown { x, y } => {
                grid_outcome(self.grid.pointer_down(Point2::new(x, y)))
            }
            OperatorEvent::PointerDragged { x, y } => {
                grid_outcome(self.grid.pointer_drag(Point2::new(x, y)))
            }
            OperatorEvent::PointerReleased => {
                self.grid.pointer_up();
                EventOutcome::Grid
            }
        };
        Ok(outcome)
    }

    /// Persist the grid corners. Called once when the station shuts down.
    pub fn shutdown(&self) -> Result<(), GridIoError> {
        self.grid.save(&self.grid_points_path)?;
        log::info!("grid corners saved to {}", self.grid_points_path.display());
        Ok(())
    }
}

fn grid_outcome(changed: bool) -> EventOutcome {
    if changed {
        EventOutcome::Grid
    } else {
        EventOutcome::Unhandled
    }
}
