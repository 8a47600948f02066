//! Offline playback of recorded detector output.
//!
//! A log is JSON lines, one frame per line:
//!
//! ```text
//! {"time": 12.5, "detections": [{"id": 3, "center": [10.0, 4.0], "corners": [[0,0],[1,0],[1,1],[0,1]]}]}
//! {"time": 12.6, "events": [{"event": "record_toggled"}]}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped. Within a frame the
//! operator events are applied before the detections.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use artrack_core::{Detection, ManualClock};
use artrack_record::{ExportSummary, SaveDialog, SessionState};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::station::{EventOutcome, OperatorEvent, Station};

/// One video frame worth of detector output and operator input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonic frame time in seconds.
    pub time: f64,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub events: Vec<OperatorEvent>,
}

#[derive(thiserror::Error, Debug)]
pub enum ReplayError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: frame time {time} is not finite or precedes {previous}")]
    BadTime { line: usize, time: f64, previous: f64 },
}

/// Parse a frame log. Frame times must be finite and non-decreasing.
pub fn read_frames(reader: impl BufRead) -> Result<Vec<Frame>, ReplayError> {
    let mut frames: Vec<Frame> = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let frame: Frame = serde_json::from_str(trimmed).map_err(|source| ReplayError::Parse {
            line: idx + 1,
            source,
        })?;
        let previous = frames.last().map_or(f64::NEG_INFINITY, |f| f.time);
        if !frame.time.is_finite() || frame.time < previous {
            return Err(ReplayError::BadTime {
                line: idx + 1,
                time: frame.time,
                previous,
            });
        }
        frames.push(frame);
    }
    Ok(frames)
}

pub fn load_frames(path: impl AsRef<Path>) -> Result<Vec<Frame>, ReplayError> {
    let file = File::open(path)?;
    read_frames(BufReader::new(file))
}

/// Counters gathered while replaying a log.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub frames: usize,
    pub detections: usize,
    pub malformed: usize,
    /// Events the station refused (nothing to save, trim while recording...).
    pub rejected_events: usize,
    pub exports: Vec<ExportSummary>,
}

/// Feed `frames` through `station`, moving its manual clock to each frame
/// time first.
///
/// Refused operator events are logged and counted; they do not stop the
/// replay.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(frames = frames.len())))]
pub fn replay<D: SaveDialog>(
    station: &mut Station<&ManualClock, D>,
    frames: &[Frame],
) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for frame in frames {
        station.tracker().clock().set(frame.time);
        for event in &frame.events {
            match station.handle(event.clone()) {
                Ok(EventOutcome::Saved(export)) => summary.exports.push(export),
                Ok(_) => {}
                Err(err) => {
                    log::warn!("t={:.3}: {err}", frame.time);
                    summary.rejected_events += 1;
                }
            }
        }
        let report = station.on_frame(&frame.detections);
        summary.frames += 1;
        summary.detections += report.applied;
        summary.malformed += report.malformed.len();
    }
    log::info!(
        "replayed {} frames, {} detections, session {:?}",
        summary.frames,
        summary.detections,
        station.tracker().session_state()
    );
    summary
}

/// Stop a recording that the log left running, at the current clock time.
pub fn finish_session<D: SaveDialog>(station: &mut Station<&ManualClock, D>) -> SessionState {
    if station.is_recording() {
        if let Ok(EventOutcome::Session(state)) = station.handle(OperatorEvent::RecordToggled) {
            return state;
        }
    }
    station.tracker().session_state()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_defaults_missing_lists() {
        let log = "# header\n\n{\"time\": 1.0}\n{\"time\": 1.5, \"events\": [{\"event\": \"record_toggled\"}]}\n";
        let frames = read_frames(log.as_bytes()).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].detections.is_empty());
        assert_eq!(frames[1].events, vec![OperatorEvent::RecordToggled]);
    }

    #[test]
    fn reports_line_of_bad_json() {
        let log = "{\"time\": 1.0}\n{\"time\": oops}\n";
        assert!(matches!(
            read_frames(log.as_bytes()),
            Err(ReplayError::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn rejects_time_going_backwards() {
        let log = "{\"time\": 2.0}\n{\"time\": 1.0}\n";
        assert!(matches!(
            read_frames(log.as_bytes()),
            Err(ReplayError::BadTime { line: 2, .. })
        ));
    }

    #[test]
    fn detections_parse_from_point_arrays() {
        let log = r#"{"time": 0.0, "detections": [{"id": 4, "center": [1.0, 2.0], "corners": [[0,0],[1,0],[1,1],[0,1]]}]}"#;
        let frames = read_frames(log.as_bytes()).unwrap();
        let det = &frames[0].detections[0];
        assert_eq!(det.id.0, 4);
        assert_eq!(det.corners.len(), 4);
        assert_eq!(det.center.y, 2.0);
    }
}
