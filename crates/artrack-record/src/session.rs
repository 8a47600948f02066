//! Recording session state machine: Idle -> Recording -> Stopped -> Recording ...

use serde::{Deserialize, Serialize};

use crate::registry::MarkerRegistry;
use crate::trim::{classify_history, PreviewTrack, TrimBounds, TrimWindow};

/// Public view of the session state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Recording,
    Stopped,
}

/// Errors returned by session operations that depend on the current state.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("trim window can only be changed after recording stopped (state: {state:?})")]
    TrimUnavailable { state: SessionState },
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Phase {
    Idle,
    Recording { start: f64 },
    Stopped { start: f64, stop: f64, trim: TrimWindow },
}

/// The single recording session of a tracker.
///
/// The session owns the meaning of every record's history: starting a new
/// recording wipes all of it, and history is only appended while
/// [`SessionState::Recording`].
#[derive(Clone, Debug)]
pub struct RecordingSession {
    phase: Phase,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSession {
    pub fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    pub fn state(&self) -> SessionState {
        match self.phase {
            Phase::Idle => SessionState::Idle,
            Phase::Recording { .. } => SessionState::Recording,
            Phase::Stopped { .. } => SessionState::Stopped,
        }
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        matches!(self.phase, Phase::Recording { .. })
    }

    /// Operator toggle: Recording stops, anything else (re)starts.
    pub fn toggle(&mut self, now: f64, registry: &mut MarkerRegistry) -> SessionState {
        if self.is_recording() {
            self.stop(now);
        } else {
            self.start(now, registry);
        }
        self.state()
    }

    /// Arm a new recording at `now`.
    ///
    /// Clears the history of every record and resets the trim window. Calling
    /// this while already recording restarts the session.
    pub fn start(&mut self, now: f64, registry: &mut MarkerRegistry) {
        registry.clear_history();
        self.phase = Phase::Recording { start: now };
        log::info!(
            "recording started at t={now:.3} with {} known marker(s)",
            registry.len()
        );
    }

    /// End the current recording at `now`. Returns `false` if not recording.
    pub fn stop(&mut self, now: f64) -> bool {
        let Phase::Recording { start } = self.phase else {
            return false;
        };
        let stop = now.max(start);
        self.phase = Phase::Stopped {
            start,
            stop,
            trim: TrimWindow::FULL,
        };
        log::info!(
            "recording stopped at t={stop:.3} after {:.3}s",
            stop - start
        );
        true
    }

    /// Set the trim window of a stopped session.
    ///
    /// Out-of-range or inverted input is corrected with
    /// [`TrimWindow::clamped`], never rejected. Only the state is checked.
    pub fn set_trim(&mut self, begin: f64, end: f64) -> Result<TrimWindow, SessionError> {
        let state = self.state();
        let Phase::Stopped { trim, .. } = &mut self.phase else {
            return Err(SessionError::TrimUnavailable { state });
        };
        let window = TrimWindow::try_new(begin, end).unwrap_or_else(|err| {
            let fixed = TrimWindow::clamped(begin, end);
            log::warn!(
                "{err}; using [{:.3}, {:.3}]",
                fixed.begin(),
                fixed.end()
            );
            fixed
        });
        *trim = window;
        Ok(window)
    }

    /// Time the current or last recording began.
    pub fn start_time(&self) -> Option<f64> {
        match self.phase {
            Phase::Idle => None,
            Phase::Recording { start } | Phase::Stopped { start, .. } => Some(start),
        }
    }

    pub fn stop_time(&self) -> Option<f64> {
        match self.phase {
            Phase::Stopped { stop, .. } => Some(stop),
            _ => None,
        }
    }

    /// Length of a stopped session.
    pub fn duration(&self) -> Option<f64> {
        match self.phase {
            Phase::Stopped { start, stop, .. } => Some(stop - start),
            _ => None,
        }
    }

    /// Running time while recording, final duration once stopped, 0 when idle.
    pub fn elapsed(&self, now: f64) -> f64 {
        match self.phase {
            Phase::Idle => 0.0,
            Phase::Recording { start } => (now - start).max(0.0),
            Phase::Stopped { start, stop, .. } => stop - start,
        }
    }

    pub fn trim(&self) -> Option<TrimWindow> {
        match self.phase {
            Phase::Stopped { trim, .. } => Some(trim),
            _ => None,
        }
    }

    /// Absolute bounds of the trim window; only defined once stopped.
    pub fn trim_bounds(&self) -> Option<TrimBounds> {
        match self.phase {
            Phase::Stopped { start, stop, trim } => Some(trim.bounds(start, stop)),
            _ => None,
        }
    }

    /// Bounds an export taken at `now` would use.
    ///
    /// While recording this is the whole session as if it stopped at `now`;
    /// the session itself is not touched.
    pub fn export_bounds(&self, now: f64) -> Option<TrimBounds> {
        match self.phase {
            Phase::Recording { start } => Some(TrimWindow::FULL.bounds(start, now.max(start))),
            _ => self.trim_bounds(),
        }
    }

    /// Inside/outside classification of every recorded sample.
    ///
    /// Empty unless the session is stopped.
    pub fn trim_preview(&self, registry: &MarkerRegistry) -> Vec<PreviewTrack> {
        self.trim_bounds()
            .map(|bounds| classify_history(registry, bounds))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artrack_core::{Detection, MarkerId};
    use nalgebra::Point2;

    fn det(id: i32) -> Detection {
        Detection::new(
            id,
            Point2::new(0.0, 0.0),
            vec![Point2::new(0.0, 0.0); artrack_core::CORNER_COUNT],
        )
    }

    #[test]
    fn toggle_walks_the_state_machine() {
        let mut reg = MarkerRegistry::new();
        let mut s = RecordingSession::new();
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.toggle(1.0, &mut reg), SessionState::Recording);
        assert_eq!(s.toggle(3.0, &mut reg), SessionState::Stopped);
        assert_eq!(s.duration(), Some(2.0));
        assert_eq!(s.toggle(5.0, &mut reg), SessionState::Recording);
        assert_eq!(s.start_time(), Some(5.0));
        assert_eq!(s.stop_time(), None);
    }

    #[test]
    fn restart_wipes_history_and_trim() {
        let mut reg = MarkerRegistry::new();
        let mut s = RecordingSession::new();
        s.start(0.0, &mut reg);
        reg.update(&[det(1)], 0.5, s.is_recording());
        s.stop(1.0);
        s.set_trim(0.2, 0.4).unwrap();
        assert_eq!(reg.get(MarkerId(1)).unwrap().history().len(), 1);

        s.start(2.0, &mut reg);
        assert!(reg.get(MarkerId(1)).unwrap().history().is_empty());
        s.stop(3.0);
        assert_eq!(s.trim(), Some(TrimWindow::FULL));
    }

    #[test]
    fn trim_only_while_stopped() {
        let mut reg = MarkerRegistry::new();
        let mut s = RecordingSession::new();
        assert_eq!(
            s.set_trim(0.1, 0.9),
            Err(SessionError::TrimUnavailable {
                state: SessionState::Idle
            })
        );
        s.start(0.0, &mut reg);
        assert!(s.set_trim(0.1, 0.9).is_err());
        s.stop(10.0);
        let w = s.set_trim(0.9, 0.1).unwrap();
        assert_eq!((w.begin(), w.end()), (0.1, 0.1));
        assert_eq!(
            s.trim_bounds(),
            Some(TrimBounds {
                begin: 1.0,
                end: 1.0
            })
        );
    }

    #[test]
    fn export_bounds_while_recording_leave_session_running() {
        let mut reg = MarkerRegistry::new();
        let mut s = RecordingSession::new();
        assert_eq!(s.export_bounds(1.0), None);
        s.start(2.0, &mut reg);
        assert_eq!(
            s.export_bounds(5.0),
            Some(TrimBounds {
                begin: 2.0,
                end: 5.0
            })
        );
        assert!(s.is_recording());
        s.stop(6.0);
        s.set_trim(0.5, 1.0).unwrap();
        assert_eq!(s.export_bounds(100.0), s.trim_bounds());
    }

    #[test]
    fn stop_outside_recording_is_ignored() {
        let mut s = RecordingSession::new();
        assert!(!s.stop(1.0));
        assert_eq!(s.state(), SessionState::Idle);
        assert_eq!(s.elapsed(4.0), 0.0);
    }

    #[test]
    fn elapsed_tracks_running_session() {
        let mut reg = MarkerRegistry::new();
        let mut s = RecordingSession::new();
        s.start(10.0, &mut reg);
        assert_eq!(s.elapsed(12.5), 2.5);
        s.stop(14.0);
        assert_eq!(s.elapsed(100.0), 4.0);
    }
}
