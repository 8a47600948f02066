//! Per-frame driver around the registry and the recording session.

use std::path::{Path, PathBuf};

use artrack_core::{Clock, Detection, MarkerId};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::export::{suggested_file_name, ExportError, ExportOptions, ExportSnapshot, ExportSummary};
use crate::params::TrackerParams;
use crate::registry::{MarkerRegistry, UpdateReport};
use crate::session::{RecordingSession, SessionError, SessionState};
use crate::trim::{PreviewTrack, TrimWindow};

/// Destination chooser shown to the operator on save.
///
/// Returning `None` means the operator cancelled: nothing is written and no
/// state changes.
pub trait SaveDialog {
    fn choose(&mut self, suggested_name: &str) -> Option<PathBuf>;
}

impl<F> SaveDialog for F
where
    F: FnMut(&str) -> Option<PathBuf>,
{
    fn choose(&mut self, suggested_name: &str) -> Option<PathBuf> {
        self(suggested_name)
    }
}

/// Marker registry, recording session and throttled eviction behind one
/// frame-tick entry point.
pub struct Tracker<C: Clock> {
    clock: C,
    params: TrackerParams,
    registry: MarkerRegistry,
    session: RecordingSession,
    last_eviction: Option<f64>,
}

impl<C: Clock> Tracker<C> {
    pub fn new(clock: C, params: TrackerParams) -> Self {
        Self {
            clock,
            params,
            registry: MarkerRegistry::new(),
            session: RecordingSession::new(),
            last_eviction: None,
        }
    }

    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    /// Ingest the detections of a new video frame.
    ///
    /// Updates the registry (appending history while recording), then runs a
    /// stale scan if the eviction interval has elapsed.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self, detections), fields(n = detections.len()))
    )]
    pub fn on_frame(&mut self, detections: &[Detection]) -> UpdateReport {
        let now = self.clock.now();
        let report = self
            .registry
            .update(detections, now, self.session.is_recording());
        self.poll_eviction(now);
        report
    }

    /// Run a stale scan unless one ran less than `eviction_interval` ago.
    ///
    /// Returns the evicted ids (empty when throttled).
    pub fn poll_eviction(&mut self, now: f64) -> Vec<MarkerId> {
        if let Some(last) = self.last_eviction {
            if now - last < self.params.eviction_interval {
                return Vec::new();
            }
        }
        self.last_eviction = Some(now);
        let timeout = self.params.stale_timeout;
        if self.params.protect_session_history {
            self.registry
                .evict_stale_where(now, timeout, |r| !r.history().is_empty())
        } else {
            self.registry.evict_stale(now, timeout)
        }
    }

    /// Operator record toggle.
    pub fn toggle_recording(&mut self) -> SessionState {
        let now = self.clock.now();
        self.session.toggle(now, &mut self.registry)
    }

    pub fn set_trim(&mut self, begin: f64, end: f64) -> Result<TrimWindow, SessionError> {
        self.session.set_trim(begin, end)
    }

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.session.is_recording()
    }

    #[inline]
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Duration of the stopped session.
    pub fn session_duration(&self) -> Option<f64> {
        self.session.duration()
    }

    /// Value for the record-time label: running or final session time.
    pub fn elapsed(&self) -> f64 {
        self.session.elapsed(self.clock.now())
    }

    pub fn trim_preview(&self) -> Vec<PreviewTrack> {
        self.session.trim_preview(&self.registry)
    }

    /// Copy the trimmed session out for export.
    pub fn snapshot(&self) -> Result<ExportSnapshot, ExportError> {
        ExportSnapshot::capture(&self.registry, self.session.trim_bounds())
    }

    /// Save flow: snapshot, ask for a destination, stop a running
    /// recording, write.
    ///
    /// A recording is only stopped once the operator picked a destination;
    /// `Ok(None)` (cancelled) and `NoDataAvailable` leave the session as it
    /// was.
    pub fn save_with<D: SaveDialog + ?Sized>(
        &mut self,
        dialog: &mut D,
        opts: &ExportOptions,
    ) -> Result<Option<ExportSummary>, ExportError> {
        let now = self.clock.now();
        let snapshot = self.export_snapshot(now)?;
        let Some(path) = dialog.choose(&suggested_file_name()) else {
            log::info!("save cancelled");
            return Ok(None);
        };
        self.finish_recording(now);
        snapshot.save(path, opts).map(Some).inspect_err(|err| {
            log::warn!("{err}");
        })
    }

    /// Save to a known path without a dialog.
    pub fn export_to(
        &mut self,
        path: impl AsRef<Path>,
        opts: &ExportOptions,
    ) -> Result<ExportSummary, ExportError> {
        let now = self.clock.now();
        let snapshot = self.export_snapshot(now)?;
        self.finish_recording(now);
        snapshot.save(path, opts).inspect_err(|err| {
            log::warn!("{err}");
        })
    }

    fn export_snapshot(&self, now: f64) -> Result<ExportSnapshot, ExportError> {
        ExportSnapshot::capture(&self.registry, self.session.export_bounds(now))
            .inspect_err(|err| log::info!("{err}"))
    }

    fn finish_recording(&mut self, now: f64) {
        if self.session.is_recording() {
            self.session.stop(now);
        }
    }
}
