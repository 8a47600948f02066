//! Normalized trim window over a stopped session and its preview classification.

use artrack_core::MarkerId;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::registry::MarkerRegistry;

/// Rejected trim request. The session never fails on these; it reports them
/// and falls back to [`TrimWindow::clamped`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum TrimError {
    #[error("trim bounds must be finite (begin={begin}, end={end})")]
    NotFinite { begin: f64, end: f64 },
    #[error("trim bounds must lie in [0, 1] (begin={begin}, end={end})")]
    OutOfRange { begin: f64, end: f64 },
    #[error("trim begin {begin} is after end {end}")]
    InvalidTrimRange { begin: f64, end: f64 },
}

/// Sub-range of a session expressed as fractions of its duration.
///
/// Invariant: `0 <= begin <= end <= 1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimWindow {
    begin: f64,
    end: f64,
}

impl Default for TrimWindow {
    fn default() -> Self {
        Self::FULL
    }
}

impl TrimWindow {
    /// The whole session.
    pub const FULL: TrimWindow = TrimWindow {
        begin: 0.0,
        end: 1.0,
    };

    /// Accept the window only if it already satisfies the invariant.
    pub fn try_new(begin: f64, end: f64) -> Result<Self, TrimError> {
        if !begin.is_finite() || !end.is_finite() {
            return Err(TrimError::NotFinite { begin, end });
        }
        if !(0.0..=1.0).contains(&begin) || !(0.0..=1.0).contains(&end) {
            return Err(TrimError::OutOfRange { begin, end });
        }
        if begin > end {
            return Err(TrimError::InvalidTrimRange { begin, end });
        }
        Ok(Self { begin, end })
    }

    /// Force any input into a valid window.
    ///
    /// Rules, applied in order:
    /// 1. NaN begin becomes 0, NaN end becomes 1;
    /// 2. both values are clamped to `[0, 1]`;
    /// 3. if begin is still after end, begin is clamped down to end.
    pub fn clamped(begin: f64, end: f64) -> Self {
        let begin = if begin.is_nan() { 0.0 } else { begin.clamp(0.0, 1.0) };
        let end = if end.is_nan() { 1.0 } else { end.clamp(0.0, 1.0) };
        Self {
            begin: begin.min(end),
            end,
        }
    }

    #[inline]
    pub fn begin(&self) -> f64 {
        self.begin
    }

    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        *self == Self::FULL
    }

    /// Absolute bounds of this window inside `[start, stop]`.
    pub fn bounds(&self, start: f64, stop: f64) -> TrimBounds {
        let span = stop - start;
        TrimBounds {
            begin: start + self.begin * span,
            end: start + self.end * span,
        }
    }
}

/// Absolute time range selected by a trim window, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrimBounds {
    pub begin: f64,
    pub end: f64,
}

impl TrimBounds {
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        self.begin <= t && t <= self.end
    }

    /// Time relative to the window start.
    #[inline]
    pub fn offset(&self, t: f64) -> f64 {
        t - self.begin
    }

    #[inline]
    pub fn classify(&self, t: f64) -> SampleClass {
        if self.contains(t) {
            SampleClass::Inside
        } else {
            SampleClass::Outside
        }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.begin
    }
}

/// Whether a recorded sample falls inside the trim window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleClass {
    Inside,
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewPoint {
    pub timestamp: f64,
    pub center: Point2<f32>,
    pub class: SampleClass,
}

/// Classified history of one marker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PreviewTrack {
    pub id: MarkerId,
    pub points: Vec<PreviewPoint>,
}

impl PreviewTrack {
    pub fn inside_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| p.class == SampleClass::Inside)
            .count()
    }
}

/// Classify every history sample in the registry against `bounds`.
///
/// Pure view: nothing in the registry changes. Records without history are
/// left out.
pub fn classify_history(registry: &MarkerRegistry, bounds: TrimBounds) -> Vec<PreviewTrack> {
    registry
        .iter()
        .filter(|r| !r.history().is_empty())
        .map(|r| PreviewTrack {
            id: r.id(),
            points: r
                .history()
                .iter()
                .map(|s| PreviewPoint {
                    timestamp: s.timestamp,
                    center: s.center,
                    class: bounds.classify(s.timestamp),
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn try_new_reports_each_violation() {
        assert!(TrimWindow::try_new(0.2, 0.8).is_ok());
        assert!(matches!(
            TrimWindow::try_new(f64::NAN, 0.5),
            Err(TrimError::NotFinite { .. })
        ));
        assert!(matches!(
            TrimWindow::try_new(-0.1, 0.5),
            Err(TrimError::OutOfRange { .. })
        ));
        assert_eq!(
            TrimWindow::try_new(0.7, 0.3),
            Err(TrimError::InvalidTrimRange {
                begin: 0.7,
                end: 0.3
            })
        );
    }

    #[test]
    fn clamped_pulls_begin_down_to_end() {
        let w = TrimWindow::clamped(0.7, 0.3);
        assert_eq!((w.begin(), w.end()), (0.3, 0.3));

        let w = TrimWindow::clamped(-2.0, 5.0);
        assert!(w.is_full());

        let w = TrimWindow::clamped(f64::NAN, f64::NAN);
        assert!(w.is_full());

        let w = TrimWindow::clamped(1.5, 0.5);
        assert_eq!((w.begin(), w.end()), (0.5, 0.5));
    }

    #[test]
    fn bounds_scale_with_session() {
        let w = TrimWindow::clamped(0.25, 0.75);
        let b = w.bounds(100.0, 104.0);
        assert_relative_eq!(b.begin, 101.0);
        assert_relative_eq!(b.end, 103.0);
        assert_relative_eq!(b.duration(), 2.0);
        assert!(b.contains(101.0));
        assert!(b.contains(103.0));
        assert!(!b.contains(103.0001));
        assert_relative_eq!(b.offset(102.5), 1.5);
    }

    #[test]
    fn default_is_full_session() {
        let b = TrimWindow::default().bounds(3.0, 8.0);
        assert_eq!(b, TrimBounds { begin: 3.0, end: 8.0 });
    }
}
