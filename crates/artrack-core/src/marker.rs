use std::fmt;

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Number of corners every marker detection carries.
pub const CORNER_COUNT: usize = 4;

/// Identity assigned to a physical marker pattern by the external detector.
///
/// Opaque to this crate: it is only compared for equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub i32);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for MarkerId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

/// One timestamped observation of a marker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerSample {
    /// Seconds on the monotonic clock that drove the frame.
    pub timestamp: f64,
    pub center: Point2<f32>,
    /// Corners in the winding order produced by the detector.
    pub corners: [Point2<f32>; CORNER_COUNT],
}

/// Raw per-frame detection as handed over by the detector.
///
/// The corner list is not trusted; use [`Detection::corners_array`] to get
/// the fixed-size form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: MarkerId,
    pub center: Point2<f32>,
    pub corners: Vec<Point2<f32>>,
}

/// A detection that does not carry exactly [`CORNER_COUNT`] corners.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("marker {id}: expected {CORNER_COUNT} corners, got {corners}")]
pub struct MalformedDetection {
    pub id: MarkerId,
    pub corners: usize,
}

impl Detection {
    pub fn new(id: impl Into<MarkerId>, center: Point2<f32>, corners: Vec<Point2<f32>>) -> Self {
        Self {
            id: id.into(),
            center,
            corners,
        }
    }

    /// Corners as a fixed array, or an error if the count is wrong.
    pub fn corners_array(&self) -> Result<[Point2<f32>; CORNER_COUNT], MalformedDetection> {
        <[Point2<f32>; CORNER_COUNT]>::try_from(self.corners.as_slice()).map_err(|_| {
            MalformedDetection {
                id: self.id,
                corners: self.corners.len(),
            }
        })
    }

    /// Stamp this detection with a frame time.
    pub fn to_sample(&self, timestamp: f64) -> Result<MarkerSample, MalformedDetection> {
        Ok(MarkerSample {
            timestamp,
            center: self.center,
            corners: self.corners_array()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cx: f32, cy: f32) -> Vec<Point2<f32>> {
        vec![
            Point2::new(cx - 1.0, cy - 1.0),
            Point2::new(cx + 1.0, cy - 1.0),
            Point2::new(cx + 1.0, cy + 1.0),
            Point2::new(cx - 1.0, cy + 1.0),
        ]
    }

    #[test]
    fn to_sample_keeps_corner_order() {
        let det = Detection::new(3, Point2::new(5.0, 5.0), square(5.0, 5.0));
        let sample = det.to_sample(1.5).expect("four corners");
        assert_eq!(sample.timestamp, 1.5);
        assert_eq!(sample.corners[0], Point2::new(4.0, 4.0));
        assert_eq!(sample.corners[2], Point2::new(6.0, 6.0));
    }

    #[test]
    fn wrong_corner_count_is_malformed() {
        let mut corners = square(0.0, 0.0);
        corners.pop();
        let det = Detection::new(9, Point2::origin(), corners);
        let err = det.to_sample(0.0).unwrap_err();
        assert_eq!(
            err,
            MalformedDetection {
                id: MarkerId(9),
                corners: 3
            }
        );
        assert_eq!(err.to_string(), "marker 9: expected 4 corners, got 3");
    }

    #[test]
    fn detection_json_uses_point_arrays() {
        let json = r#"{"id":7,"center":[1.0,2.0],"corners":[[0,0],[1,0],[1,1],[0,1]]}"#;
        let det: Detection = serde_json::from_str(json).expect("parse");
        assert_eq!(det.id, MarkerId(7));
        assert_eq!(det.center, Point2::new(1.0, 2.0));
        assert_eq!(det.corners.len(), 4);
    }
}
