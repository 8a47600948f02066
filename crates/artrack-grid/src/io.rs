//! Flat-file store for the four grid corners: one `x,y` line per corner.

use std::fs;
use std::io;
use std::path::Path;

use nalgebra::Point2;

use crate::calibration::{GridCalibration, GridParams, GRID_CORNERS};

/// Default location of the corner file, relative to the working directory.
pub const DEFAULT_POINTS_PATH: &str = "GUI/gridCorners.points";

#[derive(thiserror::Error, Debug)]
pub enum GridIoError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("line {line}: expected `x,y`, got {content:?}")]
    Parse { line: usize, content: String },
    #[error("expected {GRID_CORNERS} corner lines, found {found}")]
    CornerCount { found: usize },
}

fn parse_coord(s: &str) -> Option<i32> {
    let s = s.trim();
    s.parse::<i32>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.round() as i32))
}

/// Parse corner file contents. Blank lines are ignored.
///
/// Extra comma-separated fields after `x,y` are accepted and ignored.
pub fn parse_corners(text: &str) -> Result<[Point2<i32>; GRID_CORNERS], GridIoError> {
    let mut corners = Vec::with_capacity(GRID_CORNERS);
    for (idx, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let mut fields = raw.split(',');
        let xy = fields
            .next()
            .and_then(parse_coord)
            .zip(fields.next().and_then(parse_coord));
        let Some((x, y)) = xy else {
            return Err(GridIoError::Parse {
                line: idx + 1,
                content: raw.to_string(),
            });
        };
        corners.push(Point2::new(x, y));
    }
    let found = corners.len();
    <[Point2<i32>; GRID_CORNERS]>::try_from(corners)
        .map_err(|_| GridIoError::CornerCount { found })
}

pub fn format_corners(corners: &[Point2<i32>; GRID_CORNERS]) -> String {
    corners
        .iter()
        .map(|p| format!("{},{}\n", p.x, p.y))
        .collect()
}

pub fn load_corners(path: impl AsRef<Path>) -> Result<[Point2<i32>; GRID_CORNERS], GridIoError> {
    let raw = fs::read_to_string(path)?;
    parse_corners(&raw)
}

/// Write the corners, creating the parent directory if needed.
pub fn save_corners(
    path: impl AsRef<Path>,
    corners: &[Point2<i32>; GRID_CORNERS],
) -> Result<(), GridIoError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, format_corners(corners))?;
    Ok(())
}

impl GridCalibration {
    /// Restore corners from `path`; a missing file yields all corners at the
    /// origin. A present but unreadable file is an error.
    pub fn load_or_default(
        path: impl AsRef<Path>,
        params: GridParams,
    ) -> Result<Self, GridIoError> {
        let path = path.as_ref();
        match load_corners(path) {
            Ok(corners) => {
                log::info!("loaded grid corners from {}", path.display());
                Ok(Self::new(corners, params))
            }
            Err(GridIoError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no grid corner file at {}", path.display());
                Ok(Self::new([Point2::origin(); GRID_CORNERS], params))
            }
            Err(err) => Err(err),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GridIoError> {
        save_corners(path, self.corners())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_integer_and_legacy_point_lines() {
        let corners = parse_corners("10,20\n30, 40, 0\n\n50.4,60.6\n-1,-2\n").unwrap();
        assert_eq!(
            corners,
            [
                Point2::new(10, 20),
                Point2::new(30, 40),
                Point2::new(50, 61),
                Point2::new(-1, -2),
            ]
        );
    }

    #[test]
    fn rejects_wrong_line_count_and_garbage() {
        assert!(matches!(
            parse_corners("1,2\n3,4\n"),
            Err(GridIoError::CornerCount { found: 2 })
        ));
        assert!(matches!(
            parse_corners("1,2\n3,4\n5,6\n7,8\n9,10\n"),
            Err(GridIoError::CornerCount { found: 5 })
        ));
        assert!(matches!(
            parse_corners("1,2\nx,4\n"),
            Err(GridIoError::Parse { line: 2, .. })
        ));
        assert!(matches!(
            parse_corners("7\n"),
            Err(GridIoError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn format_is_one_point_per_line() {
        let corners = [
            Point2::new(1, 2),
            Point2::new(3, 4),
            Point2::new(5, 6),
            Point2::new(7, 8),
        ];
        assert_eq!(format_corners(&corners), "1,2\n3,4\n5,6\n7,8\n");
    }
}
