//! Visual calibration grid for the video overlay.
//!
//! Four draggable reference points define a quadrilateral; rows and columns
//! are placed by linear interpolation along opposite edges. The corners are
//! kept in a small text file between runs. Nothing here touches the
//! recording pipeline.

mod calibration;
mod io;

pub use calibration::{
    GridCalibration, GridLine, GridParams, LineOrientation, GRID_CORNERS, MAX_DIVISIONS,
    MIN_DIVISIONS,
};
pub use io::{
    format_corners, load_corners, parse_corners, save_corners, GridIoError, DEFAULT_POINTS_PATH,
};
