use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Number of user-placed reference corners.
pub const GRID_CORNERS: usize = 4;

/// Allowed range for rows and columns.
pub const MIN_DIVISIONS: u32 = 1;
pub const MAX_DIVISIONS: u32 = 30;

fn default_divisions() -> u32 {
    2
}

fn default_major_every() -> u32 {
    5
}

/// Grid density settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridParams {
    #[serde(default = "default_divisions")]
    pub rows: u32,
    #[serde(default = "default_divisions")]
    pub cols: u32,
    /// Every n-th line (starting with the first) gets a tick mark. 0 disables ticks.
    #[serde(default = "default_major_every")]
    pub major_every: u32,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            rows: default_divisions(),
            cols: default_divisions(),
            major_every: default_major_every(),
        }
    }
}

impl GridParams {
    /// Bring rows and cols into `MIN_DIVISIONS..=MAX_DIVISIONS`.
    pub fn clamped(self) -> Self {
        Self {
            rows: self.rows.clamp(MIN_DIVISIONS, MAX_DIVISIONS),
            cols: self.cols.clamp(MIN_DIVISIONS, MAX_DIVISIONS),
            ..self
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineOrientation {
    /// Runs from the top edge to the bottom edge.
    Vertical,
    /// Runs from the left edge to the right edge.
    Horizontal,
}

/// One segment of the overlay.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLine {
    pub from: Point2<f32>,
    pub to: Point2<f32>,
    pub orientation: LineOrientation,
    /// Position along the opposite edges, in `[0, 1]`.
    pub t: f32,
    pub major: bool,
}

#[inline]
fn lerp(a: Point2<f32>, b: Point2<f32>, t: f32) -> Point2<f32> {
    a + (b - a) * t
}

#[inline]
fn to_f32(p: Point2<i32>) -> Point2<f32> {
    Point2::new(p.x as f32, p.y as f32)
}

/// Quadrilateral calibration grid.
///
/// Corners are ordered top-left, top-right, bottom-right, bottom-left.
/// Lines are placed by linear interpolation along opposite edges (a bilinear
/// grid, not a homography).
#[derive(Clone, Debug)]
pub struct GridCalibration {
    corners: [Point2<i32>; GRID_CORNERS],
    params: GridParams,
    visible: bool,
    editing: bool,
    grabbed: usize,
    dragging: bool,
}

impl Default for GridCalibration {
    fn default() -> Self {
        Self::new([Point2::origin(); GRID_CORNERS], GridParams::default())
    }
}

impl GridCalibration {
    pub fn new(corners: [Point2<i32>; GRID_CORNERS], params: GridParams) -> Self {
        Self {
            corners,
            params: params.clamped(),
            visible: false,
            editing: false,
            grabbed: 0,
            dragging: false,
        }
    }

    #[inline]
    pub fn corners(&self) -> &[Point2<i32>; GRID_CORNERS] {
        &self.corners
    }

    pub fn set_corners(&mut self, corners: [Point2<i32>; GRID_CORNERS]) {
        self.corners = corners;
    }

    #[inline]
    pub fn params(&self) -> GridParams {
        self.params
    }

    pub fn set_rows(&mut self, rows: u32) {
        self.params = GridParams { rows, ..self.params }.clamped();
    }

    pub fn set_cols(&mut self, cols: u32) {
        self.params = GridParams { cols, ..self.params }.clamped();
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    #[inline]
    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// Enable or disable corner editing. Disabling drops any active drag.
    pub fn set_editing(&mut self, editing: bool) {
        self.editing = editing;
        if !editing {
            self.dragging = false;
        }
    }

    /// Index of the corner currently (or last) grabbed.
    #[inline]
    pub fn grabbed(&self) -> usize {
        self.grabbed
    }

    /// Closest corner to `p`.
    ///
    /// The currently grabbed corner is kept unless another one is strictly
    /// closer; among the others, ties go to the lowest index.
    pub fn nearest_corner(&self, p: Point2<i32>) -> usize {
        let target = to_f32(p);
        let dist2 = |i: usize| (to_f32(self.corners[i]) - target).norm_squared();
        let mut best = self.grabbed;
        let mut best_d2 = dist2(best);
        for i in 0..GRID_CORNERS {
            let d2 = dist2(i);
            if d2 < best_d2 {
                best = i;
                best_d2 = d2;
            }
        }
        best
    }

    /// Grab the nearest corner and move it under the pointer.
    ///
    /// Ignored unless editing. Returns `true` if a corner moved.
    pub fn pointer_down(&mut self, p: Point2<i32>) -> bool {
        if !self.editing {
            return false;
        }
        self.grabbed = self.nearest_corner(p);
        self.dragging = true;
        self.corners[self.grabbed] = p;
        log::debug!("grid corner {} grabbed at ({}, {})", self.grabbed, p.x, p.y);
        true
    }

    /// Move the grabbed corner. Ignored unless a drag is in progress.
    pub fn pointer_drag(&mut self, p: Point2<i32>) -> bool {
        if !(self.editing && self.dragging) {
            return false;
        }
        self.corners[self.grabbed] = p;
        true
    }

    pub fn pointer_up(&mut self) {
        self.dragging = false;
    }

    /// Point at parameters `(u, v)` in `[0, 1]^2` of the bilinear patch.
    pub fn point_at(&self, u: f32, v: f32) -> Point2<f32> {
        let [c0, c1, c2, c3] = self.corners.map(to_f32);
        let top = lerp(c0, c1, u);
        let bottom = lerp(c3, c2, u);
        lerp(top, bottom, v)
    }

    /// All overlay segments: `cols + 1` vertical and `rows + 1` horizontal
    /// lines, outer edges included.
    pub fn lines(&self) -> Vec<GridLine> {
        let [c0, c1, c2, c3] = self.corners.map(to_f32);
        let GridParams {
            rows,
            cols,
            major_every,
        } = self.params;
        let is_major = |i: u32, n: u32| i < n && major_every > 0 && i % major_every == 0;

        let mut out = Vec::with_capacity((rows + cols + 2) as usize);
        for x in 0..=cols {
            let t = x as f32 / cols as f32;
            out.push(GridLine {
                from: lerp(c0, c1, t),
                to: lerp(c3, c2, t),
                orientation: LineOrientation::Vertical,
                t,
                major: is_major(x, cols),
            });
        }
        for y in 0..=rows {
            let t = y as f32 / rows as f32;
            out.push(GridLine {
                from: lerp(c0, c3, t),
                to: lerp(c1, c2, t),
                orientation: LineOrientation::Horizontal,
                t,
                major: is_major(y, rows),
            });
        }
        out
    }
}
