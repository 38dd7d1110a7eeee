//! # Raster Geometry
//!
//! Every mask and template handled by the core is a `(height, width)` raster
//! covering the rectified bird's-eye view at a fixed metric resolution. Row 0
//! is the furthest row from the vehicle, column 0 is on its left.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::Array2;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Boolean raster marking the pixels belonging to one lane (or to the vehicle box).
pub type LaneMask = Array2<bool>;

/// 8-bit intensity raster, used for the quantised trajectory templates.
pub type IntensityRaster = Array2<u8>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Size and resolution of the rectified raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterParams {
    /// Number of columns
    pub width_px: usize,

    /// Number of rows
    pub height_px: usize,

    /// Size of one pixel.
    ///
    /// Units: meters/pixel
    pub res_m: f64,
}

/// Iterator over the cells of a line segment between two (possibly
/// out-of-bounds) cells, both ends included.
///
/// Cells are visited using Bresenham's algorithm, so consecutive cells are
/// 8-connected.
#[derive(Debug, Clone)]
pub struct LineIter {
    x: i64,
    y: i64,
    end: (i64, i64),
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
    done: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            width_px: 448,
            height_px: 300,
            res_m: 17.0 / 1024.0,
        }
    }
}

impl RasterParams {
    /// Shape of the raster in `ndarray` order, `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.height_px, self.width_px)
    }

    /// Convert a metric length into pixels.
    pub fn m_to_px(&self, length_m: f64) -> f64 {
        length_m / self.res_m
    }

    /// A mask of the raster's shape with no pixel set.
    pub fn empty_mask(&self) -> LaneMask {
        LaneMask::from_elem(self.shape(), false)
    }

    /// Returns true if the raster has a usable size and resolution.
    pub fn is_valid(&self) -> bool {
        self.width_px > 0 && self.height_px > 0 && self.res_m.is_finite() && self.res_m > 0.0
    }
}

impl LineIter {
    /// Iterate from `start` to `end`, cells given as `(x, y)`.
    pub fn new(start: (i64, i64), end: (i64, i64)) -> Self {
        let dx = (end.0 - start.0).abs();
        let dy = -(end.1 - start.1).abs();

        Self {
            x: start.0,
            y: start.1,
            end,
            dx,
            dy,
            sx: if start.0 < end.0 { 1 } else { -1 },
            sy: if start.1 < end.1 { 1 } else { -1 },
            err: dx + dy,
            done: false,
        }
    }
}

impl Iterator for LineIter {
    type Item = (i64, i64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let cell = (self.x, self.y);

        if cell == self.end {
            self.done = true;
            return Some(cell);
        }

        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }

        Some(cell)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Set every in-bounds cell of the segment `start -> end` in `raster` to `value`.
///
/// Cells are given as `(x, y)`, i.e. `(col, row)`.
pub fn draw_line<T: Copy>(raster: &mut Array2<T>, start: (i64, i64), end: (i64, i64), value: T) {
    let (rows, cols) = raster.dim();

    for (x, y) in LineIter::new(start, end) {
        if x >= 0 && y >= 0 && (x as usize) < cols && (y as usize) < rows {
            raster[[y as usize, x as usize]] = value;
        }
    }
}

/// Number of set pixels in a mask.
pub fn count(mask: &LaneMask) -> usize {
    mask.iter().filter(|&&p| p).count()
}
