//! # Vehicle Footprint
//!
//! Pixel geometry of the vehicle in the rectified frame. The vehicle sits at
//! the bottom centre of the raster, facing up (towards row 0).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use ndarray::s;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::raster::{LaneMask, RasterParams};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Physical dimensions and mounting of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleParams {
    /// Width of the vehicle.
    ///
    /// Units: meters
    pub width_m: f64,

    /// Length of the vehicle box, also used as the wheelbase when computing
    /// turn radii.
    ///
    /// Units: meters
    pub box_length_m: f64,

    /// Distance between the bottom edge of the rectified frame and the
    /// vehicle reference point. The box centre sits half this distance above
    /// the bottom edge.
    ///
    /// Units: meters
    pub box_dist_m: f64,
}

/// Integer pixel geometry derived from [`VehicleParams`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleFootprint {
    /// Column of the vehicle centreline
    pub centre_x_px: i64,

    /// Row of the vehicle box centre
    pub box_centre_y_px: i64,

    /// Width of the vehicle
    pub width_px: i64,

    /// Length of the vehicle box
    pub length_px: i64,
}

/// The static rectangular region of the raster occupied by the vehicle.
///
/// Immutable once built, it is only used for occupancy tests.
#[derive(Debug, Clone)]
pub struct VehicleBox {
    mask: LaneMask,
    rows: Range<usize>,
    cols: Range<usize>,
    num_px: usize,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for VehicleParams {
    fn default() -> Self {
        Self {
            width_m: 0.42,
            box_length_m: 0.54,
            box_dist_m: 0.61,
        }
    }
}

impl VehicleFootprint {
    pub fn new(raster: &RasterParams, params: &VehicleParams) -> Self {
        Self {
            centre_x_px: (raster.width_px / 2) as i64,
            box_centre_y_px: raster.height_px as i64
                - (raster.m_to_px(params.box_dist_m) / 2.0) as i64,
            width_px: raster.m_to_px(params.width_m) as i64,
            length_px: raster.m_to_px(params.box_length_m) as i64,
        }
    }
}

impl VehicleBox {
    /// Build the box from the footprint, clipped to the raster.
    pub fn new(raster: &RasterParams, footprint: &VehicleFootprint) -> Self {
        let clip = |v: i64, max: usize| v.max(0).min(max as i64) as usize;

        let left = clip(footprint.centre_x_px - footprint.width_px / 2, raster.width_px);
        let right = clip(footprint.centre_x_px + footprint.width_px / 2, raster.width_px);
        let top = clip(footprint.box_centre_y_px - footprint.length_px / 2, raster.height_px);
        let bottom = clip(footprint.box_centre_y_px + footprint.length_px / 2, raster.height_px);

        let rows = top..bottom.max(top);
        let cols = left..right.max(left);

        let mut mask = raster.empty_mask();
        mask.slice_mut(s![rows.clone(), cols.clone()]).fill(true);

        Self {
            num_px: rows.len() * cols.len(),
            mask,
            rows,
            cols,
        }
    }

    pub fn mask(&self) -> &LaneMask {
        &self.mask
    }

    /// Rows covered by the box.
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Columns covered by the box.
    pub fn cols(&self) -> Range<usize> {
        self.cols.clone()
    }

    /// Number of pixels in the box.
    pub fn num_px(&self) -> usize {
        self.num_px
    }
}
