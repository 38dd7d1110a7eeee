//! # Perception Client
//!
//! The segmentation model is an external collaborator. It is reached through
//! the [`Segmenter`] trait, which takes a rectified frame and returns a class
//! label raster:
//!
//! - The output may be of any size, it is resized to the rectified raster with
//!   nearest neighbour sampling.
//! - Labels are those of [`LaneClass`], unknown labels are background.
//! - Failures are reported as a [`PerError`], the caller treats them as a
//!   recoverable fault for the cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::lane::{LaneClass, LaneId};
use image::{imageops::FilterType, GrayImage, RgbImage};
use ndarray::Array2;

use crate::raster::{self, LaneMask, RasterParams};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A semantic segmentation model labelling lane pixels.
pub trait Segmenter {
    /// Segment a rectified frame into a class label raster.
    fn segment(&mut self, frame: &RgbImage) -> Result<GrayImage, PerError>;

    /// Called instead of `segment` on cycles without a rectified frame.
    ///
    /// Sources producing one output per camera frame must drop the output of
    /// the missed frame here.
    fn skip(&mut self) {}
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Boolean masks of both lanes for one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LaneMasks {
    pub lane_a: LaneMask,
    pub lane_b: LaneMask,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PerError {
    #[error("No more segmentation output is available")]
    Exhausted,

    #[error("Cannot read segmentation output: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Cannot list segmentation output: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Segmentation returned an empty ({0}x{1}) label raster")]
    EmptyOutput(u32, u32),

    #[error("Segmentation failed: {0}")]
    ModelError(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LaneMasks {
    /// Masks with no lane pixel at all.
    pub fn empty(raster: &RasterParams) -> Self {
        Self {
            lane_a: raster.empty_mask(),
            lane_b: raster.empty_mask(),
        }
    }

    /// Split a class label raster into lane masks of the rectified raster's
    /// size.
    pub fn from_class_image(labels: &GrayImage, raster: &RasterParams) -> Result<Self, PerError> {
        let (width, height) = labels.dimensions();

        if width == 0 || height == 0 {
            return Err(PerError::EmptyOutput(width, height));
        }

        let (out_width, out_height) = (raster.width_px as u32, raster.height_px as u32);

        let resized;
        let labels = if (width, height) != (out_width, out_height) {
            resized = image::imageops::resize(labels, out_width, out_height, FilterType::Nearest);
            &resized
        } else {
            labels
        };

        let mask_of = |lane: LaneId| {
            Array2::from_shape_fn(raster.shape(), |(y, x)| {
                LaneClass::from_label(labels.get_pixel(x as u32, y as u32)[0]).lane() == Some(lane)
            })
        };

        Ok(Self {
            lane_a: mask_of(LaneId::A),
            lane_b: mask_of(LaneId::B),
        })
    }

    pub fn get(&self, lane: LaneId) -> &LaneMask {
        match lane {
            LaneId::A => &self.lane_a,
            LaneId::B => &self.lane_b,
        }
    }

    /// Number of pixels in each lane.
    pub fn num_px(&self) -> (usize, usize) {
        (raster::count(&self.lane_a), raster::count(&self.lane_b))
    }

    /// Total number of lane pixels.
    pub fn total_px(&self) -> usize {
        let (a, b) = self.num_px();
        a + b
    }
}
