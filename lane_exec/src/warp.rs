//! # Warp Transform
//!
//! Rectifies camera frames into the bird's-eye raster using a homography
//! calibrated offline. The matrix maps source pixel coordinates to rectified
//! pixel coordinates; it is inverted once so that every rectified pixel can be
//! sampled from the source frame.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{Rgb, RgbImage};
use nalgebra::{Matrix3, Vector3};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Colour given to rectified pixels which map outside the source frame.
pub const OUTSIDE_COLOUR: Rgb<u8> = Rgb([255, 255, 255]);

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A rectification transform for a fixed output size.
#[derive(Debug, Clone)]
pub struct Warper {
    /// Rectified to source pixel transform
    inverse: Matrix3<f64>,

    out_width: u32,
    out_height: u32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WarpError {
    #[error("Cannot read the warp matrix file {0:?}: {1}")]
    MatrixFileError(PathBuf, std::io::Error),

    #[error("Cannot parse the warp matrix, expected a 3x3 array of numbers: {0}")]
    DeserialiseError(serde_json::Error),

    #[error("The warp matrix is not invertible: {0:?}")]
    NotInvertible(Matrix3<f64>),

    #[error("Cannot rectify an empty ({0}x{1}) frame")]
    EmptyFrame(u32, u32),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Warper {
    /// Create a new warper from the source to rectified transform.
    pub fn new(matrix: Matrix3<f64>, out_width: u32, out_height: u32) -> Result<Self, WarpError> {
        let inverse = matrix
            .try_inverse()
            .filter(|m| m.iter().all(|v| v.is_finite()))
            .ok_or(WarpError::NotInvertible(matrix))?;

        Ok(Self {
            inverse,
            out_width,
            out_height,
        })
    }

    /// Rectify a frame. Pixels mapping outside the source are filled with
    /// [`OUTSIDE_COLOUR`], other pixels are bilinearly interpolated.
    pub fn rectify(&self, frame: &RgbImage) -> Result<RgbImage, WarpError> {
        let (width, height) = frame.dimensions();

        if width == 0 || height == 0 {
            return Err(WarpError::EmptyFrame(width, height));
        }

        let max_x = (width - 1) as f64;
        let max_y = (height - 1) as f64;

        Ok(RgbImage::from_fn(self.out_width, self.out_height, |x, y| {
            let src = self.inverse * Vector3::new(x as f64, y as f64, 1.0);

            if src.z.abs() < std::f64::EPSILON {
                return OUTSIDE_COLOUR;
            }

            let (sx, sy) = (src.x / src.z, src.y / src.z);

            if !(0.0..=max_x).contains(&sx) || !(0.0..=max_y).contains(&sy) {
                return OUTSIDE_COLOUR;
            }

            sample_bilinear(frame, sx, sy)
        }))
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Rectify a single frame with the given matrix.
///
/// Executables rectifying many frames should build a [`Warper`] once instead.
pub fn rectify(
    frame: &RgbImage,
    matrix: &Matrix3<f64>,
    out_width: u32,
    out_height: u32,
) -> Result<RgbImage, WarpError> {
    Warper::new(*matrix, out_width, out_height)?.rectify(frame)
}

/// Load a warp matrix stored as a row-major JSON array, `[[a, b, c], [d, e, f], [g, h, i]]`.
pub fn load_matrix<P: AsRef<Path>>(path: P) -> Result<Matrix3<f64>, WarpError> {
    let path = path.as_ref();

    let contents = std::fs::read_to_string(path)
        .map_err(|e| WarpError::MatrixFileError(path.to_path_buf(), e))?;

    parse_matrix(&contents)
}

/// Parse a row-major JSON warp matrix.
pub fn parse_matrix(s: &str) -> Result<Matrix3<f64>, WarpError> {
    let rows: [[f64; 3]; 3] = serde_json::from_str(s).map_err(WarpError::DeserialiseError)?;

    Ok(Matrix3::from_row_slice(&rows.concat()))
}

fn sample_bilinear(frame: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (width, height) = frame.dimensions();

    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = frame.get_pixel(x0, y0);
    let p10 = frame.get_pixel(x1, y0);
    let p01 = frame.get_pixel(x0, y1);
    let p11 = frame.get_pixel(x1, y1);

    let mut out = [0u8; 3];
    for (c, o) in out.iter_mut().enumerate() {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        *o = (top * (1.0 - fy) + bottom * fy).round() as u8;
    }

    Rgb(out)
}
