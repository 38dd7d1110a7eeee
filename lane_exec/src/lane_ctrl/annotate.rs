//! Diagnostic rendering of the lane masks over the rectified frame

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{Rgb, RgbImage};

use crate::per_client::LaneMasks;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Colour of lane A pixels in annotated frames
pub const LANE_A_COLOUR: Rgb<u8> = Rgb([0, 0, 255]);

/// Colour of lane B pixels in annotated frames
pub const LANE_B_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Paint the lane pixels over a copy of the rectified frame. Lane B is painted
/// last and wins where both masks are set.
pub fn annotate(frame: &RgbImage, masks: &LaneMasks) -> RgbImage {
    let mut annotated = frame.clone();

    for (mask, colour) in [(&masks.lane_a, LANE_A_COLOUR), (&masks.lane_b, LANE_B_COLOUR)].iter() {
        for ((y, x), &set) in mask.indexed_iter() {
            if set && (x as u32) < annotated.width() && (y as u32) < annotated.height() {
                annotated.put_pixel(x as u32, y as u32, *colour);
            }
        }
    }

    annotated
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raster::RasterParams;

    #[test]
    fn test_annotate() {
        let raster = RasterParams {
            width_px: 3,
            height_px: 2,
            res_m: 0.1,
        };
        let frame = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));

        let mut masks = LaneMasks::empty(&raster);
        masks.lane_a[[0, 0]] = true;
        masks.lane_a[[1, 2]] = true;
        masks.lane_b[[1, 2]] = true;

        let annotated = annotate(&frame, &masks);

        assert_eq!(*annotated.get_pixel(0, 0), LANE_A_COLOUR);
        assert_eq!(*annotated.get_pixel(2, 1), LANE_B_COLOUR);
        assert_eq!(*annotated.get_pixel(1, 0), Rgb([10, 20, 30]));

        // The source frame is left untouched
        assert_eq!(*frame.get_pixel(0, 0), Rgb([10, 20, 30]));
    }
}
