//! # Steering Selector
//!
//! Picks the steering angle whose footprint template best overlaps the tracked
//! lane. Every template is scored, the score being the sum of the template's
//! intensities over the lane's pixels.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

use crate::raster::{IntensityRaster, LaneMask};
use crate::traj_bank::TrajBank;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The angle chosen by the selector and its correlation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Selection {
    pub angle_deg: i32,
    pub score: u64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Correlation between a lane mask and a template.
pub fn correlate(lane_mask: &LaneMask, template: &IntensityRaster) -> u64 {
    debug_assert_eq!(lane_mask.dim(), template.dim());

    lane_mask
        .iter()
        .zip(template.iter())
        .filter(|(&in_lane, _)| in_lane)
        .map(|(_, &v)| v as u64)
        .sum()
}

/// Select the best matching angle for the lane.
///
/// Only a strictly greater score replaces the current best, and templates are
/// visited in ascending angle order, so ties go to the lowest angle. An empty
/// mask scores zero everywhere and gives the straight ahead angle.
pub fn select_angle(lane_mask: &LaneMask, bank: &TrajBank) -> Selection {
    let mut best = Selection::default();

    for template in bank {
        let score = correlate(lane_mask, &template.raster);

        if score > best.score {
            best = Selection {
                angle_deg: template.angle_deg,
                score,
            };
        }
    }

    best
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raster::RasterParams;
    use crate::traj_bank::TrajBankParams;
    use crate::vehicle::VehicleParams;
    use ndarray::s;

    fn default_bank() -> TrajBank {
        TrajBank::new(
            &RasterParams::default(),
            &VehicleParams::default(),
            &TrajBankParams::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_mask_is_straight() {
        let bank = default_bank();
        let mask = RasterParams::default().empty_mask();

        for _ in 0..3 {
            assert_eq!(
                select_angle(&mask, &bank),
                Selection {
                    angle_deg: 0,
                    score: 0
                }
            );
        }
    }

    #[test]
    fn test_template_footprint_selects_itself() {
        let bank = default_bank();

        for &angle in [-20, -9, -1, 0, 4, 13, 20].iter() {
            let mask = bank.get(angle).unwrap().footprint();

            assert_eq!(select_angle(&mask, &bank).angle_deg, angle);
        }
    }

    #[test]
    fn test_straight_strip() {
        let bank = default_bank();

        // Strip over the vehicle box's columns, full height
        let mut mask = RasterParams::default().empty_mask();
        mask.slice_mut(s![.., 212..236]).fill(true);

        let selection = select_angle(&mask, &bank);
        assert_eq!(selection.angle_deg, 0);
        assert!(selection.score > 0);
    }

    #[test]
    fn test_ties_go_to_lowest_angle() {
        let bank = default_bank();
        let mut num_tied = 0;

        // Single pixels near the rear, where most templates overlap
        for &row in [299usize, 250].iter() {
            for col in (200..250).step_by(2) {
                let mut mask = RasterParams::default().empty_mask();
                mask[[row, col]] = true;

                let scores: Vec<(i32, u64)> = bank
                    .iter()
                    .map(|t| (t.angle_deg, correlate(&mask, &t.raster)))
                    .collect();
                let max = scores.iter().map(|s| s.1).max().unwrap();

                let selection = select_angle(&mask, &bank);
                assert_eq!(selection.score, max);

                if max == 0 {
                    assert_eq!(selection.angle_deg, 0);
                    continue;
                }

                let first = scores.iter().find(|s| s.1 == max).unwrap().0;
                assert_eq!(selection.angle_deg, first, "pixel ({}, {})", row, col);

                if scores.iter().filter(|s| s.1 == max).count() > 1 {
                    num_tied += 1;
                }
            }
        }

        assert!(num_tied > 0);
    }

    #[test]
    fn test_correlate() {
        let mut mask = LaneMask::from_elem((2, 3), false);
        mask[[0, 1]] = true;
        mask[[1, 2]] = true;

        let template = IntensityRaster::from_shape_vec((2, 3), vec![9, 200, 3, 4, 5, 255]).unwrap();

        assert_eq!(correlate(&mask, &template), 455);
    }
}
