//! # Lane Occupancy Estimator
//!
//! Decides which of the two detected lanes the vehicle is in, from the overlap
//! of each lane mask with the vehicle box.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::lane::LaneId;
use ndarray::{s, Zip};
use serde::{Deserialize, Serialize};

use crate::raster::LaneMask;
use crate::vehicle::VehicleBox;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the tracked lane is chosen when lane pixels are first seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneSelectPolicy {
    /// Track the lane occupying more of the vehicle box, lane B on ties.
    Occupancy,

    /// Always track lane A.
    LaneA,

    /// Always track lane B.
    LaneB,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LaneSelectPolicy {
    fn default() -> Self {
        LaneSelectPolicy::Occupancy
    }
}

impl LaneSelectPolicy {
    /// Returns true if the policy ignores the lane probabilities.
    pub fn is_fixed(&self) -> bool {
        !matches!(self, LaneSelectPolicy::Occupancy)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Fraction of the vehicle box covered by the lane mask, in `[0, 1]`.
///
/// An empty box gives 0.
pub fn lane_probability(vehicle_box: &VehicleBox, lane_mask: &LaneMask) -> f64 {
    debug_assert_eq!(vehicle_box.mask().dim(), lane_mask.dim());

    if vehicle_box.num_px() == 0 {
        return 0.0;
    }

    // Only the box's own window can overlap
    let (rows, cols) = (vehicle_box.rows(), vehicle_box.cols());

    let mut overlap = 0usize;
    Zip::from(vehicle_box.mask().slice(s![rows.clone(), cols.clone()]))
        .and(lane_mask.slice(s![rows, cols]))
        .for_each(|&in_box, &in_lane| {
            if in_box && in_lane {
                overlap += 1;
            }
        });

    overlap as f64 / vehicle_box.num_px() as f64
}

/// Pick the lane to track given both lane probabilities.
pub fn select_lane(policy: LaneSelectPolicy, prob_a: f64, prob_b: f64) -> LaneId {
    match policy {
        LaneSelectPolicy::Occupancy if prob_a > prob_b => LaneId::A,
        LaneSelectPolicy::Occupancy => LaneId::B,
        LaneSelectPolicy::LaneA => LaneId::A,
        LaneSelectPolicy::LaneB => LaneId::B,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::raster::RasterParams;
    use crate::vehicle::{VehicleFootprint, VehicleParams};

    fn default_box() -> (RasterParams, VehicleBox) {
        let raster = RasterParams::default();
        let footprint = VehicleFootprint::new(&raster, &VehicleParams::default());
        (raster, VehicleBox::new(&raster, &footprint))
    }

    #[test]
    fn test_disjoint_and_covered() {
        let (raster, vbox) = default_box();

        // Left half of the raster, the box starts at column 212
        let mut lane = raster.empty_mask();
        lane.slice_mut(s![.., ..200]).fill(true);
        assert_eq!(lane_probability(&vbox, &lane), 0.0);

        let lane = LaneMask::from_elem(raster.shape(), true);
        assert_eq!(lane_probability(&vbox, &lane), 1.0);

        assert_eq!(lane_probability(&vbox, &raster.empty_mask()), 0.0);
    }

    #[test]
    fn test_partial_cover() {
        let (raster, vbox) = default_box();

        // Columns 212..224 are half of the box's 24 columns
        let mut lane = raster.empty_mask();
        lane.slice_mut(s![.., ..224]).fill(true);

        assert_eq!(lane_probability(&vbox, &lane), 0.5);
    }

    #[test]
    fn test_select_lane() {
        use LaneSelectPolicy::*;

        assert_eq!(select_lane(Occupancy, 0.7, 0.2), LaneId::A);
        assert_eq!(select_lane(Occupancy, 0.2, 0.7), LaneId::B);
        assert_eq!(select_lane(Occupancy, 0.0, 0.0), LaneId::B);
        assert_eq!(select_lane(LaneA, 0.0, 1.0), LaneId::A);
        assert_eq!(select_lane(LaneB, 1.0, 0.0), LaneId::B);
        assert!(LaneB.is_fixed());
        assert!(!Occupancy.is_fixed());
    }
}
