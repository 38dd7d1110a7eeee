//! Parameters structure for LaneCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    drive_enc::DriveEncParams, lane_occ::LaneSelectPolicy, obs_fusion::ObsFusionParams,
    raster::RasterParams, traj_bank::TrajBankParams, vehicle::VehicleParams,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for lane control.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Params {

    // ---- GEOMETRY ----

    /// Size and resolution of the rectified raster
    pub raster: RasterParams,

    /// Vehicle dimensions
    pub vehicle: VehicleParams,

    // ---- STEERING ----

    /// Trajectory template bank
    pub traj_bank: TrajBankParams,

    /// Calibration of the drive demands
    pub drive_enc: DriveEncParams,

    /// How the tracked lane is chosen
    pub lane_select: LaneSelectPolicy,

    // ---- OBSTACLES ----

    #[serde(default)]
    pub obs_fusion: ObsFusionParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Check the parameters can be used, giving a description of the first
    /// problem found.
    pub fn validate(&self) -> Result<(), String> {
        if !self.raster.is_valid() {
            return Err(format!("unusable raster {:?}", self.raster));
        }

        if !self.drive_enc.is_valid() {
            return Err(format!("unusable drive calibration {:?}", self.drive_enc));
        }

        if self.traj_bank.max_angle_deg as f64 > self.drive_enc.max_angle_deg {
            return Err(format!(
                "template bank range ({} deg) exceeds the drive encoder range ({} deg)",
                self.traj_bank.max_angle_deg, self.drive_enc.max_angle_deg
            ));
        }

        if self.obs_fusion.enabled && self.obs_fusion.sigma_m <= 0.0 {
            return Err(format!(
                "obstacle sigma must be positive, got {} m",
                self.obs_fusion.sigma_m
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_valid() {
        assert_eq!(Params::default().validate(), Ok(()));
    }

    #[test]
    fn test_range_exceeds_encoder() {
        let mut params = Params::default();
        params.traj_bank.max_angle_deg = 25;

        assert!(params.validate().is_err());
    }

    #[test]
    fn test_from_toml() {
        let params: Params = util::params::from_str(
            r#"
            lane_select = "lane_b"

            [raster]
            width_px = 448
            height_px = 300
            res_m = 0.016601562

            [vehicle]
            width_m = 0.42
            box_length_m = 0.54
            box_dist_m = 0.61

            [traj_bank]
            max_angle_deg = 20
            angle_step_deg = 1
            horizon_m = 1.9
            sample_step_px = 0.5
            decay = 0.9
            clearance_m = 0.007
            rear_ref_offset_m = 0.3

            [drive_enc]
            max_angle_deg = 23.0
            high_pulse = 250.0
            low_pulse = 150.0
            pulse_full_scale = 255.0
            "#,
        )
        .unwrap();

        assert_eq!(params.lane_select, LaneSelectPolicy::LaneB);
        assert_eq!(params.raster.width_px, 448);
        assert!(!params.obs_fusion.enabled);
        assert_eq!(params.obs_fusion.sensors.len(), 4);
    }
}
