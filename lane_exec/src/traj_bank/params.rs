//! Parameters structure for the trajectory template bank

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters controlling how the trajectory templates are rasterised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajBankParams {

    // ---- ANGLE RANGE ----

    /// Largest absolute steering angle covered by the bank. The bank spans
    /// `[-max_angle_deg, +max_angle_deg]` inclusive.
    ///
    /// Units: degrees
    pub max_angle_deg: i32,

    /// Step between two consecutive templates. Must divide `max_angle_deg`.
    ///
    /// Units: degrees
    pub angle_step_deg: i32,

    // ---- SAMPLING ----

    /// Forward distance covered by each template.
    ///
    /// Units: meters
    pub horizon_m: f64,

    /// Distance travelled between two footprint samples.
    ///
    /// Units: pixels
    pub sample_step_px: f64,

    /// Exponential decay rate of the footprint intensity with distance.
    ///
    /// Units: 1/meters
    pub decay: f64,

    // ---- FOOTPRINT ----

    /// Lateral clearance added to the vehicle width.
    ///
    /// Units: meters
    pub clearance_m: f64,

    /// Offset of the rear reference point (turning centre) behind the vehicle
    /// box, added to the box distance before halving.
    ///
    /// Units: meters
    pub rear_ref_offset_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrajBankParams {
    fn default() -> Self {
        Self {
            max_angle_deg: 20,
            angle_step_deg: 1,
            horizon_m: 1.9,
            sample_step_px: 0.5,
            decay: 0.9,
            clearance_m: 0.007,
            rear_ref_offset_m: 0.3,
        }
    }
}

impl TrajBankParams {
    /// Number of templates in a bank built with these parameters, or `None`
    /// if the angle range is unusable.
    pub fn num_templates(&self) -> Option<usize> {
        if self.max_angle_deg < 0
            || self.angle_step_deg <= 0
            || self.max_angle_deg % self.angle_step_deg != 0
        {
            return None;
        }

        Some((2 * self.max_angle_deg / self.angle_step_deg) as usize + 1)
    }

    /// Iterate over every angle of the bank, ascending.
    pub fn angles(&self) -> impl Iterator<Item = i32> {
        let step = self.angle_step_deg.max(1) as usize;
        (-self.max_angle_deg..=self.max_angle_deg).step_by(step)
    }
}
