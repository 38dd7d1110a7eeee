//! # Command Encoder
//!
//! Converts the selected steering angle into normalised drive demands. The
//! drive pulse is highest when going straight and lowest at full lock.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveDems;
use serde::{Deserialize, Serialize};
use util::maths::{clamp, lin_map};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Calibration of the actuation driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveEncParams {
    /// Steering angle giving a full turn demand.
    ///
    /// Units: degrees
    pub max_angle_deg: f64,

    /// Drive pulse when going straight.
    pub high_pulse: f64,

    /// Drive pulse at `max_angle_deg`.
    pub low_pulse: f64,

    /// Pulse corresponding to a pulse fraction of 1.
    pub pulse_full_scale: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for DriveEncParams {
    fn default() -> Self {
        Self {
            max_angle_deg: 23.0,
            high_pulse: 250.0,
            low_pulse: 150.0,
            pulse_full_scale: 255.0,
        }
    }
}

impl DriveEncParams {
    /// Returns true if the calibration can be used to encode demands.
    pub fn is_valid(&self) -> bool {
        self.max_angle_deg > 0.0
            && self.pulse_full_scale > 0.0
            && self.low_pulse >= 0.0
            && self.high_pulse >= 0.0
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Encode the steering angle into drive demands.
///
/// The turn fraction is the negated normalised angle. The pulse is forced to
/// zero if the vehicle is not running or the cycle is faulty, the turn
/// fraction is emitted regardless.
pub fn encode(angle_deg: i32, running: bool, fault: bool, params: &DriveEncParams) -> DriveDems {
    let angle = angle_deg as f64;

    let turn_fraction = clamp(&(-angle / params.max_angle_deg), &-1.0, &1.0);

    let pulse = if running && !fault {
        lin_map(
            (0.0, params.max_angle_deg),
            (params.high_pulse, params.low_pulse),
            angle.abs(),
        )
    } else {
        0.0
    };

    DriveDems {
        turn_fraction,
        pulse_fraction: clamp(&(pulse / params.pulse_full_scale), &0.0, &1.0),
    }
}
