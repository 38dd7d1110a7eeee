//! # Drive Equipment Demands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands sent to the actuation driver once per cycle.
///
/// A demand with a zero `pulse_fraction` is a valid stop command, the steering
/// demand is still meaningful in that case.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveDems {
    /// Normalised steering demand between -1 and +1.
    ///
    /// Negative values correspond to positive (rightwards in the rectified
    /// frame) steering angles, as expected by the actuation driver.
    pub turn_fraction: f64,

    /// Normalised drive pulse magnitude between 0 and 1.
    pub pulse_fraction: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl DriveDems {
    /// Returns true if these demands will leave the vehicle stationary.
    pub fn is_stop(&self) -> bool {
        self.pulse_fraction == 0.0
    }
}
