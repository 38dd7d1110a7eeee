//! # Ranging Sensor Data

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Distance reported by a sensor which has no echo.
///
/// Units: millimeters
pub const NO_ECHO_MM: f64 = 9999.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Latest distances measured by the ranging sensors, one per sensor in the
/// mounting order given in the parameters.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RangeReadings {
    /// Units: millimeters
    pub distances_mm: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RangeReadings {
    /// Readings for `num_sensors` sensors none of which see anything.
    pub fn no_echo(num_sensors: usize) -> Self {
        Self {
            distances_mm: vec![NO_ECHO_MM; num_sensors],
        }
    }

    /// Iterate over the readings, giving `None` for those further than
    /// `max_range_mm`.
    pub fn within(&self, max_range_mm: f64) -> impl Iterator<Item = Option<f64>> + '_ {
        self.distances_mm
            .iter()
            .map(move |&d| if d > max_range_mm { None } else { Some(d) })
    }
}
