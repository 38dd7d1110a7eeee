//! # Lane Executable Parameters
//!
//! This module provide parameters for the lane following executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneExecParams {
    /// Number of control cycles per second
    pub cycle_frequency_hz: f64,

    /// Warp matrix asset, relative to the params directory
    pub warp_matrix_file: String,

    /// Whether the vehicle may drive before the first run message
    pub start_running: bool,

    /// Save the annotated frame every this many cycles, 0 to never save
    pub save_frame_every: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LaneExecParams {
    fn default() -> Self {
        Self {
            cycle_frequency_hz: 15.0,
            warp_matrix_file: "warp_matrix.json".into(),
            start_running: false,
            save_frame_every: 0,
        }
    }
}

impl LaneExecParams {
    /// Target period of one cycle in seconds.
    pub fn cycle_period_s(&self) -> f64 {
        1.0 / self.cycle_frequency_hz
    }

    /// Returns true if the annotated frame should be saved on this cycle.
    pub fn is_save_frame_cycle(&self, num_cycles: u64) -> bool {
        self.save_frame_every != 0 && num_cycles % self.save_frame_every == 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_save_frame_cycle() {
        let mut params = LaneExecParams::default();
        assert!(!params.is_save_frame_cycle(0));

        params.save_frame_every = 15;
        assert!(params.is_save_frame_cycle(0));
        assert!(!params.is_save_frame_cycle(14));
        assert!(params.is_save_frame_cycle(30));
    }

    #[test]
    fn test_cycle_period() {
        let params: LaneExecParams = util::params::from_str(
            r#"
            cycle_frequency_hz = 10.0
            warp_matrix_file = "warp_matrix.json"
            start_running = true
            save_frame_every = 0
            "#,
        )
        .unwrap();

        assert!((params.cycle_period_s() - 0.1).abs() < 1e-12);
        assert!(params.start_running);
    }
}
