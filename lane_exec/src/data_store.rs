//! # Data Store
//!
//! Everything the main loop carries from one cycle to the next, apart from the
//! modules themselves.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::drive::DriveDems;
use log::{info, warn};
use serde::Serialize;

use crate::{lane_ctrl, signals::Signals};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Global data store for the executable.
#[derive(Debug, Default)]
pub struct DataStore {
    // Cycle management
    /// Number of cycles already executed
    pub num_cycles: u64,

    /// Session elapsed time at the start of the cycle
    pub time_s: f64,

    // Signals
    /// Run signal as read at the start of the cycle
    pub running: bool,

    // LaneCtrl
    pub lane_ctrl_input: lane_ctrl::InputData,
    pub lane_ctrl_output: lane_ctrl::OutputData,
    pub lane_ctrl_status_rpt: lane_ctrl::StatusReport,

    // Monitoring Counters
    /// Number of consecutive cycle overruns
    pub num_consec_cycle_overruns: u64,

    /// Number of consecutive faulty cycles
    pub num_consec_faults: u64,
}

/// Drive demands archive row.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DemsRecord {
    pub time_s: f64,
    pub cycle: u64,
    pub running: bool,
    pub turn_fraction: f64,
    pub pulse_fraction: f64,
}

// ---------------------------------------------------------------------------
// IMPLS
// ---------------------------------------------------------------------------

impl DataStore {
    /// Perform actions required at the start of a cycle.
    ///
    /// Clears the previous cycle's data and latches the asynchronous signals
    /// for this cycle.
    pub fn cycle_start(&mut self, signals: &Signals) {
        let running = signals.running.get();
        if running != self.running {
            info!("Run signal is now {}", running);
        }
        self.running = running;

        self.lane_ctrl_input = lane_ctrl::InputData {
            frame: None,
            running,
            ranges: signals.ranges.get(),
        };
        self.lane_ctrl_output = lane_ctrl::OutputData::default();
        self.lane_ctrl_status_rpt = lane_ctrl::StatusReport::default();

        self.time_s = util::session::get_elapsed_seconds();
    }

    /// Perform actions required at the end of a cycle.
    pub fn cycle_end(&mut self) {
        if self.lane_ctrl_status_rpt.fault_cause.is_some() {
            self.num_consec_faults += 1;
        } else {
            if self.num_consec_faults > 0 {
                info!("Recovered after {} faulty cycles", self.num_consec_faults);
            }
            self.num_consec_faults = 0;
        }

        // Warn once per series of faults
        if self.num_consec_faults == 1 {
            warn!(
                "Vehicle stopped, cause: {:?}",
                self.lane_ctrl_status_rpt.fault_cause
            );
        }

        self.num_cycles += 1;
    }

    /// The drive demands of this cycle as an archive row.
    pub fn dems_record(&self) -> DemsRecord {
        let DriveDems {
            turn_fraction,
            pulse_fraction,
        } = self.lane_ctrl_output.dems;

        DemsRecord {
            time_s: self.time_s,
            cycle: self.num_cycles,
            running: self.running,
            turn_fraction,
            pulse_fraction,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lane_ctrl::FaultCause;

    #[test]
    fn test_cycle_start_latches_signals() {
        let signals = Signals::new(true, 2);
        let mut ds = DataStore::default();

        ds.cycle_start(&signals);
        signals.running.set(false);

        assert!(ds.running);
        assert!(ds.lane_ctrl_input.running);
        assert_eq!(ds.lane_ctrl_input.ranges.distances_mm.len(), 2);
    }

    #[test]
    fn test_fault_counter() {
        let mut ds = DataStore::default();

        ds.lane_ctrl_status_rpt.fault_cause = Some(FaultCause::NoLanePixels);
        ds.cycle_end();
        ds.cycle_end();
        assert_eq!(ds.num_consec_faults, 2);

        ds.lane_ctrl_status_rpt.fault_cause = None;
        ds.cycle_end();
        assert_eq!(ds.num_consec_faults, 0);
        assert_eq!(ds.num_cycles, 3);
    }
}
