//! # Lane control module
//!
//! Makes the steering decision for each camera frame. One cycle rectifies the
//! frame, segments it into lane masks, acquires the tracked lane if needed,
//! selects the best matching trajectory template and encodes the drive
//! demands.
//!
//! Failures within a cycle are never returned to the caller. They raise the
//! fault flag for that cycle, which stops the vehicle, and the next cycle
//! starts afresh.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod annotate;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use annotate::*;
pub use params::*;
pub use state::*;

use crate::{per_client::PerError, traj_bank::TrajBankError, warp::WarpError};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LaneCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum LaneCtrlError {
    // ---- INITIALISATION ----
    #[error("Invalid lane control parameters: {0}")]
    InvalidParams(String),

    #[error("Cannot build the trajectory template bank: {0}")]
    TrajBankError(TrajBankError),

    #[error("Cannot use the warp matrix: {0}")]
    WarpInitError(WarpError),

    #[error("Cannot create the lane control archives: {0}")]
    ArchiveError(String),

    // ---- CYCLE ----
    #[error("No camera frame was available this cycle")]
    NoFrame,

    #[error("Cannot rectify the camera frame: {0}")]
    RectifyError(WarpError),

    #[error("Perception failed: {0}")]
    PerceptionError(PerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LaneCtrlError {
    /// Fault cause for errors occuring within a cycle.
    pub fn fault_cause(&self) -> Option<FaultCause> {
        match self {
            LaneCtrlError::NoFrame => Some(FaultCause::NoFrame),
            LaneCtrlError::RectifyError(_) => Some(FaultCause::RectifyFailed),
            LaneCtrlError::PerceptionError(_) => Some(FaultCause::PerceptionFailed),
            _ => None,
        }
    }
}
