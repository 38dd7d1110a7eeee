//! # Communications interface crate.
//!
//! Provides the data exchanged between the lane following core and its
//! external collaborators: the perception model, the actuation driver, the
//! ranging sensors and the operator's run/stop control.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator control messages (run/stop, sensor injection, shutdown)
pub mod ctrl;

/// Definitions for equipment data (drive demands, lane labels, ranging)
pub mod eqpt;
