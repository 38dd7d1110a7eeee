//! # Lane following library.
//!
//! This library contains the trajectory-template steering core and the
//! cyclic controller built around it, so that the executable, the diagnostic
//! binaries and the benchmarks can all share it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Frame and mask replay - reads recorded camera frames and perception output from disk
pub mod replay;

/// Executable data store - everything the main loop carries between cycles
pub mod data_store;

/// Command encoder - converts a steering angle into normalised drive demands
pub mod drive_enc;

/// Lane control module - the cyclic steering decision made from each frame
pub mod lane_ctrl;

/// Lane occupancy estimator - decides which detected lane the vehicle is in
pub mod lane_occ;

/// Obstacle fusion - biases lanes using ranging sensor readings
pub mod obs_fusion;

/// Executable parameters
pub mod params;

/// Perception client - the capability interface to the segmentation model
pub mod per_client;

/// Raster geometry shared by every mask and template
pub mod raster;

/// Signal cache - latest values of the asynchronous operator and sensor inputs
pub mod signals;

/// Steering selector - correlates the tracked lane against the template bank
pub mod steer_sel;

/// Trajectory template bank - precomputed footprints for every steering angle
pub mod traj_bank;

/// Vehicle footprint in the rectified frame
pub mod vehicle;

/// Warp transform - rectifies camera frames into the bird's-eye view
pub mod warp;
