//! # Equipment Interface
//!
//! This module defines the interface structures which are exchanged with the
//! equipment around the lane following core.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod drive;
pub mod lane;
pub mod range;
