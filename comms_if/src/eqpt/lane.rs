//! # Lane Segmentation Labels
//!
//! The perception model labels every pixel of the rectified frame with one of
//! the classes below.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Per-pixel class produced by the perception model.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum LaneClass {
    /// Not part of any lane
    Background,

    /// Pixel of the primary lane region
    LaneA,

    /// Pixel of the secondary lane region
    LaneB,
}

/// Identifies one of the two lanes the model can detect.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Hash, Eq, PartialEq)]
pub enum LaneId {
    A,
    B,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LaneClass {
    /// Get the class for a raw label value, unknown labels are background.
    pub fn from_label(label: u8) -> Self {
        match label {
            1 => LaneClass::LaneA,
            2 => LaneClass::LaneB,
            _ => LaneClass::Background,
        }
    }

    /// Raw label value of this class.
    pub fn label(&self) -> u8 {
        match self {
            LaneClass::Background => 0,
            LaneClass::LaneA => 1,
            LaneClass::LaneB => 2,
        }
    }

    /// The lane this class belongs to, if any.
    pub fn lane(&self) -> Option<LaneId> {
        match self {
            LaneClass::Background => None,
            LaneClass::LaneA => Some(LaneId::A),
            LaneClass::LaneB => Some(LaneId::B),
        }
    }
}
