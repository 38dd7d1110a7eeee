//! # Operator Control Messages
//!
//! Plain text messages used to drive the executable from a terminal or a
//! pipe, one message per line:
//!
//! - `run` - assert the run signal
//! - `stop` - release the run signal, the vehicle stops but keeps steering
//! - `ranges <mm> <mm> ...` - inject ranging sensor distances
//! - `quit` - shut down between two cycles

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::str::FromStr;
use thiserror::Error;

use crate::eqpt::range::RangeReadings;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A message from the operator.
#[derive(Debug, Clone, PartialEq)]
pub enum CtrlMsg {
    Run,
    Stop,
    Ranges(RangeReadings),
    Quit,
}

/// Possible parsing errors.
#[derive(Debug, Error, PartialEq)]
pub enum CtrlParseError {
    #[error("Empty control message")]
    Empty,

    #[error("{0:?} is not a recognised control message")]
    UnknownMsg(String),

    #[error("Invalid distance in ranges message: {0:?}")]
    InvalidDistance(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FromStr for CtrlMsg {
    type Err = CtrlParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();

        let keyword = match words.next() {
            Some(k) => k.to_lowercase(),
            None => return Err(CtrlParseError::Empty),
        };

        match keyword.as_str() {
            "run" => Ok(CtrlMsg::Run),
            "stop" => Ok(CtrlMsg::Stop),
            "quit" => Ok(CtrlMsg::Quit),
            "ranges" => {
                let distances_mm = words
                    .map(|w| match w.parse::<f64>() {
                        Ok(d) if d.is_finite() => Ok(d),
                        _ => Err(CtrlParseError::InvalidDistance(w.to_string())),
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(CtrlMsg::Ranges(RangeReadings { distances_mm }))
            }
            _ => Err(CtrlParseError::UnknownMsg(keyword)),
        }
    }
}
