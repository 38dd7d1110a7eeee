//! # Signal Cache
//!
//! The run signal and the ranging readings arrive asynchronously to the frame
//! cycle. They are kept as latest values which the main loop reads at the
//! start of each cycle, without ever waiting for a new value.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::{ctrl::CtrlMsg, eqpt::range::RangeReadings};
use log::{info, warn};
use std::{
    io::BufRead,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A shared cell holding the latest value of a signal.
#[derive(Debug, Default)]
pub struct Latest<T>(Arc<Mutex<T>>);

/// Every asynchronous input of the executable.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    /// Run signal, the vehicle only drives while set
    pub running: Latest<bool>,

    /// Latest ranging sensor readings
    pub ranges: Latest<RangeReadings>,

    /// Set when a shutdown has been requested
    pub quit: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Cannot start the control reader thread: {0}")]
    SpawnError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Latest<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Mutex::new(value)))
    }

    /// Replace the value.
    pub fn set(&self, value: T) {
        *self.lock() = value;
    }

    // Values are replaced whole, a poisoned lock still holds a valid value
    fn lock(&self) -> MutexGuard<'_, T> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<T: Clone> Latest<T> {
    /// Get a copy of the value.
    pub fn get(&self) -> T {
        self.lock().clone()
    }
}

impl Signals {
    pub fn new(start_running: bool, num_sensors: usize) -> Self {
        Self {
            running: Latest::new(start_running),
            ranges: Latest::new(RangeReadings::no_echo(num_sensors)),
            quit: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Update the signals from an operator message.
    pub fn apply(&self, msg: CtrlMsg) {
        match msg {
            CtrlMsg::Run => {
                info!("Run signal received");
                self.running.set(true);
            }
            CtrlMsg::Stop => {
                info!("Stop signal received");
                self.running.set(false);
            }
            CtrlMsg::Ranges(r) => self.ranges.set(r),
            CtrlMsg::Quit => {
                info!("Shutdown requested");
                self.quit.store(true, Ordering::Relaxed);
            }
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Apply every message read from `reader` until it ends or a quit message is
/// read. Lines which are not valid messages are logged and skipped.
pub fn read_ctrl<R: BufRead>(reader: R, signals: &Signals) {
    for line in reader.lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Cannot read control input: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<CtrlMsg>() {
            Ok(msg) => {
                let quit = msg == CtrlMsg::Quit;
                signals.apply(msg);
                if quit {
                    return;
                }
            }
            Err(e) => warn!("Ignoring control input: {}", e),
        }
    }

    info!("Control input closed");
}

/// Start a background thread reading operator messages from stdin.
pub fn spawn_stdin_reader(signals: Signals) -> Result<JoinHandle<()>, SignalError> {
    thread::Builder::new()
        .name("ctrl_reader".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            read_ctrl(stdin.lock(), &signals)
        })
        .map_err(SignalError::SpawnError)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_latest_shared() {
        let a = Latest::new(1u32);
        let b = a.clone();

        b.set(5);
        assert_eq!(a.get(), 5);

        let c = a.clone();
        thread::spawn(move || c.set(9)).join().unwrap();
        assert_eq!(b.get(), 9);
    }

    #[test]
    fn test_read_ctrl() {
        let signals = Signals::new(false, 4);
        let input = "run\n\nbogus\nranges 100 200 300 400\nquit\nstop\n";

        read_ctrl(input.as_bytes(), &signals);

        // Reading stops at quit, so the stop is never applied
        assert!(signals.running.get());
        assert!(signals.quit_requested());
        assert_eq!(
            signals.ranges.get().distances_mm,
            vec![100.0, 200.0, 300.0, 400.0]
        );
    }

    #[test]
    fn test_initial_signals() {
        let signals = Signals::new(true, 2);

        assert!(signals.running.get());
        assert!(!signals.quit_requested());
        assert_eq!(signals.ranges.get(), RangeReadings::no_echo(2));
    }
}
