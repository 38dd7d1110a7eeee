//! Main lane following executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules, including the trajectory template bank
//!     - Main loop:
//!         - Latch the run signal and ranging readings
//!         - Acquire a camera frame
//!         - Lane control processing
//!         - Emit and archive the drive demands
//!         - Save diagnostic frames
//!
//! The loop ends when the camera replay runs out of frames, when a quit
//! message is received or when the requested number of cycles has run.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use lane_lib::{
    data_store::DataStore,
    lane_ctrl::{self, LaneCtrl},
    params::LaneExecParams,
    replay::{ReplayCam, ReplaySegmenter},
    signals::{self, Signals},
    warp,
};
use util::{
    archive::{Archived, Archiver},
    host,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Report the run of consecutive overruns once every this many cycles.
const OVERRUN_REPORT_INTERVAL: u64 = 50;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lane following executable.
///
/// Operator messages (`run`, `stop`, `ranges <mm>...`, `quit`) are read from
/// stdin, one per line.
#[derive(Debug, StructOpt)]
#[structopt(name = "lane_exec")]
struct Opt {
    /// Directory of recorded camera frames to replay
    #[structopt(parse(from_os_str))]
    frames_dir: PathBuf,

    /// Directory of segmentation label rasters, one per frame
    #[structopt(long, parse(from_os_str))]
    labels_dir: PathBuf,

    /// Stop after this many cycles
    #[structopt(long)]
    max_cycles: Option<u64>,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("lane_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Lane Following Executable\n");
    info!(
        "Running on: {:#?}",
        host::get_uname().wrap_err("Failed to get host information")?
    );
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI arguments: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let exec_params: LaneExecParams =
        util::params::load("lane_exec.toml").wrap_err("Could not load exec params")?;
    let lane_ctrl_params: lane_ctrl::Params =
        util::params::load("lane_ctrl.toml").wrap_err("Could not load LaneCtrl params")?;

    let warp_matrix_path = util::params::path(&exec_params.warp_matrix_file)
        .wrap_err("Could not locate the warp matrix")?;
    let warp_matrix = warp::load_matrix(&warp_matrix_path)
        .wrap_err("Could not load the warp matrix")?;

    info!("Exec parameters loaded");
    info!("Warp matrix loaded from {:?}", warp_matrix_path);

    // ---- INITIALISE SOURCES ----

    let mut cam = ReplayCam::open(&opt.frames_dir).wrap_err("Failed to open the frame replay")?;
    let segmenter =
        ReplaySegmenter::open(&opt.labels_dir).wrap_err("Failed to open the label replay")?;

    let signals = Signals::new(
        exec_params.start_running,
        lane_ctrl_params.obs_fusion.sensors.len(),
    );
    signals::spawn_stdin_reader(signals.clone()).wrap_err("Failed to start the control reader")?;

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    let mut lane_ctrl = LaneCtrl::init(
        lane_ctrl::InitData {
            params: lane_ctrl_params,
            warp_matrix,
            segmenter: Box::new(segmenter),
        },
        &session,
    )
    .wrap_err("Failed to initialise LaneCtrl")?;
    info!(
        "LaneCtrl init complete, {} templates up to +/-{} deg",
        lane_ctrl.bank().len(),
        lane_ctrl.bank().max_angle_deg()
    );

    let mut arch_dems = Archiver::from_path(&session, "drive_dems.csv")
        .map_err(|e| eyre!("Failed to create the drive demands archive: {}", e))?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s());

    info!(
        "Beginning main loop at {} Hz\n",
        exec_params.cycle_frequency_hz
    );

    loop {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        if signals.quit_requested() {
            info!("Quit requested, stopping");
            break;
        }

        if let Some(max) = opt.max_cycles {
            if ds.num_cycles >= max {
                info!("Reached {} cycles, stopping", max);
                break;
            }
        }

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(&signals);

        // ---- DATA INPUT ----

        ds.lane_ctrl_input.frame = match cam.next() {
            Some(Ok(f)) => Some(f),
            Some(Err(e)) => {
                warn!("Could not read camera frame: {}", e);
                None
            }
            None => {
                info!("End of camera replay, stopping");
                break;
            }
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        match lane_ctrl.proc(&ds.lane_ctrl_input) {
            Ok((o, r)) => {
                ds.lane_ctrl_output = o;
                ds.lane_ctrl_status_rpt = r;
            }
            Err(e) => {
                // Demands stay at their stop default
                warn!("Error during LaneCtrl processing: {}", e)
            }
        };

        // ---- OUTPUT ----

        debug!(
            "Drive demands: turn {:+.3}, pulse {:.3}",
            ds.lane_ctrl_output.dems.turn_fraction, ds.lane_ctrl_output.dems.pulse_fraction
        );

        if let Err(e) = arch_dems.serialise(ds.dems_record()) {
            warn!("Could not archive drive demands: {}", e);
        }

        if let Err(e) = lane_ctrl.write() {
            warn!("Could not archive LaneCtrl: {}", e);
        }

        if exec_params.is_save_frame_cycle(ds.num_cycles) {
            if let Some(ref annotated) = ds.lane_ctrl_output.annotated {
                let path = session
                    .frames_root
                    .join(format!("frame_{:06}.png", ds.num_cycles));

                if let Err(e) = annotated.save(&path) {
                    warn!("Could not save annotated frame to {:?}: {}", path, e);
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        ds.cycle_end();

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;

                if ds.num_consec_cycle_overruns % OVERRUN_REPORT_INTERVAL == 0 {
                    warn!(
                        "{} consecutive cycle overruns",
                        ds.num_consec_cycle_overruns
                    );
                }
            }
        }
    }

    // ---- SHUTDOWN ----

    info!("Ran {} cycles", ds.num_cycles);
    info!("End of execution");

    Ok(())
}
