//! Implementations for the LaneCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use comms_if::eqpt::{drive::DriveDems, lane::LaneId, range::RangeReadings};
use image::RgbImage;
use log::{debug, info, trace, warn};
use nalgebra::Matrix3;
use serde::Serialize;

// Internal
use super::{annotate, LaneCtrlError, Params};
use crate::{
    drive_enc,
    lane_occ::{self, LaneSelectPolicy},
    obs_fusion::{ObsBias, ObsFusion},
    per_client::{LaneMasks, Segmenter},
    steer_sel::{self, Selection},
    traj_bank::TrajBank,
    vehicle::{VehicleBox, VehicleFootprint},
    warp::Warper,
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lane control module state
pub struct LaneCtrl {
    params: Params,

    warper: Warper,
    segmenter: Box<dyn Segmenter>,
    vehicle_box: VehicleBox,
    bank: TrajBank,
    obs_fusion: ObsFusion,

    /// State carried between cycles
    track: TrackState,

    report: StatusReport,
    output_dems: DriveDems,
    arch_report: Archiver,
    arch_obs: Archiver,
}

/// Everything needed to build the module.
pub struct InitData {
    pub params: Params,

    /// Camera to rectified frame homography
    pub warp_matrix: Matrix3<f64>,

    /// The perception model
    pub segmenter: Box<dyn Segmenter>,
}

/// Input data to lane control.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    /// The camera frame for this cycle, if one was acquired
    pub frame: Option<RgbImage>,

    /// Latest run signal
    pub running: bool,

    /// Latest ranging sensor readings
    pub ranges: RangeReadings,
}

/// Output from lane control.
#[derive(Debug, Clone, Default)]
pub struct OutputData {
    /// Demands for the actuation driver, emitted every cycle
    pub dems: DriveDems,

    /// Rectified frame with the lanes painted on, if the frame could be
    /// rectified
    pub annotated: Option<RgbImage>,
}

/// State carried from one cycle to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackState {
    pub tracked_lane: TrackedLane,

    /// Set if the last cycle was faulty
    pub fault: bool,
}

/// Result of a single steering decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub selection: Selection,
    pub dems: DriveDems,

    /// Set on the cycle the tracked lane is acquired
    pub acquisition: Option<Acquisition>,
}

/// Lane probabilities at the moment the tracked lane was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Acquisition {
    pub prob_a: f64,
    pub prob_b: f64,
    pub lane: LaneId,
}

/// Status report for LaneCtrl processing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub tracked_lane: TrackedLane,
    pub fault_cause: Option<FaultCause>,
    pub selection: Selection,
    pub lane_a_px: usize,
    pub lane_b_px: usize,
    pub acquisition: Option<Acquisition>,
    pub obs_biases: Vec<ObsBias>,
}

/// Flat status report row for the CSV archive.
#[derive(Serialize)]
struct ReportRecord {
    time_s: f64,
    tracked_lane: TrackedLane,
    fault_cause: Option<FaultCause>,
    angle_deg: i32,
    score: u64,
    lane_a_px: usize,
    lane_b_px: usize,
    turn_fraction: f64,
    pulse_fraction: f64,
}

/// Obstacle fusion archive row, one per sensor.
#[derive(Serialize)]
struct ObsRecord {
    time_s: f64,
    sensor: usize,
    distance_mm: f64,
    lane_a: f64,
    lane_b: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The lane the vehicle follows.
///
/// Set once when lane pixels are first seen and kept for the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackedLane {
    Unassigned,
    LaneA,
    LaneB,
}

/// Reason for a faulty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultCause {
    NoFrame,
    RectifyFailed,
    PerceptionFailed,
    NoLanePixels,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TrackedLane {
    fn default() -> Self {
        TrackedLane::Unassigned
    }
}

impl TrackedLane {
    pub fn lane(&self) -> Option<LaneId> {
        match self {
            TrackedLane::Unassigned => None,
            TrackedLane::LaneA => Some(LaneId::A),
            TrackedLane::LaneB => Some(LaneId::B),
        }
    }
}

impl From<LaneId> for TrackedLane {
    fn from(lane: LaneId) -> Self {
        match lane {
            LaneId::A => TrackedLane::LaneA,
            LaneId::B => TrackedLane::LaneB,
        }
    }
}

impl State for LaneCtrl {
    type InitData = InitData;
    type InitError = LaneCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = LaneCtrlError;

    /// Initialise the LaneCtrl module and its archives.
    fn init(init_data: Self::InitData, session: &Session) -> Result<Self, Self::InitError> {
        let mut lane_ctrl = Self::new(init_data)?;

        lane_ctrl.arch_report = Archiver::from_path(session, "lane_ctrl/status_report.csv")
            .map_err(|e| LaneCtrlError::ArchiveError(e.to_string()))?;

        if lane_ctrl.obs_fusion.is_enabled() {
            lane_ctrl.arch_obs = Archiver::from_path(session, "lane_ctrl/obs_bias.csv")
                .map_err(|e| LaneCtrlError::ArchiveError(e.to_string()))?;
        }

        Ok(lane_ctrl)
    }

    /// Perform cyclic processing of lane control.
    ///
    /// Cycle errors are folded into the fault flag, this never fails.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let mut report = StatusReport::default();

        // Rectify and segment, falling back to empty masks
        let rectified = match input_data.frame {
            Some(ref f) => self
                .warper
                .rectify(f)
                .map_err(LaneCtrlError::RectifyError)
                .map_err(|e| record_fault(&mut report, e))
                .ok(),
            None => {
                record_fault(&mut report, LaneCtrlError::NoFrame);
                None
            }
        };

        // Keep the perception source in step with the camera
        if rectified.is_none() {
            self.segmenter.skip();
        }

        let masks = match rectified {
            Some(ref r) => self
                .perceive(r)
                .map_err(|e| record_fault(&mut report, e))
                .ok(),
            None => None,
        };

        let upstream_fault = masks.is_none();
        let masks = masks.unwrap_or_else(|| LaneMasks::empty(&self.params.raster));

        let (track, decision) = self.step(self.track, &masks, input_data.running, upstream_fault);
        self.track = track;

        if track.fault && report.fault_cause.is_none() {
            report.fault_cause = Some(FaultCause::NoLanePixels);
        }

        // Diagnostics, independent of the demands
        let annotated = rectified.as_ref().map(|r| annotate(r, &masks));

        if self.obs_fusion.is_enabled() {
            report.obs_biases = self.obs_fusion.calculate(&input_data.ranges, &masks);
        }

        let (lane_a_px, lane_b_px) = masks.num_px();
        report.tracked_lane = track.tracked_lane;
        report.selection = decision.selection;
        report.lane_a_px = lane_a_px;
        report.lane_b_px = lane_b_px;
        report.acquisition = decision.acquisition;

        trace!(
            "LaneCtrl: lane {:?}, angle {:+} deg (score {}), dems {:?}",
            track.tracked_lane,
            decision.selection.angle_deg,
            decision.selection.score,
            decision.dems
        );

        self.report = report.clone();
        self.output_dems = decision.dems;

        Ok((
            OutputData {
                dems: decision.dems,
                annotated,
            },
            report,
        ))
    }
}

impl Archived for LaneCtrl {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let time_s = session::get_elapsed_seconds();

        self.arch_report.serialise(ReportRecord {
            time_s,
            tracked_lane: self.report.tracked_lane,
            fault_cause: self.report.fault_cause,
            angle_deg: self.report.selection.angle_deg,
            score: self.report.selection.score,
            lane_a_px: self.report.lane_a_px,
            lane_b_px: self.report.lane_b_px,
            turn_fraction: self.output_dems.turn_fraction,
            pulse_fraction: self.output_dems.pulse_fraction,
        })?;

        for (sensor, bias) in self.report.obs_biases.iter().enumerate() {
            self.arch_obs.serialise(ObsRecord {
                time_s,
                sensor,
                distance_mm: bias.distance_mm,
                lane_a: bias.lane_a,
                lane_b: bias.lane_b,
            })?;
        }

        Ok(())
    }
}

impl LaneCtrl {
    /// Build the module without any archive.
    ///
    /// The template bank is built here, before the first cycle.
    pub fn new(init_data: InitData) -> Result<Self, LaneCtrlError> {
        let InitData {
            params,
            warp_matrix,
            segmenter,
        } = init_data;

        params.validate().map_err(LaneCtrlError::InvalidParams)?;

        let raster = params.raster;

        let warper = Warper::new(warp_matrix, raster.width_px as u32, raster.height_px as u32)
            .map_err(LaneCtrlError::WarpInitError)?;

        let footprint = VehicleFootprint::new(&raster, &params.vehicle);
        let vehicle_box = VehicleBox::new(&raster, &footprint);
        debug!(
            "Vehicle box: rows {:?}, cols {:?}",
            vehicle_box.rows(),
            vehicle_box.cols()
        );

        let bank = TrajBank::new(&raster, &params.vehicle, &params.traj_bank)
            .map_err(LaneCtrlError::TrajBankError)?;

        let obs_fusion = ObsFusion::new(&raster, &footprint, params.obs_fusion.clone());

        if params.lane_select.is_fixed() {
            warn!(
                "Lane selection policy is {:?}, lane occupancy will be ignored",
                params.lane_select
            );
        }

        Ok(Self {
            params,
            warper,
            segmenter,
            vehicle_box,
            bank,
            obs_fusion,
            track: TrackState::default(),
            report: StatusReport::default(),
            output_dems: DriveDems::default(),
            arch_report: Archiver::default(),
            arch_obs: Archiver::default(),
        })
    }

    /// Current cross-cycle state.
    pub fn track_state(&self) -> TrackState {
        self.track
    }

    pub fn bank(&self) -> &TrajBank {
        &self.bank
    }

    /// Make one steering decision from the lane masks.
    ///
    /// This is a pure function of its inputs: the tracked lane is acquired
    /// the first time lane pixels are present and held afterwards, the fault
    /// flag is raised if there are no lane pixels or `upstream_fault` is set.
    pub fn step(
        &self,
        state: TrackState,
        masks: &LaneMasks,
        running: bool,
        upstream_fault: bool,
    ) -> (TrackState, Decision) {
        let total_px = masks.total_px();
        let fault = upstream_fault || total_px == 0;

        let mut tracked_lane = state.tracked_lane;
        let mut acquisition = None;

        if tracked_lane == TrackedLane::Unassigned && total_px > 0 {
            let acq = self.acquire(masks);
            tracked_lane = acq.lane.into();
            acquisition = Some(acq);
        }

        let selection = match tracked_lane.lane() {
            Some(lane) => steer_sel::select_angle(masks.get(lane), &self.bank),
            None => Selection::default(),
        };

        let dems = drive_enc::encode(selection.angle_deg, running, fault, &self.params.drive_enc);

        (
            TrackState {
                tracked_lane,
                fault,
            },
            Decision {
                selection,
                dems,
                acquisition,
            },
        )
    }

    fn acquire(&self, masks: &LaneMasks) -> Acquisition {
        let prob_a = lane_occ::lane_probability(&self.vehicle_box, &masks.lane_a);
        let prob_b = lane_occ::lane_probability(&self.vehicle_box, &masks.lane_b);
        let lane = lane_occ::select_lane(self.params.lane_select, prob_a, prob_b);

        match self.params.lane_select {
            LaneSelectPolicy::Occupancy => info!(
                "Tracking lane {:?} (occupancy A: {:.3}, B: {:.3})",
                lane, prob_a, prob_b
            ),
            policy => warn!(
                "Tracking lane {:?} fixed by the {:?} policy (occupancy A: {:.3}, B: {:.3})",
                lane, policy, prob_a, prob_b
            ),
        }

        Acquisition {
            prob_a,
            prob_b,
            lane,
        }
    }

    fn perceive(&mut self, rectified: &RgbImage) -> Result<LaneMasks, LaneCtrlError> {
        let labels = self
            .segmenter
            .segment(rectified)
            .map_err(LaneCtrlError::PerceptionError)?;

        LaneMasks::from_class_image(&labels, &self.params.raster)
            .map_err(LaneCtrlError::PerceptionError)
    }
}

/// Log a recoverable cycle error and note its cause in the report.
fn record_fault(report: &mut StatusReport, error: LaneCtrlError) {
    warn!("LaneCtrl cycle fault: {}", error);
    report.fault_cause = error.fault_cause();
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::per_client::PerError;
    use image::{GrayImage, Luma};
    use ndarray::s;

    /// Segmenter returning a fixed label raster, or failing if it has none.
    struct MockSegmenter(Option<GrayImage>);

    impl Segmenter for MockSegmenter {
        fn segment(&mut self, _frame: &RgbImage) -> Result<GrayImage, PerError> {
            self.0
                .clone()
                .ok_or_else(|| PerError::ModelError("mock failure".into()))
        }
    }

    fn lane_ctrl(params: Params, labels: Option<GrayImage>) -> LaneCtrl {
        LaneCtrl::new(InitData {
            params,
            warp_matrix: Matrix3::identity(),
            segmenter: Box::new(MockSegmenter(labels)),
        })
        .unwrap()
    }

    /// Labels with lane A over the vehicle box columns and lane B to the left.
    fn strip_labels() -> GrayImage {
        GrayImage::from_fn(448, 300, |x, _| match x {
            212..=235 => Luma([1]),
            100..=180 => Luma([2]),
            _ => Luma([0]),
        })
    }

    fn input(running: bool) -> InputData {
        InputData {
            frame: Some(RgbImage::new(448, 300)),
            running,
            ranges: RangeReadings::no_echo(4),
        }
    }

    #[test]
    fn test_step_acquires_once() {
        let params = Params::default();
        let ctrl = lane_ctrl(params.clone(), None);

        let mut masks = LaneMasks::empty(&params.raster);
        masks.lane_a.slice_mut(s![.., 212..236]).fill(true);

        let (state, decision) = ctrl.step(TrackState::default(), &masks, true, false);

        assert_eq!(state.tracked_lane, TrackedLane::LaneA);
        assert!(!state.fault);
        let acq = decision.acquisition.unwrap();
        assert_eq!(acq.lane, LaneId::A);
        assert_eq!((acq.prob_a, acq.prob_b), (1.0, 0.0));
        assert_eq!(decision.selection.angle_deg, 0);

        // Lane B now covers the vehicle, the tracked lane does not change
        let mut masks = LaneMasks::empty(&params.raster);
        masks.lane_a.slice_mut(s![.., 0..100]).fill(true);
        masks.lane_b.slice_mut(s![.., 212..236]).fill(true);

        let (state, decision) = ctrl.step(state, &masks, true, false);

        assert_eq!(state.tracked_lane, TrackedLane::LaneA);
        assert!(decision.acquisition.is_none());
    }

    #[test]
    fn test_step_no_lane_pixels() {
        let params = Params::default();
        let ctrl = lane_ctrl(params.clone(), None);

        let (state, decision) =
            ctrl.step(TrackState::default(), &LaneMasks::empty(&params.raster), true, false);

        assert_eq!(state.tracked_lane, TrackedLane::Unassigned);
        assert!(state.fault);
        assert_eq!(decision.selection, Selection::default());
        assert!(decision.dems.is_stop());
        assert_eq!(decision.dems.turn_fraction, 0.0);
    }

    #[test]
    fn test_step_fault_clears() {
        let params = Params::default();
        let ctrl = lane_ctrl(params.clone(), None);

        let mut masks = LaneMasks::empty(&params.raster);
        masks.lane_b.slice_mut(s![.., 212..236]).fill(true);

        let faulty = TrackState {
            tracked_lane: TrackedLane::LaneB,
            fault: true,
        };
        let (state, decision) = ctrl.step(faulty, &masks, true, false);

        assert!(!state.fault);
        assert_eq!(decision.dems.pulse_fraction, 250.0 / 255.0);
    }

    #[test]
    fn test_proc_straight_strip() {
        let mut ctrl = lane_ctrl(Params::default(), Some(strip_labels()));

        let (output, report) = ctrl.proc(&input(true)).unwrap();

        assert_eq!(report.tracked_lane, TrackedLane::LaneA);
        assert_eq!(report.fault_cause, None);
        assert_eq!(report.selection.angle_deg, 0);
        assert_eq!(report.lane_a_px, 24 * 300);
        assert_eq!(output.dems.turn_fraction, 0.0);
        assert_eq!(output.dems.pulse_fraction, 250.0 / 255.0);
        assert!(output.annotated.is_some());
        assert!(report.obs_biases.is_empty());

        // Stopping keeps the steering but zeroes the pulse
        let (output, _) = ctrl.proc(&input(false)).unwrap();
        assert!(output.dems.is_stop());
    }

    #[test]
    fn test_proc_fixed_lane_policy() {
        let params = Params {
            lane_select: LaneSelectPolicy::LaneB,
            ..Default::default()
        };
        let mut ctrl = lane_ctrl(params, Some(strip_labels()));

        let (_, report) = ctrl.proc(&input(true)).unwrap();

        assert_eq!(report.tracked_lane, TrackedLane::LaneB);
        assert_eq!(report.acquisition.unwrap().prob_a, 1.0);
    }

    #[test]
    fn test_proc_faults() {
        // Perception failure
        let mut ctrl = lane_ctrl(Params::default(), None);
        let (output, report) = ctrl.proc(&input(true)).unwrap();

        assert_eq!(report.fault_cause, Some(FaultCause::PerceptionFailed));
        assert!(output.dems.is_stop());
        assert!(ctrl.track_state().fault);

        // No frame
        let mut ctrl = lane_ctrl(Params::default(), Some(strip_labels()));
        let no_frame = InputData {
            frame: None,
            ..input(true)
        };
        let (output, report) = ctrl.proc(&no_frame).unwrap();

        assert_eq!(report.fault_cause, Some(FaultCause::NoFrame));
        assert!(output.dems.is_stop());
        assert!(output.annotated.is_none());

        // Background only
        let mut ctrl = lane_ctrl(Params::default(), Some(GrayImage::new(448, 300)));
        let (output, report) = ctrl.proc(&input(true)).unwrap();

        assert_eq!(report.fault_cause, Some(FaultCause::NoLanePixels));
        assert!(output.dems.is_stop());
    }

    #[test]
    fn test_invalid_params() {
        let mut params = Params::default();
        params.drive_enc.max_angle_deg = 0.0;

        let result = LaneCtrl::new(InitData {
            params,
            warp_matrix: Matrix3::identity(),
            segmenter: Box::new(MockSegmenter(None)),
        });

        assert!(matches!(result, Err(LaneCtrlError::InvalidParams(_))));
    }
}
