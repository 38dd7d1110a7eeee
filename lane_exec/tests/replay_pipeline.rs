//! Drives lane control from frames and label rasters replayed from disk.

use comms_if::eqpt::{drive::DriveDems, range::RangeReadings};
use image::{GrayImage, Luma, RgbImage};
use lane_lib::{
    lane_ctrl::{FaultCause, InitData, InputData, LaneCtrl, Params, TrackedLane},
    replay::{ReplayCam, ReplaySegmenter},
};
use nalgebra::Matrix3;
use std::path::PathBuf;
use util::module::State;

fn replay_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "lane_exec_pipeline_{}_{}",
        name,
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Labels with lane A straight over the vehicle and lane B to its left.
fn straight_labels() -> GrayImage {
    GrayImage::from_fn(448, 300, |x, _| match x {
        212..=235 => Luma([1]),
        100..=180 => Luma([2]),
        _ => Luma([0]),
    })
}

#[test]
fn test_replay_pipeline() {
    let frames_dir = replay_dir("frames");
    let labels_dir = replay_dir("labels");

    for i in 0..3 {
        RgbImage::new(448, 300)
            .save(frames_dir.join(format!("frame_{:03}.png", i)))
            .unwrap();
    }

    // One label raster fewer than there are frames
    for i in 0..2 {
        straight_labels()
            .save(labels_dir.join(format!("label_{:03}.png", i)))
            .unwrap();
    }

    let cam = ReplayCam::open(&frames_dir).unwrap();
    assert_eq!(cam.remaining(), 3);

    let mut lane_ctrl = LaneCtrl::new(InitData {
        params: Params::default(),
        warp_matrix: Matrix3::identity(),
        segmenter: Box::new(ReplaySegmenter::open(&labels_dir).unwrap()),
    })
    .unwrap();

    let mut dems: Vec<DriveDems> = Vec::new();
    let mut causes: Vec<Option<FaultCause>> = Vec::new();

    for frame in cam {
        let input = InputData {
            frame: Some(frame.unwrap()),
            running: true,
            ranges: RangeReadings::no_echo(4),
        };

        let (output, report) = lane_ctrl.proc(&input).unwrap();

        assert_eq!(report.tracked_lane, TrackedLane::LaneA);
        dems.push(output.dems);
        causes.push(report.fault_cause);
    }

    assert_eq!(dems.len(), 3);

    // Straight ahead at full speed while labels are available
    for d in &dems[..2] {
        assert_eq!(d.turn_fraction, 0.0);
        assert_eq!(d.pulse_fraction, 250.0 / 255.0);
    }
    assert_eq!(causes[..2], [None, None]);

    // Exhausted labels stop the vehicle but keep the tracked lane
    assert!(dems[2].is_stop());
    assert_eq!(causes[2], Some(FaultCause::PerceptionFailed));

    std::fs::remove_dir_all(frames_dir).ok();
    std::fs::remove_dir_all(labels_dir).ok();
}

/// Labels with a lane A strip of the given width starting under the vehicle.
fn strip_labels(width: u32) -> GrayImage {
    GrayImage::from_fn(448, 300, |x, _| {
        if x >= 212 && x < 212 + width {
            Luma([1])
        } else {
            Luma([0])
        }
    })
}

#[test]
fn test_unreadable_frame_keeps_labels_in_step() {
    let frames_dir = replay_dir("bad_frames");
    let labels_dir = replay_dir("bad_labels");

    RgbImage::new(448, 300)
        .save(frames_dir.join("frame_000.png"))
        .unwrap();
    std::fs::write(frames_dir.join("frame_001.png"), "corrupt").unwrap();
    RgbImage::new(448, 300)
        .save(frames_dir.join("frame_002.png"))
        .unwrap();

    for (i, width) in [10, 20, 30].iter().enumerate() {
        strip_labels(*width)
            .save(labels_dir.join(format!("label_{:03}.png", i)))
            .unwrap();
    }

    let mut lane_ctrl = LaneCtrl::new(InitData {
        params: Params::default(),
        warp_matrix: Matrix3::identity(),
        segmenter: Box::new(ReplaySegmenter::open(&labels_dir).unwrap()),
    })
    .unwrap();

    let mut lane_a_px = Vec::new();
    let mut causes = Vec::new();

    for frame in ReplayCam::open(&frames_dir).unwrap() {
        let input = InputData {
            frame: frame.ok(),
            running: true,
            ranges: RangeReadings::no_echo(4),
        };

        let (_, report) = lane_ctrl.proc(&input).unwrap();
        lane_a_px.push(report.lane_a_px);
        causes.push(report.fault_cause);
    }

    assert_eq!(lane_a_px, vec![10 * 300, 0, 30 * 300]);
    assert_eq!(causes, vec![None, Some(FaultCause::NoFrame), None]);

    std::fs::remove_dir_all(frames_dir).ok();
    std::fs::remove_dir_all(labels_dir).ok();
}
