//! # Obstacle Fusion
//!
//! Projects ranging sensor readings into the rectified raster as gaussian
//! blobs and measures how much of each blob falls on each lane. The result is
//! reported for diagnostics only, it does not affect the steering decision.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::eqpt::range::RangeReadings;
use log::warn;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};
use util::maths::gaussian;

use crate::per_client::LaneMasks;
use crate::raster::RasterParams;
use crate::vehicle::VehicleFootprint;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Mounting of a ranging sensor relative to the centre of the vehicle box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorMount {
    /// Units: meters
    pub forward_m: f64,

    /// Units: meters
    pub left_m: f64,

    /// Beam direction, counter-clockwise from straight ahead.
    ///
    /// Units: radians
    pub beam_rad: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObsFusionParams {
    /// Run the fusion each cycle
    pub enabled: bool,

    /// Readings further than this are ignored.
    ///
    /// Units: millimeters
    pub max_range_mm: f64,

    /// Standard deviation of the obstacle blob.
    ///
    /// Units: meters
    pub sigma_m: f64,

    /// One mount per sensor, in the order of the readings.
    pub sensors: Vec<SensorMount>,
}

/// Lane bias from one sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObsBias {
    /// The reading, passed through unmodified.
    ///
    /// Units: millimeters
    pub distance_mm: f64,

    /// Fraction of the obstacle blob on lane A
    pub lane_a: f64,

    /// Fraction of the obstacle blob on lane B
    pub lane_b: f64,
}

/// Obstacle fusion with the raster geometry resolved.
#[derive(Debug, Clone)]
pub struct ObsFusion {
    params: ObsFusionParams,
    shape: (usize, usize),
    res_m: f64,
    centre_x_px: f64,
    centre_y_px: f64,
    sigma_px: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ObsFusionParams {
    fn default() -> Self {
        use std::f64::consts::FRAC_PI_4;

        Self {
            enabled: false,
            max_range_mm: 4000.0,
            sigma_m: 0.5,
            sensors: vec![
                SensorMount {
                    forward_m: 0.27,
                    left_m: 0.0,
                    beam_rad: 0.0,
                },
                SensorMount {
                    forward_m: 0.27,
                    left_m: 0.15,
                    beam_rad: FRAC_PI_4,
                },
                SensorMount {
                    forward_m: 0.27,
                    left_m: -0.15,
                    beam_rad: -FRAC_PI_4,
                },
                SensorMount {
                    forward_m: 0.0,
                    left_m: 0.21,
                    beam_rad: 2.0 * FRAC_PI_4,
                },
            ],
        }
    }
}

impl ObsBias {
    fn ignored(distance_mm: f64) -> Self {
        Self {
            distance_mm,
            lane_a: 0.0,
            lane_b: 0.0,
        }
    }
}

impl ObsFusion {
    pub fn new(raster: &RasterParams, footprint: &VehicleFootprint, params: ObsFusionParams) -> Self {
        Self {
            shape: raster.shape(),
            res_m: raster.res_m,
            centre_x_px: footprint.centre_x_px as f64,
            centre_y_px: footprint.box_centre_y_px as f64,
            sigma_px: raster.m_to_px(params.sigma_m),
            params,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.params.enabled
    }

    /// Raster position `(col, row)` of an obstacle seen by a sensor.
    pub fn obstacle_px(&self, mount: &SensorMount, distance_mm: f64) -> (f64, f64) {
        let distance_m = distance_mm / 1000.0;
        let forward_m = mount.forward_m + distance_m * mount.beam_rad.cos();
        let left_m = mount.left_m + distance_m * mount.beam_rad.sin();

        (
            self.centre_x_px - left_m / self.res_m,
            self.centre_y_px - forward_m / self.res_m,
        )
    }

    /// Compute the lane bias of every reading which has a matching sensor
    /// mount.
    pub fn calculate(&self, readings: &RangeReadings, masks: &LaneMasks) -> Vec<ObsBias> {
        if readings.distances_mm.len() != self.params.sensors.len() {
            warn!(
                "Got {} range readings for {} sensors, extra readings are ignored",
                readings.distances_mm.len(),
                self.params.sensors.len()
            );
        }

        readings
            .within(self.params.max_range_mm)
            .zip(readings.distances_mm.iter())
            .zip(self.params.sensors.iter())
            .map(|((within, &distance_mm), mount)| match within {
                Some(d) => self.bias(mount, d, masks),
                None => ObsBias::ignored(distance_mm),
            })
            .collect()
    }

    fn bias(&self, mount: &SensorMount, distance_mm: f64, masks: &LaneMasks) -> ObsBias {
        let (obs_x, obs_y) = self.obstacle_px(mount, distance_mm);

        let blob = Array2::from_shape_fn(self.shape, |(y, x)| {
            let dist = (x as f64 - obs_x).hypot(y as f64 - obs_y);
            gaussian(dist, self.sigma_px)
        });

        let (mut sum_blob, mut sum_a, mut sum_b) = (0.0, 0.0, 0.0);
        Zip::from(&blob)
            .and(&masks.lane_a)
            .and(&masks.lane_b)
            .for_each(|&v, &in_a, &in_b| {
                sum_blob += v;
                if in_a {
                    sum_a += v;
                }
                if in_b {
                    sum_b += v;
                }
            });

        if sum_blob <= 0.0 {
            return ObsBias::ignored(distance_mm);
        }

        ObsBias {
            distance_mm,
            lane_a: sum_a / sum_blob,
            lane_b: sum_b / sum_blob,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::vehicle::VehicleParams;
    use comms_if::eqpt::range::NO_ECHO_MM;

    fn default_fusion() -> (RasterParams, ObsFusion) {
        let raster = RasterParams::default();
        let footprint = VehicleFootprint::new(&raster, &VehicleParams::default());
        let params = ObsFusionParams {
            enabled: true,
            ..Default::default()
        };
        (raster, ObsFusion::new(&raster, &footprint, params))
    }

    #[test]
    fn test_obstacle_px() {
        let (raster, fusion) = default_fusion();

        let mount = SensorMount {
            forward_m: 0.0,
            left_m: 0.0,
            beam_rad: 0.0,
        };
        let (x, y) = fusion.obstacle_px(&mount, 1000.0);

        assert_eq!(x, 224.0);
        assert!((y - (282.0 - raster.m_to_px(1.0))).abs() < 1e-9);

        // Obstacles to the left are at lower columns
        let mount = SensorMount {
            beam_rad: std::f64::consts::FRAC_PI_2,
            ..mount
        };
        let (x, _) = fusion.obstacle_px(&mount, 500.0);
        assert!(x < 224.0);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let (raster, fusion) = default_fusion();
        let mut masks = LaneMasks::empty(&raster);
        masks.lane_a.fill(true);

        let readings = RangeReadings {
            distances_mm: vec![NO_ECHO_MM, 4000.1, 1000.0, NO_ECHO_MM],
        };
        let biases = fusion.calculate(&readings, &masks);

        assert_eq!(biases.len(), 4);
        assert_eq!(biases[0], ObsBias::ignored(NO_ECHO_MM));
        assert_eq!(biases[1], ObsBias::ignored(4000.1));
        assert_eq!(biases[3], ObsBias::ignored(NO_ECHO_MM));

        assert_eq!(biases[2].distance_mm, 1000.0);
        assert_eq!(biases[2].lane_a, 1.0);
        assert_eq!(biases[2].lane_b, 0.0);
    }

    #[test]
    fn test_bias_follows_obstacle_side() {
        let (raster, fusion) = default_fusion();

        // Lane A on the left half, lane B on the right half
        let mut masks = LaneMasks::empty(&raster);
        for ((_, x), v) in masks.lane_a.indexed_iter_mut() {
            *v = x < 224;
        }
        for ((_, x), v) in masks.lane_b.indexed_iter_mut() {
            *v = x >= 224;
        }

        // Second sensor looks forward-left
        let readings = RangeReadings {
            distances_mm: vec![NO_ECHO_MM, 1500.0, NO_ECHO_MM, NO_ECHO_MM],
        };
        let biases = fusion.calculate(&readings, &masks);

        assert!(biases[1].lane_a > biases[1].lane_b);
        assert!((biases[1].lane_a + biases[1].lane_b - 1.0).abs() < 1e-9);
    }
}
