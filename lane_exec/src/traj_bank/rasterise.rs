//! Footprint rasterisation for a single steering angle.
//!
//! Templates are drawn on a canvas twice the size of the target raster, with
//! the target centred in it, so that samples falling slightly outside the
//! target (the rear reference point sits below the bottom edge) are still
//! drawn. The canvas is then cropped and quantised to 8 bits.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use ndarray::{s, Array2};

use super::TrajBankParams;
use crate::raster::{self, IntensityRaster, RasterParams};
use crate::vehicle::{VehicleFootprint, VehicleParams};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Pixel geometry shared by every template of a bank.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Geometry {
    /// Target raster width and height
    width: usize,
    height: usize,

    /// Rear reference point, in target raster coordinates
    rear_x: i64,
    rear_y: i64,

    /// Footprint width including clearance
    track_width_px: f64,

    /// Vehicle length used as the wheelbase of the arc model
    wheelbase_px: f64,

    /// Number of samples along the path and distance between them
    num_samples: usize,
    sample_step_px: f64,

    /// Decay rate per pixel travelled
    decay_per_px: f64,
}

/// Oversized drawing surface, `offset` is the position of the target raster's
/// origin within it.
struct Canvas {
    data: Array2<f64>,
    offset_x: i64,
    offset_y: i64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Geometry {
    pub(crate) fn new(
        raster: &RasterParams,
        vehicle: &VehicleParams,
        footprint: &VehicleFootprint,
        params: &TrajBankParams,
    ) -> Self {
        let rear_dist_px = raster.m_to_px(vehicle.box_dist_m + params.rear_ref_offset_m);

        Self {
            width: raster.width_px,
            height: raster.height_px,
            rear_x: footprint.centre_x_px,
            rear_y: raster.height_px as i64 + (rear_dist_px / 2.0) as i64,
            track_width_px: footprint.width_px as f64 + raster.m_to_px(params.clearance_m),
            wheelbase_px: footprint.length_px as f64,
            num_samples: (raster.m_to_px(params.horizon_m) / params.sample_step_px).ceil()
                as usize,
            sample_step_px: params.sample_step_px,
            decay_per_px: params.decay * raster.res_m,
        }
    }

    /// Returns true if the geometry can produce a template.
    pub(crate) fn is_valid(&self) -> bool {
        self.sample_step_px.is_finite()
            && self.sample_step_px > 0.0
            && self.track_width_px.is_finite()
            && self.track_width_px > 0.0
            && self.wheelbase_px > 0.0
            && self.decay_per_px.is_finite()
    }

    fn intensity(&self, dist_px: f64) -> f64 {
        (-self.decay_per_px * dist_px).exp()
    }

    fn sample_dists(&self) -> impl Iterator<Item = f64> {
        let step = self.sample_step_px;
        (0..self.num_samples).map(move |i| i as f64 * step)
    }
}

impl Canvas {
    fn new(geom: &Geometry) -> Self {
        Self {
            data: Array2::zeros((geom.height * 2, geom.width * 2)),
            offset_x: (geom.width / 2) as i64,
            offset_y: (geom.height / 2) as i64,
        }
    }

    fn width(&self) -> i64 {
        self.data.ncols() as i64
    }

    fn height(&self) -> i64 {
        self.data.nrows() as i64
    }

    /// Crop the target raster out of the canvas and quantise it.
    fn crop(self, geom: &Geometry) -> IntensityRaster {
        let (x0, y0) = (self.offset_x as usize, self.offset_y as usize);

        self.data
            .slice(s![y0..y0 + geom.height, x0..x0 + geom.width])
            .mapv(|v| (v * 255.0) as u8)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Rasterise the footprint template for one steering angle.
pub(crate) fn rasterise(geom: &Geometry, angle_deg: i32) -> IntensityRaster {
    let mut canvas = Canvas::new(geom);

    if angle_deg == 0 {
        draw_straight(geom, &mut canvas);
    } else {
        draw_arc(geom, &mut canvas, angle_deg);
    }

    canvas.crop(geom)
}

/// A strip of constant width straight ahead of the rear reference point.
fn draw_straight(geom: &Geometry, canvas: &mut Canvas) {
    let half_width = (geom.track_width_px / 2.0).floor() as i64;
    let x_start = geom.rear_x - half_width + canvas.offset_x;
    let x_end = geom.rear_x + half_width + canvas.offset_x;

    for t in geom.sample_dists() {
        let y = (geom.rear_y as f64 - t) as i64 + canvas.offset_y;

        if y < 0 || x_start < 0 || x_end >= canvas.width() {
            break;
        }
        if y >= canvas.height() {
            continue;
        }

        canvas
            .data
            .slice_mut(s![y as usize, x_start as usize..x_end as usize])
            .fill(geom.intensity(t));
    }
}

/// A circular arc around a turning centre level with the rear reference
/// point. Each sample draws the segment joining the inner and outer edges of
/// the footprint.
fn draw_arc(geom: &Geometry, canvas: &mut Canvas, angle_deg: i32) {
    let radius = (geom.wheelbase_px / (angle_deg as f64).to_radians().tan()).abs();
    let sign = if angle_deg > 0 { 1.0 } else { -1.0 };
    let half_width = geom.track_width_px / 2.0;

    let rear_x = geom.rear_x as f64;
    let rear_y = geom.rear_y as f64;
    let centre_x = rear_x + sign * radius + canvas.offset_x as f64;

    // Segments run from the right edge of the footprint to the left one, the
    // right edge is the inner one on right hand turns
    let (start_r, end_r) = if angle_deg > 0 {
        (radius - half_width, radius + half_width)
    } else {
        (radius + half_width, radius - half_width)
    };

    let (canvas_w, canvas_h) = (canvas.width(), canvas.height());
    let (offset_x, offset_y) = (canvas.offset_x, canvas.offset_y);

    for t in geom.sample_dists() {
        let phi = t / radius;
        let (sin_phi, cos_phi) = phi.sin_cos();

        let mid_x = (rear_x + sign * radius * (1.0 - cos_phi)) as i64 + offset_x;
        let mid_y = (rear_y - radius * sin_phi) as i64 + offset_y;

        if mid_y < 0 || mid_x < 0 || mid_x >= canvas_w {
            break;
        }

        let edge = |r: f64| {
            (
                (centre_x - sign * r * cos_phi) as i64,
                (rear_y - r * sin_phi) as i64 + offset_y,
            )
        };
        let start = edge(start_r);
        let end = edge(end_r);

        if start.0 < 0 || end.0 >= canvas_w || start.1 < 0 || end.1 >= canvas_h {
            break;
        }

        raster::draw_line(&mut canvas.data, start, end, geom.intensity(t));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn default_geometry() -> Geometry {
        let raster = RasterParams::default();
        let vehicle = VehicleParams::default();
        let footprint = VehicleFootprint::new(&raster, &vehicle);

        Geometry::new(&raster, &vehicle, &footprint, &TrajBankParams::default())
    }

    #[test]
    fn test_default_geometry() {
        let geom = default_geometry();

        assert!(geom.is_valid());
        assert_eq!((geom.rear_x, geom.rear_y), (224, 327));
        assert_eq!(geom.num_samples, 229);
        assert!((geom.track_width_px - 25.4216).abs() < 1e-3);
        assert_eq!(geom.wheelbase_px, 32.0);
    }

    #[test]
    fn test_intensity_decays() {
        let geom = default_geometry();

        assert_eq!(geom.intensity(0.0), 1.0);
        assert!(geom.intensity(10.0) < geom.intensity(5.0));
    }

    #[test]
    fn test_straight_template() {
        let geom = default_geometry();
        let template = rasterise(&geom, 0);

        assert_eq!(template.dim(), (300, 448));

        // Every nonzero row spans exactly the vehicle's columns
        for (y, row) in template.outer_iter().enumerate() {
            let cols: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, &v)| v > 0)
                .map(|(x, _)| x)
                .collect();

            if (213..300).contains(&y) {
                assert_eq!(cols, (212..236).collect::<Vec<_>>(), "row {}", y);
            } else {
                assert!(cols.is_empty(), "row {}", y);
            }
        }

        // The nearest visible row is the last sample drawn on it
        assert_eq!(template[[299, 224]], 167);
    }

    #[test]
    fn test_arcs_turn_towards_their_sign() {
        let geom = default_geometry();

        let centroid_x = |angle: i32| {
            let template = rasterise(&geom, angle);
            let (mut sum, mut n) = (0usize, 0usize);
            for ((_, x), &v) in template.indexed_iter() {
                if v > 0 {
                    sum += x;
                    n += 1;
                }
            }
            sum as f64 / n as f64
        };

        assert!(centroid_x(15) > 224.0);
        assert!(centroid_x(-15) < 224.0);
    }
}
