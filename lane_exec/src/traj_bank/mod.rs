//! # Trajectory Template Bank
//!
//! One decayed-intensity footprint template per candidate steering angle. The
//! bank is built once before the first control cycle and is read only after
//! that, so it can be shared freely between consumers.
//!
//! Templates are stored densely in ascending angle order, a template is found
//! from its angle by the offset `(angle + max_angle) / step`.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod rasterise;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use std::time::Instant;

pub use params::*;

use crate::raster::{IntensityRaster, LaneMask, RasterParams};
use crate::vehicle::{VehicleFootprint, VehicleParams};
use rasterise::Geometry;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The footprint of the vehicle over the template horizon when holding one
/// steering angle.
#[derive(Debug, Clone)]
pub struct Template {
    pub angle_deg: i32,
    pub raster: IntensityRaster,
}

/// The full set of templates.
#[derive(Debug, Clone)]
pub struct TrajBank {
    max_angle_deg: i32,
    angle_step_deg: i32,
    templates: Vec<Template>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors preventing a template bank from being built.
#[derive(Debug, thiserror::Error)]
pub enum TrajBankError {
    #[error(
        "Invalid angle range: max angle {0} deg must be non-negative and a multiple of the \
         positive step {1} deg"
    )]
    InvalidAngleRange(i32, i32),

    #[error("Invalid template geometry: {0}")]
    InvalidGeometry(String),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Template {
    /// Binarised footprint, every pixel with a nonzero intensity.
    pub fn footprint(&self) -> LaneMask {
        self.raster.mapv(|v| v > 0)
    }
}

impl TrajBank {
    /// Rasterise every template of the bank.
    pub fn new(
        raster: &RasterParams,
        vehicle: &VehicleParams,
        params: &TrajBankParams,
    ) -> Result<Self, TrajBankError> {
        let num_templates = params.num_templates().ok_or(TrajBankError::InvalidAngleRange(
            params.max_angle_deg,
            params.angle_step_deg,
        ))?;

        if !raster.is_valid() {
            return Err(TrajBankError::InvalidGeometry(format!(
                "unusable raster {:?}",
                raster
            )));
        }

        let footprint = VehicleFootprint::new(raster, vehicle);
        let geom = Geometry::new(raster, vehicle, &footprint, params);

        if !geom.is_valid() {
            return Err(TrajBankError::InvalidGeometry(format!(
                "unusable footprint {:?}",
                geom
            )));
        }

        let start = Instant::now();

        let templates: Vec<Template> = params
            .angles()
            .map(|angle_deg| {
                let template = Template {
                    angle_deg,
                    raster: rasterise::rasterise(&geom, angle_deg),
                };
                debug!(
                    "Template {:+} deg: {} pixels",
                    angle_deg,
                    template.raster.iter().filter(|&&v| v > 0).count()
                );
                template
            })
            .collect();

        debug_assert_eq!(templates.len(), num_templates);

        info!(
            "Built {} trajectory templates ({}x{}) in {:.3} s",
            templates.len(),
            raster.width_px,
            raster.height_px,
            start.elapsed().as_secs_f64()
        );

        Ok(Self {
            max_angle_deg: params.max_angle_deg,
            angle_step_deg: params.angle_step_deg,
            templates,
        })
    }

    /// Get the template for the given angle, or `None` if the angle is not
    /// part of the bank.
    pub fn get(&self, angle_deg: i32) -> Option<&Template> {
        let offset = angle_deg + self.max_angle_deg;

        if offset < 0 || offset % self.angle_step_deg != 0 {
            return None;
        }

        self.templates.get((offset / self.angle_step_deg) as usize)
    }

    /// Iterate over the templates in ascending angle order.
    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn max_angle_deg(&self) -> i32 {
        self.max_angle_deg
    }

    /// Shape shared by every template, `(rows, cols)`.
    pub fn shape(&self) -> Option<(usize, usize)> {
        self.templates.first().map(|t| t.raster.dim())
    }
}

impl<'a> IntoIterator for &'a TrajBank {
    type Item = &'a Template;
    type IntoIter = std::slice::Iter<'a, Template>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
