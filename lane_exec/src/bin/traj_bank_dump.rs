//! # Trajectory Template Bank Dump
//!
//! Builds the template bank and saves every template as a grayscale image, so
//! the footprints can be checked by eye against the rectified camera view.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use image::GrayImage;
use std::path::PathBuf;
use structopt::StructOpt;

use lane_lib::{lane_ctrl::Params, traj_bank::TrajBank};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "traj_bank_dump")]
struct Opt {
    /// Directory the template images are written to
    #[structopt(parse(from_os_str))]
    out_dir: PathBuf,

    /// Lane control parameter file, the defaults are used if not given
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    let params: Params = match opt.params {
        Some(ref path) => {
            let params_str = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("Cannot read {:?}", path))?;
            util::params::from_str(&params_str).wrap_err("Invalid lane control parameters")?
        }
        None => Params::default(),
    };

    let bank = TrajBank::new(&params.raster, &params.vehicle, &params.traj_bank)
        .wrap_err("Cannot build the template bank")?;

    std::fs::create_dir_all(&opt.out_dir)?;

    for template in &bank {
        let (height, width) = template.raster.dim();

        let img = GrayImage::from_raw(
            width as u32,
            height as u32,
            template.raster.iter().copied().collect(),
        )
        .ok_or_else(|| eyre!("Template {} has an unexpected size", template.angle_deg))?;

        let path = opt.out_dir.join(format!("traj_{:+03}.png", template.angle_deg));
        img.save(&path)
            .wrap_err_with(|| format!("Cannot save {:?}", path))?;
    }

    println!("Saved {} templates to {:?}", bank.len(), opt.out_dir);

    Ok(())
}
