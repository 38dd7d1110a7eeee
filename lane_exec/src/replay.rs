//! # Frame and Mask Replay
//!
//! Recorded camera frames and segmentation output are read back from
//! directories of images, in file name order. Recorders name files by
//! timestamp so this is also capture order.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{GrayImage, RgbImage};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::per_client::{PerError, Segmenter};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Extensions of the files picked up by the replay sources.
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Camera replaying colour frames from a directory.
///
/// Iterating the camera yields one frame per file, the iteration ends with
/// the last file.
#[derive(Debug)]
pub struct ReplayCam {
    files: std::vec::IntoIter<PathBuf>,
}

/// Segmenter replaying precomputed label rasters from a directory.
///
/// Frames passed to [`Segmenter::segment`] are ignored, each call returns the
/// next label raster.
#[derive(Debug)]
pub struct ReplaySegmenter {
    files: std::vec::IntoIter<PathBuf>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ReplayCam {
    pub fn open<P: AsRef<Path>>(dir: P) -> std::io::Result<Self> {
        let files = list_images(dir.as_ref())?;

        info!(
            "Replaying {} camera frames from {:?}",
            files.len(),
            dir.as_ref()
        );

        Ok(Self {
            files: files.into_iter(),
        })
    }

    /// Number of frames left.
    pub fn remaining(&self) -> usize {
        self.files.len()
    }
}

impl Iterator for ReplayCam {
    type Item = Result<RgbImage, image::ImageError>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.files.next()?;
        debug!("Reading frame {:?}", path);

        Some(image::open(path).map(|img| img.to_rgb8()))
    }
}

impl ReplaySegmenter {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, PerError> {
        let files = list_images(dir.as_ref())?;

        info!(
            "Replaying {} label rasters from {:?}",
            files.len(),
            dir.as_ref()
        );

        Ok(Self {
            files: files.into_iter(),
        })
    }
}

impl Segmenter for ReplaySegmenter {
    fn segment(&mut self, _frame: &RgbImage) -> Result<GrayImage, PerError> {
        let path = self.files.next().ok_or(PerError::Exhausted)?;

        Ok(image::open(path)?.to_luma8())
    }

    fn skip(&mut self) {
        if let Some(path) = self.files.next() {
            debug!("Skipping labels {:?}", path);
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// List the image files in a directory, sorted by file name.
pub fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        let is_image = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            .unwrap_or(false);

        if path.is_file() && is_image {
            files.push(path);
        }
    }

    files.sort();

    Ok(files)
}

#[cfg(test)]
mod test {
    use super::*;
    use image::{Luma, Rgb};

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lane_exec_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_replay_cam_order() {
        let dir = test_dir("replay_cam");

        for (i, name) in ["002.png", "000.png", "001.png"].iter().enumerate() {
            RgbImage::from_pixel(4, 3, Rgb([i as u8, 0, 0]))
                .save(dir.join(name))
                .unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();

        let cam = ReplayCam::open(&dir).unwrap();
        assert_eq!(cam.remaining(), 3);

        let reds: Vec<u8> = cam.map(|f| f.unwrap().get_pixel(0, 0)[0]).collect();
        assert_eq!(reds, vec![1, 2, 0]);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_replay_segmenter_exhausts() {
        let dir = test_dir("replay_seg");

        GrayImage::from_pixel(4, 3, Luma([2]))
            .save(dir.join("0.png"))
            .unwrap();

        let mut seg = ReplaySegmenter::open(&dir).unwrap();
        let frame = RgbImage::new(4, 3);

        let labels = seg.segment(&frame).unwrap();
        assert_eq!(labels.get_pixel(3, 2)[0], 2);

        assert!(matches!(seg.segment(&frame), Err(PerError::Exhausted)));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
