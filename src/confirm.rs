//! Visual clog confirmation on the uplink node
//!
//! Each positional record prompts one camera capture. A frame with enough dark
//! pixels is taken as a lodged object and uploaded; otherwise nothing happens.

use crate::config::ClogConfig;
use crate::error::Result;
use crate::upload::UploadSink;
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Grayscale frame as handed over by the camera driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub pixels: Vec<u8>,
}

impl ImageBuffer {
    pub fn new(pixels: Vec<u8>) -> Self {
        Self { pixels }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}

/// Camera capability; `None` when no frame could be grabbed
pub trait FrameSource {
    fn capture(&mut self) -> Option<ImageBuffer>;
}

impl<F: FrameSource + ?Sized> FrameSource for Box<F> {
    fn capture(&mut self) -> Option<ImageBuffer> {
        (**self).capture()
    }
}

/// No camera fitted
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCamera;

impl FrameSource for NoCamera {
    fn capture(&mut self) -> Option<ImageBuffer> {
        None
    }
}

/// Hands out a fixed sequence of frames, then nothing
#[derive(Debug, Default)]
pub struct QueuedFrames {
    frames: VecDeque<ImageBuffer>,
}

impl QueuedFrames {
    pub fn new(frames: impl IntoIterator<Item = ImageBuffer>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    /// Load every regular file in `dir`, sorted by name, as a raw grayscale frame
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file())
            .collect();
        paths.sort();

        let mut frames = VecDeque::with_capacity(paths.len());
        for path in paths {
            debug!("Queued frame {}", path.display());
            frames.push_back(ImageBuffer::new(std::fs::read(&path)?));
        }
        Ok(Self { frames })
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for QueuedFrames {
    fn capture(&mut self) -> Option<ImageBuffer> {
        self.frames.pop_front()
    }
}

/// Fraction of pixels strictly darker than `threshold`; 0.0 for an empty frame
pub fn dark_pixel_ratio(pixels: &[u8], threshold: u8) -> f32 {
    if pixels.is_empty() {
        return 0.0;
    }
    let dark = pixels.iter().filter(|&&p| p < threshold).count();
    dark as f32 / pixels.len() as f32
}

/// Outcome of one confirmation attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Confirmation {
    /// Camera produced no frame; no confirmation possible
    NoSample,
    Confirmed { dark_ratio: f32 },
    NotConfirmed { dark_ratio: f32 },
}

/// Stateless dark-pixel test, run synchronously per positional record
#[derive(Debug, Clone, Copy, Default)]
pub struct ClogConfirmer {
    config: ClogConfig,
}

impl ClogConfirmer {
    pub fn new(config: ClogConfig) -> Self {
        Self { config }
    }

    pub fn evaluate(&self, image: &ImageBuffer) -> Confirmation {
        let dark_ratio = dark_pixel_ratio(&image.pixels, self.config.dark_threshold);
        debug!("Image dark pixel ratio: {:.3}", dark_ratio);
        if dark_ratio > self.config.dark_ratio {
            Confirmation::Confirmed { dark_ratio }
        } else {
            Confirmation::NotConfirmed { dark_ratio }
        }
    }

    /// Capture, evaluate and upload the frame to `image_path` when the clog is confirmed
    pub fn run(
        &self,
        frames: &mut dyn FrameSource,
        uploads: &mut dyn UploadSink,
        image_path: &str,
    ) -> Result<Confirmation> {
        let Some(image) = frames.capture() else {
            warn!("No camera frame available, clog cannot be confirmed");
            return Ok(Confirmation::NoSample);
        };

        let outcome = self.evaluate(&image);
        match outcome {
            Confirmation::Confirmed { dark_ratio } => {
                uploads.put_bytes(image_path, &image.pixels, IMAGE_CONTENT_TYPE)?;
                info!("Clog confirmed (dark ratio {:.3}), image uploaded: {}", dark_ratio, image_path);
            }
            Confirmation::NotConfirmed { .. } => info!("No visual clog detected"),
            Confirmation::NoSample => {}
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadOptions;
    use crate::upload::{MemoryUploadSink, Upload};

    /// 100-pixel frame with `dark` pixels at intensity 10 and the rest at 200
    fn frame_with_dark(dark: usize) -> ImageBuffer {
        let mut pixels = vec![200u8; 100];
        pixels[..dark].fill(10);
        ImageBuffer::new(pixels)
    }

    #[test]
    fn test_dark_ratio() {
        assert_eq!(dark_pixel_ratio(&[], 50), 0.0);
        assert_eq!(dark_pixel_ratio(&[49, 50, 51, 0], 50), 0.5);
    }

    #[test]
    fn test_quarter_dark_confirms_fifteen_percent_does_not() {
        let confirmer = ClogConfirmer::default();
        assert!(matches!(
            confirmer.evaluate(&frame_with_dark(25)),
            Confirmation::Confirmed { .. }
        ));
        assert!(matches!(
            confirmer.evaluate(&frame_with_dark(15)),
            Confirmation::NotConfirmed { .. }
        ));
        // Exactly at the ratio is not above it
        assert!(matches!(
            confirmer.evaluate(&frame_with_dark(20)),
            Confirmation::NotConfirmed { .. }
        ));
    }

    #[test]
    fn test_run_uploads_only_confirmed_frames() {
        let confirmer = ClogConfirmer::default();
        let paths = UploadOptions::default();
        let mut frames = QueuedFrames::new([frame_with_dark(25), frame_with_dark(15)]);
        let mut uploads = MemoryUploadSink::new();

        let first = confirmer.run(&mut frames, &mut uploads, &paths.image_path(1_000, 0)).unwrap();
        let second = confirmer.run(&mut frames, &mut uploads, &paths.image_path(2_000, 1)).unwrap();
        let third = confirmer.run(&mut frames, &mut uploads, &paths.image_path(3_000, 2)).unwrap();

        assert!(matches!(first, Confirmation::Confirmed { .. }));
        assert!(matches!(second, Confirmation::NotConfirmed { .. }));
        assert_eq!(third, Confirmation::NoSample);
        assert_eq!(
            uploads.uploads,
            vec![Upload::Bytes {
                path: "/clog_images/img_1000_0.jpg".to_string(),
                len: 100,
                content_type: IMAGE_CONTENT_TYPE.to_string(),
            }]
        );
    }

    #[test]
    fn test_no_camera_yields_no_sample() {
        let confirmer = ClogConfirmer::default();
        let mut uploads = MemoryUploadSink::new();
        let outcome = confirmer
            .run(&mut NoCamera, &mut uploads, "/clog_images/unused.jpg")
            .unwrap();
        assert_eq!(outcome, Confirmation::NoSample);
        assert!(uploads.uploads.is_empty());
    }
}
