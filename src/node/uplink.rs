//! Vision/uplink node: serial consumer, cloud uploader and clog confirmer

use crate::config::{ClogConfig, UploadOptions};
use crate::confirm::{ClogConfirmer, Confirmation, FrameSource};
use crate::error::Result;
use crate::mux::RecordSink;
use crate::types::{EnvReading, GpsRecord};
use crate::upload::UploadSink;
use log::{info, warn};
use std::time::Instant;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UplinkStats {
    pub environmental_uploads: u64,
    pub positional_uploads: u64,
    pub upload_failures: u64,
    pub confirmed: u64,
    pub not_confirmed: u64,
    pub no_sample: u64,
}

/// Receives demultiplexed records, uploads them and runs the clog check
///
/// Every positional record triggers a confirmation attempt, including
/// `no_data` status records, whether or not its own upload succeeded.
pub struct UplinkNode<F: FrameSource, U: UploadSink> {
    frames: F,
    uploads: U,
    confirmer: ClogConfirmer,
    paths: UploadOptions,
    started: Instant,
    captures: u64,
    last_confirmation: Option<Confirmation>,
    stats: UplinkStats,
}

impl<F: FrameSource, U: UploadSink> UplinkNode<F, U> {
    pub fn new(frames: F, uploads: U, clog: ClogConfig, paths: UploadOptions) -> Self {
        Self {
            frames,
            uploads,
            confirmer: ClogConfirmer::new(clog),
            paths,
            started: Instant::now(),
            captures: 0,
            last_confirmation: None,
            stats: UplinkStats::default(),
        }
    }

    pub fn stats(&self) -> UplinkStats {
        self.stats
    }

    pub fn last_confirmation(&self) -> Option<Confirmation> {
        self.last_confirmation
    }

    pub fn uploads(&self) -> &U {
        &self.uploads
    }

    pub fn into_uploads(self) -> U {
        self.uploads
    }

    fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn upload_document(&mut self, path: &str, document: serde_json::Value) -> Result<()> {
        let outcome = self.uploads.put_json(path, &document);
        if let Err(e) = &outcome {
            warn!("Upload to {} failed: {}", path, e);
            self.stats.upload_failures += 1;
        }
        outcome
    }
}

impl<F: FrameSource, U: UploadSink> RecordSink for UplinkNode<F, U> {
    fn on_environmental(&mut self, reading: &EnvReading) -> Result<()> {
        let path = self.paths.environmental_path();
        self.upload_document(&path, serde_json::to_value(reading)?)?;
        self.stats.environmental_uploads += 1;
        info!("Environmental data uploaded");
        Ok(())
    }

    fn on_positional(&mut self, record: &GpsRecord) -> Result<()> {
        let path = self.paths.lora_path();
        let uploaded = self.upload_document(&path, serde_json::to_value(record)?);
        if uploaded.is_ok() {
            self.stats.positional_uploads += 1;
            info!("GPS data uploaded");
        }

        let image_path = self.paths.image_path(self.uptime_ms(), self.captures);
        self.captures += 1;
        let confirmation = self
            .confirmer
            .run(&mut self.frames, &mut self.uploads, &image_path)?;
        match confirmation {
            Confirmation::Confirmed { .. } => self.stats.confirmed += 1,
            Confirmation::NotConfirmed { .. } => self.stats.not_confirmed += 1,
            Confirmation::NoSample => self.stats.no_sample += 1,
        }
        self.last_confirmation = Some(confirmation);

        uploaded
    }
}
