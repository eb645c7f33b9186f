//! Live frame sources.
//!
//! The scanner only needs a stream that reports its native size and hands out
//! the current frame. `LiveFeed` owns an open stream and stops it when dropped,
//! so every exit path of the scanner releases the device.

use anyhow::{anyhow, Context, Result};
use image::{ImageBuffer, Rgba};
use std::path::PathBuf;

use crate::capture::geometry::Size;
use crate::config::CameraRequest;

/// An open, pixel-producing stream.
pub trait CameraStream: Send {
    /// Native frame size, or `None` until the stream has produced metadata.
    fn native_size(&self) -> Option<Size>;

    /// Returns the current frame.
    fn frame(&mut self) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>>;

    /// Freezes the live frame while a capture is processed.
    fn pause(&mut self) {}

    /// Resumes the live frame.
    fn resume(&mut self) {}

    /// Stops all tracks. Called exactly once by `LiveFeed`.
    fn stop(&mut self);
}

/// A device that can open streams.
pub trait CameraSource {
    /// Fails with a permission/availability error when the device cannot be opened.
    fn open(&self, request: &CameraRequest) -> Result<Box<dyn CameraStream>>;
}

/// Scoped ownership of an open stream.
pub struct LiveFeed {
    stream: Box<dyn CameraStream>,
}

impl LiveFeed {
    pub fn acquire(source: &dyn CameraSource, request: &CameraRequest) -> Result<Self> {
        log::info!(
            "Requesting camera: facing={} ideal={}x{}",
            request.facing_mode, request.ideal_width, request.ideal_height
        );
        let stream = source.open(request)?;
        Ok(Self { stream })
    }

    pub fn native_size(&self) -> Option<Size> {
        self.stream.native_size().filter(|s| !s.is_empty())
    }

    pub fn frame(&mut self) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
        self.stream.frame()
    }

    pub fn pause(&mut self) {
        self.stream.pause();
    }

    pub fn resume(&mut self) {
        self.stream.resume();
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        log::debug!("Releasing camera stream");
        self.stream.stop();
    }
}

/// Serves an image file as if it were a live camera frame.
pub struct ImageFileCamera {
    path: PathBuf,
}

impl ImageFileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CameraSource for ImageFileCamera {
    fn open(&self, _request: &CameraRequest) -> Result<Box<dyn CameraStream>> {
        let img = image::open(&self.path)
            .with_context(|| format!("Camera unavailable: cannot open {}", self.path.display()))?
            .to_rgba8();
        Ok(Box::new(StillStream { frame: Some(img) }))
    }
}

struct StillStream {
    frame: Option<ImageBuffer<Rgba<u8>, Vec<u8>>>,
}

impl CameraStream for StillStream {
    fn native_size(&self) -> Option<Size> {
        self.frame
            .as_ref()
            .map(|f| Size::new(f.width() as f32, f.height() as f32))
    }

    fn frame(&mut self) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
        self.frame
            .clone()
            .ok_or_else(|| anyhow!("Camera stream stopped"))
    }

    fn stop(&mut self) {
        self.frame = None;
    }
}
