//! Scanner controller - owns the live feed, the session and the OCR worker.
//!
//! Capture flow: freeze the live frame, map the on-screen ROI into native
//! frame pixels, crop and enhance, encode, and hand the still to the worker.
//! Results come back through `poll` or `wait_for_results`.

use anyhow::{anyhow, Result};
use std::time::{Duration, Instant};

use crate::capture::camera::{CameraSource, LiveFeed};
use crate::capture::geometry::{roi_in_frame, Rect, Size};
use crate::config::AppConfig;
use crate::ocr::{prepare_region, Candidate};
use crate::scanner::ocr_worker::RecognitionWorker;
use crate::scanner::queue::RecognitionJob;
use crate::scanner::state::{ScanNotice, ScanOutput, ScanSession, ScanStatus, SelectionMode};

/// The scanner overlay: one instance per open scanner.
pub struct Scanner {
    config: AppConfig,
    feed: Option<LiveFeed>,
    session: ScanSession,
    worker: RecognitionWorker,
    viewport: Size,
    capture_started: Option<Instant>,
}

impl Scanner {
    /// Opens the scanner: acquires the camera and primes the session.
    ///
    /// A camera failure does not fail the scanner. It leaves a
    /// `DeviceUnavailable` notice, and the scanner can retry the camera or close.
    pub fn mount(
        source: &dyn CameraSource,
        worker: RecognitionWorker,
        config: AppConfig,
        viewport: Size,
    ) -> Result<Self> {
        let mut scanner = Self {
            config,
            feed: None,
            session: ScanSession::new()?,
            worker,
            viewport,
            capture_started: None,
        };
        scanner.open_feed(source);
        Ok(scanner)
    }

    /// Tries to open the camera again after a `DeviceUnavailable` notice.
    /// Returns whether a live feed is available afterwards.
    pub fn retry_camera(&mut self, source: &dyn CameraSource) -> bool {
        if self.feed.is_none() {
            self.open_feed(source);
        }
        self.feed.is_some()
    }

    fn open_feed(&mut self, source: &dyn CameraSource) {
        match LiveFeed::acquire(source, &self.config.camera) {
            Ok(feed) => {
                self.session.device_restored();
                self.session.stream_priming();
                match feed.native_size() {
                    Some(size) => {
                        log::info!("Camera ready: {}x{}", size.width, size.height);
                        self.session.stream_ready();
                    }
                    None => log::info!("Camera opened, waiting for first frame"),
                }
                self.feed = Some(feed);
            }
            Err(e) => {
                log::error!("Camera unavailable: {:#}", e);
                self.session.device_unavailable(e.to_string());
            }
        }
    }

    pub fn status(&self) -> ScanStatus {
        self.session.status()
    }

    pub fn notice(&self) -> Option<&ScanNotice> {
        self.session.notice()
    }

    pub fn candidates(&self) -> &[Candidate] {
        self.session.candidates()
    }

    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Call on viewport resize.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Re-checks stream readiness while priming.
    pub fn refresh_stream(&mut self) {
        if self.session.status() == ScanStatus::Priming
            && self.feed.as_ref().and_then(LiveFeed::native_size).is_some()
        {
            self.session.stream_ready();
        }
    }

    /// The on-screen ROI mapped to native frame pixels.
    pub fn capture_region(&self) -> Option<Rect> {
        let native = self.feed.as_ref()?.native_size()?;
        Some(roi_in_frame(native, self.viewport, &self.config.roi))
    }

    /// Takes a snapshot of the ROI and submits it for recognition.
    ///
    /// Only available while idle with a ready stream.
    pub fn capture(&mut self) -> Result<u64> {
        if !self.session.can_capture() {
            return Err(anyhow!("Capture unavailable while {}", self.session.status()));
        }
        let region = self
            .capture_region()
            .ok_or_else(|| anyhow!("Camera stream not ready"))?;
        let feed = self
            .feed
            .as_mut()
            .ok_or_else(|| anyhow!("Camera stream not ready"))?;

        feed.pause();
        let prepared = feed.frame().and_then(|frame| prepare_region(&frame, &region));
        let (still, png) = match prepared {
            Ok(prepared) => prepared,
            Err(e) => {
                feed.resume();
                return Err(e);
            }
        };

        let generation = self.session.begin_capture(still)?;
        let job = RecognitionJob::new(generation, png, self.config.ocr_language.clone());
        if let Err(e) = self.worker.submit(job) {
            self.session.abandon_capture(&e.to_string());
            self.resume_feed();
            return Err(e);
        }

        self.capture_started = Some(Instant::now());
        Ok(generation)
    }

    /// Applies any recognition outcome that has arrived. Returns true if the
    /// session changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.worker.try_next() {
                Ok(Some(outcome)) => changed |= self.apply(outcome.generation, outcome.result),
                Ok(None) => break,
                Err(e) => {
                    changed |= self.worker_lost(&e);
                    break;
                }
            }
        }

        if !changed && self.timed_out() {
            self.session.abandon_capture("Recognition timed out");
            self.resume_feed();
            changed = true;
        }
        changed
    }

    /// Blocks until the in-flight capture resolves, fails or times out.
    pub fn wait_for_results(&mut self) -> ScanStatus {
        let timeout = Duration::from_millis(self.config.recognition_timeout_ms);

        while self.session.status() == ScanStatus::Capturing {
            let elapsed = self.capture_started.map(|t| t.elapsed()).unwrap_or_default();
            let remaining = timeout.saturating_sub(elapsed);

            match self.worker.next_timeout(remaining) {
                Ok(Some(outcome)) => {
                    self.apply(outcome.generation, outcome.result);
                }
                Ok(None) => {
                    log::warn!("Recognition timed out after {}ms", timeout.as_millis());
                    self.session.abandon_capture("Recognition timed out");
                    self.resume_feed();
                }
                Err(e) => {
                    self.worker_lost(&e);
                }
            }
        }

        self.session.status()
    }

    /// The worker thread is gone; an in-flight capture can never resolve.
    fn worker_lost(&mut self, error: &anyhow::Error) -> bool {
        if self.session.status() != ScanStatus::Capturing {
            return false;
        }
        log::error!("Recognition worker lost: {:#}", error);
        self.session.abandon_capture(&error.to_string());
        self.resume_feed();
        true
    }

    fn apply(&mut self, generation: u64, result: Result<Vec<crate::ocr::RecognizedSpan>>) -> bool {
        let applied = self.session.finish_capture(generation, result);
        if applied {
            self.capture_started = None;
            if self.session.status() == ScanStatus::Idle {
                // Failure path: live frame comes back
                self.resume_feed();
            }
        }
        applied
    }

    fn timed_out(&self) -> bool {
        self.session.status() == ScanStatus::Capturing
            && self.capture_started.is_some_and(|t| {
                t.elapsed() >= Duration::from_millis(self.config.recognition_timeout_ms)
            })
    }

    fn resume_feed(&mut self) {
        self.capture_started = None;
        if let Some(feed) = self.feed.as_mut() {
            feed.resume();
        }
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.session.set_mode(mode);
    }

    /// Taps candidate `index`; returns output in single mode.
    pub fn tap(&mut self, index: usize) -> Option<ScanOutput> {
        let output = self.session.tap(index);
        if output.is_some() {
            self.resume_feed();
        }
        output
    }

    pub fn commit(&mut self) -> Option<ScanOutput> {
        let output = self.session.commit();
        if output.is_some() {
            self.resume_feed();
        }
        output
    }

    /// Discards the results and returns to the live frame.
    pub fn retake(&mut self) {
        self.session.end_session();
        self.resume_feed();
    }

    /// Overlay rectangles for the candidates at the rendered still size.
    pub fn overlays(&self, rendered: Size) -> Vec<Rect> {
        self.session.overlays(rendered)
    }

    /// Closes the scanner. The camera is released when the feed drops,
    /// and any recognition still in flight is ignored.
    pub fn dismiss(mut self) {
        self.session.end_session();
        log::info!("Scanner dismissed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::camera::tests::FakeCamera;
    use crate::scanner::ocr_worker::tests::{FixedRecognizer, PanickingRecognizer};
    use crate::ocr::Recognizer;
    use image::{ImageBuffer, Rgba};
    use std::sync::atomic::Ordering;

    fn frame() -> ImageBuffer<Rgba<u8>, Vec<u8>> {
        ImageBuffer::from_pixel(1920, 1080, Rgba([180, 180, 180, 255]))
    }

    fn mount_with(camera: &FakeCamera, recognizer: Box<dyn Recognizer>, config: AppConfig) -> Scanner {
        let worker = RecognitionWorker::spawn(recognizer).unwrap();
        Scanner::mount(camera, worker, config, Size::new(400.0, 900.0)).unwrap()
    }

    fn mount(camera: &FakeCamera, recognizer: FixedRecognizer) -> Scanner {
        mount_with(camera, Box::new(recognizer), AppConfig::default())
    }

    fn short_timeout() -> AppConfig {
        AppConfig {
            recognition_timeout_ms: 50,
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_mount_becomes_idle() {
        let camera = FakeCamera::new(frame());
        let scanner = mount(&camera, FixedRecognizer::with_words(&["hello"]));
        assert_eq!(scanner.status(), ScanStatus::Idle);
        assert!(scanner.notice().is_none());
    }

    #[test]
    fn test_capture_region_is_inside_frame() {
        let camera = FakeCamera::new(frame());
        let scanner = mount(&camera, FixedRecognizer::with_words(&["hello"]));

        let region = scanner.capture_region().unwrap();
        // Viewport 400x900 covers a 1920x1080 frame with scale 900/1080
        assert!((region.height - 160.0 * 1080.0 / 900.0).abs() < 1e-2);
        assert!(region.x > 0.0 && region.x + region.width < 1920.0);
    }

    #[test]
    fn test_set_viewport_moves_capture_region() {
        let camera = FakeCamera::new(frame());
        let mut scanner = mount(&camera, FixedRecognizer::with_words(&["hello"]));
        let narrow = scanner.capture_region().unwrap();

        scanner.set_viewport(Size::new(800.0, 900.0));
        let wide = scanner.capture_region().unwrap();
        assert!((narrow.width - 408.0).abs() < 1e-2);
        assert!((wide.width - 816.0).abs() < 1e-2);
    }

    #[test]
    fn test_refresh_stream_waits_for_metadata() {
        let camera = FakeCamera::new(frame());
        camera.loading.store(true, Ordering::SeqCst);
        let mut scanner = mount(&camera, FixedRecognizer::with_words(&["hello"]));

        assert_eq!(scanner.status(), ScanStatus::Priming);
        assert!(scanner.capture_region().is_none());
        assert!(scanner.capture().is_err());
        scanner.refresh_stream();
        assert_eq!(scanner.status(), ScanStatus::Priming);

        camera.loading.store(false, Ordering::SeqCst);
        scanner.refresh_stream();
        assert_eq!(scanner.status(), ScanStatus::Idle);
        assert!(scanner.capture().is_ok());
    }

    #[test]
    fn test_capture_and_single_tap() {
        let camera = FakeCamera::new(frame());
        let mut scanner = mount(&camera, FixedRecognizer::with_words(&["The", "cat's", "hat."]));

        scanner.capture().unwrap();
        assert_eq!(scanner.status(), ScanStatus::Capturing);
        assert!(scanner.capture().is_err(), "capture is unavailable while scanning");

        assert_eq!(scanner.wait_for_results(), ScanStatus::ShowingResults);
        assert_eq!(scanner.candidates().len(), 3);
        assert_eq!(scanner.overlays(Size::new(100.0, 10.0)).len(), 3);

        let output = scanner.tap(2);
        assert_eq!(output, Some(ScanOutput::Word("hat".to_string())));
        assert_eq!(scanner.status(), ScanStatus::Idle);
    }

    #[test]
    fn test_recognition_failure_resumes_idle() {
        let camera = FakeCamera::new(frame());
        let mut scanner = mount(&camera, FixedRecognizer::failing());

        scanner.capture().unwrap();
        assert_eq!(scanner.wait_for_results(), ScanStatus::Idle);
        assert!(matches!(scanner.notice(), Some(ScanNotice::RecognitionFailed(_))));
        assert_eq!(camera.resumes.load(Ordering::SeqCst), 1);

        // Retry is possible
        assert!(scanner.capture().is_ok());
    }

    #[test]
    fn test_worker_crash_returns_to_idle() {
        let camera = FakeCamera::new(frame());
        let mut scanner = mount_with(&camera, Box::new(PanickingRecognizer), AppConfig::default());

        scanner.capture().unwrap();
        assert_eq!(scanner.wait_for_results(), ScanStatus::Idle);
        assert_eq!(
            scanner.notice(),
            Some(&ScanNotice::RecognitionFailed("OCR worker exited".to_string()))
        );
        assert_eq!(camera.resumes.load(Ordering::SeqCst), 1);

        // The worker is gone: a new capture can never resolve, but it never
        // leaves the scanner stuck either
        let _ = scanner.capture();
        assert_eq!(scanner.wait_for_results(), ScanStatus::Idle);
    }

    #[test]
    fn test_poll_notices_worker_crash() {
        let camera = FakeCamera::new(frame());
        let mut scanner = mount_with(&camera, Box::new(PanickingRecognizer), AppConfig::default());
        scanner.capture().unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while !scanner.poll() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(scanner.status(), ScanStatus::Idle);
        assert!(matches!(scanner.notice(), Some(ScanNotice::RecognitionFailed(_))));
    }

    #[test]
    fn test_poll_times_out_without_blocking() {
        let camera = FakeCamera::new(frame());
        let recognizer = FixedRecognizer::slow(&["hello"], Duration::from_secs(2));
        let mut scanner = mount_with(&camera, Box::new(recognizer), short_timeout());
        scanner.capture().unwrap();

        std::thread::sleep(Duration::from_millis(100));
        assert!(scanner.poll());
        assert_eq!(scanner.status(), ScanStatus::Idle);
        assert_eq!(
            scanner.notice(),
            Some(&ScanNotice::RecognitionFailed("Recognition timed out".to_string()))
        );
        assert_eq!(camera.resumes.load(Ordering::SeqCst), 1);
        assert!(!scanner.poll(), "nothing left to report");
    }

    #[test]
    fn test_dismiss_after_timeout_does_not_wait_for_recognizer() {
        let camera = FakeCamera::new(frame());
        let recognizer = FixedRecognizer::slow(&["hello"], Duration::from_secs(2));
        let mut scanner = mount_with(&camera, Box::new(recognizer), short_timeout());
        scanner.capture().unwrap();
        assert_eq!(scanner.wait_for_results(), ScanStatus::Idle);

        let started = Instant::now();
        scanner.dismiss();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(camera.stops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_retake_discards_late_result() {
        let camera = FakeCamera::new(frame());
        let recognizer = FixedRecognizer::slow(&["hello"], Duration::from_millis(200));
        let mut scanner = mount_with(&camera, Box::new(recognizer), AppConfig::default());
        scanner.capture().unwrap();

        scanner.retake();
        assert_eq!(scanner.status(), ScanStatus::Idle);
        assert_eq!(camera.resumes.load(Ordering::SeqCst), 1);

        std::thread::sleep(Duration::from_millis(500));
        assert!(!scanner.poll());
        assert_eq!(scanner.status(), ScanStatus::Idle);
        assert!(scanner.candidates().is_empty());
        assert!(scanner.notice().is_none());
    }

    #[test]
    fn test_retake_from_results() {
        let camera = FakeCamera::new(frame());
        let mut scanner = mount(&camera, FixedRecognizer::with_words(&["alpha", "beta"]));
        scanner.capture().unwrap();
        assert_eq!(scanner.wait_for_results(), ScanStatus::ShowingResults);

        scanner.retake();
        assert_eq!(scanner.status(), ScanStatus::Idle);
        assert!(scanner.candidates().is_empty());
        assert!(scanner.capture().is_ok());
    }

    #[test]
    fn test_camera_failure_sets_device_notice() {
        let mut camera = FakeCamera::new(frame());
        camera.fail = true;
        let mut scanner = mount(&camera, FixedRecognizer::with_words(&["hello"]));

        assert!(matches!(scanner.notice(), Some(ScanNotice::DeviceUnavailable(_))));
        assert!(scanner.capture().is_err());
        scanner.dismiss();
    }

    #[test]
    fn test_retry_camera_after_device_failure() {
        let mut camera = FakeCamera::new(frame());
        camera.fail = true;
        let mut scanner = mount(&camera, FixedRecognizer::with_words(&["hello"]));

        assert!(!scanner.retry_camera(&camera));
        assert!(matches!(scanner.notice(), Some(ScanNotice::DeviceUnavailable(_))));

        camera.fail = false;
        assert!(scanner.retry_camera(&camera));
        assert!(scanner.notice().is_none());
        assert_eq!(scanner.status(), ScanStatus::Idle);
        assert!(scanner.capture().is_ok());
        assert_eq!(scanner.wait_for_results(), ScanStatus::ShowingResults);
    }

    #[test]
    fn test_dismiss_releases_camera() {
        let camera = FakeCamera::new(frame());
        let mut scanner = mount(&camera, FixedRecognizer::with_words(&["hello"]));
        scanner.capture().unwrap();

        scanner.dismiss();
        assert_eq!(camera.stops.load(Ordering::SeqCst), 1);
    }
}
