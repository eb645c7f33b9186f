//! Scan session state machine.
//!
//! The session sequences through: Idle ⇄ Priming → Idle → Capturing → ShowingResults → Idle.
//! Every capture bumps the session generation; a recognition result tagged
//! with an older generation belongs to a torn-down session and is dropped.

use anyhow::{anyhow, Result};
use image::{ImageBuffer, Rgba};
use std::collections::BTreeSet;

use crate::capture::geometry::{OverlayScale, Rect, Size};
use crate::ocr::{Candidate, CandidateNormalizer, RecognizedSpan};

/// Capture status of the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    /// Live frame showing, capture available
    Idle,
    /// Waiting for the camera stream to become ready
    Priming,
    /// Snapshot taken, recognition in flight
    Capturing,
    /// Candidates available for selection
    ShowingResults,
}

impl std::fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanStatus::Idle => write!(f, "Idle"),
            ScanStatus::Priming => write!(f, "Starting camera"),
            ScanStatus::Capturing => write!(f, "Processing"),
            ScanStatus::ShowingResults => write!(f, "Results"),
        }
    }
}

/// How taps on candidates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// A tap commits that word immediately
    #[default]
    Single,
    /// Taps toggle words; commit emits them in reading order
    Multiple,
    /// Taps toggle words; commit joins them into one phrase
    Sentence,
}

impl std::str::FromStr for SelectionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "single" => Ok(Self::Single),
            "multiple" => Ok(Self::Multiple),
            "sentence" => Ok(Self::Sentence),
            other => Err(anyhow!("Unknown selection mode: {}", other)),
        }
    }
}

/// What a finished selection produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutput {
    Word(String),
    /// Words in reading order
    Words(Vec<String>),
    Sentence(String),
}

/// A failure surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanNotice {
    /// Camera permission or hardware failure; persists until the scanner closes
    DeviceUnavailable(String),
    /// Recognition error or nothing usable recognized; cleared by the next capture
    RecognitionFailed(String),
}

impl std::fmt::Display for ScanNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanNotice::DeviceUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            ScanNotice::RecognitionFailed(msg) => write!(f, "Recognition failed: {}", msg),
        }
    }
}

/// State of one capture cycle.
pub struct ScanSession {
    status: ScanStatus,
    generation: u64,
    snapshot: Option<ImageBuffer<Rgba<u8>, Vec<u8>>>,
    candidates: Vec<Candidate>,
    mode: SelectionMode,
    selected: BTreeSet<usize>,
    notice: Option<ScanNotice>,
    normalizer: CandidateNormalizer,
}

impl ScanSession {
    pub fn new() -> Result<Self> {
        Ok(Self {
            status: ScanStatus::Idle,
            generation: 0,
            snapshot: None,
            candidates: Vec::new(),
            mode: SelectionMode::Single,
            selected: BTreeSet::new(),
            notice: None,
            normalizer: CandidateNormalizer::new()?,
        })
    }

    pub fn status(&self) -> ScanStatus {
        self.status
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Selected candidate indices, ascending.
    pub fn selected(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected.iter().copied()
    }

    pub fn snapshot(&self) -> Option<&ImageBuffer<Rgba<u8>, Vec<u8>>> {
        self.snapshot.as_ref()
    }

    pub fn notice(&self) -> Option<&ScanNotice> {
        self.notice.as_ref()
    }

    /// Capture is only offered while idle.
    pub fn can_capture(&self) -> bool {
        self.status == ScanStatus::Idle
    }

    /// Commit is offered in multiple/sentence mode once something is selected.
    pub fn can_commit(&self) -> bool {
        self.status == ScanStatus::ShowingResults
            && self.mode != SelectionMode::Single
            && !self.selected.is_empty()
    }

    /// Camera stream requested but not yet producing frames.
    pub fn stream_priming(&mut self) {
        if self.status == ScanStatus::Idle {
            self.status = ScanStatus::Priming;
        }
    }

    /// Camera stream ready (or failed; the notice then tells the user why).
    pub fn stream_ready(&mut self) {
        if self.status == ScanStatus::Priming {
            self.status = ScanStatus::Idle;
        }
    }

    pub fn device_unavailable(&mut self, message: impl Into<String>) {
        self.notice = Some(ScanNotice::DeviceUnavailable(message.into()));
        self.status = ScanStatus::Idle;
    }

    /// The camera was reopened after a device failure.
    pub fn device_restored(&mut self) {
        if matches!(self.notice, Some(ScanNotice::DeviceUnavailable(_))) {
            self.notice = None;
        }
    }

    /// Starts a capture with the enhanced still.
    ///
    /// Resets the selection mode to single and clears any previous selection.
    /// Returns the generation the recognition result must be tagged with.
    pub fn begin_capture(&mut self, snapshot: ImageBuffer<Rgba<u8>, Vec<u8>>) -> Result<u64> {
        if !self.can_capture() {
            return Err(anyhow!("Cannot capture while {}", self.status));
        }

        self.generation += 1;
        self.status = ScanStatus::Capturing;
        self.snapshot = Some(snapshot);
        self.candidates.clear();
        self.mode = SelectionMode::Single;
        self.selected.clear();
        if matches!(self.notice, Some(ScanNotice::RecognitionFailed(_))) {
            self.notice = None;
        }

        log::info!("Capture {} started", self.generation);
        Ok(self.generation)
    }

    /// Applies a recognition result.
    ///
    /// Returns `false` if the result was discarded because its session is gone.
    /// On success the candidate list is replaced wholesale; on failure (or when
    /// nothing usable was recognized) the session returns to idle with a notice.
    pub fn finish_capture(
        &mut self,
        generation: u64,
        result: Result<Vec<RecognizedSpan>>,
    ) -> bool {
        if generation != self.generation || self.status != ScanStatus::Capturing {
            log::debug!(
                "Discarding stale recognition result (generation {}, current {})",
                generation, self.generation
            );
            return false;
        }

        match result {
            Ok(spans) => {
                let candidates = self.normalizer.normalize(&spans);
                if candidates.is_empty() {
                    self.fail_capture("No words detected");
                } else {
                    self.candidates = candidates;
                    self.status = ScanStatus::ShowingResults;
                }
            }
            Err(e) => {
                log::warn!("Recognition failed: {:#}", e);
                self.fail_capture(&e.to_string());
            }
        }
        true
    }

    /// Abandons the in-flight capture, e.g. on timeout. A late result for it
    /// will be discarded.
    pub fn abandon_capture(&mut self, reason: &str) {
        if self.status == ScanStatus::Capturing {
            self.fail_capture(reason);
            self.generation += 1;
        }
    }

    fn fail_capture(&mut self, reason: &str) {
        self.notice = Some(ScanNotice::RecognitionFailed(reason.to_string()));
        self.snapshot = None;
        self.candidates.clear();
        self.status = ScanStatus::Idle;
    }

    /// Switches tap semantics. The current selection is kept.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    /// Handles a tap on candidate `index`.
    ///
    /// In single mode this commits the word and ends the session. In the other
    /// modes it toggles the index and returns `None`.
    pub fn tap(&mut self, index: usize) -> Option<ScanOutput> {
        if self.status != ScanStatus::ShowingResults || index >= self.candidates.len() {
            return None;
        }

        match self.mode {
            SelectionMode::Single => {
                let word = self.candidates[index].display_text.clone();
                self.end_session();
                Some(ScanOutput::Word(word))
            }
            SelectionMode::Multiple | SelectionMode::Sentence => {
                if !self.selected.remove(&index) {
                    self.selected.insert(index);
                }
                None
            }
        }
    }

    /// Commits the multi-word selection. No-op while nothing is selected.
    pub fn commit(&mut self) -> Option<ScanOutput> {
        if !self.can_commit() {
            return None;
        }

        let output = match self.mode {
            SelectionMode::Multiple => ScanOutput::Words(
                self.selected
                    .iter()
                    .map(|&i| self.candidates[i].display_text.clone())
                    .collect(),
            ),
            SelectionMode::Sentence => {
                let joined = self
                    .selected
                    .iter()
                    .map(|&i| self.candidates[i].original_text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                ScanOutput::Sentence(self.normalizer.trim_punctuation(&joined))
            }
            SelectionMode::Single => return None,
        };

        self.end_session();
        Some(output)
    }

    /// Overlay rectangles for each candidate when the still is rendered at `rendered`.
    pub fn overlays(&self, rendered: Size) -> Vec<Rect> {
        let still = self
            .snapshot
            .as_ref()
            .map(|s| Size::new(s.width() as f32, s.height() as f32))
            .unwrap_or_default();
        let scale = OverlayScale::new(still, rendered);
        self.candidates.iter().map(|c| scale.map_box(&c.bbox)).collect()
    }

    /// Tears the session down. Results still in flight become stale.
    pub fn end_session(&mut self) {
        self.generation += 1;
        self.status = ScanStatus::Idle;
        self.snapshot = None;
        self.candidates.clear();
        self.mode = SelectionMode::Single;
        self.selected.clear();
    }
}
