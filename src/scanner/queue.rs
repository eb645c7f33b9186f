//! Channel types between the scanner and the recognition worker.
//!
//! Uses std::sync::mpsc channels in both directions. Each job carries the
//! session generation it was submitted under, and its result carries it back.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::ocr::RecognizedSpan;

/// A recognition request for the worker thread.
#[derive(Debug, Clone)]
pub struct RecognitionJob {
    /// Session generation the capture belongs to
    pub generation: u64,
    /// PNG-encoded enhanced still
    pub png: Vec<u8>,
    /// Language hint for the recognizer
    pub language: String,
    /// Timestamp when the still was captured
    pub captured_at: DateTime<Local>,
}

impl RecognitionJob {
    pub fn new(generation: u64, png: Vec<u8>, language: impl Into<String>) -> Self {
        Self {
            generation,
            png,
            language: language.into(),
            captured_at: Local::now(),
        }
    }
}

/// The worker's answer to a job.
#[derive(Debug)]
pub struct RecognitionOutcome {
    pub generation: u64,
    pub result: Result<Vec<RecognizedSpan>>,
}

/// Creates the job queue: (sender for the scanner, receiver for the worker).
pub fn create_job_queue() -> (Sender<RecognitionJob>, Receiver<RecognitionJob>) {
    channel()
}

/// Creates the outcome queue: (sender for the worker, receiver for the scanner).
pub fn create_outcome_queue() -> (Sender<RecognitionOutcome>, Receiver<RecognitionOutcome>) {
    channel()
}
