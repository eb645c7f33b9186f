//! Recognition worker thread.
//!
//! Receives jobs from the scanner, runs the recognizer, and sends each
//! outcome back tagged with the job's generation. The worker never decides
//! whether a result is still wanted; the scanner does.

use anyhow::{anyhow, Result};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::ocr::Recognizer;
use crate::scanner::queue::{
    create_job_queue, create_outcome_queue, RecognitionJob, RecognitionOutcome,
};

/// Runs the worker loop until the job channel closes (sender dropped).
///
/// Blocks, so it should run on a dedicated thread.
pub fn run_ocr_worker(
    recognizer: Box<dyn Recognizer>,
    jobs: Receiver<RecognitionJob>,
    outcomes: Sender<RecognitionOutcome>,
) {
    log::info!("OCR worker started");

    while let Ok(job) = jobs.recv() {
        log::info!(
            "OCR worker: processing capture {} ({} bytes, captured {})",
            job.generation,
            job.png.len(),
            job.captured_at.format("%H:%M:%S")
        );

        let result = recognizer.recognize(&job.png, &job.language);
        if let Err(e) = &result {
            log::warn!("OCR worker: capture {} failed: {}", job.generation, e);
        }

        let outcome = RecognitionOutcome {
            generation: job.generation,
            result,
        };
        if outcomes.send(outcome).is_err() {
            log::info!("OCR worker: scanner gone, exiting");
            break;
        }
    }

    log::info!("OCR worker finished");
}

/// Handle to a running worker thread.
///
/// The thread is detached. Dropping the handle closes the job channel and
/// the outcome receiver, so the worker exits after its current job instead
/// of holding up the scanner while a slow recognition finishes.
pub struct RecognitionWorker {
    jobs: Sender<RecognitionJob>,
    outcomes: Receiver<RecognitionOutcome>,
}

impl RecognitionWorker {
    /// Spawns the worker thread around `recognizer`.
    pub fn spawn(recognizer: Box<dyn Recognizer>) -> Result<Self> {
        let (job_tx, job_rx) = create_job_queue();
        let (outcome_tx, outcome_rx) = create_outcome_queue();

        let handle = thread::Builder::new()
            .name("ocr-worker".to_string())
            .spawn(move || run_ocr_worker(recognizer, job_rx, outcome_tx))?;
        drop(handle);

        Ok(Self {
            jobs: job_tx,
            outcomes: outcome_rx,
        })
    }

    pub fn submit(&self, job: RecognitionJob) -> Result<()> {
        self.jobs
            .send(job)
            .map_err(|_| anyhow!("OCR worker is not running"))
    }

    /// Returns an outcome if one is ready, without blocking.
    ///
    /// Fails once the worker thread is gone and every outcome was drained.
    pub fn try_next(&self) -> Result<Option<RecognitionOutcome>> {
        match self.outcomes.try_recv() {
            Ok(outcome) => Ok(Some(outcome)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(anyhow!("OCR worker exited")),
        }
    }

    /// Waits up to `timeout` for the next outcome.
    pub fn next_timeout(&self, timeout: Duration) -> Result<Option<RecognitionOutcome>> {
        match self.outcomes.recv_timeout(timeout) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(anyhow!("OCR worker exited")),
        }
    }
}
