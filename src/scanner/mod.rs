//! Capture-to-selection pipeline.
//!
//! This module provides:
//! - The scan session state machine and selection modes (`state`)
//! - Channels and the worker thread running the recognizer (`queue`, `ocr_worker`)
//! - The scanner controller tying camera, OCR and session together (`runner`)

pub mod ocr_worker;
pub mod queue;
pub mod runner;
pub mod state;

pub use ocr_worker::RecognitionWorker;
pub use runner::Scanner;
#[allow(unused_imports)]
pub use state::{ScanNotice, ScanOutput, ScanSession, ScanStatus, SelectionMode};
