//! Persistent word history.
//!
//! This module provides:
//! - The string-keyed storage boundary and its file/memory backends (`storage`)
//! - The most-recent-first, de-duplicated, capacity-bounded word list (`store`)

pub mod storage;
pub mod store;

#[allow(unused_imports)]
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::{HistoryStore, WordItem};
