//! Saved word history.
//!
//! The whole list is persisted as one JSON blob and every operation reads,
//! modifies and rewrites it. The list is always most-recent-first.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};

use super::storage::KeyValueStore;

/// Length of the random part of a word id.
const ID_SUFFIX_LEN: usize = 7;

/// A saved word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordItem {
    pub id: String,
    pub text: String,
    /// Creation time, epoch milliseconds
    pub timestamp: i64,
}

pub struct HistoryStore {
    storage: Box<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    /// Serializes read-modify-write cycles on the persisted blob.
    lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(storage: Box<dyn KeyValueStore>, key: impl Into<String>, capacity: usize) -> Self {
        Self {
            storage,
            key: key.into(),
            capacity,
            lock: Mutex::new(()),
        }
    }

    /// Returns the saved words, most recent first.
    ///
    /// Missing or corrupt data reads as an empty list.
    pub fn list(&self) -> Vec<WordItem> {
        match self.guard() {
            Ok(_guard) => self.read(),
            Err(e) => {
                log::warn!("History unavailable: {}", e);
                Vec::new()
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<WordItem> {
        self.list().into_iter().find(|item| item.id == id)
    }

    /// Saves a word at the most recent position.
    ///
    /// The first character is capitalized, an existing entry with the same
    /// text (ignoring case) is replaced, and the list is cut to capacity.
    /// Blank text is ignored.
    pub fn add(&self, text: &str) -> Result<Vec<WordItem>> {
        let _guard = self.guard()?;
        let clean = text.trim();
        if clean.is_empty() {
            return Ok(self.read());
        }

        let item = WordItem {
            id: generate_id(),
            text: capitalize_first(clean),
            timestamp: Utc::now().timestamp_millis(),
        };

        let lowered = clean.to_lowercase();
        let mut history: Vec<WordItem> = self
            .read()
            .into_iter()
            .filter(|existing| existing.text.to_lowercase() != lowered)
            .collect();
        log::info!("Saving word {:?}", item.text);
        history.insert(0, item);
        history.truncate(self.capacity);

        self.write(&history)?;
        Ok(history)
    }

    /// Saves several words given in reading order.
    ///
    /// Words are added last-first, so the list afterwards starts with the
    /// words in their original reading order.
    pub fn add_batch<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<WordItem>> {
        let mut history = self.list();
        for word in words.iter().rev() {
            history = self.add(word.as_ref())?;
        }
        Ok(history)
    }

    /// Replaces the text of one entry. Id and timestamp are kept, and no
    /// duplicate check is made. Blank text or an unknown id is a no-op.
    pub fn update(&self, id: &str, new_text: &str) -> Result<Vec<WordItem>> {
        let _guard = self.guard()?;
        let mut history = self.read();
        let clean = new_text.trim();
        if clean.is_empty() {
            return Ok(history);
        }

        let Some(item) = history.iter_mut().find(|item| item.id == id) else {
            return Ok(history);
        };
        item.text = clean.to_string();

        self.write(&history)?;
        Ok(history)
    }

    /// Deletes one entry; unknown ids are a no-op.
    pub fn remove(&self, id: &str) -> Result<Vec<WordItem>> {
        let _guard = self.guard()?;
        let mut history = self.read();
        let before = history.len();
        history.retain(|item| item.id != id);
        if history.len() == before {
            return Ok(history);
        }

        self.write(&history)?;
        Ok(history)
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>> {
        self.lock.lock().map_err(|_| anyhow!("History lock poisoned"))
    }

    fn read(&self) -> Vec<WordItem> {
        let stored = match self.storage.get(&self.key) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::warn!("Failed to load history: {:#}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&stored).unwrap_or_else(|e| {
            log::warn!("Discarding corrupt history: {}", e);
            Vec::new()
        })
    }

    fn write(&self, history: &[WordItem]) -> Result<()> {
        let blob = serde_json::to_string(history)?;
        self.storage
            .set(&self.key, &blob)
            .context("Failed to save history")
    }
}

/// Millisecond timestamp plus a random base-36 suffix; unique even when
/// several words are added within the same millisecond.
fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| std::char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
