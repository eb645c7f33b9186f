//! Top-level application state: word history, the open views, and what
//! happens when a scan, a manual entry, or an edit produces a word.

pub mod navigation;

#[allow(unused_imports)]
pub use navigation::{BackOutcome, HistoryOp, NavigationStack, View};

use anyhow::Result;

use crate::config::AppConfig;
use crate::dictionary::{lookup_links, DictionaryLink};
use crate::history::{HistoryStore, WordItem};
use crate::scanner::ScanOutput;

pub struct App {
    config: AppConfig,
    history: HistoryStore,
    navigation: NavigationStack,
}

impl App {
    pub fn new(config: AppConfig, history: HistoryStore) -> Self {
        Self {
            config,
            history,
            navigation: NavigationStack::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn navigation(&self) -> &NavigationStack {
        &self.navigation
    }

    pub fn history(&self) -> Vec<WordItem> {
        self.history.list()
    }

    /// The word shown in the detail view, if it still exists.
    pub fn selected_word(&self) -> Option<WordItem> {
        self.navigation.detail().and_then(|id| self.history.get(id))
    }

    pub fn open_scanner(&mut self) -> Option<HistoryOp> {
        self.navigation.open_scanner()
    }

    pub fn close_scanner(&mut self) -> Option<HistoryOp> {
        self.navigation.close_scanner()
    }

    pub fn select_word(&mut self, id: &str) -> Option<HistoryOp> {
        self.navigation.show_detail(id)
    }

    pub fn close_detail(&mut self) -> Option<HistoryOp> {
        self.navigation.close_detail()
    }

    pub fn back(&mut self) -> BackOutcome {
        self.navigation.on_back()
    }

    /// Saves typed text and opens its detail view.
    pub fn manual_add(&mut self, text: &str) -> Result<Option<HistoryOp>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let history = self.history.add(text)?;
        Ok(history
            .first()
            .and_then(|item| self.navigation.show_detail(&item.id)))
    }

    /// Saves what the scanner produced, closes the scanner and opens the
    /// newest word's detail view.
    pub fn handle_scan_output(&mut self, output: ScanOutput) -> Result<Option<HistoryOp>> {
        let history = match &output {
            ScanOutput::Word(text) | ScanOutput::Sentence(text) => self.history.add(text)?,
            ScanOutput::Words(words) => self.history.add_batch(words.as_slice())?,
        };
        log::info!("Scan committed: {:?}", output);

        Ok(match history.first() {
            Some(item) => self.navigation.commit_from_scanner(&item.id),
            None => self.navigation.close_scanner(),
        })
    }

    pub fn edit_word(&mut self, id: &str, new_text: &str) -> Result<Vec<WordItem>> {
        self.history.update(id, new_text)
    }

    /// Deletes a word; its detail view closes if it was open.
    pub fn delete_word(&mut self, id: &str) -> Result<Option<HistoryOp>> {
        self.history.remove(id)?;
        if self.navigation.detail() == Some(id) {
            return Ok(self.navigation.close_detail());
        }
        Ok(None)
    }

    /// Dictionary links for the word in the detail view.
    pub fn lookup_selected(&self) -> Vec<DictionaryLink> {
        self.selected_word()
            .map(|item| lookup_links(&item.text, &self.config.dictionaries))
            .unwrap_or_default()
    }
}
