//! Navigation stack mirrored against the platform back-history.
//!
//! The list view is the implicit bottom and is never pushed. Above it sit at
//! most one detail frame and at most one scanner frame. Every transition
//! returns the history operation the platform shell has to mirror, and a
//! back signal closes exactly one layer, decided by the open/closed flags
//! rather than by the frame bookkeeping.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail,
    Scanner,
}

/// Operation the platform back-history must apply to stay in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOp {
    Push(View),
    Replace(View),
    Pop,
}

/// What a back signal did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    ClosedScanner,
    ClosedDetail,
    /// Consumed the entry a detail view closed under the scanner left behind;
    /// the visible view does not change
    DiscardedEntry,
    /// Nothing to close; the platform default applies (exit or navigate away)
    PlatformDefault,
}

#[derive(Debug, Default)]
pub struct NavigationStack {
    frames: Vec<View>,
    scanner_open: bool,
    detail: Option<String>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scanner_open(&self) -> bool {
        self.scanner_open
    }

    /// Id of the word shown in the detail view.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Frames above the implicit list view, bottom first.
    pub fn frames(&self) -> &[View] {
        &self.frames
    }

    /// The visible view.
    pub fn current_view(&self) -> View {
        if self.scanner_open {
            View::Scanner
        } else if self.detail.is_some() {
            View::Detail
        } else {
            View::List
        }
    }

    pub fn open_scanner(&mut self) -> Option<HistoryOp> {
        if self.scanner_open {
            return None;
        }
        self.scanner_open = true;
        self.frames.push(View::Scanner);
        log::debug!("nav: open scanner, depth {}", self.frames.len());
        Some(HistoryOp::Push(View::Scanner))
    }

    /// Explicit close (close button). Pops the scanner frame together with
    /// the state change.
    pub fn close_scanner(&mut self) -> Option<HistoryOp> {
        if !self.scanner_open {
            return None;
        }
        self.scanner_open = false;
        self.remove_frame(View::Scanner);
        log::debug!("nav: close scanner, depth {}", self.frames.len());
        Some(HistoryOp::Pop)
    }

    /// Shows a word's detail view. A second selection while a detail view is
    /// open replaces it instead of stacking.
    pub fn show_detail(&mut self, id: &str) -> Option<HistoryOp> {
        if self.detail.is_some() {
            self.detail = Some(id.to_string());
            // Only the top entry can be replaced in the platform history
            return (self.frames.last() == Some(&View::Detail))
                .then_some(HistoryOp::Replace(View::Detail));
        }

        self.detail = Some(id.to_string());
        self.frames.push(View::Detail);
        log::debug!("nav: open detail {}, depth {}", id, self.frames.len());
        Some(HistoryOp::Push(View::Detail))
    }

    /// Explicit close of the detail view (mobile back button).
    ///
    /// With the scanner on top there is no history operation to issue: the
    /// detail frame stays behind for a scan commit to reuse, or for the next
    /// back signal to consume.
    pub fn close_detail(&mut self) -> Option<HistoryOp> {
        self.detail.take()?;
        if self.frames.last() != Some(&View::Detail) {
            log::debug!("nav: detail closed under scanner, frame kept");
            return None;
        }
        self.frames.pop();
        log::debug!("nav: close detail, depth {}", self.frames.len());
        Some(HistoryOp::Pop)
    }

    /// A scan commit that lands on a word's detail view.
    ///
    /// The scanner frame turns into the detail frame so that one back press
    /// from the detail returns to the list. If a detail frame already sits
    /// under the scanner, the scanner frame is popped and that detail shows
    /// the new word.
    pub fn commit_from_scanner(&mut self, id: &str) -> Option<HistoryOp> {
        if !self.scanner_open {
            return self.show_detail(id);
        }
        self.scanner_open = false;

        if self.detail.is_some() || self.frames.contains(&View::Detail) {
            self.detail = Some(id.to_string());
            self.remove_frame(View::Scanner);
            return Some(HistoryOp::Pop);
        }

        self.detail = Some(id.to_string());
        match self.frames.iter().rposition(|v| *v == View::Scanner) {
            Some(pos) => self.frames[pos] = View::Detail,
            None => self.frames.push(View::Detail),
        }
        log::debug!("nav: scanner replaced by detail {}", id);
        Some(HistoryOp::Replace(View::Detail))
    }

    /// Handles the platform back signal (the platform has already popped
    /// its entry). Closes the scanner first, then the detail view.
    pub fn on_back(&mut self) -> BackOutcome {
        if self.scanner_open {
            self.scanner_open = false;
            self.remove_frame(View::Scanner);
            BackOutcome::ClosedScanner
        } else if self.detail.is_some() {
            self.detail = None;
            self.remove_frame(View::Detail);
            BackOutcome::ClosedDetail
        } else if let Some(view) = self.frames.pop() {
            log::debug!("nav: back consumed leftover {:?} frame", view);
            BackOutcome::DiscardedEntry
        } else {
            self.frames.clear();
            BackOutcome::PlatformDefault
        }
    }

    fn remove_frame(&mut self, view: View) {
        if let Some(pos) = self.frames.iter().rposition(|v| *v == view) {
            self.frames.remove(pos);
        } else {
            log::warn!("nav: no {:?} frame to remove", view);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_back_closes_scanner() {
        let mut nav = NavigationStack::new();
        assert_eq!(nav.open_scanner(), Some(HistoryOp::Push(View::Scanner)));
        assert_eq!(nav.open_scanner(), None, "only one scanner frame");
        assert_eq!(nav.current_view(), View::Scanner);

        assert_eq!(nav.on_back(), BackOutcome::ClosedScanner);
        assert_eq!(nav.current_view(), View::List);
        assert!(nav.frames().is_empty());
    }

    #[test]
    fn test_back_priority_scanner_then_detail() {
        let mut nav = NavigationStack::new();
        nav.show_detail("w1");
        nav.open_scanner();
        assert_eq!(nav.frames(), &[View::Detail, View::Scanner]);

        assert_eq!(nav.on_back(), BackOutcome::ClosedScanner);
        assert_eq!(nav.detail(), Some("w1"));
        assert_eq!(nav.on_back(), BackOutcome::ClosedDetail);
        assert_eq!(nav.on_back(), BackOutcome::PlatformDefault);
    }

    #[test]
    fn test_back_priority_holds_with_broken_bookkeeping() {
        let mut nav = NavigationStack::new();
        nav.show_detail("w1");
        nav.open_scanner();
        nav.frames.clear();

        assert_eq!(nav.on_back(), BackOutcome::ClosedScanner);
        assert_eq!(nav.on_back(), BackOutcome::ClosedDetail);
    }

    #[test]
    fn test_second_detail_replaces() {
        let mut nav = NavigationStack::new();
        assert_eq!(nav.show_detail("w1"), Some(HistoryOp::Push(View::Detail)));
        assert_eq!(nav.show_detail("w2"), Some(HistoryOp::Replace(View::Detail)));
        assert_eq!(nav.show_detail("w3"), Some(HistoryOp::Replace(View::Detail)));

        assert_eq!(nav.frames(), &[View::Detail]);
        assert_eq!(nav.detail(), Some("w3"));
        assert_eq!(nav.on_back(), BackOutcome::ClosedDetail);
        assert_eq!(nav.current_view(), View::List);
    }

    #[test]
    fn test_commit_replaces_scanner_frame() {
        let mut nav = NavigationStack::new();
        nav.open_scanner();

        assert_eq!(nav.commit_from_scanner("w1"), Some(HistoryOp::Replace(View::Detail)));
        assert_eq!(nav.frames(), &[View::Detail]);
        assert_eq!(nav.current_view(), View::Detail);

        // One back press returns to the list, not the camera
        assert_eq!(nav.on_back(), BackOutcome::ClosedDetail);
        assert_eq!(nav.current_view(), View::List);
        assert!(nav.frames().is_empty());
    }

    #[test]
    fn test_commit_over_existing_detail() {
        let mut nav = NavigationStack::new();
        nav.show_detail("w1");
        nav.open_scanner();

        assert_eq!(nav.commit_from_scanner("w2"), Some(HistoryOp::Pop));
        assert_eq!(nav.frames(), &[View::Detail]);
        assert_eq!(nav.detail(), Some("w2"));
    }

    #[test]
    fn test_close_detail_under_scanner_issues_no_op() {
        let mut nav = NavigationStack::new();
        nav.show_detail("w1");
        nav.open_scanner();

        assert_eq!(nav.close_detail(), None);
        assert_eq!(nav.detail(), None);
        assert_eq!(nav.frames(), &[View::Detail, View::Scanner]);
        assert_eq!(nav.current_view(), View::Scanner);

        // The commit reuses the leftover detail frame
        assert_eq!(nav.commit_from_scanner("w2"), Some(HistoryOp::Pop));
        assert_eq!(nav.frames(), &[View::Detail]);
        assert_eq!(nav.detail(), Some("w2"));
    }

    #[test]
    fn test_back_consumes_leftover_detail_frame() {
        let mut nav = NavigationStack::new();
        nav.show_detail("w1");
        nav.open_scanner();
        nav.close_detail();

        assert_eq!(nav.on_back(), BackOutcome::ClosedScanner);
        assert_eq!(nav.current_view(), View::List);
        assert_eq!(nav.on_back(), BackOutcome::DiscardedEntry);
        assert!(nav.frames().is_empty());
        assert_eq!(nav.on_back(), BackOutcome::PlatformDefault);
    }

    #[test]
    fn test_explicit_closes() {
        let mut nav = NavigationStack::new();
        assert_eq!(nav.close_scanner(), None);
        assert_eq!(nav.close_detail(), None);

        nav.show_detail("w1");
        nav.open_scanner();
        assert_eq!(nav.close_scanner(), Some(HistoryOp::Pop));
        assert_eq!(nav.close_detail(), Some(HistoryOp::Pop));
        assert!(nav.frames().is_empty());
    }
}
