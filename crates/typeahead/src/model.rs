use lede_core::SearchResult;
use serde::Serialize;

use crate::nav::{self, Key};

pub const MSG_SEARCH_FAILED: &str = "Sökning misslyckades";
pub const MSG_INDEXING: &str = "Indexerar inlägg…";
pub const MSG_NO_RESULTS: &str = "Inga resultat hittades.";

pub fn min_chars_message(min_chars: usize) -> String {
    format!("Skriv minst {} tecken…", min_chars)
}

/// Full-results page for a submitted query.
pub fn search_href(query: &str) -> String {
    format!("/search?q={}", urlencoding::encode(query))
}

/// Side effects a session asks its host to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    FocusInput,
}

/// What the panel renders. Published whenever it changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct View {
    pub query: String,
    pub open: bool,
    pub highlight: Option<usize>,
    pub results: Vec<SearchResult>,
    pub loading: bool,
    pub error: Option<String>,
    pub empty_state: Option<String>,
}

/// Interaction state of one search box, free of timers and I/O.
///
/// `input` is what the user typed; `committed` is the trimmed input that
/// survived the debounce and drives results.
#[derive(Debug, Default)]
pub struct Session {
    input: String,
    committed: String,
    open: bool,
    highlight: Option<usize>,
    results: Vec<SearchResult>,
    loading: bool,
    error: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }
    pub fn committed(&self) -> &str {
        &self.committed
    }
    pub fn is_open(&self) -> bool {
        self.open
    }
    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }
    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }
    pub fn is_loading(&self) -> bool {
        self.loading
    }
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
        self.open = true;
        self.settle();
    }

    pub fn focus(&mut self) {
        self.open = true;
        self.settle();
    }

    /// Escape, Tab, outside click: hide the panel, keep the input.
    pub fn close(&mut self) {
        self.open = false;
        self.settle();
    }

    /// Ignored while the panel is closed.
    pub fn hover(&mut self, idx: usize) {
        if self.open && idx < self.results.len() {
            self.highlight = Some(idx);
        }
        self.settle();
    }

    pub fn mouse_down(&mut self, idx: usize) -> Option<Action> {
        let href = self.results.get(idx)?.href.clone();
        Some(self.go(href))
    }

    pub fn submit(&mut self) -> Action {
        let q = self.input.trim().to_string();
        self.close();
        if q.is_empty() {
            Action::FocusInput
        } else {
            Action::Navigate(search_href(&q))
        }
    }

    pub fn key(&mut self, key: Key) -> Option<Action> {
        if !self.open || self.results.is_empty() {
            match key {
                Key::Enter => return Some(self.submit()),
                Key::Tab => self.close(),
                _ => {}
            }
            return None;
        }
        match key {
            Key::Escape | Key::Tab => {
                self.close();
                None
            }
            Key::Enter => match self.highlight.and_then(|i| self.results.get(i)) {
                Some(r) => {
                    let href = r.href.clone();
                    Some(self.go(href))
                }
                None => Some(self.submit()),
            },
            _ => {
                self.highlight = nav::step(key, self.highlight, self.results.len());
                None
            }
        }
    }

    /// Returns false when `query` is already committed.
    pub fn commit(&mut self, query: String) -> bool {
        if query == self.committed {
            return false;
        }
        self.committed = query;
        true
    }

    /// Query shorter than the minimum: nothing to show. An empty committed
    /// query also hides the panel.
    pub fn idle(&mut self) {
        self.results.clear();
        self.loading = false;
        self.error = None;
        if self.committed.is_empty() {
            self.open = false;
        }
        self.settle();
    }

    pub fn pending(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn show(&mut self, results: Vec<SearchResult>, error: Option<String>) {
        self.results = results;
        self.loading = false;
        self.error = error;
        self.settle();
    }

    /// Which hint to show instead of rows, if any.
    pub fn empty_state(&self, min_chars: usize, indexing: bool) -> Option<String> {
        if !self.results.is_empty() || self.loading {
            return None;
        }
        if self.committed.is_empty() || self.committed.chars().count() < min_chars {
            Some(min_chars_message(min_chars.max(1)))
        } else if indexing {
            Some(MSG_INDEXING.to_string())
        } else {
            Some(MSG_NO_RESULTS.to_string())
        }
    }

    pub fn view(&self, min_chars: usize, indexing: bool) -> View {
        View {
            query: self.input.clone(),
            open: self.open,
            highlight: self.highlight,
            results: self.results.clone(),
            loading: self.loading,
            error: self.error.clone(),
            empty_state: self.empty_state(min_chars, indexing),
        }
    }

    fn go(&mut self, href: String) -> Action {
        self.close();
        Action::Navigate(href)
    }

    /// Closed panels and empty lists have no cursor; an open panel with rows
    /// always highlights one, clamped into range.
    fn settle(&mut self) {
        let n = self.results.len();
        self.highlight = if !self.open || n == 0 {
            None
        } else {
            Some(self.highlight.map_or(0, |i| i.min(n - 1)))
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lede_core::DocId;

    fn rows(n: usize) -> Vec<SearchResult> {
        (0..n)
            .map(|i| SearchResult { id: DocId::Num(i as i64), title: format!("r{}", i), href: format!("/r{}", i) })
            .collect()
    }

    fn open_with(n: usize) -> Session {
        let mut s = Session::new();
        s.set_input("kaf");
        s.commit("kaf".into());
        s.show(rows(n), None);
        s
    }

    #[test]
    fn opening_with_rows_highlights_first() {
        let s = open_with(3);
        assert!(s.is_open());
        assert_eq!(s.highlight(), Some(0));
    }

    #[test]
    fn shrinking_results_clamps_highlight() {
        let mut s = open_with(5);
        s.key(Key::End);
        assert_eq!(s.highlight(), Some(4));
        s.show(rows(2), None);
        assert_eq!(s.highlight(), Some(1));
        s.show(Vec::new(), None);
        assert_eq!(s.highlight(), None);
    }

    #[test]
    fn arrow_up_wraps_from_first() {
        let mut s = open_with(3);
        assert_eq!(s.key(Key::ArrowUp), None);
        assert_eq!(s.highlight(), Some(2));
        s.key(Key::ArrowDown);
        assert_eq!(s.highlight(), Some(0));
    }

    #[test]
    fn enter_opens_highlighted_row_and_closes() {
        let mut s = open_with(3);
        s.key(Key::ArrowDown);
        assert_eq!(s.key(Key::Enter), Some(Action::Navigate("/r1".into())));
        assert!(!s.is_open());
        assert_eq!(s.highlight(), None);
        assert_eq!(s.input(), "kaf");
    }

    #[test]
    fn enter_without_rows_submits_full_search() {
        let mut s = Session::new();
        s.set_input("  kaffe & te ");
        assert_eq!(s.key(Key::Enter), Some(Action::Navigate("/search?q=kaffe%20%26%20te".into())));
        assert!(!s.is_open());
    }

    #[test]
    fn blank_submit_refocuses() {
        let mut s = Session::new();
        s.set_input("   ");
        assert_eq!(s.submit(), Action::FocusInput);
    }

    #[test]
    fn escape_and_tab_close_but_keep_input() {
        let mut s = open_with(3);
        assert_eq!(s.key(Key::Escape), None);
        assert!(!s.is_open());
        assert_eq!(s.input(), "kaf");
        s.focus();
        assert_eq!(s.highlight(), Some(0));
        s.key(Key::Tab);
        assert!(!s.is_open());
    }

    #[test]
    fn keys_on_closed_panel_do_not_move() {
        let mut s = open_with(3);
        s.close();
        assert_eq!(s.key(Key::ArrowDown), None);
        assert_eq!(s.highlight(), None);
    }

    #[test]
    fn hover_and_click() {
        let mut s = open_with(3);
        s.hover(2);
        assert_eq!(s.highlight(), Some(2));
        s.hover(9);
        assert_eq!(s.highlight(), Some(2));
        assert_eq!(s.mouse_down(9), None);
        assert_eq!(s.mouse_down(1), Some(Action::Navigate("/r1".into())));
        assert!(!s.is_open());
    }

    #[test]
    fn hover_on_closed_panel_keeps_no_cursor() {
        let mut s = open_with(3);
        s.close();
        s.hover(1);
        assert!(!s.is_open());
        assert_eq!(s.highlight(), None);
        s.focus();
        assert_eq!(s.highlight(), Some(0));
    }

    #[test]
    fn commit_reports_changes_only() {
        let mut s = Session::new();
        assert!(!s.commit(String::new()));
        assert!(s.commit("a".into()));
        assert!(!s.commit("a".into()));
    }

    #[test]
    fn idle_on_empty_query_closes() {
        let mut s = open_with(2);
        s.commit(String::new());
        s.idle();
        assert!(!s.is_open());
        assert!(s.results().is_empty());
    }

    #[test]
    fn empty_state_precedence() {
        let mut s = Session::new();
        s.focus();
        assert_eq!(s.empty_state(2, true).as_deref(), Some("Skriv minst 2 tecken…"));
        s.commit("ka".into());
        assert_eq!(s.empty_state(2, true).as_deref(), Some(MSG_INDEXING));
        assert_eq!(s.empty_state(2, false).as_deref(), Some(MSG_NO_RESULTS));
        s.pending();
        assert_eq!(s.empty_state(2, false), None);
        s.show(Vec::new(), Some(MSG_SEARCH_FAILED.into()));
        assert_eq!(s.empty_state(2, false).as_deref(), Some(MSG_NO_RESULTS));
        assert_eq!(s.error(), Some(MSG_SEARCH_FAILED));
        s.show(rows(1), Some(MSG_SEARCH_FAILED.into()));
        assert_eq!(s.empty_state(2, false), None);
        s.show(rows(1), None);
        assert_eq!(s.empty_state(2, false), None);
    }
}
