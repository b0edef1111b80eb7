//! Application state management for lingolah
//!
//! This module contains the main application state, handling keyboard input,
//! term selection, and applying background fetch results to the explanation
//! cache.

use crossterm::event::{KeyCode, KeyEvent};

use crate::cache::{ExplanationRecord, FetchFailure, FetchPolicy, TermExplanationCache};
use crate::fetch::{CacheEvent, FetchCoordinator, Selection};
use crate::glossary::{Category, Glossary};

/// Main application struct managing state and data
pub struct App {
    /// The catalog being browsed
    pub glossary: Glossary,
    /// Index of the active category tab
    pub selected_category: usize,
    /// Index of the highlighted term within the active category
    pub selected_term: usize,
    /// Term shown in the detail pane
    pub active_term: Option<String>,
    /// Most recent failure for the active term
    pub last_failure: Option<FetchFailure>,
    /// One-line status message for the footer
    pub status: Option<String>,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    /// Scroll offset for the detail pane
    pub detail_scroll_offset: u16,
    /// Session explanation cache
    cache: TermExplanationCache,
    /// Background fetch coordinator
    fetcher: FetchCoordinator,
}

impl App {
    /// Creates a new App browsing `glossary`
    pub fn new(glossary: Glossary, policy: FetchPolicy, fetcher: FetchCoordinator) -> Self {
        Self {
            glossary,
            selected_category: 0,
            selected_term: 0,
            active_term: None,
            last_failure: None,
            status: None,
            should_quit: false,
            show_help: false,
            detail_scroll_offset: 0,
            cache: TermExplanationCache::with_policy(policy),
            fetcher,
        }
    }

    /// Returns the explanation cache
    pub fn cache(&self) -> &TermExplanationCache {
        &self.cache
    }

    /// Returns the active category, if the glossary has any
    pub fn current_category(&self) -> Option<&Category> {
        self.glossary.category(self.selected_category)
    }

    /// Returns the terms of the active category
    pub fn current_terms(&self) -> &[String] {
        self.current_category()
            .map(|c| c.terms.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the highlighted term, if the active category has any
    pub fn highlighted_term(&self) -> Option<&str> {
        self.current_terms()
            .get(self.selected_term)
            .map(String::as_str)
    }

    /// Returns the active term together with its current record
    pub fn active_record(&self) -> Option<(&str, ExplanationRecord)> {
        let term = self.active_term.as_deref()?;
        Some((term, self.cache.lookup(term)))
    }

    /// Returns true if any fetch is still running
    pub fn is_fetching(&self) -> bool {
        self.cache.pending_count() > 0
    }

    /// Handles a term selection event
    ///
    /// A refused selection (another term holds the session-wide fetch slot)
    /// leaves the detail pane unchanged and explains why in the status line.
    pub fn select_term(&mut self, term: &str) -> Selection {
        let selection = self.fetcher.select(&mut self.cache, term);

        match &selection {
            Selection::Busy { pending } => {
                self.status = Some(format!(
                    "Still fetching '{}'. Please wait for it to finish.",
                    pending
                ));
            }
            Selection::Cached(_) | Selection::Waiting | Selection::Started(_) => {
                if self.active_term.as_deref() != Some(term) {
                    self.detail_scroll_offset = 0;
                }
                self.active_term = Some(term.to_string());
                self.last_failure = None;
                self.status = None;
            }
        }

        selection
    }

    /// Selects the highlighted term
    ///
    /// Returns `None` without touching the cache when the category is empty.
    pub fn select_highlighted(&mut self) -> Option<Selection> {
        let term = self.highlighted_term()?.to_string();
        Some(self.select_term(&term))
    }

    /// Applies every fetch message received so far
    ///
    /// # Returns
    /// The number of state changes applied
    pub fn poll_fetches(&mut self) -> usize {
        let mut applied = 0;
        while let Some(message) = self.fetcher.try_recv() {
            if let Some(event) = self.fetcher.apply(&mut self.cache, message) {
                self.handle_cache_event(event);
                applied += 1;
            }
        }
        applied
    }

    /// Waits until every running fetch has been applied
    pub async fn settle_fetches(&mut self) {
        for event in self.fetcher.settle(&mut self.cache).await {
            self.handle_cache_event(event);
        }
    }

    fn handle_cache_event(&mut self, event: CacheEvent) {
        match event {
            CacheEvent::Progress { .. } => {}
            CacheEvent::Ready { term } => {
                if self.active_term.as_deref() != Some(term.as_str()) {
                    self.status = Some(format!("Explanation for '{}' is ready", term));
                }
            }
            CacheEvent::Failed { term, failure } => {
                if self.active_term.as_deref() == Some(term.as_str()) {
                    self.last_failure = Some(failure);
                } else {
                    self.status = Some(format!("Fetching '{}' failed: {}", term, failure));
                }
            }
        }
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`: Quit the application
    /// - `Esc`: Close help, otherwise quit
    /// - `Left`/`h`, `Right`/`l`, `Tab`, `BackTab`: Switch category
    /// - `Up`/`k`, `Down`/`j`: Move term selection
    /// - `Enter`: Explain the highlighted term
    /// - `PageUp`/`PageDown`, `g`: Scroll the explanation
    /// - `?`: Toggle help
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        // Help overlay intercepts all keys when shown
        if self.show_help {
            match key_event.code {
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q') => {
                    self.show_help = false;
                }
                _ => {}
            }
            return;
        }

        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                self.next_category();
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                self.previous_category();
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection_down();
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection_up();
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.select_highlighted();
            }
            KeyCode::PageDown => {
                self.scroll_down();
            }
            KeyCode::PageUp => {
                self.scroll_up();
            }
            KeyCode::Char('g') => {
                self.detail_scroll_offset = 0;
            }
            KeyCode::Char('?') => {
                self.show_help = true;
            }
            _ => {}
        }
    }

    /// Switches to the next category tab, wrapping at the end
    fn next_category(&mut self) {
        let count = self.glossary.len();
        if count == 0 {
            return;
        }
        self.selected_category = (self.selected_category + 1) % count;
        self.selected_term = 0;
    }

    /// Switches to the previous category tab, wrapping at the start
    fn previous_category(&mut self) {
        let count = self.glossary.len();
        if count == 0 {
            return;
        }
        self.selected_category = if self.selected_category == 0 {
            count - 1
        } else {
            self.selected_category - 1
        };
        self.selected_term = 0;
    }

    /// Moves the selection up in the list, wrapping to bottom if at top
    fn move_selection_up(&mut self) {
        let count = self.current_terms().len();
        if count == 0 {
            return;
        }
        if self.selected_term == 0 {
            self.selected_term = count - 1;
        } else {
            self.selected_term -= 1;
        }
    }

    /// Moves the selection down in the list, wrapping to top if at bottom
    fn move_selection_down(&mut self) {
        let count = self.current_terms().len();
        if count == 0 {
            return;
        }
        self.selected_term = (self.selected_term + 1) % count;
    }

    /// Scrolls the detail pane up by a page
    pub fn scroll_up(&mut self) {
        self.detail_scroll_offset = self.detail_scroll_offset.saturating_sub(5);
    }

    /// Scrolls the detail pane down by a page, clamped by the renderer
    pub fn scroll_down(&mut self) {
        self.detail_scroll_offset = self.detail_scroll_offset.saturating_add(5);
    }
}
