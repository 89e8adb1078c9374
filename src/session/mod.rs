//! Session sidebar state.
//!
//! The sidebar lists chat sessions newest-first. Selecting a session is
//! the one action that invalidates the transcript: the caller clears
//! the view and refetches history for the new selection.

use serde::{Deserialize, Serialize};

/// One sidebar row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub id: i64,
    pub name: String,
}

impl SessionEntry {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Outcome of a sidebar selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The active session changed; the transcript must be cleared and
    /// history refetched.
    Changed,
    /// The session was already active; nothing to do.
    Unchanged,
    /// No such session in the list.
    Unknown,
}

/// Ordered session list with an active selection.
#[derive(Debug, Clone, Default)]
pub struct Sidebar {
    entries: Vec<SessionEntry>,
    active: Option<i64>,
}

impl Sidebar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn active(&self) -> Option<i64> {
        self.active
    }

    /// Replace the list, e.g. after fetching it from the backend. The
    /// active selection is kept only if it still exists.
    pub fn set_entries(&mut self, entries: Vec<SessionEntry>) {
        self.entries = entries;
        if let Some(active) = self.active {
            if !self.entries.iter().any(|e| e.id == active) {
                self.active = None;
            }
        }
    }

    /// Add a freshly created session at the top and select it.
    pub fn prepend(&mut self, entry: SessionEntry) {
        self.active = Some(entry.id);
        self.entries.insert(0, entry);
    }

    /// Select a session by id.
    pub fn select(&mut self, id: i64) -> Selection {
        if !self.entries.iter().any(|e| e.id == id) {
            return Selection::Unknown;
        }
        if self.active == Some(id) {
            return Selection::Unchanged;
        }
        self.active = Some(id);
        Selection::Changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sidebar_with(ids: &[i64]) -> Sidebar {
        let mut sidebar = Sidebar::new();
        sidebar.set_entries(
            ids.iter()
                .map(|&id| SessionEntry::new(id, format!("Chat {}", id)))
                .collect(),
        );
        sidebar
    }

    #[test]
    fn test_select_changes_active() {
        let mut sidebar = sidebar_with(&[1, 2]);
        assert_eq!(sidebar.select(2), Selection::Changed);
        assert_eq!(sidebar.active(), Some(2));
    }

    #[test]
    fn test_reselect_is_unchanged() {
        let mut sidebar = sidebar_with(&[1]);
        sidebar.select(1);
        assert_eq!(sidebar.select(1), Selection::Unchanged);
    }

    #[test]
    fn test_select_unknown_id() {
        let mut sidebar = sidebar_with(&[1]);
        assert_eq!(sidebar.select(9), Selection::Unknown);
        assert_eq!(sidebar.active(), None);
    }

    #[test]
    fn test_prepend_puts_new_session_first_and_selects_it() {
        let mut sidebar = sidebar_with(&[1, 2]);
        sidebar.prepend(SessionEntry::new(3, "New Chat"));
        assert_eq!(sidebar.entries()[0].id, 3);
        assert_eq!(sidebar.active(), Some(3));
    }

    #[test]
    fn test_set_entries_drops_stale_selection() {
        let mut sidebar = sidebar_with(&[1, 2]);
        sidebar.select(2);
        sidebar.set_entries(vec![SessionEntry::new(1, "Chat 1")]);
        assert_eq!(sidebar.active(), None);
    }
}
