use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scoring::Band;

/// Most recent saved calculations kept; older ones are dropped.
pub const HISTORY_CAP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub university: String,
    pub course: String,
    pub composite: f64,
    pub band: Band,
    pub saved_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn composite_display(&self) -> String {
        format!("{:.2}", self.composite)
    }
}

/// Saved entries, newest first. Stored as a bare JSON array under the
/// history key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryState {
    pub entries: Vec<HistoryEntry>,
}

impl HistoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for a new entry: the timestamp in milliseconds, bumped past the
    /// newest entry if the clock has not moved on.
    pub fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let millis = now.timestamp_millis().max(0) as u64;
        let newest = self.entries.iter().map(|e| e.id).max().unwrap_or(0);
        millis.max(newest + 1)
    }

    /// Put `entry` at the front and evict from the back beyond the cap.
    pub fn push_front(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
    }

    /// Returns true if an entry was removed.
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(id: u64) -> HistoryEntry {
        HistoryEntry {
            id,
            university: "University of Lagos".to_string(),
            course: "Law".to_string(),
            composite: 72.5,
            band: Band::HighlyCompetitive,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_new_state_empty() {
        let state = HistoryState::new();
        assert!(state.entries.is_empty());
        assert_eq!(serde_json::to_string(&state).unwrap(), "[]");
    }

    #[test]
    fn test_push_front_caps_and_evicts_oldest() {
        let mut state = HistoryState::new();
        for id in 1..=HISTORY_CAP as u64 + 1 {
            state.push_front(entry(id));
        }
        assert_eq!(state.entries.len(), HISTORY_CAP);
        assert_eq!(state.entries[0].id, 11);
        assert_eq!(state.entries.last().unwrap().id, 2);
    }

    #[test]
    fn test_next_id_is_strictly_increasing() {
        let mut state = HistoryState::new();
        let now = Utc::now();
        let first = state.next_id(now);
        state.push_front(entry(first));
        let second = state.next_id(now);
        assert!(second > first);

        // Clock going backwards still yields a fresh id
        let third = state.next_id(now - Duration::hours(1));
        assert!(third > first);
    }

    #[test]
    fn test_remove() {
        let mut state = HistoryState::new();
        state.push_front(entry(1));
        state.push_front(entry(2));
        assert!(state.remove(1));
        assert!(!state.remove(1));
        assert_eq!(state.entries.len(), 1);
    }

    #[test]
    fn test_composite_display() {
        let mut e = entry(1);
        e.composite = 50.0;
        assert_eq!(e.composite_display(), "50.00");
    }
}
