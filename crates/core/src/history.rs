//! Single-level undo log.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::registry::Registry;

/// Registry snapshot captured right before a change was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    snapshot: Registry,
    description: String,
    timestamp: String,
}

impl TransactionRecord {
    /// Record owning its own copy of the pre-change registry.
    pub fn new(snapshot: Registry, description: String, timestamp: String) -> Self {
        Self {
            snapshot,
            description,
            timestamp,
        }
    }

    /// Registry as it was before the change.
    pub fn snapshot(&self) -> &Registry {
        &self.snapshot
    }

    /// Consume the record, yielding the pre-change registry.
    pub fn into_snapshot(self) -> Registry {
        self.snapshot
    }

    /// Summary of the change.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Wall-clock time the change was applied.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

/// Records ordered most-recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    records: VecDeque<TransactionRecord>,
}

impl History {
    /// Empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a record to the front.
    pub fn record(&mut self, snapshot: Registry, description: String, timestamp: String) {
        self.records
            .push_front(TransactionRecord::new(snapshot, description, timestamp));
    }

    /// Pop the most recent record, or `None` when there is nothing to undo.
    ///
    /// The popped record is gone for good; there is no redo.
    pub fn undo(&mut self) -> Option<TransactionRecord> {
        self.records.pop_front()
    }

    /// Most recent record without removing it.
    pub fn latest(&self) -> Option<&TransactionRecord> {
        self.records.front()
    }

    /// Records from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether undo would be a no-op.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(count: usize) -> Registry {
        (0..count).fold(Registry::new(), |registry, _| {
            registry.add_player_with(1500, "#abcdef").0
        })
    }

    #[test]
    fn records_are_newest_first() {
        let mut history = History::new();
        history.record(registry_with(1), "first".into(), "10:00:00".into());
        history.record(registry_with(2), "second".into(), "10:00:01".into());

        let descriptions: Vec<_> = history.iter().map(|record| record.description()).collect();
        assert_eq!(descriptions, vec!["second", "first"]);
        assert_eq!(history.latest().map(|r| r.timestamp()), Some("10:00:01"));
    }

    #[test]
    fn undo_pops_in_sequence_then_stops() {
        let mut history = History::new();
        history.record(registry_with(1), "first".into(), "t".into());
        history.record(registry_with(2), "second".into(), "t".into());

        let latest = history.undo().map(|record| record.snapshot().len());
        assert_eq!(latest, Some(2));
        let earlier = history.undo().map(|record| record.snapshot().len());
        assert_eq!(earlier, Some(1));
        assert!(history.undo().is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn snapshot_is_independent_of_later_changes() {
        let mut history = History::new();
        let live = registry_with(2);
        history.record(live.clone(), "before rename".into(), "t".into());

        let live = live.rename_player(1, "Changed");
        assert_eq!(live.name_of(1), "Changed");
        assert_eq!(
            history.latest().map(|record| record.snapshot().name_of(1)),
            Some("Player 1")
        );
    }
}
