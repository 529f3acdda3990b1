//! A learner's completion history.
//!
//! Entries keep the order in which completions were recorded. Each topic has
//! at most one active entry: completing a topic again drops the older entry
//! and appends a fresh one at the end.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{HistoryEntry, TopicId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<HistoryEntry>", into = "Vec<HistoryEntry>")]
pub struct History {
    entries: BTreeMap<u64, HistoryEntry>,
    positions: HashMap<TopicId, u64>,
    next_seq: u64,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a completion, returning the timestamp of the entry it replaced.
    pub fn insert(&mut self, topic: TopicId, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let previous = self.remove(&topic).map(|e| e.at);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.positions.insert(topic.clone(), seq);
        self.entries.insert(seq, HistoryEntry { topic, at });

        previous
    }

    pub fn remove(&mut self, topic: &TopicId) -> Option<HistoryEntry> {
        let seq = self.positions.remove(topic)?;
        self.entries.remove(&seq)
    }

    /// Marks a topic done or not done. Returns false when nothing changed.
    pub fn set_completed(&mut self, topic: TopicId, done: bool, at: DateTime<Utc>) -> bool {
        if done {
            self.insert(topic, at);
            true
        } else {
            self.remove(&topic).is_some()
        }
    }

    pub fn contains(&self, topic: &TopicId) -> bool {
        self.positions.contains_key(topic)
    }

    pub fn completed_at(&self, topic: &TopicId) -> Option<DateTime<Utc>> {
        let seq = self.positions.get(topic)?;
        self.entries.get(seq).map(|e| e.at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in completion order.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.values()
    }

    pub fn topics(&self) -> impl Iterator<Item = &TopicId> {
        self.entries.values().map(|e| &e.topic)
    }
}

impl PartialEq for History {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl FromIterator<HistoryEntry> for History {
    fn from_iter<I: IntoIterator<Item = HistoryEntry>>(iter: I) -> Self {
        let mut history = History::new();
        for entry in iter {
            history.insert(entry.topic, entry.at);
        }
        history
    }
}

impl From<Vec<HistoryEntry>> for History {
    fn from(entries: Vec<HistoryEntry>) -> Self {
        entries.into_iter().collect()
    }
}

impl From<History> for Vec<HistoryEntry> {
    fn from(history: History) -> Self {
        history.entries.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 10, 9, minute, 0).unwrap()
    }

    fn topic(name: &str) -> TopicId {
        TopicId::new("Math", "Algebra", name)
    }

    fn order(history: &History) -> Vec<&str> {
        history.topics().map(|t| t.concept_name()).collect()
    }

    mod insert_tests {
        use super::*;

        #[test]
        fn insert_preserves_completion_order() {
            let mut history = History::new();
            history.insert(topic("c"), at(1));
            history.insert(topic("a"), at(2));
            history.insert(topic("b"), at(3));
            assert_eq!(order(&history), vec!["c", "a", "b"]);
        }

        #[test]
        fn reinsert_moves_topic_to_end() {
            let mut history = History::new();
            history.insert(topic("a"), at(1));
            history.insert(topic("b"), at(2));
            let previous = history.insert(topic("a"), at(3));

            assert_eq!(previous, Some(at(1)));
            assert_eq!(order(&history), vec!["b", "a"]);
            assert_eq!(history.len(), 2);
            assert_eq!(history.completed_at(&topic("a")), Some(at(3)));
        }

        #[test]
        fn insert_new_topic_returns_none() {
            let mut history = History::new();
            assert!(history.insert(topic("a"), at(1)).is_none());
        }
    }

    mod remove_tests {
        use super::*;

        #[test]
        fn remove_deletes_entry() {
            let mut history = History::new();
            history.insert(topic("a"), at(1));
            history.insert(topic("b"), at(2));

            let removed = history.remove(&topic("a")).unwrap();
            assert_eq!(removed.at, at(1));
            assert!(!history.contains(&topic("a")));
            assert_eq!(order(&history), vec!["b"]);
        }

        #[test]
        fn remove_missing_is_none() {
            let mut history = History::new();
            assert!(history.remove(&topic("a")).is_none());
        }
    }

    mod toggle_tests {
        use super::*;

        #[test]
        fn toggle_off_then_on_counts_once() {
            let mut history = History::new();
            history.set_completed(topic("a"), true, at(1));
            history.set_completed(topic("b"), true, at(2));
            history.set_completed(topic("a"), false, at(3));
            history.set_completed(topic("a"), true, at(4));

            assert_eq!(history.len(), 2);
            assert_eq!(order(&history), vec!["b", "a"]);
        }

        #[test]
        fn repeated_completion_does_not_duplicate() {
            let mut history = History::new();
            history.set_completed(topic("a"), true, at(1));
            history.set_completed(topic("a"), true, at(2));
            assert_eq!(history.len(), 1);
        }

        #[test]
        fn toggle_off_missing_reports_no_change() {
            let mut history = History::new();
            assert!(!history.set_completed(topic("a"), false, at(1)));
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn deserializes_ordered_entries() {
            let json = r#"[
                {"concept": "Math||Algebra||b", "at": "2026-01-10T09:01:00Z"},
                {"concept": "Math||Algebra||a", "at": "2026-01-10T09:02:00Z"}
            ]"#;
            let history: History = serde_json::from_str(json).unwrap();
            assert_eq!(order(&history), vec!["b", "a"]);
        }

        #[test]
        fn duplicate_entries_collapse_to_latest() {
            let json = r#"[
                {"concept": "Math||Algebra||a", "at": "2026-01-10T09:01:00Z"},
                {"concept": "Math||Algebra||b", "at": "2026-01-10T09:02:00Z"},
                {"concept": "Math||Algebra||a", "at": "2026-01-10T09:03:00Z"}
            ]"#;
            let history: History = serde_json::from_str(json).unwrap();
            assert_eq!(history.len(), 2);
            assert_eq!(order(&history), vec!["b", "a"]);
            assert_eq!(history.completed_at(&topic("a")), Some(at(3)));
        }

        #[test]
        fn serializes_in_completion_order() {
            let mut history = History::new();
            history.insert(topic("b"), at(1));
            history.insert(topic("a"), at(2));
            let json = serde_json::to_value(&history).unwrap();
            assert_eq!(json[0]["concept"], "Math||Algebra||b");
            assert_eq!(json[1]["concept"], "Math||Algebra||a");
        }
    }

    #[test]
    fn equality_ignores_sequence_numbers() {
        let mut left = History::new();
        left.insert(topic("x"), at(0));
        left.remove(&topic("x"));
        left.insert(topic("a"), at(1));

        let mut right = History::new();
        right.insert(topic("a"), at(1));

        assert_eq!(left, right);
    }
}
