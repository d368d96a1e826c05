//! Consumer-group offset storage.
//!
//! A nested `group -> topic -> partition -> next-offset` map, independent
//! of the topic registry. Commits are unconditional last-writer-wins and
//! are never validated against the log, so a group may commit ahead of the
//! high watermark or for a partition index the topic does not have yet.

use parking_lot::RwLock;
use std::collections::HashMap;

type GroupOffsets = HashMap<String, HashMap<u32, i64>>;

/// Stores each group's next offset to read per topic partition.
#[derive(Debug, Default)]
pub struct OffsetStore {
    entries: RwLock<HashMap<String, GroupOffsets>>,
}

impl OffsetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `offset` as the next offset for `(group, topic, partition)`,
    /// overwriting any previous value.
    pub fn commit(&self, group: &str, topic: &str, partition: u32, offset: i64) {
        let mut entries = self.entries.write();
        entries
            .entry(group.to_string())
            .or_default()
            .entry(topic.to_string())
            .or_default()
            .insert(partition, offset);
    }

    /// Last committed next-offset, or `None` if the entry is unset.
    pub fn committed(&self, group: &str, topic: &str, partition: u32) -> Option<i64> {
        self.entries
            .read()
            .get(group)
            .and_then(|topics| topics.get(topic))
            .and_then(|partitions| partitions.get(&partition))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_entry() {
        let store = OffsetStore::new();
        assert_eq!(store.committed("g", "t", 0), None);
    }

    #[test]
    fn test_commit_and_read_back() {
        let store = OffsetStore::new();
        store.commit("analytics", "events", 0, 10);
        assert_eq!(store.committed("analytics", "events", 0), Some(10));
    }

    #[test]
    fn test_last_writer_wins() {
        let store = OffsetStore::new();
        store.commit("g", "t", 0, 10);
        store.commit("g", "t", 0, 5);
        assert_eq!(store.committed("g", "t", 0), Some(5));
    }

    #[test]
    fn test_entries_are_independent() {
        let store = OffsetStore::new();
        store.commit("g1", "t", 0, 1);
        store.commit("g1", "t", 1, 2);
        store.commit("g2", "t", 0, 3);
        store.commit("g1", "u", 0, 4);

        assert_eq!(store.committed("g1", "t", 0), Some(1));
        assert_eq!(store.committed("g1", "t", 1), Some(2));
        assert_eq!(store.committed("g2", "t", 0), Some(3));
        assert_eq!(store.committed("g1", "u", 0), Some(4));
    }
}
