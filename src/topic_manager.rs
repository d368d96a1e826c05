//! Topic registry.
//!
//! Maps topic names to topics behind a single reader-writer lock. A topic
//! owns a fixed vector of partition logs sized at create time. Handlers
//! clone the topic handle out of the registry lock before touching any
//! partition lock, keeping the registry -> partition lock order and
//! decoupling append throughput from topic creation.

use crate::storage::PartitionLog;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// A named, fixed-size vector of partitions. The partition count is set at
/// create time and never changes.
#[derive(Debug)]
pub struct Topic {
    partitions: Vec<Arc<PartitionLog>>,
}

impl Topic {
    fn new(partition_count: usize) -> Self {
        Self {
            partitions: (0..partition_count)
                .map(|_| Arc::new(PartitionLog::new()))
                .collect(),
        }
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    /// Handle to one partition's log, or `None` if the index is out of range.
    pub fn partition(&self, index: usize) -> Option<Arc<PartitionLog>> {
        self.partitions.get(index).cloned()
    }
}

/// Name -> topic mapping owning all topics for the broker's lifetime.
#[derive(Debug, Default)]
pub struct TopicManager {
    topics: RwLock<HashMap<String, Arc<Topic>>>,
}

impl TopicManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a topic with `partition_count` empty partitions under the
    /// exclusive registry lock. Creation is idempotent: an existing topic
    /// is left untouched, including its partition count, so clients can
    /// ensure-topic on startup without coordination.
    pub fn create_topic(&self, name: &str, partition_count: usize) {
        let mut topics = self.topics.write();
        if topics.contains_key(name) {
            return;
        }
        topics.insert(name.to_string(), Arc::new(Topic::new(partition_count)));
        info!(topic = name, partitions = partition_count, "created topic");
    }

    /// Shared-lock lookup; the returned handle outlives the lock.
    pub fn get_topic(&self, name: &str) -> Option<Arc<Topic>> {
        self.topics.read().get(name).cloned()
    }

    pub fn topic_count(&self) -> usize {
        self.topics.read().len()
    }
}
