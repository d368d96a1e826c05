//! In-memory partition logs.
//!
//! Each partition owns an append-only record sequence behind its own
//! reader-writer lock, so appends to distinct partitions run fully in
//! parallel. The high watermark of a partition equals the length of its
//! sequence - the offset the next appended record will receive.

use bytes::Bytes;
use parking_lot::RwLock;

/// A stored message. The offset equals the record's zero-based index in
/// its partition at the moment of append and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: i64,
    pub key: Bytes,
    pub value: Bytes,
    pub ts: i64,
}

impl Record {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>, ts: i64) -> Self {
        Self {
            offset: 0,
            key: key.into(),
            value: value.into(),
            ts,
        }
    }
}

/// Append-only ordered record store for one partition.
#[derive(Debug, Default)]
pub struct PartitionLog {
    records: RwLock<Vec<Record>>,
}

impl PartitionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a batch under the exclusive lock, assigning each record the
    /// next contiguous offset. Returns the offset of the first record; the
    /// batch is atomic, so `base + batch.len()` is the new high watermark.
    pub fn append(&self, mut batch: Vec<Record>) -> i64 {
        let mut records = self.records.write();
        let base = records.len() as i64;
        for (i, record) in batch.iter_mut().enumerate() {
            record.offset = base + i as i64;
        }
        records.append(&mut batch);
        base
    }

    /// Reads a contiguous range under the shared lock.
    ///
    /// `start < 0` means "latest" and yields an empty range at the high
    /// watermark; `start` past the high watermark is clamped to it. A
    /// `max` of zero reads to the high watermark. Returns a copy of the
    /// range together with the high watermark snapshot taken under the
    /// same lock, so callers observe a self-consistent view.
    pub fn fetch(&self, start: i64, max: usize) -> (Vec<Record>, i64) {
        let records = self.records.read();
        let hw = records.len() as i64;

        let start = if start < 0 || start > hw { hw } else { start };
        let start = start as usize;
        let max = if max == 0 { records.len() } else { max };
        let end = start.saturating_add(max).min(records.len());

        (records[start..end].to_vec(), hw)
    }

    /// Offset the next appended record will receive.
    pub fn high_watermark(&self) -> i64 {
        self.records.read().len() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(value: &str) -> Record {
        Record::new(Bytes::new(), Bytes::copy_from_slice(value.as_bytes()), 0)
    }

    #[test]
    fn test_append_assigns_contiguous_offsets() {
        let log = PartitionLog::new();

        let base = log.append(vec![record("a"), record("b")]);
        assert_eq!(base, 0);
        assert_eq!(log.high_watermark(), 2);

        let base = log.append(vec![record("c")]);
        assert_eq!(base, 2);
        assert_eq!(log.high_watermark(), 3);

        let (records, hw) = log.fetch(0, 0);
        assert_eq!(hw, 3);
        let offsets: Vec<i64> = records.iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
    }

    #[test]
    fn test_fetch_range_closure() {
        let log = PartitionLog::new();
        log.append((0..10).map(|i| record(&i.to_string())).collect());

        // Every in-range start and bound returns exactly [start, min(start+max, hw)).
        for start in 0..=10i64 {
            for max in [0usize, 1, 3, 10, 100] {
                let (records, hw) = log.fetch(start, max);
                assert_eq!(hw, 10);
                let expected_end = if max == 0 {
                    10
                } else {
                    (start + max as i64).min(10)
                };
                let expected: Vec<i64> = (start..expected_end).collect();
                let got: Vec<i64> = records.iter().map(|r| r.offset).collect();
                assert_eq!(got, expected, "start={start} max={max}");
            }
        }
    }

    #[test]
    fn test_fetch_latest_returns_empty_at_high_watermark() {
        let log = PartitionLog::new();
        log.append(vec![record("a"), record("b")]);

        let (records, hw) = log.fetch(-1, 0);
        assert!(records.is_empty());
        assert_eq!(hw, 2);
    }

    #[test]
    fn test_fetch_clamps_past_high_watermark() {
        let log = PartitionLog::new();
        log.append(vec![record("a")]);

        let (records, hw) = log.fetch(100, 0);
        assert!(records.is_empty());
        assert_eq!(hw, 1);
    }

    #[test]
    fn test_fetch_empty_partition() {
        let log = PartitionLog::new();
        let (records, hw) = log.fetch(0, 0);
        assert!(records.is_empty());
        assert_eq!(hw, 0);
    }

    #[test]
    fn test_fetch_returns_copy() {
        let log = PartitionLog::new();
        log.append(vec![record("a")]);

        let (snapshot, _) = log.fetch(0, 0);
        log.append(vec![record("b")]);

        // The earlier snapshot is unaffected by the later append.
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].value.as_ref(), b"a");
    }

    #[test]
    fn test_concurrent_appends_stay_contiguous() {
        use std::sync::Arc;

        let log = Arc::new(PartitionLog::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let log = Arc::clone(&log);
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    log.append(vec![record("x"), record("y")]);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let (records, hw) = log.fetch(0, 0);
        assert_eq!(hw, 1600);
        for (i, rec) in records.iter().enumerate() {
            assert_eq!(rec.offset, i as i64);
        }
    }
}
