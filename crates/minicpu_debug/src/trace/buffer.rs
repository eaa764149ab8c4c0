//! Bounded history of trace records.
//!
//! The REPL reads this back with `:trace last` and `:trace step`.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use super::record::{TraceEvent, TraceRecord};

/// The most recent trace records, oldest first.
///
/// Once `capacity` records are held, each push evicts the oldest one.
/// Record IDs keep counting up across evictions and clears.
#[derive(Clone, Debug)]
pub struct TraceBuffer {
    records: VecDeque<TraceRecord>,
    capacity: usize,
    next_id: u64,
}

impl TraceBuffer {
    /// Creates an empty buffer holding at most `capacity` records.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_id: 0,
        }
    }

    /// Appends an event and returns the ID it was given.
    pub fn push(&mut self, step: u64, timestamp_ns: u64, event: TraceEvent) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        if self.capacity > 0 {
            self.records
                .push_back(TraceRecord::new(id, step, timestamp_ns, event));
        }
        id
    }

    /// Number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records held.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TraceRecord> {
        self.records.iter()
    }

    /// The newest record.
    #[must_use]
    pub fn last(&self) -> Option<&TraceRecord> {
        self.records.back()
    }

    /// The newest `count` records, optionally of one event type, oldest first.
    #[must_use]
    pub fn recent(&self, count: usize, event_type: Option<&str>) -> Vec<&TraceRecord> {
        let mut picked: Vec<_> = self
            .records
            .iter()
            .rev()
            .filter(|r| event_type.is_none_or(|t| r.event_type() == t))
            .take(count)
            .collect();
        picked.reverse();
        picked
    }

    /// Every record belonging to one instruction.
    #[must_use]
    pub fn for_step(&self, step: u64) -> Vec<&TraceRecord> {
        self.records.iter().filter(|r| r.step == step).collect()
    }

    /// Every record of one event type.
    #[must_use]
    pub fn by_event_type(&self, event_type: &str) -> Vec<&TraceRecord> {
        self.records
            .iter()
            .filter(|r| r.event_type() == event_type)
            .collect()
    }

    /// First and last step covered, if any records are held.
    #[must_use]
    pub fn step_range(&self) -> Option<(u64, u64)> {
        Some((self.records.front()?.step, self.records.back()?.step))
    }

    /// Counts records by event type.
    #[must_use]
    pub fn summary(&self) -> TraceSummary {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.event_type()).or_insert(0) += 1;
        }
        TraceSummary {
            records: self.records.len(),
            capacity: self.capacity,
            steps: self.step_range(),
            counts,
        }
    }
}

/// What a [`TraceBuffer`] currently holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceSummary {
    /// Records held.
    pub records: usize,
    /// Buffer capacity.
    pub capacity: usize,
    /// First and last step covered.
    pub steps: Option<(u64, u64)>,
    /// Records per event type.
    pub counts: BTreeMap<&'static str, usize>,
}

impl fmt::Display for TraceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} records", self.records, self.capacity)?;
        if let Some((first, last)) = self.steps {
            write!(f, ", steps {first}-{last}")?;
        }
        for (kind, count) in &self.counts {
            write!(f, ", {count} {kind}")?;
        }
        Ok(())
    }
}
