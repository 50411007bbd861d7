//! Access records and the statistics derived from them.
//!
//! Every translation appends one immutable [`AccessRecord`] to the [`History`]. All counters
//! come from [`AccessCounters`], a fold over those records; the engine keeps a running fold
//! so reading statistics is O(1), and [`AccessCounters::from_records`] recomputes the same
//! numbers from scratch.

use core::fmt;
use core::time::Duration;
use std::time::SystemTime;

use crate::{FrameNumber, PageNumber, PhysicalAddress, TlbPolicy, VirtualAddress};

/// Classification of a single translation.
///
/// Every access is exactly one of these, checked in priority order: a page fault is also a
/// TLB miss but is reported only as a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The TLB held the mapping.
    TlbHit,
    /// The TLB missed but the page table held the mapping.
    TlbMiss,
    /// Neither held it; a frame was allocated and the page table extended.
    PageFault,
}

impl Outcome {
    pub const fn label(self) -> &'static str {
        match self {
            Self::TlbHit => "TLB HIT",
            Self::TlbMiss => "TLB MISS",
            Self::PageFault => "PAGE FAULT",
        }
    }

    pub const fn is_tlb_hit(self) -> bool {
        matches!(self, Self::TlbHit)
    }

    pub const fn is_page_fault(self) -> bool {
        matches!(self, Self::PageFault)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Snapshot of one translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRecord {
    /// 1-based position in the history.
    pub sequence: u64,
    /// Time since the engine was created or last reset.
    pub timestamp: Duration,
    /// Wall-clock time of the access.
    pub wall_clock: SystemTime,
    pub virtual_address: VirtualAddress,
    pub page: PageNumber,
    pub offset: u64,
    pub frame: FrameNumber,
    pub physical_address: PhysicalAddress,
    pub outcome: Outcome,
    /// The frame came from the exhaustion policy rather than the free pool.
    pub fallback: bool,
}

impl AccessRecord {
    pub const fn tlb_hit(&self) -> bool {
        self.outcome.is_tlb_hit()
    }

    pub const fn page_fault(&self) -> bool {
        self.outcome.is_page_fault()
    }

    /// `HIT` or `MISS`.
    pub const fn tlb_label(&self) -> &'static str {
        if self.tlb_hit() { "HIT" } else { "MISS" }
    }
}

/// Append-only, ordered log of access records.
#[derive(Debug, Clone, Default)]
pub struct History {
    records: Vec<AccessRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, record: AccessRecord) {
        self.records.push(record);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[AccessRecord] {
        &self.records
    }

    /// The last `n` records (or all of them if fewer exist), oldest first.
    pub fn recent(&self, n: usize) -> &[AccessRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    pub fn last(&self) -> Option<&AccessRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, AccessRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a AccessRecord;
    type IntoIter = core::slice::Iter<'a, AccessRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Counters folded from a sequence of access records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessCounters {
    pub total_accesses: u64,
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    pub page_faults: u64,
    pub fallback_allocations: u64,
}

impl AccessCounters {
    /// Folds one record into the counters.
    pub fn record(&mut self, record: &AccessRecord) {
        self.total_accesses += 1;
        match record.outcome {
            Outcome::TlbHit => self.tlb_hits += 1,
            Outcome::TlbMiss => self.tlb_misses += 1,
            Outcome::PageFault => {
                self.tlb_misses += 1;
                self.page_faults += 1;
            }
        }
        if record.fallback {
            self.fallback_allocations += 1;
        }
    }

    /// Recomputes the counters from scratch.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AccessRecord>) -> Self {
        records.into_iter().fold(Self::default(), |mut counters, record| {
            counters.record(record);
            counters
        })
    }

    /// `tlb_hits / total_accesses`, or 0 with no accesses.
    pub fn hit_rate(&self) -> f64 {
        ratio(self.tlb_hits, self.total_accesses)
    }

    /// `tlb_misses / total_accesses`, or 0 with no accesses.
    pub fn miss_rate(&self) -> f64 {
        ratio(self.tlb_misses, self.total_accesses)
    }

    /// `page_faults / total_accesses`, or 0 with no accesses.
    pub fn fault_rate(&self) -> f64 {
        ratio(self.page_faults, self.total_accesses)
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Point-in-time view of the engine: access counters plus current structure sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Statistics {
    pub counters: AccessCounters,
    pub tlb_entries: usize,
    pub tlb_capacity: usize,
    pub tlb_policy: TlbPolicy,
    pub page_table_entries: usize,
    pub free_frames: u64,
    pub total_frames: u64,
}

impl Statistics {
    pub fn hit_rate(&self) -> f64 {
        self.counters.hit_rate()
    }

    pub fn fault_rate(&self) -> f64 {
        self.counters.fault_rate()
    }
}
