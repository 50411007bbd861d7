//! Translation lookaside buffer.
//!
//! The TLB is a bounded cache of page→frame mappings. Resident entries are kept in a single
//! order, oldest first; eviction always removes the front of that order. The active
//! [`TlbPolicy`] decides what "oldest" means by deciding whether a lookup moves an entry to
//! the back.

use core::fmt;
use core::str::FromStr;
use std::collections::{BTreeMap, HashMap};

use crate::{FrameNumber, PageNumber};

/// Eviction policy of the TLB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TlbPolicy {
    /// Evict the entry inserted longest ago. Lookups never reorder.
    #[default]
    Fifo,
    /// Evict the entry that has gone longest without a lookup or insert.
    Lru,
}

impl TlbPolicy {
    /// Upper-case name used in displays and exports.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Fifo => "FIFO",
            Self::Lru => "LRU",
        }
    }

    /// Whether a hit counts as a use that moves the entry to the back of the order.
    const fn refreshes_on_hit(self) -> bool {
        matches!(self, Self::Lru)
    }
}

impl fmt::Display for TlbPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Error returned when a policy name is neither `fifo` nor `lru`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePolicyError(String);

impl fmt::Display for ParsePolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown TLB policy `{}` (expected FIFO or LRU)", self.0)
    }
}

impl std::error::Error for ParsePolicyError {}

impl FromStr for TlbPolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("fifo") {
            Ok(Self::Fifo)
        } else if s.eq_ignore_ascii_case("lru") {
            Ok(Self::Lru)
        } else {
            Err(ParsePolicyError(s.to_owned()))
        }
    }
}

/// A resident TLB mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbEntry {
    pub page: PageNumber,
    pub frame: FrameNumber,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    frame: FrameNumber,
    /// Position key in `Tlb::order`.
    stamp: u64,
}

/// Bounded page→frame cache with FIFO or LRU eviction.
#[derive(Debug, Clone)]
pub struct Tlb {
    capacity: usize,
    policy: TlbPolicy,
    slots: HashMap<PageNumber, Slot>,
    /// Resident pages keyed by stamp; the first key is the next victim.
    order: BTreeMap<u64, PageNumber>,
    next_stamp: u64,
}

impl Tlb {
    /// Creates an empty TLB.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. [`MemoryConfig::validate`](crate::MemoryConfig::validate)
    /// rejects that before an engine builds its TLB.
    pub fn new(capacity: usize, policy: TlbPolicy) -> Self {
        assert!(capacity > 0, "TLB capacity must be non-zero");
        Self {
            capacity,
            policy,
            slots: HashMap::new(),
            order: BTreeMap::new(),
            next_stamp: 0,
        }
    }

    /// Looks up `page`, applying the policy's access-order update on a hit.
    pub fn lookup(&mut self, page: PageNumber) -> Option<FrameNumber> {
        let slot = self.slots.get_mut(&page)?;
        if self.policy.refreshes_on_hit() {
            self.order.remove(&slot.stamp);
            slot.stamp = self.next_stamp;
            self.order.insert(self.next_stamp, page);
            self.next_stamp += 1;
        }
        Some(slot.frame)
    }

    /// Inserts a mapping, evicting one entry first if the TLB is full.
    ///
    /// Returns the evicted entry, if any. Inserting a page that is already resident only
    /// refreshes its frame (and, under LRU, its recency) and never evicts.
    pub fn insert(&mut self, page: PageNumber, frame: FrameNumber) -> Option<TlbEntry> {
        if let Some(slot) = self.slots.get_mut(&page) {
            slot.frame = frame;
            if self.policy.refreshes_on_hit() {
                self.order.remove(&slot.stamp);
                slot.stamp = self.next_stamp;
                self.order.insert(self.next_stamp, page);
                self.next_stamp += 1;
            }
            return None;
        }

        let evicted = if self.slots.len() >= self.capacity {
            self.evict()
        } else {
            None
        };

        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.slots.insert(page, Slot { frame, stamp });
        self.order.insert(stamp, page);

        evicted
    }

    /// Switches the policy used for future lookups and evictions.
    ///
    /// Resident entries keep their current order.
    pub fn set_policy(&mut self, policy: TlbPolicy) {
        self.policy = policy;
    }

    pub fn policy(&self) -> TlbPolicy {
        self.policy
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, page: PageNumber) -> bool {
        self.slots.contains_key(&page)
    }

    /// Iterates resident entries in eviction order: the first item is the next victim.
    pub fn entries(&self) -> impl DoubleEndedIterator<Item = TlbEntry> + '_ {
        self.order.values().map(move |&page| TlbEntry {
            page,
            frame: self.slots[&page].frame,
        })
    }

    /// Drops every entry. The policy is kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
        self.next_stamp = 0;
    }

    fn evict(&mut self) -> Option<TlbEntry> {
        let (_, page) = self.order.pop_first()?;
        let slot = self.slots.remove(&page)?;
        log::debug!(
            "TLB full ({} entries), {} evicts page {} (frame {})",
            self.capacity,
            self.policy,
            page,
            slot.frame
        );
        Some(TlbEntry {
            page,
            frame: slot.frame,
        })
    }
}
