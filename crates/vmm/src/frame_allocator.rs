//! Physical frame allocation.
//!
//! Frames are handed out lowest-numbered first and are never returned to the pool, so the
//! free pool is always the contiguous range `[next_free, total_frames)`. Once that range is
//! empty the allocator degrades instead of failing: it asks its [`ExhaustionPolicy`] for a
//! frame that is already in use.
//!
//! The reference policy, [`FixedFrame`], always answers frame 0. That aliases the faulting
//! page onto whichever page already owns frame 0, so the "one frame backs at most one page"
//! invariant no longer holds once the pool is exhausted. A policy that evicts a victim page
//! would need the engine to unmap it; no such policy exists yet.

use std::collections::BTreeMap;

use crate::{FrameNumber, PageNumber};

/// Chooses a frame when the free pool is empty.
///
/// Implementations must return a frame below `total_frames`.
pub trait ExhaustionPolicy {
    /// Name used in log messages.
    fn name(&self) -> &'static str;

    /// Picks the frame that will back `page`.
    fn select(&mut self, page: PageNumber, total_frames: u64) -> FrameNumber;
}

/// Always falls back to the same frame (frame 0 by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedFrame(pub FrameNumber);

impl Default for FixedFrame {
    fn default() -> Self {
        Self(FrameNumber::new(0))
    }
}

impl ExhaustionPolicy for FixedFrame {
    fn name(&self) -> &'static str {
        "fixed-frame"
    }

    fn select(&mut self, _page: PageNumber, _total_frames: u64) -> FrameNumber {
        self.0
    }
}

/// Where an allocated frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationSource {
    /// Taken from the free pool; no other page uses it.
    Pool,
    /// Chosen by the exhaustion policy; another page may already use it.
    Fallback,
}

/// Result of [`FrameAllocator::allocate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    pub frame: FrameNumber,
    pub source: AllocationSource,
}

impl Allocation {
    pub fn is_fallback(&self) -> bool {
        self.source == AllocationSource::Fallback
    }
}

/// Hands out physical frames and remembers which page each frame currently holds.
#[derive(Debug, Clone)]
pub struct FrameAllocator<P = FixedFrame> {
    total_frames: u64,
    /// Lowest free frame; everything from here to `total_frames` is free.
    next_free: u64,
    /// Page most recently placed in each handed-out frame.
    residents: BTreeMap<FrameNumber, PageNumber>,
    policy: P,
}

impl<P: ExhaustionPolicy> FrameAllocator<P> {
    /// Creates an allocator with every frame in `0..total_frames` free.
    pub fn new(total_frames: u64, policy: P) -> Self {
        Self {
            total_frames,
            next_free: 0,
            residents: BTreeMap::new(),
            policy,
        }
    }

    /// Allocates a frame to hold `page`.
    ///
    /// Never fails: with the pool empty the exhaustion policy picks the frame, and the
    /// result is marked [`AllocationSource::Fallback`].
    pub fn allocate(&mut self, page: PageNumber) -> Allocation {
        let allocation = if self.next_free < self.total_frames {
            let frame = FrameNumber::new(self.next_free);
            self.next_free += 1;
            Allocation {
                frame,
                source: AllocationSource::Pool,
            }
        } else {
            let frame = self.policy.select(page, self.total_frames);
            debug_assert!(
                frame.as_u64() < self.total_frames,
                "exhaustion policy returned frame {} of {}",
                frame,
                self.total_frames
            );
            log::warn!(
                "frame pool exhausted: {} policy maps page {} onto frame {} (previously page {})",
                self.policy.name(),
                page,
                frame,
                self.residents
                    .get(&frame)
                    .map_or_else(|| "none".to_owned(), |p| p.to_string())
            );
            Allocation {
                frame,
                source: AllocationSource::Fallback,
            }
        };

        self.residents.insert(allocation.frame, page);
        allocation
    }

    /// Returns every frame to the pool and forgets all residents.
    pub fn reset(&mut self) {
        self.next_free = 0;
        self.residents.clear();
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Number of frames still in the free pool.
    pub fn free_frames(&self) -> u64 {
        self.total_frames - self.next_free
    }

    /// Iterates `(frame, resident page)` pairs in frame order. Under fallback the newest
    /// page placed in a frame replaces the previous resident.
    pub fn residents(
        &self,
    ) -> impl DoubleEndedIterator<Item = (FrameNumber, PageNumber)> + ExactSizeIterator + '_ {
        self.residents.iter().map(|(&frame, &page)| (frame, page))
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }
}
