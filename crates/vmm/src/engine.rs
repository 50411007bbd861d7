//! The address translation engine.
//!
//! [`TranslationEngine`] owns the TLB, page table, frame allocator and access history of one
//! address space. [`TranslationEngine::translate`] is the only operation that mutates them
//! (besides [`reset`](TranslationEngine::reset) and the policy switch), and it either
//! completes every update or, for an out-of-range address, makes none.

use core::fmt;
use std::time::{Instant, SystemTime};

use crate::{
    AccessCounters, AccessRecord, ConfigError, ExhaustionPolicy, FixedFrame, FrameAllocator,
    Geometry, History, MemoryConfig, Outcome, PageTable, Statistics, Tlb, TlbPolicy,
    VirtualAddress,
};

/// Errors returned by [`TranslationEngine::translate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslateError {
    /// The address is not below the virtual memory size.
    AddressOutOfRange {
        address: VirtualAddress,
        /// The virtual memory size; valid addresses are `0..limit`.
        limit: u64,
    },
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddressOutOfRange { address, limit } => write!(
                f,
                "virtual address {} is out of range (must be between 0 and {})",
                address,
                limit - 1
            ),
        }
    }
}

impl std::error::Error for TranslateError {}

/// Virtual-to-physical translation through a TLB backed by a page table.
///
/// The type parameter selects what happens when physical frames run out; see
/// [`ExhaustionPolicy`].
#[derive(Debug)]
pub struct TranslationEngine<P = FixedFrame> {
    config: MemoryConfig,
    geometry: Geometry,
    tlb: Tlb,
    page_table: PageTable,
    frames: FrameAllocator<P>,
    history: History,
    counters: AccessCounters,
    /// Zero point for record timestamps.
    epoch: Instant,
}

impl TranslationEngine<FixedFrame> {
    /// Creates an engine that falls back to frame 0 once physical memory is exhausted.
    pub fn new(config: MemoryConfig) -> Result<Self, ConfigError> {
        Self::with_exhaustion_policy(config, FixedFrame::default())
    }
}

impl<P: ExhaustionPolicy> TranslationEngine<P> {
    /// Creates an engine with a custom frame exhaustion policy.
    pub fn with_exhaustion_policy(config: MemoryConfig, policy: P) -> Result<Self, ConfigError> {
        let geometry = config.validate()?;

        log::info!(
            "translation engine: {} ({} pages, {} frames, exhaustion policy {})",
            config,
            geometry.num_pages(),
            geometry.num_frames(),
            policy.name()
        );

        Ok(Self {
            config,
            geometry,
            tlb: Tlb::new(config.tlb_capacity, config.tlb_policy),
            page_table: PageTable::new(),
            frames: FrameAllocator::new(geometry.num_frames(), policy),
            history: History::new(),
            counters: AccessCounters::default(),
            epoch: Instant::now(),
        })
    }

    /// Translates a virtual address, recording the access.
    ///
    /// The TLB is consulted first; on a miss the page table is, and on a page-table miss a
    /// frame is allocated and mapped. Either miss installs the mapping in the TLB. An
    /// out-of-range address is rejected before any state changes.
    pub fn translate(&mut self, address: u64) -> Result<AccessRecord, TranslateError> {
        let address = VirtualAddress::new(address);
        if !self.geometry.contains(address) {
            return Err(TranslateError::AddressOutOfRange {
                address,
                limit: self.geometry.virtual_size(),
            });
        }

        let (page, offset) = self.geometry.split(address);

        let (frame, outcome, fallback) = match self.tlb.lookup(page) {
            Some(frame) => (frame, Outcome::TlbHit, false),
            None => {
                let resolved = match self.page_table.lookup(page) {
                    Some(frame) => (frame, Outcome::TlbMiss, false),
                    None => {
                        let allocation = self.frames.allocate(page);
                        self.page_table
                            .insert(page, allocation.frame)
                            .expect("page table lookup just missed");
                        log::debug!(
                            "page fault: page {} mapped to frame {}",
                            page,
                            allocation.frame
                        );
                        (allocation.frame, Outcome::PageFault, allocation.is_fallback())
                    }
                };
                self.tlb.insert(page, resolved.0);
                resolved
            }
        };

        let record = AccessRecord {
            sequence: self.counters.total_accesses + 1,
            timestamp: self.epoch.elapsed(),
            wall_clock: SystemTime::now(),
            virtual_address: address,
            page,
            offset,
            frame,
            physical_address: self.geometry.compose(frame, offset),
            outcome,
            fallback,
        };

        log::trace!(
            "#{} {} -> page {} offset {:#x} -> frame {} -> {} [{}]",
            record.sequence,
            record.virtual_address,
            record.page,
            record.offset,
            record.frame,
            record.physical_address,
            record.outcome
        );

        self.counters.record(&record);
        self.history.push(record);
        Ok(record)
    }

    /// Changes the TLB eviction policy for future accesses. Resident entries keep their order.
    pub fn set_tlb_policy(&mut self, policy: TlbPolicy) {
        if policy != self.tlb.policy() {
            log::info!("TLB policy {} -> {}", self.tlb.policy(), policy);
        }
        self.tlb.set_policy(policy);
    }

    pub fn tlb_policy(&self) -> TlbPolicy {
        self.tlb.policy()
    }

    /// Clears the TLB, page table and history, refills the frame pool and zeroes every
    /// counter. The configuration and current TLB policy are kept.
    pub fn reset(&mut self) {
        log::info!(
            "reset after {} accesses ({} pages mapped)",
            self.counters.total_accesses,
            self.page_table.len()
        );
        self.tlb.clear();
        self.page_table.clear();
        self.frames.reset();
        self.history.clear();
        self.counters = AccessCounters::default();
        self.epoch = Instant::now();
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn tlb(&self) -> &Tlb {
        &self.tlb
    }

    pub fn page_table(&self) -> &PageTable {
        &self.page_table
    }

    pub fn frames(&self) -> &FrameAllocator<P> {
        &self.frames
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Running fold of the history; always equal to
    /// `AccessCounters::from_records(self.history())`.
    pub fn counters(&self) -> &AccessCounters {
        &self.counters
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            counters: self.counters,
            tlb_entries: self.tlb.len(),
            tlb_capacity: self.tlb.capacity(),
            tlb_policy: self.tlb.policy(),
            page_table_entries: self.page_table.len(),
            free_frames: self.frames.free_frames(),
            total_frames: self.frames.total_frames(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FrameNumber, PageNumber, PhysicalAddress};

    const PAGE: u64 = 4096;

    /// Small engine: 64 pages, 4 frames, 2-entry TLB.
    fn small(policy: TlbPolicy) -> TranslationEngine {
        TranslationEngine::new(MemoryConfig {
            page_size: PAGE,
            virtual_memory_size: 64 * PAGE,
            physical_memory_size: 4 * PAGE,
            tlb_capacity: 2,
            tlb_policy: policy,
        })
        .unwrap()
    }

    fn tlb_pages<P: ExhaustionPolicy>(engine: &TranslationEngine<P>) -> Vec<u64> {
        engine.tlb().entries().map(|e| e.page.as_u64()).collect()
    }

    mod scenarios {
        use super::*;

        #[test]
        fn fault_then_hit() {
            let mut engine = TranslationEngine::new(MemoryConfig::default()).unwrap();

            let first = engine.translate(4096).unwrap();
            assert_eq!(first.page, PageNumber::new(1));
            assert_eq!(first.offset, 0);
            assert_eq!(first.outcome, Outcome::PageFault);
            assert_eq!(first.frame, FrameNumber::new(0));
            assert_eq!(first.physical_address, PhysicalAddress::new(0));

            let second = engine.translate(4096).unwrap();
            assert_eq!(second.outcome, Outcome::TlbHit);
            assert_eq!(second.physical_address, first.physical_address);
            assert_eq!(second.sequence, 2);
        }

        #[test]
        fn offset_is_preserved() {
            let mut engine = small(TlbPolicy::Fifo);
            engine.translate(0).unwrap();
            let record = engine.translate(3 * PAGE + 0x123).unwrap();
            assert_eq!(record.page, PageNumber::new(3));
            assert_eq!(record.offset, 0x123);
            assert_eq!(record.frame, FrameNumber::new(1));
            assert_eq!(record.physical_address, PhysicalAddress::new(PAGE + 0x123));
        }

        #[test]
        fn tlb_miss_without_fault() {
            let mut engine = small(TlbPolicy::Fifo);
            for page in 0..3 {
                engine.translate(page * PAGE).unwrap();
            }
            // Page 0 was pushed out of the 2-entry TLB but is still in the page table.
            let record = engine.translate(0).unwrap();
            assert_eq!(record.outcome, Outcome::TlbMiss);
            assert_eq!(record.frame, FrameNumber::new(0));
            assert!(engine.tlb().contains(PageNumber::new(0)));
            assert_eq!(engine.page_table().len(), 3);
        }
    }

    mod tlb_policies {
        use super::*;

        #[test]
        fn fifo_evicts_first_page() {
            let mut engine = small(TlbPolicy::Fifo);
            engine.translate(0).unwrap();
            engine.translate(PAGE).unwrap();
            engine.translate(0).unwrap();
            engine.translate(2 * PAGE).unwrap();
            assert_eq!(tlb_pages(&engine), vec![1, 2]);
        }

        #[test]
        fn lru_keeps_reaccessed_page() {
            let mut engine = small(TlbPolicy::Lru);
            engine.translate(0).unwrap();
            engine.translate(PAGE).unwrap();
            engine.translate(0).unwrap();
            engine.translate(2 * PAGE).unwrap();
            assert_eq!(tlb_pages(&engine), vec![0, 2]);
        }

        #[test]
        fn policy_switch_keeps_entries() {
            let mut engine = small(TlbPolicy::Fifo);
            engine.translate(0).unwrap();
            engine.translate(PAGE).unwrap();

            engine.set_tlb_policy(TlbPolicy::Lru);
            assert_eq!(engine.tlb_policy(), TlbPolicy::Lru);
            assert_eq!(tlb_pages(&engine), vec![0, 1]);

            engine.translate(0).unwrap();
            engine.translate(2 * PAGE).unwrap();
            assert_eq!(tlb_pages(&engine), vec![0, 2]);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn out_of_range_leaves_state_untouched() {
            let mut engine = small(TlbPolicy::Fifo);
            engine.translate(5).unwrap();

            let err = engine.translate(64 * PAGE).unwrap_err();
            assert_eq!(
                err,
                TranslateError::AddressOutOfRange {
                    address: VirtualAddress::new(64 * PAGE),
                    limit: 64 * PAGE
                }
            );
            assert_eq!(engine.counters().total_accesses, 1);
            assert_eq!(engine.history().len(), 1);
            assert_eq!(engine.page_table().len(), 1);
            assert_eq!(engine.tlb().len(), 1);
        }

        #[test]
        fn out_of_range_message_names_range() {
            let mut engine = small(TlbPolicy::Fifo);
            let err = engine.translate(u64::MAX).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!(
                    "virtual address {} is out of range (must be between 0 and {})",
                    u64::MAX,
                    64 * PAGE - 1
                )
            );
        }

        #[test]
        fn oversized_tlb_capacity_is_not_fatal() {
            let mut engine = TranslationEngine::new(MemoryConfig {
                tlb_capacity: usize::MAX,
                ..MemoryConfig::default()
            })
            .unwrap();
            assert_eq!(engine.tlb().capacity(), usize::MAX);

            assert_eq!(engine.translate(4096).unwrap().outcome, Outcome::PageFault);
            assert_eq!(engine.translate(4096).unwrap().outcome, Outcome::TlbHit);
        }

        #[test]
        fn rejects_invalid_config() {
            let config = MemoryConfig {
                page_size: 3000,
                ..MemoryConfig::default()
            };
            assert_eq!(
                TranslationEngine::new(config).unwrap_err(),
                ConfigError::PageSizeNotPowerOfTwo(3000)
            );
        }
    }

    mod exhaustion {
        use super::*;

        #[test]
        fn falls_back_to_frame_zero() {
            let mut engine = small(TlbPolicy::Fifo);
            for page in 0..4 {
                let record = engine.translate(page * PAGE).unwrap();
                assert!(!record.fallback);
            }
            assert_eq!(engine.frames().free_frames(), 0);

            let record = engine.translate(10 * PAGE + 7).unwrap();
            assert_eq!(record.outcome, Outcome::PageFault);
            assert!(record.fallback);
            assert_eq!(record.frame, FrameNumber::new(0));
            assert_eq!(record.physical_address, PhysicalAddress::new(7));

            // Frame 0 now backs both page 0 and page 10.
            let table = engine.page_table();
            assert_eq!(table.lookup(PageNumber::new(0)), Some(FrameNumber::new(0)));
            assert_eq!(table.lookup(PageNumber::new(10)), Some(FrameNumber::new(0)));
            assert_eq!(
                engine.frames().residents().next(),
                Some((FrameNumber::new(0), PageNumber::new(10)))
            );
            assert_eq!(engine.counters().fallback_allocations, 1);
        }

        #[test]
        fn custom_policy_is_used() {
            #[derive(Debug)]
            struct Newest;

            impl ExhaustionPolicy for Newest {
                fn name(&self) -> &'static str {
                    "newest"
                }

                fn select(&mut self, _page: PageNumber, total_frames: u64) -> FrameNumber {
                    FrameNumber::new(total_frames - 1)
                }
            }

            let config = MemoryConfig {
                page_size: PAGE,
                virtual_memory_size: 8 * PAGE,
                physical_memory_size: 2 * PAGE,
                tlb_capacity: 4,
                tlb_policy: TlbPolicy::Fifo,
            };
            let mut engine = TranslationEngine::with_exhaustion_policy(config, Newest).unwrap();
            engine.translate(0).unwrap();
            engine.translate(PAGE).unwrap();
            let record = engine.translate(2 * PAGE).unwrap();
            assert_eq!(record.frame, FrameNumber::new(1));
            assert!(record.fallback);
        }
    }

    #[test]
    fn statistics_match_history_fold() {
        let mut engine = small(TlbPolicy::Lru);
        for addr in [0, 1, PAGE, 2 * PAGE, 0, 9 * PAGE, PAGE + 4, 0] {
            engine.translate(addr).unwrap();
        }

        let counters = *engine.counters();
        assert_eq!(counters, AccessCounters::from_records(engine.history()));
        assert_eq!(counters.tlb_hits + counters.tlb_misses, counters.total_accesses);
        assert_eq!(counters.page_faults as usize, engine.page_table().len());

        let stats = engine.statistics();
        assert_eq!(stats.tlb_entries, 2);
        assert_eq!(stats.tlb_capacity, 2);
        assert_eq!(stats.page_table_entries, 4);
        assert_eq!(stats.free_frames, 0);
        assert_eq!(stats.tlb_policy, TlbPolicy::Lru);
        assert_eq!(stats.hit_rate(), counters.tlb_hits as f64 / 8.0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut engine = small(TlbPolicy::Lru);
        for page in 0..6 {
            engine.translate(page * PAGE).unwrap();
        }

        engine.reset();

        let stats = engine.statistics();
        assert_eq!(stats.counters, AccessCounters::default());
        assert_eq!(stats.tlb_entries, 0);
        assert_eq!(stats.page_table_entries, 0);
        assert_eq!(stats.free_frames, 4);
        assert!(engine.history().is_empty());
        assert_eq!(engine.tlb_policy(), TlbPolicy::Lru);

        let record = engine.translate(5 * PAGE).unwrap();
        assert_eq!(record.sequence, 1);
        assert_eq!(record.outcome, Outcome::PageFault);
        assert_eq!(record.frame, FrameNumber::new(0));
    }
}
