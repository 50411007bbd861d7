#![cfg(test)]
//! Property-based tests for the translation engine.
//!
//! Random address streams, interleaved with TLB policy switches, are checked against the
//! engine's structural invariants after every step.

use std::collections::HashSet;

use proptest::prelude::*;

use crate::{
    AccessCounters, FrameNumber, MemoryConfig, Outcome, PageNumber, TlbPolicy, TranslationEngine,
};

const PAGE: u64 = 256;
const PAGES: u64 = 256;
const FRAMES: u64 = 16;
const TLB: usize = 4;

fn engine(policy: TlbPolicy) -> TranslationEngine {
    TranslationEngine::new(MemoryConfig {
        page_size: PAGE,
        virtual_memory_size: PAGE * PAGES,
        physical_memory_size: PAGE * FRAMES,
        tlb_capacity: TLB,
        tlb_policy: policy,
    })
    .unwrap()
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Translate(u64),
    SetPolicy(TlbPolicy),
}

fn arb_policy() -> impl Strategy<Value = TlbPolicy> {
    prop_oneof![Just(TlbPolicy::Fifo), Just(TlbPolicy::Lru)]
}

/// Addresses concentrated on a few pages so hits, misses and evictions all occur.
fn arb_address() -> impl Strategy<Value = u64> {
    prop_oneof![
        3 => (0u64..8, 0..PAGE).prop_map(|(page, offset)| page * PAGE + offset),
        1 => 0..PAGE * PAGES,
    ]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        8 => arb_address().prop_map(Op::Translate),
        1 => arb_policy().prop_map(Op::SetPolicy),
    ]
}

fn check_invariants(engine: &TranslationEngine) -> Result<(), TestCaseError> {
    let counters = *engine.counters();
    prop_assert!(engine.tlb().len() <= TLB);
    prop_assert_eq!(counters.tlb_hits + counters.tlb_misses, counters.total_accesses);
    prop_assert_eq!(counters, AccessCounters::from_records(engine.history()));
    prop_assert_eq!(counters.page_faults as usize, engine.page_table().len());
    prop_assert_eq!(counters.total_accesses as usize, engine.history().len());

    for entry in engine.tlb().entries() {
        prop_assert_eq!(engine.page_table().lookup(entry.page), Some(entry.frame));
    }
    Ok(())
}

proptest! {
    #[test]
    fn decomposes_and_composes(policy in arb_policy(), addrs in prop::collection::vec(arb_address(), 1..64)) {
        let mut engine = engine(policy);
        for addr in addrs {
            let record = engine.translate(addr).unwrap();
            prop_assert_eq!(record.page, PageNumber::new(addr / PAGE));
            prop_assert_eq!(record.offset, addr % PAGE);
            prop_assert_eq!(
                record.physical_address.as_u64(),
                record.frame.as_u64() * PAGE + record.offset
            );
        }
    }

    #[test]
    fn invariants_hold_after_every_step(initial in arb_policy(), ops in prop::collection::vec(arb_op(), 0..128)) {
        let mut engine = engine(initial);
        check_invariants(&engine)?;
        for op in ops {
            match op {
                Op::Translate(addr) => {
                    engine.translate(addr).unwrap();
                }
                Op::SetPolicy(policy) => engine.set_tlb_policy(policy),
            }
            check_invariants(&engine)?;
        }
    }

    #[test]
    fn repeated_translation_hits(policy in arb_policy(), prefix in prop::collection::vec(arb_address(), 0..32), addr in arb_address()) {
        let mut engine = engine(policy);
        for a in prefix {
            engine.translate(a).unwrap();
        }
        let first = engine.translate(addr).unwrap();
        let second = engine.translate(addr).unwrap();
        prop_assert_eq!(second.outcome, Outcome::TlbHit);
        prop_assert_eq!(second.physical_address, first.physical_address);
    }

    #[test]
    fn fifo_evicts_first_of_distinct_pages(
        (capacity, pages) in (1usize..8).prop_flat_map(|c| (Just(c), Just((0..=c as u64).collect::<Vec<_>>()).prop_shuffle()))
    ) {
        let mut engine = TranslationEngine::new(MemoryConfig {
            page_size: PAGE,
            virtual_memory_size: PAGE * PAGES,
            physical_memory_size: PAGE * FRAMES,
            tlb_capacity: capacity,
            tlb_policy: TlbPolicy::Fifo,
        })
        .unwrap();

        for &page in &pages {
            engine.translate(page * PAGE).unwrap();
        }
        prop_assert!(!engine.tlb().contains(PageNumber::new(pages[0])));
        for &page in &pages[1..] {
            prop_assert!(engine.tlb().contains(PageNumber::new(page)));
        }
    }

    #[test]
    fn pool_frames_are_never_shared(addrs in prop::collection::vec(0..PAGE * PAGES, 0..64)) {
        let mut engine = engine(TlbPolicy::Lru);
        for addr in addrs {
            engine.translate(addr).unwrap();
        }

        let pool_frames: Vec<FrameNumber> = engine
            .history()
            .iter()
            .filter(|r| r.page_fault() && !r.fallback)
            .map(|r| r.frame)
            .collect();
        let distinct: HashSet<FrameNumber> = pool_frames.iter().copied().collect();
        prop_assert_eq!(distinct.len(), pool_frames.len());

        let mapped = engine.page_table().len() as u64;
        prop_assert_eq!(engine.frames().free_frames(), FRAMES.saturating_sub(mapped));
    }
}
