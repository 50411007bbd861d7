//! # Virtual Memory Manager (VMM)
//!
//! Models virtual-to-physical address translation for a single address space:
//!
//! - A bounded TLB with FIFO or LRU eviction.
//! - A single-level page table filled on demand.
//! - A frame allocator that hands out the lowest free frame and degrades to a named
//!   fallback policy once physical memory is exhausted.
//! - An append-only access history from which every statistic is folded.
//!
//! [`TranslationEngine`] ties these together and is the only thing that mutates them.
//!
//! ```
//! use vmm::{MemoryConfig, Outcome, TranslationEngine};
//!
//! let mut engine = TranslationEngine::new(MemoryConfig::default()).unwrap();
//! assert_eq!(engine.translate(4096).unwrap().outcome, Outcome::PageFault);
//! assert_eq!(engine.translate(4096).unwrap().outcome, Outcome::TlbHit);
//! ```

mod address;
mod config;
mod engine;
mod export;
mod frame_allocator;
mod history;
mod human_size;
mod numbers;
mod page_table;
mod tlb;

#[cfg(test)]
mod tests_prop;

pub use address::{PhysicalAddress, VirtualAddress};
pub use config::{ConfigError, Geometry, MemoryConfig};
pub use engine::{TranslateError, TranslationEngine};
pub use export::{Timestamp, WallClock};
pub use frame_allocator::{
    Allocation, AllocationSource, ExhaustionPolicy, FixedFrame, FrameAllocator,
};
pub use history::{AccessCounters, AccessRecord, History, Outcome, Statistics};
pub use human_size::HumanSize;
pub use numbers::{FrameNumber, PageNumber};
pub use page_table::{MapError, PageTable, PageTableEntry};
pub use tlb::{ParsePolicyError, Tlb, TlbEntry, TlbPolicy};
