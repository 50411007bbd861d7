//! Single-level page table.
//!
//! Maps every page that has faulted in to the frame it was given. Entries are only added,
//! never replaced or removed, until the whole table is cleared. Insertion order is kept so
//! callers can show the most recently mapped pages.

use core::fmt;
use std::collections::HashMap;

use crate::{FrameNumber, PageNumber};

/// Errors returned by [`PageTable::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// The page already has a mapping; the existing frame is reported.
    AlreadyMapped {
        page: PageNumber,
        frame: FrameNumber,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyMapped { page, frame } => {
                write!(f, "page {} is already mapped to frame {}", page, frame)
            }
        }
    }
}

impl std::error::Error for MapError {}

/// A page table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    pub page: PageNumber,
    pub frame: FrameNumber,
}

/// Page number → frame number mapping with insertion-ordered iteration.
#[derive(Debug, Clone, Default)]
pub struct PageTable {
    frames: HashMap<PageNumber, FrameNumber>,
    /// Pages in the order they were mapped.
    mapped: Vec<PageNumber>,
}

impl PageTable {
    /// Creates an empty page table.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, page: PageNumber) -> Option<FrameNumber> {
        self.frames.get(&page).copied()
    }

    /// Maps `page` to `frame`.
    ///
    /// Fails without modifying the table if `page` is already mapped.
    pub fn insert(&mut self, page: PageNumber, frame: FrameNumber) -> Result<(), MapError> {
        if let Some(&existing) = self.frames.get(&page) {
            return Err(MapError::AlreadyMapped {
                page,
                frame: existing,
            });
        }
        self.frames.insert(page, frame);
        self.mapped.push(page);
        Ok(())
    }

    /// Number of mapped pages.
    pub fn len(&self) -> usize {
        self.mapped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapped.is_empty()
    }

    /// Iterates entries oldest mapping first. Reverse it for the most recent ones.
    pub fn entries(
        &self,
    ) -> impl DoubleEndedIterator<Item = PageTableEntry> + ExactSizeIterator + '_ {
        self.mapped.iter().map(move |&page| PageTableEntry {
            page,
            frame: self.frames[&page],
        })
    }

    /// Removes every mapping.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.mapped.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: u64) -> PageNumber {
        PageNumber::new(n)
    }

    fn frame(n: u64) -> FrameNumber {
        FrameNumber::new(n)
    }

    #[test]
    fn lookup_unmapped_page() {
        let table = PageTable::new();
        assert_eq!(table.lookup(page(3)), None);
        assert!(table.is_empty());
    }

    #[test]
    fn insert_then_lookup() {
        let mut table = PageTable::new();
        table.insert(page(3), frame(0)).unwrap();
        table.insert(page(1), frame(1)).unwrap();

        assert_eq!(table.lookup(page(3)), Some(frame(0)));
        assert_eq!(table.lookup(page(1)), Some(frame(1)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn rejects_remapping() {
        let mut table = PageTable::new();
        table.insert(page(5), frame(2)).unwrap();

        let err = table.insert(page(5), frame(9)).unwrap_err();
        assert_eq!(
            err,
            MapError::AlreadyMapped {
                page: page(5),
                frame: frame(2)
            }
        );
        assert_eq!(table.lookup(page(5)), Some(frame(2)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn allows_shared_frames() {
        // Frame exhaustion fallback maps several pages onto one frame.
        let mut table = PageTable::new();
        table.insert(page(1), frame(0)).unwrap();
        table.insert(page(2), frame(0)).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn entries_keep_insertion_order() {
        let mut table = PageTable::new();
        for (p, f) in [(9, 0), (4, 1), (7, 2)] {
            table.insert(page(p), frame(f)).unwrap();
        }

        let pages: Vec<u64> = table.entries().map(|e| e.page.as_u64()).collect();
        assert_eq!(pages, vec![9, 4, 7]);

        let recent: Vec<u64> = table.entries().rev().take(2).map(|e| e.page.as_u64()).collect();
        assert_eq!(recent, vec![7, 4]);
    }

    #[test]
    fn clear_empties_table() {
        let mut table = PageTable::new();
        table.insert(page(1), frame(1)).unwrap();
        table.clear();
        assert!(table.is_empty());
        assert_eq!(table.lookup(page(1)), None);
        table.insert(page(1), frame(3)).unwrap();
    }
}
