//! Engine construction parameters.
//!
//! A [`MemoryConfig`] is what the caller fills in; [`MemoryConfig::validate`] checks it and
//! derives the [`Geometry`] the engine works with. Neither changes after construction.

use core::fmt;

use crate::{FrameNumber, HumanSize, PageNumber, PhysicalAddress, TlbPolicy, VirtualAddress};

/// Errors reported when a [`MemoryConfig`] cannot describe a valid address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The page size is zero.
    ZeroPageSize,
    /// The page size is not a power of two.
    PageSizeNotPowerOfTwo(u64),
    /// The virtual memory size is zero.
    EmptyVirtualSpace,
    /// The virtual memory size is not a multiple of the page size.
    VirtualSizeNotPageMultiple(u64),
    /// The physical memory size is smaller than one page.
    NoFrames,
    /// The physical memory size is not a multiple of the page size.
    PhysicalSizeNotPageMultiple(u64),
    /// The TLB must hold at least one entry.
    ZeroTlbCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroPageSize => write!(f, "page size must be non-zero"),
            Self::PageSizeNotPowerOfTwo(size) => {
                write!(f, "page size {} is not a power of two", size)
            }
            Self::EmptyVirtualSpace => write!(f, "virtual memory size must be non-zero"),
            Self::VirtualSizeNotPageMultiple(size) => {
                write!(f, "virtual memory size {} is not a multiple of the page size", size)
            }
            Self::NoFrames => write!(f, "physical memory must hold at least one frame"),
            Self::PhysicalSizeNotPageMultiple(size) => {
                write!(f, "physical memory size {} is not a multiple of the page size", size)
            }
            Self::ZeroTlbCapacity => write!(f, "TLB capacity must be at least one entry"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Construction constants for a [`TranslationEngine`](crate::TranslationEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Bytes per page (and per frame). Must be a power of two.
    pub page_size: u64,
    /// Size of the virtual address space in bytes.
    pub virtual_memory_size: u64,
    /// Size of physical memory in bytes.
    pub physical_memory_size: u64,
    /// Maximum number of resident TLB entries.
    pub tlb_capacity: usize,
    /// Eviction policy the TLB starts with.
    pub tlb_policy: TlbPolicy,
}

impl MemoryConfig {
    /// Checks the configuration and derives the address-space geometry.
    pub fn validate(&self) -> Result<Geometry, ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if !self.page_size.is_power_of_two() {
            return Err(ConfigError::PageSizeNotPowerOfTwo(self.page_size));
        }
        if self.virtual_memory_size == 0 {
            return Err(ConfigError::EmptyVirtualSpace);
        }
        if self.virtual_memory_size % self.page_size != 0 {
            return Err(ConfigError::VirtualSizeNotPageMultiple(
                self.virtual_memory_size,
            ));
        }
        if self.physical_memory_size % self.page_size != 0 {
            return Err(ConfigError::PhysicalSizeNotPageMultiple(
                self.physical_memory_size,
            ));
        }
        if self.physical_memory_size == 0 {
            return Err(ConfigError::NoFrames);
        }
        if self.tlb_capacity == 0 {
            return Err(ConfigError::ZeroTlbCapacity);
        }

        Ok(Geometry {
            page_shift: self.page_size.trailing_zeros(),
            num_pages: self.virtual_memory_size / self.page_size,
            num_frames: self.physical_memory_size / self.page_size,
        })
    }
}

/// Matches the reference MemFlow setup: 4 KiB pages, 4 GiB virtual, 16 MiB physical,
/// a 16-entry FIFO TLB.
impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            page_size: 4096,
            virtual_memory_size: 1 << 32,
            physical_memory_size: 1 << 24,
            tlb_capacity: 16,
            tlb_policy: TlbPolicy::Fifo,
        }
    }
}

impl fmt::Display for MemoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages, {} virtual, {} physical, {}-entry {} TLB",
            HumanSize(self.page_size),
            HumanSize(self.virtual_memory_size),
            HumanSize(self.physical_memory_size),
            self.tlb_capacity,
            self.tlb_policy
        )
    }
}

/// Validated shape of the virtual and physical address spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    page_shift: u32,
    num_pages: u64,
    num_frames: u64,
}

impl Geometry {
    /// log2 of the page size.
    #[inline]
    pub const fn page_shift(&self) -> u32 {
        self.page_shift
    }

    #[inline]
    pub const fn page_size(&self) -> u64 {
        1 << self.page_shift
    }

    #[inline]
    pub const fn num_pages(&self) -> u64 {
        self.num_pages
    }

    #[inline]
    pub const fn num_frames(&self) -> u64 {
        self.num_frames
    }

    /// `VSIZE`, one past the highest valid virtual address.
    #[inline]
    pub const fn virtual_size(&self) -> u64 {
        self.num_pages << self.page_shift
    }

    /// `PSIZE`, one past the highest physical address the frame pool can produce.
    #[inline]
    pub const fn physical_size(&self) -> u64 {
        self.num_frames << self.page_shift
    }

    /// Returns true if `addr` lies inside the virtual address space.
    #[inline]
    pub const fn contains(&self, addr: VirtualAddress) -> bool {
        addr.as_u64() < self.virtual_size()
    }

    /// Splits a virtual address into its page number and the offset within the page.
    #[inline]
    pub const fn split(&self, addr: VirtualAddress) -> (PageNumber, u64) {
        let raw = addr.as_u64();
        (
            PageNumber::new(raw >> self.page_shift),
            raw & (self.page_size() - 1),
        )
    }

    /// Builds the physical address of `offset` inside `frame`.
    #[inline]
    pub const fn compose(&self, frame: FrameNumber, offset: u64) -> PhysicalAddress {
        PhysicalAddress::new((frame.as_u64() << self.page_shift) | offset)
    }
}
