//! Physical and Virtual Address types.
//!
//! Guest code only ever sees virtual addresses. The page table hands out
//! simulated physical frames, and the cache hierarchy is indexed by the
//! physical address so that timing does not depend on host allocation.
//! Keeping the two in distinct types makes it impossible to feed a virtual
//! address to a cache by accident.

use super::constants::{PAGE_OFFSET_MASK, PAGE_SHIFT};

/// A virtual address in the guest address space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtAddr(pub u64);

/// A simulated physical address (frame number plus page offset).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }

    /// Extracts the page offset (the low 12 bits).
    #[inline(always)]
    pub const fn page_offset(&self) -> u64 {
        self.0 & PAGE_OFFSET_MASK
    }

    /// Returns the virtual page number.
    #[inline(always)]
    pub const fn page_number(&self) -> u64 {
        self.0 >> PAGE_SHIFT
    }

    /// Returns the address rounded down to its page boundary.
    #[inline(always)]
    pub const fn page_base(&self) -> Self {
        Self(self.0 & !PAGE_OFFSET_MASK)
    }

    /// Returns the address `delta` bytes further on, wrapping at 2^64.
    #[inline(always)]
    pub const fn offset(&self, delta: u64) -> Self {
        Self(self.0.wrapping_add(delta))
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Builds the physical address of byte `offset` inside frame `frame`.
    #[inline(always)]
    pub const fn from_frame(frame: u64, offset: u64) -> Self {
        Self((frame << PAGE_SHIFT) | (offset & PAGE_OFFSET_MASK))
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub const fn val(&self) -> u64 {
        self.0
    }
}
