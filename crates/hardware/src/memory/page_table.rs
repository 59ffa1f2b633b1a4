//! Demand-Paged Page Table.
//!
//! Maps guest virtual pages to zero-filled 4 KB host frames. Frames are
//! numbered in allocation order; that number forms the simulated physical
//! address, so two runs of the same program see the same cache indices.
//! Pages are never unmapped individually; `clear` drops all of them.

use std::collections::HashMap;

use crate::common::addr::{PhysAddr, VirtAddr};
use crate::common::constants::PAGE_SIZE;
use crate::common::data::AccessType;
use crate::common::error::{Result, SimError};

/// Page size as a host index.
const FRAME_BYTES: usize = PAGE_SIZE as usize;

/// Virtual page number to frame mapping plus the frame storage.
#[derive(Debug, Default)]
pub struct PageTable {
    entries: HashMap<u64, usize>,
    frames: Vec<Box<[u8]>>,
}

impl PageTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of mapped pages.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// True when the page containing `va` has a frame.
    pub fn is_mapped(&self, va: VirtAddr) -> bool {
        self.entries.contains_key(&va.page_number())
    }

    /// Maps the page containing `va`, allocating a zeroed frame on first use.
    ///
    /// Returns the frame number.
    pub fn map(&mut self, va: VirtAddr) -> usize {
        let vpn = va.page_number();
        if let Some(&frame) = self.entries.get(&vpn) {
            return frame;
        }
        let frame = self.frames.len();
        self.frames.push(vec![0; FRAME_BYTES].into_boxed_slice());
        let _ = self.entries.insert(vpn, frame);
        tracing::trace!(page = format_args!("{:#x}", va.page_base().val()), frame, "page mapped");
        frame
    }

    /// Maps every page overlapping `[start, start + len)`.
    pub fn map_range(&mut self, start: VirtAddr, len: u64) {
        if len == 0 {
            return;
        }
        let first = start.page_number();
        let last = start.offset(len - 1).page_number();
        for vpn in first..=last {
            let _ = self.map(VirtAddr::new(vpn * PAGE_SIZE));
        }
    }

    /// Translates `va` to its simulated physical address.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] if the page has no frame.
    pub fn translate(&self, va: VirtAddr, access: AccessType) -> Result<PhysAddr> {
        self.frame_of(va, access)
            .map(|frame| PhysAddr::from_frame(frame as u64, va.page_offset()))
    }

    fn frame_of(&self, va: VirtAddr, access: AccessType) -> Result<usize> {
        self.entries
            .get(&va.page_number())
            .copied()
            .ok_or(SimError::UnmappedAddress {
                addr: va.val(),
                access,
            })
    }

    /// Copies `buf.len()` bytes starting at `va`; the range must not leave
    /// the page.
    fn read_in_page(&self, va: VirtAddr, buf: &mut [u8], access: AccessType) -> Result<()> {
        let frame = &self.frames[self.frame_of(va, access)?];
        let off = va.page_offset() as usize;
        buf.copy_from_slice(&frame[off..off + buf.len()]);
        Ok(())
    }

    fn write_in_page(&mut self, va: VirtAddr, data: &[u8]) -> Result<()> {
        let idx = self.frame_of(va, AccessType::Write)?;
        let off = va.page_offset() as usize;
        self.frames[idx][off..off + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Reads `buf.len()` bytes at `va`, splitting at page boundaries.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] naming the first unmapped byte.
    pub fn read_bytes(&self, va: VirtAddr, buf: &mut [u8], access: AccessType) -> Result<()> {
        let mut done = 0;
        while done < buf.len() {
            let cur = va.offset(done as u64);
            let room = FRAME_BYTES - cur.page_offset() as usize;
            let n = room.min(buf.len() - done);
            self.read_in_page(cur, &mut buf[done..done + n], access)?;
            done += n;
        }
        Ok(())
    }

    /// Writes `data` at `va`, splitting at page boundaries.
    ///
    /// # Errors
    ///
    /// [`SimError::UnmappedAddress`] naming the first unmapped byte. Every
    /// page is checked before the first byte moves, so a failed write leaves
    /// memory untouched.
    pub fn write_bytes(&mut self, va: VirtAddr, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let last = va.offset(data.len() as u64 - 1);
        let mut cur = va;
        loop {
            let _ = self.frame_of(cur, AccessType::Write)?;
            if cur.page_number() == last.page_number() {
                break;
            }
            cur = cur.page_base().offset(PAGE_SIZE);
        }

        let mut done = 0;
        while done < data.len() {
            let cur = va.offset(done as u64);
            let room = FRAME_BYTES - cur.page_offset() as usize;
            let n = room.min(data.len() - done);
            self.write_in_page(cur, &data[done..done + n])?;
            done += n;
        }
        Ok(())
    }

    /// Drops every mapping and frame.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.frames.clear();
    }
}
