// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The [FDT header] and structure block tokens.
//!
//! [FDT header]: https://devicetree-specification.readthedocs.io/en/latest/chapter5-flattened-format.html#header

use zerocopy::byteorder::big_endian;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

/// Magic number at the start of every blob.
pub const FDT_MAGIC: u32 = 0xd00d_feed;
/// Format version written by this crate.
pub const FDT_VERSION: u32 = 17;
/// Oldest format version the written blobs are compatible with.
pub const FDT_LAST_COMP_VERSION: u32 = 16;

/// Starts a node; followed by the NUL-terminated node name.
pub const FDT_BEGIN_NODE: u32 = 0x1;
/// Ends the most recently started node.
pub const FDT_END_NODE: u32 = 0x2;
/// A property; followed by value length, name offset and the value.
pub const FDT_PROP: u32 = 0x3;
/// Ends the structure block.
pub const FDT_END: u32 = 0x9;

/// Alignment of every token in the structure block.
pub const FDT_TAGSIZE: usize = size_of::<u32>();

/// The header at the start of a flattened device tree blob.
#[repr(C, packed)]
#[derive(Debug, Copy, Clone, FromBytes, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub struct FdtHeader {
    pub(crate) magic: big_endian::U32,
    pub(crate) totalsize: big_endian::U32,
    pub(crate) off_dt_struct: big_endian::U32,
    pub(crate) off_dt_strings: big_endian::U32,
    pub(crate) off_mem_rsvmap: big_endian::U32,
    pub(crate) version: big_endian::U32,
    pub(crate) last_comp_version: big_endian::U32,
    pub(crate) boot_cpuid_phys: big_endian::U32,
    pub(crate) size_dt_strings: big_endian::U32,
    pub(crate) size_dt_struct: big_endian::U32,
}

impl FdtHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = size_of::<Self>();

    /// Views the start of `blob` as a header.
    ///
    /// Returns `None` if the blob is shorter than the header or does not
    /// start with [`FDT_MAGIC`]. No other field is checked.
    #[must_use]
    pub fn from_blob(blob: &[u8]) -> Option<&Self> {
        let (header, _) = Self::ref_from_prefix(blob).ok()?;
        (header.magic() == FDT_MAGIC).then_some(header)
    }

    /// Magic number of the device tree.
    #[must_use]
    pub fn magic(&self) -> u32 {
        self.magic.get()
    }

    /// Number of bytes of the buffer actually used by the device tree.
    #[must_use]
    pub fn totalsize(&self) -> u32 {
        self.totalsize.get()
    }

    /// Offset of the structure block.
    #[must_use]
    pub fn off_dt_struct(&self) -> u32 {
        self.off_dt_struct.get()
    }

    /// Offset of the strings block.
    #[must_use]
    pub fn off_dt_strings(&self) -> u32 {
        self.off_dt_strings.get()
    }

    /// Offset of the memory reservation map.
    #[must_use]
    pub fn off_mem_rsvmap(&self) -> u32 {
        self.off_mem_rsvmap.get()
    }

    /// Format version.
    #[must_use]
    pub fn version(&self) -> u32 {
        self.version.get()
    }

    /// Last compatible format version.
    #[must_use]
    pub fn last_comp_version(&self) -> u32 {
        self.last_comp_version.get()
    }

    /// Physical ID of the boot CPU.
    #[must_use]
    pub fn boot_cpuid_phys(&self) -> u32 {
        self.boot_cpuid_phys.get()
    }

    /// Size of the strings block.
    #[must_use]
    pub fn size_dt_strings(&self) -> u32 {
        self.size_dt_strings.get()
    }

    /// Size of the structure block.
    #[must_use]
    pub fn size_dt_struct(&self) -> u32 {
        self.size_dt_struct.get()
    }
}

/// Rounds `offset` up to the next token boundary.
pub(crate) fn align_tag_offset(offset: usize) -> usize {
    offset.next_multiple_of(FDT_TAGSIZE)
}
