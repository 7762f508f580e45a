// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::borrow::ToOwned;
use alloc::collections::btree_map::BTreeMap;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use zerocopy::IntoBytes;

use crate::error::{Error, Result};
use crate::header::{
    FDT_BEGIN_NODE, FDT_END, FDT_END_NODE, FDT_LAST_COMP_VERSION, FDT_MAGIC, FDT_PROP,
    FDT_TAGSIZE, FDT_VERSION, FdtHeader, align_tag_offset,
};
use crate::memreserve::MemoryReservation;

// https://devicetree-specification.readthedocs.io/en/latest/chapter5-flattened-format.html#memory-reservation-block
const RSVMAP_ALIGN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Reservation entries may still be added.
    Reservations,
    /// The structure block is being written.
    Struct,
}

/// Builds a flattened device tree blob inside a buffer of fixed capacity.
///
/// Calls must follow the order of the format: any number of
/// [`add_reservation`](Self::add_reservation) calls, one
/// [`finish_reservemap`](Self::finish_reservemap), a single depth-first walk
/// of balanced [`begin_node`](Self::begin_node) / [`end_node`](Self::end_node)
/// pairs with [`property`](Self::property) calls for the innermost open node,
/// and finally [`finish`](Self::finish). Calls out of that order fail with
/// [`Error::BadState`] or [`Error::BadStructure`].
///
/// The strings block is kept aside until [`finish`](Self::finish) but is
/// counted against the capacity from the moment a name is interned.
#[derive(Debug)]
pub struct FdtWriter {
    buf: Vec<u8>,
    state: State,
    /// End of the data written so far (reservation map or structure block).
    cursor: usize,
    off_mem_rsvmap: usize,
    off_dt_struct: usize,
    strings: Vec<u8>,
    string_map: BTreeMap<String, u32>,
    depth: usize,
    root_written: bool,
    boot_cpuid_phys: u32,
}

impl FdtWriter {
    /// Creates a writer over a zero-filled buffer of `capacity` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoSpace`] if `capacity` cannot hold the header and
    /// [`Error::BadValue`] if it does not fit in 32 bits.
    pub fn new(capacity: usize) -> Result<Self> {
        if u32::try_from(capacity).is_err() {
            return Err(Error::BadValue);
        }
        let off_mem_rsvmap = FdtHeader::SIZE.next_multiple_of(RSVMAP_ALIGN);
        if capacity < off_mem_rsvmap {
            return Err(Error::NoSpace);
        }

        Ok(Self {
            buf: vec![0; capacity],
            state: State::Reservations,
            cursor: off_mem_rsvmap,
            off_mem_rsvmap,
            off_dt_struct: 0,
            strings: Vec::new(),
            string_map: BTreeMap::new(),
            depth: 0,
            root_written: false,
            boot_cpuid_phys: 0,
        })
    }

    /// Returns the capacity of the output buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Sets the physical ID of the boot CPU recorded in the header.
    pub fn set_boot_cpuid_phys(&mut self, cpuid: u32) {
        self.boot_cpuid_phys = cpuid;
    }

    /// Adds an entry to the memory reservation map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadState`] once the reservation map is finished and
    /// [`Error::NoSpace`] if the entry does not fit.
    pub fn add_reservation(&mut self, reservation: MemoryReservation) -> Result<()> {
        self.expect_state(State::Reservations)?;
        self.write(reservation.to_entry().as_bytes())
    }

    /// Terminates the memory reservation map and starts the structure block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadState`] if called twice and [`Error::NoSpace`] if
    /// the terminating entry does not fit.
    pub fn finish_reservemap(&mut self) -> Result<()> {
        self.expect_state(State::Reservations)?;
        self.write(MemoryReservation::TERMINATOR.to_entry().as_bytes())?;
        self.off_dt_struct = self.cursor;
        self.state = State::Struct;
        Ok(())
    }

    /// Starts a node with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadStructure`] if a root node was already closed,
    /// [`Error::BadValue`] if `name` contains a NUL byte and
    /// [`Error::NoSpace`] if the node header does not fit.
    pub fn begin_node(&mut self, name: &str) -> Result<()> {
        self.expect_state(State::Struct)?;
        if self.depth == 0 && self.root_written {
            return Err(Error::BadStructure);
        }
        if name.as_bytes().contains(&0) {
            return Err(Error::BadValue);
        }

        let start = self.cursor;
        let len = FDT_TAGSIZE + align_tag_offset(name.len() + 1);
        self.reserve(len)?;
        self.put(&FDT_BEGIN_NODE.to_be_bytes());
        self.put(name.as_bytes());
        self.pad_to(start + len);

        self.depth += 1;
        self.root_written = true;
        Ok(())
    }

    /// Adds a property to the innermost open node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadStructure`] if no node is open,
    /// [`Error::BadValue`] if `name` contains a NUL byte and
    /// [`Error::NoSpace`] if the property or its name does not fit.
    pub fn property(&mut self, name: &str, value: &[u8]) -> Result<()> {
        self.expect_state(State::Struct)?;
        if self.depth == 0 {
            return Err(Error::BadStructure);
        }
        if name.as_bytes().contains(&0) {
            return Err(Error::BadValue);
        }
        let value_len = to_u32(value.len())?;

        let start = self.cursor;
        let interned = self.string_map.get(name).copied();
        let name_len = if interned.is_some() { 0 } else { name.len() + 1 };
        let len = 3 * FDT_TAGSIZE + align_tag_offset(value.len());
        self.reserve(len + name_len)?;

        let name_offset = match interned {
            Some(offset) => offset,
            None => self.intern(name)?,
        };
        self.put(&FDT_PROP.to_be_bytes());
        self.put(&value_len.to_be_bytes());
        self.put(&name_offset.to_be_bytes());
        self.put(value);
        self.pad_to(start + len);
        Ok(())
    }

    /// Ends the innermost open node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadStructure`] if no node is open and
    /// [`Error::NoSpace`] if the token does not fit.
    pub fn end_node(&mut self) -> Result<()> {
        self.expect_state(State::Struct)?;
        if self.depth == 0 {
            return Err(Error::BadStructure);
        }
        self.write(&FDT_END_NODE.to_be_bytes())?;
        self.depth -= 1;
        Ok(())
    }

    /// Completes the blob and returns the whole buffer.
    ///
    /// The returned buffer is [`capacity`](Self::capacity) bytes long; the
    /// `totalsize` field of its header tells how much of it is used.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadState`] if the reservation map was never finished,
    /// [`Error::BadStructure`] if a node is still open or none was written and
    /// [`Error::NoSpace`] if the end token does not fit.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        self.expect_state(State::Struct)?;
        if self.depth != 0 || !self.root_written {
            return Err(Error::BadStructure);
        }
        self.write(&FDT_END.to_be_bytes())?;

        let off_dt_strings = self.cursor;
        let strings = core::mem::take(&mut self.strings);
        self.put(&strings);
        let totalsize = self.cursor;

        let header = FdtHeader {
            magic: FDT_MAGIC.into(),
            totalsize: to_u32(totalsize)?.into(),
            off_dt_struct: to_u32(self.off_dt_struct)?.into(),
            off_dt_strings: to_u32(off_dt_strings)?.into(),
            off_mem_rsvmap: to_u32(self.off_mem_rsvmap)?.into(),
            version: FDT_VERSION.into(),
            last_comp_version: FDT_LAST_COMP_VERSION.into(),
            boot_cpuid_phys: self.boot_cpuid_phys.into(),
            size_dt_strings: to_u32(strings.len())?.into(),
            size_dt_struct: to_u32(off_dt_strings - self.off_dt_struct)?.into(),
        };
        self.buf[..FdtHeader::SIZE].copy_from_slice(header.as_bytes());

        Ok(self.buf)
    }

    fn expect_state(&self, state: State) -> Result<()> {
        if self.state == state {
            Ok(())
        } else {
            Err(Error::BadState)
        }
    }

    /// Checks that `len` more bytes fit next to the strings block.
    fn reserve(&self, len: usize) -> Result<()> {
        let used = self.cursor + self.strings.len();
        if used + len > self.buf.len() {
            Err(Error::NoSpace)
        } else {
            Ok(())
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.put(bytes);
        Ok(())
    }

    /// Copies `bytes` at the cursor. Space must have been reserved.
    fn put(&mut self, bytes: &[u8]) {
        let end = self.cursor + bytes.len();
        self.buf[self.cursor..end].copy_from_slice(bytes);
        self.cursor = end;
    }

    /// Zero-fills from the cursor up to `end`.
    fn pad_to(&mut self, end: usize) {
        self.buf[self.cursor..end].fill(0);
        self.cursor = end;
    }

    fn intern(&mut self, name: &str) -> Result<u32> {
        let offset = to_u32(self.strings.len())?;
        self.strings.extend_from_slice(name.as_bytes());
        self.strings.push(0);
        self.string_map.insert(name.to_owned(), offset);
        Ok(offset)
    }
}

fn to_u32(value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::BadValue)
}
