// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Device tree memory reservations.

use zerocopy::byteorder::big_endian;
use zerocopy::{Immutable, IntoBytes, KnownLayout, Unaligned};

/// A 64-bit memory reservation, as stored in the reservation map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryReservation {
    address: u64,
    size: u64,
}

impl MemoryReservation {
    /// The all-zero entry that terminates the reservation map.
    pub const TERMINATOR: Self = Self::new(0, 0);

    /// Creates a new [`MemoryReservation`].
    #[must_use]
    pub const fn new(address: u64, size: u64) -> Self {
        Self { address, size }
    }

    /// Returns the physical address of the reserved memory region.
    #[must_use]
    pub fn address(&self) -> u64 {
        self.address
    }

    /// Returns the size of the reserved memory region.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    pub(crate) fn to_entry(self) -> ReservationEntry {
        ReservationEntry {
            address: self.address.into(),
            size: self.size.into(),
        }
    }
}

/// On-wire layout of one reservation map entry.
#[repr(C, packed)]
#[derive(Debug, Clone, Copy, IntoBytes, Unaligned, Immutable, KnownLayout)]
pub(crate) struct ReservationEntry {
    address: big_endian::U64,
    size: big_endian::U64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_is_big_endian() {
        let entry = MemoryReservation::new(0x1000, 0x200).to_entry();
        assert_eq!(
            entry.as_bytes(),
            &[0, 0, 0, 0, 0, 0, 0x10, 0, 0, 0, 0, 0, 0, 0, 0x02, 0]
        );
    }

    #[test]
    fn terminator_is_zero() {
        assert_eq!(MemoryReservation::TERMINATOR.to_entry().as_bytes(), &[0; 16]);
    }
}
