// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use alloc::string::String;
use alloc::vec::Vec;

/// A named byte value attached to a [`Node`](crate::Node).
///
/// The value is stored exactly as it will appear in the flattened blob:
/// integers are big-endian and strings carry their NUL terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    value: Vec<u8>,
}

impl Property {
    /// Creates a new `Property` with the given name and value.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Property;
    /// let prop = Property::new("my-prop", vec![1, 2, 3, 4]);
    /// assert_eq!(prop.name(), "my-prop");
    /// assert_eq!(prop.value(), &[1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Returns the name of this property.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the raw value of this property.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Returns the length of the value in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Returns `true` for a property without a value, such as a flag.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Returns the value as a single big-endian `u32` cell.
    ///
    /// Returns `None` unless the value is exactly four bytes long.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Property;
    /// let prop = Property::new("my-prop", 1234u32.to_be_bytes());
    /// assert_eq!(prop.as_u32(), Some(1234));
    /// ```
    #[must_use]
    pub fn as_u32(&self) -> Option<u32> {
        self.value.as_slice().try_into().ok().map(u32::from_be_bytes)
    }

    /// Returns the value as a single big-endian `u64`.
    ///
    /// Returns `None` unless the value is exactly eight bytes long.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.value.as_slice().try_into().ok().map(u64::from_be_bytes)
    }

    /// Returns the value as a string, without its NUL terminator.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt::Property;
    /// let prop = Property::new("model", "linux,dummy-virt\0");
    /// assert_eq!(prop.as_str(), Some("linux,dummy-virt"));
    /// ```
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.value)
            .ok()
            .map(|s| s.trim_end_matches('\0'))
    }

    /// Returns an iterator over the value as big-endian `u32` cells.
    ///
    /// Trailing bytes that do not make up a whole cell are ignored.
    pub fn cells(&self) -> impl Iterator<Item = u32> + '_ {
        self.value
            .chunks_exact(size_of::<u32>())
            .map(|cell| u32::from_be_bytes([cell[0], cell[1], cell[2], cell[3]]))
    }
}
