// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types for the `qdt_fdt` crate.

use thiserror::Error;

/// A failure code returned by the [`FdtWriter`](crate::FdtWriter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[non_exhaustive]
pub enum Error {
    /// The buffer is too small for the requested write.
    #[error("no space in buffer")]
    NoSpace,
    /// The call was made out of sequence.
    #[error("operation out of sequence")]
    BadState,
    /// The node structure is unbalanced or incomplete.
    #[error("badly structured device tree")]
    BadStructure,
    /// A name or size cannot be represented in the flattened format.
    #[error("bad value")]
    BadValue,
}

impl Error {
    /// Returns a human-readable description of this failure code.
    ///
    /// # Examples
    ///
    /// ```
    /// # use qdt_fdt::Error;
    /// assert_eq!(Error::NoSpace.description(), "no space in buffer");
    /// ```
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Error::NoSpace => "no space in buffer",
            Error::BadState => "operation out of sequence",
            Error::BadStructure => "badly structured device tree",
            Error::BadValue => "bad value",
        }
    }
}

/// A specialized [`Result`](core::result::Result) for FDT writing.
pub type Result<T> = core::result::Result<T, Error>;
