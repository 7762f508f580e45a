// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Error types for the `qdt` crate.

use core::fmt;

use thiserror::Error;

/// The encoder call that failed while flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Step {
    /// Setting up the output buffer.
    Create,
    /// Terminating the memory reservation map.
    FinishReservemap,
    /// Starting a node.
    BeginNode,
    /// Writing a property.
    Property,
    /// Ending a node.
    EndNode,
    /// Completing the header and strings block.
    Finish,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Create => "create",
            Step::FinishReservemap => "finish_reservemap",
            Step::BeginNode => "begin_node",
            Step::Property => "property",
            Step::EndNode => "end_node",
            Step::Finish => "finish",
        };
        f.write_str(name)
    }
}

/// An error that can occur when flattening a device tree.
///
/// Carries the first encoder failure of the operation and the step that
/// produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("error flattening device tree: {step}(): {code}")]
pub struct Error {
    step: Step,
    #[source]
    code: qdt_fdt::Error,
}

impl Error {
    /// Creates a new `Error` for a failure of `step`.
    #[must_use]
    pub fn new(step: Step, code: qdt_fdt::Error) -> Self {
        Self { step, code }
    }

    /// Returns a closure tagging an encoder failure with `step`, for use
    /// with [`Result::map_err`].
    pub(crate) fn at(step: Step) -> impl FnOnce(qdt_fdt::Error) -> Self {
        move |code| Self::new(step, code)
    }

    /// Returns the encoder call that failed.
    #[must_use]
    pub fn step(&self) -> Step {
        self.step
    }

    /// Returns the encoder failure code.
    #[must_use]
    pub fn code(&self) -> qdt_fdt::Error {
        self.code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn message_names_step_and_code() {
        let err = Error::new(Step::Property, qdt_fdt::Error::NoSpace);
        assert_eq!(
            err.to_string(),
            "error flattening device tree: property(): no space in buffer"
        );
    }

    #[test]
    fn source_is_the_code() {
        use core::error::Error as _;

        let err = Error::new(Step::Finish, qdt_fdt::Error::BadStructure);
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "badly structured device tree");
    }
}
