// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*!
The core error type used by uvport crates.

Higher-level crates define their own error enums and wrap this one.

*/

use thiserror::Error;

/// Errors raised by the low-level helpers in this crate.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An array did not have the expected dimensionality.
    #[error("expected {0}-dimensional array but found one that was {1}-dimensional")]
    DimensionMismatch(usize, usize),

    /// An array's element count did not agree with its declared shape.
    #[error("array shape {shape:?} implies {expected} elements, but {actual} were found")]
    ElementCountMismatch {
        shape: Vec<u64>,
        expected: usize,
        actual: usize,
    },

    /// An I/O-related error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A result type whose error is `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;
