// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Core types and traits for uvport.
//!
//! The array types used throughout the workspace come from `ndarray` and the
//! complex types from `num-complex`; both are re-exported here so that the
//! downstream crates agree on a single version of each.

pub mod errors;
pub mod io;
#[cfg(feature = "notifications")]
pub mod notify;
pub mod num;

pub use errors::{CoreError, Result};
pub use ndarray::{self, Array, Array1, Array2, Array3, ArrayD, Axis, Ix1, Ix2, Ix3, IxDyn};
pub use num_complex::{self, Complex};

/// A "chained try" macro.
///
/// Attempts an operation that returns a `Result` and returns its `Ok` value
/// if the operation is successful. If not, it returns an `anyhow::Error` that
/// chains to the error that was returned, with explanatory text formatted
/// using the `format!` macro:
///
/// ```rust,ignore
/// let ds = ctry!(DataSet::open(&path); "couldn't open dataset {}", path.display());
/// ```
///
/// Note that the operation to be attempted and the arguments to `format!`
/// are separated by a semicolon within the `ctry!()` parentheses.
#[cfg(feature = "notifications")]
#[macro_export]
macro_rules! ctry {
    ($op:expr ; $( $chain_fmt_args:expr ),*) => {
        {
            use anyhow::Context;
            $op.with_context(|| format!($( $chain_fmt_args ),*))?
        }
    }
}
