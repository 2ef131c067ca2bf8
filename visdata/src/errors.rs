// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*!
Error types for visibility conversion.

Every error here is fatal: each one marks a structural precondition that the
input data do not satisfy, so nothing is retried.

*/

use thiserror::Error;
use uvport_dataset::DatasetError;

/// An error arising while converting visibility data.
#[derive(Error, Debug)]
pub enum Error {
    /// The input data are set up in a way that cannot be converted, such as
    /// a frequency axis that is not strictly monotonic.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Geometry recomputed from the native table does not match what was
    /// stored in the interchange dataset.
    #[error("{quantity} of the native table and the interchange dataset do not match: {detail}")]
    Consistency { quantity: String, detail: String },

    /// A record's flags are set for some, but not all, of its polarizations
    /// and channels, which the all-axes policy cannot represent.
    #[error(
        "record {record} is only partially flagged across polarizations and channels; \
         the all-axes flag policy cannot represent it"
    )]
    PolicyAmbiguity { record: usize },

    /// The library needed to talk to the native table format is missing.
    #[error("the {binding} table integration is not available; {hint}")]
    IntegrationUnavailable { binding: String, hint: String },

    /// The polarization weights of a visibility sum to zero or to a
    /// non-finite value, so they cannot be averaged.
    #[error("the polarization weights of channel {channel}, record {record} sum to zero or are not finite")]
    ZeroWeightSum { channel: usize, record: usize },

    /// Arrays that should agree in their extents do not.
    #[error("inconsistent array shapes: {0}")]
    Shape(String),

    /// The native table backend reported a failure.
    #[error("error accessing table \"{path}\": {message}")]
    Table { path: String, message: String },

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A result type whose error is this crate's `Error`.
pub type Result<T> = std::result::Result<T, Error>;
