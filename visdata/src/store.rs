// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Access to native visibility tables.
//!
//! The conversion pipeline only talks to native tables through the
//! [`VisibilityStore`] trait. A store is opened by its constructor and
//! released when it is dropped; pending writes are committed by
//! [`VisibilityStore::flush`].

use ndarray::Array3;
use num_complex::Complex;

use crate::errors::{Error, Result};
use crate::{RawVisibilityBlock, SpectralWindow};

/// The name of the secondary data column that is dropped on import.
pub const CORRECTED_DATA_COLUMN: &str = "CORRECTED_DATA";

/// A native table of visibilities with a single spectral window.
pub trait VisibilityStore {
    /// Read the channel frequencies.
    fn spectral_window(&mut self) -> Result<SpectralWindow>;

    /// Read the columns needed for conversion.
    fn read_block(&mut self) -> Result<RawVisibilityBlock>;

    /// Overwrite the primary data column with `[npol, nchan, nvis]`
    /// visibilities. The shape must match the existing column.
    fn replace_data(&mut self, data: &Array3<Complex<f64>>) -> Result<()>;

    /// Remove the corrected-data column, if there is one. Returns whether a
    /// column was removed.
    fn remove_corrected_data(&mut self) -> Result<bool>;

    /// Commit any pending changes.
    fn flush(&mut self) -> Result<()>;
}

/// A visibility store held entirely in memory.
#[derive(Clone, Debug, PartialEq)]
pub struct MemoryVisibilityStore {
    window: SpectralWindow,
    block: RawVisibilityBlock,
    corrected_data: Option<Array3<Complex<f64>>>,
    n_data_writes: usize,
}

impl MemoryVisibilityStore {
    pub fn new(window: SpectralWindow, block: RawVisibilityBlock) -> Self {
        MemoryVisibilityStore {
            window,
            block,
            corrected_data: None,
            n_data_writes: 0,
        }
    }

    /// Add a corrected-data column.
    pub fn with_corrected_data(mut self, corrected: Array3<Complex<f64>>) -> Self {
        self.corrected_data = Some(corrected);
        self
    }

    pub fn window(&self) -> &SpectralWindow {
        &self.window
    }

    pub fn block(&self) -> &RawVisibilityBlock {
        &self.block
    }

    pub fn corrected_data(&self) -> Option<&Array3<Complex<f64>>> {
        self.corrected_data.as_ref()
    }

    /// How many times the data column has been overwritten.
    pub fn n_data_writes(&self) -> usize {
        self.n_data_writes
    }

    pub fn into_parts(
        self,
    ) -> (
        SpectralWindow,
        RawVisibilityBlock,
        Option<Array3<Complex<f64>>>,
    ) {
        (self.window, self.block, self.corrected_data)
    }
}

impl VisibilityStore for MemoryVisibilityStore {
    fn spectral_window(&mut self) -> Result<SpectralWindow> {
        Ok(self.window.clone())
    }

    fn read_block(&mut self) -> Result<RawVisibilityBlock> {
        Ok(self.block.clone())
    }

    fn replace_data(&mut self, data: &Array3<Complex<f64>>) -> Result<()> {
        if data.dim() != self.block.data.dim() {
            return Err(Error::Shape(format!(
                "cannot replace DATA of shape {:?} with an array of shape {:?}",
                self.block.data.shape(),
                data.shape()
            )));
        }

        self.block.data.assign(data);
        self.n_data_writes += 1;
        Ok(())
    }

    fn remove_corrected_data(&mut self) -> Result<bool> {
        Ok(self.corrected_data.take().is_some())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
