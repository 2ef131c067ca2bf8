// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Working with interferometric visibility data.
//!
//! This crate holds the conversion pipeline between a native visibility table
//! (anything implementing [`VisibilityStore`]) and the uvport interchange
//! dataset. Arrays follow the native table's axis conventions: polarization
//! first, then channel, then record.

use ndarray::{Array1, Array2, Array3, Axis};
use num_complex::Complex;

pub mod codec;
pub mod config;
pub mod convert;
pub mod errors;
pub mod flags;
pub mod freq;
pub mod polavg;
pub mod store;
pub mod units;
pub mod validate;

pub use codec::InterchangeDataset;
pub use config::{ConversionConfig, SubstitutionMode};
pub use convert::{export, import};
pub use errors::{Error, Result};
pub use flags::{FlagMask, FlagPolicy};
pub use freq::FrequencyOrder;
pub use store::{MemoryVisibilityStore, VisibilityStore};
pub use validate::Tolerance;

/// The channel frequencies of a spectral window, in Hz.
#[derive(Clone, Debug, PartialEq)]
pub struct SpectralWindow {
    pub frequencies: Array1<f64>,
}

impl SpectralWindow {
    pub fn new(frequencies: Array1<f64>) -> Self {
        SpectralWindow { frequencies }
    }

    pub fn n_channels(&self) -> usize {
        self.frequencies.len()
    }

    /// Classify the ordering of the frequency axis.
    pub fn order(&self) -> Result<FrequencyOrder> {
        FrequencyOrder::classify(self.frequencies.view())
    }
}

/// The raw columns of a native visibility table.
#[derive(Clone, Debug, PartialEq)]
pub struct RawVisibilityBlock {
    /// Complex visibilities, `[npol, nchan, nvis]`.
    pub data: Array3<Complex<f64>>,

    /// Baseline coordinates in meters, `[3, nvis]`.
    pub uvw: Array2<f64>,

    /// Raw flags, `[npol, nchan, nvis]`; true means bad.
    pub flag: Array3<bool>,

    /// Per-record weights, `[npol, nvis]`.
    pub weight: Array2<f64>,

    pub antenna1: Array1<i32>,
    pub antenna2: Array1<i32>,
}

impl RawVisibilityBlock {
    pub fn n_pols(&self) -> usize {
        self.data.dim().0
    }

    pub fn n_channels(&self) -> usize {
        self.data.dim().1
    }

    pub fn n_records(&self) -> usize {
        self.data.dim().2
    }

    /// Check that all of the columns agree on their polarization, channel,
    /// and record counts.
    pub fn check_shapes(&self) -> Result<()> {
        let (npol, nchan, nvis) = self.data.dim();

        if npol == 0 || nchan == 0 {
            return Err(Error::Shape(format!(
                "DATA must have at least one polarization and one channel; got {:?}",
                self.data.shape()
            )));
        }

        let mut problems = Vec::new();

        if self.uvw.dim() != (3, nvis) {
            problems.push(format!("UVW is {:?}", self.uvw.shape()));
        }

        if self.flag.dim() != (npol, nchan, nvis) {
            problems.push(format!("FLAG is {:?}", self.flag.shape()));
        }

        if self.weight.dim() != (npol, nvis) {
            problems.push(format!("WEIGHT is {:?}", self.weight.shape()));
        }

        if self.antenna1.len() != nvis {
            problems.push(format!("ANTENNA1 has {} records", self.antenna1.len()));
        }

        if self.antenna2.len() != nvis {
            problems.push(format!("ANTENNA2 has {} records", self.antenna2.len()));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Shape(format!(
                "DATA is {:?} but {}",
                self.data.shape(),
                problems.join(", ")
            )))
        }
    }

    /// Which records are autocorrelations.
    pub fn autocorrelations(&self) -> Array1<bool> {
        ndarray::Zip::from(&self.antenna1)
            .and(&self.antenna2)
            .map_collect(|a1, a2| a1 == a2)
    }
}

/// Baseline coordinates expressed in kilo-wavelengths, `[nchan, nvis]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SpatialFrequencies {
    pub uu: Array2<f64>,
    pub vv: Array2<f64>,
}

impl SpatialFrequencies {
    /// Keep only the records at the given indices, in that order.
    pub fn select_records(&self, records: &[usize]) -> Self {
        SpatialFrequencies {
            uu: self.uu.select(Axis(1), records),
            vv: self.vv.select(Axis(1), records),
        }
    }
}

/// Visibilities averaged over polarization, each `[nchan, nvis]`.
#[derive(Clone, Debug, PartialEq)]
pub struct CollapsedVisibility {
    pub real: Array2<f64>,
    pub imag: Array2<f64>,
    pub weight: Array2<f64>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_checks() {
        let b = testutil::block(3);
        assert_eq!((b.n_pols(), b.n_channels(), b.n_records()), (2, 3, 4));
        b.check_shapes().unwrap();

        let mut bad = b.clone();
        bad.weight = Array2::zeros((2, 5));
        bad.antenna2 = ndarray::array![1, 2];

        match bad.check_shapes() {
            Err(Error::Shape(msg)) => {
                assert!(msg.contains("WEIGHT"));
                assert!(msg.contains("ANTENNA2"));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn autocorrelations() {
        let b = testutil::block(1);
        assert_eq!(
            b.autocorrelations(),
            ndarray::array![false, false, false, true]
        );
    }
}
