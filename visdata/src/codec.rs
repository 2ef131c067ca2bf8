// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Reading and writing interchange datasets.
//!
//! An interchange dataset holds the arrays `freqs` (`[nchan]`, Hz), `uu` and
//! `vv` (kilo-wavelengths), `real` and `imag`, `weight`, all `[nchan, nvis]`,
//! and `flag` (`[nchan, nvis]` or `[nvis]`), plus the `TELESCOP` and
//! `FMT_Version` attributes. On disk the channels are always in increasing
//! frequency order. The dataset does not record the order of the table it
//! came from: callers pass the order of the native table at hand, and arrays
//! are converted to and from it here.

use ndarray::{Array1, Array2, Axis, Ix1, Ix2};
use num_complex::Complex;
use std::path::Path;
use uvport_dataset::{DataSet, DatasetError};

use crate::errors::{Error, Result};
use crate::flags::FlagMask;
use crate::freq::FrequencyOrder;
use crate::{CollapsedVisibility, SpatialFrequencies};

pub const TELESCOPE_ATTR: &str = "TELESCOP";
pub const FORMAT_VERSION_ATTR: &str = "FMT_Version";

/// The contents of an interchange dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct InterchangeDataset {
    pub freqs: Array1<f64>,
    pub spatial: SpatialFrequencies,
    pub vis: CollapsedVisibility,
    pub flag: FlagMask,
    pub telescope: String,
    pub format_version: String,
}

impl InterchangeDataset {
    pub fn n_channels(&self) -> usize {
        self.freqs.len()
    }

    pub fn n_records(&self) -> usize {
        self.spatial.uu.ncols()
    }

    /// Check that all of the arrays agree on the channel and record counts.
    pub fn check_shapes(&self) -> Result<()> {
        let dims = (self.n_channels(), self.n_records());

        for (name, a) in &[
            ("uu", &self.spatial.uu),
            ("vv", &self.spatial.vv),
            ("real", &self.vis.real),
            ("imag", &self.vis.imag),
            ("weight", &self.vis.weight),
        ] {
            if a.dim() != dims {
                return Err(Error::Shape(format!(
                    "expected {name} to be {:?} to match freqs and uu, but it is {:?}",
                    [dims.0, dims.1],
                    a.shape()
                )));
            }
        }

        let flag_ok = match &self.flag {
            FlagMask::PerChannel(f) => f.dim() == dims,
            FlagMask::PerRecord(f) => f.len() == dims.1,
        };

        if !flag_ok {
            return Err(Error::Shape(format!(
                "flag is {:?}, which is neither {:?} nor [{}]",
                self.flag.shape(),
                [dims.0, dims.1],
                dims.1
            )));
        }

        Ok(())
    }

    /// Convert every channel-indexed array between increasing order and
    /// `order`. Applying the same order twice restores the original.
    pub fn in_order(self, order: FrequencyOrder) -> Self {
        InterchangeDataset {
            freqs: order.apply(&self.freqs),
            spatial: SpatialFrequencies {
                uu: order.apply(&self.spatial.uu),
                vv: order.apply(&self.spatial.vv),
            },
            vis: CollapsedVisibility {
                real: order.apply(&self.vis.real),
                imag: order.apply(&self.vis.imag),
                weight: order.apply(&self.vis.weight),
            },
            flag: self.flag.in_order(order),
            telescope: self.telescope,
            format_version: self.format_version,
        }
    }

    /// Keep only the records at the given indices, in that order.
    pub fn select_records(&self, records: &[usize]) -> Self {
        InterchangeDataset {
            freqs: self.freqs.clone(),
            spatial: self.spatial.select_records(records),
            vis: CollapsedVisibility {
                real: self.vis.real.select(Axis(1), records),
                imag: self.vis.imag.select(Axis(1), records),
                weight: self.vis.weight.select(Axis(1), records),
            },
            flag: self.flag.select_records(records),
            telescope: self.telescope.clone(),
            format_version: self.format_version.clone(),
        }
    }

    /// The model visibilities, `real + i * imag`, `[nchan, nvis]`.
    pub fn visibilities(&self) -> Array2<Complex<f64>> {
        ndarray::Zip::from(&self.vis.real)
            .and(&self.vis.imag)
            .map_collect(|re, im| Complex::new(*re, *im))
    }

    /// Write the dataset to `path`, replacing any dataset already there.
    ///
    /// The arrays of `self` are in `native_order`; they are written in
    /// increasing frequency order.
    pub fn write<P: AsRef<Path>>(&self, path: P, native_order: FrequencyOrder) -> Result<()> {
        self.check_shapes()?;

        let freqs = native_order.apply(&self.freqs);

        if FrequencyOrder::classify(freqs.view())? != FrequencyOrder::Increasing {
            return Err(Error::Configuration(format!(
                "the frequencies being written are not in {} order",
                if native_order.is_decreasing() {
                    "decreasing"
                } else {
                    "increasing"
                }
            )));
        }

        let mut ds = DataSet::create(path)?;
        ds.write_array("freqs", &freqs)?;
        ds.write_array("uu", &native_order.apply(&self.spatial.uu))?;
        ds.write_array("vv", &native_order.apply(&self.spatial.vv))?;
        ds.write_array("real", &native_order.apply(&self.vis.real))?;
        ds.write_array("imag", &native_order.apply(&self.vis.imag))?;
        ds.write_array("weight", &native_order.apply(&self.vis.weight))?;

        match &self.flag {
            FlagMask::PerChannel(f) => ds.write_array("flag", &native_order.apply(f))?,
            FlagMask::PerRecord(f) => ds.write_array("flag", f)?,
        }

        ds.set_attr(TELESCOPE_ATTR, self.telescope.as_str())?;
        ds.set_attr(FORMAT_VERSION_ATTR, self.format_version.as_str())?;
        ds.flush()?;
        Ok(())
    }

    /// Read the dataset at `path`, converting its arrays into
    /// `native_order`.
    pub fn read<P: AsRef<Path>>(path: P, native_order: FrequencyOrder) -> Result<Self> {
        let mut ds = DataSet::open(path)?;

        let freqs = ds.read_array::<f64, Ix1>("freqs")?;
        let uu = ds.read_array::<f64, Ix2>("uu")?;
        let vv = ds.read_array::<f64, Ix2>("vv")?;
        let real = ds.read_array::<f64, Ix2>("real")?;
        let imag = ds.read_array::<f64, Ix2>("imag")?;
        let weight = ds.read_array::<f64, Ix2>("weight")?;

        let flag = match ds.shape_of("flag")?.len() {
            1 => FlagMask::PerRecord(ds.read_array::<bool, Ix1>("flag")?),
            2 => FlagMask::PerChannel(ds.read_array::<bool, Ix2>("flag")?),
            n => {
                return Err(Error::Shape(format!(
                    "flag must be 1- or 2-dimensional, but it is {n}-dimensional"
                )));
            }
        };

        let telescope = text_attr(&ds, TELESCOPE_ATTR)?;
        let format_version = text_attr(&ds, FORMAT_VERSION_ATTR)?;

        let stored = InterchangeDataset {
            freqs,
            spatial: SpatialFrequencies { uu, vv },
            vis: CollapsedVisibility { real, imag, weight },
            flag,
            telescope,
            format_version,
        };

        stored.check_shapes()?;

        if FrequencyOrder::classify(stored.freqs.view())? != FrequencyOrder::Increasing {
            return Err(Error::Configuration(
                "the dataset's frequencies are not stored in increasing order".to_owned(),
            ));
        }

        Ok(stored.in_order(native_order))
    }
}

fn text_attr(ds: &DataSet, name: &str) -> Result<String> {
    match ds.attr(name)? {
        Some(v) => match v.as_text() {
            Some(s) => Ok(s.to_owned()),
            None => Err(DatasetError::Generic(format!(
                "expected attribute {name} to be text, but it is {v}"
            ))
            .into()),
        },
        None => Err(DatasetError::NoSuchItem(name.to_owned()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn sample(order: FrequencyOrder, flag: FlagMask) -> InterchangeDataset {
        let freqs = order.apply(&array![1.0e11, 1.5e11, 2.0e11]);
        let grid = |k: f64| Array2::from_shape_fn((3, 2), |(c, v)| k * (c as f64 + 1.0) + v as f64);

        InterchangeDataset {
            freqs,
            spatial: SpatialFrequencies {
                uu: grid(1.0),
                vv: grid(-2.0),
            },
            vis: CollapsedVisibility {
                real: grid(0.5),
                imag: grid(0.25),
                weight: grid(3.0),
            },
            flag,
            telescope: "ALMA".to_owned(),
            format_version: "v0.1".to_owned(),
        }
    }

    #[test]
    fn increasing_tables_are_stored_as_is() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.uvx");
        let mask = FlagMask::PerChannel(array![[true, false], [false, false], [false, true]]);
        let orig = sample(FrequencyOrder::Increasing, mask);

        orig.write(&path, FrequencyOrder::Increasing).unwrap();
        let back = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        assert_eq!(back, orig);
    }

    #[test]
    fn decreasing_tables_are_stored_increasing() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.uvx");
        let mask = FlagMask::PerChannel(array![[true, false], [false, false], [false, true]]);
        let orig = sample(FrequencyOrder::Decreasing, mask);

        orig.write(&path, FrequencyOrder::Decreasing).unwrap();

        // As stored:
        let canon = InterchangeDataset::read(&path, FrequencyOrder::Increasing).unwrap();
        assert_eq!(canon.freqs, array![1.0e11, 1.5e11, 2.0e11]);
        assert_eq!(canon.spatial.uu.row(0), orig.spatial.uu.row(2));
        assert_eq!(
            canon.flag,
            FlagMask::PerChannel(array![[false, true], [false, false], [true, false]])
        );

        // Back in the table's order:
        let back = InterchangeDataset::read(&path, FrequencyOrder::Decreasing).unwrap();
        assert_eq!(back, orig);
    }

    #[test]
    fn per_record_masks() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.uvx");
        let orig = sample(FrequencyOrder::Decreasing, FlagMask::PerRecord(array![false, true]));

        orig.write(&path, FrequencyOrder::Decreasing).unwrap();
        let back = InterchangeDataset::read(&path, FrequencyOrder::Decreasing).unwrap();
        assert_eq!(back.flag, FlagMask::PerRecord(array![false, true]));
        assert_eq!(back, orig);
    }

    #[test]
    fn attributes_are_written() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.uvx");
        let mut orig = sample(FrequencyOrder::Increasing, FlagMask::PerRecord(array![false, false]));
        orig.telescope = "VLA".to_owned();
        orig.write(&path, FrequencyOrder::Increasing).unwrap();

        let ds = DataSet::open(&path).unwrap();
        assert_eq!(text_attr(&ds, TELESCOPE_ATTR).unwrap(), "VLA");
        assert_eq!(text_attr(&ds, FORMAT_VERSION_ATTR).unwrap(), "v0.1");
    }

    #[test]
    fn order_mismatch_is_refused_on_write() {
        let tmp = tempfile::tempdir().unwrap();
        let orig = sample(FrequencyOrder::Increasing, FlagMask::PerRecord(array![false, false]));

        assert!(matches!(
            orig.write(tmp.path().join("x"), FrequencyOrder::Decreasing),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn inconsistent_shapes_are_rejected() {
        let mut bad = sample(FrequencyOrder::Increasing, FlagMask::PerRecord(array![false, false]));
        bad.vis.weight = Array2::zeros((3, 3));
        assert!(matches!(bad.check_shapes(), Err(Error::Shape(_))));

        let bad = sample(FrequencyOrder::Increasing, FlagMask::PerRecord(array![false]));
        assert!(matches!(bad.check_shapes(), Err(Error::Shape(_))));
    }

    #[test]
    fn unsorted_files_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data.uvx");
        let orig = sample(FrequencyOrder::Increasing, FlagMask::PerRecord(array![false, false]));
        orig.write(&path, FrequencyOrder::Increasing).unwrap();

        {
            let mut ds = DataSet::open(&path).unwrap();
            ds.write_array("freqs", &array![2.0e11, 1.5e11, 1.0e11]).unwrap();
        }

        assert!(matches!(
            InterchangeDataset::read(&path, FrequencyOrder::Decreasing),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn model_visibilities() {
        let mut ds = sample(FrequencyOrder::Increasing, FlagMask::PerRecord(array![false, false]));
        ds.vis.real = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        ds.vis.imag = array![[0.0, -1.0], [0.5, 0.0], [2.0, 1.0]];

        let v = ds.visibilities();
        assert_eq!(v[[0, 1]], Complex::new(2.0, -1.0));
        assert_eq!(v[[2, 0]], Complex::new(5.0, 2.0));
    }
}
