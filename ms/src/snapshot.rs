// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Snapshot tables.
//!
//! A snapshot table holds the columns that uvport needs from a Measurement
//! Set as items of a uvport dataset, in the `[npol, nchan, nvis]` layout used
//! by the conversion pipeline: `DATA`, `UVW`, `FLAG`, `WEIGHT`, `ANTENNA1`,
//! `ANTENNA2`, `CHAN_FREQ`, and optionally `CORRECTED_DATA`.

use ndarray::{Array1, Array2, Array3, Ix1, Ix2, Ix3};
use num_complex::Complex;
use std::path::{Path, PathBuf};
use uvport_dataset::DataSet;
use uvport_visdata::store::CORRECTED_DATA_COLUMN;
use uvport_visdata::{Error, RawVisibilityBlock, Result, SpectralWindow, VisibilityStore};

/// A native table stored as a uvport dataset.
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    ds: DataSet,
}

impl SnapshotStore {
    /// Open an existing snapshot table.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_owned();

        let mut ds = DataSet::open(&path).map_err(|e| Error::Table {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        for name in &["DATA", "UVW", "FLAG", "WEIGHT", "ANTENNA1", "ANTENNA2", "CHAN_FREQ"] {
            if !ds.contains(name)? {
                return Err(Error::Table {
                    path: path.display().to_string(),
                    message: format!("missing column {name}"),
                });
            }
        }

        Ok(SnapshotStore { path, ds })
    }

    /// Create a snapshot table holding the given columns, replacing any
    /// snapshot already at `path`.
    pub fn create<P: AsRef<Path>>(
        path: P,
        window: &SpectralWindow,
        block: &RawVisibilityBlock,
        corrected_data: Option<&Array3<Complex<f64>>>,
    ) -> Result<Self> {
        block.check_shapes()?;

        if window.n_channels() != block.n_channels() {
            return Err(Error::Shape(format!(
                "the spectral window has {} channels but DATA has {}",
                window.n_channels(),
                block.n_channels()
            )));
        }

        let path = path.as_ref().to_owned();
        let mut ds = DataSet::create(&path)?;
        ds.write_array("DATA", &block.data)?;
        ds.write_array("UVW", &block.uvw)?;
        ds.write_array("FLAG", &block.flag)?;
        ds.write_array("WEIGHT", &block.weight)?;
        ds.write_array("ANTENNA1", &block.antenna1)?;
        ds.write_array("ANTENNA2", &block.antenna2)?;
        ds.write_array("CHAN_FREQ", &window.frequencies)?;

        if let Some(c) = corrected_data {
            if c.dim() != block.data.dim() {
                return Err(Error::Shape(format!(
                    "DATA is {:?} but {CORRECTED_DATA_COLUMN} is {:?}",
                    block.data.shape(),
                    c.shape()
                )));
            }

            ds.write_array(CORRECTED_DATA_COLUMN, c)?;
        }

        ds.flush()?;
        Ok(SnapshotStore { path, ds })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_corrected_data(&mut self) -> Result<bool> {
        Ok(self.ds.contains(CORRECTED_DATA_COLUMN)?)
    }
}

impl VisibilityStore for SnapshotStore {
    fn spectral_window(&mut self) -> Result<SpectralWindow> {
        Ok(SpectralWindow::new(
            self.ds.read_array::<f64, Ix1>("CHAN_FREQ")?,
        ))
    }

    fn read_block(&mut self) -> Result<RawVisibilityBlock> {
        let block = RawVisibilityBlock {
            data: self.ds.read_array::<Complex<f64>, Ix3>("DATA")?,
            uvw: self.ds.read_array::<f64, Ix2>("UVW")?,
            flag: self.ds.read_array::<bool, Ix3>("FLAG")?,
            weight: self.ds.read_array::<f64, Ix2>("WEIGHT")?,
            antenna1: self.ds.read_array::<i32, Ix1>("ANTENNA1")?,
            antenna2: self.ds.read_array::<i32, Ix1>("ANTENNA2")?,
        };

        block.check_shapes()?;

        if block.n_records() == 0 {
            return Err(no_records());
        }

        Ok(block)
    }

    fn replace_data(&mut self, data: &Array3<Complex<f64>>) -> Result<()> {
        let shape = self.ds.shape_of("DATA")?;
        let new_shape: Vec<u64> = data.shape().iter().map(|d| *d as u64).collect();

        if shape != new_shape {
            return Err(Error::Shape(format!(
                "cannot replace DATA of shape {:?} with an array of shape {:?}",
                shape,
                data.shape()
            )));
        }

        self.ds.write_array("DATA", data)?;
        Ok(())
    }

    fn remove_corrected_data(&mut self) -> Result<bool> {
        Ok(self.ds.remove_item(CORRECTED_DATA_COLUMN)?)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(self.ds.flush()?)
    }
}

/// Neither binding accepts a main table without records.
fn no_records() -> Error {
    Error::Shape("the table has no records".to_owned())
}

/// Assemble a block from per-record cells, as a Measurement Set main table
/// stores them.
///
/// `data` and `flag` hold one `[nchan, npol]` cell per record, `weight` one
/// `[npol]` cell per record.
pub fn block_from_cells(
    data: &[Array2<Complex<f64>>],
    flag: &[Array2<bool>],
    uvw: &[[f64; 3]],
    weight: &[Array1<f64>],
    antenna1: Vec<i32>,
    antenna2: Vec<i32>,
) -> Result<RawVisibilityBlock> {
    let nvis = data.len();

    let (nchan, npol) = match data.first() {
        Some(cell) => cell.dim(),
        None => return Err(no_records()),
    };

    if flag.len() != nvis || uvw.len() != nvis || weight.len() != nvis {
        return Err(Error::Shape(format!(
            "DATA has {nvis} records but FLAG has {}, UVW {}, and WEIGHT {}",
            flag.len(),
            uvw.len(),
            weight.len()
        )));
    }

    for (i, ((d, f), w)) in data.iter().zip(flag).zip(weight).enumerate() {
        if d.dim() != (nchan, npol) || f.dim() != (nchan, npol) || w.len() != npol {
            return Err(Error::Shape(format!(
                "record {i} has DATA {:?}, FLAG {:?}, and WEIGHT {:?}, but record 0 has DATA {:?}",
                d.shape(),
                f.shape(),
                w.shape(),
                [nchan, npol]
            )));
        }
    }

    let block = RawVisibilityBlock {
        data: Array3::from_shape_fn((npol, nchan, nvis), |(p, c, v)| data[v][[c, p]]),
        uvw: Array2::from_shape_fn((3, nvis), |(i, v)| uvw[v][i]),
        flag: Array3::from_shape_fn((npol, nchan, nvis), |(p, c, v)| flag[v][[c, p]]),
        weight: Array2::from_shape_fn((npol, nvis), |(p, v)| weight[v][p]),
        antenna1: Array1::from(antenna1),
        antenna2: Array1::from(antenna2),
    };

    block.check_shapes()?;
    Ok(block)
}
