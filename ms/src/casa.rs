// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! CASA Measurement Sets, through casacore.
//!
//! Without the `casa` feature this crate is not linked against casacore, and
//! [`CasaStore::open`] always fails with `Error::IntegrationUnavailable`.

#[cfg(not(feature = "casa"))]
use std::path::Path;
use uvport_visdata::{Error, Result};

/// The corrective hint reported when casacore support is missing.
pub const CASA_HINT: &str = "rebuild uvport with `--features casa` (this requires the casacore \
     libraries), or convert the table to a snapshot and pass `--snapshot`";

fn unavailable() -> Error {
    Error::IntegrationUnavailable {
        binding: "casacore".to_owned(),
        hint: CASA_HINT.to_owned(),
    }
}

#[cfg(feature = "casa")]
mod imp {
    use ndarray::{Array1, Array2, Array3};
    use num_complex::Complex;
    use rubbl_casatables::{Table, TableOpenMode};
    use std::path::{Path, PathBuf};
    use uvport_visdata::store::CORRECTED_DATA_COLUMN;
    use uvport_visdata::{Error, RawVisibilityBlock, Result, SpectralWindow, VisibilityStore};

    use crate::snapshot::block_from_cells;

    /// A Measurement Set opened through casacore.
    ///
    /// The main table is held open until the store is dropped. casacore
    /// commits pending writes when the table is closed.
    pub struct CasaStore {
        path: PathBuf,
        table: Table,
    }

    fn table_error<E: std::fmt::Display>(path: &Path) -> impl FnOnce(E) -> Error + '_ {
        move |e| Error::Table {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    }

    impl CasaStore {
        pub fn open<P: AsRef<Path>>(path: P, writable: bool) -> Result<Self> {
            let path = path.as_ref().to_owned();
            let mode = if writable {
                TableOpenMode::ReadWrite
            } else {
                TableOpenMode::Read
            };

            let table = Table::open(&path, mode).map_err(table_error(&path))?;
            Ok(CasaStore { path, table })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    impl VisibilityStore for CasaStore {
        fn spectral_window(&mut self) -> Result<SpectralWindow> {
            let spw_path = self.path.join("SPECTRAL_WINDOW");
            let mut spw =
                Table::open(&spw_path, TableOpenMode::Read).map_err(table_error(&spw_path))?;

            if spw.n_rows() != 1 {
                return Err(Error::Configuration(format!(
                    "expected exactly one spectral window in \"{}\", but found {}",
                    self.path.display(),
                    spw.n_rows()
                )));
            }

            let freqs: Vec<f64> = spw
                .get_cell_as_vec("CHAN_FREQ", 0)
                .map_err(table_error(&spw_path))?;
            Ok(SpectralWindow::new(Array1::from(freqs)))
        }

        fn read_block(&mut self) -> Result<RawVisibilityBlock> {
            let n_rows = self.table.n_rows();
            let path = self.path.clone();

            let mut data = Vec::with_capacity(n_rows as usize);
            let mut flag = Vec::with_capacity(n_rows as usize);
            let mut uvw = Vec::with_capacity(n_rows as usize);
            let mut weight = Vec::with_capacity(n_rows as usize);

            for row in 0..n_rows {
                let d: Array2<Complex<f32>> = self
                    .table
                    .get_cell("DATA", row)
                    .map_err(table_error(&path))?;
                data.push(d.mapv(|c| Complex::new(c.re as f64, c.im as f64)));

                let f: Array2<bool> = self
                    .table
                    .get_cell("FLAG", row)
                    .map_err(table_error(&path))?;
                flag.push(f);

                let u: Vec<f64> = self
                    .table
                    .get_cell_as_vec("UVW", row)
                    .map_err(table_error(&path))?;

                if u.len() != 3 {
                    return Err(Error::Shape(format!(
                        "UVW of row {row} has {} elements",
                        u.len()
                    )));
                }

                uvw.push([u[0], u[1], u[2]]);

                let w: Vec<f32> = self
                    .table
                    .get_cell_as_vec("WEIGHT", row)
                    .map_err(table_error(&path))?;
                weight.push(w.iter().map(|x| *x as f64).collect::<Array1<f64>>());
            }

            let antenna1: Vec<i32> = self
                .table
                .get_col_as_vec("ANTENNA1")
                .map_err(table_error(&path))?;
            let antenna2: Vec<i32> = self
                .table
                .get_col_as_vec("ANTENNA2")
                .map_err(table_error(&path))?;

            block_from_cells(&data, &flag, &uvw, &weight, antenna1, antenna2)
        }

        fn replace_data(&mut self, data: &Array3<Complex<f64>>) -> Result<()> {
            let (npol, nchan, nvis) = data.dim();

            if nvis as u64 != self.table.n_rows() {
                return Err(Error::Shape(format!(
                    "cannot write {} records of DATA into a table with {} rows",
                    nvis,
                    self.table.n_rows()
                )));
            }

            let path = self.path.clone();

            for row in 0..nvis {
                let cell = Array2::from_shape_fn((nchan, npol), |(c, p)| {
                    let v = data[[p, c, row]];
                    Complex::new(v.re as f32, v.im as f32)
                });
                self.table
                    .put_cell("DATA", row as u64, &cell)
                    .map_err(table_error(&path))?;
            }

            Ok(())
        }

        fn remove_corrected_data(&mut self) -> Result<bool> {
            let path = self.path.clone();
            let names = self.table.column_names().map_err(table_error(&path))?;

            if !names.iter().any(|n| n == CORRECTED_DATA_COLUMN) {
                return Ok(false);
            }

            self.table
                .remove_column(CORRECTED_DATA_COLUMN)
                .map_err(table_error(&path))?;
            Ok(true)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }
}

#[cfg(feature = "casa")]
pub use imp::CasaStore;

/// A Measurement Set opened through casacore. This build has no casacore
/// support, so no value of this type can be created.
#[cfg(not(feature = "casa"))]
#[derive(Debug)]
pub enum CasaStore {}

#[cfg(not(feature = "casa"))]
impl CasaStore {
    pub fn open<P: AsRef<Path>>(_path: P, _writable: bool) -> Result<Self> {
        Err(unavailable())
    }
}

#[cfg(not(feature = "casa"))]
impl uvport_visdata::VisibilityStore for CasaStore {
    fn spectral_window(&mut self) -> Result<uvport_visdata::SpectralWindow> {
        match *self {}
    }

    fn read_block(&mut self) -> Result<uvport_visdata::RawVisibilityBlock> {
        match *self {}
    }

    fn replace_data(
        &mut self,
        _data: &ndarray::Array3<num_complex::Complex<f64>>,
    ) -> Result<()> {
        match *self {}
    }

    fn remove_corrected_data(&mut self) -> Result<bool> {
        match *self {}
    }

    fn flush(&mut self) -> Result<()> {
        match *self {}
    }
}

/// Check whether casacore support is compiled in, returning the
/// corrective error if not.
pub fn require_casacore() -> Result<()> {
    if cfg!(feature = "casa") {
        Ok(())
    } else {
        Err(unavailable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "casa"))]
    #[test]
    fn missing_casacore_is_reported() {
        match CasaStore::open("vis.ms", false) {
            Err(Error::IntegrationUnavailable { binding, hint }) => {
                assert_eq!(binding, "casacore");
                assert!(hint.contains("--features casa"));
            }
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("opened a table without casacore"),
        }

        assert!(require_casacore().is_err());
        assert!(crate::open_store(crate::Binding::Casa, "vis.ms", true).is_err());
    }

    #[cfg(feature = "casa")]
    #[test]
    fn missing_tables_are_reported() {
        let tmp = tempfile::tempdir().unwrap();
        require_casacore().unwrap();

        assert!(matches!(
            CasaStore::open(tmp.path().join("nothing.ms"), false),
            Err(Error::Table { .. })
        ));
    }
}
