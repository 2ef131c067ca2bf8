// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Checking an interchange dataset against the native table it will be
//! written into.
//!
//! Before any visibilities are substituted into a native table, the geometry
//! stored in the interchange dataset is compared to the same geometry
//! recomputed from the table. This catches models computed for some other
//! dataset.

use ndarray::{ArrayBase, Data, Dimension};

use crate::codec::InterchangeDataset;
use crate::errors::{Error, Result};
use crate::flags::FlagMask;
use crate::{SpatialFrequencies, SpectralWindow};

/// Tolerances for comparing floating-point values.
///
/// Two values `a` and `b` are close if `|a - b| <= atol + rtol * |b|`, where
/// `b` is the reference value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance {
            rtol: 1e-5,
            atol: 1e-8,
        }
    }
}

impl Tolerance {
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        // Equal infinities are close.
        a == b || (a - b).abs() <= self.atol + self.rtol * b.abs()
    }

    /// Check that two arrays have the same shape and are element-wise close.
    /// `reference` holds the values recomputed from the native table.
    pub fn check_close<S1, S2, D>(
        &self,
        quantity: &str,
        stored: &ArrayBase<S1, D>,
        reference: &ArrayBase<S2, D>,
    ) -> Result<()>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
        D: Dimension,
    {
        if stored.shape() != reference.shape() {
            return Err(Error::Consistency {
                quantity: quantity.to_owned(),
                detail: format!(
                    "the dataset has shape {:?} but the table has {:?}",
                    stored.shape(),
                    reference.shape()
                ),
            });
        }

        let mismatch = stored
            .indexed_iter()
            .zip(reference.iter())
            .find(|((_, a), b)| !self.is_close(**a, **b));

        match mismatch {
            None => Ok(()),
            Some(((idx, a), b)) => Err(Error::Consistency {
                quantity: quantity.to_owned(),
                detail: format!(
                    "at {:?} the dataset has {} but the table has {}",
                    idx,
                    a,
                    b
                ),
            }),
        }
    }
}

/// Geometry recomputed from a native table.
#[derive(Clone, Debug, PartialEq)]
pub struct NativeGeometry {
    pub window: SpectralWindow,
    pub spatial: SpatialFrequencies,
    pub weight: ndarray::Array2<f64>,
    pub flag: FlagMask,
}

impl NativeGeometry {
    /// Keep only the records at the given indices, in that order.
    pub fn select_records(&self, records: &[usize]) -> Self {
        NativeGeometry {
            window: self.window.clone(),
            spatial: self.spatial.select_records(records),
            weight: self.weight.select(ndarray::Axis(1), records),
            flag: self.flag.select_records(records),
        }
    }
}

/// Check every geometric quantity of `stored` against `native`.
///
/// Both must be in the native channel order. Frequencies, spatial
/// frequencies, and weights are compared within `tol`; flags must match
/// exactly. The first mismatch is returned as an error.
pub fn validate_round_trip(
    tol: &Tolerance,
    stored: &InterchangeDataset,
    native: &NativeGeometry,
) -> Result<()> {
    tol.check_close("frequencies", &stored.freqs, &native.window.frequencies)?;
    tol.check_close("uu", &stored.spatial.uu, &native.spatial.uu)?;
    tol.check_close("vv", &stored.spatial.vv, &native.spatial.vv)?;
    tol.check_close("weights", &stored.vis.weight, &native.weight)?;
    check_flags(&stored.flag, &native.flag)
}

fn check_flags(stored: &FlagMask, native: &FlagMask) -> Result<()> {
    let quantity = "flags".to_owned();

    match (stored, native) {
        (FlagMask::PerChannel(s), FlagMask::PerChannel(n)) if s.shape() != n.shape() => {
            Err(Error::Consistency {
                quantity,
                detail: format!(
                    "the dataset has shape {:?} but the table has {:?}",
                    s.shape(),
                    n.shape()
                ),
            })
        }

        (FlagMask::PerRecord(s), FlagMask::PerRecord(n)) if s.len() != n.len() => {
            Err(Error::Consistency {
                quantity,
                detail: format!(
                    "the dataset has {} records but the table has {}",
                    s.len(),
                    n.len()
                ),
            })
        }

        (FlagMask::PerChannel(s), FlagMask::PerChannel(n)) => {
            let n_diff = s.iter().zip(n.iter()).filter(|(a, b)| a != b).count();

            if n_diff == 0 {
                Ok(())
            } else {
                Err(Error::Consistency {
                    quantity,
                    detail: format!("{n_diff} visibilities differ"),
                })
            }
        }

        (FlagMask::PerRecord(s), FlagMask::PerRecord(n)) => {
            let n_diff = s.iter().zip(n.iter()).filter(|(a, b)| a != b).count();

            if n_diff == 0 {
                Ok(())
            } else {
                Err(Error::Consistency {
                    quantity,
                    detail: format!("{n_diff} records differ"),
                })
            }
        }

        _ => Err(Error::Consistency {
            quantity,
            detail: format!(
                "the dataset's mask has shape {:?} but the table's has {:?}; \
                 were different flag policies used?",
                stored.shape(),
                native.shape()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn closeness_follows_allclose() {
        let tol = Tolerance::default();
        assert!(tol.is_close(1.0, 1.0 + 5e-6));
        assert!(!tol.is_close(1.0, 1.0 + 2e-5));
        assert!(tol.is_close(0.0, 5e-9));
        assert!(!tol.is_close(0.0, 5e-8));
        assert!(tol.is_close(f64::INFINITY, f64::INFINITY));
        assert!(!tol.is_close(f64::NAN, f64::NAN));

        // The relative term scales with the reference value.
        assert!(tol.is_close(1e6, 1e6 + 9.0));
        assert!(!tol.is_close(1e6, 1e6 + 11.0));
    }

    #[test]
    fn array_checks() {
        let tol = Tolerance::default();
        let a = array![[1.0, 2.0], [3.0, 4.0]];

        tol.check_close("uu", &a, &(&a * (1.0 + 1e-7))).unwrap();

        let mut b = a.clone();
        b[[1, 0]] = 3.1;

        match tol.check_close("uu", &a, &b) {
            Err(Error::Consistency { quantity, detail }) => {
                assert_eq!(quantity, "uu");
                assert!(detail.contains("(1, 0)"), "{}", detail);
            }
            other => panic!("unexpected result {:?}", other),
        }

        assert!(tol.check_close("uu", &a, &Array2::zeros((4, 1))).is_err());
    }

    #[test]
    fn flag_checks() {
        let pc = FlagMask::PerChannel(array![[true, false]]);
        let pr = FlagMask::PerRecord(array![true, false]);

        check_flags(&pc, &pc).unwrap();
        check_flags(&pr, &pr).unwrap();
        assert!(check_flags(&pc, &pr).is_err());
        assert!(check_flags(&pr, &FlagMask::PerRecord(array![true, true])).is_err());
        let taller = FlagMask::PerChannel(array![[true, false], [false, false]]);
        assert!(check_flags(&pc, &taller).is_err());
    }
}
