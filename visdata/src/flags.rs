// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Resolving raw flags into a mask of excluded visibilities.
//!
//! Raw flags are recorded per polarization, channel, and record. Once the
//! polarizations have been averaged, a visibility is either usable or not,
//! and there are two ways to decide that; see [`FlagPolicy`]. Either way,
//! autocorrelations are always excluded.

use ndarray::{Array1, Array2, Array3, Axis};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::freq::FrequencyOrder;

/// How to collapse raw flags into an exclusion mask.
///
/// An export and the import that validates against it must use the same
/// policy.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FlagPolicy {
    /// A channel of a record is excluded if any of its polarizations is
    /// flagged. The mask is `[nchan, nvis]`.
    AnyAxis,

    /// A record is excluded if every polarization of every channel is
    /// flagged. Records that are only partially flagged are an error. The
    /// mask is `[nvis]`.
    AllAxes,
}

impl Default for FlagPolicy {
    fn default() -> Self {
        FlagPolicy::AnyAxis
    }
}

impl FromStr for FlagPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "any-axis" => Ok(FlagPolicy::AnyAxis),
            "all-axes" => Ok(FlagPolicy::AllAxes),
            other => Err(Error::Configuration(format!(
                "unrecognized flag policy \"{other}\"; expected \"any-axis\" or \"all-axes\""
            ))),
        }
    }
}

impl fmt::Display for FlagPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(match *self {
            FlagPolicy::AnyAxis => "any-axis",
            FlagPolicy::AllAxes => "all-axes",
        })
    }
}

/// A mask of excluded visibilities; true means "do not use".
#[derive(Clone, Debug, PartialEq)]
pub enum FlagMask {
    PerChannel(Array2<bool>),
    PerRecord(Array1<bool>),
}

impl FlagMask {
    pub fn shape(&self) -> &[usize] {
        match self {
            FlagMask::PerChannel(a) => a.shape(),
            FlagMask::PerRecord(a) => a.shape(),
        }
    }

    pub fn n_records(&self) -> usize {
        match self {
            FlagMask::PerChannel(a) => a.ncols(),
            FlagMask::PerRecord(a) => a.len(),
        }
    }

    /// The number of excluded entries of the mask.
    pub fn n_excluded(&self) -> usize {
        match self {
            FlagMask::PerChannel(a) => a.iter().filter(|f| **f).count(),
            FlagMask::PerRecord(a) => a.iter().filter(|f| **f).count(),
        }
    }

    /// The indices of the records that are not excluded. Only a per-record
    /// mask can say this.
    pub fn kept_records(&self) -> Result<Vec<usize>> {
        match self {
            FlagMask::PerRecord(a) => Ok(a
                .iter()
                .enumerate()
                .filter_map(|(v, f)| if *f { None } else { Some(v) })
                .collect()),
            FlagMask::PerChannel(_) => Err(Error::Configuration(
                "records can only be dropped with a per-record flag mask".to_owned(),
            )),
        }
    }

    /// Keep only the records at the given indices, in that order.
    pub fn select_records(&self, records: &[usize]) -> Self {
        match self {
            FlagMask::PerChannel(a) => FlagMask::PerChannel(a.select(Axis(1), records)),
            FlagMask::PerRecord(a) => FlagMask::PerRecord(a.select(Axis(0), records)),
        }
    }

    /// Convert between the native and increasing frequency orders. Per-record
    /// masks have no channel axis and are unchanged.
    pub fn in_order(self, order: FrequencyOrder) -> Self {
        match self {
            FlagMask::PerChannel(a) => FlagMask::PerChannel(order.apply(&a)),
            m @ FlagMask::PerRecord(_) => m,
        }
    }
}

impl FlagPolicy {
    /// Compute the exclusion mask from raw `[npol, nchan, nvis]` flags and
    /// the antennas of each record.
    pub fn resolve(
        self,
        flag: &Array3<bool>,
        antenna1: &Array1<i32>,
        antenna2: &Array1<i32>,
    ) -> Result<FlagMask> {
        let (_npol, nchan, nvis) = flag.dim();

        if antenna1.len() != nvis || antenna2.len() != nvis {
            return Err(Error::Shape(format!(
                "FLAG has {} records but the antenna columns have {} and {}",
                nvis,
                antenna1.len(),
                antenna2.len()
            )));
        }

        match self {
            FlagPolicy::AnyAxis => Ok(FlagMask::PerChannel(Array2::from_shape_fn(
                (nchan, nvis),
                |(c, v)| {
                    antenna1[v] == antenna2[v]
                        || flag.index_axis(Axis(1), c).column(v).iter().any(|f| *f)
                },
            ))),

            FlagPolicy::AllAxes => {
                let mut mask = Array1::from_elem(nvis, false);

                for (v, record) in flag.axis_iter(Axis(2)).enumerate() {
                    let any = record.iter().any(|f| *f);
                    let all = record.iter().all(|f| *f);

                    if any != all {
                        return Err(Error::PolicyAmbiguity { record: v });
                    }

                    mask[v] = all || antenna1[v] == antenna2[v];
                }

                Ok(FlagMask::PerRecord(mask))
            }
        }
    }
}
