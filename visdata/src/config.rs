// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Settings for a conversion run.

use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, Result};
use crate::flags::FlagPolicy;
use crate::validate::Tolerance;

/// The instrument name recorded in interchange datasets by default.
pub const DEFAULT_TELESCOPE: &str = "ALMA";

/// The interchange format version written by this crate.
pub const FORMAT_VERSION: &str = "v0.1";

/// Which records an interchange dataset carries, and so which records of the
/// table an import overwrites.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SubstitutionMode {
    /// Every record is exported, excluded ones included, and an import
    /// overwrites the whole data column.
    MaskInPlace,

    /// Excluded records are left out of the export, and an import writes only
    /// the records that were kept. Requires the all-axes flag policy.
    DropFlagged,
}

impl Default for SubstitutionMode {
    fn default() -> Self {
        SubstitutionMode::MaskInPlace
    }
}

impl FromStr for SubstitutionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mask-in-place" => Ok(SubstitutionMode::MaskInPlace),
            "drop-flagged" => Ok(SubstitutionMode::DropFlagged),
            other => Err(Error::Configuration(format!(
                "unrecognized substitution mode \"{other}\"; expected \"mask-in-place\" or \"drop-flagged\""
            ))),
        }
    }
}

impl fmt::Display for SubstitutionMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(match *self {
            SubstitutionMode::MaskInPlace => "mask-in-place",
            SubstitutionMode::DropFlagged => "drop-flagged",
        })
    }
}

/// Settings shared by the export and import directions.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionConfig {
    /// How raw flags are collapsed. An import must use the same policy as
    /// the export that produced its model.
    pub flag_policy: FlagPolicy,

    /// Must also match between an export and its import.
    pub substitution: SubstitutionMode,

    /// Tolerance for the round-trip geometry checks made on import.
    pub tolerance: Tolerance,

    /// Written to the `TELESCOP` attribute on export.
    pub telescope: String,

    /// Written to the `FMT_Version` attribute on export.
    pub format_version: String,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            flag_policy: FlagPolicy::default(),
            substitution: SubstitutionMode::default(),
            tolerance: Tolerance::default(),
            telescope: DEFAULT_TELESCOPE.to_owned(),
            format_version: FORMAT_VERSION.to_owned(),
        }
    }
}

impl ConversionConfig {
    /// Reject combinations of settings that cannot work together.
    ///
    /// Dropping records needs a per-record mask, which only the all-axes
    /// policy produces.
    pub fn check(&self) -> Result<()> {
        if self.substitution == SubstitutionMode::DropFlagged
            && self.flag_policy != FlagPolicy::AllAxes
        {
            return Err(Error::Configuration(format!(
                "the {} substitution mode requires the {} flag policy, not {}",
                self.substitution,
                FlagPolicy::AllAxes,
                self.flag_policy
            )));
        }

        Ok(())
    }
}
