// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*!
Bindings between uvport and concrete native visibility tables.

Two bindings are provided. [`CasaStore`] reads and writes CASA Measurement
Sets through casacore; it is only functional if this crate is built with the
`casa` feature. [`SnapshotStore`] keeps the same columns in a uvport dataset
directory and needs nothing beyond this workspace.

*/

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use uvport_visdata::{Error, Result, VisibilityStore};

pub mod casa;
pub mod snapshot;

pub use casa::CasaStore;
pub use snapshot::SnapshotStore;

/// The available native table bindings.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Binding {
    /// CASA Measurement Sets, through casacore.
    Casa,

    /// Snapshot tables stored as uvport datasets.
    Snapshot,
}

impl FromStr for Binding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "casa" => Ok(Binding::Casa),
            "snapshot" => Ok(Binding::Snapshot),
            other => Err(Error::Configuration(format!(
                "unrecognized table binding \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(match *self {
            Binding::Casa => "casa",
            Binding::Snapshot => "snapshot",
        })
    }
}

/// Open the table at `path` with the specified binding.
pub fn open_store<P: AsRef<Path>>(
    binding: Binding,
    path: P,
    writable: bool,
) -> Result<Box<dyn VisibilityStore>> {
    Ok(match binding {
        Binding::Casa => Box::new(CasaStore::open(path, writable)?),
        Binding::Snapshot => Box::new(SnapshotStore::open(path)?),
    })
}

/// Recursively copy the table directory `src` to `dest`, first deleting
/// anything already at `dest`.
///
/// `dest` may not be `src` or lie inside it.
pub fn copy_table_tree<P1: AsRef<Path>, P2: AsRef<Path>>(src: P1, dest: P2) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    if !src.is_dir() {
        return Err(Error::Table {
            path: src.display().to_string(),
            message: "not a directory".to_owned(),
        });
    }

    let src_abs = fs::canonicalize(src)?;

    let dest_abs = match (dest.parent(), dest.file_name()) {
        (Some(p), Some(name)) if !p.as_os_str().is_empty() => fs::canonicalize(p)?.join(name),
        (_, Some(name)) => std::env::current_dir()?.join(name),
        (_, None) => {
            return Err(Error::Configuration(format!(
                "cannot copy a table to \"{}\"",
                dest.display()
            )));
        }
    };

    if dest_abs.starts_with(&src_abs) {
        return Err(Error::Configuration(format!(
            "cannot copy table \"{}\" to \"{}\", which is the same or inside it",
            src.display(),
            dest.display()
        )));
    }

    if src_abs.starts_with(&dest_abs) {
        return Err(Error::Configuration(format!(
            "cannot copy table \"{}\" to \"{}\", which contains it",
            src.display(),
            dest.display()
        )));
    }

    match fs::symlink_metadata(dest) {
        Ok(md) if md.is_dir() => fs::remove_dir_all(dest)?,
        Ok(_) => fs::remove_file(dest)?,
        Err(ref e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    copy_dir(src, dest)
}

fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir(dest)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let target = dest.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else if file_type.is_symlink() {
            std::os::unix::fs::symlink(fs::read_link(entry.path())?, &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}
