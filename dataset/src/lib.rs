// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Access to uvport interchange datasets.
//!
//! A dataset is a directory. Each array lives in its own "item" file, which
//! begins with a big-endian type code, the number of dimensions, and the
//! extent of each dimension, followed by the row-major element data. Scalar
//! attributes are collected in a file named `header` as a sequence of
//! 16-byte-aligned records: a 15-byte name, a 1-byte record length, a type
//! code, and the (aligned) payload.

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use ndarray::{Array, ArrayBase, Data, Dimension};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::Path;
use thiserror::Error;
use uvport_core::io::{padding_for, AligningReader, AligningWriter, EofReadExactExt};
use uvport_core::num::{array_from_shape_vec, n_elements, DimFromShapeSlice};
use uvport_core::CoreError;

mod mapped;

pub use mapped::{AttrValue, MappedType};

/// The maximum length of the name of a dataset "item", in bytes.
pub const MAX_ITEM_NAME_LENGTH: usize = 15;

/// The maximum size of the payload of a header attribute, in bytes.
pub const MAX_ATTR_SIZE: usize = 64;

const HEADER_NAME: &str = "header";

#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Type {
    Bool = 1,
    Int32 = 2,
    Int64 = 3,
    Float64 = 5,
    Text = 6,
    Complex128 = 7,
}

/// An error type for when a dataset is malformed or misused.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("{0}")]
    Generic(String),

    #[error("no item named \"{0}\" in the dataset")]
    NoSuchItem(String),

    #[error("expected item \"{name}\" to have type {expected}, but found {actual}")]
    TypeMismatch {
        name: String,
        expected: Type,
        actual: Type,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl Type {
    pub fn try_from_i32(type_code: i32) -> Result<Self, DatasetError> {
        match type_code {
            1 => Ok(Type::Bool),
            2 => Ok(Type::Int32),
            3 => Ok(Type::Int64),
            5 => Ok(Type::Float64),
            6 => Ok(Type::Text),
            7 => Ok(Type::Complex128),
            _ => Err(DatasetError::Generic(format!(
                "illegal dataset type code {type_code}"
            ))),
        }
    }

    pub fn size(&self) -> usize {
        match *self {
            Type::Bool => 1,
            Type::Int32 => 4,
            Type::Int64 => 8,
            Type::Float64 => 8,
            Type::Text => 1,
            Type::Complex128 => 16,
        }
    }

    /// The alignment of payloads of this type in the header. Complex values
    /// only need the alignment of their components.
    pub fn alignment(&self) -> usize {
        match *self {
            Type::Complex128 => 8,
            ty => std::cmp::max(4, ty.size()),
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.pad(match *self {
            Type::Bool => "bool",
            Type::Int32 => "int32",
            Type::Int64 => "int64",
            Type::Float64 => "float64",
            Type::Text => "text",
            Type::Complex128 => "complex128",
        })
    }
}

fn validate_item_name(name: &str) -> Result<(), DatasetError> {
    if name == HEADER_NAME {
        return Err(DatasetError::Generic(format!(
            "cannot create an item named \"{HEADER_NAME}\""
        )));
    }

    let name_bytes = name.as_bytes();

    if name_bytes.is_empty() || name_bytes.len() > MAX_ITEM_NAME_LENGTH {
        return Err(DatasetError::Generic(format!(
            "item names must be between 1 and {MAX_ITEM_NAME_LENGTH} bytes long; got \"{name}\""
        )));
    }

    if !name_bytes.is_ascii() || name.starts_with('.') || name.contains('/') {
        return Err(DatasetError::Generic(format!(
            "illegal item name \"{name}\""
        )));
    }

    Ok(())
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum ItemStorage {
    /// A header attribute, with its encoded payload.
    Small(Vec<u8>),

    /// An array item file, with its shape.
    Large(Vec<u64>),
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct InternalItemInfo {
    pub ty: Type,
    pub storage: ItemStorage,
}

impl InternalItemInfo {
    pub fn new_small(ty: Type, data: Vec<u8>) -> Self {
        InternalItemInfo {
            ty,
            storage: ItemStorage::Small(data),
        }
    }

    pub fn new_large(dir: &openat::Dir, name: &str) -> Result<Self, DatasetError> {
        let f = dir.open_file(name)?;
        let file_size = f.metadata()?.len();
        let mut stream = io::BufReader::new(f);

        let ty = Type::try_from_i32(stream.read_i32::<BigEndian>()?)?;
        let n_dim = stream.read_i32::<BigEndian>()?;

        if !(0..=8).contains(&n_dim) {
            return Err(DatasetError::Generic(format!(
                "illegal dimensionality {n_dim} for item {name}"
            )));
        }

        let mut shape = Vec::with_capacity(n_dim as usize);

        for _ in 0..n_dim {
            let d = stream.read_i64::<BigEndian>()?;

            if d < 0 {
                return Err(DatasetError::Generic(format!(
                    "negative array extent in item {name}"
                )));
            }

            shape.push(d as u64);
        }

        let preamble_size = 8 + 8 * n_dim as u64;
        let expected = (n_elements(&shape) * ty.size()) as u64;

        if file_size.saturating_sub(preamble_size) != expected {
            return Err(DatasetError::Generic(format!(
                "item {name} should hold {expected} data bytes but holds {}",
                file_size.saturating_sub(preamble_size)
            )));
        }

        Ok(InternalItemInfo {
            ty,
            storage: ItemStorage::Large(shape),
        })
    }
}

pub type ReadStream = AligningReader<io::BufReader<fs::File>>;
pub type WriteStream = AligningWriter<io::BufWriter<fs::File>>;

/// A handle to one item of a dataset.
#[derive(Debug)]
pub struct Item<'a> {
    dset: &'a DataSet,
    name: &'a str,
    info: &'a InternalItemInfo,
}

impl Item<'_> {
    /// The shape of this item, if it is an array.
    pub fn shape(&self) -> Option<&[u64]> {
        match self.info.storage {
            ItemStorage::Small(_) => None,
            ItemStorage::Large(ref shape) => Some(&shape[..]),
        }
    }

    /// Read this item as an array of the given element type and
    /// dimensionality.
    pub fn read_array<T, D>(&self) -> Result<Array<T, D>, DatasetError>
    where
        T: MappedType,
        D: Dimension + DimFromShapeSlice<u64>,
    {
        if T::TYPE != self.info.ty {
            return Err(DatasetError::TypeMismatch {
                name: self.name.to_owned(),
                expected: T::TYPE,
                actual: self.info.ty,
            });
        }

        let shape = match self.info.storage {
            ItemStorage::Large(ref shape) => shape,
            ItemStorage::Small(_) => {
                return Err(DatasetError::Generic(format!(
                    "item {} is an attribute, not an array",
                    self.name
                )));
            }
        };

        // Check the dimensionality before reading any data.
        D::from_shape_slice(shape)?;

        let mut stream = self.dset.open_item_stream(self.name)?;
        let n = n_elements(shape);
        let mut values = Vec::with_capacity(n);

        while let Some(v) = T::read_value(&mut stream)? {
            values.push(v);
        }

        Ok(array_from_shape_vec(shape, values)?)
    }
}

/// A directory-backed interchange dataset.
///
/// Pending changes to the header are written when the dataset is flushed or
/// dropped; array items are written immediately.
#[derive(Debug)]
pub struct DataSet {
    dir: openat::Dir,
    items: HashMap<String, InternalItemInfo>,
    large_items_scanned: bool,
    needs_flush: bool,
}

impl DataSet {
    /// Open an existing dataset.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let mut ds = DataSet {
            dir: openat::Dir::open(path.as_ref())?,
            items: HashMap::new(),
            large_items_scanned: false,
            needs_flush: false,
        };

        // Parse the header

        let mut header =
            AligningReader::new(io::BufReader::new(ds.dir.open_file(HEADER_NAME)?));
        let mut buf = [0u8; 16];

        loop {
            if !header.eof_read_exact::<std::io::Error>(&mut buf)? {
                break; // no more data
            }

            // First 15 bytes are the attribute name, NUL-padded; the last
            // byte is the "aligned length" of the rest of the record.

            let mut name_len = 0;

            while name_len < 15 && buf[name_len] != 0 {
                name_len += 1;
            }

            let aligned_len = buf[15] as usize;
            let name = std::str::from_utf8(&buf[..name_len])?;

            if aligned_len < 4 {
                return Err(DatasetError::Generic(format!(
                    "header record for {name} is too short"
                )));
            }

            let ty = Type::try_from_i32(header.read_i32::<BigEndian>()?)?;
            let align = ty.alignment();
            let n_padding = padding_for(header.offset(), align);
            header.align_to(align)?;

            if aligned_len < 4 + n_padding {
                return Err(DatasetError::Generic(format!(
                    "header record for {name} is too short"
                )));
            }

            let mut data = vec![0; aligned_len - 4 - n_padding];
            header.read_exact(&mut data[..])?;

            ds.items
                .insert(name.to_owned(), InternalItemInfo::new_small(ty, data));
            header.align_to(16)?;
        }

        Ok(ds)
    }

    /// Create a new dataset at the given path.
    ///
    /// If the directory already exists, it must be a dataset (i.e., contain
    /// a header file); all of its existing items are deleted. Other existing
    /// directories are not touched and an error is returned.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();

        if path.exists() {
            if !path.join(HEADER_NAME).is_file() {
                return Err(DatasetError::Generic(format!(
                    "refusing to overwrite \"{}\": it exists but is not a dataset",
                    path.display()
                )));
            }
        } else {
            fs::create_dir_all(path)?;
        }

        let dir = openat::Dir::open(path)?;

        for maybe_entry in dir.list_dir(".")? {
            let entry = maybe_entry?;

            if let Some(s) = entry.file_name().to_str() {
                if s.starts_with('.') {
                    continue;
                }

                dir.remove_file(s)?;
            }
        }

        let mut ds = DataSet {
            dir,
            items: HashMap::new(),
            large_items_scanned: true,
            needs_flush: true,
        };

        ds.flush()?;
        Ok(ds)
    }

    fn scan_large_items(&mut self) -> Result<(), DatasetError> {
        for maybe_item in self.dir.list_dir(".")? {
            let item = maybe_item?;

            if let Some(s) = item.file_name().to_str() {
                if s == HEADER_NAME || s.starts_with('.') {
                    continue;
                }

                let iii = InternalItemInfo::new_large(&self.dir, s)?;
                self.items.insert(s.to_owned(), iii);
            }
        }

        self.large_items_scanned = true;
        Ok(())
    }

    fn open_item_stream(&self, name: &str) -> Result<ReadStream, DatasetError> {
        let f = self.dir.open_file(name)?;
        let mut stream = AligningReader::new(io::BufReader::new(f));

        // Skip the type code, dimensionality, and shape.
        stream.read_i32::<BigEndian>()?;
        let n_dim = stream.read_i32::<BigEndian>()?;

        for _ in 0..n_dim {
            stream.read_i64::<BigEndian>()?;
        }

        Ok(stream)
    }

    /// Get the names of all of the items in this dataset, sorted.
    pub fn item_names(&mut self) -> Result<Vec<String>, DatasetError> {
        if !self.large_items_scanned {
            self.scan_large_items()?;
        }

        let mut names: Vec<String> = self.items.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Get a handle to an item in this data set.
    ///
    /// The reference to *item_name* needs to have a lifetime compatible with
    /// the reference to the dataset itself.
    pub fn get<'a>(&'a mut self, item_name: &'a str) -> Result<Option<Item<'a>>, DatasetError> {
        if !self.items.contains_key(item_name) {
            // Assume it's an as-yet-unprobed array item on the filesystem.
            let iii = match InternalItemInfo::new_large(&self.dir, item_name) {
                Ok(iii) => iii,
                Err(DatasetError::IO(ioe)) => {
                    if ioe.kind() == io::ErrorKind::NotFound {
                        // No such item. Don't bother to cache negative results.
                        return Ok(None);
                    }
                    return Err(ioe.into());
                }
                Err(e) => return Err(e),
            };
            self.items.insert(item_name.to_owned(), iii);
        }

        match self.items.get(item_name) {
            Some(info) => Ok(Some(Item {
                dset: self,
                name: item_name,
                info,
            })),
            None => Ok(None),
        }
    }

    /// Whether the dataset contains an item with the given name.
    pub fn contains(&mut self, item_name: &str) -> Result<bool, DatasetError> {
        Ok(self.get(item_name)?.is_some())
    }

    /// Read an array item, requiring that it exist.
    pub fn read_array<T, D>(&mut self, item_name: &str) -> Result<Array<T, D>, DatasetError>
    where
        T: MappedType,
        D: Dimension + DimFromShapeSlice<u64>,
    {
        match self.get(item_name)? {
            Some(item) => item.read_array(),
            None => Err(DatasetError::NoSuchItem(item_name.to_owned())),
        }
    }

    /// Get the shape of an array item, requiring that it exist.
    pub fn shape_of(&mut self, item_name: &str) -> Result<Vec<u64>, DatasetError> {
        match self.get(item_name)? {
            Some(item) => match item.shape() {
                Some(shape) => Ok(shape.to_owned()),
                None => Err(DatasetError::Generic(format!(
                    "item {item_name} is an attribute, not an array"
                ))),
            },
            None => Err(DatasetError::NoSuchItem(item_name.to_owned())),
        }
    }

    /// Write an array item, replacing any existing item of the same name.
    pub fn write_array<T, S, D>(
        &mut self,
        name: &str,
        array: &ArrayBase<S, D>,
    ) -> Result<(), DatasetError>
    where
        T: MappedType,
        S: Data<Elem = T>,
        D: Dimension,
    {
        validate_item_name(name)?;

        if let Some(InternalItemInfo {
            storage: ItemStorage::Small(_),
            ..
        }) = self.items.get(name)
        {
            return Err(DatasetError::Generic(format!(
                "cannot write array \"{name}\"; would mask an existing attribute"
            )));
        }

        let mut stream = AligningWriter::new(io::BufWriter::new(self.dir.write_file(name, 0o666)?));
        let shape: Vec<u64> = array.shape().iter().map(|d| *d as u64).collect();

        stream.write_i32::<BigEndian>(T::TYPE as i32)?;
        stream.write_i32::<BigEndian>(shape.len() as i32)?;

        for d in &shape {
            stream.write_i64::<BigEndian>(*d as i64)?;
        }

        // `iter` visits elements in logical row-major order regardless of
        // the memory layout of the array.
        for v in array.iter() {
            v.write_value(&mut stream)?;
        }

        stream.flush()?;

        self.items.insert(
            name.to_owned(),
            InternalItemInfo {
                ty: T::TYPE,
                storage: ItemStorage::Large(shape),
            },
        );

        Ok(())
    }

    /// Delete an item. Returns whether the item existed.
    pub fn remove_item(&mut self, name: &str) -> Result<bool, DatasetError> {
        let existed = self.get(name)?.is_some();

        if let Some(iii) = self.items.remove(name) {
            match iii.storage {
                ItemStorage::Small(_) => self.needs_flush = true,
                ItemStorage::Large(_) => self.dir.remove_file(name)?,
            }
        }

        Ok(existed)
    }

    /// Set a scalar header attribute.
    pub fn set_attr<V: Into<AttrValue>>(&mut self, name: &str, value: V) -> Result<(), DatasetError> {
        // Need to do this to ensure that we don't get an attribute that
        // masks an array item.
        if !self.large_items_scanned {
            self.scan_large_items()?;
        }

        validate_item_name(name)?;
        let value = value.into();
        let data = value.encode();

        if data.len() > MAX_ATTR_SIZE {
            return Err(DatasetError::Generic(format!(
                "value of \"{name}\" is too large to be stored as a header attribute"
            )));
        }

        if let Some(InternalItemInfo {
            storage: ItemStorage::Large(_),
            ..
        }) = self.items.get(name)
        {
            return Err(DatasetError::Generic(format!(
                "cannot set \"{name}\" as an attribute; would mask an existing array"
            )));
        }

        self.items.insert(
            name.to_owned(),
            InternalItemInfo::new_small(value.type_(), data),
        );
        self.needs_flush = true;
        Ok(())
    }

    /// Get a scalar header attribute, if it exists.
    pub fn attr(&self, name: &str) -> Result<Option<AttrValue>, DatasetError> {
        match self.items.get(name) {
            Some(InternalItemInfo {
                ty,
                storage: ItemStorage::Small(ref data),
            }) => Ok(Some(AttrValue::decode(*ty, data)?)),
            _ => Ok(None),
        }
    }

    /// Flush any pending changes to the overall dataset. In particular, this
    /// means that the "header" file is rewritten.
    pub fn flush(&mut self) -> Result<(), DatasetError> {
        if !self.needs_flush {
            return Ok(());
        }

        let mut stream =
            AligningWriter::new(io::BufWriter::new(self.dir.write_file(HEADER_NAME, 0o666)?));

        let mut names: Vec<&String> = self.items.keys().collect();
        names.sort();

        for name in names {
            let item = &self.items[name];

            if let ItemStorage::Small(ref data) = item.storage {
                let mut buf = [0u8; 16];
                stream.align_to(16)?;

                let name_bytes = name.as_bytes();
                buf[..name_bytes.len()].copy_from_slice(name_bytes);

                let alignment = item.ty.alignment();
                let n_alignment_bytes = padding_for(stream.offset() + 16 + 4, alignment);

                buf[15] = (4 + n_alignment_bytes + data.len()) as u8;
                stream.write_all(&buf)?;
                stream.write_i32::<BigEndian>(item.ty as u8 as i32)?;
                stream.align_to(alignment)?;
                stream.write_all(data)?;
            }
        }

        stream.flush()?;
        self.needs_flush = false;
        Ok(())
    }
}

impl Drop for DataSet {
    fn drop(&mut self) {
        // cf: https://github.com/rust-lang/rust/issues/32677
        let _r = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2, Array3, Ix1, Ix2};
    use num_complex::Complex;

    #[test]
    fn arrays_and_attrs_survive_reopening() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vis.uvx");

        let freqs = array![1.0e11, 1.1e11, 1.2e11];
        let flags = array![[true, false], [false, false], [false, true]];
        let data = Array3::from_shape_fn((2, 3, 2), |(p, c, v)| {
            Complex::new(p as f64, (c * 10 + v) as f64)
        });

        {
            let mut ds = DataSet::create(&path).unwrap();
            ds.write_array("freqs", &freqs).unwrap();
            ds.write_array("flag", &flags).unwrap();
            ds.write_array("DATA", &data).unwrap();
            ds.set_attr("TELESCOP", "ALMA").unwrap();
            ds.set_attr("FMT_Version", "v0.1").unwrap();
            ds.set_attr("REF_FREQUENCY", AttrValue::Float64(1.1e11)).unwrap();
        }

        let mut ds = DataSet::open(&path).unwrap();
        assert_eq!(ds.attr("TELESCOP").unwrap(), Some(AttrValue::from("ALMA")));
        assert_eq!(ds.attr("FMT_Version").unwrap(), Some(AttrValue::from("v0.1")));
        assert_eq!(
            ds.attr("REF_FREQUENCY").unwrap(),
            Some(AttrValue::Float64(1.1e11))
        );
        assert_eq!(ds.attr("OBJECT").unwrap(), None);

        let f: Array1<f64> = ds.read_array("freqs").unwrap();
        assert_eq!(f, freqs);
        let fl: Array2<bool> = ds.read_array("flag").unwrap();
        assert_eq!(fl, flags);
        let d: Array3<Complex<f64>> = ds.read_array("DATA").unwrap();
        assert_eq!(d, data);

        assert_eq!(ds.shape_of("flag").unwrap(), vec![3, 2]);
        assert_eq!(
            ds.item_names().unwrap(),
            vec!["DATA", "FMT_Version", "REF_FREQUENCY", "TELESCOP", "flag", "freqs"]
        );
    }

    #[test]
    fn only_text_and_float_attributes_decode() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ds = DataSet::create(tmp.path().join("t")).unwrap();
        ds.items.insert(
            "NCHAN".to_owned(),
            InternalItemInfo::new_small(Type::Int32, vec![0, 0, 0, 4]),
        );
        ds.items.insert(
            "SHORT".to_owned(),
            InternalItemInfo::new_small(Type::Float64, vec![0; 4]),
        );

        assert!(ds.attr("NCHAN").is_err());
        assert!(ds.attr("SHORT").is_err());
    }

    #[test]
    fn non_contiguous_views_are_written_in_logical_order() {
        let tmp = tempfile::tempdir().unwrap();
        let a = array![[1.0, 2.0], [3.0, 4.0]];

        let mut ds = DataSet::create(tmp.path().join("t")).unwrap();
        ds.write_array("at", &a.t()).unwrap();
        let back: Array2<f64> = ds.read_array("at").unwrap();
        assert_eq!(back, array![[1.0, 3.0], [2.0, 4.0]]);
    }

    #[test]
    fn type_and_dimension_checks() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ds = DataSet::create(tmp.path().join("t")).unwrap();
        ds.write_array("uu", &Array2::<f64>::zeros((2, 5))).unwrap();

        match ds.read_array::<bool, Ix2>("uu") {
            Err(DatasetError::TypeMismatch {
                expected: Type::Bool,
                actual: Type::Float64,
                ..
            }) => {}
            other => panic!("unexpected result {:?}", other),
        }

        match ds.read_array::<f64, Ix1>("uu") {
            Err(DatasetError::Core(CoreError::DimensionMismatch(1, 2))) => {}
            other => panic!("unexpected result {:?}", other),
        }

        assert!(matches!(
            ds.read_array::<f64, Ix1>("vv"),
            Err(DatasetError::NoSuchItem(_))
        ));
    }

    #[test]
    fn item_names_are_validated() {
        let tmp = tempfile::tempdir().unwrap();
        let mut ds = DataSet::create(tmp.path().join("t")).unwrap();
        let a = array![1.0];

        assert!(ds.write_array("header", &a).is_err());
        assert!(ds.write_array("", &a).is_err());
        assert!(ds.write_array("a_name_that_is_too_long", &a).is_err());
        assert!(ds.write_array("../escape", &a).is_err());
        assert!(ds.write_array("CORRECTED_DATA", &a).is_ok());
    }

    #[test]
    fn create_clears_stale_items_but_refuses_foreign_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("t");

        {
            let mut ds = DataSet::create(&path).unwrap();
            ds.write_array("stale", &array![1i32, 2]).unwrap();
        }

        let mut ds = DataSet::create(&path).unwrap();
        assert!(!ds.contains("stale").unwrap());

        let foreign = tmp.path().join("foreign");
        fs::create_dir(&foreign).unwrap();
        fs::write(foreign.join("precious.txt"), b"keep me").unwrap();
        assert!(DataSet::create(&foreign).is_err());
        assert!(foreign.join("precious.txt").exists());
    }

    #[test]
    fn remove_items() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("t");

        {
            let mut ds = DataSet::create(&path).unwrap();
            ds.write_array("CORRECTED_DATA", &array![1i64]).unwrap();
            ds.set_attr("TELESCOP", "VLA").unwrap();
            assert!(ds.remove_item("CORRECTED_DATA").unwrap());
            assert!(ds.remove_item("TELESCOP").unwrap());
            assert!(!ds.remove_item("CORRECTED_DATA").unwrap());
        }

        let mut ds = DataSet::open(&path).unwrap();
        assert!(ds.item_names().unwrap().is_empty());
    }
}
