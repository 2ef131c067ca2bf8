// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

//! Mapping between Rust element types and the dataset's on-disk types.

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use num_complex::Complex;
use std::io::{self, Read, Write};
use uvport_core::io::EofReadExactExt;

use crate::{DatasetError, Type};

/// This trait marks that the given type maps onto an element type that can
/// be stored in an array item.
pub trait MappedType: Sized {
    /// The particular `Type` to which this Rust type maps.
    const TYPE: Type;

    /// Write one value to the stream in the on-disk encoding.
    fn write_value<W: Write>(&self, stream: &mut W) -> Result<(), io::Error>;

    /// Read one value from the stream. Returns `Ok(None)` if EOF was hit
    /// before any byte of the value was read.
    fn read_value<R: Read>(stream: &mut R) -> Result<Option<Self>, DatasetError>;
}

impl MappedType for bool {
    const TYPE: Type = Type::Bool;

    fn write_value<W: Write>(&self, stream: &mut W) -> Result<(), io::Error> {
        stream.write_u8(*self as u8)
    }

    fn read_value<R: Read>(stream: &mut R) -> Result<Option<Self>, DatasetError> {
        let mut buf = [0u8; 1];

        if !stream.eof_read_exact::<io::Error>(&mut buf)? {
            return Ok(None);
        }

        match buf[0] {
            0 => Ok(Some(false)),
            1 => Ok(Some(true)),
            b => Err(DatasetError::Generic(format!(
                "illegal boolean byte value {b}"
            ))),
        }
    }
}

impl MappedType for i32 {
    const TYPE: Type = Type::Int32;

    fn write_value<W: Write>(&self, stream: &mut W) -> Result<(), io::Error> {
        stream.write_i32::<BigEndian>(*self)
    }

    fn read_value<R: Read>(stream: &mut R) -> Result<Option<Self>, DatasetError> {
        Ok(stream.eof_read_be_i32::<io::Error>()?)
    }
}

impl MappedType for i64 {
    const TYPE: Type = Type::Int64;

    fn write_value<W: Write>(&self, stream: &mut W) -> Result<(), io::Error> {
        stream.write_i64::<BigEndian>(*self)
    }

    fn read_value<R: Read>(stream: &mut R) -> Result<Option<Self>, DatasetError> {
        Ok(stream.eof_read_be_i64::<io::Error>()?)
    }
}

impl MappedType for f64 {
    const TYPE: Type = Type::Float64;

    fn write_value<W: Write>(&self, stream: &mut W) -> Result<(), io::Error> {
        stream.write_f64::<BigEndian>(*self)
    }

    fn read_value<R: Read>(stream: &mut R) -> Result<Option<Self>, DatasetError> {
        Ok(stream.eof_read_be_f64::<io::Error>()?)
    }
}

impl MappedType for Complex<f64> {
    const TYPE: Type = Type::Complex128;

    fn write_value<W: Write>(&self, stream: &mut W) -> Result<(), io::Error> {
        stream.write_f64::<BigEndian>(self.re)?;
        stream.write_f64::<BigEndian>(self.im)
    }

    fn read_value<R: Read>(stream: &mut R) -> Result<Option<Self>, DatasetError> {
        Ok(stream.eof_read_be_c128::<io::Error>()?)
    }
}

/// A scalar attribute stored in a dataset's header.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Float64(f64),
    Text(String),
}

impl AttrValue {
    pub fn type_(&self) -> Type {
        match self {
            AttrValue::Float64(_) => Type::Float64,
            AttrValue::Text(_) => Type::Text,
        }
    }

    /// Get the text of this attribute, if it is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();

        match self {
            AttrValue::Float64(v) => {
                buf.resize(8, 0);
                BigEndian::write_f64(&mut buf, *v);
            }
            AttrValue::Text(s) => buf.extend_from_slice(s.as_bytes()),
        }

        buf
    }

    pub(crate) fn decode(ty: Type, buf: &[u8]) -> Result<Self, DatasetError> {
        match ty {
            Type::Float64 if buf.len() == 8 => Ok(AttrValue::Float64(BigEndian::read_f64(buf))),
            Type::Float64 => Err(DatasetError::Generic(format!(
                "expected 8 bytes for a {ty} attribute but found {}",
                buf.len()
            ))),
            Type::Text => Ok(AttrValue::Text(std::str::from_utf8(buf)?.to_owned())),
            other => Err(DatasetError::Generic(format!(
                "type {other} cannot be used for a header attribute"
            ))),
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AttrValue::Float64(v) => write!(f, "{v}"),
            AttrValue::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}
