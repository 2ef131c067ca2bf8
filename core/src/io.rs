// Copyright 2017-2024 Peter Williams <peter@newton.cx> and collaborators
// Licensed under the MIT License.

/*!

Basic I/O helpers.

The dataset header is a stream of records that are padded out to fixed
alignments, so readers and writers of it need to know how far into the
stream they are. The wrappers here keep that count.

 */

use byteorder::{BigEndian, ByteOrder};
use num_complex::Complex;
use std::io::{self, Read, Result, Write};
use std::result;

/// The largest alignment that the aligning wrappers support.
pub const MAX_ALIGNMENT: usize = 64;

/// The number of padding bytes needed to advance `offset` to the next
/// multiple of `alignment`.
pub fn padding_for(offset: u64, alignment: usize) -> usize {
    match (offset % alignment as u64) as usize {
        0 => 0,
        excess => alignment - excess,
    }
}

fn check_alignment(alignment: usize) -> Result<()> {
    if alignment == 0 || alignment > MAX_ALIGNMENT {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("alignments must be between 1 and {MAX_ALIGNMENT} bytes; got {alignment}"),
        ));
    }

    Ok(())
}

/// A `Read` wrapper that counts how many bytes have passed through it, so
/// that the stream can be skipped forward to an aligned offset.
///
/// The offset is counted from the creation of the wrapper, not from the start
/// of the underlying file.
#[derive(Debug)]
pub struct AligningReader<R: Read> {
    inner: R,
    offset: u64,
}

impl<R: Read> AligningReader<R> {
    pub fn new(inner: R) -> Self {
        AligningReader { inner, offset: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// How many bytes have been read since this wrapper was created.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read and discard bytes until the offset is a multiple of `alignment`.
    ///
    /// Returns whether the stream was already aligned. Hitting EOF right at
    /// the current position is not an error, since the padding of the final
    /// record of a stream may be omitted.
    pub fn align_to(&mut self, alignment: usize) -> Result<bool> {
        check_alignment(alignment)?;
        let amount = padding_for(self.offset, alignment);

        if amount == 0 {
            return Ok(true);
        }

        let mut buf = [0u8; MAX_ALIGNMENT];

        if self.inner.eof_read_exact::<io::Error>(&mut buf[..amount])? {
            self.offset += amount as u64;
        }

        Ok(false)
    }
}

impl<R: Read> Read for AligningReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.offset += n as u64;
        Ok(n)
    }
}

/// The `Write` counterpart of [`AligningReader`]: padding is written as zero
/// bytes.
#[derive(Debug)]
pub struct AligningWriter<W: Write> {
    inner: W,
    offset: u64,
}

impl<W: Write> AligningWriter<W> {
    pub fn new(inner: W) -> Self {
        AligningWriter { inner, offset: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// How many bytes have been written since this wrapper was created.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Write zero bytes until the offset is a multiple of `alignment`.
    ///
    /// Returns whether the stream was already aligned.
    pub fn align_to(&mut self, alignment: usize) -> Result<bool> {
        check_alignment(alignment)?;
        let amount = padding_for(self.offset, alignment);

        if amount == 0 {
            return Ok(true);
        }

        self.write_all(&[0u8; MAX_ALIGNMENT][..amount])?;
        Ok(false)
    }
}

impl<W: Write> Write for AligningWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Extend `Read` with fixed-size reads that tell a clean end of stream apart
/// from a truncated value.
///
/// Each `eof_read_*` method returns `Ok(None)` (or `Ok(false)`) if the stream
/// ends before the first byte of the value, and an `UnexpectedEof` error if
/// it ends partway through.
pub trait EofReadExactExt: Read {
    /// Fill `buf` completely, or report a clean EOF with `Ok(false)`.
    fn eof_read_exact<E>(&mut self, buf: &mut [u8]) -> result::Result<bool, E>
    where
        E: From<io::Error>;

    /// Read a fixed-size chunk and decode it with `decode`.
    fn eof_read_with<T, E, F, const N: usize>(
        &mut self,
        decode: F,
    ) -> result::Result<Option<T>, E>
    where
        E: From<io::Error>,
        F: FnOnce(&[u8; N]) -> T,
    {
        let mut buf = [0u8; N];

        Ok(if self.eof_read_exact::<E>(&mut buf)? {
            Some(decode(&buf))
        } else {
            None
        })
    }

    fn eof_read_be_i32<E: From<io::Error>>(&mut self) -> result::Result<Option<i32>, E> {
        self.eof_read_with(|b: &[u8; 4]| BigEndian::read_i32(b))
    }

    fn eof_read_be_i64<E: From<io::Error>>(&mut self) -> result::Result<Option<i64>, E> {
        self.eof_read_with(|b: &[u8; 8]| BigEndian::read_i64(b))
    }

    fn eof_read_be_f64<E: From<io::Error>>(&mut self) -> result::Result<Option<f64>, E> {
        self.eof_read_with(|b: &[u8; 8]| BigEndian::read_f64(b))
    }

    /// A complex value is stored as its real part followed by its imaginary
    /// part.
    fn eof_read_be_c128<E>(&mut self) -> result::Result<Option<Complex<f64>>, E>
    where
        E: From<io::Error>,
    {
        self.eof_read_with(|b: &[u8; 16]| {
            Complex::new(BigEndian::read_f64(&b[..8]), BigEndian::read_f64(&b[8..]))
        })
    }
}

impl<R: Read> EofReadExactExt for R {
    fn eof_read_exact<E>(&mut self, buf: &mut [u8]) -> result::Result<bool, E>
    where
        E: From<io::Error>,
    {
        let mut filled = 0;

        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(false),
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "stream ended partway through a value",
                    )
                    .into())
                }
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    #[test]
    fn padding() {
        assert_eq!(padding_for(0, 16), 0);
        assert_eq!(padding_for(3, 8), 5);
        assert_eq!(padding_for(16, 16), 0);
        assert_eq!(padding_for(17, 4), 3);
    }

    #[test]
    fn alignment() {
        let mut w = AligningWriter::new(Vec::new());
        w.write_all(&[1, 2, 3]).unwrap();
        assert!(!w.align_to(8).unwrap());
        assert_eq!(w.offset(), 8);
        assert!(w.align_to(8).unwrap());
        assert!(w.align_to(65).is_err());

        let buf = w.into_inner();
        assert_eq!(&buf[..], &[1, 2, 3, 0, 0, 0, 0, 0]);

        let mut r = AligningReader::new(Cursor::new(buf));
        let mut three = [0u8; 3];
        r.read_exact(&mut three).unwrap();
        assert!(!r.align_to(8).unwrap());
        assert_eq!(r.offset(), 8);
    }

    #[test]
    fn eof_reads() {
        let mut buf = Vec::new();
        buf.write_f64::<BigEndian>(1.5).unwrap();
        buf.write_f64::<BigEndian>(-2.0).unwrap();
        buf.write_f64::<BigEndian>(0.25).unwrap();
        buf.write_i32::<BigEndian>(-7).unwrap();

        let mut r = Cursor::new(buf);
        let c = r.eof_read_be_c128::<io::Error>().unwrap();
        assert_eq!(c, Some(Complex::new(1.5, -2.0)));
        assert_eq!(r.eof_read_be_f64::<io::Error>().unwrap(), Some(0.25));
        assert_eq!(r.eof_read_be_i32::<io::Error>().unwrap(), Some(-7));
        assert_eq!(r.eof_read_be_i64::<io::Error>().unwrap(), None);
    }

    #[test]
    fn truncated_read_is_an_error() {
        let mut r = Cursor::new(vec![0u8; 5]);
        let e = r.eof_read_be_f64::<io::Error>().unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
    }
}
