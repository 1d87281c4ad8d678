//! Sequential, bounds-checked decoding of binary value encodings.

use widestring::{U16CStr, U16Str};

use super::{read_at, ByteIO, ByteOrder};
use crate::{ErrorCode, Result};

/// A cursor over a byte slice that decodes primitives in a fixed [`ByteOrder`].
///
/// Every read is bounds-checked; a failed read leaves the position unchanged.
///
/// # Examples
///
/// ```rust
/// use metabind::io::{ByteOrder, Parser};
///
/// let data = [0x00, 0x2A, 0x00, 0x00, 0x00, 0x07];
/// let mut parser = Parser::new(&data, ByteOrder::Big);
///
/// assert_eq!(parser.read::<u16>()?, 42);
/// assert_eq!(parser.read::<u32>()?, 7);
/// assert_eq!(parser.remaining(), 0);
/// # Ok::<(), metabind::Error>(())
/// ```
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
    order: ByteOrder,
}

impl<'a> Parser<'a> {
    /// Create a new parser over `data`.
    #[must_use]
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Parser {
            data,
            position: 0,
            order,
        }
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Read a `T` in the parser's byte order and advance past it.
    ///
    /// # Errors
    /// Returns [`crate::Error::Parse`] if fewer than `size_of::<T>()` bytes remain.
    pub fn read<T: ByteIO>(&mut self) -> Result<T> {
        read_at::<T>(self.data, &mut self.position, self.order)
    }

    /// Read `length` raw bytes and advance past them.
    ///
    /// # Errors
    /// Returns [`crate::Error::Parse`] if fewer than `length` bytes remain.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'a [u8]> {
        if length > self.remaining() {
            return Err(parse_error!(
                code: ErrorCode::OffsetOutOfRange,
                "Reading {} bytes at {} exceeds {} bytes",
                length,
                self.position,
                self.data.len()
            ));
        }

        let bytes = &self.data[self.position..self.position + length];
        self.position += length;
        Ok(bytes)
    }

    /// Read all remaining bytes.
    pub fn read_rest(&mut self) -> &'a [u8] {
        let bytes = &self.data[self.position..];
        self.position = self.data.len();
        bytes
    }

    /// Decode the remaining bytes as UTF-16 in the parser's byte order.
    ///
    /// Decoding stops at the first NUL code unit. A trailing odd byte is ignored.
    ///
    /// # Errors
    /// Returns [`crate::Error::Parse`] for unpaired surrogates.
    pub fn read_utf16_rest(&mut self) -> Result<String> {
        let mut units = Vec::with_capacity(self.remaining() / 2);
        while self.remaining() >= 2 {
            units.push(self.read::<u16>()?);
        }
        self.position = self.data.len();

        let decoded = match U16CStr::from_slice_truncate(&units) {
            Ok(terminated) => terminated.to_string().ok(),
            Err(_) => U16Str::from_slice(&units).to_string().ok(),
        };

        decoded.ok_or_else(|| parse_error!("Invalid UTF-16 string - {:?}", units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_reads() {
        let data = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00, 0xFF];
        let mut parser = Parser::new(&data, ByteOrder::Little);

        assert_eq!(parser.read::<u16>().unwrap(), 1);
        assert_eq!(parser.read::<u32>().unwrap(), 2);
        assert_eq!(parser.remaining(), 1);
        assert!(parser.read::<u16>().is_err());
        assert_eq!(parser.remaining(), 1);
        assert_eq!(parser.read_rest(), &[0xFF]);
        assert_eq!(parser.remaining(), 0);
    }

    #[test]
    fn raw_bytes() {
        let data = b"ASCII\0\0\0text";
        let mut parser = Parser::new(data, ByteOrder::Big);
        assert_eq!(parser.read_bytes(8).unwrap(), b"ASCII\0\0\0");
        let err = parser.read_bytes(5).unwrap_err();
        assert_eq!(err.code(), ErrorCode::OffsetOutOfRange);
        assert_eq!(parser.read_rest(), b"text");
        assert!(parser.read_rest().is_empty());
    }

    #[test]
    fn utf16_both_orders() {
        let le = [0x48, 0x00, 0x69, 0x00];
        let mut parser = Parser::new(&le, ByteOrder::Little);
        assert_eq!(parser.read_utf16_rest().unwrap(), "Hi");

        let be = [0x00, 0x48, 0x00, 0x69, 0x00, 0x00, 0x00, 0x41];
        let mut parser = Parser::new(&be, ByteOrder::Big);
        assert_eq!(parser.read_utf16_rest().unwrap(), "Hi");
    }
}
