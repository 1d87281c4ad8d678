//! Byte-order aware reading and writing of primitive values.
//!
//! Metadata values are stored in the byte order of the image they came from (TIFF headers
//! declare either `II` little-endian or `MM` big-endian). This module provides the
//! bounds-checked primitives the value model uses for its binary encoding.
//!
//! # Key Components
//!
//! - [`ByteOrder`] - The two byte orders a value can be encoded in
//! - [`ByteIO`] - Trait implemented by every fixed-width primitive
//! - [`read_at`] / [`write_at`] - Offset based, auto-advancing accessors
//! - [`Parser`] - Cursor over a byte slice for sequential decoding
//!
//! # Examples
//!
//! ```rust
//! use metabind::io::{read_at, write_at, ByteOrder};
//!
//! let mut data = [0u8; 4];
//! let mut offset = 0;
//! write_at(&mut data, &mut offset, 0x0102_u16, ByteOrder::Big)?;
//! write_at(&mut data, &mut offset, 0x0304_u16, ByteOrder::Little)?;
//! assert_eq!(data, [0x01, 0x02, 0x04, 0x03]);
//!
//! let mut offset = 0;
//! let value: u16 = read_at(&data, &mut offset, ByteOrder::Big)?;
//! assert_eq!(value, 0x0102);
//! # Ok::<(), metabind::Error>(())
//! ```

mod parser;

pub use parser::Parser;

use crate::{ErrorCode, Result};
use strum::{Display, EnumString};

/// Byte order of a binary value encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum ByteOrder {
    /// Least significant byte first (`II`)
    #[default]
    Little,
    /// Most significant byte first (`MM`)
    Big,
}

/// Trait for fixed-width primitives that can be read from and written to byte buffers
/// in either byte order.
pub trait ByteIO: Sized + Copy {
    /// The byte array holding the encoded value.
    type Bytes: Sized + AsRef<[u8]> + for<'a> TryFrom<&'a [u8]>;

    /// Decode from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
    /// Decode from big-endian bytes
    fn from_be_bytes(bytes: Self::Bytes) -> Self;
    /// Encode to little-endian bytes
    fn to_le_bytes(self) -> Self::Bytes;
    /// Encode to big-endian bytes
    fn to_be_bytes(self) -> Self::Bytes;
}

macro_rules! impl_byte_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ByteIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }

                fn from_be_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_be_bytes(bytes)
                }

                fn to_le_bytes(self) -> Self::Bytes {
                    <$ty>::to_le_bytes(self)
                }

                fn to_be_bytes(self) -> Self::Bytes {
                    <$ty>::to_be_bytes(self)
                }
            }
        )*
    };
}

impl_byte_io!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Reads a `T` at `offset` in the given byte order and advances `offset` past it.
///
/// # Errors
///
/// Returns [`crate::Error::Parse`] with [`ErrorCode::OffsetOutOfRange`] if fewer than
/// `size_of::<T>()` bytes remain.
pub fn read_at<T: ByteIO>(data: &[u8], offset: &mut usize, order: ByteOrder) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_range(*offset, type_len, data.len()));
    };
    if end > data.len() {
        return Err(out_of_range(*offset, type_len, data.len()));
    }

    let Ok(bytes) = T::Bytes::try_from(&data[*offset..end]) else {
        return Err(out_of_range(*offset, type_len, data.len()));
    };

    *offset = end;
    Ok(match order {
        ByteOrder::Little => T::from_le_bytes(bytes),
        ByteOrder::Big => T::from_be_bytes(bytes),
    })
}

/// Writes `value` at `offset` in the given byte order and advances `offset` past it.
///
/// # Errors
///
/// Returns [`crate::Error::Parse`] with [`ErrorCode::OffsetOutOfRange`] if the value does
/// not fit into the remaining space.
pub fn write_at<T: ByteIO>(
    data: &mut [u8],
    offset: &mut usize,
    value: T,
    order: ByteOrder,
) -> Result<()> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(out_of_range(*offset, type_len, data.len()));
    };
    if end > data.len() {
        return Err(out_of_range(*offset, type_len, data.len()));
    }

    let bytes = match order {
        ByteOrder::Little => value.to_le_bytes(),
        ByteOrder::Big => value.to_be_bytes(),
    };
    data[*offset..end].copy_from_slice(bytes.as_ref());
    *offset = end;

    Ok(())
}

/// Encodes `value` into a freshly allocated vector.
#[must_use]
pub fn to_bytes<T: ByteIO>(value: T, order: ByteOrder) -> Vec<u8> {
    match order {
        ByteOrder::Little => value.to_le_bytes().as_ref().to_vec(),
        ByteOrder::Big => value.to_be_bytes().as_ref().to_vec(),
    }
}

fn out_of_range(offset: usize, needed: usize, len: usize) -> crate::Error {
    parse_error!(
        code: ErrorCode::OffsetOutOfRange,
        "Reading {} bytes at offset {} exceeds buffer of {} bytes",
        needed,
        offset,
        len
    )
}
