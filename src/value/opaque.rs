//! Raw byte values (`Byte`, `SByte`, `Undefined`).

use std::fmt;

use super::{numeric::resolve_index, Scalar, TypeId, ValueCodec};
use crate::{io::ByteOrder, Error, Result};

/// A sequence of raw bytes with an element type.
///
/// The text form is the space-separated decimal bytes, signed for `SByte`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueValue {
    type_id: TypeId,
    /// The bytes
    pub bytes: Vec<u8>,
}

impl OpaqueValue {
    /// Creates an opaque value of `type_id`, which must be `Byte`, `SByte` or `Undefined`.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for any other type id.
    pub fn new(type_id: TypeId, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        match type_id {
            TypeId::Byte | TypeId::SByte | TypeId::Undefined => Ok(OpaqueValue {
                type_id,
                bytes: bytes.into(),
            }),
            other => Err(Error::UnsupportedType(format!(
                "{other} is not a raw byte type"
            ))),
        }
    }

    fn signed(&self) -> bool {
        self.type_id == TypeId::SByte
    }

    fn to_scalar(&self, byte: u8) -> Scalar {
        if self.signed() {
            Scalar::Int(i64::from(byte as i8))
        } else {
            Scalar::Int(i64::from(byte))
        }
    }

    fn from_scalar(&self, scalar: Scalar) -> Result<u8> {
        let type_name: &'static str = self.type_id.into();
        let value = match scalar {
            Scalar::Int(value) => value,
            Scalar::Rational(num, 1) => num,
            other => {
                return Err(Error::UnsupportedType(format!(
                    "{type_name} cannot hold {other}"
                )))
            }
        };

        if self.signed() {
            i8::try_from(value)
                .map(|byte| byte as u8)
                .map_err(|_| range_error!(value, type_name))
        } else {
            u8::try_from(value).map_err(|_| range_error!(value, type_name))
        }
    }

    /// Returns the number of bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if there are no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the byte at `index` (negative counts from the end).
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`crate::ErrorCode::OffsetOutOfRange`] for a bad index.
    pub fn get(&self, index: isize) -> Result<Scalar> {
        let index = resolve_index(index, self.bytes.len())?;
        Ok(self.to_scalar(self.bytes[index]))
    }

    /// Replaces the byte at `index`.
    ///
    /// # Errors
    /// Returns the index error, or [`Error::Range`] if `scalar` does not fit a byte.
    pub fn set(&mut self, index: isize, scalar: Scalar) -> Result<()> {
        let index = resolve_index(index, self.bytes.len())?;
        self.bytes[index] = self.from_scalar(scalar)?;
        Ok(())
    }

    /// Appends a byte.
    ///
    /// # Errors
    /// Returns [`Error::Range`] if `scalar` does not fit a byte.
    pub fn push(&mut self, scalar: Scalar) -> Result<()> {
        let byte = self.from_scalar(scalar)?;
        self.bytes.push(byte);
        Ok(())
    }

    /// Removes and returns the byte at `index`.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`crate::ErrorCode::OffsetOutOfRange`] for a bad index.
    pub fn remove(&mut self, index: isize) -> Result<Scalar> {
        let index = resolve_index(index, self.bytes.len())?;
        let byte = self.bytes.remove(index);
        Ok(self.to_scalar(byte))
    }
}

impl ValueCodec for OpaqueValue {
    fn type_id(&self) -> TypeId {
        self.type_id
    }

    fn count(&self) -> usize {
        self.bytes.len()
    }

    fn read_str(&mut self, text: &str) -> Result<()> {
        let type_name: &'static str = self.type_id.into();
        let bytes = text
            .split_whitespace()
            .map(|token| {
                let value = token
                    .parse::<i64>()
                    .map_err(|_| parse_error!("Invalid {} token '{}'", type_name, token))?;
                self.from_scalar(Scalar::Int(value))
            })
            .collect::<Result<Vec<u8>>>()?;
        self.bytes = bytes;
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], _order: ByteOrder) -> Result<()> {
        self.bytes = bytes.to_vec();
        Ok(())
    }

    fn encode(&self, _order: ByteOrder) -> Vec<u8> {
        self.bytes.clone()
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", self.to_scalar(*byte))?;
        }
        Ok(())
    }

    fn element_text(&self, index: usize) -> Option<String> {
        self.bytes
            .get(index)
            .map(|byte| self.to_scalar(*byte).to_string())
    }

    fn element_scalar(&self, index: usize) -> Option<Scalar> {
        self.bytes.get(index).map(|byte| self.to_scalar(*byte))
    }
}
