//! Fixed-width numeric arrays.
//!
//! Every array stores its elements at their native storage width. Host values enter through
//! [`Scalar`] and are range-checked against that width; nothing is truncated.

use std::fmt;

use super::{Scalar, TypeId, ValueCodec};
use crate::{
    io::{to_bytes, ByteOrder, Parser},
    Error, ErrorCode, Result,
};

/// An element type of a numeric array.
pub trait Element: Copy + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Type identifier of arrays of this element
    const TYPE_ID: TypeId;

    /// Converts a host scalar, enforcing the storage width.
    ///
    /// # Errors
    /// Returns [`Error::Range`] if the scalar does not fit, and [`Error::UnsupportedType`]
    /// if the scalar kind cannot represent this element (e.g. a fraction for an integer).
    fn from_scalar(scalar: Scalar) -> Result<Self>;

    /// Converts to a host scalar.
    fn to_scalar(self) -> Scalar;

    /// Parses one whitespace-delimited token.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] for malformed tokens and [`Error::Range`] for tokens out of
    /// range.
    fn parse(token: &str) -> Result<Self>;

    /// Canonical text of one element.
    fn to_text(self) -> String;

    /// Decodes one element.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] if not enough bytes remain.
    fn decode(parser: &mut Parser<'_>) -> Result<Self>;

    /// Appends the binary encoding of one element to `out`.
    fn encode(self, order: ByteOrder, out: &mut Vec<u8>);

    /// Size in bytes of one encoded element.
    fn width() -> usize {
        Self::TYPE_ID.size()
    }
}

fn parse_int(token: &str, type_name: &'static str) -> Result<i64> {
    token
        .parse::<i64>()
        .map_err(|_| parse_error!("Invalid {} token '{}'", type_name, token))
}

macro_rules! impl_int_element {
    ($ty:ty, $type_id:expr, $name:literal) => {
        impl Element for $ty {
            const TYPE_ID: TypeId = $type_id;

            fn from_scalar(scalar: Scalar) -> Result<Self> {
                match scalar {
                    Scalar::Int(value) => {
                        <$ty>::try_from(value).map_err(|_| range_error!(value, $name))
                    }
                    Scalar::Rational(num, 1) => {
                        <$ty>::try_from(num).map_err(|_| range_error!(num, $name))
                    }
                    other => Err(Error::UnsupportedType(format!(
                        "{} cannot hold {}",
                        $name, other
                    ))),
                }
            }

            fn to_scalar(self) -> Scalar {
                Scalar::Int(i64::from(self))
            }

            fn parse(token: &str) -> Result<Self> {
                let value = parse_int(token, $name)?;
                <$ty>::try_from(value).map_err(|_| range_error!(value, $name))
            }

            fn to_text(self) -> String {
                self.to_string()
            }

            fn decode(parser: &mut Parser<'_>) -> Result<Self> {
                parser.read::<$ty>()
            }

            fn encode(self, order: ByteOrder, out: &mut Vec<u8>) {
                out.extend_from_slice(&to_bytes(self, order));
            }
        }
    };
}

impl_int_element!(u16, TypeId::Short, "UShort");
impl_int_element!(u32, TypeId::Long, "ULong");
impl_int_element!(i16, TypeId::SShort, "SShort");
impl_int_element!(i32, TypeId::SLong, "SLong");

macro_rules! impl_float_element {
    ($ty:ty, $type_id:expr, $name:literal) => {
        impl Element for $ty {
            const TYPE_ID: TypeId = $type_id;

            #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
            fn from_scalar(scalar: Scalar) -> Result<Self> {
                let value = match scalar {
                    Scalar::Int(value) => value as f64,
                    Scalar::Rational(num, den) if den != 0 => num as f64 / den as f64,
                    Scalar::Rational(num, den) => {
                        return Err(range_error!(format!("{num}/{den}"), $name))
                    }
                    Scalar::Float(value) => value,
                };
                let narrowed = value as $ty;
                if value.is_finite() && !narrowed.is_finite() {
                    return Err(range_error!(value, $name));
                }
                Ok(narrowed)
            }

            fn to_scalar(self) -> Scalar {
                Scalar::Float(f64::from(self))
            }

            fn parse(token: &str) -> Result<Self> {
                token
                    .parse::<$ty>()
                    .map_err(|_| parse_error!("Invalid {} token '{}'", $name, token))
            }

            fn to_text(self) -> String {
                self.to_string()
            }

            fn decode(parser: &mut Parser<'_>) -> Result<Self> {
                parser.read::<$ty>()
            }

            fn encode(self, order: ByteOrder, out: &mut Vec<u8>) {
                out.extend_from_slice(&to_bytes(self, order));
            }
        }
    };
}

impl_float_element!(f32, TypeId::Float, "Float");
impl_float_element!(f64, TypeId::Double, "Double");

fn split_rational(token: &str, type_name: &'static str) -> Result<(i64, i64)> {
    match token.split_once('/') {
        Some((num, den)) => Ok((parse_int(num, type_name)?, parse_int(den, type_name)?)),
        None => Ok((parse_int(token, type_name)?, 1)),
    }
}

macro_rules! impl_rational_element {
    ($ty:ty, $type_id:expr, $name:literal) => {
        impl Element for ($ty, $ty) {
            const TYPE_ID: TypeId = $type_id;

            fn from_scalar(scalar: Scalar) -> Result<Self> {
                let (num, den) = match scalar {
                    Scalar::Int(value) => (value, 1),
                    Scalar::Rational(num, den) => (num, den),
                    Scalar::Float(value) => {
                        return Err(Error::UnsupportedType(format!(
                            "{} cannot hold float {}",
                            $name, value
                        )))
                    }
                };
                let narrow = |part: i64| {
                    <$ty>::try_from(part).map_err(|_| range_error!(format!("{num}/{den}"), $name))
                };
                Ok((narrow(num)?, narrow(den)?))
            }

            fn to_scalar(self) -> Scalar {
                Scalar::Rational(i64::from(self.0), i64::from(self.1))
            }

            fn parse(token: &str) -> Result<Self> {
                let (num, den) = split_rational(token, $name)?;
                Self::from_scalar(Scalar::Rational(num, den))
            }

            fn to_text(self) -> String {
                format!("{}/{}", self.0, self.1)
            }

            fn decode(parser: &mut Parser<'_>) -> Result<Self> {
                Ok((parser.read::<$ty>()?, parser.read::<$ty>()?))
            }

            fn encode(self, order: ByteOrder, out: &mut Vec<u8>) {
                out.extend_from_slice(&to_bytes(self.0, order));
                out.extend_from_slice(&to_bytes(self.1, order));
            }
        }
    };
}

impl_rational_element!(u32, TypeId::Rational, "URational");
impl_rational_element!(i32, TypeId::SRational, "SRational");

/// A numeric array, one variant per storage width.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericArray {
    /// `Short`: unsigned 16-bit
    UShort(Vec<u16>),
    /// `Long`: unsigned 32-bit
    ULong(Vec<u32>),
    /// `Rational`: pairs of unsigned 32-bit
    URational(Vec<(u32, u32)>),
    /// `SShort`: signed 16-bit
    SShort(Vec<i16>),
    /// `SLong`: signed 32-bit
    SLong(Vec<i32>),
    /// `SRational`: pairs of signed 32-bit
    SRational(Vec<(i32, i32)>),
    /// `Float`: IEEE 754 single precision
    Float(Vec<f32>),
    /// `Double`: IEEE 754 double precision
    Double(Vec<f64>),
}

macro_rules! with_array {
    ($array:expr, $items:ident => $body:expr) => {
        match $array {
            NumericArray::UShort($items) => $body,
            NumericArray::ULong($items) => $body,
            NumericArray::URational($items) => $body,
            NumericArray::SShort($items) => $body,
            NumericArray::SLong($items) => $body,
            NumericArray::SRational($items) => $body,
            NumericArray::Float($items) => $body,
            NumericArray::Double($items) => $body,
        }
    };
}

/// Resolves a possibly negative index against `len`.
pub(crate) fn resolve_index(index: isize, len: usize) -> Result<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        Some(index.unsigned_abs()).filter(|i| *i < len)
    };

    resolved.ok_or_else(|| {
        Error::Native {
            code: ErrorCode::OffsetOutOfRange,
            message: format!("Index {index} out of range for {len} elements"),
        }
    })
}

fn parse_all<T: Element>(text: &str) -> Result<Vec<T>> {
    text.split_whitespace().map(T::parse).collect()
}

fn decode_all<T: Element>(bytes: &[u8], order: ByteOrder) -> Result<Vec<T>> {
    let mut parser = Parser::new(bytes, order);
    let mut items = Vec::with_capacity(bytes.len() / T::width());
    while parser.remaining() >= T::width() {
        items.push(T::decode(&mut parser)?);
    }
    Ok(items)
}

fn encode_all<T: Element>(items: &[T], order: ByteOrder) -> Vec<u8> {
    let mut out = Vec::with_capacity(items.len() * T::width());
    for item in items {
        item.encode(order, &mut out);
    }
    out
}

fn set_at<T: Element>(items: &mut [T], index: isize, scalar: Scalar) -> Result<()> {
    let index = resolve_index(index, items.len())?;
    items[index] = T::from_scalar(scalar)?;
    Ok(())
}

fn push_one<T: Element>(items: &mut Vec<T>, scalar: Scalar) -> Result<()> {
    items.push(T::from_scalar(scalar)?);
    Ok(())
}

fn remove_at<T: Element>(items: &mut Vec<T>, index: isize) -> Result<Scalar> {
    let index = resolve_index(index, items.len())?;
    Ok(items.remove(index).to_scalar())
}

fn collect_scalars<T: Element>(scalars: &[Scalar]) -> Result<Vec<T>> {
    scalars.iter().copied().map(T::from_scalar).collect()
}

impl NumericArray {
    /// Creates an empty array for a numeric type id.
    ///
    /// Returns `None` for non-numeric types.
    #[must_use]
    pub fn empty(type_id: TypeId) -> Option<Self> {
        Some(match type_id {
            TypeId::Short => NumericArray::UShort(Vec::new()),
            TypeId::Long => NumericArray::ULong(Vec::new()),
            TypeId::Rational => NumericArray::URational(Vec::new()),
            TypeId::SShort => NumericArray::SShort(Vec::new()),
            TypeId::SLong => NumericArray::SLong(Vec::new()),
            TypeId::SRational => NumericArray::SRational(Vec::new()),
            TypeId::Float => NumericArray::Float(Vec::new()),
            TypeId::Double => NumericArray::Double(Vec::new()),
            _ => return None,
        })
    }

    /// Builds an array of `type_id` from host scalars, enforcing the storage width.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for non-numeric types, or the first conversion
    /// error of any scalar.
    pub fn from_scalars(type_id: TypeId, scalars: &[Scalar]) -> Result<Self> {
        Ok(match type_id {
            TypeId::Short => NumericArray::UShort(collect_scalars(scalars)?),
            TypeId::Long => NumericArray::ULong(collect_scalars(scalars)?),
            TypeId::Rational => NumericArray::URational(collect_scalars(scalars)?),
            TypeId::SShort => NumericArray::SShort(collect_scalars(scalars)?),
            TypeId::SLong => NumericArray::SLong(collect_scalars(scalars)?),
            TypeId::SRational => NumericArray::SRational(collect_scalars(scalars)?),
            TypeId::Float => NumericArray::Float(collect_scalars(scalars)?),
            TypeId::Double => NumericArray::Double(collect_scalars(scalars)?),
            other => {
                return Err(Error::UnsupportedType(format!(
                    "{other} is not a numeric type"
                )))
            }
        })
    }

    /// Returns the type id of the array.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        match self {
            NumericArray::UShort(_) => TypeId::Short,
            NumericArray::ULong(_) => TypeId::Long,
            NumericArray::URational(_) => TypeId::Rational,
            NumericArray::SShort(_) => TypeId::SShort,
            NumericArray::SLong(_) => TypeId::SLong,
            NumericArray::SRational(_) => TypeId::SRational,
            NumericArray::Float(_) => TypeId::Float,
            NumericArray::Double(_) => TypeId::Double,
        }
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        with_array!(self, items => items.len())
    }

    /// Returns `true` if the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the element at `index` (negative counts from the end).
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::OffsetOutOfRange`] for a bad index.
    pub fn get(&self, index: isize) -> Result<Scalar> {
        with_array!(self, items => {
            let index = resolve_index(index, items.len())?;
            Ok(items[index].to_scalar())
        })
    }

    /// Replaces the element at `index`.
    ///
    /// # Errors
    /// Returns the index error, or the conversion error of `scalar`.
    pub fn set(&mut self, index: isize, scalar: Scalar) -> Result<()> {
        with_array!(self, items => set_at(items, index, scalar))
    }

    /// Appends an element.
    ///
    /// # Errors
    /// Returns the conversion error of `scalar`.
    pub fn push(&mut self, scalar: Scalar) -> Result<()> {
        with_array!(self, items => push_one(items, scalar))
    }

    /// Removes and returns the element at `index`.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::OffsetOutOfRange`] for a bad index.
    pub fn remove(&mut self, index: isize) -> Result<Scalar> {
        with_array!(self, items => remove_at(items, index))
    }

    /// Returns all elements as host scalars.
    #[must_use]
    pub fn to_scalars(&self) -> Vec<Scalar> {
        with_array!(self, items => items.iter().map(|item| item.to_scalar()).collect())
    }

    fn element_text(&self, index: usize) -> Option<String> {
        with_array!(self, items => items.get(index).map(|item| item.to_text()))
    }
}

/// A numeric value: a fixed-width array plus an optional data area.
///
/// The data area is an opaque byte block some tags (e.g. strip offsets) point into.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericValue {
    /// The elements
    pub array: NumericArray,
    /// Bytes of the associated data area
    pub data_area: Vec<u8>,
}

impl NumericValue {
    /// Wraps an array with an empty data area.
    #[must_use]
    pub fn new(array: NumericArray) -> Self {
        NumericValue {
            array,
            data_area: Vec::new(),
        }
    }
}

impl ValueCodec for NumericValue {
    fn type_id(&self) -> TypeId {
        self.array.type_id()
    }

    fn count(&self) -> usize {
        self.array.len()
    }

    fn read_str(&mut self, text: &str) -> Result<()> {
        let parsed = match &self.array {
            NumericArray::UShort(_) => NumericArray::UShort(parse_all(text)?),
            NumericArray::ULong(_) => NumericArray::ULong(parse_all(text)?),
            NumericArray::URational(_) => NumericArray::URational(parse_all(text)?),
            NumericArray::SShort(_) => NumericArray::SShort(parse_all(text)?),
            NumericArray::SLong(_) => NumericArray::SLong(parse_all(text)?),
            NumericArray::SRational(_) => NumericArray::SRational(parse_all(text)?),
            NumericArray::Float(_) => NumericArray::Float(parse_all(text)?),
            NumericArray::Double(_) => NumericArray::Double(parse_all(text)?),
        };
        self.array = parsed;
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], order: ByteOrder) -> Result<()> {
        let decoded = match &self.array {
            NumericArray::UShort(_) => NumericArray::UShort(decode_all(bytes, order)?),
            NumericArray::ULong(_) => NumericArray::ULong(decode_all(bytes, order)?),
            NumericArray::URational(_) => NumericArray::URational(decode_all(bytes, order)?),
            NumericArray::SShort(_) => NumericArray::SShort(decode_all(bytes, order)?),
            NumericArray::SLong(_) => NumericArray::SLong(decode_all(bytes, order)?),
            NumericArray::SRational(_) => NumericArray::SRational(decode_all(bytes, order)?),
            NumericArray::Float(_) => NumericArray::Float(decode_all(bytes, order)?),
            NumericArray::Double(_) => NumericArray::Double(decode_all(bytes, order)?),
        };
        self.array = decoded;
        Ok(())
    }

    fn encode(&self, order: ByteOrder) -> Vec<u8> {
        with_array!(&self.array, items => encode_all(items, order))
    }

    fn size(&self) -> usize {
        self.array.len() * self.array.type_id().size()
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_array!(&self.array, items => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                f.write_str(&item.to_text())?;
            }
            Ok(())
        })
    }

    fn element_text(&self, index: usize) -> Option<String> {
        self.array.element_text(index)
    }

    fn element_scalar(&self, index: usize) -> Option<Scalar> {
        with_array!(&self.array, items => items.get(index).map(|item| item.to_scalar()))
    }
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for NumericArray {
                fn from(items: Vec<$ty>) -> Self {
                    NumericArray::$variant(items)
                }
            }
        )*
    };
}

impl_from_vec!(
    u16 => UShort,
    u32 => ULong,
    (u32, u32) => URational,
    i16 => SShort,
    i32 => SLong,
    (i32, i32) => SRational,
    f32 => Float,
    f64 => Double,
);
