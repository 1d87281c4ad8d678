//! The value model: typed metadata payloads and their host conversions.
//!
//! A [`Value`] wraps one variant of the closed [`ValueData`] sum type. Every variant
//! knows its element count, its byte size, a canonical text form ([`fmt::Display`] and
//! [`Value::read_str`]) and a binary form in a given [`ByteOrder`] ([`Value::copy`] and
//! [`Value::read_bytes`]).
//!
//! Conversions towards the host are soft. [`Value::to_int`], [`Value::to_uint`],
//! [`Value::to_float`], [`Value::to_rational`] and [`Value::to_string_at`] return `None`
//! when the variant or the index does not permit the conversion, and record the outcome in
//! the [`Value::ok`] flag. Conversions into a value are strict: host numbers outside the
//! storage width of a numeric variant fail with [`Error::Range`].
//!
//! # Examples
//!
//! ```rust
//! use metabind::{Scalar, TypeId, Value};
//!
//! let mut value = Value::create(TypeId::Rational)?;
//! value.read_str("4/3 7/13")?;
//! assert_eq!(value.count(), 2);
//! assert_eq!(value.to_string(), "4/3 7/13");
//!
//! assert_eq!(value.to_rational(1), Some((7, 13)));
//! assert!(value.ok());
//! assert_eq!(value.to_rational(2), None);
//! assert!(!value.ok());
//!
//! assert!(value.push(Scalar::Rational(-1, 2)).is_err());
//! # Ok::<(), metabind::Error>(())
//! ```

mod datetime;
mod numeric;
mod opaque;
mod text;
mod xmp;

pub use datetime::{DateValue, TimeValue};
pub use numeric::{Element, NumericArray, NumericValue};
pub use opaque::OpaqueValue;
pub use text::{CharsetId, CommentValue, TextKind, TextValue};
pub use xmp::{LangAltValue, XmpArrayType, XmpArrayValue, XmpForm, XmpStruct, XmpTextValue, X_DEFAULT};

pub(crate) use numeric::resolve_index;

use std::{
    fmt,
    sync::atomic::{AtomicBool, Ordering},
};

use strum::{Display, EnumString, FromRepr, IntoStaticStr};

use crate::{io::ByteOrder, Error, ErrorCode, Result};

/// Type identifiers of the metadata engine.
///
/// The numeric values are stable and match the engine's numbering; the names are the
/// engine's type names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, FromRepr, IntoStaticStr,
)]
#[repr(u32)]
pub enum TypeId {
    /// 8-bit unsigned integer
    Byte = 1,
    /// NUL terminated ASCII text
    Ascii = 2,
    /// 16-bit unsigned integer
    Short = 3,
    /// 32-bit unsigned integer
    Long = 4,
    /// Two 32-bit unsigned integers
    Rational = 5,
    /// 8-bit signed integer
    SByte = 6,
    /// 8-bit opaque byte
    Undefined = 7,
    /// 16-bit signed integer
    SShort = 8,
    /// 32-bit signed integer
    SLong = 9,
    /// Two 32-bit signed integers
    SRational = 10,
    /// IEEE 754 single precision
    Float = 11,
    /// IEEE 754 double precision
    Double = 12,
    /// 32-bit IFD offset
    Ifd = 13,
    /// IPTC string
    String = 0x10000,
    /// IPTC date
    Date = 0x10001,
    /// IPTC time
    Time = 0x10002,
    /// Exif user comment
    Comment = 0x10003,
    /// Exif sub-directory marker
    Directory = 0x10004,
    /// XMP simple text
    XmpText = 0x10005,
    /// XMP alternative array
    XmpAlt = 0x10006,
    /// XMP unordered array
    XmpBag = 0x10007,
    /// XMP ordered array
    XmpSeq = 0x10008,
    /// XMP language alternative
    LangAlt = 0x10009,
    /// Not a valid type
    Invalid = 0x1fffe,
}

impl TypeId {
    /// Looks up a type id by its numeric value.
    #[must_use]
    pub fn from_u32(raw: u32) -> Option<Self> {
        Self::from_repr(raw)
    }

    /// Returns the engine's name of this type.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Returns the size in bytes of one element, `0` for variable-size types.
    #[must_use]
    pub fn size(self) -> usize {
        match self {
            TypeId::Byte
            | TypeId::Ascii
            | TypeId::SByte
            | TypeId::Undefined
            | TypeId::String
            | TypeId::Comment
            | TypeId::Directory => 1,
            TypeId::Short | TypeId::SShort => 2,
            TypeId::Long | TypeId::SLong | TypeId::Float | TypeId::Ifd => 4,
            TypeId::Rational | TypeId::SRational | TypeId::Double | TypeId::Date => 8,
            TypeId::Time => 11,
            TypeId::XmpText
            | TypeId::XmpAlt
            | TypeId::XmpBag
            | TypeId::XmpSeq
            | TypeId::LangAlt
            | TypeId::Invalid => 0,
        }
    }

    /// Returns `true` for the XMP types.
    #[must_use]
    pub fn is_xmp(self) -> bool {
        matches!(
            self,
            TypeId::XmpText | TypeId::XmpAlt | TypeId::XmpBag | TypeId::XmpSeq | TypeId::LangAlt
        )
    }
}

/// Name and size lookups for [`TypeId`].
pub struct TypeInfo;

impl TypeInfo {
    /// Returns the name of `type_id`.
    #[must_use]
    pub fn type_name(type_id: TypeId) -> &'static str {
        type_id.name()
    }

    /// Returns the type id named `name`, or [`TypeId::Invalid`].
    #[must_use]
    pub fn type_id(name: &str) -> TypeId {
        name.parse().unwrap_or(TypeId::Invalid)
    }

    /// Returns the element size of `type_id`.
    #[must_use]
    pub fn type_size(type_id: TypeId) -> usize {
        type_id.size()
    }
}

/// A host-side number exchanged with numeric values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// An integer
    Int(i64),
    /// A fraction `numerator / denominator`
    Rational(i64, i64),
    /// A floating point number
    Float(f64),
}

/// Greatest common divisor, always non-negative.
fn gcd(mut a: i64, mut b: i64) -> i64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.abs()
}

impl Scalar {
    /// Converts to an integer, truncating fractions.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn to_int(self) -> Option<i64> {
        match self {
            Scalar::Int(value) => Some(value),
            Scalar::Rational(num, den) => num.checked_div(den),
            Scalar::Float(value) => {
                let truncated = value.trunc();
                (truncated.is_finite()
                    && truncated >= i64::MIN as f64
                    && truncated < i64::MAX as f64)
                    .then_some(truncated as i64)
            }
        }
    }

    /// Converts to a floating point number.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_float(self) -> Option<f64> {
        match self {
            Scalar::Int(value) => Some(value as f64),
            Scalar::Rational(_, 0) => None,
            Scalar::Rational(num, den) => Some(num as f64 / den as f64),
            Scalar::Float(value) => Some(value),
        }
    }

    /// Converts to a fraction. Floats are approximated with a denominator of at most
    /// one million.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn to_rational(self) -> Option<(i64, i64)> {
        match self {
            Scalar::Int(value) => Some((value, 1)),
            Scalar::Rational(num, den) => Some((num, den)),
            Scalar::Float(value) => {
                const DEN: i64 = 1_000_000;
                let scaled = (value * DEN as f64).round();
                if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
                    return None;
                }
                let num = scaled as i64;
                let divisor = gcd(num, DEN).max(1);
                Some((num / divisor, DEN / divisor))
            }
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Int(value) => write!(f, "{value}"),
            Scalar::Rational(num, den) => write!(f, "{num}/{den}"),
            Scalar::Float(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Scalar::Int(i64::from(value))
                }
            }
        )*
    };
}

scalar_from!(u8, i8, u16, i16, u32, i32, i64);

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<f32> for Scalar {
    fn from(value: f32) -> Self {
        Scalar::Float(f64::from(value))
    }
}

impl From<(i64, i64)> for Scalar {
    fn from((num, den): (i64, i64)) -> Self {
        Scalar::Rational(num, den)
    }
}

/// Parses text as an integer, a `num/den` fraction or a finite float.
pub(crate) fn parse_number(text: &str) -> Option<Scalar> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Some(Scalar::Int(value));
    }
    if let Some((num, den)) = text.split_once('/') {
        return match (num.trim().parse::<i64>(), den.trim().parse::<i64>()) {
            (Ok(num), Ok(den)) => Some(Scalar::Rational(num, den)),
            _ => None,
        };
    }
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .map(Scalar::Float)
}

/// Behaviour shared by every value variant.
pub(crate) trait ValueCodec {
    /// Type identifier of the variant
    fn type_id(&self) -> TypeId;

    /// Number of elements
    fn count(&self) -> usize;

    /// Replaces the contents from the canonical text form; unchanged on failure.
    fn read_str(&mut self, text: &str) -> Result<()>;

    /// Replaces the contents from the binary form; unchanged on failure.
    fn read_bytes(&mut self, bytes: &[u8], order: ByteOrder) -> Result<()>;

    /// Binary form in `order`.
    fn encode(&self, order: ByteOrder) -> Vec<u8>;

    /// Byte length of the binary form.
    fn size(&self) -> usize {
        self.encode(ByteOrder::Little).len()
    }

    /// Writes the canonical text form.
    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    /// Text form of element `index`.
    fn element_text(&self, index: usize) -> Option<String>;

    /// Numeric reading of element `index`; byte `index` of the binary form unless
    /// overridden.
    fn element_scalar(&self, index: usize) -> Option<Scalar> {
        self.encode(ByteOrder::Little)
            .get(index)
            .map(|byte| Scalar::Int(i64::from(*byte)))
    }
}

/// Displays a variant through its canonical text form.
pub(crate) struct TextForm<'a, T: ValueCodec + ?Sized>(pub &'a T);

impl<T: ValueCodec + ?Sized> fmt::Display for TextForm<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.write_text(f)
    }
}

/// The closed set of value variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    /// `Ascii`, `String` or UTF-16 text
    Text(TextValue),
    /// Charset-tagged user comment
    Comment(CommentValue),
    /// Fixed-width numeric array
    Numeric(NumericValue),
    /// IPTC date
    Date(DateValue),
    /// IPTC time
    Time(TimeValue),
    /// XMP language alternative
    LangAlt(LangAltValue),
    /// XMP `Seq`, `Bag` or `Alt` array
    XmpArray(XmpArrayValue),
    /// XMP simple text
    XmpText(XmpTextValue),
    /// Raw bytes
    Opaque(OpaqueValue),
}

macro_rules! with_data {
    ($data:expr, $value:ident => $body:expr) => {
        match $data {
            ValueData::Text($value) => $body,
            ValueData::Comment($value) => $body,
            ValueData::Numeric($value) => $body,
            ValueData::Date($value) => $body,
            ValueData::Time($value) => $body,
            ValueData::LangAlt($value) => $body,
            ValueData::XmpArray($value) => $body,
            ValueData::XmpText($value) => $body,
            ValueData::Opaque($value) => $body,
        }
    };
}

/// A metadata value.
///
/// Cloning is deep. Equality compares the payload, not the [`Value::ok`] flag.
pub struct Value {
    data: ValueData,
    ok: AtomicBool,
}

impl Value {
    fn wrap(data: ValueData) -> Self {
        Value {
            data,
            ok: AtomicBool::new(true),
        }
    }

    /// Returns a default-valued instance of `type_id`.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for [`TypeId::Ifd`], [`TypeId::Directory`] and
    /// [`TypeId::Invalid`].
    pub fn create(type_id: TypeId) -> Result<Value> {
        let data = match type_id {
            TypeId::Byte | TypeId::SByte | TypeId::Undefined => {
                ValueData::Opaque(OpaqueValue::new(type_id, Vec::new())?)
            }
            TypeId::Ascii => ValueData::Text(TextValue::new(TextKind::Ascii, "")),
            TypeId::String => ValueData::Text(TextValue::new(TextKind::String, "")),
            TypeId::Short
            | TypeId::Long
            | TypeId::Rational
            | TypeId::SShort
            | TypeId::SLong
            | TypeId::SRational
            | TypeId::Float
            | TypeId::Double => {
                let array = NumericArray::empty(type_id).ok_or_else(|| {
                    Error::UnsupportedType(format!("{type_id} has no numeric storage"))
                })?;
                ValueData::Numeric(NumericValue::new(array))
            }
            TypeId::Date => ValueData::Date(DateValue::default()),
            TypeId::Time => ValueData::Time(TimeValue::default()),
            TypeId::Comment => ValueData::Comment(CommentValue::default()),
            TypeId::XmpText => ValueData::XmpText(XmpTextValue::default()),
            TypeId::XmpAlt => ValueData::XmpArray(XmpArrayValue::new(XmpArrayType::Alt)),
            TypeId::XmpBag => ValueData::XmpArray(XmpArrayValue::new(XmpArrayType::Bag)),
            TypeId::XmpSeq => ValueData::XmpArray(XmpArrayValue::new(XmpArrayType::Seq)),
            TypeId::LangAlt => ValueData::LangAlt(LangAltValue::new()),
            TypeId::Ifd | TypeId::Directory | TypeId::Invalid => {
                return Err(Error::UnsupportedType(format!(
                    "Cannot create a value of type {type_id}"
                )))
            }
        };
        Ok(Value::wrap(data))
    }

    /// Returns a default-valued instance of the type with numeric id `raw`.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for unknown ids and for the ids
    /// [`Value::create`] rejects.
    pub fn create_raw(raw: u32) -> Result<Value> {
        let type_id = TypeId::from_u32(raw)
            .ok_or_else(|| Error::UnsupportedType(format!("Unknown type id {raw:#x}")))?;
        Self::create(type_id)
    }

    /// Creates a value of `type_id` from its canonical text form.
    ///
    /// # Errors
    /// Returns the error of [`Value::create`] or [`Value::read_str`].
    pub fn parse(type_id: TypeId, text: &str) -> Result<Value> {
        let mut value = Self::create(type_id)?;
        value.read_str(text)?;
        Ok(value)
    }

    /// Creates an `Ascii` text value.
    pub fn ascii(text: impl Into<String>) -> Value {
        Value::wrap(ValueData::Text(TextValue::new(TextKind::Ascii, text)))
    }

    /// Creates a `String` text value.
    pub fn string(text: impl Into<String>) -> Value {
        Value::wrap(ValueData::Text(TextValue::new(TextKind::String, text)))
    }

    /// Creates a UTF-16 text value, as used by the Windows `XP*` tags.
    pub fn unicode(text: impl Into<String>) -> Value {
        Value::wrap(ValueData::Text(TextValue::new(TextKind::Unicode, text)))
    }

    /// Creates a user comment.
    pub fn comment(charset: CharsetId, text: impl Into<String>) -> Value {
        Value::wrap(ValueData::Comment(CommentValue::new(charset, text)))
    }

    /// Creates a numeric value from an array.
    pub fn numeric(array: impl Into<NumericArray>) -> Value {
        Value::wrap(ValueData::Numeric(NumericValue::new(array.into())))
    }

    /// Creates a numeric value of `type_id` from host scalars.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for non-numeric types and [`Error::Range`] for
    /// scalars that do not fit the storage width.
    pub fn from_scalars(type_id: TypeId, scalars: &[Scalar]) -> Result<Value> {
        Ok(Self::numeric(NumericArray::from_scalars(type_id, scalars)?))
    }

    /// Creates a date.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] with [`ErrorCode::UnsupportedDateFormat`] for dates that
    /// do not exist.
    pub fn date(year: i32, month: u32, day: u32) -> Result<Value> {
        Ok(Value::wrap(ValueData::Date(DateValue::new(year, month, day)?)))
    }

    /// Creates a time of day.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] with [`ErrorCode::UnsupportedTimeFormat`] for fields out of
    /// range.
    pub fn time(hour: u32, minute: u32, second: u32, tz_hour: i32, tz_minute: i32) -> Result<Value> {
        Ok(Value::wrap(ValueData::Time(TimeValue::new(
            hour, minute, second, tz_hour, tz_minute,
        )?)))
    }

    /// Creates an XMP simple text value.
    pub fn xmp_text(text: impl Into<String>) -> Value {
        Value::wrap(ValueData::XmpText(XmpTextValue::new(text)))
    }

    /// Creates an XMP array.
    pub fn xmp_array<I, S>(kind: XmpArrayType, items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::wrap(ValueData::XmpArray(XmpArrayValue::with_items(kind, items)))
    }

    /// Creates a language alternative.
    pub fn lang_alt<I, L, T>(entries: I) -> Value
    where
        I: IntoIterator<Item = (L, T)>,
        L: AsRef<str>,
        T: Into<String>,
    {
        Value::wrap(ValueData::LangAlt(LangAltValue::with_entries(entries)))
    }

    /// Creates a raw byte value of type `Byte`, `SByte` or `Undefined`.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for any other type id.
    pub fn opaque(type_id: TypeId, bytes: impl Into<Vec<u8>>) -> Result<Value> {
        Ok(Value::wrap(ValueData::Opaque(OpaqueValue::new(type_id, bytes)?)))
    }

    /// Returns the variant.
    #[must_use]
    pub fn data(&self) -> &ValueData {
        &self.data
    }

    /// Returns the variant, mutably.
    pub fn data_mut(&mut self) -> &mut ValueData {
        &mut self.data
    }

    /// Unwraps the variant.
    #[must_use]
    pub fn into_data(self) -> ValueData {
        self.data
    }

    /// Returns the type identifier.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        with_data!(&self.data, v => v.type_id())
    }

    /// Returns the type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_id().name()
    }

    /// Returns the number of elements. Text variants count bytes of the binary form.
    #[must_use]
    pub fn count(&self) -> usize {
        with_data!(&self.data, v => v.count())
    }

    /// Returns the byte length of the binary form.
    #[must_use]
    pub fn size(&self) -> usize {
        with_data!(&self.data, v => v.size())
    }

    /// Replaces the contents from the canonical text form.
    ///
    /// # Errors
    /// Returns [`Error::Parse`] or [`Error::Range`]; the value is unchanged on failure.
    pub fn read_str(&mut self, text: &str) -> Result<()> {
        with_data!(&mut self.data, v => v.read_str(text))
    }

    /// Replaces the contents from the binary form in `order`.
    ///
    /// # Errors
    /// Returns [`Error::Parse`]; the value is unchanged on failure.
    pub fn read_bytes(&mut self, bytes: &[u8], order: ByteOrder) -> Result<()> {
        with_data!(&mut self.data, v => v.read_bytes(bytes, order))
    }

    /// Returns the binary form in `order`.
    #[must_use]
    pub fn to_bytes(&self, order: ByteOrder) -> Vec<u8> {
        with_data!(&self.data, v => v.encode(order))
    }

    /// Writes the binary form into `dst`, truncating to its length. Returns the number of
    /// bytes written.
    pub fn copy(&self, dst: &mut [u8], order: ByteOrder) -> usize {
        let bytes = self.to_bytes(order);
        let count = bytes.len().min(dst.len());
        dst[..count].copy_from_slice(&bytes[..count]);
        count
    }

    fn coerced<T>(&self, result: Option<T>) -> Option<T> {
        self.ok.store(result.is_some(), Ordering::Relaxed);
        result
    }

    fn scalar_at(&self, index: usize) -> Option<Scalar> {
        with_data!(&self.data, v => v.element_scalar(index))
    }

    /// Returns `true` if the most recent coercion succeeded.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.ok.load(Ordering::Relaxed)
    }

    /// Returns the text form of element `index`.
    pub fn to_string_at(&self, index: usize) -> Option<String> {
        self.coerced(with_data!(&self.data, v => v.element_text(index)))
    }

    /// Returns element `index` as an integer.
    pub fn to_int(&self, index: usize) -> Option<i64> {
        self.coerced(self.scalar_at(index).and_then(Scalar::to_int))
    }

    /// Returns element `index` as an unsigned 32-bit integer.
    pub fn to_uint(&self, index: usize) -> Option<u32> {
        self.coerced(
            self.scalar_at(index)
                .and_then(Scalar::to_int)
                .and_then(|value| u32::try_from(value).ok()),
        )
    }

    /// Returns element `index` as a float.
    pub fn to_float(&self, index: usize) -> Option<f64> {
        self.coerced(self.scalar_at(index).and_then(Scalar::to_float))
    }

    /// Returns element `index` as a fraction.
    pub fn to_rational(&self, index: usize) -> Option<(i64, i64)> {
        self.coerced(self.scalar_at(index).and_then(Scalar::to_rational))
    }

    fn xmp_form(&self) -> Option<&XmpForm> {
        match &self.data {
            ValueData::XmpText(v) => Some(&v.form),
            ValueData::XmpArray(v) => Some(&v.form),
            ValueData::LangAlt(v) => Some(&v.form),
            _ => None,
        }
    }

    fn xmp_form_mut(&mut self) -> Result<&mut XmpForm> {
        let type_id = self.type_id();
        match &mut self.data {
            ValueData::XmpText(v) => Ok(&mut v.form),
            ValueData::XmpArray(v) => Ok(&mut v.form),
            ValueData::LangAlt(v) => Ok(&mut v.form),
            _ => Err(Error::UnsupportedType(format!(
                "{type_id} is not an XMP value"
            ))),
        }
    }

    /// Returns the XMP array form, or `None` for non-XMP values.
    #[must_use]
    pub fn xmp_array_type(&self) -> Option<XmpArrayType> {
        self.xmp_form().map(|form| form.array_type)
    }

    /// Sets the XMP array form.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for non-XMP values.
    pub fn set_xmp_array_type(&mut self, array_type: XmpArrayType) -> Result<()> {
        self.xmp_form_mut()?.array_type = array_type;
        Ok(())
    }

    /// Returns the XMP struct form, or `None` for non-XMP values.
    #[must_use]
    pub fn xmp_struct(&self) -> Option<XmpStruct> {
        self.xmp_form().map(|form| form.structure)
    }

    /// Sets the XMP struct form.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for non-XMP values.
    pub fn set_xmp_struct(&mut self, structure: XmpStruct) -> Result<()> {
        self.xmp_form_mut()?.structure = structure;
        Ok(())
    }

    /// Returns the data area of a numeric value; empty for other variants.
    #[must_use]
    pub fn data_area(&self) -> &[u8] {
        match &self.data {
            ValueData::Numeric(v) => &v.data_area,
            _ => &[],
        }
    }

    /// Returns the size of the data area.
    #[must_use]
    pub fn size_data_area(&self) -> usize {
        self.data_area().len()
    }

    /// Replaces the data area of a numeric value.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::FunctionNotSupported`] for other
    /// variants.
    pub fn set_data_area(&mut self, bytes: &[u8]) -> Result<()> {
        let type_name = self.type_name();
        match &mut self.data {
            ValueData::Numeric(v) => {
                v.data_area = bytes.to_vec();
                Ok(())
            }
            _ => Err(native_error!(
                ErrorCode::FunctionNotSupported,
                "{} values have no data area",
                type_name
            )),
        }
    }

    fn not_a_sequence(type_name: &str) -> Error {
        Error::UnsupportedType(format!("{type_name} values are not numeric sequences"))
    }

    /// Returns element `index` of a numeric or raw byte value (negative counts from the
    /// end).
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for other variants and [`Error::Native`] with
    /// [`ErrorCode::OffsetOutOfRange`] for a bad index.
    pub fn get(&self, index: isize) -> Result<Scalar> {
        let type_name = self.type_name();
        match &self.data {
            ValueData::Numeric(v) => v.array.get(index),
            ValueData::Opaque(v) => v.get(index),
            _ => Err(Self::not_a_sequence(type_name)),
        }
    }

    /// Replaces element `index` of a numeric or raw byte value.
    ///
    /// # Errors
    /// As [`Value::get`], plus the range error of `scalar`.
    pub fn set(&mut self, index: isize, scalar: Scalar) -> Result<()> {
        let type_name = self.type_name();
        match &mut self.data {
            ValueData::Numeric(v) => v.array.set(index, scalar),
            ValueData::Opaque(v) => v.set(index, scalar),
            _ => Err(Self::not_a_sequence(type_name)),
        }
    }

    /// Appends an element to a numeric or raw byte value.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedType`] for other variants and the range error of
    /// `scalar`.
    pub fn push(&mut self, scalar: Scalar) -> Result<()> {
        let type_name = self.type_name();
        match &mut self.data {
            ValueData::Numeric(v) => v.array.push(scalar),
            ValueData::Opaque(v) => v.push(scalar),
            _ => Err(Self::not_a_sequence(type_name)),
        }
    }

    /// Removes element `index` of a numeric or raw byte value.
    ///
    /// # Errors
    /// As [`Value::get`].
    pub fn remove(&mut self, index: isize) -> Result<Scalar> {
        let type_name = self.type_name();
        match &mut self.data {
            ValueData::Numeric(v) => v.array.remove(index),
            ValueData::Opaque(v) => v.remove(index),
            _ => Err(Self::not_a_sequence(type_name)),
        }
    }

    /// Returns the numeric variant.
    #[must_use]
    pub fn as_numeric(&self) -> Option<&NumericValue> {
        match &self.data {
            ValueData::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the date variant.
    #[must_use]
    pub fn as_date(&self) -> Option<&DateValue> {
        match &self.data {
            ValueData::Date(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the date variant, mutably.
    pub fn as_date_mut(&mut self) -> Option<&mut DateValue> {
        match &mut self.data {
            ValueData::Date(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the time variant.
    #[must_use]
    pub fn as_time(&self) -> Option<&TimeValue> {
        match &self.data {
            ValueData::Time(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the time variant, mutably.
    pub fn as_time_mut(&mut self) -> Option<&mut TimeValue> {
        match &mut self.data {
            ValueData::Time(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the comment variant.
    #[must_use]
    pub fn as_comment(&self) -> Option<&CommentValue> {
        match &self.data {
            ValueData::Comment(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the language alternative variant.
    #[must_use]
    pub fn as_lang_alt(&self) -> Option<&LangAltValue> {
        match &self.data {
            ValueData::LangAlt(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the language alternative variant, mutably.
    pub fn as_lang_alt_mut(&mut self) -> Option<&mut LangAltValue> {
        match &mut self.data {
            ValueData::LangAlt(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the XMP array variant.
    #[must_use]
    pub fn as_xmp_array(&self) -> Option<&XmpArrayValue> {
        match &self.data {
            ValueData::XmpArray(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the XMP array variant, mutably.
    pub fn as_xmp_array_mut(&mut self) -> Option<&mut XmpArrayValue> {
        match &mut self.data {
            ValueData::XmpArray(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the text of a text, comment or XMP text variant.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            ValueData::Text(v) => Some(&v.text),
            ValueData::Comment(v) => Some(&v.comment),
            ValueData::XmpText(v) => Some(&v.text),
            _ => None,
        }
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Value {
            data: self.data.clone(),
            ok: AtomicBool::new(self.ok()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("data", &self.data)
            .field("ok", &self.ok())
            .finish()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        with_data!(&self.data, v => v.write_text(f))
    }
}

impl From<ValueData> for Value {
    fn from(data: ValueData) -> Self {
        Value::wrap(data)
    }
}

macro_rules! value_from_variant {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::wrap(ValueData::$variant(value))
                }
            }
        )*
    };
}

value_from_variant!(
    TextValue => Text,
    CommentValue => Comment,
    NumericValue => Numeric,
    DateValue => Date,
    TimeValue => Time,
    LangAltValue => LangAlt,
    XmpArrayValue => XmpArray,
    XmpTextValue => XmpText,
    OpaqueValue => Opaque,
);

#[cfg(test)]
mod tests {
    use super::*;

    const CREATABLE: [TypeId; 21] = [
        TypeId::Byte,
        TypeId::Ascii,
        TypeId::Short,
        TypeId::Long,
        TypeId::Rational,
        TypeId::SByte,
        TypeId::Undefined,
        TypeId::SShort,
        TypeId::SLong,
        TypeId::SRational,
        TypeId::Float,
        TypeId::Double,
        TypeId::String,
        TypeId::Date,
        TypeId::Time,
        TypeId::Comment,
        TypeId::XmpText,
        TypeId::XmpAlt,
        TypeId::XmpBag,
        TypeId::XmpSeq,
        TypeId::LangAlt,
    ];

    #[test]
    fn create_every_type() {
        for type_id in CREATABLE {
            let value = Value::create(type_id).unwrap();
            assert_eq!(value.type_id(), type_id);
        }
        for type_id in [TypeId::Ifd, TypeId::Directory, TypeId::Invalid] {
            assert!(matches!(
                Value::create(type_id),
                Err(Error::UnsupportedType(_))
            ));
        }
        assert!(Value::create_raw(0x1234).is_err());
        assert_eq!(Value::create_raw(5).unwrap().type_id(), TypeId::Rational);
    }

    #[test]
    fn text_round_trip_of_defaults() {
        for type_id in CREATABLE {
            let mut value = Value::create(type_id).unwrap();
            let text = value.to_string();
            value.read_str(&text).unwrap();
            assert_eq!(value.to_string(), text, "{type_id}");
        }
    }

    #[test]
    fn type_info() {
        assert_eq!(TypeInfo::type_name(TypeId::Rational), "Rational");
        assert_eq!(TypeInfo::type_id("Rational"), TypeId::Rational);
        assert_eq!(TypeInfo::type_id("Nope"), TypeId::Invalid);
        assert_eq!(TypeInfo::type_size(TypeId::Rational), 8);
        assert_eq!(TypeId::String as u32, 0x10000);
        assert_eq!(TypeId::from_u32(0x10009), Some(TypeId::LangAlt));
    }

    #[test]
    fn ushort_width() {
        assert!(Value::from_scalars(TypeId::Short, &[Scalar::Int(65535)]).is_ok());
        let err = Value::from_scalars(TypeId::Short, &[Scalar::Int(65536)]).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValueTooLarge);
        assert!(Value::from_scalars(TypeId::Rational, &[Scalar::Rational(-1, 2)]).is_err());
    }

    #[test]
    fn coercions_set_ok() {
        let value = Value::numeric(vec![(1_u32, 3_u32)]);
        assert_eq!(value.to_float(0), Some(1.0 / 3.0));
        assert!(value.ok());
        assert_eq!(value.to_int(0), Some(0));
        assert_eq!(value.to_uint(5), None);
        assert!(!value.ok());
        assert_eq!(value.to_string_at(0).as_deref(), Some("1/3"));
        assert!(value.ok());

        let date = Value::date(1970, 1, 1).unwrap();
        assert_eq!(date.to_int(0), Some(0));

        let text = Value::ascii("A");
        assert_eq!(text.to_int(0), Some(65));
        assert_eq!(text.to_int(1), None);
        assert!(!text.ok());

        let xmp = Value::xmp_array(XmpArrayType::Bag, ["123.45", "fred"]);
        assert_eq!(xmp.to_float(0), Some(123.45));
        assert_eq!(xmp.to_rational(0), Some((2469, 20)));
        assert_eq!(xmp.to_float(1), None);
    }

    #[test]
    fn negative_coercions() {
        let value = Value::numeric(vec![-4_i32]);
        assert_eq!(value.to_int(0), Some(-4));
        assert_eq!(value.to_uint(0), None);
        assert!(!value.ok());
        assert_eq!(Scalar::Float(-0.5).to_rational(), Some((-1, 2)));
        assert_eq!(Scalar::Rational(1, 0).to_float(), None);
        assert_eq!(Scalar::Rational(7, 0).to_int(), None);
    }

    #[test]
    fn binary_copy_truncates() {
        let value = Value::numeric(vec![0x0102_u16, 0x0304]);
        let mut buf = [0_u8; 3];
        assert_eq!(value.copy(&mut buf, ByteOrder::Big), 3);
        assert_eq!(buf, [0x01, 0x02, 0x03]);
        assert_eq!(value.size(), 4);

        let mut decoded = Value::create(TypeId::Short).unwrap();
        decoded
            .read_bytes(&value.to_bytes(ByteOrder::Little), ByteOrder::Little)
            .unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn xmp_form() {
        let mut value = Value::xmp_text("abc");
        assert_eq!(value.xmp_array_type(), Some(XmpArrayType::None));
        value.set_xmp_struct(XmpStruct::Struct).unwrap();
        assert_eq!(value.xmp_struct(), Some(XmpStruct::Struct));

        let mut ascii = Value::ascii("abc");
        assert_eq!(ascii.xmp_array_type(), None);
        assert!(ascii.set_xmp_array_type(XmpArrayType::Seq).is_err());

        let seq = Value::create(TypeId::XmpSeq).unwrap();
        assert_eq!(seq.xmp_array_type(), Some(XmpArrayType::Seq));
    }

    #[test]
    fn data_area_only_on_numeric() {
        let mut value = Value::numeric(vec![1_u32]);
        value.set_data_area(b"area").unwrap();
        assert_eq!(value.data_area(), b"area");
        assert_eq!(value.size_data_area(), 4);

        let mut text = Value::ascii("x");
        let err = text.set_data_area(b"area").unwrap_err();
        assert_eq!(err.code(), ErrorCode::FunctionNotSupported);
        assert!(text.data_area().is_empty());
    }

    #[test]
    fn sequences() {
        let mut value = Value::numeric(vec![4_u16, 6, 9]);
        assert_eq!(value.get(-1).unwrap(), Scalar::Int(9));
        value.set(0, Scalar::Int(1)).unwrap();
        value.push(Scalar::Int(2)).unwrap();
        assert_eq!(value.remove(1).unwrap(), Scalar::Int(6));
        assert_eq!(value.to_string(), "1 9 2");
        assert!(Value::ascii("x").get(0).is_err());
    }

    #[test]
    fn clone_is_deep() {
        let original = Value::lang_alt([("x-default", "a")]);
        let mut copy = original.clone();
        copy.as_lang_alt_mut().unwrap().insert("de-DE", "b");
        assert_eq!(original.count(), 1);
        assert_eq!(copy.count(), 2);
    }

    #[test]
    fn parse_numbers() {
        assert_eq!(parse_number("12"), Some(Scalar::Int(12)));
        assert_eq!(parse_number(" 3/4 "), Some(Scalar::Rational(3, 4)));
        assert_eq!(parse_number("1.5"), Some(Scalar::Float(1.5)));
        assert_eq!(parse_number("nan"), None);
        assert_eq!(parse_number("x/2"), None);
    }
}
