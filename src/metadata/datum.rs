//! A single key/value metadata entry.

use std::fmt;

use crate::{
    io::ByteOrder,
    key::{Key, KeyFamily},
    value::{TypeId, TypeInfo, Value},
    ErrorCode, Result,
};

/// A `(Key, Value)` pair plus the dictionary facts about its key.
///
/// A datum copied out of a container is independent of it. `Display` writes the value's
/// text form; [`Datum::print`] prefixes it with the key.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    key: Key,
    value: Value,
}

impl Datum {
    /// Creates a datum.
    #[must_use]
    pub fn new(key: Key, value: Value) -> Self {
        Datum { key, value }
    }

    /// Creates a datum holding a default value of the key's default type.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedType`] if the default type cannot be instantiated.
    pub fn with_key(key: Key) -> Result<Self> {
        let value = Value::create(key.default_type_id())?;
        Ok(Datum { key, value })
    }

    /// Returns the key.
    #[must_use]
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Returns the value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Returns the value, mutably.
    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Replaces the value.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Reads `text` into the current value.
    ///
    /// # Errors
    /// Returns the parse error of the value; the value is left unchanged.
    pub fn set_str(&mut self, text: &str) -> Result<()> {
        self.value.read_str(text)
    }

    /// Splits the datum into its key and value.
    #[must_use]
    pub fn into_parts(self) -> (Key, Value) {
        (self.key, self.value)
    }

    /// Returns the family name of the key.
    #[must_use]
    pub fn family_name(&self) -> &'static str {
        self.key.family_name()
    }

    /// Returns the group name of the key.
    #[must_use]
    pub fn group_name(&self) -> &str {
        self.key.group_name()
    }

    /// Returns the tag name of the key.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        self.key.tag_name()
    }

    /// Returns the tag number; `0` for XMP.
    #[must_use]
    pub fn tag(&self) -> u16 {
        self.key.tag()
    }

    /// Returns the ordinal of the key.
    #[must_use]
    pub fn idx(&self) -> i32 {
        self.key.idx()
    }

    /// Returns the human readable label of the key.
    #[must_use]
    pub fn tag_label(&self) -> String {
        self.key.tag_label()
    }

    /// Returns the dictionary description of the key.
    #[must_use]
    pub fn tag_desc(&self) -> &'static str {
        self.key.tag_desc()
    }

    /// Returns the Exif section name.
    #[must_use]
    pub fn section_name(&self) -> Option<&'static str> {
        self.key.section_name()
    }

    /// Returns the type of the value.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.value.type_id()
    }

    /// Returns the type name of the value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.value.type_name()
    }

    /// Returns the element size of the value type.
    #[must_use]
    pub fn type_size(&self) -> usize {
        TypeInfo::type_size(self.value.type_id())
    }

    /// Returns the element count of the value.
    #[must_use]
    pub fn count(&self) -> usize {
        self.value.count()
    }

    /// Returns the encoded size of the value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.value.size()
    }

    /// Returns the text form of element `index` of the value.
    #[must_use]
    pub fn to_string_at(&self, index: usize) -> Option<String> {
        self.value.to_string_at(index)
    }

    /// Returns `key: value`.
    #[must_use]
    pub fn print(&self) -> String {
        format!("{}: {}", self.key, self.value)
    }

    /// Writes the binary encoding of the value into `dst`, truncating to its length.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::FunctionNotSupported`] for XMP
    /// properties, which have no binary encoding.
    pub fn copy(&self, dst: &mut [u8], order: ByteOrder) -> Result<usize> {
        if self.key.family() == KeyFamily::Xmp {
            return Err(native_error!(
                ErrorCode::FunctionNotSupported,
                "Xmpdatum::copy is not supported ({})",
                self.key
            ));
        }
        Ok(self.value.copy(dst, order))
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}
