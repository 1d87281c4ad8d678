//! XMP property values: simple text, arrays and language alternatives.

use std::fmt;

use indexmap::IndexMap;
use strum::{Display, EnumString};

use super::{numeric::resolve_index, parse_number, Scalar, TypeId, ValueCodec};
use crate::{io::ByteOrder, ErrorCode, Result};

/// The default language of a language alternative.
pub const X_DEFAULT: &str = "x-default";

/// Array form of an XMP property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum XmpArrayType {
    /// Not an array
    #[default]
    None,
    /// `rdf:Alt`
    Alt,
    /// `rdf:Bag`
    Bag,
    /// `rdf:Seq`
    Seq,
}

impl XmpArrayType {
    /// Returns the RDF container element name, if this is an array.
    #[must_use]
    pub fn rdf_name(self) -> Option<&'static str> {
        match self {
            XmpArrayType::None => None,
            XmpArrayType::Alt => Some("rdf:Alt"),
            XmpArrayType::Bag => Some("rdf:Bag"),
            XmpArrayType::Seq => Some("rdf:Seq"),
        }
    }

    /// Returns the value type of an array of this form.
    #[must_use]
    pub fn type_id(self) -> TypeId {
        match self {
            XmpArrayType::None => TypeId::XmpText,
            XmpArrayType::Alt => TypeId::XmpAlt,
            XmpArrayType::Bag => TypeId::XmpBag,
            XmpArrayType::Seq => TypeId::XmpSeq,
        }
    }
}

/// Struct form of an XMP property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
pub enum XmpStruct {
    /// Not a struct
    #[default]
    None,
    /// A struct container
    Struct,
}

/// Form attributes every XMP value carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct XmpForm {
    /// Array form
    pub array_type: XmpArrayType,
    /// Struct form
    pub structure: XmpStruct,
}

/// A simple XMP text property.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmpTextValue {
    /// The text
    pub text: String,
    /// Form attributes
    pub form: XmpForm,
}

impl XmpTextValue {
    /// Creates a text property.
    pub fn new(text: impl Into<String>) -> Self {
        XmpTextValue {
            text: text.into(),
            form: XmpForm::default(),
        }
    }
}

impl ValueCodec for XmpTextValue {
    fn type_id(&self) -> TypeId {
        TypeId::XmpText
    }

    fn count(&self) -> usize {
        self.text.len()
    }

    fn read_str(&mut self, text: &str) -> Result<()> {
        self.text = text.to_string();
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], _order: ByteOrder) -> Result<()> {
        self.text = String::from_utf8_lossy(bytes).into_owned();
        Ok(())
    }

    fn encode(&self, _order: ByteOrder) -> Vec<u8> {
        self.text.as_bytes().to_vec()
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }

    fn element_text(&self, _index: usize) -> Option<String> {
        Some(self.text.clone())
    }

    fn element_scalar(&self, _index: usize) -> Option<Scalar> {
        parse_number(&self.text)
    }
}

/// An ordered XMP array (`Seq`, `Bag` or `Alt`) of text items.
///
/// The text form joins the items with `", "`. Reading text replaces the items with the
/// `", "`-separated parts of the input, so an item that itself contains `", "` does not
/// survive a trip through the text form. Build such arrays with [`Self::with_items`] or
/// [`Self::push`]; XMP packets keep each item as its own `rdf:li`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmpArrayValue {
    /// Array kind; never [`XmpArrayType::None`]
    kind: XmpArrayType,
    /// The items
    pub items: Vec<String>,
    /// Form attributes
    pub form: XmpForm,
}

impl XmpArrayValue {
    /// Creates an empty array. [`XmpArrayType::None`] is taken as `Bag`.
    #[must_use]
    pub fn new(kind: XmpArrayType) -> Self {
        let kind = match kind {
            XmpArrayType::None => XmpArrayType::Bag,
            other => other,
        };
        XmpArrayValue {
            kind,
            items: Vec::new(),
            form: XmpForm {
                array_type: kind,
                structure: XmpStruct::None,
            },
        }
    }

    /// Creates an array holding `items`.
    pub fn with_items<I, S>(kind: XmpArrayType, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut value = Self::new(kind);
        value.items = items.into_iter().map(Into::into).collect();
        value
    }

    /// Returns the array kind.
    #[must_use]
    pub fn kind(&self) -> XmpArrayType {
        self.kind
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if the array has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the item at `index` (negative counts from the end).
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::OffsetOutOfRange`] for a bad index.
    pub fn get(&self, index: isize) -> Result<&str> {
        let index = resolve_index(index, self.items.len())?;
        Ok(&self.items[index])
    }

    /// Replaces the item at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::OffsetOutOfRange`] for a bad index.
    pub fn set(&mut self, index: isize, item: impl Into<String>) -> Result<()> {
        let index = resolve_index(index, self.items.len())?;
        self.items[index] = item.into();
        Ok(())
    }

    /// Appends an item.
    pub fn push(&mut self, item: impl Into<String>) {
        self.items.push(item.into());
    }

    /// Removes and returns the item at `index`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::OffsetOutOfRange`] for a bad index.
    pub fn remove(&mut self, index: isize) -> Result<String> {
        let index = resolve_index(index, self.items.len())?;
        Ok(self.items.remove(index))
    }
}

impl ValueCodec for XmpArrayValue {
    fn type_id(&self) -> TypeId {
        self.kind.type_id()
    }

    fn count(&self) -> usize {
        self.items.len()
    }

    /// Splits on every `", "`; there is no escape for an item containing the separator.
    fn read_str(&mut self, text: &str) -> Result<()> {
        self.items = if text.is_empty() {
            Vec::new()
        } else {
            text.split(", ").map(str::to_string).collect()
        };
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], _order: ByteOrder) -> Result<()> {
        self.read_str(&String::from_utf8_lossy(bytes))
    }

    fn encode(&self, _order: ByteOrder) -> Vec<u8> {
        self.items.join(", ").into_bytes()
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.items.join(", "))
    }

    fn element_text(&self, index: usize) -> Option<String> {
        self.items.get(index).cloned()
    }

    fn element_scalar(&self, index: usize) -> Option<Scalar> {
        self.items.get(index).and_then(|item| parse_number(item))
    }
}

/// A language alternative: language tag to text.
///
/// Tags are unique. `x-default` is matched case-insensitively, stored in its canonical
/// spelling, and always kept first. The text form is
/// `lang="x-default" text, lang="en-GB" text`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LangAltValue {
    entries: IndexMap<String, String>,
    /// Form attributes
    pub form: XmpForm,
}

fn canonical(lang: &str) -> &str {
    if lang.eq_ignore_ascii_case(X_DEFAULT) {
        X_DEFAULT
    } else {
        lang
    }
}

fn lang_alt_error(text: &str) -> crate::Error {
    parse_error!(
        code: ErrorCode::InvalidLangAltValue,
        "Invalid LangAlt value '{}'",
        text
    )
}

impl LangAltValue {
    /// Creates an empty language alternative.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a language alternative holding `entries`.
    pub fn with_entries<I, L, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (L, T)>,
        L: AsRef<str>,
        T: Into<String>,
    {
        let mut value = Self::new();
        for (lang, text) in entries {
            value.insert(lang.as_ref(), text);
        }
        value
    }

    /// Returns the number of languages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no language is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `lang` is present.
    #[must_use]
    pub fn contains(&self, lang: &str) -> bool {
        self.entries.contains_key(canonical(lang))
    }

    /// Returns the text for `lang`.
    #[must_use]
    pub fn get(&self, lang: &str) -> Option<&str> {
        self.entries.get(canonical(lang)).map(String::as_str)
    }

    /// Sets the text for `lang`, returning the previous text.
    pub fn insert(&mut self, lang: &str, text: impl Into<String>) -> Option<String> {
        let lang = canonical(lang);
        let previous = self.entries.insert(lang.to_string(), text.into());
        if lang == X_DEFAULT {
            if let Some(index) = self.entries.get_index_of(X_DEFAULT) {
                self.entries.move_index(index, 0);
            }
        }
        previous
    }

    /// Removes `lang`, keeping the order of the remaining languages.
    pub fn remove(&mut self, lang: &str) -> Option<String> {
        self.entries.shift_remove(canonical(lang))
    }

    /// Returns the language tags in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the texts in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(String::as_str)
    }

    /// Returns `(lang, text)` pairs in order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(lang, text)| (lang.as_str(), text.as_str()))
    }

    /// Parses `lang="tag" text` segments separated by `", "`.
    fn parse(text: &str) -> Result<IndexMap<String, String>> {
        let mut parsed = LangAltValue::new();
        if text.is_empty() {
            return Ok(parsed.entries);
        }

        if !text.starts_with("lang=") {
            parsed.insert(X_DEFAULT, text);
            return Ok(parsed.entries);
        }

        let mut rest = text;
        while !rest.is_empty() {
            let Some(tagged) = rest.strip_prefix("lang=") else {
                return Err(lang_alt_error(text));
            };

            let (lang, after) = match tagged.strip_prefix('"') {
                Some(quoted) => quoted.split_once('"').ok_or_else(|| lang_alt_error(text))?,
                None => tagged.split_once(' ').unwrap_or((tagged, "")),
            };
            if lang.is_empty() || lang.contains(char::is_whitespace) {
                return Err(lang_alt_error(text));
            }
            let after = after.strip_prefix(' ').unwrap_or(after);

            let (value, next) = match after.find(", lang=") {
                Some(pos) => (&after[..pos], &after[pos + 2..]),
                None => (after, ""),
            };
            parsed.insert(lang, value);
            rest = next;
        }

        Ok(parsed.entries)
    }
}

impl ValueCodec for LangAltValue {
    fn type_id(&self) -> TypeId {
        TypeId::LangAlt
    }

    fn count(&self) -> usize {
        self.entries.len()
    }

    fn read_str(&mut self, text: &str) -> Result<()> {
        self.entries = Self::parse(text)?;
        Ok(())
    }

    fn read_bytes(&mut self, bytes: &[u8], _order: ByteOrder) -> Result<()> {
        self.read_str(&String::from_utf8_lossy(bytes))
    }

    fn encode(&self, _order: ByteOrder) -> Vec<u8> {
        super::TextForm(self).to_string().into_bytes()
    }

    fn write_text(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (lang, text)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "lang=\"{lang}\" {text}")?;
        }
        Ok(())
    }

    fn element_text(&self, index: usize) -> Option<String> {
        self.entries.get_index(index).map(|(_, text)| text.clone())
    }

    fn element_scalar(&self, _index: usize) -> Option<Scalar> {
        None
    }
}
