//! Metadata keys of the form `Family.Group.Tag`.
//!
//! A [`Key`] is parsed once, validated against the tag dictionaries in [`crate::tags`],
//! and from then on is an immutable, cheaply cloned handle. Names are normalised on the
//! way in: an Exif tag given by number resolves to its dictionary name when there is one
//! (`Exif.Image.0x010e` becomes `Exif.Image.ImageDescription`), and tags without a name are
//! spelt as four hex digits.
//!
//! # Examples
//!
//! ```rust
//! use metabind::{Key, KeyFamily, TypeId};
//!
//! let key: Key = "Iptc.Application2.Caption".parse()?;
//! assert_eq!(key.family(), KeyFamily::Iptc);
//! assert_eq!(key.record(), 2);
//! assert_eq!(key.tag(), 120);
//! assert_eq!(key.default_type_id(), TypeId::String);
//!
//! let key = Key::exif(0x010e, "Image")?;
//! assert_eq!(key.to_string(), "Exif.Image.ImageDescription");
//! # Ok::<(), metabind::Error>(())
//! ```

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
    sync::Arc,
};

use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    tags::{DataSet, ExifTags, IptcDataSets, TagInfo, XmpProperties, XmpPropertyInfo},
    value::TypeId,
    Error, ErrorCode, Result,
};

/// The metadata family a key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum KeyFamily {
    /// Exif tags
    Exif,
    /// IPTC datasets
    Iptc,
    /// XMP properties
    Xmp,
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Exif(Option<&'static TagInfo>),
    Iptc(Option<&'static DataSet>),
    Xmp(Option<&'static XmpPropertyInfo>),
}

#[derive(Debug)]
struct KeyParts {
    key: String,
    group: String,
    tag_name: String,
    tag: u16,
    record: u16,
    entry: Entry,
}

/// A parsed metadata key.
///
/// Equality, ordering and hashing use the key string only; [`Key::idx`] is a free-form
/// ordinal carried along for callers.
#[derive(Debug, Clone)]
pub struct Key {
    parts: Arc<KeyParts>,
    idx: i32,
}

fn invalid_key(text: &str) -> Error {
    native_error!(ErrorCode::InvalidKey, "Invalid key '{}'", text)
}

fn parse_hex(text: &str) -> Option<u16> {
    let digits = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))?;
    if digits.is_empty() || digits.len() > 4 {
        return None;
    }
    u16::from_str_radix(digits, 16).ok()
}

fn hex_name(number: u16) -> String {
    format!("0x{number:04x}")
}

impl Key {
    fn build(
        family: KeyFamily,
        group: String,
        tag_name: String,
        tag: u16,
        record: u16,
        entry: Entry,
    ) -> Key {
        Key {
            parts: Arc::new(KeyParts {
                key: format!("{family}.{group}.{tag_name}"),
                group,
                tag_name,
                tag,
                record,
                entry,
            }),
            idx: 0,
        }
    }

    /// Parses a key string.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::InvalidKey`] for malformed keys and
    /// unknown Exif groups, [`ErrorCode::InvalidTag`] for unknown Exif tag names,
    /// [`ErrorCode::InvalidRecord`] and [`ErrorCode::InvalidDataset`] for unknown IPTC
    /// records and datasets, and [`ErrorCode::NoNamespaceInfoForXmpPrefix`] for
    /// unregistered XMP prefixes.
    pub fn parse(text: &str) -> Result<Key> {
        let (family, rest) = text.split_once('.').ok_or_else(|| invalid_key(text))?;
        let (group, tag) = rest.split_once('.').ok_or_else(|| invalid_key(text))?;
        if group.is_empty() || tag.is_empty() {
            return Err(invalid_key(text));
        }

        match family.parse::<KeyFamily>() {
            Ok(KeyFamily::Exif) => Self::parse_exif(text, group, tag),
            Ok(KeyFamily::Iptc) => Self::parse_iptc(group, tag),
            Ok(KeyFamily::Xmp) => Self::xmp(group, tag),
            Err(_) => Err(invalid_key(text)),
        }
    }

    fn parse_exif(text: &str, group: &str, tag_name: &str) -> Result<Key> {
        if !ExifTags::is_exif_group(group) {
            return Err(invalid_key(text));
        }

        if let Some(info) = ExifTags::tag_by_name(group, tag_name) {
            return Ok(Self::build(
                KeyFamily::Exif,
                group.to_string(),
                info.name.to_string(),
                info.tag,
                0,
                Entry::Exif(Some(info)),
            ));
        }

        match parse_hex(tag_name) {
            Some(tag) => Self::exif(tag, group),
            None => Err(native_error!(
                ErrorCode::InvalidTag,
                "Invalid tag name '{}', group '{}'",
                tag_name,
                group
            )),
        }
    }

    fn parse_iptc(record_name: &str, dataset_name: &str) -> Result<Key> {
        let record = IptcDataSets::record_id(record_name)
            .or_else(|| parse_hex(record_name))
            .ok_or_else(|| {
                native_error!(
                    ErrorCode::InvalidRecord,
                    "Invalid record name '{}'",
                    record_name
                )
            })?;

        let number = IptcDataSets::data_set(dataset_name, record)
            .or_else(|| parse_hex(dataset_name))
            .ok_or_else(|| {
                native_error!(
                    ErrorCode::InvalidDataset,
                    "Invalid dataset name '{}'",
                    dataset_name
                )
            })?;

        Ok(Self::iptc(number, record))
    }

    /// Creates an Exif key from a tag number and a group name.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::InvalidKey`] for unknown groups.
    pub fn exif(tag: u16, group: &str) -> Result<Key> {
        if !ExifTags::is_exif_group(group) {
            return Err(invalid_key(&format!("Exif.{group}.{}", hex_name(tag))));
        }

        let info = ExifTags::tag_by_id(group, tag);
        let tag_name = info.map_or_else(|| hex_name(tag), |info| info.name.to_string());
        Ok(Self::build(
            KeyFamily::Exif,
            group.to_string(),
            tag_name,
            tag,
            0,
            Entry::Exif(info),
        ))
    }

    /// Creates an IPTC key from a dataset and a record number.
    #[must_use]
    pub fn iptc(dataset: u16, record: u16) -> Key {
        let group = IptcDataSets::record_name(record)
            .map_or_else(|| hex_name(record), str::to_string);
        let info = IptcDataSets::data_set_info(dataset, record);
        let tag_name = info.map_or_else(|| hex_name(dataset), |info| info.name.to_string());
        Self::build(
            KeyFamily::Iptc,
            group,
            tag_name,
            dataset,
            record,
            Entry::Iptc(info),
        )
    }

    /// Creates an XMP key from a namespace prefix and a property path.
    ///
    /// # Errors
    /// Returns [`Error::Native`] with [`ErrorCode::NoNamespaceInfoForXmpPrefix`] if no
    /// namespace is registered for `prefix`, and [`ErrorCode::InvalidKey`] for an empty
    /// property.
    pub fn xmp(prefix: &str, property: &str) -> Result<Key> {
        if XmpProperties::ns(prefix).is_none() {
            return Err(native_error!(
                ErrorCode::NoNamespaceInfoForXmpPrefix,
                "No namespace info available for XMP prefix '{}'",
                prefix
            ));
        }
        if property.is_empty() || property.contains(char::is_whitespace) {
            return Err(invalid_key(&format!("Xmp.{prefix}.{property}")));
        }

        let info = if property.contains(['[', '/']) {
            None
        } else {
            XmpProperties::property_info(prefix, property)
        };
        Ok(Self::build(
            KeyFamily::Xmp,
            prefix.to_string(),
            property.to_string(),
            0,
            0,
            Entry::Xmp(info),
        ))
    }

    /// Returns the full key string.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.parts.key
    }

    /// Returns the family.
    #[must_use]
    pub fn family(&self) -> KeyFamily {
        match self.parts.entry {
            Entry::Exif(_) => KeyFamily::Exif,
            Entry::Iptc(_) => KeyFamily::Iptc,
            Entry::Xmp(_) => KeyFamily::Xmp,
        }
    }

    /// Returns the family name: `Exif`, `Iptc` or `Xmp`.
    #[must_use]
    pub fn family_name(&self) -> &'static str {
        self.family().into()
    }

    /// Returns the group: Exif IFD group, IPTC record name or XMP prefix.
    #[must_use]
    pub fn group_name(&self) -> &str {
        &self.parts.group
    }

    /// Returns the tag name, or the XMP property path.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.parts.tag_name
    }

    /// Returns the tag or dataset number; `0` for XMP keys.
    #[must_use]
    pub fn tag(&self) -> u16 {
        self.parts.tag
    }

    /// Returns the IPTC record number; `0` for other families.
    #[must_use]
    pub fn record(&self) -> u16 {
        self.parts.record
    }

    /// Returns the IPTC record name, or `None` for other families.
    #[must_use]
    pub fn record_name(&self) -> Option<&str> {
        matches!(self.parts.entry, Entry::Iptc(_)).then_some(self.parts.group.as_str())
    }

    /// Returns the ordinal attached to this key.
    #[must_use]
    pub fn idx(&self) -> i32 {
        self.idx
    }

    /// Attaches an ordinal to this key.
    pub fn set_idx(&mut self, idx: i32) {
        self.idx = idx;
    }

    /// Returns the value type a datum of this key gets by default.
    #[must_use]
    pub fn default_type_id(&self) -> TypeId {
        match self.parts.entry {
            Entry::Exif(info) => info.map_or(TypeId::Ascii, |info| info.type_id),
            Entry::Iptc(info) => info.map_or(TypeId::String, |info| info.type_id),
            Entry::Xmp(info) => info.map_or(TypeId::XmpText, |info| info.type_id),
        }
    }

    /// Returns the human readable label.
    ///
    /// Tags missing from the dictionary have an empty label, except XMP properties, which
    /// fall back to the property path.
    #[must_use]
    pub fn tag_label(&self) -> String {
        match self.parts.entry {
            Entry::Exif(info) => info.map(|info| info.title).unwrap_or_default().to_string(),
            Entry::Iptc(info) => info.map(|info| info.title).unwrap_or_default().to_string(),
            Entry::Xmp(info) => info.map_or_else(|| self.parts.tag_name.clone(), |info| info.title.to_string()),
        }
    }

    /// Returns the dictionary description, empty if unknown.
    #[must_use]
    pub fn tag_desc(&self) -> &'static str {
        match self.parts.entry {
            Entry::Exif(info) => info.map(|info| info.desc),
            Entry::Iptc(info) => info.map(|info| info.desc),
            Entry::Xmp(info) => info.map(|info| info.desc),
        }
        .unwrap_or_default()
    }

    /// Returns the section name of a known Exif tag.
    #[must_use]
    pub fn section_name(&self) -> Option<&'static str> {
        match self.parts.entry {
            Entry::Exif(Some(info)) => Some(info.section.into()),
            _ => None,
        }
    }

    /// Returns the namespace URI of an XMP key.
    #[must_use]
    pub fn ns(&self) -> Option<String> {
        match self.parts.entry {
            Entry::Xmp(_) => XmpProperties::ns(&self.parts.group),
            _ => None,
        }
    }

    /// Returns the Exif dictionary entry.
    #[must_use]
    pub fn tag_info(&self) -> Option<&'static TagInfo> {
        match self.parts.entry {
            Entry::Exif(info) => info,
            _ => None,
        }
    }

    /// Returns the IPTC dictionary entry.
    #[must_use]
    pub fn data_set(&self) -> Option<&'static DataSet> {
        match self.parts.entry {
            Entry::Iptc(info) => info,
            _ => None,
        }
    }

    /// Returns the XMP dictionary entry.
    #[must_use]
    pub fn property_info(&self) -> Option<&'static XmpPropertyInfo> {
        match self.parts.entry {
            Entry::Xmp(info) => info,
            _ => None,
        }
    }

    /// Returns `true` if this key is `root` or a child of it (`root[n]...` or `root/...`).
    #[must_use]
    pub fn in_family_of(&self, root: &Key) -> bool {
        let (key, root) = (self.key(), root.key());
        match key.strip_prefix(root) {
            Some(rest) => rest.is_empty() || rest.starts_with(['[', '/']),
            None => false,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.key)
    }
}

impl FromStr for Key {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        Key::parse(text)
    }
}

impl TryFrom<&str> for Key {
    type Error = Error;

    fn try_from(text: &str) -> Result<Self> {
        Key::parse(text)
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.parts.key == other.parts.key
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.key.hash(state);
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.key.cmp(&other.parts.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exif_key() {
        let mut key = Key::parse("Exif.Image.ImageDescription").unwrap();
        assert_eq!(key.family_name(), "Exif");
        assert_eq!(key.group_name(), "Image");
        assert_eq!(key.tag_name(), "ImageDescription");
        assert_eq!(key.tag(), 270);
        assert_eq!(key.default_type_id(), TypeId::Ascii);
        assert_eq!(key.tag_label(), "Image Description");
        assert_eq!(key.section_name(), Some("OtherTags"));
        assert!(key.tag_desc().starts_with("A character string giving the title"));

        assert_eq!(key.idx(), 0);
        key.set_idx(123);
        assert_eq!(key.idx(), 123);
        assert_eq!(key, Key::exif(270, "Image").unwrap());
    }

    #[test]
    fn exif_hex_tags() {
        let key = Key::parse("Exif.Image.0x010e").unwrap();
        assert_eq!(key.key(), "Exif.Image.ImageDescription");

        let key = Key::parse("Exif.Photo.0xABCD").unwrap();
        assert_eq!(key.key(), "Exif.Photo.0xabcd");
        assert_eq!(key.tag(), 0xabcd);
        assert_eq!(key.tag_label(), "");
        assert_eq!(key.section_name(), None);
    }

    #[test]
    fn invalid_keys() {
        let code = |text: &str| Key::parse(text).unwrap_err().code();
        assert_eq!(code("Exif.Nowhere.Model"), ErrorCode::InvalidKey);
        assert_eq!(code("Exif.Image"), ErrorCode::InvalidKey);
        assert_eq!(code("Exif..Model"), ErrorCode::InvalidKey);
        assert_eq!(code("Foo.Image.Model"), ErrorCode::InvalidKey);
        assert_eq!(code("Exif.Image.NoSuchTag"), ErrorCode::InvalidTag);
        assert_eq!(code("Iptc.Nowhere.Caption"), ErrorCode::InvalidRecord);
        assert_eq!(code("Iptc.Application2.NoSuchSet"), ErrorCode::InvalidDataset);
        assert_eq!(code("Xmp.nope.Thing"), ErrorCode::NoNamespaceInfoForXmpPrefix);
        assert!(matches!(
            Key::parse("Xmp.dc.bad name"),
            Err(Error::Native { code: ErrorCode::InvalidKey, .. })
        ));
    }

    #[test]
    fn iptc_key() {
        let key = Key::parse("Iptc.Application2.Caption").unwrap();
        assert_eq!(key.record(), 2);
        assert_eq!(key.record_name(), Some("Application2"));
        assert_eq!(key.tag(), 120);
        assert_eq!(key.tag_label(), "Caption");
        assert_eq!(Key::iptc(key.tag(), key.record()).key(), "Iptc.Application2.Caption");
        assert_eq!(Key::iptc(200, 2).key(), "Iptc.Application2.0x00c8");
        assert_eq!(Key::parse("Iptc.Application2.0x00c8").unwrap().tag(), 200);
    }

    #[test]
    fn xmp_key() {
        let key = Key::parse("Xmp.dc.description").unwrap();
        assert_eq!(key.tag(), 0);
        assert_eq!(key.default_type_id(), TypeId::LangAlt);
        assert_eq!(key.tag_label(), "Description");
        assert_eq!(key.ns().as_deref(), Some("http://purl.org/dc/elements/1.1/"));

        let city = Key::parse("Xmp.iptcExt.LocationCreated[1]/Iptc4xmpExt:City").unwrap();
        assert_eq!(city.group_name(), "iptcExt");
        assert_eq!(city.tag_name(), "LocationCreated[1]/Iptc4xmpExt:City");
        assert_eq!(city.default_type_id(), TypeId::XmpText);

        let root = Key::parse("Xmp.iptcExt.LocationCreated").unwrap();
        assert!(city.in_family_of(&root));
        assert!(root.in_family_of(&root));
        let other = Key::parse("Xmp.iptcExt.LocationCreatedX").unwrap();
        assert!(!other.in_family_of(&root));

        let unknown = Key::parse("Xmp.xmp.SomethingNew").unwrap();
        assert_eq!(unknown.default_type_id(), TypeId::XmpText);
        assert_eq!(unknown.tag_label(), "SomethingNew");
    }

    #[test]
    fn clones_share_parts() {
        let key = Key::parse("Exif.Image.Make").unwrap();
        let copy = key.clone();
        assert!(Arc::ptr_eq(&key.parts, &copy.parts));
        assert_eq!(copy.to_string(), "Exif.Image.Make");
        assert!(key < Key::parse("Exif.Image.Model").unwrap());
    }
}
