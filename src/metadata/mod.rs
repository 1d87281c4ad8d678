//! Ordered, duplicate-key metadata containers.
//!
//! A [`Metadata`] container holds the [`Datum`] entries of one family in insertion order.
//! Keys may repeat (`Iptc.Application2.Keywords` usually does). The entries live in a
//! store shared with every handle taken from the container:
//!
//! - [`Cursor`] - a forward position, also usable as an [`Iterator`]
//! - [`DatumRef`] - a live reference to one entry
//! - [`ValueRef`] - a live reference to one entry's value, which can hand out a
//!   [`crate::View`] over the value's data area
//!
//! Handles keep the store alive after the container is dropped, and register an ownership
//! edge in the container's [`Tracker`] for as long as they live. Structural changes
//! (insert, erase, clear) bump the store's generation; handles taken before the change fail
//! with [`crate::Error::InvalidHandle`] afterwards. Sorting and in-place value updates keep
//! handles valid.
//!
//! # Examples
//!
//! ```rust
//! use metabind::{ExifData, Value};
//!
//! let mut exif = ExifData::new();
//! exif.add("Exif.Image.Make".parse()?, Value::ascii("Acme"))?;
//! exif.add("Exif.Image.Model".parse()?, Value::ascii("X100"))?;
//!
//! let pos = exif.find_key(&"Exif.Image.Model".parse()?);
//! let next = exif.erase(&pos)?;
//! assert!(next.is_end());
//! assert_eq!(exif.len(), 1);
//! assert!(exif.find_key(&"Exif.Image.Model".parse()?).is_end());
//! # Ok::<(), metabind::Error>(())
//! ```

mod cursor;
mod datum;
mod handle;
mod store;

pub use cursor::{Cursor, Position};
pub use datum::Datum;
pub use handle::{DatumRef, ValueRef};

use std::{
    cmp::Ordering,
    fmt,
    marker::PhantomData,
    sync::Arc,
};

use crate::{
    diagnostics::{self, DiagnosticCategory},
    key::{Key, KeyFamily},
    ownership::{Anchor, ObjectId, Tracker},
    tags::IptcDataSets,
    value::Value,
    ErrorCode, Result,
};

use cursor::foreign;
use store::{SharedStore, Slot, Store};

/// A metadata family: the key family a container accepts plus its per-family state.
pub trait Family: fmt::Debug + Send + Sync + 'static {
    /// The key family of the entries.
    const FAMILY: KeyFamily;

    /// Extra state carried by containers of this family.
    type State: Default + Clone + fmt::Debug + Send + Sync;

    /// Validates an entry about to be appended to `entries`.
    ///
    /// # Errors
    /// Returns the reason the entry is rejected.
    fn check_add(_entries: &[Datum], _datum: &Datum) -> Result<()> {
        Ok(())
    }
}

/// Exif tags.
#[derive(Debug, Clone, Copy)]
pub struct ExifFamily;

impl Family for ExifFamily {
    const FAMILY: KeyFamily = KeyFamily::Exif;
    type State = ();
}

/// IPTC datasets.
#[derive(Debug, Clone, Copy)]
pub struct IptcFamily;

impl Family for IptcFamily {
    const FAMILY: KeyFamily = KeyFamily::Iptc;
    type State = ();

    fn check_add(entries: &[Datum], datum: &Datum) -> Result<()> {
        let key = datum.key();
        if !IptcDataSets::data_set_repeatable(key.tag(), key.record())
            && entries.iter().any(|entry| entry.key() == key)
        {
            return Err(native_error!(
                ErrorCode::InvalidDataset,
                "Dataset '{}' is not repeatable",
                key
            ));
        }
        Ok(())
    }
}

/// XMP properties.
#[derive(Debug, Clone, Copy)]
pub struct XmpFamily;

/// The raw packet an [`XmpData`] container was read from.
#[derive(Debug, Clone, Default)]
pub struct XmpPacket {
    packet: String,
    use_packet: bool,
}

impl Family for XmpFamily {
    const FAMILY: KeyFamily = KeyFamily::Xmp;
    type State = XmpPacket;
}

/// An ordered, duplicate-key container of one metadata family.
pub struct Metadata<F: Family> {
    store: SharedStore,
    anchor: Arc<Anchor>,
    state: F::State,
    _family: PhantomData<F>,
}

/// Exif container.
pub type ExifData = Metadata<ExifFamily>;
/// IPTC container.
pub type IptcData = Metadata<IptcFamily>;
/// XMP container.
pub type XmpData = Metadata<XmpFamily>;

impl<F: Family> Metadata<F> {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::with_anchor(Anchor::root())
    }

    /// Creates an empty container tracked by `anchor`.
    pub(crate) fn with_anchor(anchor: Arc<Anchor>) -> Self {
        Metadata {
            store: Store::shared(Vec::new()),
            anchor,
            state: F::State::default(),
            _family: PhantomData,
        }
    }

    fn check_family(key: &Key) -> Result<()> {
        if key.family() == F::FAMILY {
            Ok(())
        } else {
            Err(native_error!(
                ErrorCode::InvalidKey,
                "Key '{}' does not belong to {} metadata",
                key,
                F::FAMILY
            ))
        }
    }

    fn own(&self, cursor: &Cursor) -> Result<()> {
        if Arc::ptr_eq(cursor.store(), &self.store) {
            Ok(())
        } else {
            Err(foreign())
        }
    }

    fn cursor_at(&self, index: Option<usize>, generation: u64) -> Cursor {
        let position = index.map_or(Position::End, Position::Index);
        Cursor::new(Arc::clone(&self.store), position, generation, &self.anchor)
    }

    fn position_of(store: &Store, index: usize) -> Option<usize> {
        (index < store.entries.len()).then_some(index)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock!(self.store).entries.len()
    }

    /// Returns `true` if the container has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if an entry with `key` exists.
    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        read_lock!(self.store)
            .entries
            .iter()
            .any(|datum| datum.key() == key)
    }

    /// Returns a reference to the first entry with `key`.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<DatumRef> {
        let store = read_lock!(self.store);
        let index = store.entries.iter().position(|datum| datum.key() == key)?;
        Some(DatumRef::new(
            Slot {
                store: Arc::clone(&self.store),
                index,
                generation: store.generation,
            },
            &self.anchor,
        ))
    }

    /// Returns a reference to the first entry with `key`, appending a default-valued entry
    /// of the key's default type if there is none.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::InvalidKey`] for a key of another
    /// family, and [`crate::Error::UnsupportedType`] if the default type cannot be
    /// instantiated.
    pub fn index(&mut self, key: &Key) -> Result<DatumRef> {
        Self::check_family(key)?;

        let mut store = write_lock!(self.store);
        let index = match store.entries.iter().position(|datum| datum.key() == key) {
            Some(index) => index,
            None => {
                store.entries.push(Datum::with_key(key.clone())?);
                store.bump();
                store.entries.len() - 1
            }
        };

        Ok(DatumRef::new(
            Slot {
                store: Arc::clone(&self.store),
                index,
                generation: store.generation,
            },
            &self.anchor,
        ))
    }

    /// Replaces the value of the first entry with `key`, or appends a new entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::InvalidKey`] for a key of another
    /// family.
    pub fn set(&mut self, key: &Key, value: Value) -> Result<()> {
        Self::check_family(key)?;

        let mut store = write_lock!(self.store);
        match store.entries.iter_mut().find(|datum| datum.key() == key) {
            Some(datum) => datum.set_value(value),
            None => {
                store.entries.push(Datum::new(key.clone(), value));
                store.bump();
            }
        }
        Ok(())
    }

    /// Reads `text` into the value of the first entry with `key`, appending an entry of the
    /// key's default type if there is none.
    ///
    /// # Errors
    /// Returns the errors of [`Metadata::index`] and the parse error of the value. A parse
    /// failure leaves the container unchanged.
    pub fn set_str(&mut self, key: &Key, text: &str) -> Result<()> {
        Self::check_family(key)?;

        let mut store = write_lock!(self.store);
        if let Some(datum) = store.entries.iter_mut().find(|datum| datum.key() == key) {
            return datum.set_str(text);
        }

        let mut datum = Datum::with_key(key.clone())?;
        datum.set_str(text)?;
        store.entries.push(datum);
        store.bump();
        Ok(())
    }

    /// Removes the first entry with `key`. Returns `false`, and reports a debug diagnostic,
    /// if there is none.
    pub fn remove(&mut self, key: &Key) -> bool {
        let mut store = write_lock!(self.store);
        match store.entries.iter().position(|datum| datum.key() == key) {
            Some(index) => {
                store.entries.remove(index);
                store.bump();
                true
            }
            None => {
                diagnostics::debug(
                    DiagnosticCategory::Container,
                    format!("Cannot remove '{key}': key not found"),
                );
                false
            }
        }
    }

    /// Appends an entry. Existing entries with the same key are kept.
    ///
    /// # Errors
    /// Returns [`crate::Error::Native`] with [`ErrorCode::InvalidKey`] for a key of another
    /// family, and [`ErrorCode::InvalidDataset`] when adding a second instance of a
    /// non-repeatable IPTC dataset.
    pub fn add(&mut self, key: Key, value: Value) -> Result<()> {
        self.add_datum(Datum::new(key, value))
    }

    /// Appends a copy of `datum`.
    ///
    /// # Errors
    /// As [`Metadata::add`].
    pub fn add_datum(&mut self, datum: Datum) -> Result<()> {
        Self::check_family(datum.key())?;

        let mut store = write_lock!(self.store);
        F::check_add(&store.entries, &datum)?;
        store.entries.push(datum);
        store.bump();
        Ok(())
    }

    /// Returns a cursor at the first entry, or the end cursor if empty.
    #[must_use]
    pub fn begin(&self) -> Cursor {
        let store = read_lock!(self.store);
        self.cursor_at(Self::position_of(&store, 0), store.generation)
    }

    /// Returns the end cursor.
    #[must_use]
    pub fn end(&self) -> Cursor {
        let store = read_lock!(self.store);
        self.cursor_at(None, store.generation)
    }

    /// Returns an iterator over references to all entries.
    #[must_use]
    pub fn iter(&self) -> Cursor {
        self.begin()
    }

    /// Returns a cursor at the first entry with `key`, or the end cursor.
    #[must_use]
    pub fn find_key(&self, key: &Key) -> Cursor {
        let store = read_lock!(self.store);
        let index = store.entries.iter().position(|datum| datum.key() == key);
        self.cursor_at(index, store.generation)
    }

    /// Returns a cursor at the first entry that is `key` or nested below it, or the end
    /// cursor.
    #[must_use]
    pub fn find_family(&self, key: &Key) -> Cursor {
        let store = read_lock!(self.store);
        let index = store
            .entries
            .iter()
            .position(|datum| datum.key().in_family_of(key));
        self.cursor_at(index, store.generation)
    }

    /// Removes the entry at `pos` and returns a cursor at the entry that followed it.
    ///
    /// Every other handle into this container becomes stale.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] for the end cursor, a stale cursor or a cursor
    /// of another container.
    pub fn erase(&mut self, pos: &Cursor) -> Result<Cursor> {
        let end = match pos.position() {
            Position::Index(index) => Position::Index(index + 1),
            Position::End => Position::End,
        };
        self.erase_positions(pos, end)
    }

    /// Removes the entries from `begin` up to, not including, `end`. Returns a cursor at the
    /// first entry after the removed range.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] for stale cursors, cursors of another
    /// container, or `end` before `begin`.
    pub fn erase_range(&mut self, begin: &Cursor, end: &Cursor) -> Result<Cursor> {
        self.own(begin)?;
        self.own(end)?;
        if end.generation() != begin.generation() {
            return Err(cursor::stale_cursor());
        }
        if begin.is_end() {
            let store = read_lock!(self.store);
            store.check(begin.generation())?;
            return Ok(self.cursor_at(None, store.generation));
        }
        self.erase_positions(begin, end.position())
    }

    fn erase_positions(&mut self, begin: &Cursor, end: Position) -> Result<Cursor> {
        self.own(begin)?;
        let Position::Index(first) = begin.position() else {
            return Err(crate::Error::InvalidHandle(
                "Cannot erase the end cursor".to_string(),
            ));
        };

        let mut store = write_lock!(self.store);
        store.check(begin.generation())?;

        let len = store.entries.len();
        let last = match end {
            Position::Index(index) => index.min(len),
            Position::End => len,
        };
        if first >= len || last < first {
            return Err(crate::Error::InvalidHandle(format!(
                "Invalid range {first}..{last} for {len} entries"
            )));
        }

        store.entries.drain(first..last);
        let generation = store.bump();
        Ok(self.cursor_at(Self::position_of(&store, first), generation))
    }

    /// Removes the entry at `pos` and the entries directly following it that are nested
    /// below its key (`key[n]...`, `key/...`). Returns a cursor at the first entry after
    /// them.
    ///
    /// # Errors
    /// As [`Metadata::erase`].
    pub fn erase_family(&mut self, pos: &Cursor) -> Result<Cursor> {
        self.own(pos)?;
        let Position::Index(first) = pos.position() else {
            return Err(crate::Error::InvalidHandle(
                "Cannot erase the end cursor".to_string(),
            ));
        };

        let last = {
            let store = read_lock!(self.store);
            let root = store.entry(first, pos.generation())?.key().clone();
            first
                + store.entries[first..]
                    .iter()
                    .take_while(|datum| datum.key().in_family_of(&root))
                    .count()
        };
        self.erase_positions(pos, Position::Index(last))
    }

    fn sort_by(&mut self, compare: impl FnMut(&Datum, &Datum) -> Ordering) {
        write_lock!(self.store).entries.sort_by(compare);
    }

    /// Stable-sorts the entries by key string.
    pub fn sort_by_key(&mut self) {
        self.sort_by(|a, b| a.key().key().cmp(b.key().key()));
    }

    /// Stable-sorts the entries by tag number (dataset number for IPTC).
    pub fn sort_by_tag(&mut self) {
        self.sort_by(|a, b| a.tag().cmp(&b.tag()));
    }

    /// Removes all entries.
    pub fn clear(&mut self) {
        let mut store = write_lock!(self.store);
        store.entries.clear();
        store.bump();
    }

    /// Returns the keys of all entries, in order.
    #[must_use]
    pub fn keys(&self) -> Vec<Key> {
        with_read!(self.store, |store: &Store| store
            .entries
            .iter()
            .map(|datum| datum.key().clone())
            .collect())
    }

    /// Returns copies of all entries, in order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Datum> {
        with_read!(self.store, |store: &Store| store.entries.clone())
    }

    /// Returns an independent copy with its own store and tracker.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Metadata {
            store: Store::shared(self.to_vec()),
            anchor: Anchor::root(),
            state: self.state.clone(),
            _family: PhantomData,
        }
    }

    /// Returns the registry tracking this container's handles.
    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.anchor.tracker().clone()
    }

    /// Returns the identity of this container.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.anchor.id()
    }
}

impl Metadata<XmpFamily> {
    /// Returns the raw XMP packet.
    #[must_use]
    pub fn xmp_packet(&self) -> &str {
        &self.state.packet
    }

    /// Replaces the raw XMP packet and stops using it for writing.
    pub fn set_packet(&mut self, packet: impl Into<String>) {
        self.state.packet = packet.into();
        self.state.use_packet = false;
    }

    /// Returns `true` if writers emit the raw packet instead of encoding the entries.
    #[must_use]
    pub fn use_packet(&self) -> bool {
        self.state.use_packet
    }

    /// Sets whether writers emit the raw packet. Returns the previous setting.
    pub fn set_use_packet(&mut self, use_packet: bool) -> bool {
        std::mem::replace(&mut self.state.use_packet, use_packet)
    }
}

impl<F: Family> Default for Metadata<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> fmt::Debug for Metadata<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Metadata")
            .field("family", &F::FAMILY)
            .field("len", &self.len())
            .field("id", &self.anchor.id())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diagnostics::{DiagnosticSeverity, LogLevel, LogMsg},
        Error,
    };

    fn key(text: &str) -> Key {
        text.parse().unwrap()
    }

    fn exif_with(entries: &[(&str, &str)]) -> ExifData {
        let mut exif = ExifData::new();
        for (k, v) in entries {
            exif.add(key(k), Value::ascii(*v)).unwrap();
        }
        exif
    }

    #[test]
    fn add_preserves_order_and_duplicates() {
        let mut iptc = IptcData::new();
        iptc.add(key("Iptc.Application2.Keywords"), Value::string("sea")).unwrap();
        iptc.add(key("Iptc.Application2.Caption"), Value::string("A view")).unwrap();
        iptc.add(key("Iptc.Application2.Keywords"), Value::string("sky")).unwrap();

        assert_eq!(iptc.len(), 3);
        let texts: Vec<String> = iptc
            .iter()
            .map(|datum| datum.unwrap().text().unwrap())
            .collect();
        assert_eq!(texts, ["sea", "A view", "sky"]);
    }

    #[test]
    fn non_repeatable_dataset() {
        let mut iptc = IptcData::new();
        iptc.add(key("Iptc.Application2.Caption"), Value::string("one")).unwrap();
        let err = iptc
            .add(key("Iptc.Application2.Caption"), Value::string("two"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidDataset);
        assert_eq!(iptc.len(), 1);
    }

    #[test]
    fn wrong_family() {
        let mut exif = ExifData::new();
        let err = exif
            .add(key("Iptc.Application2.Caption"), Value::string("x"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidKey);
    }

    #[test]
    fn find_and_erase() {
        let mut exif = exif_with(&[("Exif.Image.Make", "Acme"), ("Exif.Image.Model", "X100")]);
        let model = key("Exif.Image.Model");

        let pos = exif.find_key(&model);
        assert_eq!(pos.position(), Position::Index(1));
        let next = exif.erase(&pos).unwrap();
        assert!(next.is_end());
        assert_eq!(next, exif.end());

        assert_eq!(exif.len(), 1);
        assert!(exif.find_key(&model).is_end());
        assert_eq!(exif.keys(), vec![key("Exif.Image.Make")]);

        assert!(pos.key().unwrap_err().is_invalid_handle());
        assert!(exif.erase(&pos).unwrap_err().is_invalid_handle());
        assert!(exif.erase(&exif.end()).is_err());
    }

    #[test]
    fn erase_range() {
        let mut exif = exif_with(&[
            ("Exif.Image.Make", "a"),
            ("Exif.Image.Model", "b"),
            ("Exif.Image.Software", "c"),
            ("Exif.Image.Artist", "d"),
        ]);

        let mut begin = exif.begin();
        begin.advance().unwrap();
        let mut end = begin.cursor();
        end.advance().unwrap();
        end.advance().unwrap();

        let next = exif.erase_range(&begin, &end).unwrap();
        assert_eq!(next.key().unwrap(), key("Exif.Image.Artist"));
        assert_eq!(exif.len(), 2);

        let all = exif.erase_range(&exif.begin(), &exif.end()).unwrap();
        assert!(all.is_end());
        assert!(exif.is_empty());
    }

    #[test]
    fn foreign_cursor() {
        let mut first = exif_with(&[("Exif.Image.Make", "a")]);
        let second = exif_with(&[("Exif.Image.Make", "a")]);
        let pos = second.begin();
        assert!(first.erase(&pos).unwrap_err().is_invalid_handle());
        assert_ne!(pos, first.begin());
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn erase_family() {
        let mut xmp = XmpData::new();
        xmp.set_str(&key("Xmp.dc.title"), "Sunset").unwrap();
        xmp.add(key("Xmp.iptcExt.LocationCreated"), Value::xmp_text("")).unwrap();
        xmp.add(
            key("Xmp.iptcExt.LocationCreated[1]/Iptc4xmpExt:City"),
            Value::xmp_text("Kyoto"),
        )
        .unwrap();
        xmp.add(
            key("Xmp.iptcExt.LocationCreated[1]/Iptc4xmpExt:CountryName"),
            Value::xmp_text("Japan"),
        )
        .unwrap();
        xmp.add(key("Xmp.dc.creator"), Value::xmp_text("Ann")).unwrap();

        let pos = xmp.find_family(&key("Xmp.iptcExt.LocationCreated"));
        let next = xmp.erase_family(&pos).unwrap();
        assert_eq!(next.key().unwrap(), key("Xmp.dc.creator"));
        assert_eq!(xmp.keys(), vec![key("Xmp.dc.title"), key("Xmp.dc.creator")]);
        assert!(xmp.find_family(&key("Xmp.iptcExt.LocationCreated")).is_end());
    }

    #[test]
    fn sorting() {
        let mut exif = exif_with(&[
            ("Exif.Image.Model", "b"),
            ("Exif.Image.Make", "a"),
            ("Exif.Image.ImageDescription", "c"),
        ]);
        let model = exif.get(&key("Exif.Image.Model")).unwrap();

        exif.sort_by_key();
        let keys: Vec<String> = exif.keys().iter().map(Key::to_string).collect();
        assert_eq!(
            keys,
            ["Exif.Image.ImageDescription", "Exif.Image.Make", "Exif.Image.Model"]
        );
        // Sorting keeps handles valid but moves entries under them.
        assert!(model.is_valid());

        exif.sort_by_tag();
        let tags: Vec<u16> = exif.to_vec().iter().map(Datum::tag).collect();
        assert_eq!(tags, [0x010e, 0x010f, 0x0110]);

        let mut iptc = IptcData::new();
        iptc.add(key("Iptc.Application2.Caption"), Value::string("c")).unwrap();
        iptc.add(key("Iptc.Envelope.ModelVersion"), Value::numeric(vec![4u16])).unwrap();
        iptc.add(key("Iptc.Application2.ObjectName"), Value::string("o")).unwrap();
        iptc.sort_by_tag();
        let tags: Vec<u16> = iptc.to_vec().iter().map(Datum::tag).collect();
        assert_eq!(tags, [0, 5, 120]);
    }

    #[test]
    fn index_auto_vivifies() {
        let mut exif = ExifData::new();
        let datum = exif.index(&key("Exif.Image.XResolution")).unwrap();
        assert_eq!(exif.len(), 1);
        assert_eq!(datum.type_id().unwrap(), crate::TypeId::Rational);
        datum.set_str("300/1").unwrap();

        let again = exif.index(&key("Exif.Image.XResolution")).unwrap();
        assert_eq!(exif.len(), 1);
        assert_eq!(again.text().unwrap(), "300/1");
        // The first reference survives a lookup that did not insert.
        assert!(datum.is_valid());
    }

    #[test]
    fn set_and_set_str() {
        let mut exif = ExifData::new();
        let make = key("Exif.Image.Make");
        exif.set(&make, Value::ascii("Acme")).unwrap();
        exif.set(&make, Value::ascii("Zeta")).unwrap();
        assert_eq!(exif.len(), 1);
        assert_eq!(exif.get(&make).unwrap().text().unwrap(), "Zeta");

        let xres = key("Exif.Image.XResolution");
        assert!(exif.set_str(&xres, "not a number").is_err());
        assert!(!exif.contains(&xres));
        exif.set_str(&xres, "72/1").unwrap();
        assert_eq!(exif.get(&xres).unwrap().value().unwrap().to_rational(0), Some((72, 1)));
    }

    #[test]
    fn remove_absent_key_reports() {
        let previous = LogMsg::level();
        LogMsg::set_level(LogLevel::Debug);
        let capture = LogMsg::capture();

        let mut exif = exif_with(&[("Exif.Image.Make", "Acme")]);
        let removed_absent = exif.remove(&key("Exif.Image.Model"));
        let removed_present = exif.remove(&key("Exif.Image.Make"));
        LogMsg::set_level(previous);

        assert!(!removed_absent);
        assert!(removed_present);
        assert!(exif.is_empty());

        let reports = capture.by_category(DiagnosticCategory::Container);
        assert_eq!(reports.len(), 1);
        assert!(reports[0].message.contains("Exif.Image.Model"));
        assert_eq!(reports[0].severity, DiagnosticSeverity::Debug);
    }

    #[test]
    fn handles_outlive_container() {
        let exif = exif_with(&[("Exif.Image.Make", "Acme")]);
        let tracker = exif.tracker();
        let id = exif.object_id();

        let cursor = exif.begin();
        let derived = cursor.cursor();
        let datum = cursor.datum_ref().unwrap();
        assert_eq!(tracker.dependents(id), 1);
        assert_eq!(tracker.dependents(cursor.object_id()), 2);
        assert_eq!(derived.owner_id(), Some(cursor.object_id()));

        drop(exif);
        drop(cursor);
        assert_eq!(derived.key().unwrap(), key("Exif.Image.Make"));
        assert_eq!(datum.print().unwrap(), "Exif.Image.Make: Acme");

        drop(derived);
        drop(datum);
        assert!(tracker.is_empty());
    }

    #[test]
    fn structural_change_invalidates() {
        let mut exif = exif_with(&[("Exif.Image.Make", "Acme")]);
        let cursor = exif.begin();
        let value = cursor.value_ref().unwrap();
        exif.add(key("Exif.Image.Model"), Value::ascii("X")).unwrap();

        assert!(!cursor.is_valid());
        assert!(matches!(cursor.datum(), Err(Error::InvalidHandle(_))));
        assert!(value.get().unwrap_err().is_invalid_handle());

        let mut iter = exif.begin();
        exif.clear();
        assert!(iter.next().unwrap().is_err());
        assert!(iter.next().is_none());
    }

    #[test]
    fn value_ref_updates_in_place() {
        let mut exif = ExifData::new();
        exif.add(key("Exif.Image.XResolution"), Value::parse(crate::TypeId::Rational, "72/1").unwrap())
            .unwrap();

        let value = exif.begin().value_ref().unwrap();
        value.read_str("300/1").unwrap();
        value.with_mut(|v| v.set_data_area(b"area")).unwrap().unwrap();
        assert_eq!(exif.to_vec()[0].to_string(), "300/1");

        let view = value.data_view(true).unwrap();
        view.write(|bytes| bytes[0] = b'A').unwrap();
        assert_eq!(value.get().unwrap().data_area(), b"Area");

        exif.clear();
        assert!(view.to_vec().unwrap_err().is_invalid_handle());
    }

    #[test]
    fn cursor_protocol() {
        let exif = exif_with(&[("Exif.Image.Make", "Acme"), ("Exif.Image.Model", "X100")]);
        let mut cursor = exif.begin();
        assert_eq!(cursor.to_string(), "Exif.Image.Make: Acme");
        cursor.advance().unwrap();
        assert_eq!(cursor.value().unwrap().to_string(), "X100");
        cursor.advance().unwrap();
        assert!(cursor.is_end());
        assert_eq!(cursor.to_string(), "<end>");
        assert!(cursor.advance().is_err());
        assert!(cursor.key().is_err());

        let empty = ExifData::new();
        assert_eq!(empty.begin(), empty.end());
        assert_eq!(empty.iter().count(), 0);
    }

    #[test]
    fn deep_clone_is_independent() {
        let mut xmp = XmpData::new();
        xmp.set_packet("<x:xmpmeta/>");
        xmp.set_use_packet(true);
        xmp.add(key("Xmp.dc.format"), Value::xmp_text("image/jpeg")).unwrap();

        let copy = xmp.deep_clone();
        xmp.clear();
        assert_eq!(copy.len(), 1);
        assert_eq!(copy.xmp_packet(), "<x:xmpmeta/>");
        assert!(copy.use_packet());
        assert_ne!(copy.object_id(), xmp.object_id());
    }

    #[test]
    fn usable_after_panicking_writer() {
        let mut exif = exif_with(&[("Exif.Image.Make", "Acme")]);
        let store = Arc::clone(&exif.store);
        let writer = std::thread::spawn(move || {
            let _guard = store.write().unwrap();
            panic!("writer failed while holding the store");
        });
        assert!(writer.join().is_err());
        assert!(exif.store.is_poisoned());

        let cursor = exif.begin();
        assert_eq!(exif.len(), 1);
        assert_eq!(cursor.key().unwrap(), key("Exif.Image.Make"));
        exif.add(key("Exif.Image.Model"), Value::ascii("X1")).unwrap();
        assert!(exif.remove(&key("Exif.Image.Make")));
        assert_eq!(exif.keys(), vec![key("Exif.Image.Model")]);
        assert!(!cursor.is_valid());
    }

    #[test]
    fn packet_flags() {
        let mut xmp = XmpData::new();
        assert!(!xmp.use_packet());
        assert!(!xmp.set_use_packet(true));
        assert!(xmp.set_use_packet(true));
        xmp.set_packet("");
        assert!(!xmp.use_packet());
        assert_eq!(xmp.xmp_packet(), "");
    }

    #[test]
    fn xmp_datum_copy_unsupported() {
        let mut xmp = XmpData::new();
        xmp.add(key("Xmp.dc.format"), Value::xmp_text("image/jpeg")).unwrap();
        let datum = xmp.begin().datum_ref().unwrap();
        let err = datum.copy(&mut [0u8; 4], crate::ByteOrder::Little).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FunctionNotSupported);
    }
}
