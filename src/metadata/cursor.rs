//! Forward cursors over container entries.

use std::{fmt, sync::Arc};

use crate::{
    buffer::stale,
    key::Key,
    metadata::{
        handle::{DatumRef, ValueRef},
        store::{SharedStore, Slot},
        Datum,
    },
    ownership::{Anchor, ObjectId},
    value::Value,
    Error, Result,
};

/// Where a cursor points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// The entry at this index
    Index(usize),
    /// The terminal sentinel; never dereferenceable
    End,
}

/// A cursor into a container's sequence of entries.
///
/// Two cursors are equal if they point into the same container at the same position. The
/// end cursor is a distinct sentinel. Erasing or inserting through another cursor (or
/// through the container) invalidates a cursor; any later access then fails with
/// [`Error::InvalidHandle`].
///
/// As an [`Iterator`], a cursor yields a [`DatumRef`] for its current entry and moves on.
/// It cannot be rewound; take a fresh [`crate::Metadata::begin`] for another pass.
pub struct Cursor {
    store: SharedStore,
    position: Position,
    generation: u64,
    anchor: Arc<Anchor>,
}

impl Cursor {
    pub(crate) fn new(
        store: SharedStore,
        position: Position,
        generation: u64,
        owner: &Arc<Anchor>,
    ) -> Self {
        Cursor {
            store,
            position,
            generation,
            anchor: Anchor::derive(owner),
        }
    }

    pub(crate) fn store(&self) -> &SharedStore {
        &self.store
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    fn slot(&self) -> Result<Slot> {
        match self.position {
            Position::Index(index) => Ok(Slot {
                store: Arc::clone(&self.store),
                index,
                generation: self.generation,
            }),
            Position::End => Err(Error::InvalidHandle(
                "Cannot dereference the end cursor".to_string(),
            )),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&Datum) -> R) -> Result<R> {
        self.slot()?.with(f)
    }

    /// Returns the current position.
    #[must_use]
    pub fn position(&self) -> Position {
        self.position
    }

    /// Returns `true` for the end cursor.
    #[must_use]
    pub fn is_end(&self) -> bool {
        self.position == Position::End
    }

    /// Returns `true` if the container has not been structurally changed since the
    /// cursor was created.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.store
            .read()
            .is_ok_and(|store| store.generation == self.generation)
    }

    /// Returns the key of the current entry.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] for the end cursor and for stale cursors.
    pub fn key(&self) -> Result<Key> {
        self.with(|datum| datum.key().clone())
    }

    /// Returns a copy of the current entry.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] for the end cursor and for stale cursors.
    pub fn datum(&self) -> Result<Datum> {
        self.with(Datum::clone)
    }

    /// Returns a copy of the current value.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] for the end cursor and for stale cursors.
    pub fn value(&self) -> Result<Value> {
        self.with(|datum| datum.value().clone())
    }

    /// Returns a live reference to the current entry.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] for the end cursor and for stale cursors.
    pub fn datum_ref(&self) -> Result<DatumRef> {
        let slot = self.slot()?;
        slot.with(|_| ())?;
        Ok(DatumRef::new(slot, &self.anchor))
    }

    /// Returns a live reference to the current value.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] for the end cursor and for stale cursors.
    pub fn value_ref(&self) -> Result<ValueRef> {
        self.datum_ref()?.value_ref()
    }

    /// Moves to the next entry, or to the end.
    ///
    /// # Errors
    /// Returns [`Error::InvalidHandle`] when advancing the end cursor or a stale cursor.
    pub fn advance(&mut self) -> Result<()> {
        let Position::Index(index) = self.position else {
            return Err(Error::InvalidHandle(
                "Cannot advance past the end cursor".to_string(),
            ));
        };

        let store = read_lock!(self.store);
        store.check(self.generation)?;
        self.position = if index + 1 < store.entries.len() {
            Position::Index(index + 1)
        } else {
            Position::End
        };
        Ok(())
    }

    /// Returns a new cursor at the same position that depends on this one.
    #[must_use]
    pub fn cursor(&self) -> Cursor {
        Cursor::new(
            Arc::clone(&self.store),
            self.position,
            self.generation,
            &self.anchor,
        )
    }

    /// Returns the identity of this cursor.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.anchor.id()
    }

    /// Returns the identity of the object this cursor depends on.
    #[must_use]
    pub fn owner_id(&self) -> Option<ObjectId> {
        self.anchor.owner()
    }
}

impl Iterator for Cursor {
    type Item = Result<DatumRef>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_end() {
            return None;
        }

        let item = self.datum_ref().and_then(|datum| {
            self.advance()?;
            Ok(datum)
        });
        if item.is_err() {
            self.position = Position::End;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for Cursor {}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store) && self.position == other.position
    }
}

impl Eq for Cursor {}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Position::End => f.write_str("<end>"),
            Position::Index(_) => match self.with(Datum::print) {
                Ok(text) => f.write_str(&text),
                Err(err) => write!(f, "<{err}>"),
            },
        }
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("position", &self.position)
            .field("generation", &self.generation)
            .field("id", &self.anchor.id())
            .finish()
    }
}

pub(crate) fn foreign() -> Error {
    Error::InvalidHandle("Cursor belongs to another container".to_string())
}

pub(crate) fn stale_cursor() -> Error {
    stale("Container")
}
