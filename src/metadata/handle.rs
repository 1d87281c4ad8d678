//! References to single entries of a container.

use std::{fmt, sync::Arc};

use crate::{
    buffer::View,
    io::ByteOrder,
    key::Key,
    metadata::{
        store::{DataAreaSource, Slot},
        Datum,
    },
    ownership::{Anchor, ObjectId},
    value::{TypeId, Value},
    Result,
};

/// A live reference to an entry stored in a container.
///
/// The reference keeps the container's storage alive. Every access checks that the
/// container has not been structurally changed since the reference was taken; if it has,
/// the access fails with [`crate::Error::InvalidHandle`].
pub struct DatumRef {
    slot: Slot,
    anchor: Arc<Anchor>,
}

impl DatumRef {
    pub(crate) fn new(slot: Slot, owner: &Arc<Anchor>) -> Self {
        DatumRef {
            slot,
            anchor: Anchor::derive(owner),
        }
    }

    /// Runs `f` over the referenced datum.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn with<R>(&self, f: impl FnOnce(&Datum) -> R) -> Result<R> {
        self.slot.with(f)
    }

    /// Runs `f` over the referenced datum, mutably.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Datum) -> R) -> Result<R> {
        self.slot.with_mut(f)
    }

    /// Returns the key.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn key(&self) -> Result<Key> {
        self.with(|datum| datum.key().clone())
    }

    /// Returns a copy of the value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn value(&self) -> Result<Value> {
        self.with(|datum| datum.value().clone())
    }

    /// Returns a live reference to the value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn value_ref(&self) -> Result<ValueRef> {
        self.with(|_| ())?;
        Ok(ValueRef {
            slot: self.slot.clone(),
            anchor: Anchor::derive(&self.anchor),
        })
    }

    /// Replaces the stored value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn set_value(&self, value: Value) -> Result<()> {
        self.with_mut(|datum| datum.set_value(value))
    }

    /// Reads `text` into the stored value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale, or the parse error
    /// of the value.
    pub fn set_str(&self, text: &str) -> Result<()> {
        self.with_mut(|datum| datum.set_str(text))?
    }

    /// Copies the datum out of the container.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn to_owned(&self) -> Result<Datum> {
        self.with(Datum::clone)
    }

    /// Returns the element count of the value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn count(&self) -> Result<usize> {
        self.with(Datum::count)
    }

    /// Returns the encoded size of the value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn size(&self) -> Result<usize> {
        self.with(Datum::size)
    }

    /// Returns the type of the value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn type_id(&self) -> Result<TypeId> {
        self.with(Datum::type_id)
    }

    /// Returns the label of the key.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn tag_label(&self) -> Result<String> {
        self.with(Datum::tag_label)
    }

    /// Returns `key: value`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn print(&self) -> Result<String> {
        self.with(Datum::print)
    }

    /// Returns the text form of the value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn text(&self) -> Result<String> {
        self.with(ToString::to_string)
    }

    /// Writes the binary encoding of the value into `dst`.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale, or the error of
    /// [`Datum::copy`].
    pub fn copy(&self, dst: &mut [u8], order: ByteOrder) -> Result<usize> {
        self.with(|datum| datum.copy(dst, order))?
    }

    /// Returns `false` once the container was structurally changed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.with(|_| ()).is_ok()
    }

    /// Returns the position of the entry in its container.
    #[must_use]
    pub fn position(&self) -> usize {
        self.slot.index
    }

    /// Returns the identity of this reference.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.anchor.id()
    }

    /// Returns the identity of the object this reference depends on.
    #[must_use]
    pub fn owner_id(&self) -> Option<ObjectId> {
        self.anchor.owner()
    }
}

impl fmt::Debug for DatumRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatumRef")
            .field("slot", &self.slot)
            .field("id", &self.anchor.id())
            .finish()
    }
}

/// A live reference to the value of a container entry.
///
/// Mutations go straight into the container. Like [`DatumRef`], it keeps the container's
/// storage alive and fails with [`crate::Error::InvalidHandle`] once the container has been
/// structurally changed.
pub struct ValueRef {
    slot: Slot,
    anchor: Arc<Anchor>,
}

impl ValueRef {
    /// Runs `f` over the referenced value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> Result<R> {
        self.slot.with(|datum| f(datum.value()))
    }

    /// Runs `f` over the referenced value, mutably.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Value) -> R) -> Result<R> {
        self.slot.with_mut(|datum| f(datum.value_mut()))
    }

    /// Returns a copy of the value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn get(&self) -> Result<Value> {
        self.with(Value::clone)
    }

    /// Reads `text` into the value.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale, or the parse error
    /// of the value.
    pub fn read_str(&self, text: &str) -> Result<()> {
        self.with_mut(|value| value.read_str(text))?
    }

    /// Returns a view over the data area of the value.
    ///
    /// The view depends on this reference. It turns stale when the container is
    /// structurally changed or the data area is resized.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidHandle`] if the reference is stale.
    pub fn data_view(&self, mutable: bool) -> Result<View> {
        let len = self.with(Value::size_data_area)?;
        let generation = self.slot.generation;
        Ok(View::new(
            Arc::new(DataAreaSource {
                slot: self.slot.clone(),
                len,
            }),
            len,
            mutable,
            generation,
            Anchor::derive(&self.anchor),
        ))
    }

    /// Returns the identity of this reference.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.anchor.id()
    }

    /// Returns the identity of the object this reference depends on.
    #[must_use]
    pub fn owner_id(&self) -> Option<ObjectId> {
        self.anchor.owner()
    }
}

impl fmt::Debug for ValueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRef")
            .field("slot", &self.slot)
            .field("id", &self.anchor.id())
            .finish()
    }
}
