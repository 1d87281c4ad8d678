//! Backing store shared by a container and the handles derived from it.

use std::{
    fmt,
    sync::{Arc, RwLock},
};

use crate::{
    buffer::{stale, ByteSource},
    metadata::Datum,
    value::ValueData,
    Result,
};

pub(crate) type SharedStore = Arc<RwLock<Store>>;

/// The entries of one container plus its structural generation.
///
/// Inserting, erasing and clearing bump the generation, which invalidates every
/// outstanding handle. Replacing a value in place and sorting do not.
#[derive(Debug, Default)]
pub(crate) struct Store {
    pub(crate) entries: Vec<Datum>,
    pub(crate) generation: u64,
}

impl Store {
    pub(crate) fn shared(entries: Vec<Datum>) -> SharedStore {
        Arc::new(RwLock::new(Store {
            entries,
            generation: 0,
        }))
    }

    pub(crate) fn bump(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub(crate) fn check(&self, generation: u64) -> Result<()> {
        if self.generation == generation {
            Ok(())
        } else {
            Err(stale("Container"))
        }
    }

    pub(crate) fn entry(&self, index: usize, generation: u64) -> Result<&Datum> {
        self.check(generation)?;
        self.entries.get(index).ok_or_else(|| stale("Container"))
    }

    pub(crate) fn entry_mut(&mut self, index: usize, generation: u64) -> Result<&mut Datum> {
        self.check(generation)?;
        self.entries.get_mut(index).ok_or_else(|| stale("Container"))
    }
}

/// Handle to one entry: store, position and generation.
#[derive(Clone)]
pub(crate) struct Slot {
    pub(crate) store: SharedStore,
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

impl Slot {
    pub(crate) fn with<R>(&self, f: impl FnOnce(&Datum) -> R) -> Result<R> {
        let store = read_lock!(self.store);
        Ok(f(store.entry(self.index, self.generation)?))
    }

    pub(crate) fn with_mut<R>(&self, f: impl FnOnce(&mut Datum) -> R) -> Result<R> {
        let mut store = write_lock!(self.store);
        Ok(f(store.entry_mut(self.index, self.generation)?))
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

/// The data area of the value stored at a slot, as seen by a [`crate::View`].
///
/// `len` is the length of the data area when the view was taken. A data area replaced by
/// one of another length turns the view stale even though the container generation is
/// unchanged.
#[derive(Debug)]
pub(crate) struct DataAreaSource {
    pub(crate) slot: Slot,
    pub(crate) len: usize,
}

impl DataAreaSource {
    fn check_len(&self, datum: &Datum) -> Result<()> {
        if datum.value().size_data_area() == self.len {
            Ok(())
        } else {
            Err(stale("Data area"))
        }
    }
}

impl ByteSource for DataAreaSource {
    fn read_bytes(&self, generation: u64, f: &mut dyn FnMut(&[u8])) -> Result<()> {
        let store = read_lock!(self.slot.store);
        let datum = store.entry(self.slot.index, generation)?;
        self.check_len(datum)?;
        f(datum.value().data_area());
        Ok(())
    }

    fn write_bytes(&self, generation: u64, f: &mut dyn FnMut(&mut [u8])) -> Result<()> {
        let mut store = write_lock!(self.slot.store);
        let datum = store.entry_mut(self.slot.index, generation)?;
        self.check_len(datum)?;
        match datum.value_mut().data_mut() {
            ValueData::Numeric(numeric) => f(&mut numeric.data_area),
            _ => f(&mut []),
        }
        Ok(())
    }
}
