//! Owning byte buffers and borrowed, bounds-checked views.
//!
//! [`DataBuf`] owns a resizable block of bytes. [`View`] is a window onto bytes owned by
//! something else: a [`DataBuf`], the raw data of an opened image, or the data of a value
//! stored in a metadata container. A view never aliases memory directly; it holds the
//! owner's storage, the window bounds and the owner's generation at the time the view was
//! taken, and validates all three on every access. Resizing the owner or erasing the entry
//! a view points into turns the view stale, and further access fails with
//! [`crate::Error::InvalidHandle`].
//!
//! Views have no way to change the length of what they look at. Writes through a view
//! taken as read-only fail with [`crate::Error::AccessDenied`].
//!
//! # Examples
//!
//! ```rust
//! use metabind::DataBuf;
//!
//! let mut buf = DataBuf::from(&b"abcdef"[..]);
//! let view = buf.view(true);
//!
//! view.write(|bytes| bytes[0] = b'X')?;
//! assert_eq!(buf.to_vec(), b"Xbcdef");
//!
//! buf.resize(2);
//! assert!(view.get(0).is_err());
//! # Ok::<(), metabind::Error>(())
//! ```

use std::{
    cmp::Ordering,
    fmt,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    io::{read_at, write_at, ByteIO, ByteOrder},
    ownership::{Anchor, ObjectId, Tracker},
    Error, ErrorCode, Result,
};

/// Storage that a [`View`] can look at.
///
/// Implementors check `generation` against their current generation before running the
/// closure, and hand it the complete byte range they own.
pub(crate) trait ByteSource: Send + Sync + fmt::Debug {
    /// Runs `f` over the owned bytes.
    fn read_bytes(&self, generation: u64, f: &mut dyn FnMut(&[u8])) -> Result<()>;

    /// Runs `f` over the owned bytes, mutably.
    fn write_bytes(&self, generation: u64, f: &mut dyn FnMut(&mut [u8])) -> Result<()>;
}

pub(crate) fn stale(what: &str) -> Error {
    Error::InvalidHandle(format!("{what} changed since the handle was created"))
}

#[derive(Debug, Default)]
struct Bytes {
    data: Vec<u8>,
    generation: u64,
}

#[derive(Debug, Default)]
struct BufferStorage(RwLock<Bytes>);

impl BufferStorage {
    fn read(&self) -> RwLockReadGuard<'_, Bytes> {
        read_lock!(self.0)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Bytes> {
        write_lock!(self.0)
    }
}

impl ByteSource for BufferStorage {
    fn read_bytes(&self, generation: u64, f: &mut dyn FnMut(&[u8])) -> Result<()> {
        let bytes = self.read();
        if bytes.generation != generation {
            return Err(stale("Buffer"));
        }
        f(&bytes.data);
        Ok(())
    }

    fn write_bytes(&self, generation: u64, f: &mut dyn FnMut(&mut [u8])) -> Result<()> {
        let mut bytes = self.write();
        if bytes.generation != generation {
            return Err(stale("Buffer"));
        }
        f(&mut bytes.data);
        Ok(())
    }
}

/// An owning, resizable byte buffer.
///
/// Equality and ordering compare the contents. Cloning copies the contents into an
/// independent buffer.
pub struct DataBuf {
    storage: Arc<BufferStorage>,
    anchor: Arc<Anchor>,
}

impl DataBuf {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Creates a zero-filled buffer of `len` bytes.
    #[must_use]
    pub fn with_len(len: usize) -> Self {
        Self::from_vec(vec![0; len])
    }

    /// Creates a buffer taking ownership of `data`.
    #[must_use]
    pub fn from_vec(data: Vec<u8>) -> Self {
        DataBuf {
            storage: Arc::new(BufferStorage(RwLock::new(Bytes {
                data,
                generation: 0,
            }))),
            anchor: Anchor::root(),
        }
    }

    /// Returns the number of bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.read().data.len()
    }

    /// Returns `true` if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a copy of the contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.storage.read().data.clone()
    }

    /// Changes the length, zero-filling new bytes. Outstanding views become stale.
    pub fn resize(&mut self, len: usize) {
        let mut bytes = self.storage.write();
        bytes.data.resize(len, 0);
        bytes.generation += 1;
    }

    /// Replaces the contents with `len` zero bytes. Outstanding views become stale.
    pub fn alloc(&mut self, len: usize) {
        let mut bytes = self.storage.write();
        bytes.data = vec![0; len];
        bytes.generation += 1;
    }

    /// Empties the buffer. Outstanding views become stale.
    pub fn reset(&mut self) {
        self.alloc(0);
    }

    /// Compares `other` with the bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Native`] with [`ErrorCode::OffsetOutOfRange`] if `other` does not
    /// fit at `offset`.
    pub fn cmp_bytes(&self, offset: usize, other: &[u8]) -> Result<Ordering> {
        let bytes = self.storage.read();
        let end = offset
            .checked_add(other.len())
            .filter(|end| *end <= bytes.data.len())
            .ok_or_else(|| {
                native_error!(
                    ErrorCode::OffsetOutOfRange,
                    "Overflow in DataBuf::cmp_bytes ({} + {} > {})",
                    offset,
                    other.len(),
                    bytes.data.len()
                )
            })?;

        Ok(bytes.data[offset..end].cmp(other))
    }

    /// Reads a `T` at `offset` in the given byte order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if `T` does not fit at `offset`.
    pub fn read_uint<T: ByteIO>(&self, offset: usize, order: ByteOrder) -> Result<T> {
        let mut offset = offset;
        read_at(&self.storage.read().data, &mut offset, order)
    }

    /// Writes `value` at `offset` in the given byte order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if `value` does not fit at `offset`.
    pub fn write_uint<T: ByteIO>(&mut self, offset: usize, value: T, order: ByteOrder) -> Result<()> {
        let mut offset = offset;
        write_at(&mut self.storage.write().data, &mut offset, value, order)
    }

    /// Returns a view over the whole buffer.
    ///
    /// The view stays valid until the buffer is resized, allocated or reset, and keeps the
    /// buffer's storage alive on its own.
    #[must_use]
    pub fn view(&self, mutable: bool) -> View {
        let bytes = self.storage.read();
        View {
            source: Arc::clone(&self.storage) as Arc<dyn ByteSource>,
            offset: 0,
            len: bytes.data.len(),
            mutable,
            generation: bytes.generation,
            anchor: Anchor::derive(&self.anchor),
        }
    }

    /// Returns the identity of this buffer.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.anchor.id()
    }

    /// Returns the registry tracking this buffer's views.
    #[must_use]
    pub fn tracker(&self) -> Tracker {
        self.anchor.tracker().clone()
    }
}

impl Default for DataBuf {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&[u8]> for DataBuf {
    fn from(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl From<Vec<u8>> for DataBuf {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl Clone for DataBuf {
    fn clone(&self) -> Self {
        Self::from_vec(self.to_vec())
    }
}

impl PartialEq for DataBuf {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage) || self.to_vec() == other.to_vec()
    }
}

impl Eq for DataBuf {}

impl PartialOrd for DataBuf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataBuf {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_vec().cmp(&other.to_vec())
    }
}

impl fmt::Debug for DataBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBuf")
            .field("len", &self.len())
            .field("id", &self.anchor.id())
            .finish()
    }
}

/// A borrowed window onto bytes owned by a buffer, an image or a stored value.
///
/// Every access revalidates the window against its owner. A view can only be created
/// through its owner; it cannot change the owner's length.
pub struct View {
    source: Arc<dyn ByteSource>,
    offset: usize,
    len: usize,
    mutable: bool,
    generation: u64,
    anchor: Arc<Anchor>,
}

impl View {
    pub(crate) fn new(
        source: Arc<dyn ByteSource>,
        len: usize,
        mutable: bool,
        generation: u64,
        anchor: Arc<Anchor>,
    ) -> Self {
        View {
            source,
            offset: 0,
            len,
            mutable,
            generation,
            anchor,
        }
    }

    /// Returns the window length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns `true` if writes are permitted.
    #[must_use]
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Returns `true` if the view can still be accessed.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.read(|_| ()).is_ok()
    }

    /// Runs `f` over the viewed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] if the view is stale.
    pub fn read<R>(&self, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let mut f = Some(f);
        let mut result = None;
        let (offset, len) = (self.offset, self.len);

        self.source.read_bytes(self.generation, &mut |bytes| {
            if let (Some(window), Some(f)) = (bytes.get(offset..offset + len), f.take()) {
                result = Some(f(window));
            }
        })?;

        result.ok_or_else(|| stale("Owner"))
    }

    /// Runs `f` over the viewed bytes, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AccessDenied`] if the view is read-only and
    /// [`Error::InvalidHandle`] if it is stale.
    pub fn write<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> Result<R> {
        if !self.mutable {
            return Err(Error::AccessDenied(
                "cannot write through a read-only view".to_string(),
            ));
        }

        let mut f = Some(f);
        let mut result = None;
        let (offset, len) = (self.offset, self.len);

        self.source.write_bytes(self.generation, &mut |bytes| {
            if let (Some(window), Some(f)) = (bytes.get_mut(offset..offset + len), f.take()) {
                result = Some(f(window));
            }
        })?;

        result.ok_or_else(|| stale("Owner"))
    }

    /// Returns the byte at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Native`] with [`ErrorCode::OffsetOutOfRange`] for an index past
    /// the window, and [`Error::InvalidHandle`] if the view is stale.
    pub fn get(&self, index: usize) -> Result<u8> {
        self.read(|bytes| bytes.get(index).copied())?.ok_or_else(|| {
            native_error!(
                ErrorCode::OffsetOutOfRange,
                "Index {} out of range for view of {} bytes",
                index,
                self.len
            )
        })
    }

    /// Copies the viewed bytes into `dst`, truncating to its length. Returns the number of
    /// bytes copied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] if the view is stale.
    pub fn copy(&self, dst: &mut [u8]) -> Result<usize> {
        self.read(|bytes| {
            let count = bytes.len().min(dst.len());
            dst[..count].copy_from_slice(&bytes[..count]);
            count
        })
    }

    /// Returns a copy of the viewed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] if the view is stale.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        self.read(<[u8]>::to_vec)
    }

    /// Copies the viewed bytes into a new, independent buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandle`] if the view is stale.
    pub fn detach(&self) -> Result<DataBuf> {
        Ok(DataBuf::from_vec(self.to_vec()?))
    }

    /// Returns a narrower view of `len` bytes starting at `offset` within this one.
    ///
    /// The new view depends on this view, and through it on the owner.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Native`] with [`ErrorCode::OffsetOutOfRange`] if the range does not
    /// fit in this view.
    pub fn subview(&self, offset: usize, len: usize) -> Result<View> {
        if offset.checked_add(len).map_or(true, |end| end > self.len) {
            return Err(native_error!(
                ErrorCode::OffsetOutOfRange,
                "Range {}+{} out of range for view of {} bytes",
                offset,
                len,
                self.len
            ));
        }

        Ok(View {
            source: Arc::clone(&self.source),
            offset: self.offset + offset,
            len,
            mutable: self.mutable,
            generation: self.generation,
            anchor: Anchor::derive(&self.anchor),
        })
    }

    /// Returns the identity of this view.
    #[must_use]
    pub fn object_id(&self) -> ObjectId {
        self.anchor.id()
    }

    /// Returns the identity of the object this view depends on.
    #[must_use]
    pub fn owner_id(&self) -> Option<ObjectId> {
        self.anchor.owner()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .field("mutable", &self.mutable)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_basics() {
        let mut buf = DataBuf::with_len(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.to_vec(), vec![0; 4]);

        buf.resize(6);
        assert_eq!(buf.len(), 6);
        buf.reset();
        assert!(buf.is_empty());

        buf.alloc(2);
        assert_eq!(buf.to_vec(), vec![0, 0]);
        assert_eq!(DataBuf::default().len(), 0);
    }

    #[test]
    fn buffer_compare() {
        let buf = DataBuf::from(&b"abcdef"[..]);
        assert_eq!(buf.cmp_bytes(2, b"cd").unwrap(), Ordering::Equal);
        assert_eq!(buf.cmp_bytes(0, b"b").unwrap(), Ordering::Less);
        assert!(buf.cmp_bytes(5, b"fg").is_err());
        assert!(buf.cmp_bytes(usize::MAX, b"x").is_err());

        assert_eq!(buf, DataBuf::from(b"abcdef".to_vec()));
        assert!(buf < DataBuf::from(&b"abd"[..]));
        assert_eq!(buf.clone(), buf);
    }

    #[test]
    fn buffer_uints() {
        let mut buf = DataBuf::with_len(4);
        buf.write_uint(0, 0x0102_u16, ByteOrder::Big).unwrap();
        buf.write_uint(2, 0x0102_u16, ByteOrder::Little).unwrap();
        assert_eq!(buf.to_vec(), vec![1, 2, 2, 1]);
        assert_eq!(buf.read_uint::<u32>(0, ByteOrder::Big).unwrap(), 0x0102_0201);
        assert!(buf.read_uint::<u32>(1, ByteOrder::Big).is_err());
    }

    #[test]
    fn view_read_write() {
        let buf = DataBuf::from(&b"hello"[..]);
        let view = buf.view(true);
        assert_eq!(view.len(), 5);
        assert!(view.is_mutable());

        view.write(|bytes| bytes.make_ascii_uppercase()).unwrap();
        assert_eq!(buf.to_vec(), b"HELLO");
        assert_eq!(view.get(1).unwrap(), b'E');
        assert!(view.get(5).is_err());

        let mut dst = [0u8; 3];
        assert_eq!(view.copy(&mut dst).unwrap(), 3);
        assert_eq!(&dst, b"HEL");

        let detached = view.detach().unwrap();
        view.write(|bytes| bytes[0] = b'J').unwrap();
        assert_eq!(detached.to_vec(), b"HELLO");
    }

    #[test]
    fn usable_after_panicking_writer() {
        let buf = DataBuf::from(&b"abc"[..]);
        let storage = Arc::clone(&buf.storage);
        let writer = std::thread::spawn(move || {
            let _guard = storage.0.write().unwrap();
            panic!("writer failed while holding the buffer");
        });
        assert!(writer.join().is_err());
        assert!(buf.storage.0.is_poisoned());

        buf.view(true).write(|bytes| bytes[0] = b'x').unwrap();
        assert_eq!(buf.to_vec(), b"xbc");
        assert_eq!(buf.clone(), buf);
    }

    #[test]
    fn read_only_view() {
        let buf = DataBuf::from(&b"abc"[..]);
        let view = buf.view(false);
        let err = view.write(|bytes| bytes[0] = 0).unwrap_err();
        assert!(matches!(err, Error::AccessDenied(_)));
        assert_eq!(buf.to_vec(), b"abc");
    }

    #[test]
    fn stale_after_resize() {
        let mut buf = DataBuf::from(&b"abc"[..]);
        let view = buf.view(false);
        assert!(view.is_valid());

        buf.resize(10);
        assert!(!view.is_valid());
        assert!(view.to_vec().unwrap_err().is_invalid_handle());

        let fresh = buf.view(false);
        assert_eq!(fresh.len(), 10);
    }

    #[test]
    fn view_outlives_buffer() {
        let buf = DataBuf::from(&b"xyz"[..]);
        let tracker = buf.tracker();
        let id = buf.object_id();
        let view = buf.view(false);
        assert_eq!(tracker.dependents(id), 1);
        assert_eq!(view.owner_id(), Some(id));

        drop(buf);
        assert_eq!(view.to_vec().unwrap(), b"xyz");
        drop(view);
        assert!(tracker.is_empty());
    }

    #[test]
    fn subviews() {
        let buf = DataBuf::from(&b"0123456789"[..]);
        let view = buf.view(true);
        let sub = view.subview(2, 3).unwrap();
        assert_eq!(sub.to_vec().unwrap(), b"234");
        sub.write(|bytes| bytes[0] = b'x').unwrap();
        assert_eq!(buf.to_vec(), b"01x3456789");
        assert!(view.subview(8, 3).is_err());
        assert_eq!(sub.owner_id(), Some(view.object_id()));
    }
}
