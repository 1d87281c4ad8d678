//! Ownership tracking between handles and the objects they alias.
//!
//! Cursors, datum references, value references and views are handles into storage owned by
//! a container, an image or a buffer. Each handle holds an [`Anchor`]: a node that keeps
//! its owner's anchor alive and records a `dependent -> owner` edge in a shared
//! [`Tracker`]. Dropping the handle drops the anchor, which releases the edge. Anchors
//! chain, so a cursor derived from another cursor keeps both the original cursor and the
//! container alive.
//!
//! The tracker is pure bookkeeping for destruction order. Memory safety of the handles
//! comes from shared ownership of the backing store and generation checks on access.
//!
//! # Examples
//!
//! ```rust
//! use metabind::{ExifData, Value};
//!
//! let mut exif = ExifData::new();
//! exif.add("Exif.Image.Make".parse()?, Value::ascii("Acme"))?;
//!
//! let tracker = exif.tracker();
//! let cursor = exif.begin();
//! assert_eq!(tracker.dependents(exif.object_id()), 1);
//!
//! drop(exif);
//! // The store is still alive through the cursor.
//! assert_eq!(cursor.key()?.to_string(), "Exif.Image.Make");
//!
//! drop(cursor);
//! assert_eq!(tracker.len(), 0);
//! # Ok::<(), metabind::Error>(())
//! ```

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use dashmap::DashMap;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a tracked object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocates a fresh identity.
    #[must_use]
    pub fn next() -> Self {
        ObjectId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identity value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
struct TrackerInner {
    /// dependent -> owners
    edges: DashMap<ObjectId, Vec<ObjectId>>,
    /// owner -> number of live dependents
    counts: DashMap<ObjectId, usize>,
}

/// Registry of `dependent -> owner` edges.
///
/// Cloning a tracker yields another handle to the same registry. Every root object
/// (standalone container, image, buffer) creates its own registry; handles derived from it
/// share it.
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

impl Tracker {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `dependent` keeps `owner` alive.
    ///
    /// Registering the same pair again is a no-op. Returns `true` if the edge is new.
    pub fn register(&self, dependent: ObjectId, owner: ObjectId) -> bool {
        let mut owners = self.inner.edges.entry(dependent).or_default();
        if owners.contains(&owner) {
            return false;
        }
        owners.push(owner);
        drop(owners);

        *self.inner.counts.entry(owner).or_insert(0) += 1;
        true
    }

    /// Releases every edge of `dependent`, decrementing each owner's live-dependent count.
    ///
    /// Returns the number of edges released.
    pub fn release(&self, dependent: ObjectId) -> usize {
        let Some((_, owners)) = self.inner.edges.remove(&dependent) else {
            return 0;
        };

        for owner in &owners {
            self.inner.counts.remove_if_mut(owner, |_, count| {
                *count = count.saturating_sub(1);
                *count == 0
            });
        }
        owners.len()
    }

    /// Returns the number of live dependents of `owner`.
    #[must_use]
    pub fn dependents(&self, owner: ObjectId) -> usize {
        self.inner.counts.get(&owner).map_or(0, |count| *count)
    }

    /// Returns `true` if the edge `dependent -> owner` is recorded.
    #[must_use]
    pub fn is_registered(&self, dependent: ObjectId, owner: ObjectId) -> bool {
        self.inner
            .edges
            .get(&dependent)
            .is_some_and(|owners| owners.contains(&owner))
    }

    /// Returns the number of dependents with at least one recorded edge.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.edges.len()
    }

    /// Returns `true` if no edges are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.edges.is_empty()
    }
}

/// Liveness node held by every tracked object.
///
/// A root anchor has no owner. A derived anchor holds its owner's anchor and has its
/// edge registered for as long as it lives.
#[derive(Debug)]
pub struct Anchor {
    id: ObjectId,
    tracker: Tracker,
    owner: Option<Arc<Anchor>>,
}

impl Anchor {
    /// Creates a root anchor with a fresh tracker.
    #[must_use]
    pub fn root() -> Arc<Anchor> {
        Arc::new(Anchor {
            id: ObjectId::next(),
            tracker: Tracker::new(),
            owner: None,
        })
    }

    /// Creates an anchor that depends on `owner`.
    #[must_use]
    pub fn derive(owner: &Arc<Anchor>) -> Arc<Anchor> {
        let id = ObjectId::next();
        owner.tracker.register(id, owner.id);
        Arc::new(Anchor {
            id,
            tracker: owner.tracker.clone(),
            owner: Some(Arc::clone(owner)),
        })
    }

    /// Returns this node's identity.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Returns the registry this node is tracked in.
    #[must_use]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Returns the identity of the owner, if any.
    #[must_use]
    pub fn owner(&self) -> Option<ObjectId> {
        self.owner.as_ref().map(|owner| owner.id)
    }

    /// Returns the identity of the root of the chain.
    #[must_use]
    pub fn root_id(&self) -> ObjectId {
        let mut node = self;
        while let Some(owner) = &node.owner {
            node = owner;
        }
        node.id
    }
}

impl Drop for Anchor {
    fn drop(&mut self) {
        if self.owner.is_some() {
            self.tracker.release(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let tracker = Tracker::new();
        let owner = ObjectId::next();
        let dependent = ObjectId::next();

        assert!(tracker.register(dependent, owner));
        assert!(!tracker.register(dependent, owner));
        assert_eq!(tracker.dependents(owner), 1);
        assert!(tracker.is_registered(dependent, owner));

        assert_eq!(tracker.release(dependent), 1);
        assert_eq!(tracker.dependents(owner), 0);
        assert_eq!(tracker.release(dependent), 0);
        assert!(tracker.is_empty());
    }

    #[test]
    fn independent_dependents() {
        let tracker = Tracker::new();
        let owner = ObjectId::next();
        let first = ObjectId::next();
        let second = ObjectId::next();

        tracker.register(first, owner);
        tracker.register(second, owner);
        assert_eq!(tracker.dependents(owner), 2);

        tracker.release(first);
        assert_eq!(tracker.dependents(owner), 1);
        assert!(!tracker.is_registered(first, owner));
        assert!(tracker.is_registered(second, owner));
    }

    #[test]
    fn anchors_chain() {
        let root = Anchor::root();
        let tracker = root.tracker().clone();
        let child = Anchor::derive(&root);
        let grandchild = Anchor::derive(&child);

        assert_eq!(tracker.dependents(root.id()), 1);
        assert_eq!(tracker.dependents(child.id()), 1);
        assert_eq!(grandchild.owner(), Some(child.id()));
        assert_eq!(grandchild.root_id(), root.id());

        let root_id = root.id();
        drop(root);
        drop(child);
        // Both still alive through the grandchild.
        assert_eq!(tracker.dependents(root_id), 1);
        assert_eq!(tracker.len(), 2);

        drop(grandchild);
        assert!(tracker.is_empty());
        assert_eq!(tracker.dependents(root_id), 0);
    }

    #[test]
    fn object_ids_are_unique() {
        let a = ObjectId::next();
        let b = ObjectId::next();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
        assert!(a.to_string().starts_with('#'));
    }
}
