/// Helper macro for reading locked items
///
/// A poisoned lock is recovered: every writer leaves the guarded state consistent between
/// statements, so the data behind it stays usable after a panic elsewhere.
///
/// ```rust, ignore
///  let store = read_lock!(self.store);
///  println!("{}", store.entries.len());
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for writing to locked items
///
/// Recovers a poisoned lock like [`read_lock!`].
///
/// ```rust, ignore
///  let mut store = write_lock!(self.store);
///  store.entries.clear();
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let len = with_read!(self.store, |store: &Store| store.entries.len());
/// ```
macro_rules! with_read {
    ($rwlock:expr, $closure:expr) => {{
        let guard = read_lock!($rwlock);
        $closure(&*guard)
    }};
}
