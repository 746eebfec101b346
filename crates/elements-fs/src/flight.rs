//! Write-once keyed slots with at most one in-flight fill per key.

use moka::sync::Cache;

/// A map whose entries are filled once and only replaced explicitly.
///
/// Backed by an unbounded [`moka`] cache: concurrent callers for the same
/// key wait for the first one's fill instead of repeating it, while callers
/// for other keys proceed. A failed fill stores nothing.
pub(crate) struct FlightMap<V> {
    entries: Cache<String, V>,
}

/// Marker error handed to the cache when a fill fails; the real error stays
/// with the caller that produced it.
#[derive(Debug)]
struct FillFailed;

impl<V: Clone + Send + Sync + 'static> FlightMap<V> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Cache::builder().build(),
        }
    }

    /// Return the stored value for `key`, filling it with `fill` first if
    /// needed.
    ///
    /// If another caller's concurrent fill for the same key fails, this
    /// caller runs its own `fill`.
    pub(crate) fn get_or_try_fill<E>(
        &self,
        key: &str,
        fill: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let mut fill = Some(fill);
        let mut failure = None;
        let filled = self.entries.try_get_with(key.to_string(), || {
            let fill = fill.take().ok_or(FillFailed)?;
            fill().map_err(|e| {
                failure = Some(e);
                FillFailed
            })
        });

        match filled {
            Ok(value) => Ok(value),
            Err(_) => match (failure, fill) {
                (Some(e), _) => Err(e),
                (None, Some(fill)) => self.get_or_try_fill(key, fill),
                (None, None) => unreachable!("fill for {key:?} failed without an error"),
            },
        }
    }

    /// Store `value` unless the key already holds one.
    pub(crate) fn insert_if_vacant(&self, key: &str, value: V) {
        self.entries.entry(key.to_string()).or_insert(value);
    }

    /// Store `value`, replacing any existing one.
    pub(crate) fn replace(&self, key: &str, value: V) {
        self.entries.insert(key.to_string(), value);
    }

    /// Stored value for `key`, without filling.
    pub(crate) fn get(&self, key: &str) -> Option<V> {
        self.entries.get(key)
    }

    /// Number of filled keys.
    pub(crate) fn len(&self) -> usize {
        self.entries.iter().count()
    }
}
