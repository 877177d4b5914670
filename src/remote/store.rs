use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

/// A thread-safe key/value store used to deduplicate remote calls within one run.
///
/// Every operation holds the lock for its own duration only. There is no
/// eviction; a store lives as long as the run that created it.
#[derive(Debug)]
pub struct Store<K, V> {
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> Default for Store<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> Store<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, V>> {
        // Values are plain data, a writer that panicked cannot leave them half-updated.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn save(&self, key: K, value: V) {
        self.lock().insert(key, value);
    }

    /// Returns a copy of the stored value.
    pub fn load<Q>(&self, key: &Q) -> Option<V>
    where
        K: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.lock().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Visits every entry while holding the lock; `visit` must not touch this store.
    pub fn for_each<E>(&self, mut visit: impl FnMut(&K, &V) -> Result<(), E>) -> Result<(), E> {
        for (k, v) in self.lock().iter() {
            visit(k, v)?;
        }
        Ok(())
    }
}

/// Per-run caches for immutable remote entities, one store per entity kind.
#[derive(Debug)]
pub struct FetchCache<C, U> {
    pub commits: Store<String, C>,
    pub users: Store<String, U>,
}

impl<C: Clone, U: Clone> FetchCache<C, U> {
    pub fn new() -> Self {
        Self {
            commits: Store::new(),
            users: Store::new(),
        }
    }
}
