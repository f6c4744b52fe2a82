//! Bounded Cache Module
//!
//! Maps record ids to values with a hard capacity. Once full the cache stops
//! growing; it never evicts, so its member set is frozen from then on.

use std::collections::HashMap;

// == Bounded Cache ==
/// Fixed-capacity id -> value map with reject-when-full insertion.
///
/// Holds no lock of its own. Backends keep it under the same lock as the
/// record map it fronts.
#[derive(Debug, Clone)]
pub struct BoundedCache {
    /// Cached values keyed by record id
    entries: HashMap<String, String>,
    /// Maximum number of entries allowed
    capacity: usize,
}

impl BoundedCache {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    // == Get ==
    /// Returns the cached value for `id`, if any.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    // == Try Insert ==
    /// Caches `value` under `id` if there is room.
    ///
    /// Re-inserting an id that is already cached replaces its value without
    /// growing the cache. Returns `true` when the value is cached afterwards.
    pub fn try_insert(&mut self, id: &str, value: &str) -> bool {
        if let Some(existing) = self.entries.get_mut(id) {
            *existing = value.to_string();
            return true;
        }
        if self.is_full() {
            return false;
        }
        self.entries.insert(id.to_string(), value.to_string());
        true
    }

    // == Contains ==
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    // == Length ==
    /// Returns the current number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured maximum size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True once no new id can be admitted.
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }
}
