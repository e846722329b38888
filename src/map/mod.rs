//! Insertion-ordered map that tolerates mutation during traversal.
//!
//! [`SafeIterableMap`] exists for one reason: notification passes must
//! survive callbacks that add or remove entries in the very map being
//! walked. A native iterator would hold a borrow across the callback and
//! rule that out, so traversal is split off into a detached [`SafeCursor`]
//! that re-checks the live map on every step.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Insertion-ordered map supporting structural mutation during traversal.
///
/// Lookup and insertion are O(1) expected. Iteration order is insertion
/// order, and a [`SafeCursor`] obtained from [`cursor`] keeps that order
/// stable across removals and insertions made while the traversal is in
/// flight.
///
/// # Example
///
/// ```rust
/// use lifeline::map::SafeIterableMap;
///
/// let mut map = SafeIterableMap::new();
/// map.put_if_absent("a", 1);
/// map.put_if_absent("b", 2);
/// map.put_if_absent("a", 99); // already present, ignored
///
/// assert_eq!(map.len(), 2);
/// assert_eq!(map.get(&"a"), Some(&1));
///
/// let mut cursor = map.cursor();
/// assert_eq!(cursor.next(&map), Some((&"a", &1)));
/// map.remove(&"b");
/// assert_eq!(cursor.next(&map), None); // "b" was removed mid-traversal
/// ```
///
/// [`cursor`]: SafeIterableMap::cursor
#[derive(Clone, Debug)]
pub struct SafeIterableMap<K, V> {
    entries: HashMap<K, V>,
    order: Vec<K>,
}

impl<K: Clone + Eq + Hash, V> Default for SafeIterableMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash, V> SafeIterableMap<K, V> {
    /// Create a new empty map.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Insert `value` under `key` only if the key is absent.
    ///
    /// Returns the value now associated with the key: the existing one when
    /// the key was already present, otherwise the newly inserted one. A
    /// present key keeps its original position in the iteration order.
    pub fn put_if_absent(&mut self, key: K, value: V) -> &V {
        match self.entries.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.order.push(entry.key().clone());
                entry.insert(value)
            }
        }
    }

    /// Get the value for `key`, if present.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    /// Check whether `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove the entry for `key`, returning its value if it was present.
    ///
    /// Safe to call while a [`SafeCursor`] over this map is mid-traversal:
    /// cursors standing on the removed entry keep walking the remaining
    /// entries, and cursors that have not reached it yet skip it.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.order.retain(|k| k != key);
        }
        removed
    }

    /// The number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    ///
    /// This is a plain borrowing iterator for read passes that do not
    /// re-enter the map. Traversals that may add or remove entries must use
    /// [`cursor`] instead.
    ///
    /// [`cursor`]: SafeIterableMap::cursor
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get_key_value(key))
    }

    /// Start a mutation-tolerant traversal in insertion order.
    ///
    /// The cursor snapshots the current order but holds no borrow of the
    /// map; each [`SafeCursor::next`] call checks the key against the live
    /// map. Consequences:
    ///
    /// - removing the entry the cursor stands on does not break traversal
    ///   of the remaining entries;
    /// - a not-yet-visited entry that gets removed is skipped, never
    ///   revisited;
    /// - removing an already-visited entry has no effect on the pass;
    /// - entries inserted after the cursor was created are not yielded by
    ///   it (a fresh cursor sees them);
    /// - an entry removed and re-inserted mid-traversal is yielded at most
    ///   once.
    pub fn cursor(&self) -> SafeCursor<K> {
        SafeCursor {
            keys: self.order.clone(),
            pos: 0,
        }
    }

    /// Start a mutation-tolerant traversal in reverse insertion order.
    ///
    /// Same guarantees as [`cursor`], walking from the most recently
    /// inserted entry backwards.
    ///
    /// [`cursor`]: SafeIterableMap::cursor
    pub fn cursor_back(&self) -> SafeCursor<K> {
        let mut keys = self.order.clone();
        keys.reverse();
        SafeCursor { keys, pos: 0 }
    }
}

/// Detached traversal handle over a [`SafeIterableMap`].
///
/// Holds a snapshot of the iteration order and no borrow of the map, which
/// is what allows the map to be mutated between steps. Obtained from
/// [`SafeIterableMap::cursor`] or [`SafeIterableMap::cursor_back`].
#[derive(Clone, Debug)]
pub struct SafeCursor<K> {
    keys: Vec<K>,
    pos: usize,
}

impl<K: Clone + Eq + Hash> SafeCursor<K> {
    /// Advance to the next entry that is still live in `map`.
    ///
    /// Keys removed from the map since the cursor was created are skipped.
    /// Returns `None` once the snapshot is exhausted.
    pub fn next<'m, V>(&mut self, map: &'m SafeIterableMap<K, V>) -> Option<(&'m K, &'m V)> {
        while self.pos < self.keys.len() {
            let key = &self.keys[self.pos];
            self.pos += 1;
            if let Some(entry) = map.entries.get_key_value(key) {
                return Some(entry);
            }
        }
        None
    }
}
