use std::fmt::{self, Write};

use ahash::AHashSet;
use hashbrown::HashTable;

use crate::{exception::RunResult, value::Value};

/// Insertion-ordered mapping with CPython dict semantics.
///
/// # Storage strategy
/// Uses a `HashTable<usize>` for hash lookups combined with a dense
/// `Vec<DictEntry>` that preserves insertion order (matching Python 3.7+
/// behavior). The hash table maps key hashes to indices in the entries
/// vector, giving O(1) lookups while iteration stays in insertion order.
/// Deletion shifts the dense vector, so remaining entries keep their order.
///
/// # Key equivalence
/// Keys are matched by CPython-compatible hash plus value equality, so
/// `d[1.0]`, `d[1]`, and `d[True]` all address the same slot. Unhashable
/// keys (lists, dicts) are rejected with a `TypeError` at the call site.
#[derive(Default)]
pub struct Dict {
    /// indices mapping from the entry hash to its index.
    indices: HashTable<usize>,
    /// entries is a dense vec maintaining entry order.
    entries: Vec<DictEntry>,
}

#[derive(Debug)]
struct DictEntry {
    key: Value,
    value: Value,
    /// the hash is cached here for re-indexing and insert_unique
    hash: u64,
}

impl Dict {
    /// Creates a new empty dict.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dict from key-value pairs; later duplicates overwrite earlier ones.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Value, Value)>) -> RunResult<Self> {
        let mut dict = Self::new();
        for (key, value) in pairs {
            dict.set(key, value)?;
        }
        Ok(dict)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dict has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find_index(&self, hash: u64, key: &Value) -> Option<usize> {
        let entries = &self.entries;
        self.indices
            .find(hash, |&i| entries[i].hash == hash && entries[i].key.py_eq(key))
            .copied()
    }

    /// Looks up a key, returning a clone of its value handle.
    ///
    /// Fails only if the key is unhashable.
    pub fn get(&self, key: &Value) -> RunResult<Option<Value>> {
        let hash = key.py_hash()?;
        Ok(self.find_index(hash, key).map(|i| self.entries[i].value.clone()))
    }

    /// Returns true if the key is present.
    pub fn contains(&self, key: &Value) -> RunResult<bool> {
        let hash = key.py_hash()?;
        Ok(self.find_index(hash, key).is_some())
    }

    /// Inserts or replaces a key's value. Replacement keeps the key's
    /// original insertion position, as CPython does.
    pub fn set(&mut self, key: Value, value: Value) -> RunResult<()> {
        let hash = key.py_hash()?;
        if let Some(idx) = self.find_index(hash, &key) {
            self.entries[idx].value = value;
        } else {
            let idx = self.entries.len();
            self.entries.push(DictEntry { key, value, hash });
            let entries = &self.entries;
            self.indices.insert_unique(hash, idx, |&i| entries[i].hash);
        }
        Ok(())
    }

    /// Removes a key, returning its value if it was present.
    ///
    /// Remaining entries keep their insertion order; stored indices past the
    /// removed slot are shifted down to stay in sync with the dense vector.
    pub fn remove(&mut self, key: &Value) -> RunResult<Option<Value>> {
        let hash = key.py_hash()?;
        let Some(idx) = self.find_index(hash, key) else {
            return Ok(None);
        };
        if let Ok(occupied) = self.indices.find_entry(hash, |&i| i == idx) {
            occupied.remove();
        }
        for slot in self.indices.iter_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        let entry = self.entries.remove(idx);
        Ok(Some(entry.value))
    }

    /// Returns the key at the given insertion position, if any.
    #[must_use]
    pub fn key_at(&self, index: usize) -> Option<Value> {
        self.entries.get(index).map(|e| e.key.clone())
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn items(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|e| (&e.key, &e.value))
    }

    /// Dict equality: same keys mapping to equal values, order-insensitive.
    #[must_use]
    pub fn py_eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries.iter().all(|entry| {
            other
                .find_index(entry.hash, &entry.key)
                .is_some_and(|i| other.entries[i].value.py_eq(&entry.value))
        })
    }

    pub(crate) fn repr_fmt(&self, f: &mut impl Write, seen: &mut AHashSet<usize>) -> fmt::Result {
        f.write_char('{')?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            entry.key.repr_fmt(f, seen)?;
            f.write_str(": ")?;
            entry.value.repr_fmt(f, seen)?;
        }
        f.write_char('}')
    }
}

impl fmt::Debug for Dict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut seen = AHashSet::new();
        let mut out = String::new();
        self.repr_fmt(&mut out, &mut seen)?;
        f.write_str(&out)
    }
}
