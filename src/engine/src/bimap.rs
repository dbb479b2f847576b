//! One-to-one map queryable from both sides.

use core::borrow::Borrow;
use core::fmt;
use core::hash::Hash;
use std::collections::hash_map::{self, HashMap};

/// A 1:1 association between keys and values.
///
/// Both indices are updated by the same call, so `get(k) == Some(v)` holds
/// exactly when `get_by_value(v) == Some(k)`.
#[derive(Clone)]
pub struct BidirectionalMap<K, V> {
    forward: HashMap<K, V>,
    inverse: HashMap<V, K>,
}

impl<K, V> BidirectionalMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            forward: HashMap::new(),
            inverse: HashMap::new(),
        }
    }

    /// Pair `key` with `value`.
    ///
    /// Any previous partner of `key` or of `value` is unpaired first.
    pub fn set(&mut self, key: K, value: V) {
        if let Some(old_value) = self.forward.remove(&key) {
            self.inverse.remove(&old_value);
        }
        if let Some(old_key) = self.inverse.remove(&value) {
            self.forward.remove(&old_key);
        }
        self.forward.insert(key.clone(), value.clone());
        self.inverse.insert(value, key);
    }

    /// Value paired with `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.get(key)
    }

    /// Inverse lookup.
    pub fn get_by_value<Q>(&self, value: &Q) -> Option<&K>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inverse.get(value)
    }

    /// Whether `key` is paired.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.contains_key(key)
    }

    /// Whether `value` is paired.
    pub fn contains_value<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inverse.contains_key(value)
    }

    /// Remove a pair by key, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.forward.remove(key)?;
        self.inverse.remove(&value);
        Some(value)
    }

    /// Remove a pair by value, returning its key.
    pub fn remove_by_value<Q>(&mut self, value: &Q) -> Option<K>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let key = self.inverse.remove(value)?;
        self.forward.remove(&key);
        Some(key)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Whether the map holds no pair.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Remove every pair.
    pub fn clear(&mut self) {
        self.forward.clear();
        self.inverse.clear();
    }

    /// Pairs in arbitrary order.
    pub fn iter(&self) -> hash_map::Iter<'_, K, V> {
        self.forward.iter()
    }

    /// Keys in arbitrary order.
    pub fn keys(&self) -> hash_map::Keys<'_, K, V> {
        self.forward.keys()
    }

    /// Values in arbitrary order.
    pub fn values(&self) -> hash_map::Keys<'_, V, K> {
        self.inverse.keys()
    }
}

impl<K, V> Default for BidirectionalMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for BidirectionalMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BidirectionalMap").field(&self.forward).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a BidirectionalMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = hash_map::Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.forward.iter()
    }
}
