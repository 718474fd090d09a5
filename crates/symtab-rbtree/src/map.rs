//! Key/value containers over the tree engine.

use core::{
  fmt,
  ops::Index,
};

use crate::{
  Compare,
  Cursor,
  Iter,
  KeyValue,
  Natural,
  RbTree,
};

/// Ordered map with unique keys.
#[derive(Clone)]
pub struct RbMap<K, V, C = Natural>
where
  C: Compare<K>,
{
  tree: RbTree<KeyValue<K, V>, C, true>,
}

impl<K, V> RbMap<K, V>
where
  Natural: Compare<K>,
{
  /// Map ordered by the key's `Ord` instance.
  pub fn new() -> Self {
    Self::with_comparator(Natural)
  }
}

impl<K, V, C> RbMap<K, V, C>
where
  C: Compare<K>,
{
  pub fn with_comparator(comp: C) -> Self {
    Self {
      tree: RbTree::with_comparator(comp),
    }
  }

  pub fn len(&self) -> usize {
    self.tree.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tree.is_empty()
  }

  pub fn clear(&mut self) {
    self.tree.clear();
  }

  /// Inserts or overwrites, handing back the value previously stored
  /// under `key`.
  pub fn insert(&mut self, key: K, value: V) -> Option<V> {
    self.tree.insert_or_assign((key, value)).1.map(|(_, v)| v)
  }

  pub fn get(&self, key: &K) -> Option<&V> {
    let cur = self.tree.find(key);
    self.tree.value(cur).map(|(_, v)| v)
  }

  pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
    let cur = self.tree.find(key);
    self.tree.value_mut(cur).map(|(_, v)| v)
  }

  pub fn contains_key(&self, key: &K) -> bool {
    self.tree.contains(key)
  }

  pub fn remove(&mut self, key: &K) -> Option<V> {
    self.tree.remove(key).map(|(_, v)| v)
  }

  /// Value under `key`, inserting `make()` first when absent.
  pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
  where
    F: FnOnce() -> V,
  {
    &mut self.tree.get_or_insert_with(key, |k| (k, make())).1
  }

  pub fn first_key_value(&self) -> Option<(&K, &V)> {
    self.tree.first().map(|(k, v)| (k, v))
  }

  pub fn last_key_value(&self) -> Option<(&K, &V)> {
    self.tree.last().map(|(k, v)| (k, v))
  }

  pub fn iter(&self) -> MapIter<'_, K, V> {
    MapIter {
      inner: self.tree.iter(),
    }
  }

  pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
    self.iter().map(|(k, _)| k)
  }

  pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> {
    self.iter().map(|(_, v)| v)
  }

  /// The backing engine, for cursor-level access.
  pub fn raw(&self) -> &RbTree<KeyValue<K, V>, C, true> {
    &self.tree
  }
}

impl<K, V, C> Default for RbMap<K, V, C>
where
  C: Compare<K> + Default,
{
  fn default() -> Self {
    Self::with_comparator(C::default())
  }
}

impl<K, V, C> Index<&K> for RbMap<K, V, C>
where
  C: Compare<K>,
{
  type Output = V;

  /// Panics when `key` is absent.
  fn index(&self, key: &K) -> &V {
    self.get(key).expect("no entry found for key")
  }
}

impl<K, V, C> Extend<(K, V)> for RbMap<K, V, C>
where
  C: Compare<K>,
{
  fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
    for (key, value) in iter {
      self.insert(key, value);
    }
  }
}

impl<K, V, C> FromIterator<(K, V)> for RbMap<K, V, C>
where
  C: Compare<K> + Default,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut map = Self::with_comparator(C::default());
    map.extend(iter);
    map
  }
}

impl<K, V, C> fmt::Debug for RbMap<K, V, C>
where
  K: fmt::Debug,
  V: fmt::Debug,
  C: Compare<K>,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

impl<'map, K, V, C> IntoIterator for &'map RbMap<K, V, C>
where
  C: Compare<K>,
{
  type Item = (&'map K, &'map V);
  type IntoIter = MapIter<'map, K, V>;

  fn into_iter(self) -> MapIter<'map, K, V> {
    self.iter()
  }
}

/// Ordered map keeping every entry inserted under an equal key, in
/// insertion order.
#[derive(Clone)]
pub struct RbMultiMap<K, V, C = Natural>
where
  C: Compare<K>,
{
  tree: RbTree<KeyValue<K, V>, C, false>,
}

impl<K, V> RbMultiMap<K, V>
where
  Natural: Compare<K>,
{
  /// Multimap ordered by the key's `Ord` instance.
  pub fn new() -> Self {
    Self::with_comparator(Natural)
  }
}

impl<K, V, C> RbMultiMap<K, V, C>
where
  C: Compare<K>,
{
  pub fn with_comparator(comp: C) -> Self {
    Self {
      tree: RbTree::with_comparator(comp),
    }
  }

  pub fn len(&self) -> usize {
    self.tree.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tree.is_empty()
  }

  pub fn clear(&mut self) {
    self.tree.clear();
  }

  pub fn insert(&mut self, key: K, value: V) -> Cursor<(K, V)> {
    self.tree.insert((key, value))
  }

  /// Value of the first entry in `key`'s run.
  pub fn get_first(&self, key: &K) -> Option<&V> {
    let cur = self.tree.find_first(key);
    self.tree.value(cur).map(|(_, v)| v)
  }

  pub fn contains_key(&self, key: &K) -> bool {
    self.tree.contains(key)
  }

  pub fn count(&self, key: &K) -> usize {
    self.tree.count(key)
  }

  /// All entries of `key`'s run, in insertion order.
  pub fn equal_range(&self, key: &K) -> MapIter<'_, K, V> {
    MapIter {
      inner: self.tree.equal_range_iter(key),
    }
  }

  /// Removes every entry under `key`, reporting how many went away.
  pub fn remove_all(&mut self, key: &K) -> usize {
    self.tree.remove_all(key)
  }

  pub fn iter(&self) -> MapIter<'_, K, V> {
    MapIter {
      inner: self.tree.iter(),
    }
  }

  pub fn raw(&self) -> &RbTree<KeyValue<K, V>, C, false> {
    &self.tree
  }
}

impl<K, V, C> Default for RbMultiMap<K, V, C>
where
  C: Compare<K> + Default,
{
  fn default() -> Self {
    Self::with_comparator(C::default())
  }
}

impl<K, V, C> Extend<(K, V)> for RbMultiMap<K, V, C>
where
  C: Compare<K>,
{
  fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
    for (key, value) in iter {
      self.insert(key, value);
    }
  }
}

impl<K, V, C> FromIterator<(K, V)> for RbMultiMap<K, V, C>
where
  C: Compare<K> + Default,
{
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut map = Self::with_comparator(C::default());
    map.extend(iter);
    map
  }
}

impl<K, V, C> fmt::Debug for RbMultiMap<K, V, C>
where
  K: fmt::Debug,
  V: fmt::Debug,
  C: Compare<K>,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_map().entries(self.iter()).finish()
  }
}

impl<'map, K, V, C> IntoIterator for &'map RbMultiMap<K, V, C>
where
  C: Compare<K>,
{
  type Item = (&'map K, &'map V);
  type IntoIter = MapIter<'map, K, V>;

  fn into_iter(self) -> MapIter<'map, K, V> {
    self.iter()
  }
}

/// In-order iterator over borrowed `(key, value)` pairs.
pub struct MapIter<'map, K, V> {
  inner: Iter<'map, (K, V)>,
}

impl<'map, K, V> Iterator for MapIter<'map, K, V> {
  type Item = (&'map K, &'map V);

  fn next(&mut self) -> Option<Self::Item> {
    self.inner.next().map(|kv| (&kv.0, &kv.1))
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    self.inner.size_hint()
  }
}

impl<K, V> DoubleEndedIterator for MapIter<'_, K, V> {
  fn next_back(&mut self) -> Option<Self::Item> {
    self.inner.next_back().map(|kv| (&kv.0, &kv.1))
  }
}

impl<K, V> ExactSizeIterator for MapIter<'_, K, V> {
  fn len(&self) -> usize {
    self.inner.len()
  }
}
