//! Key-only containers over the tree engine.

use core::fmt;

use crate::{
  Compare,
  Cursor,
  Iter,
  KeyOnly,
  Natural,
  RbTree,
};

/// Ordered set with unique keys.
#[derive(Clone)]
pub struct RbSet<K, C = Natural>
where
  C: Compare<K>,
{
  tree: RbTree<KeyOnly<K>, C, true>,
}

impl<K> RbSet<K>
where
  Natural: Compare<K>,
{
  /// Set ordered by the key's `Ord` instance.
  pub fn new() -> Self {
    Self::with_comparator(Natural)
  }
}

impl<K, C> RbSet<K, C>
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

  /// Returns whether `key` was actually added.
  pub fn insert(&mut self, key: K) -> bool {
    self.tree.insert(key).1
  }

  pub fn contains(&self, key: &K) -> bool {
    self.tree.contains(key)
  }

  /// Returns whether `key` was present.
  pub fn remove(&mut self, key: &K) -> bool {
    self.tree.remove(key).is_some()
  }

  /// Removes and hands back the stored key itself.
  pub fn take(&mut self, key: &K) -> Option<K> {
    self.tree.remove(key)
  }

  pub fn first(&self) -> Option<&K> {
    self.tree.first()
  }

  pub fn last(&self) -> Option<&K> {
    self.tree.last()
  }

  pub fn iter(&self) -> Iter<'_, K> {
    self.tree.iter()
  }

  /// The backing engine, for cursor-level access.
  pub fn raw(&self) -> &RbTree<KeyOnly<K>, C, true> {
    &self.tree
  }
}

impl<K, C> Default for RbSet<K, C>
where
  C: Compare<K> + Default,
{
  fn default() -> Self {
    Self::with_comparator(C::default())
  }
}

impl<K, C> Extend<K> for RbSet<K, C>
where
  C: Compare<K>,
{
  fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
    for key in iter {
      self.insert(key);
    }
  }
}

impl<K, C> FromIterator<K> for RbSet<K, C>
where
  C: Compare<K> + Default,
{
  fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
    let mut set = Self::with_comparator(C::default());
    set.extend(iter);
    set
  }
}

impl<K, C> fmt::Debug for RbSet<K, C>
where
  K: fmt::Debug,
  C: Compare<K>,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

impl<'set, K, C> IntoIterator for &'set RbSet<K, C>
where
  C: Compare<K>,
{
  type Item = &'set K;
  type IntoIter = Iter<'set, K>;

  fn into_iter(self) -> Iter<'set, K> {
    self.iter()
  }
}

/// Ordered set keeping duplicates, each run in insertion order.
#[derive(Clone)]
pub struct RbMultiSet<K, C = Natural>
where
  C: Compare<K>,
{
  tree: RbTree<KeyOnly<K>, C, false>,
}

impl<K> RbMultiSet<K>
where
  Natural: Compare<K>,
{
  /// Multiset ordered by the key's `Ord` instance.
  pub fn new() -> Self {
    Self::with_comparator(Natural)
  }
}

impl<K, C> RbMultiSet<K, C>
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

  pub fn insert(&mut self, key: K) -> Cursor<K> {
    self.tree.insert(key)
  }

  pub fn contains(&self, key: &K) -> bool {
    self.tree.contains(key)
  }

  pub fn count(&self, key: &K) -> usize {
    self.tree.count(key)
  }

  /// All entries equal to `key`, contiguous and in insertion order.
  pub fn equal_range(&self, key: &K) -> Iter<'_, K> {
    self.tree.equal_range_iter(key)
  }

  /// Removes every entry equal to `key`, reporting how many went away.
  pub fn remove_all(&mut self, key: &K) -> usize {
    self.tree.remove_all(key)
  }

  pub fn first(&self) -> Option<&K> {
    self.tree.first()
  }

  pub fn last(&self) -> Option<&K> {
    self.tree.last()
  }

  pub fn iter(&self) -> Iter<'_, K> {
    self.tree.iter()
  }

  pub fn raw(&self) -> &RbTree<KeyOnly<K>, C, false> {
    &self.tree
  }
}

impl<K, C> Default for RbMultiSet<K, C>
where
  C: Compare<K> + Default,
{
  fn default() -> Self {
    Self::with_comparator(C::default())
  }
}

impl<K, C> Extend<K> for RbMultiSet<K, C>
where
  C: Compare<K>,
{
  fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
    for key in iter {
      self.insert(key);
    }
  }
}

impl<K, C> FromIterator<K> for RbMultiSet<K, C>
where
  C: Compare<K> + Default,
{
  fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
    let mut set = Self::with_comparator(C::default());
    set.extend(iter);
    set
  }
}

impl<K, C> fmt::Debug for RbMultiSet<K, C>
where
  K: fmt::Debug,
  C: Compare<K>,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

impl<'set, K, C> IntoIterator for &'set RbMultiSet<K, C>
where
  C: Compare<K>,
{
  type Item = &'set K;
  type IntoIter = Iter<'set, K>;

  fn into_iter(self) -> Iter<'set, K> {
    self.iter()
  }
}
