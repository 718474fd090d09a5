#![cfg_attr(not(test), no_std)]

//! Ordered symbol tables over one red-black tree engine.
//!
//! [`RbTree`] is the engine: an intrusive-style node graph hanging off a
//! single header node whose parent link addresses the root and whose
//! left/right links cache the extremes. The map/set containers in
//! [`map`] and [`set`] are thin shapes over it, selected by a key
//! projection ([`KeySelect`]) and a compile-time uniqueness flag.

extern crate alloc;

use core::{
  cmp::Ordering,
  marker::PhantomData,
  ptr::NonNull,
};

use alloc::boxed::Box;

use crate::node::{
  Color,
  Node,
  Side,
  box_node,
  copy_nodes,
  drop_subtree,
  is_red,
  tree_max,
  tree_min,
  tree_next,
  tree_prev,
};

mod dump;
mod node;

pub mod cursor;
pub mod map;
pub mod set;

pub use crate::cursor::{
  Cursor,
  Iter,
};
pub use crate::dump::Dump;

pub mod prelude {
  pub use crate::map::{
    RbMap,
    RbMultiMap,
  };
  pub use crate::set::{
    RbSet,
    RbMultiSet,
  };
  pub use crate::{
    CmpFn,
    Compare,
    Natural,
    RbTree,
  };
}

/// Key projection distinguishing set-shaped from map-shaped storage.
pub trait KeySelect {
  type Value;
  type Key;

  fn key(value: &Self::Value) -> &Self::Key;
}

/// Set shape: the stored value is the key.
pub struct KeyOnly<K>(PhantomData<K>);

/// Map shape: the stored value is a `(key, mapped)` pair.
pub struct KeyValue<K, V>(PhantomData<(K, V)>);

impl<K> KeySelect for KeyOnly<K> {
  type Value = K;
  type Key = K;

  fn key(value: &K) -> &K {
    value
  }
}

impl<K, V> KeySelect for KeyValue<K, V> {
  type Value = (K, V);
  type Key = K;

  fn key(value: &(K, V)) -> &K {
    &value.0
  }
}

/// Three-way key ordering; `Less` means the first argument sorts earlier.
pub trait Compare<K> {
  fn compare(&self, a: &K, b: &K) -> Ordering;
}

/// Orders keys by their `Ord` instance.
#[derive(Debug, Default, Clone, Copy)]
pub struct Natural;

impl<K: Ord> Compare<K> for Natural {
  fn compare(&self, a: &K, b: &K) -> Ordering {
    a.cmp(b)
  }
}

/// Adapter turning an ordering closure into a [`Compare`].
#[derive(Debug, Clone, Copy)]
pub struct CmpFn<F>(pub F);

impl<K, F> Compare<K> for CmpFn<F>
where
  F: Fn(&K, &K) -> Ordering,
{
  fn compare(&self, a: &K, b: &K) -> Ordering {
    (self.0)(a, b)
  }
}

enum InsertPos<T> {
  Existing(NonNull<Node<T>>),
  Slot(NonNull<Node<T>>, Side),
}

enum HintPos<T> {
  Attach(NonNull<Node<T>>, Side),
  Existing(NonNull<Node<T>>),
  Descend,
}

/// Red-black tree keyed through `S`, ordered by `C`. With `UNIQUE` the
/// tree rejects equivalent keys; without it equivalent keys form one
/// contiguous run in insertion order.
pub struct RbTree<S, C, const UNIQUE: bool>
where
  S: KeySelect,
  C: Compare<S::Key>,
{
  header: NonNull<Node<S::Value>>,
  count: usize,
  comp: C,
  _marker: PhantomData<S::Value>,
}

impl<S, C, const UNIQUE: bool> RbTree<S, C, UNIQUE>
where
  S: KeySelect,
  C: Compare<S::Key>,
{
  pub fn new() -> Self
  where
    C: Default,
  {
    Self::with_comparator(C::default())
  }

  pub fn with_comparator(comp: C) -> Self {
    let header = box_node(Node::header());
    let mut tree = Self {
      header,
      count: 0,
      comp,
      _marker: PhantomData,
    };
    tree.reset_header();
    tree
  }

  /// Self-referential empty encoding: the header is its own parent and
  /// both extreme caches.
  fn reset_header(&mut self) {
    let header = self.header;
    let link = unsafe { &mut (*self.header.as_ptr()).link };
    *link.parent_mut() = header;
    *link.left_mut() = Some(header);
    *link.right_mut() = Some(header);
  }

  pub(crate) fn root(&self) -> NonNull<Node<S::Value>> {
    unsafe { self.header.as_ref() }.link.parent()
  }

  pub(crate) fn leftmost(&self) -> NonNull<Node<S::Value>> {
    unsafe { self.header.as_ref() }
      .link
      .left()
      .expect("header left link")
  }

  pub(crate) fn rightmost(&self) -> NonNull<Node<S::Value>> {
    unsafe { self.header.as_ref() }
      .link
      .right()
      .expect("header right link")
  }

  fn node_key(&self, node: NonNull<Node<S::Value>>) -> &S::Key {
    unsafe { S::key((*node.as_ptr()).value.assume_init_ref()) }
  }

  pub(crate) fn cursor(&self, node: NonNull<Node<S::Value>>) -> Cursor<S::Value> {
    Cursor::new(node, self.header)
  }

  fn check_cursor(&self, cur: Cursor<S::Value>) {
    debug_assert!(
      cur.owner() == self.header.as_ptr() as *const (),
      "cursor used on a tree it does not belong to"
    );
  }

  pub fn len(&self) -> usize {
    self.count
  }

  pub fn is_empty(&self) -> bool {
    self.count == 0
  }

  pub fn clear(&mut self) {
    if !self.is_empty() {
      unsafe { drop_subtree(self.root()) };
      self.count = 0;
      self.reset_header();
    }
  }

  /* cursors */

  pub fn begin(&self) -> Cursor<S::Value> {
    self.cursor(self.leftmost())
  }

  pub fn end(&self) -> Cursor<S::Value> {
    self.cursor(self.header)
  }

  /// Steps to the in-order successor. Advancing the end cursor is a
  /// caller error; release builds leave the cursor where it is.
  pub fn next(&self, cur: Cursor<S::Value>) -> Cursor<S::Value> {
    self.check_cursor(cur);
    debug_assert!(cur.node() != self.header, "advanced the end cursor");
    if cur.node() == self.header {
      return cur;
    }
    self.cursor(unsafe { tree_next(cur.node(), self.header) })
  }

  /// Steps to the in-order predecessor. Stepping back from the end
  /// cursor lands on the maximum, which is how reverse traversal starts.
  pub fn prev(&self, cur: Cursor<S::Value>) -> Cursor<S::Value> {
    self.check_cursor(cur);
    self.cursor(unsafe { tree_prev(cur.node(), self.header) })
  }

  /// The value at `cur`, or `None` for the end cursor.
  pub fn value(&self, cur: Cursor<S::Value>) -> Option<&S::Value> {
    self.check_cursor(cur);
    if cur.node() == self.header {
      return None;
    }
    Some(unsafe { (*cur.node().as_ptr()).value.assume_init_ref() })
  }

  /// Key and stored value mutate together, so this stays crate-private;
  /// the map wrappers only ever hand out the mapped half.
  pub(crate) fn value_mut(&mut self, cur: Cursor<S::Value>) -> Option<&mut S::Value> {
    self.check_cursor(cur);
    if cur.node() == self.header {
      return None;
    }
    Some(unsafe { (*cur.node().as_ptr()).value.assume_init_mut() })
  }

  pub fn first(&self) -> Option<&S::Value> {
    self.value(self.begin())
  }

  pub fn last(&self) -> Option<&S::Value> {
    if self.is_empty() {
      return None;
    }
    Some(unsafe { (*self.rightmost().as_ptr()).value.assume_init_ref() })
  }

  pub fn iter(&self) -> Iter<'_, S::Value> {
    Iter::new(self.leftmost(), self.header, self.count, self.header)
  }

  pub(crate) fn range_iter(
    &self,
    lo: NonNull<Node<S::Value>>,
    hi: NonNull<Node<S::Value>>,
  ) -> Iter<'_, S::Value> {
    let mut len = 0;
    let mut cur = lo;
    while cur != hi {
      len += 1;
      cur = unsafe { tree_next(cur, self.header) };
    }
    Iter::new(lo, hi, len, self.header)
  }

  /* lookup */

  fn find_node(&self, key: &S::Key) -> NonNull<Node<S::Value>> {
    if self.is_empty() {
      return self.header;
    }
    let mut x = Some(self.root());
    while let Some(n) = x {
      match self.comp.compare(key, self.node_key(n)) {
        Ordering::Less => x = unsafe { n.as_ref() }.link.left(),
        Ordering::Greater => x = unsafe { n.as_ref() }.link.right(),
        Ordering::Equal => return n,
      }
    }
    self.header
  }

  fn lower_bound_node(&self, key: &S::Key) -> NonNull<Node<S::Value>> {
    let mut best = self.header;
    let mut x = (!self.is_empty()).then(|| self.root());
    while let Some(n) = x {
      if self.comp.compare(self.node_key(n), key) == Ordering::Less {
        x = unsafe { n.as_ref() }.link.right();
      } else {
        best = n;
        x = unsafe { n.as_ref() }.link.left();
      }
    }
    best
  }

  fn upper_bound_node(&self, key: &S::Key) -> NonNull<Node<S::Value>> {
    let mut best = self.header;
    let mut x = (!self.is_empty()).then(|| self.root());
    while let Some(n) = x {
      if self.comp.compare(key, self.node_key(n)) == Ordering::Less {
        best = n;
        x = unsafe { n.as_ref() }.link.left();
      } else {
        x = unsafe { n.as_ref() }.link.right();
      }
    }
    best
  }

  /// Cursor to an entry with an equivalent key, or the end cursor.
  pub fn find(&self, key: &S::Key) -> Cursor<S::Value> {
    self.cursor(self.find_node(key))
  }

  pub fn contains(&self, key: &S::Key) -> bool {
    self.find_node(key) != self.header
  }

  /// First position not ordered before `key`.
  pub fn lower_bound(&self, key: &S::Key) -> Cursor<S::Value> {
    self.cursor(self.lower_bound_node(key))
  }

  /// First position ordered strictly after `key`.
  pub fn upper_bound(&self, key: &S::Key) -> Cursor<S::Value> {
    self.cursor(self.upper_bound_node(key))
  }

  /* insertion */

  /// Leaf slot a descent from the root lands on. With `UNIQUE`, meeting
  /// an equivalent key stops the descent; otherwise equivalence keeps
  /// descending right so a new duplicate lands after the ones already
  /// present.
  fn insert_pos(&self, key: &S::Key) -> InsertPos<S::Value> {
    if self.is_empty() {
      return InsertPos::Slot(self.header, Side::Left);
    }
    let mut parent = self.root();
    loop {
      let go_left = match self.comp.compare(key, self.node_key(parent)) {
        Ordering::Less => true,
        Ordering::Greater => false,
        Ordering::Equal => {
          if UNIQUE {
            return InsertPos::Existing(parent);
          }
          false
        }
      };
      let next = if go_left {
        unsafe { parent.as_ref() }.link.left()
      } else {
        unsafe { parent.as_ref() }.link.right()
      };
      match next {
        Some(n) => parent = n,
        None => {
          let side = if go_left { Side::Left } else { Side::Right };
          return InsertPos::Slot(parent, side);
        }
      }
    }
  }

  /// Attaches a fresh red leaf under `parent`, refreshes the extreme
  /// caches, and rebalances if the parent is red. The first node becomes
  /// the black root.
  fn insert_leaf(
    &mut self,
    parent: NonNull<Node<S::Value>>,
    side: Side,
    value: S::Value,
  ) -> NonNull<Node<S::Value>> {
    let node = box_node(Node::leaf(value, parent));
    if parent == self.header {
      unsafe {
        *(*node.as_ptr()).link.color_mut() = Color::Black;
        let link = &mut (*self.header.as_ptr()).link;
        *link.parent_mut() = node;
        *link.left_mut() = Some(node);
        *link.right_mut() = Some(node);
      }
      self.count = 1;
      return node;
    }
    unsafe {
      match side {
        Side::Left => {
          *(*parent.as_ptr()).link.left_mut() = Some(node);
          if parent == self.leftmost() {
            *(*self.header.as_ptr()).link.left_mut() = Some(node);
          }
        }
        Side::Right => {
          *(*parent.as_ptr()).link.right_mut() = Some(node);
          if parent == self.rightmost() {
            *(*self.header.as_ptr()).link.right_mut() = Some(node);
          }
        }
      }
    }
    self.count += 1;
    if is_red(Some(parent)) {
      unsafe { self.insert_fixup(node) };
    }
    node
  }

  /// Restores the color invariants upward from a freshly attached red
  /// leaf: a red uncle pushes the violation to the grandparent, a black
  /// uncle resolves it with one or two rotations.
  unsafe fn insert_fixup(&mut self, mut x: NonNull<Node<S::Value>>) {
    unsafe {
      loop {
        let parent = x.as_ref().link.parent();
        if parent == self.header || !is_red(Some(parent)) {
          break;
        }
        // a red parent is never the root, so the grandparent is real
        let gp = parent.as_ref().link.parent();
        if gp.as_ref().link.left() == Some(parent) {
          if is_red(gp.as_ref().link.right()) {
            flip_colors(gp);
            x = gp;
          } else {
            if parent.as_ref().link.right() == Some(x) {
              x = parent;
              self.rotate_left(x);
            }
            self.rotate_right(gp);
            let top = x.as_ref().link.parent();
            *(*top.as_ptr()).link.color_mut() = Color::Black;
            *(*gp.as_ptr()).link.color_mut() = Color::Red;
          }
        } else {
          if is_red(gp.as_ref().link.left()) {
            flip_colors(gp);
            x = gp;
          } else {
            if parent.as_ref().link.left() == Some(x) {
              x = parent;
              self.rotate_right(x);
            }
            self.rotate_left(gp);
            let top = x.as_ref().link.parent();
            *(*top.as_ptr()).link.color_mut() = Color::Black;
            *(*gp.as_ptr()).link.color_mut() = Color::Red;
          }
        }
      }
      let root = self.root();
      *(*root.as_ptr()).link.color_mut() = Color::Black;
    }
  }

  /// lower_bound that also remembers the leaf slot the descent ended in,
  /// so a miss can insert right there without a second descent.
  fn lower_bound_slot(
    &self,
    key: &S::Key,
  ) -> (NonNull<Node<S::Value>>, NonNull<Node<S::Value>>, Side) {
    if self.is_empty() {
      return (self.header, self.header, Side::Left);
    }
    let mut bound = self.header;
    let mut node = self.root();
    loop {
      let (next, side) = if self.comp.compare(self.node_key(node), key) == Ordering::Less {
        (unsafe { node.as_ref() }.link.right(), Side::Right)
      } else {
        bound = node;
        (unsafe { node.as_ref() }.link.left(), Side::Left)
      };
      match next {
        Some(n) => node = n,
        None => return (bound, node, side),
      }
    }
  }

  /* removal */

  /// Unlinks the node at `cur` and returns the cursor to its in-order
  /// successor. Erasing the end cursor is a caller error; release builds
  /// return it unchanged.
  pub fn erase(&mut self, cur: Cursor<S::Value>) -> Cursor<S::Value> {
    self.check_cursor(cur);
    debug_assert!(cur.node() != self.header, "erased the end cursor");
    if cur.node() == self.header {
      return cur;
    }
    let (next, _) = unsafe { self.erase_node(cur.node()) };
    self.cursor(next)
  }

  /// Erases `[first, last)` one node at a time; the full range short
  /// circuits into `clear`.
  pub fn erase_range(
    &mut self,
    first: Cursor<S::Value>,
    last: Cursor<S::Value>,
  ) -> Cursor<S::Value> {
    self.check_cursor(first);
    self.check_cursor(last);
    if first.node() == self.leftmost() && last.node() == self.header {
      self.clear();
      return self.end();
    }
    let mut cur = first;
    while cur != last {
      cur = self.erase(cur);
    }
    cur
  }

  /// Transplant deletion: a node with at most one child is spliced out
  /// directly, a node with two children swaps places with its in-order
  /// successor (which keeps the removed node's color). If the color that
  /// left the tree was black, the fixup loop repairs black heights.
  unsafe fn erase_node(&mut self, z: NonNull<Node<S::Value>>) -> (NonNull<Node<S::Value>>, S::Value) {
    unsafe {
      let next = tree_next(z, self.header);

      if self.count == 1 {
        self.reset_header();
        self.count = 0;
        let node = Box::from_raw(z.as_ptr());
        return (self.header, node.value.assume_init());
      }

      if z == self.leftmost() {
        *(*self.header.as_ptr()).link.left_mut() = Some(next);
      } else if z == self.rightmost() {
        *(*self.header.as_ptr()).link.right_mut() = Some(tree_prev(z, self.header));
      }

      let z_left = z.as_ref().link.left();
      let z_right = z.as_ref().link.right();
      let mut removed_color = z.as_ref().link.color();
      let x: Option<NonNull<Node<S::Value>>>;
      let x_parent: NonNull<Node<S::Value>>;

      match (z_left, z_right) {
        (None, right) => {
          x = right;
          x_parent = z.as_ref().link.parent();
          self.replace(z, x);
        }
        (left @ Some(_), None) => {
          x = left;
          x_parent = z.as_ref().link.parent();
          self.replace(z, x);
        }
        (Some(zl), Some(zr)) => {
          let y = tree_min(zr);
          removed_color = y.as_ref().link.color();
          x = y.as_ref().link.right();
          if y == zr {
            x_parent = y;
          } else {
            x_parent = y.as_ref().link.parent();
            self.replace(y, x);
            *(*y.as_ptr()).link.right_mut() = Some(zr);
            *(*zr.as_ptr()).link.parent_mut() = y;
          }
          self.replace(z, Some(y));
          *(*y.as_ptr()).link.left_mut() = Some(zl);
          *(*zl.as_ptr()).link.parent_mut() = y;
          *(*y.as_ptr()).link.color_mut() = z.as_ref().link.color();
        }
      }

      if removed_color == Color::Black {
        self.erase_fixup(x, x_parent);
      }

      self.count -= 1;
      let node = Box::from_raw(z.as_ptr());
      (next, node.value.assume_init())
    }
  }

  /// Walks the double-black deficiency up through the classic four
  /// sibling cases (mirrored), then blackens whatever node it settled on.
  unsafe fn erase_fixup(
    &mut self,
    mut x: Option<NonNull<Node<S::Value>>>,
    mut x_parent: NonNull<Node<S::Value>>,
  ) {
    unsafe {
      while x != Some(self.root()) && !is_red(x) {
        if x == x_parent.as_ref().link.left() {
          let mut w = x_parent
            .as_ref()
            .link
            .right()
            .expect("erase_fixup: sibling");
          if is_red(Some(w)) {
            // red sibling: rotate it over the parent, leaving a black one
            self.rotate_left(x_parent);
            *(*x_parent.as_ptr()).link.color_mut() = Color::Red;
            *(*w.as_ptr()).link.color_mut() = Color::Black;
            w = x_parent
              .as_ref()
              .link
              .right()
              .expect("erase_fixup: sibling");
          }
          if !is_red(w.as_ref().link.left()) && !is_red(w.as_ref().link.right()) {
            // both sibling children black: push the deficiency up
            *(*w.as_ptr()).link.color_mut() = Color::Red;
            x = Some(x_parent);
            x_parent = x_parent.as_ref().link.parent();
          } else {
            if !is_red(w.as_ref().link.right()) {
              // near child red, far child black: slide the red outward
              let wl = w.as_ref().link.left().expect("erase_fixup: near child");
              *(*wl.as_ptr()).link.color_mut() = Color::Black;
              *(*w.as_ptr()).link.color_mut() = Color::Red;
              self.rotate_right(w);
              w = x_parent
                .as_ref()
                .link
                .right()
                .expect("erase_fixup: sibling");
            }
            // far child red: one rotation pays the missing black
            self.rotate_left(x_parent);
            *(*w.as_ptr()).link.color_mut() = x_parent.as_ref().link.color();
            *(*x_parent.as_ptr()).link.color_mut() = Color::Black;
            let wr = w.as_ref().link.right().expect("erase_fixup: far child");
            *(*wr.as_ptr()).link.color_mut() = Color::Black;
            break;
          }
        } else {
          let mut w = x_parent.as_ref().link.left().expect("erase_fixup: sibling");
          if is_red(Some(w)) {
            self.rotate_right(x_parent);
            *(*x_parent.as_ptr()).link.color_mut() = Color::Red;
            *(*w.as_ptr()).link.color_mut() = Color::Black;
            w = x_parent.as_ref().link.left().expect("erase_fixup: sibling");
          }
          if !is_red(w.as_ref().link.right()) && !is_red(w.as_ref().link.left()) {
            *(*w.as_ptr()).link.color_mut() = Color::Red;
            x = Some(x_parent);
            x_parent = x_parent.as_ref().link.parent();
          } else {
            if !is_red(w.as_ref().link.left()) {
              let wr = w.as_ref().link.right().expect("erase_fixup: near child");
              *(*wr.as_ptr()).link.color_mut() = Color::Black;
              *(*w.as_ptr()).link.color_mut() = Color::Red;
              self.rotate_left(w);
              w = x_parent.as_ref().link.left().expect("erase_fixup: sibling");
            }
            self.rotate_right(x_parent);
            *(*w.as_ptr()).link.color_mut() = x_parent.as_ref().link.color();
            *(*x_parent.as_ptr()).link.color_mut() = Color::Black;
            let wl = w.as_ref().link.left().expect("erase_fixup: far child");
            *(*wl.as_ptr()).link.color_mut() = Color::Black;
            break;
          }
        }
      }
      if let Some(x) = x {
        *(*x.as_ptr()).link.color_mut() = Color::Black;
      }
    }
  }

  /* structure */

  /// Points `x`'s parent at `y` instead; subtrees stay the caller's
  /// problem. The root case shows up as the parent being the header.
  unsafe fn replace(
    &mut self,
    x: NonNull<Node<S::Value>>,
    y: Option<NonNull<Node<S::Value>>>,
  ) {
    unsafe {
      let xp = x.as_ref().link.parent();
      let xp_link = &mut (*xp.as_ptr()).link;
      if xp == self.header {
        *xp_link.parent_mut() = y.unwrap_or(self.header);
      } else if xp_link.left() == Some(x) {
        *xp_link.left_mut() = y;
      } else {
        *xp_link.right_mut() = y;
      }
      if let Some(y) = y {
        *(*y.as_ptr()).link.parent_mut() = xp;
      }
    }
  }

  unsafe fn rotate_left(&mut self, a: NonNull<Node<S::Value>>) {
    unsafe {
      let b = a.as_ref().link.right().expect("rotate_left: right child");
      let b_left = b.as_ref().link.left();
      *(*a.as_ptr()).link.right_mut() = b_left;
      if let Some(y) = b_left {
        *(*y.as_ptr()).link.parent_mut() = a;
      }
      self.replace(a, Some(b));
      *(*b.as_ptr()).link.left_mut() = Some(a);
      *(*a.as_ptr()).link.parent_mut() = b;
    }
  }

  unsafe fn rotate_right(&mut self, a: NonNull<Node<S::Value>>) {
    unsafe {
      let b = a.as_ref().link.left().expect("rotate_right: left child");
      let b_right = b.as_ref().link.right();
      *(*a.as_ptr()).link.left_mut() = b_right;
      if let Some(y) = b_right {
        *(*y.as_ptr()).link.parent_mut() = a;
      }
      self.replace(a, Some(b));
      *(*b.as_ptr()).link.right_mut() = Some(a);
      *(*a.as_ptr()).link.parent_mut() = b;
    }
  }

  /* introspection */

  /// Nodes on the longest root path; 0 for the empty tree.
  pub fn height(&self) -> usize {
    if self.is_empty() {
      return 0;
    }
    unsafe { subtree_height(Some(self.root())) }
  }

  /// Height of the subtree hanging off `cur`.
  pub fn height_below(&self, cur: Cursor<S::Value>) -> usize {
    self.check_cursor(cur);
    if cur.node() == self.header {
      return 0;
    }
    unsafe { subtree_height(Some(cur.node())) }
  }

  /// Full structural audit: black root, no red-red edge, equal black
  /// heights, correct extreme caches, sorted walk, matching length.
  /// Meant for tests, not production call sites.
  pub fn is_rb_tree(&self) -> bool {
    if self.is_empty() {
      return true;
    }
    let root = self.root();
    if is_red(Some(root)) {
      return false;
    }
    unsafe {
      if self.leftmost() != tree_min(root) || self.rightmost() != tree_max(root) {
        return false;
      }
      if !colors_ok(root) || black_height(Some(root)).is_none() {
        return false;
      }
    }
    let mut walked = 0;
    let mut prev: Option<&S::Value> = None;
    for value in self.iter() {
      if let Some(prev) = prev {
        let ord = self.comp.compare(S::key(prev), S::key(value));
        let out_of_order = if UNIQUE {
          ord != Ordering::Less
        } else {
          ord == Ordering::Greater
        };
        if out_of_order {
          return false;
        }
      }
      prev = Some(value);
      walked += 1;
    }
    walked == self.count
  }
}

impl<S, C> RbTree<S, C, true>
where
  S: KeySelect,
  C: Compare<S::Key>,
{
  /// Inserts `value` unless an equivalent key is present; the flag tells
  /// whether the returned cursor points at a fresh entry.
  pub fn insert(&mut self, value: S::Value) -> (Cursor<S::Value>, bool) {
    match self.insert_pos(S::key(&value)) {
      InsertPos::Existing(n) => (self.cursor(n), false),
      InsertPos::Slot(parent, side) => {
        let n = self.insert_leaf(parent, side, value);
        (self.cursor(n), true)
      }
    }
  }

  /// Like [`insert`](Self::insert) but an existing entry is overwritten,
  /// handing the previous value back.
  pub fn insert_or_assign(&mut self, value: S::Value) -> (Cursor<S::Value>, Option<S::Value>) {
    match self.insert_pos(S::key(&value)) {
      InsertPos::Existing(n) => {
        let old = unsafe { core::mem::replace((*n.as_ptr()).value.assume_init_mut(), value) };
        (self.cursor(n), Some(old))
      }
      InsertPos::Slot(parent, side) => {
        let n = self.insert_leaf(parent, side, value);
        (self.cursor(n), None)
      }
    }
  }

  /// Insertion that first verifies `hint` against its neighbors for an
  /// O(1) attach, falling back to the full descent whenever the hint
  /// does not check out.
  pub fn insert_with_hint(
    &mut self,
    hint: Cursor<S::Value>,
    value: S::Value,
  ) -> (Cursor<S::Value>, bool) {
    self.check_cursor(hint);
    if self.is_empty() {
      let n = self.insert_leaf(self.header, Side::Left, value);
      return (self.cursor(n), true);
    }
    match self.hint_pos_unique(hint.node(), S::key(&value)) {
      HintPos::Attach(parent, side) => {
        let n = self.insert_leaf(parent, side, value);
        (self.cursor(n), true)
      }
      HintPos::Existing(n) => (self.cursor(n), false),
      HintPos::Descend => self.insert(value),
    }
  }

  fn hint_pos_unique(&self, h: NonNull<Node<S::Value>>, key: &S::Key) -> HintPos<S::Value> {
    if h == self.header {
      // end hint: only good if the key goes past the maximum
      let max = self.rightmost();
      return if self.comp.compare(self.node_key(max), key) == Ordering::Less {
        HintPos::Attach(max, Side::Right)
      } else {
        HintPos::Descend
      };
    }
    match self.comp.compare(key, self.node_key(h)) {
      Ordering::Less => {
        if h == self.leftmost() {
          return HintPos::Attach(h, Side::Left);
        }
        let prev = unsafe { tree_prev(h, self.header) };
        if self.comp.compare(self.node_key(prev), key) == Ordering::Less {
          // key sits strictly between prev and the hint
          if unsafe { prev.as_ref() }.link.right().is_none() {
            HintPos::Attach(prev, Side::Right)
          } else {
            HintPos::Attach(h, Side::Left)
          }
        } else {
          HintPos::Descend
        }
      }
      Ordering::Greater => {
        if h == self.rightmost() {
          return HintPos::Attach(h, Side::Right);
        }
        let next = unsafe { tree_next(h, self.header) };
        if self.comp.compare(key, self.node_key(next)) == Ordering::Less {
          if unsafe { next.as_ref() }.link.left().is_none() {
            HintPos::Attach(next, Side::Left)
          } else {
            HintPos::Attach(h, Side::Right)
          }
        } else {
          HintPos::Descend
        }
      }
      Ordering::Equal => HintPos::Existing(h),
    }
  }

  pub fn count(&self, key: &S::Key) -> usize {
    usize::from(self.contains(key))
  }

  /// `(first, one-past)` of the at most one entry matching `key`.
  pub fn equal_range(&self, key: &S::Key) -> (Cursor<S::Value>, Cursor<S::Value>) {
    let first = self.lower_bound_node(key);
    let second = if first != self.header
      && self.comp.compare(key, self.node_key(first)) == Ordering::Equal
    {
      unsafe { tree_next(first, self.header) }
    } else {
      first
    };
    (self.cursor(first), self.cursor(second))
  }

  pub fn equal_range_iter(&self, key: &S::Key) -> Iter<'_, S::Value> {
    let (lo, hi) = self.equal_range(key);
    self.range_iter(lo.node(), hi.node())
  }

  /// Removes the entry with an equivalent key, handing its value back.
  pub fn remove(&mut self, key: &S::Key) -> Option<S::Value> {
    let n = self.find_node(key);
    if n == self.header {
      return None;
    }
    let (_, value) = unsafe { self.erase_node(n) };
    Some(value)
  }

  /// Value for `key`, inserting `make(key)` first on a miss. The lookup
  /// descent doubles as the insertion descent.
  pub fn get_or_insert_with<F>(&mut self, key: S::Key, make: F) -> &mut S::Value
  where
    F: FnOnce(S::Key) -> S::Value,
  {
    let (bound, parent, side) = self.lower_bound_slot(&key);
    if bound != self.header && self.comp.compare(&key, self.node_key(bound)) == Ordering::Equal {
      return unsafe { (*bound.as_ptr()).value.assume_init_mut() };
    }
    let n = self.insert_leaf(parent, side, make(key));
    unsafe { (*n.as_ptr()).value.assume_init_mut() }
  }
}

impl<S, C> RbTree<S, C, false>
where
  S: KeySelect,
  C: Compare<S::Key>,
{
  /// Inserts unconditionally; a duplicate key lands at the end of its
  /// run, so equal keys read back in insertion order.
  pub fn insert(&mut self, value: S::Value) -> Cursor<S::Value> {
    match self.insert_pos(S::key(&value)) {
      InsertPos::Slot(parent, side) => {
        let n = self.insert_leaf(parent, side, value);
        self.cursor(n)
      }
      InsertPos::Existing(_) => unreachable!("multi descent always finds a slot"),
    }
  }

  /// Hinted insertion; the verified fast path may place a duplicate next
  /// to the hint instead of at the end of its run.
  pub fn insert_with_hint(&mut self, hint: Cursor<S::Value>, value: S::Value) -> Cursor<S::Value> {
    self.check_cursor(hint);
    if self.is_empty() {
      let n = self.insert_leaf(self.header, Side::Left, value);
      return self.cursor(n);
    }
    match self.hint_pos_multi(hint.node(), S::key(&value)) {
      HintPos::Attach(parent, side) => {
        let n = self.insert_leaf(parent, side, value);
        self.cursor(n)
      }
      HintPos::Existing(_) => unreachable!("multi hints never report an existing entry"),
      HintPos::Descend => self.insert(value),
    }
  }

  fn hint_pos_multi(&self, h: NonNull<Node<S::Value>>, key: &S::Key) -> HintPos<S::Value> {
    if h == self.header {
      // end hint: good for any key not below the maximum
      let max = self.rightmost();
      return if self.comp.compare(key, self.node_key(max)) != Ordering::Less {
        HintPos::Attach(max, Side::Right)
      } else {
        HintPos::Descend
      };
    }
    if self.comp.compare(self.node_key(h), key) != Ordering::Less {
      // key <= hint
      if h == self.leftmost() {
        return HintPos::Attach(h, Side::Left);
      }
      let prev = unsafe { tree_prev(h, self.header) };
      if self.comp.compare(key, self.node_key(prev)) != Ordering::Less {
        // prev <= key <= hint
        if unsafe { prev.as_ref() }.link.right().is_none() {
          HintPos::Attach(prev, Side::Right)
        } else {
          HintPos::Attach(h, Side::Left)
        }
      } else {
        HintPos::Descend
      }
    } else {
      // hint < key
      if h == self.rightmost() {
        return HintPos::Attach(h, Side::Right);
      }
      let next = unsafe { tree_next(h, self.header) };
      if self.comp.compare(self.node_key(next), key) != Ordering::Less {
        // hint < key <= next
        if unsafe { next.as_ref() }.link.left().is_none() {
          HintPos::Attach(next, Side::Left)
        } else {
          HintPos::Attach(h, Side::Right)
        }
      } else {
        HintPos::Descend
      }
    }
  }

  /// Cursor to the first entry of the run matching `key`, or the end
  /// cursor.
  pub fn find_first(&self, key: &S::Key) -> Cursor<S::Value> {
    let n = self.lower_bound_node(key);
    if n != self.header && self.comp.compare(key, self.node_key(n)) == Ordering::Equal {
      self.cursor(n)
    } else {
      self.end()
    }
  }

  pub fn count(&self, key: &S::Key) -> usize {
    let hi = self.upper_bound_node(key);
    let mut cur = self.lower_bound_node(key);
    let mut n = 0;
    while cur != hi {
      n += 1;
      cur = unsafe { tree_next(cur, self.header) };
    }
    n
  }

  /// `(first, one-past)` of the contiguous run matching `key`.
  pub fn equal_range(&self, key: &S::Key) -> (Cursor<S::Value>, Cursor<S::Value>) {
    (
      self.cursor(self.lower_bound_node(key)),
      self.cursor(self.upper_bound_node(key)),
    )
  }

  pub fn equal_range_iter(&self, key: &S::Key) -> Iter<'_, S::Value> {
    self.range_iter(self.lower_bound_node(key), self.upper_bound_node(key))
  }

  /// Removes the whole run matching `key`, reporting how many entries
  /// went away (zero when the key is absent).
  pub fn remove_all(&mut self, key: &S::Key) -> usize {
    let (lo, hi) = self.equal_range(key);
    let mut removed = 0;
    let mut cur = lo;
    while cur != hi {
      cur = self.erase(cur);
      removed += 1;
    }
    removed
  }
}

impl<S, C, const UNIQUE: bool> Default for RbTree<S, C, UNIQUE>
where
  S: KeySelect,
  C: Compare<S::Key> + Default,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<S, C, const UNIQUE: bool> Clone for RbTree<S, C, UNIQUE>
where
  S: KeySelect,
  S::Value: Clone,
  C: Compare<S::Key> + Clone,
{
  fn clone(&self) -> Self {
    let mut tree = Self::with_comparator(self.comp.clone());
    if !self.is_empty() {
      unsafe {
        let root = copy_nodes(self.root(), tree.header);
        let link = &mut (*tree.header.as_ptr()).link;
        *link.parent_mut() = root;
        *link.left_mut() = Some(tree_min(root));
        *link.right_mut() = Some(tree_max(root));
      }
      tree.count = self.count;
    }
    tree
  }
}

impl<S, C, const UNIQUE: bool> Drop for RbTree<S, C, UNIQUE>
where
  S: KeySelect,
  C: Compare<S::Key>,
{
  fn drop(&mut self) {
    self.clear();
    drop(unsafe { Box::from_raw(self.header.as_ptr()) });
  }
}

impl<'tree, S, C, const UNIQUE: bool> IntoIterator for &'tree RbTree<S, C, UNIQUE>
where
  S: KeySelect,
  C: Compare<S::Key>,
{
  type Item = &'tree S::Value;
  type IntoIter = Iter<'tree, S::Value>;

  fn into_iter(self) -> Iter<'tree, S::Value> {
    self.iter()
  }
}

unsafe impl<S, C, const UNIQUE: bool> Send for RbTree<S, C, UNIQUE>
where
  S: KeySelect,
  S::Value: Send,
  C: Compare<S::Key> + Send,
{
}

unsafe impl<S, C, const UNIQUE: bool> Sync for RbTree<S, C, UNIQUE>
where
  S: KeySelect,
  S::Value: Sync,
  C: Compare<S::Key> + Sync,
{
}

/// Recolors a black node red and its two (present) children black.
unsafe fn flip_colors<T>(x: NonNull<Node<T>>) {
  unsafe {
    *(*x.as_ptr()).link.color_mut() = Color::Red;
    let left = x.as_ref().link.left().expect("flip_colors: left child");
    let right = x.as_ref().link.right().expect("flip_colors: right child");
    *(*left.as_ptr()).link.color_mut() = Color::Black;
    *(*right.as_ptr()).link.color_mut() = Color::Black;
  }
}

unsafe fn subtree_height<T>(x: Option<NonNull<Node<T>>>) -> usize {
  match x {
    None => 0,
    Some(n) => unsafe {
      let left = subtree_height(n.as_ref().link.left());
      let right = subtree_height(n.as_ref().link.right());
      1 + core::cmp::max(left, right)
    },
  }
}

unsafe fn colors_ok<T>(x: NonNull<Node<T>>) -> bool {
  unsafe {
    let link = &(*x.as_ptr()).link;
    if is_red(Some(x)) && (is_red(link.left()) || is_red(link.right())) {
      return false;
    }
    if let Some(left) = link.left() {
      if !colors_ok(left) {
        return false;
      }
    }
    if let Some(right) = link.right() {
      if !colors_ok(right) {
        return false;
      }
    }
    true
  }
}

/// Black node count toward the leaves, or `None` when two paths
/// disagree.
unsafe fn black_height<T>(x: Option<NonNull<Node<T>>>) -> Option<usize> {
  match x {
    None => Some(1),
    Some(n) => unsafe {
      let left = black_height(n.as_ref().link.left())?;
      let right = black_height(n.as_ref().link.right())?;
      if left != right {
        return None;
      }
      Some(left + usize::from(!is_red(Some(n))))
    },
  }
}

#[cfg(test)]
mod tests;
