use core::{
  mem::MaybeUninit,
  ptr::NonNull,
};

use alloc::boxed::Box;

use getset::{
  CopyGetters,
  MutGetters,
};

/// Node colors. The header carries `Red` as a conventional tag; code tells
/// the header apart by pointer identity, never by color.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub(crate) enum Color {
  #[default]
  Red,
  Black,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Side {
  Left,
  Right,
}

/// Structural links of one node. `parent` is never absent: the root points
/// back at the header, and the header points at itself while the tree is
/// empty.
#[derive(CopyGetters, MutGetters)]
pub(crate) struct RbLink<T> {
  #[getset(get_copy = "pub(crate)", get_mut = "pub(crate)")]
  parent: NonNull<Node<T>>,
  #[getset(get_copy = "pub(crate)", get_mut = "pub(crate)")]
  left: Option<NonNull<Node<T>>>,
  #[getset(get_copy = "pub(crate)", get_mut = "pub(crate)")]
  right: Option<NonNull<Node<T>>>,
  #[getset(get_copy = "pub(crate)", get_mut = "pub(crate)")]
  color: Color,
}

pub(crate) struct Node<T> {
  pub(crate) link: RbLink<T>,
  // uninitialized for the header node only
  pub(crate) value: MaybeUninit<T>,
}

impl<T> Node<T> {
  /// The per-tree header. Its parent link is patched to point at itself
  /// right after the node is boxed.
  pub(crate) fn header() -> Self {
    Self {
      link: RbLink {
        parent: NonNull::dangling(),
        left: None,
        right: None,
        color: Color::Red,
      },
      value: MaybeUninit::uninit(),
    }
  }

  pub(crate) fn leaf(value: T, parent: NonNull<Node<T>>) -> Self {
    Self {
      link: RbLink {
        parent,
        left: None,
        right: None,
        color: Color::Red,
      },
      value: MaybeUninit::new(value),
    }
  }
}

pub(crate) fn box_node<T>(node: Node<T>) -> NonNull<Node<T>> {
  // Box::into_raw never returns null
  unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(node))) }
}

/// Absent children count as black.
pub(crate) fn is_red<T>(node: Option<NonNull<Node<T>>>) -> bool {
  node.is_some_and(|n| unsafe { n.as_ref() }.link.color() == Color::Red)
}

/// Precondition: `x` is a real node, not the header.
pub(crate) unsafe fn tree_min<T>(mut x: NonNull<Node<T>>) -> NonNull<Node<T>> {
  unsafe {
    while let Some(left) = x.as_ref().link.left() {
      x = left;
    }
    x
  }
}

/// Precondition: `x` is a real node, not the header.
pub(crate) unsafe fn tree_max<T>(mut x: NonNull<Node<T>>) -> NonNull<Node<T>> {
  unsafe {
    while let Some(right) = x.as_ref().link.right() {
      x = right;
    }
    x
  }
}

/// In-order successor; returns `header` past the maximum.
/// Precondition: `x` is a real node.
pub(crate) unsafe fn tree_next<T>(
  mut x: NonNull<Node<T>>,
  header: NonNull<Node<T>>,
) -> NonNull<Node<T>> {
  unsafe {
    if let Some(right) = x.as_ref().link.right() {
      return tree_min(right);
    }
    let mut parent = x.as_ref().link.parent();
    if parent == header {
      // x is the root without a right child, hence also the maximum
      return header;
    }
    while parent.as_ref().link.right() == Some(x) {
      x = parent;
      parent = x.as_ref().link.parent();
    }
    parent
  }
}

/// In-order predecessor. Stepping back from the header lands on the
/// maximum, which is what reverse iteration starts from.
pub(crate) unsafe fn tree_prev<T>(
  mut x: NonNull<Node<T>>,
  header: NonNull<Node<T>>,
) -> NonNull<Node<T>> {
  unsafe {
    if x == header {
      return header.as_ref().link.right().expect("header right link");
    }
    if let Some(left) = x.as_ref().link.left() {
      return tree_max(left);
    }
    let mut parent = x.as_ref().link.parent();
    if parent == header {
      // x is the root without a left child, hence also the minimum
      return header;
    }
    while parent.as_ref().link.left() == Some(x) {
      x = parent;
      parent = x.as_ref().link.parent();
    }
    parent
  }
}

/// Structural deep copy of the subtree under `src`, colors included.
pub(crate) unsafe fn copy_nodes<T: Clone>(
  src: NonNull<Node<T>>,
  parent: NonNull<Node<T>>,
) -> NonNull<Node<T>> {
  unsafe {
    let src_ref = src.as_ref();
    let node = box_node(Node {
      link: RbLink {
        parent,
        left: None,
        right: None,
        color: src_ref.link.color(),
      },
      value: MaybeUninit::new(src_ref.value.assume_init_ref().clone()),
    });
    if let Some(left) = src_ref.link.left() {
      *(*node.as_ptr()).link.left_mut() = Some(copy_nodes(left, node));
    }
    if let Some(right) = src_ref.link.right() {
      *(*node.as_ptr()).link.right_mut() = Some(copy_nodes(right, node));
    }
    node
  }
}

/// Drops every node (and stored value) of the subtree under `x`.
pub(crate) unsafe fn drop_subtree<T>(x: NonNull<Node<T>>) {
  unsafe {
    if let Some(left) = x.as_ref().link.left() {
      drop_subtree(left);
    }
    if let Some(right) = x.as_ref().link.right() {
      drop_subtree(right);
    }
    let mut node = Box::from_raw(x.as_ptr());
    node.value.assume_init_drop();
  }
}
