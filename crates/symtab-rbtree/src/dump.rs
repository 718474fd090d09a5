//! ASCII rendering of the tree shape, for eyeballing rebalance results
//! in tests. Read-only; not part of the container API proper.

use core::{
  fmt,
  ptr::NonNull,
};

use alloc::format;

use crate::{
  Compare,
  KeySelect,
  RbTree,
  node::{
    Color,
    Node,
  },
};

pub struct Dump<'tree, S, C, const UNIQUE: bool>
where
  S: KeySelect,
  C: Compare<S::Key>,
{
  tree: &'tree RbTree<S, C, UNIQUE>,
}

impl<S, C, const UNIQUE: bool> RbTree<S, C, UNIQUE>
where
  S: KeySelect,
  C: Compare<S::Key>,
{
  /// Displayable tree shape with a color letter per node.
  pub fn dump(&self) -> Dump<'_, S, C, UNIQUE> {
    Dump { tree: self }
  }
}

impl<S, C, const UNIQUE: bool> fmt::Display for Dump<'_, S, C, UNIQUE>
where
  S: KeySelect,
  S::Value: fmt::Debug,
  C: Compare<S::Key>,
{
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.tree.is_empty() {
      return writeln!(f, "(empty)");
    }
    let root = self.tree.root();
    unsafe {
      write_value(f, root)?;
      writeln!(f)?;
      write_children(f, root, "")
    }
  }
}

fn tag<T>(node: NonNull<Node<T>>) -> char {
  match unsafe { node.as_ref() }.link.color() {
    Color::Red => 'r',
    Color::Black => 'B',
  }
}

unsafe fn write_value<T: fmt::Debug>(
  f: &mut fmt::Formatter<'_>,
  node: NonNull<Node<T>>,
) -> fmt::Result {
  let value = unsafe { (*node.as_ptr()).value.assume_init_ref() };
  write!(f, "{:?} {}", value, tag(node))
}

unsafe fn write_children<T: fmt::Debug>(
  f: &mut fmt::Formatter<'_>,
  node: NonNull<Node<T>>,
  prefix: &str,
) -> fmt::Result {
  unsafe {
    let left = node.as_ref().link.left();
    let right = node.as_ref().link.right();
    if left.is_none() && right.is_none() {
      return Ok(());
    }
    write_child(f, left, prefix, false)?;
    write_child(f, right, prefix, true)
  }
}

unsafe fn write_child<T: fmt::Debug>(
  f: &mut fmt::Formatter<'_>,
  child: Option<NonNull<Node<T>>>,
  prefix: &str,
  last: bool,
) -> fmt::Result {
  let connector = if last { "└── " } else { "├── " };
  match child {
    None => writeln!(f, "{prefix}{connector}null"),
    Some(node) => unsafe {
      write!(f, "{prefix}{connector}")?;
      write_value(f, node)?;
      writeln!(f)?;
      let child_prefix = format!("{prefix}{}", if last { "    " } else { "|   " });
      write_children(f, node, &child_prefix)
    },
  }
}
