#![no_std]

pub use symtab_rbtree::map::{
  MapIter,
  RbMap,
  RbMultiMap,
};
pub use symtab_rbtree::set::{
  RbMultiSet,
  RbSet,
};
pub use symtab_rbtree::{
  CmpFn,
  Compare,
  Cursor,
  Dump,
  Iter,
  KeyOnly,
  KeySelect,
  KeyValue,
  Natural,
  RbTree,
};

pub mod prelude {
  pub use symtab_rbtree::prelude::*;
}
