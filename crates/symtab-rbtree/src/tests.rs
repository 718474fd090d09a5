use super::*;

use crate::map::{
  RbMap,
  RbMultiMap,
};
use crate::set::{
  RbMultiSet,
  RbSet,
};

use std::rc::Rc;

use rand::{
  Rng,
  SeedableRng,
  rngs::StdRng,
  seq::SliceRandom,
};

type IntSet = RbTree<KeyOnly<i32>, Natural, true>;
type IntMulti = RbTree<KeyOnly<i32>, Natural, false>;

fn height_within_bound(height: usize, len: usize) -> bool {
  len == 0 || (height as f64) <= 2.0 * ((len + 1) as f64).log2()
}

fn walk(tree: &IntSet) -> Vec<i32> {
  tree.iter().copied().collect()
}

#[test]
fn in_order_walk_is_sorted() {
  let mut tree = IntSet::new();
  for key in [10, 50, 80, 40, 30, 90, 60, 20, 70] {
    let (cur, inserted) = tree.insert(key);
    assert!(inserted);
    assert_eq!(tree.value(cur), Some(&key));
    assert!(tree.is_rb_tree());
  }
  assert_eq!(walk(&tree), vec![10, 20, 30, 40, 50, 60, 70, 80, 90]);
  assert_eq!(tree.len(), 9);

  let below = tree.height_below(tree.find(&40));
  assert!(below >= 1 && below <= tree.height());
  assert_eq!(tree.height_below(tree.end()), 0);
}

#[test]
fn erase_keeps_tree_balanced() {
  let mut tree = IntSet::new();
  for key in [10, 50, 80, 40, 30, 90, 60, 20, 70] {
    tree.insert(key);
  }
  assert_eq!(tree.remove(&50), Some(50));
  assert!(tree.is_rb_tree());
  assert_eq!(tree.remove(&80), Some(80));
  assert!(tree.is_rb_tree());
  assert_eq!(walk(&tree), vec![10, 20, 30, 40, 60, 70, 90]);
  assert_eq!(tree.remove(&50), None);
  assert_eq!(tree.len(), 7);
}

#[test]
fn duplicates_stay_contiguous() {
  let mut set = RbMultiSet::new();
  for key in [10, 50, 80, 40, 30, 90, 60, 20, 70] {
    set.insert(key);
  }
  for _ in 0..5 {
    set.insert(60);
  }
  assert!(set.raw().is_rb_tree());
  assert_eq!(set.count(&60), 6);
  assert_eq!(set.len(), 14);

  let run: Vec<i32> = set.equal_range(&60).copied().collect();
  assert_eq!(run, vec![60; 6]);

  // the run is one contiguous window of the full walk
  let all: Vec<i32> = set.iter().copied().collect();
  let start = all.iter().position(|&k| k == 60).unwrap();
  assert!(all[start..start + 6].iter().all(|&k| k == 60));
  assert_ne!(all[start + 6], 60);
}

#[test]
fn duplicate_runs_keep_insertion_order() {
  let mut map = RbMultiMap::new();
  map.insert(10, 0u32);
  map.insert(90, 1);
  for tag in 0..5u32 {
    map.insert(60, tag);
    map.insert(30, 100 + tag);
  }
  assert!(map.raw().is_rb_tree());

  let tags: Vec<u32> = map.equal_range(&60).map(|(_, &tag)| tag).collect();
  assert_eq!(tags, vec![0, 1, 2, 3, 4]);
  let tags: Vec<u32> = map.equal_range(&30).map(|(_, &tag)| tag).collect();
  assert_eq!(tags, vec![100, 101, 102, 103, 104]);
  assert_eq!(map.count(&60), 5);
  assert_eq!(map.get_first(&60), Some(&0));
}

#[test]
fn random_torture_maintains_invariants() {
  let mut rng = StdRng::seed_from_u64(0x5eed);
  let mut tree = IntSet::new();
  for _ in 0..1000 {
    tree.insert(rng.random_range(0..1000));
    assert!(tree.is_rb_tree());
    assert!(height_within_bound(tree.height(), tree.len()));
  }

  let mut keys = walk(&tree);
  keys.shuffle(&mut rng);
  for &key in keys.iter().take(300.min(keys.len())) {
    assert_eq!(tree.remove(&key), Some(key));
    assert!(tree.is_rb_tree());
    assert!(height_within_bound(tree.height(), tree.len()));
  }
  assert_eq!(walk(&tree).len(), tree.len());
}

#[test]
fn bound_probes() {
  let mut tree = IntSet::new();
  for key in [10, 20, 30, 40, 50] {
    tree.insert(key);
  }
  assert_eq!(tree.value(tree.lower_bound(&35)), Some(&40));
  assert_eq!(tree.value(tree.upper_bound(&30)), Some(&40));
  assert_eq!(tree.value(tree.lower_bound(&30)), Some(&30));
  assert_eq!(tree.lower_bound(&60), tree.end());
  assert_eq!(tree.value(tree.upper_bound(&0)), Some(&10));

  let (lo, hi) = tree.equal_range(&30);
  assert_eq!(tree.value(lo), Some(&30));
  assert_eq!(tree.value(hi), Some(&40));
  let (lo, hi) = tree.equal_range(&35);
  assert_eq!(lo, hi);

  let run: Vec<i32> = tree.equal_range_iter(&30).copied().collect();
  assert_eq!(run, vec![30]);
  assert_eq!(tree.equal_range_iter(&35).next(), None);
}

#[test]
fn empty_tree_lookups() {
  let mut tree = IntSet::new();
  assert!(tree.is_empty());
  assert_eq!(tree.find(&1), tree.end());
  assert_eq!(tree.lower_bound(&1), tree.end());
  assert_eq!(tree.upper_bound(&1), tree.end());
  assert_eq!(tree.remove(&1), None);
  assert_eq!(tree.iter().next(), None);
  assert_eq!(tree.first(), None);
  assert_eq!(tree.last(), None);
  assert_eq!(tree.height(), 0);
  assert!(tree.is_rb_tree());

  let mut multi = RbMultiSet::<i32>::new();
  assert_eq!(multi.remove_all(&1), 0);
  assert_eq!(multi.count(&1), 0);
}

#[test]
fn insert_find_erase_round_trip() {
  let mut map = RbMap::new();
  assert_eq!(map.insert(7, "seven"), None);
  assert_eq!(map.get(&7), Some(&"seven"));
  assert_eq!(map.insert(7, "SEVEN"), Some("seven"));
  assert_eq!(map.get(&7), Some(&"SEVEN"));
  if let Some(value) = map.get_mut(&7) {
    *value = "Seven";
  }
  assert_eq!(map.remove(&7), Some("Seven"));
  assert_eq!(map.get(&7), None);
  assert!(map.is_empty());
}

#[test]
fn duplicate_insert_is_rejected() {
  let mut tree = IntSet::new();
  let (first, inserted) = tree.insert(42);
  assert!(inserted);
  let (again, inserted) = tree.insert(42);
  assert!(!inserted);
  assert_eq!(first, again);
  assert_eq!(tree.len(), 1);
  assert_eq!(tree.count(&42), 1);
}

#[test]
fn hinted_insert_verifies_the_hint() {
  let mut tree = IntSet::new();
  for key in [10, 20, 30, 40, 50] {
    tree.insert(key);
  }

  // good hint: 25 sits right before 30
  let hint = tree.find(&30);
  let (cur, inserted) = tree.insert_with_hint(hint, 25);
  assert!(inserted);
  assert_eq!(tree.value(cur), Some(&25));
  assert!(tree.is_rb_tree());

  // end hint for a new maximum
  let (cur, inserted) = tree.insert_with_hint(tree.end(), 100);
  assert!(inserted);
  assert_eq!(tree.value(cur), Some(&100));
  assert_eq!(tree.last(), Some(&100));

  // begin hint for a new minimum
  let (_, inserted) = tree.insert_with_hint(tree.begin(), 1);
  assert!(inserted);
  assert_eq!(tree.first(), Some(&1));

  // misleading hint still lands in the right place
  let bad_hint = tree.find(&100);
  let (cur, inserted) = tree.insert_with_hint(bad_hint, 15);
  assert!(inserted);
  assert_eq!(tree.value(cur), Some(&15));
  assert!(tree.is_rb_tree());

  // hint at an equivalent key reports the existing entry
  let hint = tree.find(&40);
  let (cur, inserted) = tree.insert_with_hint(hint, 40);
  assert!(!inserted);
  assert_eq!(cur, tree.find(&40));

  assert_eq!(walk(&tree), vec![1, 10, 15, 20, 25, 30, 40, 50, 100]);
}

#[test]
fn hinted_insert_multi() {
  let mut tree = IntMulti::new();
  for key in [10, 20, 30] {
    tree.insert(key);
  }
  let hint = tree.find(&20);
  tree.insert_with_hint(hint, 20);
  tree.insert_with_hint(tree.end(), 30);
  assert!(tree.is_rb_tree());
  assert_eq!(tree.count(&20), 2);
  assert_eq!(tree.count(&30), 2);
  assert_eq!(tree.len(), 5);
}

#[test]
fn reverse_iteration() {
  let mut tree = IntSet::new();
  for key in [3, 1, 4, 1, 5, 9, 2, 6] {
    tree.insert(key);
  }
  let forward: Vec<i32> = tree.iter().copied().collect();
  let mut backward: Vec<i32> = tree.iter().rev().copied().collect();
  backward.reverse();
  assert_eq!(forward, backward);

  // stepping back from end lands on the maximum
  let cur = tree.prev(tree.end());
  assert_eq!(tree.value(cur), Some(&9));
  // and before the minimum sits the end position
  assert_eq!(tree.prev(tree.begin()), tree.end());

  let iter = tree.iter();
  assert_eq!(iter.len(), tree.len());
}

#[test]
fn custom_comparator_reverses_order() {
  let mut tree: RbTree<KeyOnly<i32>, _, true> =
    RbTree::with_comparator(CmpFn(|a: &i32, b: &i32| b.cmp(a)));
  for key in [10, 50, 30, 20, 40] {
    tree.insert(key);
  }
  assert!(tree.is_rb_tree());
  let walked: Vec<i32> = tree.iter().copied().collect();
  assert_eq!(walked, vec![50, 40, 30, 20, 10]);
  assert_eq!(tree.first(), Some(&50));
  assert_eq!(tree.value(tree.lower_bound(&45)), Some(&40));
}

#[test]
fn clone_is_deep() {
  let mut tree = IntSet::new();
  for key in 0..64 {
    tree.insert(key);
  }
  let snapshot = tree.clone();
  assert!(snapshot.is_rb_tree());
  assert_eq!(walk(&snapshot), walk(&tree));

  for key in 0..32 {
    tree.remove(&key);
  }
  assert_eq!(snapshot.len(), 64);
  assert_eq!(tree.len(), 32);
  assert!(tree.is_rb_tree());
  assert!(snapshot.is_rb_tree());
}

#[test]
fn clear_resets_and_tree_is_reusable() {
  let value = Rc::new(());
  let mut map = RbMap::new();
  for key in 0..10 {
    map.insert(key, Rc::clone(&value));
  }
  assert_eq!(Rc::strong_count(&value), 11);

  map.clear();
  assert_eq!(Rc::strong_count(&value), 1);
  assert!(map.is_empty());
  assert_eq!(map.get(&3), None);

  map.insert(3, Rc::clone(&value));
  assert_eq!(map.len(), 1);
  assert!(map.raw().is_rb_tree());
}

#[test]
fn drop_releases_every_value() {
  let value = Rc::new(());
  {
    let mut map = RbMap::new();
    for key in 0..100 {
      map.insert(key, Rc::clone(&value));
    }
    assert_eq!(Rc::strong_count(&value), 101);
    for key in (0..100).step_by(2) {
      map.remove(&key);
    }
    assert_eq!(Rc::strong_count(&value), 51);
  }
  assert_eq!(Rc::strong_count(&value), 1);
}

#[test]
fn insert_or_assign_replaces_in_place() {
  let mut tree: RbTree<KeyValue<i32, &str>, Natural, true> = RbTree::new();
  let (_, old) = tree.insert_or_assign((1, "a"));
  assert_eq!(old, None);
  let (cur, old) = tree.insert_or_assign((1, "b"));
  assert_eq!(old, Some((1, "a")));
  assert_eq!(tree.value(cur), Some(&(1, "b")));
  assert_eq!(tree.len(), 1);
}

#[test]
fn get_or_insert_with_descends_once() {
  let mut map = RbMap::new();
  map.insert(1, 10);
  *map.get_or_insert_with(1, || unreachable!("key is present")) += 5;
  assert_eq!(map.get(&1), Some(&15));

  *map.get_or_insert_with(2, || 20) += 2;
  assert_eq!(map.get(&2), Some(&22));
  assert_eq!(map.len(), 2);
  assert!(map.raw().is_rb_tree());
}

#[test]
#[should_panic(expected = "no entry found for key")]
fn index_panics_on_missing_key() {
  let map: RbMap<i32, i32> = RbMap::new();
  let _ = map[&42];
}

#[test]
fn from_iter_and_extend() {
  let mut set: RbSet<i32> = (0..10).rev().collect();
  set.extend([20, 15]);
  assert_eq!(set.len(), 12);
  let walked: Vec<i32> = set.iter().copied().collect();
  assert_eq!(walked, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 15, 20]);

  let map: RbMap<i32, i32> = (0..5).map(|i| (i, i * i)).collect();
  assert_eq!(map[&4], 16);
  assert_eq!(
    format!("{map:?}"),
    "{0: 0, 1: 1, 2: 4, 3: 9, 4: 16}"
  );
  let keys: Vec<i32> = map.keys().copied().collect();
  assert_eq!(keys, vec![0, 1, 2, 3, 4]);
  assert_eq!(map.values().rev().next(), Some(&16));
  assert_eq!(map.first_key_value(), Some((&0, &0)));
  assert_eq!(map.last_key_value(), Some((&4, &16)));
}

#[test]
fn erase_returns_successor() {
  let mut tree = IntSet::new();
  for key in [10, 20, 30, 40, 50] {
    tree.insert(key);
  }
  let cur = tree.erase(tree.find(&30));
  assert_eq!(tree.value(cur), Some(&40));
  let cur = tree.erase(tree.find(&50));
  assert_eq!(cur, tree.end());
  assert_eq!(walk(&tree), vec![10, 20, 40]);
}

#[test]
fn erase_range_drains_interval() {
  let mut tree = IntSet::new();
  for key in (10..=90).step_by(10) {
    tree.insert(key);
  }
  let cur = tree.erase_range(tree.find(&30), tree.find(&70));
  assert_eq!(tree.value(cur), Some(&70));
  assert_eq!(walk(&tree), vec![10, 20, 70, 80, 90]);
  assert!(tree.is_rb_tree());

  tree.erase_range(tree.begin(), tree.end());
  assert!(tree.is_empty());
  assert!(tree.is_rb_tree());
}

#[test]
fn remove_all_reports_the_run_length() {
  let mut set = RbMultiSet::new();
  for key in [5, 5, 3, 5, 8, 3] {
    set.insert(key);
  }
  assert_eq!(set.remove_all(&5), 3);
  assert_eq!(set.remove_all(&5), 0);
  assert_eq!(set.remove_all(&9), 0);
  assert_eq!(set.len(), 3);
  assert!(set.raw().is_rb_tree());
  let left: Vec<i32> = set.iter().copied().collect();
  assert_eq!(left, vec![3, 3, 8]);
}

#[test]
fn extremes_track_mutation() {
  let mut tree = IntSet::new();
  tree.insert(7);
  assert_eq!(tree.first(), Some(&7));
  assert_eq!(tree.last(), Some(&7));

  for key in [2, 9, 4] {
    tree.insert(key);
  }
  assert_eq!(tree.first(), Some(&2));
  assert_eq!(tree.last(), Some(&9));

  tree.remove(&2);
  assert_eq!(tree.first(), Some(&4));
  tree.remove(&9);
  assert_eq!(tree.last(), Some(&7));

  tree.remove(&4);
  tree.remove(&7);
  assert_eq!(tree.first(), None);
  assert_eq!(tree.begin(), tree.end());
}

#[test]
fn reinserting_after_erase_stays_balanced() {
  let mut tree = IntSet::new();
  for key in 0..100 {
    tree.insert(key * 3);
  }
  for key in 20..40 {
    tree.remove(&(key * 3));
  }
  for key in 20..40 {
    tree.insert(key * 3);
    assert!(tree.is_rb_tree());
  }
  assert_eq!(tree.len(), 100);
  assert!(height_within_bound(tree.height(), tree.len()));
}

#[test]
fn dump_renders_the_shape() {
  let mut tree = IntSet::new();
  for key in [1, 2, 3] {
    tree.insert(key);
  }
  let shape = format!("{}", tree.dump());
  assert!(shape.starts_with("2 B"));
  assert!(shape.contains("├── 1 r"));
  assert!(shape.contains("└── 3 r"));

  let empty = IntSet::new();
  assert_eq!(format!("{}", empty.dump()), "(empty)\n");
}

#[test]
fn multimap_round_trip() {
  let mut map = RbMultiMap::new();
  map.insert("b", 2);
  map.insert("a", 1);
  map.insert("b", 20);
  assert_eq!(map.len(), 3);
  assert_eq!(map.count(&"b"), 2);
  assert_eq!(map.get_first(&"b"), Some(&2));
  assert!(map.contains_key(&"a"));
  assert_eq!(map.remove_all(&"b"), 2);
  assert_eq!(map.get_first(&"b"), None);
  assert_eq!(map.len(), 1);
}

#[test]
fn cursor_survives_unrelated_mutation() {
  let mut tree = IntSet::new();
  for key in [10, 20, 30] {
    tree.insert(key);
  }
  let cur = tree.find(&20);
  tree.insert(15);
  tree.remove(&30);
  assert_eq!(tree.value(cur), Some(&20));
  assert_eq!(tree.value(tree.next(cur)), None);
  assert_eq!(tree.value(tree.prev(cur)), Some(&15));
}
