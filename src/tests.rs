extern crate std;

use core::{alloc::Layout, cell::Cell, ptr::NonNull};
use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model;

use super::*;

fn tree_of(keys: &[u32]) -> AvlTree<u32, u32> {
    let mut tree = AvlTree::new();

    for &key in keys {
        assert!(tree.insert(key, key * 10));
        tree.assert_invariants();
    }

    tree
}

// Heap's algorithm, calling `f` with every ordering of `keys`.
fn for_each_permutation(keys: &mut [u32], f: &mut impl FnMut(&[u32])) {
    fn go(k: usize, keys: &mut [u32], f: &mut impl FnMut(&[u32])) {
        if k <= 1 {
            f(keys);
            return;
        }

        go(k - 1, keys, f);

        for i in 0..k - 1 {
            let swap_with = if k % 2 == 0 { i } else { 0 };
            keys.swap(swap_with, k - 1);
            go(k - 1, keys, f);
        }
    }

    go(keys.len(), keys, f)
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { crate::key(node) }, key);
        assert_eq!(tree.get(key), Some(&(key * 10)));
    }
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn two_elems_find() {
    insert_find_all(&[0, 1]);
    insert_find_all(&[1, 0]);
}

#[test]
fn three_elems_find() {
    insert_find_all(&[0, 1, 2]);
    insert_find_all(&[0, 2, 1]);
    insert_find_all(&[1, 0, 2]);
    insert_find_all(&[1, 2, 0]);
    insert_find_all(&[2, 0, 1]);
    insert_find_all(&[2, 1, 0]);
}

#[test]
fn five_elems_find() {
    let mut seen = 0;
    for_each_permutation(&mut [0, 1, 2, 3, 4], &mut |keys| {
        insert_find_all(keys);
        seen += 1;
    });
    assert_eq!(seen, 120);
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_of(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        let (removed, _) = unsafe { tree.remove_at(node) };
        assert_eq!(removed, *key);
        tree.assert_invariants();
    }

    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(key, key);
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert!(tree.remove(key));
        assert!(!tree.remove(key));
        tree.assert_invariants();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn remove_two() {
    insert_remove_all(&[0, 1]);
    insert_remove_all(&[1, 0]);
}

#[test]
fn remove_three() {
    insert_remove_all(&[0, 1, 2]);
    insert_remove_all(&[0, 2, 1]);
    insert_remove_all(&[1, 0, 2]);
    insert_remove_all(&[1, 2, 0]);
    insert_remove_all(&[2, 0, 1]);
    insert_remove_all(&[2, 1, 0]);
}

#[test]
fn remove_five() {
    for_each_permutation(&mut [0, 1, 2, 3, 4], &mut |keys| insert_remove_all(keys));
}

#[test]
fn seven_key_scenario() {
    let tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);

    assert_eq!(
        tree.iter().map(|(&k, _)| k).collect::<Vec<_>>(),
        [1, 3, 4, 5, 7, 8, 9]
    );

    // Inserted in this order no rotation is needed and the tree is perfect.
    assert_eq!(tree.height(), 3);
    assert_eq!(tree.first(), Some((&1, &10)));
    assert_eq!(tree.last(), Some((&9, &90)));
}

#[test]
fn ascending_inserts_stay_balanced() {
    let mut tree = AvlTree::new();

    for key in 0..1023u32 {
        tree.insert(key, ());
    }

    tree.assert_invariants();
    // 1023 keys inserted in order form a perfect tree.
    assert_eq!(tree.height(), 10);
}

#[test]
fn repeated_root_removal() {
    let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
    let mut expected: Vec<u32> = (1..=7).collect();

    while let Some(root) = tree.root {
        let (key, value) = unsafe { tree.remove_at(root) };
        assert_eq!(value, key * 10);

        expected.retain(|&k| k != key);
        tree.assert_invariants();
        assert_eq!(tree.iter().map(|(&k, _)| k).collect::<Vec<_>>(), expected);
    }

    assert!(tree.is_empty());
}

#[test]
fn duplicate_insert_keeps_original() {
    let mut tree = tree_of(&[1, 2, 3]);

    assert!(!tree.insert(2, 999));
    assert_eq!(tree.get(&2), Some(&20));
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.try_insert(3, 0), Ok(false));
}

#[test]
fn removing_absent_key_changes_nothing() {
    let mut tree = tree_of(&[10, 20, 30]);
    let root = tree.root;

    assert!(!tree.remove(&15));
    assert_eq!(tree.remove_entry(&40), None);
    assert_eq!(tree.root, root);
    assert_eq!(tree.len(), 3);
}

#[test]
fn bounds_are_one_apart() {
    let keys: Vec<u32> = (0..50).map(|k| k * 2).collect();
    let tree = tree_of(&keys);

    for &key in &keys {
        let mut lower = tree.lower_bound(&key);
        let upper = tree.upper_bound(&key);

        assert_eq!(lower.key(), Some(&key));
        lower.move_next();
        assert_eq!(lower, upper);

        let expected = (key < 98).then_some(key + 2);
        assert_eq!(upper.key().copied(), expected);
    }

    // Absent keys: both bounds land on the next present key.
    for key in (0..50).map(|k| k * 2 + 1) {
        let lower = tree.lower_bound(&key);
        let upper = tree.upper_bound(&key);
        assert_eq!(lower, upper);
        assert_eq!(lower.key().copied(), (key < 99).then_some(key + 1));
    }
}

#[test]
fn range_iteration() {
    let tree = tree_of(&[1, 3, 5, 7, 9]);

    let keys = |r: crate::Range<'_, u32, u32>| r.map(|(&k, _)| k).collect::<Vec<_>>();

    assert_eq!(keys(tree.range(2..8)), [3, 5, 7]);
    assert_eq!(keys(tree.range(3..=7)), [3, 5, 7]);
    assert_eq!(keys(tree.range(..4)), [1, 3]);
    assert_eq!(keys(tree.range(8..)), [9]);
    assert_eq!(keys(tree.range(4..4)), []);
    assert_eq!(keys(tree.range(6..2)), []);
    assert_eq!(
        tree.range::<u32, _>(..).rev().map(|(&k, _)| k).collect::<Vec<_>>(),
        [9, 7, 5, 3, 1]
    );
}

#[test]
fn iterators_meet_in_the_middle() {
    let tree = tree_of(&[1, 2, 3, 4]);
    let mut iter = tree.iter();

    assert_eq!(iter.len(), 4);
    assert_eq!(iter.next().map(|(&k, _)| k), Some(1));
    assert_eq!(iter.next_back().map(|(&k, _)| k), Some(4));
    assert_eq!(iter.next().map(|(&k, _)| k), Some(2));
    assert_eq!(iter.next_back().map(|(&k, _)| k), Some(3));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next_back(), None);
}

#[test]
fn two_child_removal_reuses_node() {
    // 2 is the root with children 1 and 3.
    let mut tree = tree_of(&[2, 1, 3]);
    let root = tree.root.expect("tree is not empty");

    assert_eq!(tree.remove_entry(&2), Some((2, 20)));

    // The predecessor's entry now lives in the old root's node.
    assert_eq!(tree.root, Some(root));
    assert_eq!(unsafe { crate::key(root) }, &1);
    tree.assert_invariants();
}

#[test]
fn counting_allocator_frees_each_node_once() {
    let counting: Counting = Counting::default();

    {
        let mut tree = AvlTree::with_comparator_in(Natural, &counting);
        for key in 0..100u32 {
            tree.insert(key, key);
        }
        assert_eq!(counting.allocations(), 100);

        for key in 0..50 {
            tree.remove(&key);
        }
        assert_eq!(counting.live(), 50);

        tree.clear();
        assert_eq!(counting.live(), 0);

        for key in 0..10u32 {
            tree.insert(key, key);
        }
    }

    assert_eq!(counting.allocations(), 110);
    assert_eq!(counting.deallocations(), 110);
}

#[test]
fn owning_iterator_frees_the_rest() {
    let counting: Counting = Counting::default();
    let mut tree = AvlTree::new_in(&counting);
    for key in 0..20u32 {
        tree.insert(key, std::format!("{key}"));
    }

    let mut iter = tree.into_iter();
    assert_eq!(iter.next(), Some((0, "0".to_string())));
    drop(iter);

    assert_eq!(counting.live(), 0);
}

// Fails every allocation once `budget` blocks have been handed out.
struct Limited {
    budget: Cell<usize>,
}

unsafe impl NodeAllocator for Limited {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        match self.budget.get() {
            0 => Err(AllocError::new(layout)),
            n => {
                self.budget.set(n - 1);
                Global.allocate(layout)
            }
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.budget.set(self.budget.get() + 1);
        unsafe { Global.deallocate(ptr, layout) }
    }
}

#[test]
fn failed_allocation_leaves_tree_unchanged() {
    let mut tree = AvlTree::new_in(Limited {
        budget: Cell::new(3),
    });

    for key in [2u32, 1, 3] {
        assert_eq!(tree.try_insert(key, key), Ok(true));
    }

    let root = tree.root;
    let err = tree.try_insert(4, 4).unwrap_err();
    assert_eq!(err.layout(), Layout::new::<Node<u32, u32>>());

    assert_eq!(tree.root, root);
    assert_eq!(tree.len(), 3);
    assert!(!tree.contains_key(&4));
    tree.assert_invariants();

    match tree.entry(4) {
        Entry::Vacant(vacant) => assert!(vacant.try_insert(4).is_err()),
        Entry::Occupied(_) => unreachable!("4 was never inserted"),
    }
    assert_eq!(tree.len(), 3);

    // Freeing a node makes room again.
    assert!(tree.remove(&1));
    assert_eq!(tree.try_insert(4, 4), Ok(true));
    tree.assert_invariants();
}

#[test]
fn reversed_order() {
    let mut tree = AvlTree::with_comparator(Reversed(Natural));
    for key in [3, 1, 4, 1, 5, 9, 2, 6] {
        tree.insert(key, ());
    }

    tree.assert_invariants();
    assert_eq!(tree.iter().map(|(&k, _)| k).collect::<Vec<_>>(), [9, 6, 5, 4, 3, 2, 1]);
    assert_eq!(tree.first(), Some((&9, &())));
    assert_eq!(tree.bound(&7, BoundKind::Lower).key(), Some(&6));
}

#[test]
fn closure_comparator() {
    let mut tree = AvlTree::with_comparator(|a: &i32, b: &i32| a.abs().cmp(&b.abs()));

    assert!(tree.insert(-3, "minus three"));
    assert!(!tree.insert(3, "three"));
    assert!(tree.insert(1, "one"));

    assert_eq!(tree.get(&3), Some(&"minus three"));
    assert_eq!(tree.iter().map(|(&k, _)| k).collect::<Vec<_>>(), [1, -3]);
}

#[test]
fn entry_api() {
    let mut tree: AvlTree<&str, u32> = AvlTree::new();

    *tree.entry("a").or_insert(1) += 10;
    tree.entry("a").and_modify(|v| *v *= 2).or_insert(0);
    tree.entry("b").and_modify(|v| *v *= 2).or_insert(7);
    assert_eq!(*tree.entry("c").or_insert_with_key(|k| k.len() as u32), 1);

    assert_eq!(tree.get("a"), Some(&22));
    assert_eq!(tree.get("b"), Some(&7));

    match tree.entry("b") {
        Entry::Occupied(mut occupied) => {
            assert_eq!(occupied.insert(8), 7);
            assert_eq!(occupied.remove_entry(), ("b", 8));
        }
        Entry::Vacant(_) => unreachable!("b is present"),
    }

    assert_eq!(tree.len(), 2);
    tree.assert_invariants();
}

#[test]
fn clone_is_deep() {
    let tree = tree_of(&[4, 2, 6]);
    let mut copy = tree.clone();

    *copy.get_mut(&2).unwrap() = 0;
    copy.insert(8, 80);

    assert_eq!(tree.get(&2), Some(&20));
    assert_eq!(tree.len(), 3);
    copy.assert_invariants();
    assert_eq!(std::format!("{tree:?}"), "{2: 20, 4: 40, 6: 60}");
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn cursor_equivalence(
        keys in proptest::collection::vec(0u32..1000, 0..100),
        ops in proptest::collection::vec(model::cursor_op_strategy(), FUZZ_RANGE),
    ) {
        model::run_cursor_equivalence(keys, ops);
    }

    #[test]
    fn insert_then_remove_everything(
        (insert_order, remove_order) in proptest::collection::btree_set(any::<u32>(), 0..200)
            .prop_flat_map(|keys| {
                let keys: Vec<u32> = keys.into_iter().collect();
                (Just(keys.clone()).prop_shuffle(), Just(keys).prop_shuffle())
            }),
    ) {
        let counting: Counting = Counting::default();
        let mut tree = AvlTree::new_in(&counting);

        for &key in &insert_order {
            prop_assert!(tree.insert(key, ()));
        }
        tree.assert_invariants();
        prop_assert!(model::min_len_for_height(tree.height()) <= tree.len());

        for key in &remove_order {
            prop_assert!(tree.remove(key));
            tree.assert_invariants();
        }

        prop_assert_eq!(counting.live(), 0);
    }
}

#[test]
fn model_ops_from_raw_bytes() {
    use arbitrary::{Arbitrary, Unstructured};

    let bytes: Vec<u8> = (0..4096u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8)
        .collect();
    let (ops_bytes, cursor_bytes) = bytes.split_at(2048);

    let ops = Vec::<model::Op>::arbitrary(&mut Unstructured::new(ops_bytes))
        .expect("enough input bytes");
    model::run_btree_equivalence(ops);

    let input = model::CursorEquivalenceInput::arbitrary(&mut Unstructured::new(cursor_bytes))
        .expect("enough input bytes");
    model::run_cursor_equivalence(input.keys, input.ops);
}
