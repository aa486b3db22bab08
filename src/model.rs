//! Model-based equivalence checks against the standard library, shared by the unit tests and the
//! fuzz targets.
extern crate std;

use std::{
    collections::BTreeMap,
    ops::Bound::{Excluded, Unbounded},
    prelude::v1::*,
};

use arbitrary::Arbitrary;
use proptest::strategy::{Just, Strategy};

use crate::AvlMap;

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum ItemValue {
    Index(usize),
    Random(u32),
}

proptest::prop_compose! {
    fn index_strategy()(
        index in 0usize..1000,
    ) -> ItemValue {
        ItemValue::Index(index)
    }
}

proptest::prop_compose! {
    fn random_strategy()(
        random in 0u32..1000,
    ) -> ItemValue {
        ItemValue::Random(random)
    }
}

fn value_strategy() -> impl Strategy<Value = ItemValue> {
    proptest::prop_oneof![index_strategy(), random_strategy()]
}

#[derive(Copy, Clone, Debug, Arbitrary)]
pub enum Op {
    Insert(ItemValue, u32),
    TryInsert(ItemValue, u32),
    Get(ItemValue),
    Remove(ItemValue),
    Increment(ItemValue),
    LowerBound(ItemValue),
    UpperBound(ItemValue),
    RemoveRange(ItemValue, ItemValue),
    First,
    PopFirst,
    Last,
    PopLast,
}

impl Op {
    fn finalize(self, sorted: &[u32]) -> FinalOp {
        fn get_key(v: &[u32], i: ItemValue) -> u32 {
            match i {
                ItemValue::Index(idx) => {
                    if v.is_empty() {
                        idx as u32
                    } else {
                        v[idx % v.len()]
                    }
                }
                ItemValue::Random(v) => v,
            }
        }

        match self {
            Op::Insert(item, value) => FinalOp::Insert(get_key(sorted, item), value),
            Op::TryInsert(item, value) => FinalOp::TryInsert(get_key(sorted, item), value),
            Op::Get(item) => FinalOp::Get(get_key(sorted, item)),
            Op::Remove(item) => FinalOp::Remove(get_key(sorted, item)),
            Op::Increment(item) => FinalOp::Increment(get_key(sorted, item)),
            Op::LowerBound(item) => FinalOp::LowerBound(get_key(sorted, item)),
            Op::UpperBound(item) => FinalOp::UpperBound(get_key(sorted, item)),
            Op::RemoveRange(start, end) => {
                FinalOp::RemoveRange(get_key(sorted, start), get_key(sorted, end))
            }
            Op::First => FinalOp::First,
            Op::PopFirst => FinalOp::PopFirst,
            Op::Last => FinalOp::Last,
            Op::PopLast => FinalOp::PopLast,
        }
    }
}

#[derive(Copy, Clone, Debug)]
enum FinalOp {
    Insert(u32, u32),
    TryInsert(u32, u32),
    Get(u32),
    Remove(u32),
    Increment(u32),
    LowerBound(u32),
    UpperBound(u32),
    RemoveRange(u32, u32),
    First,
    PopFirst,
    Last,
    PopLast,
}

pub fn op_strategy() -> impl Strategy<Value = Op> {
    proptest::prop_oneof![
        (value_strategy(), 0u32..100).prop_map(|(k, v)| Op::Insert(k, v)),
        (value_strategy(), 0u32..100).prop_map(|(k, v)| Op::TryInsert(k, v)),
        value_strategy().prop_map(Op::Get),
        value_strategy().prop_map(Op::Remove),
        value_strategy().prop_map(Op::Increment),
        value_strategy().prop_map(Op::LowerBound),
        value_strategy().prop_map(Op::UpperBound),
        (value_strategy(), value_strategy()).prop_map(|(s, e)| Op::RemoveRange(s, e)),
        Just(Op::First),
        Just(Op::PopFirst),
        Just(Op::Last),
        Just(Op::PopLast),
    ]
}

/// Returns the fewest nodes an AVL tree with `levels` levels can hold.
pub fn min_len_for_height(levels: usize) -> usize {
    let (mut shorter, mut taller) = (0usize, 1usize);

    match levels {
        0 => 0,
        _ => {
            for _ in 1..levels {
                (shorter, taller) = (taller, 1 + taller + shorter);
            }
            taller
        }
    }
}

pub fn run_btree_equivalence(ops: Vec<Op>) {
    let mut sorted_keys = Vec::with_capacity(ops.len());
    let mut btree: BTreeMap<u32, u32> = BTreeMap::new();
    let mut avl: AvlMap<u32, u32> = AvlMap::new();

    fn insert_sorted(v: &mut Vec<u32>, key: u32) {
        if let Err(idx) = v.binary_search(&key) {
            v.insert(idx, key);
        }
    }

    fn remove_sorted(v: &mut Vec<u32>, key: u32) {
        if let Ok(idx) = v.binary_search(&key) {
            v.remove(idx);
        }
    }

    let mut final_ops = Vec::with_capacity(ops.len());
    for (op_id, op) in ops.into_iter().enumerate() {
        let final_op = op.finalize(&sorted_keys);
        final_ops.push(final_op);

        match final_op {
            FinalOp::Insert(key, value) => {
                insert_sorted(&mut sorted_keys, key);

                let from_btree = !btree.contains_key(&key);
                btree.entry(key).or_insert(value);
                let from_avl = avl.insert(key, value);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::TryInsert(key, value) => {
                insert_sorted(&mut sorted_keys, key);

                let from_btree = !btree.contains_key(&key);
                btree.entry(key).or_insert(value);
                let from_avl = avl.try_insert(key, value);

                assert_eq!(Ok(from_btree), from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Get(key) => {
                let from_btree = btree.get_key_value(&key);
                let from_avl = avl.get_key_value(&key);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
                assert_eq!(avl.count(&key), usize::from(from_btree.is_some()));
            }

            FinalOp::Remove(key) => {
                remove_sorted(&mut sorted_keys, key);

                let from_btree = btree.remove_entry(&key);
                let from_avl = avl.remove_entry(&key);

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Increment(key) => {
                insert_sorted(&mut sorted_keys, key);

                let from_btree = {
                    let value = btree.entry(key).or_default();
                    *value = value.wrapping_add(1);
                    *value
                };
                let from_avl = {
                    let value = avl.get_or_insert_default(key);
                    *value = value.wrapping_add(1);
                    *value
                };

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::LowerBound(key) => {
                let from_btree = btree.range(key..).next();
                let from_avl = avl.lower_bound(&key).get();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::UpperBound(key) => {
                let from_btree = btree.range((Excluded(key), Unbounded)).next();
                let from_avl = avl.upper_bound(&key).get();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::RemoveRange(start, end) => {
                let doomed: Vec<u32> = if start <= end {
                    btree.range(start..end).map(|(&k, _)| k).collect()
                } else {
                    Vec::new()
                };

                for key in &doomed {
                    btree.remove(key);
                    remove_sorted(&mut sorted_keys, *key);
                }

                let from_avl = avl.remove_range(start..end);

                assert_eq!(doomed.len(), from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::First => {
                let from_btree = btree.first_key_value();
                let from_avl = avl.first_key_value();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopFirst => {
                let from_btree = btree.pop_first();
                let from_avl = avl.pop_first();

                if let Some((key, _)) = from_btree {
                    remove_sorted(&mut sorted_keys, key);
                }

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::Last => {
                let from_btree = btree.last_key_value();
                let from_avl = avl.last_key_value();

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }

            FinalOp::PopLast => {
                let from_btree = btree.pop_last();
                let from_avl = avl.pop_last();

                if let Some((key, _)) = from_btree {
                    remove_sorted(&mut sorted_keys, key);
                }

                assert_eq!(from_btree, from_avl, "FinalOp #{op_id}: {final_op:?}");
            }
        }

        avl.assert_invariants();
        assert_eq!(btree.len(), avl.len());
        assert!(btree.iter().eq(avl.iter()));
        assert!(
            min_len_for_height(avl.as_tree().height()) <= avl.len(),
            "tree is taller than an AVL tree of {} nodes can be",
            avl.len()
        );
    }
}

#[derive(Clone, Debug, Arbitrary)]
pub enum CursorOp {
    // Get is not an operation as it's executed on every loop iteration to check equivalence.
    MovePrev,
    MoveNext,
    PeekNext,
    PeekPrev,
    SetValue(u32),
    RemoveCurrent,
    RemoveCurrentMovePrev,
}

pub fn cursor_op_strategy() -> impl Strategy<Value = CursorOp> {
    proptest::prop_oneof![
        Just(CursorOp::MovePrev),
        Just(CursorOp::MoveNext),
        Just(CursorOp::PeekNext),
        Just(CursorOp::PeekPrev),
        (0u32..1000).prop_map(CursorOp::SetValue),
        Just(CursorOp::RemoveCurrent),
        Just(CursorOp::RemoveCurrentMovePrev),
    ]
}

#[derive(Clone, Debug)]
pub struct CursorEquivalenceInput {
    pub keys: Vec<u32>,
    pub ops: Vec<CursorOp>,
}

impl<'a> arbitrary::Arbitrary<'a> for CursorEquivalenceInput {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        fn key(u: &mut arbitrary::Unstructured<'_>) -> u32 {
            u32::arbitrary(u).unwrap_or(0)
        }

        fn op(u: &mut arbitrary::Unstructured<'_>) -> CursorOp {
            CursorOp::arbitrary(u).unwrap_or(CursorOp::MoveNext)
        }

        let num_keys = u8::arbitrary(u)? % 100;
        let num_ops = u16::arbitrary(u)? % 1000;

        let keys = core::iter::repeat_with(|| key(u))
            .take(num_keys.into())
            .collect();

        let ops = core::iter::repeat_with(|| op(u))
            .take(num_ops.into())
            .collect();

        Ok(CursorEquivalenceInput { keys, ops })
    }
}

pub fn run_cursor_equivalence(mut keys: Vec<u32>, ops: Vec<CursorOp>) {
    keys.sort_unstable();
    keys.dedup();

    // A sorted Vec of entries stands in for a cursor-capable ordered map.
    let mut vec = Vec::new();
    let mut avl: AvlMap<u32, u32> = AvlMap::new();

    for key in keys {
        vec.push((key, key));
        avl.insert(key, key);
    }

    fn vec_curs_prev(v: &[(u32, u32)], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_sub(1),
            None => v.len().checked_sub(1),
        }
    }

    fn vec_curs_next(v: &[(u32, u32)], curs: Option<usize>) -> Option<usize> {
        match curs {
            Some(i) => i.checked_add(1).filter(|&i| i < v.len()),
            None => (!v.is_empty()).then_some(0),
        }
    }

    fn as_refs((k, v): &(u32, u32)) -> (&u32, &u32) {
        (k, v)
    }

    let mut vec_curs = vec_curs_next(&vec, None);
    let mut avl_curs = avl.cursor_first_mut();

    // Check that the initial states are equivalent.
    {
        let v = vec_curs.map(|i| as_refs(&vec[i]));
        let a = avl_curs.get();

        assert_eq!(v, a);
    }

    for op in ops {
        match op {
            CursorOp::MoveNext => {
                vec_curs = vec_curs_next(&vec, vec_curs);
                avl_curs.move_next();
            }

            CursorOp::MovePrev => {
                vec_curs = vec_curs_prev(&vec, vec_curs);
                avl_curs.move_prev();
            }

            CursorOp::PeekNext => {
                let v = vec_curs_next(&vec, vec_curs).map(|i| as_refs(&vec[i]));
                let a = avl_curs.peek_next();

                assert_eq!(v, a);
            }

            CursorOp::PeekPrev => {
                let v = vec_curs_prev(&vec, vec_curs).map(|i| as_refs(&vec[i]));
                let a = avl_curs.peek_prev();

                assert_eq!(v, a);
            }

            CursorOp::SetValue(value) => {
                if let Some(i) = vec_curs {
                    vec[i].1 = value;
                }

                if let Some(slot) = avl_curs.value_mut() {
                    *slot = value;
                }
            }

            CursorOp::RemoveCurrent => {
                let v = vec_curs.map(|i| vec.remove(i));

                if vec_curs == Some(vec.len()) {
                    vec_curs = None;
                }

                let a = avl_curs.remove_current();

                assert_eq!(v, a);
            }

            CursorOp::RemoveCurrentMovePrev => {
                let new_v_curs = vec_curs.is_some().then(|| vec_curs_prev(&vec, vec_curs));
                let v = vec_curs.map(|i| vec.remove(i));

                if let Some(vc) = new_v_curs {
                    vec_curs = vc;
                }

                let a = avl_curs.remove_current_and_move_prev();

                assert_eq!(v, a);
            }
        }

        let v = vec_curs.map(|i| as_refs(&vec[i]));
        let a = avl_curs.get();

        assert_eq!(v, a);
    }

    drop(avl_curs);
    avl.assert_invariants();
    assert!(vec.iter().map(as_refs).eq(avl.iter()));
}
