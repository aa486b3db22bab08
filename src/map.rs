use core::{
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    mem,
    ops::{Index, RangeBounds},
};

use crate::{
    successor, AllocError, AvlTree, Comparator, Cursor, CursorMut, Entry, Global, IntoIter,
    IntoKeys, IntoValues, Iter, IterMut, Keys, Natural, NodeAllocator, OutOfRange, Range, Values,
    ValuesMut,
};

/// An ordered map with unique keys, based on an [AVL tree].
///
/// Inserting a key that is already present leaves the map untouched; use [`entry`](Self::entry)
/// or [`get_mut`](Self::get_mut) to update a value in place.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
///
/// ```
/// use avl_map::AvlMap;
///
/// let mut map = AvlMap::new();
/// assert!(map.insert("b", 2));
/// assert!(map.insert("a", 1));
/// assert!(!map.insert("a", 100));
///
/// *map.get_or_insert_default("c") += 3;
///
/// assert_eq!(map.iter().collect::<Vec<_>>(), [(&"a", &1), (&"b", &2), (&"c", &3)]);
/// ```
pub struct AvlMap<K, V, C = Natural, A = Global>
where
    A: NodeAllocator,
{
    tree: AvlTree<K, V, C, A>,
}

impl<K, V> AvlMap<K, V> {
    /// Creates a new, empty `AvlMap` ordered by [`Ord`].
    pub const fn new() -> Self {
        AvlMap {
            tree: AvlTree::new(),
        }
    }
}

impl<K, V, C> AvlMap<K, V, C> {
    /// Creates a new, empty `AvlMap` ordered by `comparator`.
    pub const fn with_comparator(comparator: C) -> Self {
        AvlMap {
            tree: AvlTree::with_comparator(comparator),
        }
    }
}

impl<K, V, A> AvlMap<K, V, Natural, A>
where
    A: NodeAllocator,
{
    /// Creates a new, empty `AvlMap` ordered by [`Ord`] whose nodes come from `alloc`.
    pub const fn new_in(alloc: A) -> Self {
        AvlMap {
            tree: AvlTree::new_in(alloc),
        }
    }
}

impl<K, V, C, A> AvlMap<K, V, C, A>
where
    A: NodeAllocator,
{
    /// Creates a new, empty `AvlMap` ordered by `comparator` whose nodes come from `alloc`.
    pub const fn with_comparator_in(comparator: C, alloc: A) -> Self {
        AvlMap {
            tree: AvlTree::with_comparator_in(comparator, alloc),
        }
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the map.
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns the largest number of elements the allocator could ever hold.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Returns the comparator that orders the keys.
    pub fn comparator(&self) -> &C {
        self.tree.comparator()
    }

    /// Returns the node allocation strategy.
    pub fn allocator(&self) -> &A {
        self.tree.allocator()
    }

    /// Returns the underlying tree.
    pub fn as_tree(&self) -> &AvlTree<K, V, C, A> {
        &self.tree
    }

    /// Returns `true` if the map contains a value associated with `key`.
    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.contains_key(key)
    }

    /// Returns the number of entries with `key`, which is either 0 or 1.
    #[inline]
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        usize::from(self.contains_key(key))
    }

    /// Returns a reference to the value associated with `key`.
    #[inline]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.get(key)
    }

    /// Returns the stored key and the value associated with `key`.
    #[inline]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.get_key_value(key)
    }

    /// Returns a mutable reference to the value associated with `key`.
    #[inline]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.get_mut(key)
    }

    /// Returns a reference to the value associated with `key`, or [`OutOfRange`] if there is
    /// none.
    pub fn at<Q>(&self, key: &Q) -> Result<&V, OutOfRange>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get(key).ok_or(OutOfRange)
    }

    /// Returns a mutable reference to the value associated with `key`, or [`OutOfRange`] if there
    /// is none.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, OutOfRange>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get_mut(key).ok_or(OutOfRange)
    }

    /// Returns a cursor pointing at the entry for `key`, if there is one.
    pub fn find<Q>(&self, key: &Q) -> Option<Cursor<'_, K, V, C, A>>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.find(key)
    }

    /// Returns a cursor pointing at the first entry whose key is not ordered before `key`.
    #[inline]
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C, A>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.lower_bound(key)
    }

    /// Returns a cursor pointing at the first entry whose key is ordered after `key`.
    #[inline]
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C, A>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.upper_bound(key)
    }

    /// Returns the lower and upper bounds of `key` as a pair of cursors.
    ///
    /// The cursors delimit the entries equivalent to `key`: if `key` is present, advancing the
    /// first cursor once reaches the second.
    pub fn equal_range<Q>(&self, key: &Q) -> (Cursor<'_, K, V, C, A>, Cursor<'_, K, V, C, A>)
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        (self.lower_bound(key), self.upper_bound(key))
    }

    /// Returns an iterator over the entries whose keys fall within `range`.
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        self.tree.range(range)
    }

    /// Returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first()
    }

    /// Removes and returns the first key-value pair in the map.
    ///
    /// The returned key is the minimum key in the map.
    #[inline]
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        self.tree.pop_first()
    }

    /// Returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last()
    }

    /// Removes and returns the last key-value pair in the map.
    ///
    /// The returned key is the maximum key in the map.
    #[inline]
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        self.tree.pop_last()
    }

    /// Removes the value associated with `key` from the map.
    #[inline]
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` from the map, returning the stored key and value.
    #[inline]
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.tree.remove_entry(key)
    }

    /// Removes `key` from the map, returning the number of entries removed (0 or 1).
    #[inline]
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        usize::from(self.tree.remove(key))
    }

    /// Removes every entry whose key falls within `range`, returning how many were removed.
    ///
    /// Each entry in the range is removed exactly once.
    pub fn remove_range<Q, R>(&mut self, range: R) -> usize
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        let (mut opt_cur, back) = self.tree.range_raw(&range);
        let mut removed = 0;

        // Entries only ever move from a node's predecessor into the node, and every node before
        // `cur` in the range is already gone, so `next` and `back` stay live across removals.
        while let Some(cur) = opt_cur {
            let next = if Some(cur) == back {
                None
            } else {
                unsafe { successor(cur) }
            };

            drop(unsafe { self.tree.remove_at(cur) });
            removed += 1;

            opt_cur = next;
        }

        removed
    }

    /// Retains only the entries for which `f` returns `true`, visiting them in key order.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut curs = self.tree.cursor_first_mut();

        while let Some((key, value)) = curs.get_mut() {
            if f(key, value) {
                curs.move_next();
            } else {
                curs.remove_current();
            }
        }
    }

    /// Clears the map, removing all elements.
    #[inline]
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Swaps the contents of two maps in constant time.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.tree, &mut other.tree);
    }

    /// Returns an iterator over the entries of the map, in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    /// Returns an iterator over the entries of the map, with mutable references to the values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.tree.iter_mut()
    }

    /// Returns an iterator over the keys of the map, in order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map, in key order.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values of the map, in key order.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Consumes the map, returning its keys in order.
    pub fn into_keys(self) -> IntoKeys<K, V, C, A> {
        IntoKeys {
            inner: self.into_iter(),
        }
    }

    /// Consumes the map, returning its values in key order.
    pub fn into_values(self) -> IntoValues<K, V, C, A> {
        IntoValues {
            inner: self.into_iter(),
        }
    }

    /// Returns a cursor pointing at the first entry.
    pub fn cursor_first(&self) -> Cursor<'_, K, V, C, A> {
        self.tree.cursor_first()
    }

    /// Returns a cursor pointing at the last entry.
    pub fn cursor_last(&self) -> Cursor<'_, K, V, C, A> {
        self.tree.cursor_last()
    }

    /// Returns a cursor pointing at the "ghost" non-element past the last entry.
    pub fn cursor_end(&self) -> Cursor<'_, K, V, C, A> {
        self.tree.cursor_end()
    }

    /// Returns an editing cursor pointing at the first entry.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        self.tree.cursor_first_mut()
    }

    /// Returns an editing cursor pointing at the last entry.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        self.tree.cursor_last_mut()
    }

    /// Returns an editing cursor pointing at the "ghost" non-element.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        self.tree.cursor_end_mut()
    }
}

impl<K, V, C, A> AvlMap<K, V, C, A>
where
    C: Comparator<K>,
    A: NodeAllocator,
{
    /// Inserts `key` with `value`, returning `true` if the key was not already present.
    ///
    /// If the key is present the map is not modified.
    #[inline]
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.tree.insert(key, value)
    }

    /// Inserts `key` with `value`, reporting allocation failure instead of escalating it.
    #[inline]
    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool, AllocError> {
        self.tree.try_insert(key, value)
    }

    /// Gets the entry for `key` for in-place access or insertion.
    #[inline]
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C, A> {
        self.tree.entry(key)
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key is absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        self.tree.assert_invariants();
    }
}

impl<K, V, C, A> Default for AvlMap<K, V, C, A>
where
    C: Default,
    A: NodeAllocator + Default,
{
    fn default() -> Self {
        AvlMap::with_comparator_in(C::default(), A::default())
    }
}

impl<K, V, C, A> Clone for AvlMap<K, V, C, A>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
    A: NodeAllocator + Clone,
{
    fn clone(&self) -> Self {
        AvlMap {
            tree: self.tree.clone(),
        }
    }
}

impl<K, V, C, A> fmt::Debug for AvlMap<K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C, A> PartialEq for AvlMap<K, V, C, A>
where
    K: PartialEq,
    V: PartialEq,
    A: NodeAllocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C, A: NodeAllocator> Eq for AvlMap<K, V, C, A> {}

impl<K, V, C, A> PartialOrd for AvlMap<K, V, C, A>
where
    K: PartialOrd,
    V: PartialOrd,
    A: NodeAllocator,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, V: Ord, C, A: NodeAllocator> Ord for AvlMap<K, V, C, A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: Hash, V: Hash, C, A: NodeAllocator> Hash for AvlMap<K, V, C, A> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_usize(self.len());
        for entry in self.iter() {
            entry.hash(state);
        }
    }
}

impl<K, V, C, A, Q> Index<&Q> for AvlMap<K, V, C, A>
where
    K: Borrow<Q>,
    C: Comparator<Q>,
    A: NodeAllocator,
    Q: ?Sized,
{
    type Output = V;

    /// Returns a reference to the value associated with `key`.
    ///
    /// # Panics
    ///
    /// Panics if `key` is not present in the map. Use [`AvlMap::at`] for a fallible lookup.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("{}", OutOfRange),
        }
    }
}

impl<K, V, C, A> FromIterator<(K, V)> for AvlMap<K, V, C, A>
where
    C: Comparator<K> + Default,
    A: NodeAllocator + Default,
{
    /// Collects entries into a map. When a key repeats, the first value wins.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AvlMap::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C, A> Extend<(K, V)> for AvlMap<K, V, C, A>
where
    C: Comparator<K>,
    A: NodeAllocator,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K, V, C, A> Extend<(&'a K, &'a V)> for AvlMap<K, V, C, A>
where
    K: Copy + 'a,
    V: Copy + 'a,
    C: Comparator<K>,
    A: NodeAllocator,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        for (&key, &value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AvlMap<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'map, K, V, C, A> IntoIterator for &'map AvlMap<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = (&'map K, &'map V);
    type IntoIter = Iter<'map, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'map, K, V, C, A> IntoIterator for &'map mut AvlMap<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = (&'map K, &'map mut V);
    type IntoIter = IterMut<'map, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C, A> IntoIterator for AvlMap<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.tree.into_iter()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use core::ops::Bound;
    use std::{hash::DefaultHasher, prelude::v1::*};

    use super::*;
    use crate::Reversed;

    #[test]
    fn index_style_access_inserts_default() {
        let mut map: AvlMap<&str, u32> = AvlMap::new();

        *map.get_or_insert_default("x") += 1;
        *map.get_or_insert_default("x") += 1;
        *map.entry("y").or_default() += 5;

        assert_eq!(map["x"], 2);
        assert_eq!(map["y"], 5);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn at_reports_out_of_range() {
        let mut map = AvlMap::from([(1, "one")]);

        assert_eq!(map.at(&1), Ok(&"one"));
        assert_eq!(map.at(&2), Err(OutOfRange));

        *map.at_mut(&1).unwrap() = "uno";
        assert_eq!(map.at_mut(&3), Err(OutOfRange));
        assert_eq!(map[&1], "uno");
    }

    #[test]
    #[should_panic(expected = "key not found")]
    fn index_missing_key_panics() {
        let map: AvlMap<u32, u32> = AvlMap::new();
        let _value: u32 = map[&7];
    }

    #[test]
    fn erase_forms() {
        let mut map: AvlMap<u32, u32> = (0..10).map(|k| (k, k)).collect();

        assert_eq!(map.erase(&3), 1);
        assert_eq!(map.erase(&3), 0);

        // Position form.
        let mut curs = map.cursor_first_mut();
        curs.move_next();
        assert_eq!(curs.remove_current(), Some((1, 1)));
        assert_eq!(curs.key(), Some(&2));

        // Range form.
        assert_eq!(map.remove_range(4..8), 4);
        assert_eq!(map.remove_range(4..8), 0);
        map.assert_invariants();

        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [0, 2, 8, 9]);
    }

    #[test]
    fn remove_range_through_two_child_nodes() {
        let mut map: AvlMap<u32, ()> = (0..64).map(|k| (k, ())).collect();

        assert_eq!(map.remove_range(10..=50), 41);
        map.assert_invariants();
        assert_eq!(map.len(), 23);
        assert!(map.keys().all(|&k| !(10..=50).contains(&k)));

        assert_eq!(map.remove_range::<u32, _>(..), 23);
        assert!(map.is_empty());
    }

    #[test]
    fn equal_range_spans_one_entry() {
        let map: AvlMap<u32, u32> = [10, 20, 30].into_iter().map(|k| (k, k)).collect();

        let (mut lower, upper) = map.equal_range(&20);
        assert_eq!(lower.key(), Some(&20));
        lower.move_next();
        assert_eq!(lower, upper);
        assert_eq!(upper.key(), Some(&30));

        let (lower, upper) = map.equal_range(&25);
        assert_eq!(lower, upper);
        assert_eq!(lower.key(), Some(&30));

        let (lower, upper) = map.equal_range(&30);
        assert_eq!(lower.key(), Some(&30));
        assert!(upper.is_end());
    }

    #[test]
    fn comparison_is_lexicographic() {
        let a = AvlMap::from([(1, 1), (2, 2)]);
        let b = AvlMap::from([(1, 1), (2, 3)]);
        let c = AvlMap::from([(1, 1)]);

        assert!(a < b);
        assert!(c < a);
        assert_ne!(a, c);
        assert_eq!(a, a.clone());
        assert_eq!(a.cmp(&a.clone()), Ordering::Equal);
    }

    #[test]
    fn equal_maps_hash_equally() {
        fn hash_of<T: Hash>(value: &T) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let a = AvlMap::from([(3, 'c'), (1, 'a'), (2, 'b')]);
        let b = AvlMap::from([(1, 'a'), (2, 'b'), (3, 'c')]);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn reversed_comparator() {
        let mut map = AvlMap::with_comparator(Reversed(Natural));
        map.extend([(1, 'a'), (3, 'c'), (2, 'b')]);

        assert_eq!(map.keys().copied().collect::<Vec<_>>(), [3, 2, 1]);
        assert_eq!(map.lower_bound(&2).key(), Some(&2));
        assert_eq!(map.upper_bound(&2).key(), Some(&1));
        map.assert_invariants();
    }

    #[test]
    fn retain_and_swap() {
        let mut evens: AvlMap<u32, u32> = (0..20).map(|k| (k, k * k)).collect();
        evens.retain(|k, v| {
            *v += 1;
            k % 2 == 0
        });
        evens.assert_invariants();
        assert_eq!(evens.len(), 10);
        assert_eq!(evens.get(&4), Some(&17));

        let mut other = AvlMap::new();
        other.insert(100, 0);
        evens.swap(&mut other);
        assert_eq!(evens.len(), 1);
        assert_eq!(other.len(), 10);
    }

    #[test]
    fn owning_iterators() {
        let map = AvlMap::from([(2, "b"), (1, "a"), (3, "c")]);

        assert_eq!(map.clone().into_keys().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(map.clone().into_values().rev().collect::<Vec<_>>(), ["c", "b", "a"]);

        let mut iter = map.into_iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back(), Some((3, "c")));
        assert_eq!(iter.next(), Some((1, "a")));
        assert_eq!(iter.len(), 1);
    }

    #[test]
    fn borrowed_lookups() {
        let mut map: AvlMap<String, usize> = AvlMap::new();
        map.insert("apple".to_string(), 1);
        map.insert("pear".to_string(), 2);

        assert_eq!(map.get("pear"), Some(&2));
        assert!(map.contains_key("apple"));
        assert_eq!(map.count("plum"), 0);
        assert_eq!(
            map.range::<str, _>((Bound::Included("b"), Bound::Unbounded))
                .map(|(k, _)| k.as_str())
                .collect::<Vec<_>>(),
            ["pear"]
        );
    }

    #[test]
    fn allocator_sees_every_node() {
        let counting = crate::Counting::new(crate::Global);
        let mut map = AvlMap::new_in(counting);

        for key in 0..10u32 {
            map.insert(key, key);
        }
        assert_eq!(map.allocator().live(), 10);

        map.remove(&3);
        map.pop_last();
        assert_eq!(map.allocator().live(), 8);
        assert_eq!(map.allocator().deallocations(), 2);
    }
}
