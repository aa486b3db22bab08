//! An ordered map backed by an AVL tree with parent links.
#![no_std]
#![warn(unsafe_op_in_unsafe_fn)]

// Conventions used in comments:
// - The height of a node `x` is denoted `h(x)`. A leaf has height 0 and a missing child has
//   height -1.
// - The balance factor of `x` is `b(x) = h(left(x)) - h(right(x))`.
// - A node is `d`-heavy if its `d` subtree is taller than the other one.
//
// The invariants of the tree, which hold whenever no public method is executing, are:
// 1. Every key in the left subtree of `x` orders strictly before the key of `x`, and every key in
//    the right subtree orders strictly after it.
// 2. `h(x) = 1 + max(h(left(x)), h(right(x)))`, and the stored `b(x)` agrees with the heights.
// 3. `|b(x)| <= 1` for every node.
// 4. Every child's parent link points back at the node that owns it.
//
// Child links own their nodes. Parent links never do; they exist so that cursors can step through
// the tree and so that rebalancing can climb back to the root without a stack.

extern crate alloc;

// The `Arbitrary` derives in the model checker expand to `::std` paths.
#[cfg(any(test, feature = "model"))]
extern crate std;

use core::{
    alloc::Layout,
    borrow::Borrow,
    cmp::Ordering,
    fmt,
    marker::PhantomData,
    mem,
    ops::{Bound, Not, RangeBounds},
    ptr::NonNull,
};

mod allocator;
mod compare;
mod cursor;
mod debug;
mod entry;
mod error;
mod iter;
mod map;

#[cfg(any(test, feature = "model"))]
pub mod model;

#[cfg(test)]
mod tests;

pub use crate::{
    allocator::{Counting, Global, NodeAllocator},
    compare::{Comparator, Natural, Reversed},
    cursor::{Cursor, CursorMut},
    entry::{Entry, OccupiedEntry, VacantEntry},
    error::{AllocError, OutOfRange},
    iter::{IntoIter, IntoKeys, IntoValues, Iter, IterMut, Keys, Range, Values, ValuesMut},
    map::AvlMap,
};

/// Selects which boundary [`AvlTree::bound`] searches for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BoundKind {
    /// The first entry whose key is not ordered before the search key.
    Lower,
    /// The first entry whose key is ordered strictly after the search key.
    Upper,
}

/// A self-balancing binary search tree that owns its entries.
///
/// Keys are unique and ordered by the comparator `C`. Nodes are obtained from the allocation
/// strategy `A` and are freed exactly once, by removal, by [`clear`](Self::clear) or when the tree
/// is dropped.
pub struct AvlTree<K, V, C = Natural, A = Global>
where
    A: NodeAllocator,
{
    root: Link<K, V>,
    len: usize,
    comparator: C,
    alloc: A,
    _owns: PhantomData<Node<K, V>>,
}

pub(crate) struct Node<K, V> {
    links: Links<K, V>,
    key: K,
    value: V,
}

pub(crate) struct Links<K, V> {
    parent: Link<K, V>,
    children: [Link<K, V>; 2],
    height: i8,
    balance: i8,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Dir {
    Left = 0,
    Right = 1,
}

impl Not for Dir {
    type Output = Dir;

    fn not(self) -> Self::Output {
        match self {
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

pub(crate) type Link<K, V> = Option<NonNull<Node<K, V>>>;

// The outcome of descending the tree in search of a key.
pub(crate) enum Search<K, V> {
    Found(NonNull<Node<K, V>>),
    Vacant(InsertAs<K, V>),
}

// Where a new node goes once a search comes up empty.
pub(crate) enum InsertAs<K, V> {
    Root,
    Child { parent: NonNull<Node<K, V>>, dir: Dir },
}

// Node accessors. Callers must pass a pointer to a live node of some tree, and must not let the
// returned references overlap a mutable access to the same node.

#[inline]
pub(crate) unsafe fn links<'a, K, V>(node: NonNull<Node<K, V>>) -> &'a Links<K, V> {
    unsafe { &(*node.as_ptr()).links }
}

#[inline]
pub(crate) unsafe fn links_mut<'a, K, V>(node: NonNull<Node<K, V>>) -> &'a mut Links<K, V> {
    unsafe { &mut (*node.as_ptr()).links }
}

#[inline]
pub(crate) unsafe fn key<'a, K, V>(node: NonNull<Node<K, V>>) -> &'a K {
    unsafe { &(*node.as_ptr()).key }
}

#[inline]
pub(crate) unsafe fn value<'a, K, V>(node: NonNull<Node<K, V>>) -> &'a V {
    unsafe { &(*node.as_ptr()).value }
}

#[inline]
pub(crate) unsafe fn value_mut<'a, K, V>(node: NonNull<Node<K, V>>) -> &'a mut V {
    unsafe { &mut (*node.as_ptr()).value }
}

#[inline]
pub(crate) unsafe fn entry<'a, K, V>(node: NonNull<Node<K, V>>) -> (&'a K, &'a V) {
    unsafe { (key(node), value(node)) }
}

// Returns the last node reached by following `dir` links from `node`.
//
// With `Dir::Left` this is the minimum of the subtree rooted at `node`; with `Dir::Right` it is the
// maximum.
#[inline]
pub(crate) unsafe fn extreme_in_subtree<K, V>(
    node: NonNull<Node<K, V>>,
    dir: Dir,
) -> NonNull<Node<K, V>> {
    let mut cur = node;

    while let Some(next) = unsafe { links(cur).child(dir) } {
        cur = next;
    }

    cur
}

#[inline]
pub(crate) unsafe fn min_in_subtree<K, V>(node: NonNull<Node<K, V>>) -> NonNull<Node<K, V>> {
    unsafe { extreme_in_subtree(node, Dir::Left) }
}

#[inline]
pub(crate) unsafe fn max_in_subtree<K, V>(node: NonNull<Node<K, V>>) -> NonNull<Node<K, V>> {
    unsafe { extreme_in_subtree(node, Dir::Right) }
}

// Returns the in-order neighbor of `node` in direction `dir`.
//
// If `node` has a `dir` subtree, the neighbor is the `!dir`-most node of that subtree. Otherwise
// climb while `node` is a `dir` child; the first ancestor reached from its `!dir` side is the
// neighbor. Climbing off the root means there is none.
pub(crate) unsafe fn step<K, V>(node: NonNull<Node<K, V>>, dir: Dir) -> Link<K, V> {
    unsafe {
        if let Some(child) = links(node).child(dir) {
            return Some(extreme_in_subtree(child, !dir));
        }

        let mut cur = node;

        while let Some(parent) = links(cur).parent() {
            if links(parent).child(dir) != Some(cur) {
                return Some(parent);
            }

            cur = parent;
        }

        None
    }
}

#[inline]
pub(crate) unsafe fn successor<K, V>(node: NonNull<Node<K, V>>) -> Link<K, V> {
    unsafe { step(node, Dir::Right) }
}

#[inline]
pub(crate) unsafe fn predecessor<K, V>(node: NonNull<Node<K, V>>) -> Link<K, V> {
    unsafe { step(node, Dir::Left) }
}

#[inline]
unsafe fn height_of<K, V>(link: Link<K, V>) -> i8 {
    link.map(|n| unsafe { links(n).height() }).unwrap_or(-1)
}

impl<K, V> AvlTree<K, V> {
    /// Returns a new empty tree ordered by [`Ord`].
    pub const fn new() -> AvlTree<K, V> {
        AvlTree::with_comparator_in(Natural, Global)
    }
}

impl<K, V, C> AvlTree<K, V, C> {
    /// Returns a new empty tree ordered by `comparator`.
    pub const fn with_comparator(comparator: C) -> AvlTree<K, V, C> {
        AvlTree::with_comparator_in(comparator, Global)
    }
}

impl<K, V, A> AvlTree<K, V, Natural, A>
where
    A: NodeAllocator,
{
    /// Returns a new empty tree ordered by [`Ord`] whose nodes come from `alloc`.
    pub const fn new_in(alloc: A) -> AvlTree<K, V, Natural, A> {
        AvlTree::with_comparator_in(Natural, alloc)
    }
}

impl<K, V, C, A> AvlTree<K, V, C, A>
where
    A: NodeAllocator,
{
    /// Returns a new empty tree ordered by `comparator` whose nodes come from `alloc`.
    pub const fn with_comparator_in(comparator: C, alloc: A) -> AvlTree<K, V, C, A> {
        AvlTree {
            root: None,
            len: 0,
            comparator,
            alloc,
            _owns: PhantomData,
        }
    }

    /// Returns `true` if the tree contains no elements.
    pub fn is_empty(&self) -> bool {
        let empty = self.len() == 0;
        debug_assert_eq!(empty, self.root.is_none());
        empty
    }

    /// Returns the number of elements in the tree.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns the largest number of elements the allocator could ever hold.
    pub fn max_size(&self) -> usize {
        self.alloc.max_size(Layout::new::<Node<K, V>>())
    }

    /// Returns the number of levels in the tree, or 0 if it is empty.
    pub fn height(&self) -> usize {
        // Heights start at 0 for a lone leaf, so add one to count levels.
        (unsafe { height_of(self.root) } + 1) as usize
    }

    /// Returns the comparator that orders the keys.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the node allocation strategy.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// Returns the minimum entry of the tree.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.first_raw().map(|node| unsafe { entry(node) })
    }

    /// Returns the maximum entry of the tree.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.last_raw().map(|node| unsafe { entry(node) })
    }

    /// Removes and returns the minimum entry of the tree.
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let first = self.first_raw()?;
        Some(unsafe { self.remove_at(first) })
    }

    /// Removes and returns the maximum entry of the tree.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let last = self.last_raw()?;
        Some(unsafe { self.remove_at(last) })
    }

    /// Returns an iterator over the entries of the tree, in key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.first_raw(), self.last_raw(), self.len)
    }

    /// Returns an iterator over the entries of the tree, in key order, with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut::new(self.first_raw(), self.last_raw(), self.len)
    }

    /// Returns a cursor pointing at the minimum entry, or at the "ghost" non-element if the tree
    /// is empty.
    pub fn cursor_first(&self) -> Cursor<'_, K, V, C, A> {
        Cursor::new(self, self.first_raw())
    }

    /// Returns a cursor pointing at the maximum entry, or at the "ghost" non-element if the tree
    /// is empty.
    pub fn cursor_last(&self) -> Cursor<'_, K, V, C, A> {
        Cursor::new(self, self.last_raw())
    }

    /// Returns a cursor pointing at the "ghost" non-element past the last entry.
    pub fn cursor_end(&self) -> Cursor<'_, K, V, C, A> {
        Cursor::new(self, None)
    }

    /// Returns an editing cursor pointing at the minimum entry.
    pub fn cursor_first_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        let first = self.first_raw();
        CursorMut::new(self, first)
    }

    /// Returns an editing cursor pointing at the maximum entry.
    pub fn cursor_last_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        let last = self.last_raw();
        CursorMut::new(self, last)
    }

    /// Returns an editing cursor pointing at the "ghost" non-element.
    pub fn cursor_end_mut(&mut self) -> CursorMut<'_, K, V, C, A> {
        CursorMut::new(self, None)
    }

    /// Returns `true` if the tree contains `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get_raw(key).is_some()
    }

    /// Returns a reference to the value associated with `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get_raw(key).map(|node| unsafe { value(node) })
    }

    /// Returns the stored key and the value associated with `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get_raw(key).map(|node| unsafe { entry(node) })
    }

    /// Returns a mutable reference to the value associated with `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.get_raw(key).map(|node| unsafe { value_mut(node) })
    }

    /// Returns a cursor pointing at the entry for `key`, if there is one.
    pub fn find<Q>(&self, key: &Q) -> Option<Cursor<'_, K, V, C, A>>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(Cursor::new(self, Some(node)))
    }

    /// Returns a cursor pointing at the boundary of `key` selected by `kind`.
    ///
    /// The cursor points at the "ghost" non-element when no entry satisfies the bound.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn bound<Q>(&self, key: &Q, kind: BoundKind) -> Cursor<'_, K, V, C, A>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        Cursor::new(self, self.bound_raw(key, kind))
    }

    /// Returns a cursor pointing at the first entry whose key is not ordered before `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C, A>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.bound(key, BoundKind::Lower)
    }

    /// Returns a cursor pointing at the first entry whose key is ordered after `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> Cursor<'_, K, V, C, A>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.bound(key, BoundKind::Upper)
    }

    /// Returns an iterator over the entries whose keys fall within `range`.
    ///
    /// A range whose start is ordered after its end is empty.
    pub fn range<Q, R>(&self, range: R) -> Range<'_, K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        let (front, back) = self.range_raw(&range);
        Range::new(front, back)
    }

    /// Removes `key` from the tree, returning `true` if it was present.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    /// Removes `key` from the tree, returning the stored key and value if it was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let node = self.get_raw(key)?;
        Some(unsafe { self.remove_at(node) })
    }

    /// Clears the tree, removing all elements.
    ///
    /// Nodes are freed in post-order: each node is freed after both of its subtrees.
    pub fn clear(&mut self) {
        if self.root.is_some() {
            tracing::debug!(len = self.len, "clearing tree");
        }

        let mut opt_cur = self.root.take();

        while let Some(cur) = opt_cur {
            unsafe {
                // Descend until a leaf is reached.
                if let Some(child) = links(cur).left().or(links(cur).right()) {
                    opt_cur = Some(child);
                    continue;
                }

                // Detach the leaf from its parent and free it. The parent may now be a leaf.
                let parent = links(cur).parent();
                if let Some(parent) = parent {
                    self.replace_child(parent, cur, None);
                }

                drop(allocator::destroy(&self.alloc, cur));
                self.len -= 1;

                opt_cur = parent;
            }
        }

        debug_assert!(self.root.is_none());
        debug_assert_eq!(self.len, 0);
    }

    pub(crate) fn first_raw(&self) -> Link<K, V> {
        self.root.map(|root| unsafe { min_in_subtree(root) })
    }

    pub(crate) fn last_raw(&self) -> Link<K, V> {
        self.root.map(|root| unsafe { max_in_subtree(root) })
    }

    pub(crate) fn search<Q>(&self, key: &Q) -> Search<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let Some(mut cur) = self.root else {
            return Search::Vacant(InsertAs::Root);
        };

        loop {
            let dir = match self.comparator.compare(key, unsafe { self::key(cur) }.borrow()) {
                Ordering::Less => Dir::Left,
                Ordering::Equal => return Search::Found(cur),
                Ordering::Greater => Dir::Right,
            };

            match unsafe { links(cur).child(dir) } {
                Some(child) => cur = child,
                None => return Search::Vacant(InsertAs::Child { parent: cur, dir }),
            }
        }
    }

    pub(crate) fn get_raw<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        match self.search(key) {
            Search::Found(node) => Some(node),
            Search::Vacant(_) => None,
        }
    }

    // A single descent remembering the last node at which the search turned left. That node is
    // the least node seen so far that satisfies the bound.
    pub(crate) fn bound_raw<Q>(&self, key: &Q, kind: BoundKind) -> Link<K, V>
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
    {
        let mut best = None;
        let mut opt_cur = self.root;

        while let Some(cur) = opt_cur {
            let ordering = self.comparator.compare(unsafe { self::key(cur) }.borrow(), key);

            let satisfies = match kind {
                BoundKind::Lower => ordering != Ordering::Less,
                BoundKind::Upper => ordering == Ordering::Greater,
            };

            opt_cur = if satisfies {
                best = Some(cur);
                unsafe { links(cur).left() }
            } else {
                unsafe { links(cur).right() }
            };
        }

        best
    }

    // Returns the first and last nodes inside `range`, or `(None, None)` if it is empty.
    pub(crate) fn range_raw<Q, R>(&self, range: &R) -> (Link<K, V>, Link<K, V>)
    where
        K: Borrow<Q>,
        C: Comparator<Q>,
        Q: ?Sized,
        R: RangeBounds<Q>,
    {
        let front = match range.start_bound() {
            Bound::Included(key) => self.bound_raw(key, BoundKind::Lower),
            Bound::Excluded(key) => self.bound_raw(key, BoundKind::Upper),
            Bound::Unbounded => self.first_raw(),
        };

        // The back is the node just before the first node past the end.
        let past_back = match range.end_bound() {
            Bound::Included(key) => self.bound_raw(key, BoundKind::Upper),
            Bound::Excluded(key) => self.bound_raw(key, BoundKind::Lower),
            Bound::Unbounded => None,
        };
        let back = match past_back {
            Some(node) => unsafe { predecessor(node) },
            None => self.last_raw(),
        };

        match (front, back) {
            (Some(f), Some(b)) => {
                let ordering = unsafe {
                    self.comparator
                        .compare(self::key(f).borrow(), self::key(b).borrow())
                };

                if ordering == Ordering::Greater {
                    (None, None)
                } else {
                    (Some(f), Some(b))
                }
            }
            _ => (None, None),
        }
    }

    // Allocates a node for `key` and `value` and links it at `insert_as`.
    //
    // On allocation failure nothing is linked and the tree is unchanged.
    pub(crate) fn try_insert_at(
        &mut self,
        insert_as: InsertAs<K, V>,
        key: K,
        value: V,
    ) -> Result<NonNull<Node<K, V>>, AllocError> {
        let node = allocator::construct(
            &self.alloc,
            Node {
                links: Links::new(),
                key,
                value,
            },
        )?;

        unsafe {
            match insert_as {
                InsertAs::Root => {
                    debug_assert!(self.root.is_none());
                    self.root = Some(node);
                }

                InsertAs::Child { parent, dir } => {
                    debug_assert!(links(parent).child(dir).is_none());
                    links_mut(parent).set_child(dir, Some(node));
                    links_mut(node).set_parent(Some(parent));
                    self.rebalance_from(Some(parent));
                }
            }
        }

        self.len += 1;

        Ok(node)
    }

    // As `try_insert_at`, escalating allocation failure to the global handler.
    pub(crate) fn insert_at(
        &mut self,
        insert_as: InsertAs<K, V>,
        key: K,
        value: V,
    ) -> NonNull<Node<K, V>> {
        match self.try_insert_at(insert_as, key, value) {
            Ok(node) => node,
            Err(error) => {
                tracing::error!(%error, "node allocation failed");
                alloc::alloc::handle_alloc_error(error.layout())
            }
        }
    }

    /// Removes an arbitrary node from the tree, returning its entry.
    ///
    /// If `node` has two children, the entry of its in-order predecessor is moved into `node` and
    /// the predecessor's node is the one that is freed.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that `node` is an element of `self`, and not any
    /// other tree.
    pub(crate) unsafe fn remove_at(&mut self, node: NonNull<Node<K, V>>) -> (K, V) {
        // There are three possible cases:
        //
        // 1. `node` is a leaf. It is unlinked from its parent.
        // 2. `node` has one child. The child is elevated into `node`'s place.
        // 3. `node` has two children. The predecessor (the maximum of the left subtree) has no
        //    right child, so it is removed as in case 1 or 2 after trading entries with `node`.
        //
        // In every case the heights of the unlinked node's ancestors may have changed, so the
        // tree is rebalanced from the unlinked node's parent up to the root.

        unsafe {
            let parent = links(node).parent();
            let left = links(node).left();
            let right = links(node).right();

            let (unlinked, rebalance_from) = match (left, right) {
                (Some(left), Some(_)) => {
                    let pred = max_in_subtree(left);

                    tracing::trace!("removing node with two children via its predecessor");

                    mem::swap(&mut (*node.as_ptr()).key, &mut (*pred.as_ptr()).key);
                    mem::swap(&mut (*node.as_ptr()).value, &mut (*pred.as_ptr()).value);

                    let pred_parent = links(pred)
                        .parent()
                        .expect("predecessor of a node with two children has a parent");
                    let pred_left = links(pred).left();

                    self.replace_child(pred_parent, pred, pred_left);
                    self.maybe_set_parent(pred_left, Some(pred_parent));

                    (pred, Some(pred_parent))
                }

                (Some(child), None) | (None, Some(child)) => {
                    self.replace_child_or_set_root(parent, node, Some(child));
                    links_mut(child).set_parent(parent);

                    (node, parent)
                }

                (None, None) => {
                    self.replace_child_or_set_root(parent, node, None);

                    (node, parent)
                }
            };

            self.rebalance_from(rebalance_from);
            self.len -= 1;

            let Node { key, value, .. } = allocator::destroy(&self.alloc, unlinked);
            (key, value)
        }
    }

    // Support methods ========================================================

    unsafe fn maybe_set_parent(&mut self, opt_node: Link<K, V>, parent: Link<K, V>) {
        let Some(node) = opt_node else {
            return;
        };

        unsafe { links_mut(node).set_parent(parent) };
    }

    #[inline]
    unsafe fn replace_child_or_set_root(
        &mut self,
        parent: Link<K, V>,
        old_child: NonNull<Node<K, V>>,
        new_child: Link<K, V>,
    ) {
        match parent {
            Some(parent) => unsafe { self.replace_child(parent, old_child, new_child) },
            None => self.root = new_child,
        }
    }

    // Replaces the child pointer of `parent` pointing at `old_child` with `new_child`.
    //
    // `new_child`'s parent pointer is not updated.
    //
    // # Safety
    //
    // The caller must ensure that `old_child` is a child node of `parent`.
    #[inline]
    unsafe fn replace_child(
        &mut self,
        parent: NonNull<Node<K, V>>,
        old_child: NonNull<Node<K, V>>,
        new_child: Link<K, V>,
    ) {
        unsafe {
            let dir = self.which_child(parent, old_child);
            links_mut(parent).set_child(dir, new_child);
        }
    }

    #[inline]
    pub(crate) unsafe fn which_child(
        &self,
        parent: NonNull<Node<K, V>>,
        child: NonNull<Node<K, V>>,
    ) -> Dir {
        unsafe {
            if links(parent).left() == Some(child) {
                Dir::Left
            } else {
                debug_assert_eq!(links(parent).right(), Some(child), "not a child of `parent`");
                Dir::Right
            }
        }
    }

    // Recomputes the height and balance factor of `node` from its children.
    #[inline]
    unsafe fn update(&mut self, node: NonNull<Node<K, V>>) {
        unsafe {
            let left = height_of(links(node).left());
            let right = height_of(links(node).right());

            let links = links_mut(node);
            links.height = 1 + left.max(right);
            links.balance = left - right;
        }
    }

    // Performs a rotation, moving `up` up and its parent `down` down.
    //
    // The heights of `down` and `up` are recomputed, in that order; no other node's height
    // changes.
    unsafe fn rotate_at(&mut self, down: NonNull<Node<K, V>>, up: NonNull<Node<K, V>>) {
        unsafe {
            // - `down` becomes the `dir` child of `up`.
            // - `across` goes from the `dir` child of `up` to the `!dir` child of `down`.
            let dir = if links(down).right() == Some(up) {
                Dir::Left
            } else {
                Dir::Right
            };

            tracing::trace!(?dir, "rotating");

            let across = links(up).child(dir);
            links_mut(down).set_child(!dir, across);
            self.maybe_set_parent(across, Some(down));

            links_mut(up).set_child(dir, Some(down));
            let parent = links_mut(down).set_parent(Some(up));
            links_mut(up).set_parent(parent);

            self.replace_child_or_set_root(parent, down, Some(up));

            self.update(down);
            self.update(up);
        }
    }

    // Restores the balance of `node`, whose children are balanced, returning the root of the
    // rebalanced subtree.
    unsafe fn rebalance_at(&mut self, node: NonNull<Node<K, V>>) -> NonNull<Node<K, V>> {
        unsafe {
            self.update(node);

            let balance = links(node).balance();
            let heavy = if balance > 1 {
                Dir::Left
            } else if balance < -1 {
                Dir::Right
            } else {
                return node;
            };

            let child = links(node)
                .child(heavy)
                .expect("the heavy side of a node is not empty");

            // If the child leans away from `heavy`, a single rotation would only move the
            // imbalance to the other side. Rotate the child first.
            let child_balance = links(child).balance();
            let leans_away = match heavy {
                Dir::Left => child_balance < 0,
                Dir::Right => child_balance > 0,
            };

            let up = if leans_away {
                let grandchild = links(child)
                    .child(!heavy)
                    .expect("a leaning child has a child on that side");
                self.rotate_at(child, grandchild);
                grandchild
            } else {
                child
            };

            self.rotate_at(node, up);
            up
        }
    }

    // Rebalances every node from `start` up to the root.
    unsafe fn rebalance_from(&mut self, start: Link<K, V>) {
        let mut opt_cur = start;

        while let Some(cur) = opt_cur {
            unsafe {
                let top = self.rebalance_at(cur);
                opt_cur = links(top).parent();
            }
        }
    }
}

impl<K, V, C, A> AvlTree<K, V, C, A>
where
    C: Comparator<K>,
    A: NodeAllocator,
{
    /// Inserts `key` with `value`, returning `true` if the key was not already present.
    ///
    /// If the key is present the tree is not modified and `value` is dropped.
    ///
    /// This operation completes in _O(log(n))_ time.
    ///
    /// # Panics
    ///
    /// Allocation failure is reported through [`handle_alloc_error`], which aborts by default.
    ///
    /// [`handle_alloc_error`]: alloc::alloc::handle_alloc_error
    pub fn insert(&mut self, key: K, value: V) -> bool {
        match self.search(&key) {
            Search::Found(_) => false,
            Search::Vacant(insert_as) => {
                self.insert_at(insert_as, key, value);
                true
            }
        }
    }

    /// Inserts `key` with `value`, returning `Ok(true)` if the key was not already present.
    ///
    /// If the allocator fails, the error is returned and the tree is left exactly as it was.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<bool, AllocError> {
        match self.search(&key) {
            Search::Found(_) => Ok(false),
            Search::Vacant(insert_as) => {
                self.try_insert_at(insert_as, key, value)?;
                Ok(true)
            }
        }
    }

    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let count = match self.root {
            Some(root) => unsafe {
                assert!(links(root).parent().is_none(), "root has a parent");
                self.assert_invariants_at(root).1
            },
            None => 0,
        };

        assert_eq!(count, self.len, "`len` does not match the number of nodes");

        let mut opt_prev: Option<&K> = None;
        for (key, _) in self.iter() {
            if let Some(prev) = opt_prev {
                assert_eq!(
                    self.comparator.compare(prev, key),
                    Ordering::Less,
                    "keys are not strictly increasing"
                );
            }
            opt_prev = Some(key);
        }
    }

    // Returns the height of the subtree rooted at `node` and the number of nodes in it.
    unsafe fn assert_invariants_at(&self, node: NonNull<Node<K, V>>) -> (i8, usize) {
        unsafe {
            let mut heights = [-1; 2];
            let mut count = 1;

            for dir in [Dir::Left, Dir::Right] {
                if let Some(child) = links(node).child(dir) {
                    // Ensure child's parent link points to this node.
                    assert_eq!(
                        links(child).parent(),
                        Some(node),
                        "child's parent pointer not set"
                    );

                    let (height, len) = self.assert_invariants_at(child);
                    heights[dir as usize] = height;
                    count += len;
                }
            }

            let [left, right] = heights;
            let height = 1 + left.max(right);
            let balance = left - right;

            assert_eq!(links(node).height(), height, "stale height");
            assert_eq!(links(node).balance(), balance, "stale balance factor");
            assert!((-1..=1).contains(&balance), "balance factor {balance} out of range");

            (height, count)
        }
    }
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        AvlTree::new()
    }
}

impl<K, V, C, A> Clone for AvlTree<K, V, C, A>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
    A: NodeAllocator + Clone,
{
    fn clone(&self) -> Self {
        let mut tree = AvlTree::with_comparator_in(self.comparator.clone(), self.alloc.clone());

        for (key, value) in self.iter() {
            tree.insert(key.clone(), value.clone());
        }

        tree
    }
}

impl<K, V, C, A> fmt::Debug for AvlTree<K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C, A> Drop for AvlTree<K, V, C, A>
where
    A: NodeAllocator,
{
    fn drop(&mut self) {
        self.clear();
    }
}

// SAFETY: the tree owns its nodes exclusively, like a `Box`.
unsafe impl<K: Send, V: Send, C: Send, A: NodeAllocator + Send> Send for AvlTree<K, V, C, A> {}

// SAFETY: shared access never mutates nodes.
unsafe impl<K: Sync, V: Sync, C: Sync, A: NodeAllocator + Sync> Sync for AvlTree<K, V, C, A> {}

impl<K, V> Links<K, V> {
    #[must_use]
    const fn new() -> Self {
        Self {
            parent: None,
            children: [None; 2],
            height: 0,
            balance: 0,
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.left().is_none() && self.right().is_none()
    }

    #[inline]
    pub(crate) fn height(&self) -> i8 {
        self.height
    }

    #[inline]
    pub(crate) fn balance(&self) -> i8 {
        self.balance
    }

    #[inline]
    pub(crate) fn parent(&self) -> Link<K, V> {
        self.parent
    }

    #[inline]
    pub(crate) fn child(&self, dir: Dir) -> Link<K, V> {
        self.children[dir as usize]
    }

    #[inline]
    pub(crate) fn left(&self) -> Link<K, V> {
        self.child(Dir::Left)
    }

    #[inline]
    pub(crate) fn right(&self) -> Link<K, V> {
        self.child(Dir::Right)
    }

    #[inline]
    fn set_parent(&mut self, parent: Link<K, V>) -> Link<K, V> {
        mem::replace(&mut self.parent, parent)
    }

    #[inline]
    fn set_child(&mut self, dir: Dir, child: Link<K, V>) -> Link<K, V> {
        mem::replace(&mut self.children[dir as usize], child)
    }
}
