use core::{fmt, iter::FusedIterator, marker::PhantomData};

use crate::{entry, key, predecessor, successor, value_mut, AvlTree, Link, Node, NodeAllocator};

// A pair of fingers walking toward each other through the tree.
//
// `front` and `back` are both `None` once the fingers have met.
struct RawIter<K, V> {
    front: Link<K, V>,
    back: Link<K, V>,
}

impl<K, V> Clone for RawIter<K, V> {
    fn clone(&self) -> Self {
        RawIter {
            front: self.front,
            back: self.back,
        }
    }
}

impl<K, V> RawIter<K, V> {
    // `front` and `back` must be live nodes of the same tree with `front` not after `back`, or
    // both `None`.
    fn new(front: Link<K, V>, back: Link<K, V>) -> Self {
        debug_assert_eq!(front.is_none(), back.is_none());
        RawIter { front, back }
    }

    unsafe fn next(&mut self) -> Link<K, V> {
        let cur = self.front?;

        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.front = unsafe { successor(cur) };
        }

        Some(cur)
    }

    unsafe fn next_back(&mut self) -> Link<K, V> {
        let cur = self.back?;

        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else {
            self.back = unsafe { predecessor(cur) };
        }

        Some(cur)
    }
}

/// An iterator over the entries of an [`AvlTree`] or [`AvlMap`](crate::AvlMap), in key order.
pub struct Iter<'tree, K, V> {
    raw: RawIter<K, V>,
    len: usize,
    _tree: PhantomData<&'tree Node<K, V>>,
}

impl<K, V> Iter<'_, K, V> {
    pub(crate) fn new(front: Link<K, V>, back: Link<K, V>, len: usize) -> Self {
        Iter {
            raw: RawIter::new(front, back),
            len,
            _tree: PhantomData,
        }
    }
}

impl<'tree, K, V> Iterator for Iter<'tree, K, V> {
    type Item = (&'tree K, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.raw.next()? };
        self.len -= 1;
        Some(unsafe { entry(node) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.raw.next_back()? };
        self.len -= 1;
        Some(unsafe { entry(node) })
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            raw: self.raw.clone(),
            len: self.len,
            _tree: PhantomData,
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the entries of a tree, in key order, with mutable references to the values.
pub struct IterMut<'tree, K, V> {
    raw: RawIter<K, V>,
    len: usize,
    _tree: PhantomData<&'tree mut Node<K, V>>,
}

impl<K, V> IterMut<'_, K, V> {
    pub(crate) fn new(front: Link<K, V>, back: Link<K, V>, len: usize) -> Self {
        IterMut {
            raw: RawIter::new(front, back),
            len,
            _tree: PhantomData,
        }
    }
}

impl<'tree, K, V> Iterator for IterMut<'tree, K, V> {
    type Item = (&'tree K, &'tree mut V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.raw.next()? };
        self.len -= 1;
        Some(unsafe { (key(node), value_mut(node)) })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.raw.next_back()? };
        self.len -= 1;
        Some(unsafe { (key(node), value_mut(node)) })
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of an [`AvlMap`](crate::AvlMap), in order.
#[derive(Clone)]
pub struct Keys<'tree, K, V> {
    pub(crate) inner: Iter<'tree, K, V>,
}

impl<'tree, K, V> Iterator for Keys<'tree, K, V> {
    type Item = &'tree K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// An iterator over the values of an [`AvlMap`](crate::AvlMap), in key order.
#[derive(Clone)]
pub struct Values<'tree, K, V> {
    pub(crate) inner: Iter<'tree, K, V>,
}

impl<'tree, K, V> Iterator for Values<'tree, K, V> {
    type Item = &'tree V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

/// An iterator over mutable references to the values of an [`AvlMap`](crate::AvlMap).
pub struct ValuesMut<'tree, K, V> {
    pub(crate) inner: IterMut<'tree, K, V>,
}

impl<'tree, K, V> Iterator for ValuesMut<'tree, K, V> {
    type Item = &'tree mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ValuesMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// An iterator over a sub-range of the entries of a tree, in key order.
pub struct Range<'tree, K, V> {
    raw: RawIter<K, V>,
    _tree: PhantomData<&'tree Node<K, V>>,
}

impl<K, V> Range<'_, K, V> {
    pub(crate) fn new(front: Link<K, V>, back: Link<K, V>) -> Self {
        Range {
            raw: RawIter::new(front, back),
            _tree: PhantomData,
        }
    }
}

impl<'tree, K, V> Iterator for Range<'tree, K, V> {
    type Item = (&'tree K, &'tree V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.raw.next()? };
        Some(unsafe { entry(node) })
    }
}

impl<K, V> DoubleEndedIterator for Range<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let node = unsafe { self.raw.next_back()? };
        Some(unsafe { entry(node) })
    }
}

impl<K, V> FusedIterator for Range<'_, K, V> {}

impl<K, V> Clone for Range<'_, K, V> {
    fn clone(&self) -> Self {
        Range {
            raw: self.raw.clone(),
            _tree: PhantomData,
        }
    }
}

/// An owning iterator over the entries of a tree, in key order.
pub struct IntoIter<K, V, C, A>
where
    A: NodeAllocator,
{
    tree: AvlTree<K, V, C, A>,
}

impl<K, V, C, A> IntoIter<K, V, C, A>
where
    A: NodeAllocator,
{
    pub(crate) fn new(tree: AvlTree<K, V, C, A>) -> Self {
        IntoIter { tree }
    }
}

impl<K, V, C, A> Iterator for IntoIter<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<K, V, C, A> DoubleEndedIterator for IntoIter<K, V, C, A>
where
    A: NodeAllocator,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.tree.pop_last()
    }
}

impl<K, V, C, A> ExactSizeIterator for IntoIter<K, V, C, A> where A: NodeAllocator {}

impl<K, V, C, A> FusedIterator for IntoIter<K, V, C, A> where A: NodeAllocator {}

/// An owning iterator over the keys of an [`AvlMap`](crate::AvlMap), in order.
pub struct IntoKeys<K, V, C, A>
where
    A: NodeAllocator,
{
    pub(crate) inner: IntoIter<K, V, C, A>,
}

impl<K, V, C, A> Iterator for IntoKeys<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = K;

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C, A> DoubleEndedIterator for IntoKeys<K, V, C, A>
where
    A: NodeAllocator,
{
    fn next_back(&mut self) -> Option<K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V, C, A> ExactSizeIterator for IntoKeys<K, V, C, A> where A: NodeAllocator {}

impl<K, V, C, A> FusedIterator for IntoKeys<K, V, C, A> where A: NodeAllocator {}

/// An owning iterator over the values of an [`AvlMap`](crate::AvlMap), in key order.
pub struct IntoValues<K, V, C, A>
where
    A: NodeAllocator,
{
    pub(crate) inner: IntoIter<K, V, C, A>,
}

impl<K, V, C, A> Iterator for IntoValues<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = V;

    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, C, A> DoubleEndedIterator for IntoValues<K, V, C, A>
where
    A: NodeAllocator,
{
    fn next_back(&mut self) -> Option<V> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V, C, A> ExactSizeIterator for IntoValues<K, V, C, A> where A: NodeAllocator {}

impl<K, V, C, A> FusedIterator for IntoValues<K, V, C, A> where A: NodeAllocator {}

impl<'tree, K, V, C, A> IntoIterator for &'tree AvlTree<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = (&'tree K, &'tree V);
    type IntoIter = Iter<'tree, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'tree, K, V, C, A> IntoIterator for &'tree mut AvlTree<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = (&'tree K, &'tree mut V);
    type IntoIter = IterMut<'tree, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<K, V, C, A> IntoIterator for AvlTree<K, V, C, A>
where
    A: NodeAllocator,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, C, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}
