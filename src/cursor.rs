use core::{fmt, marker::PhantomData, ptr::NonNull};

use crate::{
    entry, key, links, predecessor, successor, value, value_mut, AvlTree, Link, NodeAllocator,
};

/// A cursor over an [`AvlTree`].
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first. The ghost is where iteration ends, and stepping backward from it
/// reaches the last element.
///
/// Two cursors are equal if they point to the same element, or if both point to the ghost.
pub struct Cursor<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    curs: CursorRaw<K, V, C, A>,
    phantom: PhantomData<&'tree AvlTree<K, V, C, A>>,
}

impl<'tree, K, V, C, A> Cursor<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    pub(crate) fn new(tree: &'tree AvlTree<K, V, C, A>, ptr: Link<K, V>) -> Self {
        Cursor {
            curs: CursorRaw {
                tree: NonNull::from(tree),
                ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the first
    /// element. If it is pointing to the last element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method moves it to the last
    /// element. If it is pointing to the first element, this method moves it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns the entry pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<(&'tree K, &'tree V)> {
        self.curs.ptr.map(|p| unsafe { entry(p) })
    }

    /// Returns the key pointed to by the cursor.
    pub fn key(&self) -> Option<&'tree K> {
        self.curs.ptr.map(|p| unsafe { key(p) })
    }

    /// Returns the value pointed to by the cursor.
    pub fn value(&self) -> Option<&'tree V> {
        self.curs.ptr.map(|p| unsafe { value(p) })
    }

    /// Returns the next entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<(&'tree K, &'tree V)> {
        unsafe { self.curs.peek_next().map(|p| entry(p)) }
    }

    /// Returns the previous entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<(&'tree K, &'tree V)> {
        unsafe { self.curs.peek_prev().map(|p| entry(p)) }
    }

    /// Returns `true` if the cursor is pointing to the "ghost" non-element.
    pub fn is_end(&self) -> bool {
        self.curs.ptr.is_none()
    }
}

impl<K, V, C, A> Clone for Cursor<'_, K, V, C, A>
where
    A: NodeAllocator,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, C, A> Copy for Cursor<'_, K, V, C, A> where A: NodeAllocator {}

impl<K, V, C, A> PartialEq for Cursor<'_, K, V, C, A>
where
    A: NodeAllocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.curs.ptr == other.curs.ptr
    }
}

impl<K, V, C, A> Eq for Cursor<'_, K, V, C, A> where A: NodeAllocator {}

impl<K, V, C, A> fmt::Debug for Cursor<'_, K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

/// A cursor over an [`AvlTree`] which supports editing operations.
///
/// A cursor points either to an element of the tree or to a "ghost" non-element that connects the
/// last element to the first.
pub struct CursorMut<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    curs: CursorRaw<K, V, C, A>,
    phantom: PhantomData<&'tree mut AvlTree<K, V, C, A>>,
}

impl<'tree, K, V, C, A> CursorMut<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    pub(crate) fn new(tree: &'tree mut AvlTree<K, V, C, A>, ptr: Link<K, V>) -> Self {
        CursorMut {
            curs: CursorRaw {
                tree: NonNull::from(tree),
                ptr,
            },
            phantom: PhantomData,
        }
    }

    /// Returns a read-only cursor pointing to the current element.
    ///
    /// The `CursorMut` remains immutably borrowed for the lifetime of the returned `Cursor`.
    pub fn as_cursor(&self) -> Cursor<'_, K, V, C, A> {
        Cursor {
            curs: self.curs,
            phantom: PhantomData,
        }
    }

    /// Moves the cursor to the next element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the first
    /// element. If it is pointing to the last element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_next(&mut self) {
        unsafe { self.curs.move_next() }
    }

    /// Moves the cursor to the previous element of the `AvlTree`.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method will move it to the last
    /// element. If it is pointing to the first element, this method will move it to the "ghost"
    /// non-element.
    pub fn move_prev(&mut self) {
        unsafe { self.curs.move_prev() }
    }

    /// Returns the entry pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get(&self) -> Option<(&K, &V)> {
        self.curs.ptr.map(|p| unsafe { entry(p) })
    }

    /// Returns the key and a mutable reference to the value pointed to by the cursor.
    ///
    /// This returns `None` if the cursor is currently pointing to the "ghost" non-element.
    pub fn get_mut(&mut self) -> Option<(&K, &mut V)> {
        self.curs.ptr.map(|p| unsafe { (key(p), value_mut(p)) })
    }

    /// Returns the key pointed to by the cursor.
    pub fn key(&self) -> Option<&K> {
        self.curs.ptr.map(|p| unsafe { key(p) })
    }

    /// Returns a mutable reference to the value pointed to by the cursor.
    pub fn value_mut(&mut self) -> Option<&mut V> {
        self.curs.ptr.map(|p| unsafe { value_mut(p) })
    }

    /// Returns the next entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the first element.
    /// If it is pointing to the last element, this method returns `None`.
    pub fn peek_next(&self) -> Option<(&K, &V)> {
        unsafe { self.curs.peek_next().map(|p| entry(p)) }
    }

    /// Returns the previous entry.
    ///
    /// If the cursor is pointing to the "ghost" non-element, this method returns the last element.
    /// If it is pointing to the first element, this method returns `None`.
    pub fn peek_prev(&self) -> Option<(&K, &V)> {
        unsafe { self.curs.peek_prev().map(|p| entry(p)) }
    }

    /// Returns `true` if the cursor is pointing to the "ghost" non-element.
    pub fn is_end(&self) -> bool {
        self.curs.ptr.is_none()
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed entry and moves the cursor to the next element. If the cursor is
    /// pointing to the "ghost" non-element, this method returns `None`, and neither the tree nor
    /// the cursor is modified.
    pub fn remove_current(&mut self) -> Option<(K, V)> {
        unsafe { self.curs.remove_current() }
    }

    /// Removes the current element from the tree.
    ///
    /// This returns the removed entry and moves the cursor to the previous element. If the cursor
    /// is pointing to the "ghost" non-element, this method returns `None`, and neither the tree
    /// nor the cursor is modified.
    pub fn remove_current_and_move_prev(&mut self) -> Option<(K, V)> {
        unsafe { self.curs.remove_current_and_move_prev() }
    }
}

impl<K, V, C, A> fmt::Debug for CursorMut<'_, K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.get()).finish()
    }
}

struct CursorRaw<K, V, C, A>
where
    A: NodeAllocator,
{
    tree: NonNull<AvlTree<K, V, C, A>>,
    ptr: Link<K, V>,
}

impl<K, V, C, A> Clone for CursorRaw<K, V, C, A>
where
    A: NodeAllocator,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, C, A> Copy for CursorRaw<K, V, C, A> where A: NodeAllocator {}

impl<K, V, C, A> CursorRaw<K, V, C, A>
where
    A: NodeAllocator,
{
    unsafe fn move_next(&mut self) {
        self.ptr = unsafe { self.peek_next() };
    }

    unsafe fn move_prev(&mut self) {
        self.ptr = unsafe { self.peek_prev() };
    }

    unsafe fn peek_next(&self) -> Link<K, V> {
        let tree = unsafe { self.tree.as_ref() };

        match self.ptr {
            Some(p) => unsafe { successor(p) },
            None => tree.first_raw(),
        }
    }

    unsafe fn peek_prev(&self) -> Link<K, V> {
        let tree = unsafe { self.tree.as_ref() };

        match self.ptr {
            Some(p) => unsafe { predecessor(p) },
            None => tree.last_raw(),
        }
    }

    unsafe fn remove_current(&mut self) -> Option<(K, V)> {
        let remove = self.ptr?;

        // Removal only ever frees `remove` or its predecessor, so the successor survives.
        unsafe { self.move_next() };

        let tree = unsafe { self.tree.as_mut() };
        Some(unsafe { tree.remove_at(remove) })
    }

    unsafe fn remove_current_and_move_prev(&mut self) -> Option<(K, V)> {
        let remove = self.ptr?;

        unsafe {
            // A node with two children takes over its predecessor's entry and the predecessor's
            // node is freed, so the previous element ends up stored in `remove` itself.
            let has_two_children =
                links(remove).left().is_some() && links(remove).right().is_some();

            if has_two_children {
                self.ptr = Some(remove);
            } else {
                self.move_prev();
            }

            let tree = self.tree.as_mut();
            Some(tree.remove_at(remove))
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::prelude::v1::*;

    use crate::AvlTree;

    fn tree_of(keys: &[u32]) -> AvlTree<u32, u32> {
        let mut tree = AvlTree::new();
        for &key in keys {
            tree.insert(key, key * 10);
        }
        tree
    }

    #[test]
    fn ghost_connects_last_to_first() {
        let tree = tree_of(&[2, 1, 3]);

        let mut curs = tree.cursor_end();
        assert!(curs.is_end());
        assert_eq!(curs.peek_next(), Some((&1, &10)));
        assert_eq!(curs.peek_prev(), Some((&3, &30)));

        curs.move_prev();
        assert_eq!(curs.key(), Some(&3));

        curs.move_next();
        assert!(curs.is_end());

        curs.move_next();
        assert_eq!(curs.key(), Some(&1));

        curs.move_prev();
        assert_eq!(curs, tree.cursor_end());
    }

    #[test]
    fn empty_tree_cursor() {
        let tree = tree_of(&[]);

        let mut curs = tree.cursor_first();
        assert!(curs.is_end());
        assert_eq!(curs.get(), None);

        curs.move_next();
        assert!(curs.is_end());
        curs.move_prev();
        assert!(curs.is_end());
    }

    #[test]
    fn remove_two_child_node_moving_prev() {
        // 2 is the root with children 1 and 3.
        let mut tree = tree_of(&[2, 1, 3]);

        let mut curs = tree.cursor_first_mut();
        curs.move_next();
        assert_eq!(curs.key(), Some(&2));

        assert_eq!(curs.remove_current_and_move_prev(), Some((2, 20)));
        assert_eq!(curs.key(), Some(&1));
        assert_eq!(curs.peek_next(), Some((&3, &30)));

        assert_eq!(curs.remove_current_and_move_prev(), Some((1, 10)));
        assert!(curs.is_end());

        tree.assert_invariants();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn remove_all_moving_next() {
        let mut tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);

        let mut removed = Vec::new();
        let mut curs = tree.cursor_first_mut();
        while let Some((key, _)) = curs.remove_current() {
            removed.push(key);
        }

        assert_eq!(removed, [1, 3, 4, 5, 7, 8, 9]);
        assert!(tree.is_empty());
    }

    #[test]
    fn value_mut_through_cursor() {
        let mut tree = tree_of(&[1, 2]);

        let mut curs = tree.cursor_last_mut();
        *curs.value_mut().unwrap() += 1;
        assert_eq!(curs.as_cursor().value(), Some(&21));
        assert_eq!(tree.get(&2), Some(&21));
    }
}
