use core::{fmt, mem, ptr::NonNull};

use crate::{
    key, value, value_mut, AllocError, AvlTree, Comparator, InsertAs, Node, NodeAllocator, Search,
};

/// A view into a single entry in an [`AvlTree`] or [`AvlMap`](crate::AvlMap), which may be either
/// vacant or occupied.
pub enum Entry<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    Vacant(VacantEntry<'tree, K, V, C, A>),
    Occupied(OccupiedEntry<'tree, K, V, C, A>),
}

impl<K, V, C, A> AvlTree<K, V, C, A>
where
    C: Comparator<K>,
    A: NodeAllocator,
{
    /// Gets the entry for `key` for in-place access or insertion.
    ///
    /// This operation completes in _O(log(n))_ time.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C, A> {
        match self.search(&key) {
            Search::Found(node) => Entry::Occupied(OccupiedEntry { tree: self, node }),
            Search::Vacant(insert_as) => Entry::Vacant(VacantEntry {
                tree: self,
                key,
                insert_as,
            }),
        }
    }
}

impl<'tree, K, V, C, A> Entry<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    /// Returns the key of this entry.
    pub fn key(&self) -> &K {
        match self {
            Entry::Vacant(vacant) => vacant.key(),
            Entry::Occupied(occupied) => occupied.key(),
        }
    }

    /// Inserts `default` if the entry is vacant, then returns the value.
    pub fn or_insert(self, default: V) -> &'tree mut V {
        match self {
            Entry::Vacant(vacant) => vacant.insert(default),
            Entry::Occupied(occupied) => occupied.into_mut(),
        }
    }

    /// Inserts the result of `default` if the entry is vacant, then returns the value.
    pub fn or_insert_with<F>(self, default: F) -> &'tree mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Vacant(vacant) => vacant.insert(default()),
            Entry::Occupied(occupied) => occupied.into_mut(),
        }
    }

    /// Inserts the result of calling `default` with the key if the entry is vacant, then returns
    /// the value.
    pub fn or_insert_with_key<F>(self, default: F) -> &'tree mut V
    where
        F: FnOnce(&K) -> V,
    {
        match self {
            Entry::Vacant(vacant) => {
                let value = default(vacant.key());
                vacant.insert(value)
            }
            Entry::Occupied(occupied) => occupied.into_mut(),
        }
    }

    /// Calls `f` on the value if the entry is occupied.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Vacant(vacant) => Entry::Vacant(vacant),
            Entry::Occupied(mut occupied) => {
                f(occupied.get_mut());
                Entry::Occupied(occupied)
            }
        }
    }
}

impl<'tree, K, V, C, A> Entry<'tree, K, V, C, A>
where
    V: Default,
    A: NodeAllocator,
{
    /// Inserts `V::default()` if the entry is vacant, then returns the value.
    pub fn or_default(self) -> &'tree mut V {
        self.or_insert_with(V::default)
    }
}

impl<K, V, C, A> fmt::Debug for Entry<'_, K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Vacant(vacant) => f.debug_tuple("Entry").field(vacant).finish(),
            Entry::Occupied(occupied) => f.debug_tuple("Entry").field(occupied).finish(),
        }
    }
}

/// A vacant entry: the key is not in the tree, and the position it would occupy is known.
pub struct VacantEntry<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    tree: &'tree mut AvlTree<K, V, C, A>,
    key: K,
    insert_as: InsertAs<K, V>,
}

impl<'tree, K, V, C, A> VacantEntry<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    /// Returns the key that would be used when inserting.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Takes ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts `value` at the key associated with this entry.
    ///
    /// # Panics
    ///
    /// Allocation failure is reported through [`handle_alloc_error`].
    ///
    /// [`handle_alloc_error`]: alloc::alloc::handle_alloc_error
    pub fn insert(self, value: V) -> &'tree mut V {
        let node = self.tree.insert_at(self.insert_as, self.key, value);

        // SAFETY: `self.tree` is mutably borrowed for `'tree`.
        unsafe { value_mut(node) }
    }

    /// Inserts `value` at the key associated with this entry, returning an error instead of
    /// escalating allocation failure. The tree is unchanged if this fails.
    pub fn try_insert(self, value: V) -> Result<&'tree mut V, AllocError> {
        let node = self.tree.try_insert_at(self.insert_as, self.key, value)?;

        // SAFETY: `self.tree` is mutably borrowed for `'tree`.
        Ok(unsafe { value_mut(node) })
    }
}

impl<K, V, C, A> fmt::Debug for VacantEntry<'_, K, V, C, A>
where
    K: fmt::Debug,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(self.key()).finish()
    }
}

/// An occupied entry: the key is in the tree.
pub struct OccupiedEntry<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    tree: &'tree mut AvlTree<K, V, C, A>,
    node: NonNull<Node<K, V>>,
}

impl<'tree, K, V, C, A> OccupiedEntry<'tree, K, V, C, A>
where
    A: NodeAllocator,
{
    /// Returns the key stored in the tree.
    pub fn key(&self) -> &K {
        unsafe { key(self.node) }
    }

    /// Returns a reference to the value in the entry.
    pub fn get(&self) -> &V {
        unsafe { value(self.node) }
    }

    /// Returns a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        unsafe { value_mut(self.node) }
    }

    /// Converts the entry into a mutable reference to its value.
    pub fn into_mut(self) -> &'tree mut V {
        // SAFETY: `self.tree` is mutably borrowed for `'tree`.
        unsafe { value_mut(self.node) }
    }

    /// Replaces the value in the entry, returning the previous value.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Removes the entry from the tree, returning the stored key and value.
    pub fn remove_entry(self) -> (K, V) {
        unsafe { self.tree.remove_at(self.node) }
    }

    /// Removes the entry from the tree, returning its value.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }
}

impl<K, V, C, A> fmt::Debug for OccupiedEntry<'_, K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: NodeAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .finish()
    }
}
