//! Pluggable node allocation.
//!
//! Every node of an [`AvlTree`](crate::AvlTree) is obtained from, and returned to, a
//! [`NodeAllocator`]. [`Global`] forwards to the global heap; [`Counting`] wraps another strategy
//! and keeps track of how many blocks are live.

use core::{alloc::Layout, cell::Cell, ptr::NonNull};

use crate::AllocError;

/// A strategy for allocating and freeing tree nodes.
///
/// # Safety
///
/// Implementors must guarantee that a block returned by [`allocate`](Self::allocate) is valid for
/// reads and writes of `layout.size()` bytes, is aligned to `layout.align()`, and stays valid until
/// it is passed to [`deallocate`](Self::deallocate).
pub unsafe trait NodeAllocator {
    /// Allocates a block of memory described by `layout`.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Frees a block previously returned by [`allocate`](Self::allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `self.allocate(layout)` with the same `layout`, and must
    /// not have been freed already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Returns the maximum number of blocks of `layout` this strategy could ever hand out.
    fn max_size(&self, layout: Layout) -> usize {
        let size = layout.pad_to_align().size().max(1);
        isize::MAX as usize / size
    }
}

unsafe impl<A: NodeAllocator + ?Sized> NodeAllocator for &A {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        (**self).allocate(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { (**self).deallocate(ptr, layout) }
    }

    #[inline]
    fn max_size(&self, layout: Layout) -> usize {
        (**self).max_size(layout)
    }
}

/// The global heap.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Global;

unsafe impl NodeAllocator for Global {
    #[inline]
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        debug_assert_ne!(layout.size(), 0, "nodes are never zero-sized");

        // SAFETY: `layout` has a non-zero size.
        let ptr = unsafe { alloc::alloc::alloc(layout) };
        NonNull::new(ptr).ok_or(AllocError::new(layout))
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { alloc::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// An allocation strategy that counts the blocks handed out by another strategy.
///
/// ```
/// use avl_map::{AvlMap, Counting, Natural};
///
/// let counting: Counting = Counting::default();
/// let mut map = AvlMap::with_comparator_in(Natural, &counting);
///
/// map.insert(1, "one");
/// map.insert(2, "two");
/// assert_eq!(counting.live(), 2);
///
/// drop(map);
/// assert_eq!(counting.live(), 0);
/// ```
#[derive(Debug, Default)]
pub struct Counting<A = Global> {
    inner: A,
    allocations: Cell<usize>,
    deallocations: Cell<usize>,
}

impl<A> Counting<A> {
    /// Wraps `inner`, starting both counters at zero.
    pub const fn new(inner: A) -> Counting<A> {
        Counting {
            inner,
            allocations: Cell::new(0),
            deallocations: Cell::new(0),
        }
    }

    /// Returns the number of successful allocations.
    pub fn allocations(&self) -> usize {
        self.allocations.get()
    }

    /// Returns the number of deallocations.
    pub fn deallocations(&self) -> usize {
        self.deallocations.get()
    }

    /// Returns the number of blocks currently allocated.
    pub fn live(&self) -> usize {
        self.allocations() - self.deallocations()
    }
}

unsafe impl<A: NodeAllocator> NodeAllocator for Counting<A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let ptr = self.inner.allocate(layout)?;
        self.allocations.set(self.allocations.get() + 1);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        debug_assert!(self.live() > 0, "more frees than allocations");

        self.deallocations.set(self.deallocations.get() + 1);
        unsafe { self.inner.deallocate(ptr, layout) }
    }

    fn max_size(&self, layout: Layout) -> usize {
        self.inner.max_size(layout)
    }
}

// Allocates a block for `value` and moves it in.
pub(crate) fn construct<T, A>(alloc: &A, value: T) -> Result<NonNull<T>, AllocError>
where
    A: NodeAllocator + ?Sized,
{
    let ptr = alloc.allocate(Layout::new::<T>())?.cast::<T>();

    // SAFETY: the block fits `T` by the `NodeAllocator` contract.
    unsafe { ptr.as_ptr().write(value) };

    Ok(ptr)
}

// Moves the value out of `ptr` and frees its block.
//
// # Safety
//
// `ptr` must have come from `construct` with the same allocator and must not be used again.
pub(crate) unsafe fn destroy<T, A>(alloc: &A, ptr: NonNull<T>) -> T
where
    A: NodeAllocator + ?Sized,
{
    unsafe {
        let value = ptr.as_ptr().read();
        alloc.deallocate(ptr.cast(), Layout::new::<T>());
        value
    }
}
