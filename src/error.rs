use core::{alloc::Layout, fmt};

/// The error returned when a [`NodeAllocator`](crate::NodeAllocator) cannot satisfy a request.
///
/// The tree never retries a failed allocation, and a failed insertion leaves the tree exactly as
/// it was.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct AllocError {
    layout: Layout,
}

impl AllocError {
    /// Creates an error for a failed request of `layout`.
    pub const fn new(layout: Layout) -> AllocError {
        AllocError { layout }
    }

    /// Returns the layout of the allocation that failed.
    pub const fn layout(&self) -> Layout {
        self.layout
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to allocate {} bytes (align {})",
            self.layout.size(),
            self.layout.align()
        )
    }
}

impl core::error::Error for AllocError {}

/// The error returned by bounds-checked access when the key is not present.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct OutOfRange;

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("key not found in map")
    }
}

impl core::error::Error for OutOfRange {}
