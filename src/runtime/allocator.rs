//! Memory allocator trait, default implementation, and RAII guard

use crate::error::Result;

/// Memory allocator trait for runtime backends
pub trait Allocator: Clone + Send + Sync {
    /// Allocate memory of given size
    ///
    /// Returns a device pointer (u64) that can be used for operations.
    /// Zero-sized allocations return the null handle 0.
    fn allocate(&self, size_bytes: usize) -> Result<u64>;

    /// Deallocate memory
    fn deallocate(&self, ptr: u64, size_bytes: usize);
}

/// Default allocator that delegates to function pointers
///
/// This is a simple allocator that just calls the runtime's
/// allocate/deallocate for the device it was built with.
#[derive(Clone, Debug)]
pub struct DefaultAllocator<D> {
    device: D,
    allocate_fn: fn(usize, &D) -> Result<u64>,
    deallocate_fn: fn(u64, usize, &D),
}

impl<D: Clone + Send + Sync> DefaultAllocator<D> {
    /// Create a new default allocator
    pub fn new(
        device: D,
        allocate_fn: fn(usize, &D) -> Result<u64>,
        deallocate_fn: fn(u64, usize, &D),
    ) -> Self {
        Self {
            device,
            allocate_fn,
            deallocate_fn,
        }
    }

    /// Get the device this allocator is associated with
    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: Clone + Send + Sync> Allocator for DefaultAllocator<D> {
    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        (self.allocate_fn)(size_bytes, &self.device)
    }

    fn deallocate(&self, ptr: u64, size_bytes: usize) {
        (self.deallocate_fn)(ptr, size_bytes, &self.device)
    }
}

/// RAII guard for a device allocation
///
/// Holds one buffer for the duration of an engine call and frees it on every
/// exit path, success or error. The staged engine leans on this: each chunk
/// buffer is guarded per pass, so an error mid-loop releases the chunk and
/// the accumulator before propagating, and no device memory leaks.
pub struct AllocGuard<'a, A: Allocator> {
    allocator: &'a A,
    ptr: u64,
    size_bytes: usize,
}

impl<'a, A: Allocator> AllocGuard<'a, A> {
    /// Allocate `size_bytes` and guard the result
    ///
    /// # Errors
    ///
    /// Propagates the allocator's `OutOfMemory`/`Backend` error; nothing is
    /// held on failure.
    pub fn new(allocator: &'a A, size_bytes: usize) -> Result<Self> {
        let ptr = allocator.allocate(size_bytes)?;
        Ok(Self {
            allocator,
            ptr,
            size_bytes,
        })
    }

    /// Device pointer of the guarded buffer
    #[inline]
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Size of the guarded buffer in bytes
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

impl<A: Allocator> Drop for AllocGuard<'_, A> {
    fn drop(&mut self) {
        self.allocator.deallocate(self.ptr, self.size_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allocator_trait_bounds() {
        fn assert_allocator<A: Allocator>() {}
        assert_allocator::<DefaultAllocator<()>>();
    }
}
