//! CPU runtime implementation

use super::client::{CpuAllocator, CpuClient};
use super::device::CpuDevice;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};

/// CPU compute runtime
///
/// This is the default runtime that works on any platform.
/// Memory is allocated on the heap using the system allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

impl Runtime for CpuRuntime {
    type Device = CpuDevice;
    type Client = CpuClient;
    type Allocator = CpuAllocator;

    fn name() -> &'static str {
        "cpu"
    }

    fn allocate(size_bytes: usize, _device: &Self::Device) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        // Use aligned allocation for SIMD compatibility
        let align = 64; // AVX-512 alignment
        let layout = AllocLayout::from_size_align(size_bytes, align)
            .map_err(|e| Error::Internal(format!("Invalid allocation layout: {}", e)))?;

        let ptr = unsafe { alloc_zeroed(layout) };

        if ptr.is_null() {
            return Err(Error::OutOfMemory {
                required: size_bytes,
                available: 0,
            });
        }

        Ok(ptr as u64)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Self::Device) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        let align = 64;
        let layout =
            AllocLayout::from_size_align(size_bytes, align).expect("Invalid allocation layout");

        unsafe {
            dealloc(ptr as *mut u8, layout);
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Self::Device) -> Result<()> {
        if src.is_empty() || dst == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Self::Device) -> Result<()> {
        if dst.is_empty() || src == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    fn default_device() -> Self::Device {
        CpuDevice::new()
    }

    fn default_client(device: &Self::Device) -> Self::Client {
        CpuClient::new(device.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_allocate_deallocate() {
        let device = CpuDevice::new();
        let ptr = CpuRuntime::allocate(1024, &device).unwrap();
        assert_ne!(ptr, 0);
        CpuRuntime::deallocate(ptr, 1024, &device);
    }

    #[test]
    fn test_cpu_zero_sized_allocation() {
        let device = CpuDevice::new();
        let ptr = CpuRuntime::allocate(0, &device).unwrap();
        assert_eq!(ptr, 0);
        CpuRuntime::deallocate(ptr, 0, &device);
    }

    #[test]
    fn test_cpu_copy_roundtrip() {
        let device = CpuDevice::new();
        let data: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8];

        let ptr = CpuRuntime::allocate(data.len(), &device).unwrap();
        CpuRuntime::copy_to_device(&data, ptr, &device).unwrap();

        let mut result = vec![0u8; data.len()];
        CpuRuntime::copy_from_device(ptr, &mut result, &device).unwrap();

        assert_eq!(data, result);

        CpuRuntime::deallocate(ptr, data.len(), &device);
    }
}
