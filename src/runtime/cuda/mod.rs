//! CUDA runtime implementation
//!
//! This module provides GPU acceleration via NVIDIA CUDA using cudarc.
//!
//! # Features
//!
//! - `CudaDevice` - Represents a CUDA GPU device
//! - `CudaClient` - Manages GPU stream and context, launches kernels
//! - `CudaRuntime` - Implements the generic Runtime trait
//! - `DftAlgorithms` - The parallel and staged DFT engines
//!
//! # Error Policy
//!
//! Allocation and transfer failures are surfaced as `Result` errors, not
//! panics: a DFT call that cannot complete must report failure to the caller
//! without leaving a half-written output behind.

mod client;
mod device;
mod dft;
mod kernels;

pub use client::{CudaAllocator, CudaClient};
pub use device::{CudaDevice, CudaError};

use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

// ============================================================================
// Internal Helpers
// ============================================================================

/// Global client cache: device index -> cached CudaClient
///
/// This caches CudaClient instances per device to avoid creating new
/// CUDA contexts and streams on every operation.
static CLIENT_CACHE: OnceLock<Mutex<HashMap<usize, CudaClient>>> = OnceLock::new();

/// Safely lock the client cache, recovering from poisoned mutex.
///
/// If the mutex is poisoned (a thread panicked while holding the lock),
/// we recover the guard since our cache operations are idempotent.
#[inline]
fn lock_client_cache(
    cache: &Mutex<HashMap<usize, CudaClient>>,
) -> MutexGuard<'_, HashMap<usize, CudaClient>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Get or create a cached CudaClient for a device.
fn get_or_create_client(device: &CudaDevice) -> CudaClient {
    let cache = CLIENT_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut cache_guard = lock_client_cache(cache);

    if let Some(client) = cache_guard.get(&device.index) {
        return client.clone();
    }

    // Create new client and cache it
    let client = CudaClient::new(device.clone()).expect("Failed to create CUDA client");
    cache_guard.insert(device.index, client.clone());

    client
}

// ============================================================================
// Runtime Implementation
// ============================================================================

/// CUDA Runtime adapter
///
/// Implements the generic Runtime trait for CUDA backend.
/// Uses cudarc for direct GPU control.
#[derive(Clone, Debug, Default)]
pub struct CudaRuntime;

impl Runtime for CudaRuntime {
    type Device = CudaDevice;
    type Client = CudaClient;
    type Allocator = CudaAllocator;

    fn name() -> &'static str {
        "cuda"
    }

    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let client = get_or_create_client(device);

        unsafe {
            let mut ptr: u64 = 0;
            let result = cudarc::driver::sys::cuMemAllocAsync(
                &mut ptr,
                size_bytes,
                client.stream.cu_stream(),
            );

            if result != cudarc::driver::sys::CUresult::CUDA_SUCCESS {
                let available = cudarc::driver::result::mem_get_info()
                    .map(|(free, _)| free)
                    .unwrap_or(0);
                return Err(Error::OutOfMemory {
                    required: size_bytes,
                    available,
                });
            }

            Ok(ptr)
        }
    }

    fn deallocate(ptr: u64, _size_bytes: usize, device: &Self::Device) {
        if ptr == 0 {
            return;
        }

        unsafe {
            // Check if CUDA context is still valid before attempting free
            if !client::is_cuda_context_valid() {
                // Context is gone - memory will be reclaimed by driver on context destruction
                return;
            }

            let result = if let Some(stream) = try_get_cached_stream(device.index) {
                cudarc::driver::sys::cuMemFreeAsync(ptr, stream)
            } else {
                // Fallback to synchronous free
                cudarc::driver::sys::cuMemFree_v2(ptr)
            };

            if result != cudarc::driver::sys::CUresult::CUDA_SUCCESS
                && result != cudarc::driver::sys::CUresult::CUDA_ERROR_ILLEGAL_ADDRESS
            {
                client::log_cuda_memory_error("cuMemFree", ptr, result);
            }
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()> {
        if src.is_empty() || dst == 0 {
            return Ok(());
        }

        let client = get_or_create_client(device);

        unsafe {
            let result = cudarc::driver::sys::cuMemcpyHtoDAsync_v2(
                dst,
                src.as_ptr() as *const std::ffi::c_void,
                src.len(),
                client.stream.cu_stream(),
            );

            if result != cudarc::driver::sys::CUresult::CUDA_SUCCESS {
                return Err(Error::Backend(format!(
                    "Host-to-device copy failed: {} bytes ({:?})",
                    src.len(),
                    result
                )));
            }
        }

        // Synchronize to ensure data is resident before the host proceeds
        client
            .stream
            .synchronize()
            .map_err(|e| Error::Backend(format!("Stream sync after HtoD failed: {:?}", e)))?;

        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()> {
        if dst.is_empty() || src == 0 {
            return Ok(());
        }

        let client = get_or_create_client(device);

        unsafe {
            let result = cudarc::driver::sys::cuMemcpyDtoHAsync_v2(
                dst.as_mut_ptr() as *mut std::ffi::c_void,
                src,
                dst.len(),
                client.stream.cu_stream(),
            );

            if result != cudarc::driver::sys::CUresult::CUDA_SUCCESS {
                return Err(Error::Backend(format!(
                    "Device-to-host copy failed: {} bytes ({:?})",
                    dst.len(),
                    result
                )));
            }
        }

        // Synchronize to ensure data is readable on the host
        client
            .stream
            .synchronize()
            .map_err(|e| Error::Backend(format!("Stream sync after DtoH failed: {:?}", e)))?;

        Ok(())
    }

    fn default_device() -> Self::Device {
        CudaDevice::new(0)
    }

    fn default_client(device: &Self::Device) -> Self::Client {
        get_or_create_client(device)
    }
}

/// Try to get the stream from a cached client for a device.
///
/// Returns `None` if no client is cached.
#[inline]
fn try_get_cached_stream(device_index: usize) -> Option<cudarc::driver::sys::CUstream> {
    let cache = CLIENT_CACHE.get()?;
    let guard = lock_client_cache(cache);
    guard
        .get(&device_index)
        .map(|client| client.stream.cu_stream())
}

// ============================================================================
// Public API
// ============================================================================

/// Get the default CUDA device (device 0)
pub fn cuda_device() -> CudaDevice {
    CudaDevice::new(0)
}

/// Get a specific CUDA device by ID
pub fn cuda_device_id(device_id: usize) -> CudaDevice {
    CudaDevice::new(device_id)
}

/// Check whether a usable CUDA device is present
///
/// Probes by creating (or fetching) the device-0 client; any failure, panic
/// included, reads as "not available". Test suites use this to skip GPU
/// cases on machines without a GPU.
pub fn is_cuda_available() -> bool {
    std::panic::catch_unwind(|| {
        let device = CudaDevice::new(0);
        let _client = get_or_create_client(&device);
    })
    .is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Device, RuntimeClient};

    #[test]
    fn test_cuda_device_creation() {
        let device = CudaDevice::new(0);
        assert_eq!(device.id(), 0);
        assert_eq!(device.name(), "cuda:0");
    }

    #[test]
    fn test_cuda_allocate_deallocate() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let ptr = CudaRuntime::allocate(1024, &device).unwrap();
        assert_ne!(ptr, 0);
        CudaRuntime::deallocate(ptr, 1024, &device);
    }

    #[test]
    fn test_cuda_copy_roundtrip() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let data: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8];

        let ptr = CudaRuntime::allocate(data.len(), &device).unwrap();
        CudaRuntime::copy_to_device(&data, ptr, &device).unwrap();

        let mut result = vec![0u8; data.len()];
        CudaRuntime::copy_from_device(ptr, &mut result, &device).unwrap();

        assert_eq!(data, result);

        CudaRuntime::deallocate(ptr, data.len(), &device);
    }

    #[test]
    fn test_cuda_client_creation() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let client = CudaRuntime::default_client(&device);
        assert_eq!(client.device().id(), 0);
    }

    #[test]
    fn test_cuda_compute_capability() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let _client = CudaRuntime::default_client(&device);
        let (major, minor) = device
            .compute_capability()
            .expect("Failed to get compute capability");
        // Any modern GPU should be at least Maxwell (5.x) or newer
        assert!(
            major >= 5,
            "Expected compute capability >= 5.0, got {}.{}",
            major,
            minor
        );
    }

    #[test]
    fn test_cuda_memory_info() {
        if !is_cuda_available() {
            return;
        }
        let device = CudaDevice::new(0);
        let client = CudaRuntime::default_client(&device);
        client
            .context
            .bind_to_thread()
            .expect("Failed to bind context");
        let (free, total) = device.memory_info().expect("Failed to get memory info");
        assert!(total > 0, "Total GPU memory should be > 0");
        assert!(free <= total, "Free memory should be <= total memory");
    }
}
