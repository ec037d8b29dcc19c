//! CUDA Client implementation
//!
//! CudaClient owns stream and context for direct cudarc access.
//!
//! # Thread Safety
//!
//! `CudaClient` is `Clone` and can be shared across threads. The underlying
//! CUDA context and stream are reference-counted via `Arc`. However, CUDA
//! operations must be performed on the thread that owns the context or after
//! calling `context.bind_to_thread()`.

use cudarc::driver::safe::{CudaContext, CudaStream};
use std::sync::Arc;

use super::CudaRuntime;
use super::device::{CudaDevice, CudaError};
use crate::error::{Error, Result};
use crate::runtime::{Allocator, RuntimeClient};

/// Check if the CUDA context on the current thread is valid.
///
/// # Safety
///
/// This function calls CUDA driver API directly.
#[inline]
pub(crate) unsafe fn is_cuda_context_valid() -> bool {
    let mut ctx: cudarc::driver::sys::CUcontext = std::ptr::null_mut();
    // SAFETY: cuCtxGetCurrent is safe to call at any time and writes to the provided pointer.
    let result = unsafe { cudarc::driver::sys::cuCtxGetCurrent(&mut ctx) };
    result == cudarc::driver::sys::CUresult::CUDA_SUCCESS && !ctx.is_null()
}

/// Log a CUDA memory operation failure.
#[cold]
#[inline(never)]
pub(crate) fn log_cuda_memory_error(
    operation: &str,
    ptr: u64,
    result: cudarc::driver::sys::CUresult,
) {
    eprintln!(
        "[dftr::cuda] {} failed for ptr 0x{:x}: {:?}",
        operation, ptr, result
    );
}

// ============================================================================
// CudaClient
// ============================================================================

/// CUDA Runtime Client
///
/// Owns CUDA context and stream for direct kernel launches.
///
/// # Stream Ownership
///
/// All engine work MUST launch on `self.stream()`: operations on one stream
/// execute in issue order, which is what sequences the staged engine's chunk
/// passes — pass `c+1`'s accumulator reads cannot overtake pass `c`'s writes.
#[derive(Clone)]
pub struct CudaClient {
    /// GPU device index
    pub(crate) device: CudaDevice,

    /// CUDA context for this device (owns GPU context)
    pub(crate) context: Arc<CudaContext>,

    /// Stream on which all kernels launch
    pub(crate) stream: Arc<CudaStream>,

    /// Allocator for memory management
    pub(crate) allocator: CudaAllocator,
}

impl std::fmt::Debug for CudaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CudaClient")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl CudaClient {
    /// Create a new CUDA client for a device.
    ///
    /// This initializes the CUDA context and creates a stream.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - CUDA context creation fails (e.g., invalid device ID)
    /// - Stream creation fails
    pub fn new(device: CudaDevice) -> std::result::Result<Self, CudaError> {
        // Create CUDA context for this device
        let context = CudaContext::new(device.index).map_err(|e| {
            CudaError::ContextError(format!(
                "Failed to create CUDA context for device {}: {:?}",
                device.index, e
            ))
        })?;

        // Bind context to current thread
        context.bind_to_thread().map_err(|e| {
            CudaError::ContextError(format!("Failed to bind CUDA context to thread: {:?}", e))
        })?;

        // Create a stream in this context
        let stream = context.new_stream().map_err(|e| {
            CudaError::ContextError(format!("Failed to create CUDA stream: {:?}", e))
        })?;

        let allocator = CudaAllocator {
            stream: stream.clone(),
        };

        Ok(Self {
            device,
            context,
            stream,
            allocator,
        })
    }

    /// Get reference to the CUDA stream.
    #[inline]
    pub fn stream(&self) -> &CudaStream {
        &self.stream
    }

    /// Get reference to the CUDA context.
    #[inline]
    pub fn context(&self) -> &Arc<CudaContext> {
        &self.context
    }
}

impl RuntimeClient<CudaRuntime> for CudaClient {
    fn device(&self) -> &CudaDevice {
        &self.device
    }

    fn synchronize(&self) {
        if let Err(e) = self.stream.synchronize() {
            eprintln!("[dftr::cuda] Stream synchronization failed: {:?}", e);
        }
    }

    fn allocator(&self) -> &CudaAllocator {
        &self.allocator
    }
}

// ============================================================================
// CudaAllocator
// ============================================================================

/// CUDA allocator that uses stream-ordered allocation.
///
/// This allocator uses `cuMemAllocAsync` and `cuMemFreeAsync` for efficient
/// stream-ordered memory management: a buffer freed after a kernel launch on
/// the same stream is only reclaimed once the kernel has consumed it, which
/// is what lets the staged engine drop each chunk buffer immediately after
/// issuing its accumulation pass.
#[derive(Clone)]
pub struct CudaAllocator {
    stream: Arc<CudaStream>,
}

impl Allocator for CudaAllocator {
    /// Allocate GPU memory using stream-ordered allocation.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if the device cannot satisfy the request.
    fn allocate(&self, size_bytes: usize) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        unsafe {
            let mut ptr: u64 = 0;
            let result =
                cudarc::driver::sys::cuMemAllocAsync(&mut ptr, size_bytes, self.stream.cu_stream());

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

    fn deallocate(&self, ptr: u64, _size_bytes: usize) {
        if ptr == 0 {
            return;
        }

        unsafe {
            // Check if CUDA context is still valid before attempting free
            if !is_cuda_context_valid() {
                // Context is gone - memory will be reclaimed by driver
                return;
            }

            let result = cudarc::driver::sys::cuMemFreeAsync(ptr, self.stream.cu_stream());

            // Log failures but don't raise - deallocation errors are typically benign
            if result != cudarc::driver::sys::CUresult::CUDA_SUCCESS
                && result != cudarc::driver::sys::CUresult::CUDA_ERROR_ILLEGAL_ADDRESS
            {
                log_cuda_memory_error("cuMemFreeAsync", ptr, result);
            }
        }
    }
}
