//! DFT CUDA kernel launchers
//!
//! Provides launchers for the direct-DFT kernels compiled from `dft.cu`.
//! All kernels run one thread per output bin on interleaved float2 data.

use cudarc::driver::PushKernelArg;
use cudarc::driver::safe::{CudaContext, CudaStream};
use std::sync::Arc;

use super::loader::{
    BLOCK_SIZE, get_kernel_function, get_or_load_module, launch_config, per_bin_launch_config,
};
use crate::error::{Error, Result};

/// DFT module name
pub const DFT_MODULE: &str = "dft";

/// Launch the full direct DFT: one thread per output bin
///
/// Thread `k` evaluates the complete sum over all `num` input samples in
/// ascending `n` and writes `out[k]` once. No thread reads another thread's
/// output.
///
/// # Safety
///
/// - `input_ptr` and `output_ptr` must be valid device memory holding at
///   least `num` float2 elements each
pub unsafe fn launch_dft_full(
    context: &Arc<CudaContext>,
    stream: &CudaStream,
    device_index: usize,
    input_ptr: u64,
    output_ptr: u64,
    num: usize,
) -> Result<()> {
    let module = get_or_load_module(context, device_index, DFT_MODULE)?;
    let func = get_kernel_function(&module, "dft_full_c64")?;

    let grid = per_bin_launch_config(num);
    let block = (BLOCK_SIZE, 1, 1);
    let cfg = launch_config(grid, block, 0);

    let mut builder = stream.launch_builder(&func);

    let num_u32 = num as u32;

    builder.arg(&input_ptr);
    builder.arg(&output_ptr);
    builder.arg(&num_u32);

    unsafe {
        builder
            .launch(cfg)
            .map_err(|e| Error::Backend(format!("CUDA DFT kernel launch failed: {:?}", e)))?;
    }

    Ok(())
}

/// Launch one staged accumulation pass: one thread per output bin
///
/// Thread `k` sums the chunk's contribution (input indices
/// `[start, start + len)`) in ascending `n` and adds it into `acc[k]`.
/// Each thread owns exactly one accumulator slot, so passes need no atomics;
/// ordering between passes comes from issuing them on one stream.
///
/// # Safety
///
/// - `chunk_ptr` must be valid device memory holding at least `len` float2
///   elements
/// - `acc_ptr` must be valid device memory holding at least `num` float2
///   elements
/// - `start + len` must not exceed `num`
pub unsafe fn launch_dft_partial(
    context: &Arc<CudaContext>,
    stream: &CudaStream,
    device_index: usize,
    chunk_ptr: u64,
    acc_ptr: u64,
    num: usize,
    start: usize,
    len: usize,
) -> Result<()> {
    let module = get_or_load_module(context, device_index, DFT_MODULE)?;
    let func = get_kernel_function(&module, "dft_partial_c64")?;

    let grid = per_bin_launch_config(num);
    let block = (BLOCK_SIZE, 1, 1);
    let cfg = launch_config(grid, block, 0);

    let mut builder = stream.launch_builder(&func);

    let num_u32 = num as u32;
    let start_u32 = start as u32;
    let len_u32 = len as u32;

    builder.arg(&chunk_ptr);
    builder.arg(&acc_ptr);
    builder.arg(&num_u32);
    builder.arg(&start_u32);
    builder.arg(&len_u32);

    unsafe {
        builder
            .launch(cfg)
            .map_err(|e| Error::Backend(format!("CUDA DFT chunk kernel launch failed: {:?}", e)))?;
    }

    Ok(())
}

/// Launch zero-fill for a complex device buffer
///
/// Initializes the staged engine's accumulator before the first pass.
///
/// # Safety
///
/// - `data_ptr` must be valid device memory holding at least `num` float2
///   elements
pub unsafe fn launch_fill_zero(
    context: &Arc<CudaContext>,
    stream: &CudaStream,
    device_index: usize,
    data_ptr: u64,
    num: usize,
) -> Result<()> {
    let module = get_or_load_module(context, device_index, DFT_MODULE)?;
    let func = get_kernel_function(&module, "fill_zero_c64")?;

    let grid = per_bin_launch_config(num);
    let block = (BLOCK_SIZE, 1, 1);
    let cfg = launch_config(grid, block, 0);

    let mut builder = stream.launch_builder(&func);

    let num_u32 = num as u32;

    builder.arg(&data_ptr);
    builder.arg(&num_u32);

    unsafe {
        builder
            .launch(cfg)
            .map_err(|e| Error::Backend(format!("CUDA fill kernel launch failed: {:?}", e)))?;
    }

    Ok(())
}
