//! CUDA implementation of the DFT engines
//!
//! Implements the [`DftAlgorithms`] trait for [`CudaClient`]: the single-pass
//! parallel engine and the memory-staged engine. Both launch the same
//! per-bin accumulation logic (`dft.cu`); they differ only in how much of
//! the input is device-resident at once.

use super::CudaRuntime;
use super::client::CudaClient;
use super::kernels;
use crate::algorithm::dft::{ChunkPlan, DftAlgorithms, plan_chunks, validate_dft_buffers};
use crate::dtype::Complex64;
use crate::error::{Error, Result};
use crate::runtime::{AllocGuard, Runtime, RuntimeClient};

const SAMPLE_BYTES: usize = std::mem::size_of::<Complex64>();

/// Fraction of free device memory the engines budget against
///
/// Headroom absorbs allocator metadata and stream-ordered pool granularity,
/// so a plan that fits the budget also fits the device.
const BUDGET_HEADROOM_NUM: usize = 4;
const BUDGET_HEADROOM_DEN: usize = 5;

impl DftAlgorithms<CudaRuntime> for CudaClient {
    /// Single-pass parallel engine: whole input resident on the device
    fn dft(&self, input: &[Complex64], output: &mut [Complex64]) -> Result<()> {
        validate_dft_buffers(input.len(), output.len())?;
        let num = input.len();
        if num == 0 {
            return Ok(());
        }

        // Input and output live on the device simultaneously. Reject before
        // allocating anything if they cannot, pointing callers at the staged
        // engine instead of failing mid-transfer.
        let seq_bytes = num * SAMPLE_BYTES;
        let required = 2 * seq_bytes;
        let budget = self.memory_budget()?;
        if required > budget {
            return Err(Error::OutOfMemory {
                required,
                available: budget,
            });
        }

        let input_guard = AllocGuard::new(self.allocator(), seq_bytes)?;
        let output_guard = AllocGuard::new(self.allocator(), seq_bytes)?;

        CudaRuntime::copy_to_device(bytemuck::cast_slice(input), input_guard.ptr(), &self.device)?;

        // One worker per bin; worker k runs the full inner sum independently
        unsafe {
            kernels::launch_dft_full(
                self.context(),
                self.stream(),
                self.device.index,
                input_guard.ptr(),
                output_guard.ptr(),
                num,
            )?;
        }

        // DtoH on the same stream is ordered after the kernel and
        // synchronizes before returning, so output is complete here
        CudaRuntime::copy_from_device(
            output_guard.ptr(),
            bytemuck::cast_slice_mut(output),
            &self.device,
        )?;

        Ok(())
    }

    /// Staged parallel engine: bounded device memory, identical results
    fn dft_staged(&self, input: &[Complex64], output: &mut [Complex64]) -> Result<()> {
        validate_dft_buffers(input.len(), output.len())?;
        if input.is_empty() {
            return Ok(());
        }

        let plan = plan_chunks(input.len(), self.memory_budget()?)?;
        self.run_staged(input, output, &plan)
    }
}

impl CudaClient {
    /// Staged transform against an explicit byte budget
    ///
    /// Same contract as [`DftAlgorithms::dft_staged`], but chunks are planned
    /// against `budget_bytes` instead of measured free memory. Lets callers
    /// cap the engine's device footprint below what the device could hold —
    /// and lets tests exercise many-pass staging on any GPU.
    pub fn dft_staged_with_budget(
        &self,
        input: &[Complex64],
        output: &mut [Complex64],
        budget_bytes: usize,
    ) -> Result<()> {
        validate_dft_buffers(input.len(), output.len())?;
        if input.is_empty() {
            return Ok(());
        }

        let plan = plan_chunks(input.len(), budget_bytes)?;
        self.run_staged(input, output, &plan)
    }

    /// Staged transform with a forced chunk length
    ///
    /// Bypasses the planner. The result must not depend on the chunking —
    /// the chunk-count independence tests call this with chunk lengths from
    /// 1 to `num` and compare.
    pub fn dft_staged_with_chunk_len(
        &self,
        input: &[Complex64],
        output: &mut [Complex64],
        chunk_len: usize,
    ) -> Result<()> {
        validate_dft_buffers(input.len(), output.len())?;
        if input.is_empty() {
            return Ok(());
        }

        let plan = ChunkPlan::with_chunk_len(input.len(), chunk_len)?;
        self.run_staged(input, output, &plan)
    }

    /// Memory budget for engine working sets, measured from the device
    fn memory_budget(&self) -> Result<usize> {
        let free = self
            .device
            .available_memory()
            .map_err(|e| Error::Backend(e.to_string()))? as usize;
        Ok(free / BUDGET_HEADROOM_DEN * BUDGET_HEADROOM_NUM)
    }

    /// Drive the staged accumulation protocol for a given chunk plan
    ///
    /// The accumulator stays device-resident across all passes; each pass
    /// transfers one chunk, adds its contribution into every bin, and
    /// releases the chunk buffer before the next pass, so the device
    /// footprint never exceeds accumulator + one chunk. All work is issued
    /// on the client stream: passes execute in order, and within a pass
    /// each worker owns its accumulator slot exclusively.
    fn run_staged(
        &self,
        input: &[Complex64],
        output: &mut [Complex64],
        plan: &ChunkPlan,
    ) -> Result<()> {
        let num = input.len();

        let acc_guard = AllocGuard::new(self.allocator(), num * SAMPLE_BYTES)?;
        unsafe {
            kernels::launch_fill_zero(
                self.context(),
                self.stream(),
                self.device.index,
                acc_guard.ptr(),
                num,
            )?;
        }

        for range in plan.chunks() {
            let chunk = &input[range.clone()];

            // Chunk buffer is guarded per pass: freed (stream-ordered) as
            // soon as this pass's kernel is issued, including on error
            let chunk_guard = AllocGuard::new(self.allocator(), chunk.len() * SAMPLE_BYTES)?;
            CudaRuntime::copy_to_device(
                bytemuck::cast_slice(chunk),
                chunk_guard.ptr(),
                &self.device,
            )?;

            unsafe {
                kernels::launch_dft_partial(
                    self.context(),
                    self.stream(),
                    self.device.index,
                    chunk_guard.ptr(),
                    acc_guard.ptr(),
                    num,
                    range.start,
                    chunk.len(),
                )?;
            }
        }

        // After the last pass the accumulator holds every bin's complete sum
        CudaRuntime::copy_from_device(
            acc_guard.ptr(),
            bytemuck::cast_slice_mut(output),
            &self.device,
        )?;

        Ok(())
    }
}
