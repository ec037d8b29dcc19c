//! # dftr
//!
//! **Direct Discrete Fourier Transform of complex sequences, on CPU and CUDA.**
//!
//! dftr computes the DFT of a complex-f32 sequence by direct O(n²) summation,
//! with three interchangeable engines sharing one mathematical contract:
//!
//! - **CPU reference**: sequential evaluation, the correctness oracle
//! - **CUDA**: one concurrent worker per output bin, input resident on device
//! - **CUDA staged**: identical results for inputs too large for device
//!   memory, by accumulating chunk partial sums in a persistent device buffer
//!
//! ## Why direct DFT, not FFT?
//!
//! The direct form has no data dependency between output bins: bin `k` is a
//! sum over the whole input that no other bin participates in. That makes the
//! transform an embarrassingly parallel map over bins, with no cross-worker
//! butterflies to order, and makes chunked accumulation exact up to float
//! rounding. An FFT is mathematically equivalent but not bit-equivalent, and
//! is deliberately not what this crate computes.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dftr::prelude::*;
//!
//! let device = CpuDevice::new();
//! let client = CpuRuntime::default_client(&device);
//!
//! let input = vec![Complex64::new(1.0, 0.0); 16];
//! let mut output = vec![Complex64::ZERO; 16];
//! client.dft(&input, &mut output)?;
//! ```
//!
//! ## Feature Flags
//!
//! - `cpu` (default): CPU backend
//! - `cuda`: NVIDIA CUDA backend
//! - `rayon` (default): Multi-threaded CPU bin map

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod algorithm;
pub mod dtype;
pub mod error;
pub mod runtime;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithm::dft::DftAlgorithms;
    pub use crate::dtype::Complex64;
    pub use crate::error::{Error, Result};
    pub use crate::runtime::{Device, Runtime, RuntimeClient};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::CpuRuntime;

    #[cfg(feature = "cuda")]
    pub use crate::runtime::cuda::CudaRuntime;
}

/// Default runtime based on enabled features
///
/// - With `cuda` feature: `CudaRuntime`
/// - Otherwise: `CpuRuntime`
#[cfg(feature = "cuda")]
pub type DefaultRuntime = runtime::cuda::CudaRuntime;

/// Default runtime based on enabled features
#[cfg(not(feature = "cuda"))]
pub type DefaultRuntime = runtime::cpu::CpuRuntime;
