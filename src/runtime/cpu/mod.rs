//! CPU runtime implementation
//!
//! The CPU runtime hosts the reference DFT engine: strictly sequential
//! evaluation, bins in ascending order, serving as the correctness oracle
//! for the accelerated backends. With the `rayon` feature it additionally
//! exposes a multi-threaded bin map that is bit-identical to the sequential
//! path (parallelism is across bins, never within a bin's sum).

mod client;
mod device;
mod dft;
pub(crate) mod kernels;
mod runtime;

pub use client::{CpuAllocator, CpuClient};
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
