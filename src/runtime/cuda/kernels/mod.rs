//! CUDA kernel infrastructure for the DFT engines
//!
//! - `loader` - PTX loading, per-device module caching, launch configuration
//! - `dft` - launchers for the DFT kernels compiled from `dft.cu`

mod dft;
mod loader;

pub use dft::{launch_dft_full, launch_dft_partial, launch_fill_zero};
