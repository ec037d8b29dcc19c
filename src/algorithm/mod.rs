//! Algorithm contracts shared by all backends
//!
//! Backend implementations live under `runtime::{cpu, cuda}`; the traits and
//! math here define what they must compute so results agree across backends.

pub mod dft;

pub use dft::{ChunkPlan, DftAlgorithms, dft_bin, plan_chunks, twiddle, validate_dft_buffers};
