//! Data types for DFT sequences
//!
//! The engines operate on one sample type: [`Complex64`], a complex number
//! with 32-bit float real and imaginary parts, stored interleaved. This is
//! the layout CUDA's `float2` and cuFFT expect, so host buffers transfer to
//! the device without conversion.

mod complex;

pub use complex::Complex64;
