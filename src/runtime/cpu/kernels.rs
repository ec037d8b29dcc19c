//! CPU kernels for the direct DFT
//!
//! Both kernels evaluate bins through [`dft_bin`], so per-bin summation order
//! and precision are identical; they differ only in how bins are scheduled.

use crate::algorithm::dft::dft_bin;
use crate::dtype::Complex64;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Parallelization threshold: skip rayon for short sequences
///
/// Each bin already costs `num` complex multiply-adds, so the transform is
/// compute-bound much earlier than memory-bound elementwise kernels; 64 bins
/// is where fork-join overhead stops dominating.
#[cfg(feature = "rayon")]
const PARALLEL_THRESHOLD: usize = 64;

/// Sequential direct DFT: bins in ascending `k`, inner sum ascending `n`
pub fn dft_seq(input: &[Complex64], output: &mut [Complex64]) {
    debug_assert_eq!(input.len(), output.len());
    let num = input.len();

    for (k, out) in output.iter_mut().enumerate() {
        *out = dft_bin(input, k, 0, num);
    }
}

/// Parallel direct DFT: rayon map over bins
///
/// Worker `k` owns exactly `output[k]` and reads the shared input; there is
/// no cross-worker state, so bin values cannot depend on scheduling and the
/// result is bit-identical to [`dft_seq`].
#[cfg(feature = "rayon")]
pub fn dft_par(input: &[Complex64], output: &mut [Complex64]) {
    debug_assert_eq!(input.len(), output.len());
    let num = input.len();

    if num < PARALLEL_THRESHOLD {
        return dft_seq(input, output);
    }

    output.par_iter_mut().enumerate().for_each(|(k, out)| {
        *out = dft_bin(input, k, 0, num);
    });
}
