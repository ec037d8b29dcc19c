//! DFT algorithm contract for backend consistency
//!
//! This module defines the trait that every backend implements, plus the
//! shared math and the staged engine's memory planner. Keeping these
//! backend-independent guarantees numerical parity: CPU and CUDA derive
//! twiddle factors and summation order from one definition.
//!
//! # Algorithm: direct DFT
//!
//! For a sequence of length `num`, output bin `k` is
//!
//! ```text
//! output[k] = Σ_{n=0}^{num-1} input[n] · exp(-2πi·k·n/num)
//! ```
//!
//! evaluated directly, O(num²) total work. This is NOT an FFT and must not be
//! replaced by one: the direct form's per-bin independence (no recurrence
//! across bins, no butterflies) is what lets the parallel engines run one
//! isolated worker per bin, and chunking the `n`-range only re-associates a
//! linear sum, so staged accumulation is exact up to float rounding.
//!
//! # Implementation Requirements
//!
//! Backends may differ in:
//! - Parallelization strategy (sequential loop, rayon map, GPU blocks)
//! - Where partial sums live (registers, host memory, device accumulator)
//!
//! Backends MUST match in:
//! - Twiddle derivation: angle reduced mod `num` and evaluated in f64
//! - Summation order: ascending `n` within each bin
//! - Accumulation precision: f64 partial sums, rounded to f32 once per bin

use crate::dtype::Complex64;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::f64::consts::TAU;
use std::ops::Range;

// ============================================================================
// Shared Math
// ============================================================================

/// Twiddle factor `exp(-2πi·k·n/num)`
///
/// The exponent index is reduced mod `num` before the angle is formed, so the
/// argument to cos/sin stays in `[0, 2π)` regardless of how large `k·n` gets.
/// Evaluated in f64 and rounded to f32 components once.
#[inline]
pub fn twiddle(k: usize, n: usize, num: usize) -> Complex64 {
    let (re, im) = twiddle_f64(k, n, num);
    Complex64::new(re as f32, im as f32)
}

/// Twiddle factor with f64 components, for accumulation
#[inline]
fn twiddle_f64(k: usize, n: usize, num: usize) -> (f64, f64) {
    debug_assert!(num > 0);
    let idx = (k as u64 * n as u64) % num as u64;
    let angle = -TAU * idx as f64 / num as f64;
    (angle.cos(), angle.sin())
}

/// Partial DFT sum for bin `k` over one contiguous run of samples
///
/// `samples` holds input indices `[offset, offset + samples.len())` of a
/// sequence of total length `num`. Summation is over ascending `n` with an
/// f64 accumulator, rounded to f32 once at the end — the single source of
/// truth every engine's inner loop mirrors.
///
/// The full transform of bin `k` is `dft_bin(input, k, 0, input.len())`;
/// the staged engines sum this over their chunks instead.
pub fn dft_bin(samples: &[Complex64], k: usize, offset: usize, num: usize) -> Complex64 {
    let mut acc_re = 0.0f64;
    let mut acc_im = 0.0f64;

    for (j, &x) in samples.iter().enumerate() {
        let (tw_re, tw_im) = twiddle_f64(k, offset + j, num);
        let re = x.re as f64;
        let im = x.im as f64;
        acc_re += re * tw_re - im * tw_im;
        acc_im += re * tw_im + im * tw_re;
    }

    Complex64::new(acc_re as f32, acc_im as f32)
}

// ============================================================================
// Validation
// ============================================================================

/// Check that input and output buffers describe the same sequence length
///
/// Slices carry their lengths, so the precondition is checked here rather
/// than left to the caller: a mismatch fails fast with `LengthMismatch`
/// before any work or device traffic happens.
pub fn validate_dft_buffers(input_len: usize, output_len: usize) -> Result<()> {
    if input_len != output_len {
        return Err(Error::LengthMismatch {
            input: input_len,
            output: output_len,
        });
    }
    Ok(())
}

// ============================================================================
// Staged Memory Planner
// ============================================================================

/// Chunk partition of an input sequence for the staged engine
///
/// Chunks are contiguous, ascending, and cover every input index exactly
/// once; the last chunk may be shorter than the rest. The plan is pure
/// arithmetic over lengths, so it is decided (and testable) without touching
/// a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    num: usize,
    chunk_len: usize,
}

impl ChunkPlan {
    /// Build a plan with an explicitly chosen chunk length
    ///
    /// `chunk_len` is clamped to `num`. Used by the staged engine once the
    /// planner has sized chunks, and by tests that force tiny chunks.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if `chunk_len == 0` with a non-empty sequence —
    /// such a plan would never cover the input.
    pub fn with_chunk_len(num: usize, chunk_len: usize) -> Result<Self> {
        if num > 0 && chunk_len == 0 {
            return Err(Error::Internal(
                "chunk length of 0 cannot cover a non-empty sequence".to_string(),
            ));
        }
        Ok(Self {
            num,
            chunk_len: chunk_len.min(num),
        })
    }

    /// Sequence length this plan covers
    #[inline]
    pub fn num(&self) -> usize {
        self.num
    }

    /// Samples per chunk (the final chunk may hold fewer)
    #[inline]
    pub fn chunk_len(&self) -> usize {
        self.chunk_len
    }

    /// Number of passes: `ceil(num / chunk_len)`
    #[inline]
    pub fn num_chunks(&self) -> usize {
        if self.num == 0 {
            0
        } else {
            self.num.div_ceil(self.chunk_len)
        }
    }

    /// Iterate the chunk ranges in ascending order
    pub fn chunks(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let (num, chunk_len) = (self.num, self.chunk_len);
        (0..self.num_chunks()).map(move |c| {
            let start = c * chunk_len;
            start..(start + chunk_len).min(num)
        })
    }
}

/// Choose the largest chunk length that fits a device-memory budget
///
/// The budget must hold the persistent `num`-bin accumulator plus one chunk
/// of input samples at a time. The planner reserves the accumulator footprint
/// first, then gives the remainder to the chunk: the largest viable chunk
/// means the fewest passes and transfer synchronizations.
///
/// # Errors
///
/// Returns `OutOfMemory` when even a single-sample chunk does not fit beside
/// the accumulator — per the engine contract, too-small budgets fail rather
/// than truncate the transform.
pub fn plan_chunks(num: usize, budget_bytes: usize) -> Result<ChunkPlan> {
    if num == 0 {
        return ChunkPlan::with_chunk_len(0, 0);
    }

    let sample_bytes = std::mem::size_of::<Complex64>();
    let acc_bytes = num * sample_bytes;
    let min_required = acc_bytes + sample_bytes;

    if budget_bytes < min_required {
        return Err(Error::OutOfMemory {
            required: min_required,
            available: budget_bytes,
        });
    }

    let chunk_len = ((budget_bytes - acc_bytes) / sample_bytes).min(num);
    ChunkPlan::with_chunk_len(num, chunk_len)
}

// ============================================================================
// DFT Algorithm Trait
// ============================================================================

/// Algorithmic contract for the direct DFT engines
///
/// All backends compute the same transform with the same twiddle derivation
/// and summation order; they differ only in scheduling and memory residence.
/// From the caller's side every operation has the same shape: read `input`,
/// write every bin of the caller-allocated `output`, retain nothing.
///
/// # Failure atomicity
///
/// On error, `output` is never left holding a subset of freshly computed
/// bins that the caller could mistake for a full result: engines validate and
/// plan before writing, and device engines only copy back after every bin's
/// final value is committed. `input.len() == 0` is a no-op `Ok`, not an error.
pub trait DftAlgorithms<R: Runtime> {
    /// Full transform: `output[k] = Σ_n input[n]·exp(-2πi·k·n/num)`
    ///
    /// CPU: sequential bins, ascending `k`. CUDA: one worker per bin, the
    /// whole input resident on the device — fails with `OutOfMemory` when
    /// input + output do not fit in device memory (use [`dft_staged`] then).
    ///
    /// # Errors
    ///
    /// - `LengthMismatch` if `input.len() != output.len()`
    /// - `OutOfMemory` if the device cannot hold the working set
    /// - `Backend` on transfer or launch failure
    ///
    /// [`dft_staged`]: DftAlgorithms::dft_staged
    fn dft(&self, input: &[Complex64], output: &mut [Complex64]) -> Result<()>;

    /// Full transform with bounded device memory
    ///
    /// Identical contract and result as [`dft`] (up to float accumulation
    /// order), with no fits-in-device-memory precondition: the input is
    /// staged through chunks sized to the device budget while per-bin
    /// partial sums accumulate on the device. On the CPU backend there is no
    /// device memory to bound, so this delegates to [`dft`].
    ///
    /// # Errors
    ///
    /// - `LengthMismatch` if `input.len() != output.len()`
    /// - `OutOfMemory` if no viable chunk size exists (the `num`-bin
    ///   accumulator alone overflows the budget)
    /// - `Backend` on transfer or launch failure
    ///
    /// [`dft`]: DftAlgorithms::dft
    fn dft_staged(&self, input: &[Complex64], output: &mut [Complex64]) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: usize = std::mem::size_of::<Complex64>();

    #[test]
    fn test_twiddle_unit_circle() {
        // k·n ≡ 0 (mod num) must give exactly 1+0i
        let t = twiddle(0, 17, 32);
        assert_eq!(t, Complex64::ONE);
        let t = twiddle(8, 4, 32);
        assert_eq!(t, Complex64::new(1.0, 0.0));

        // Quarter turn: exp(-iπ/2) = -i
        let t = twiddle(1, 1, 4);
        assert!(t.re.abs() < 1e-7);
        assert!((t.im + 1.0).abs() < 1e-7);
    }

    #[test]
    fn test_twiddle_index_reduction() {
        // Same residue mod num must give the identical factor
        let a = twiddle(3, 5, 8);
        let b = twiddle(5, 3 + 8, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_dft_bin_impulse() {
        // Impulse at n=0: every bin is exactly 1
        let mut input = vec![Complex64::ZERO; 8];
        input[0] = Complex64::ONE;
        for k in 0..8 {
            assert_eq!(dft_bin(&input, k, 0, 8), Complex64::ONE);
        }
    }

    #[test]
    fn test_dft_bin_chunk_additivity() {
        let input: Vec<Complex64> = (0..16)
            .map(|i| Complex64::new(i as f32 * 0.25 - 1.0, (i as f32).sin()))
            .collect();

        for k in 0..16 {
            let full = dft_bin(&input, k, 0, 16);
            let split = dft_bin(&input[..5], k, 0, 16)
                + dft_bin(&input[5..11], k, 5, 16)
                + dft_bin(&input[11..], k, 11, 16);
            assert!(
                (full - split).magnitude() <= 1e-4 * full.magnitude().max(1.0),
                "bin {}: {} vs {}",
                k,
                full,
                split
            );
        }
    }

    #[test]
    fn test_validate_buffers() {
        assert!(validate_dft_buffers(4, 4).is_ok());
        assert!(validate_dft_buffers(0, 0).is_ok());
        match validate_dft_buffers(4, 3) {
            Err(Error::LengthMismatch { input: 4, output: 3 }) => {}
            other => panic!("expected LengthMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_exact_partition() {
        let plan = plan_chunks(10, 10 * SAMPLE + 3 * SAMPLE).unwrap();
        assert_eq!(plan.chunk_len(), 3);
        assert_eq!(plan.num_chunks(), 4);

        let ranges: Vec<_> = plan.chunks().collect();
        assert_eq!(ranges, vec![0..3, 3..6, 6..9, 9..10]);

        // Every index covered exactly once, in ascending order
        let covered: Vec<usize> = ranges.into_iter().flatten().collect();
        assert_eq!(covered, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_plan_single_pass_when_budget_allows() {
        // Budget big enough for accumulator + whole input: one chunk
        let plan = plan_chunks(64, 1 << 20).unwrap();
        assert_eq!(plan.chunk_len(), 64);
        assert_eq!(plan.num_chunks(), 1);
        assert_eq!(plan.chunks().next().unwrap(), 0..64);
    }

    #[test]
    fn test_plan_minimum_viable_chunk() {
        // Exactly accumulator + one sample: chunk length 1, num passes
        let plan = plan_chunks(6, 6 * SAMPLE + SAMPLE).unwrap();
        assert_eq!(plan.chunk_len(), 1);
        assert_eq!(plan.num_chunks(), 6);
    }

    #[test]
    fn test_plan_out_of_memory() {
        // Accumulator alone exceeds the budget
        match plan_chunks(100, 100 * SAMPLE) {
            Err(Error::OutOfMemory {
                required,
                available,
            }) => {
                assert_eq!(required, 101 * SAMPLE);
                assert_eq!(available, 100 * SAMPLE);
            }
            other => panic!("expected OutOfMemory, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_never_exceeds_budget() {
        for num in [1usize, 7, 64, 1000] {
            for budget in [(num + 1) * SAMPLE, (num + 5) * SAMPLE, num * SAMPLE * 3] {
                let plan = plan_chunks(num, budget).unwrap();
                assert!(plan.chunk_len() >= 1);
                // Resident footprint per pass: accumulator + one chunk
                assert!(num * SAMPLE + plan.chunk_len() * SAMPLE <= budget);
            }
        }
    }

    #[test]
    fn test_plan_empty_sequence() {
        let plan = plan_chunks(0, 0).unwrap();
        assert_eq!(plan.num_chunks(), 0);
        assert_eq!(plan.chunks().count(), 0);
    }

    #[test]
    fn test_forced_chunk_len_clamped() {
        let plan = ChunkPlan::with_chunk_len(4, 100).unwrap();
        assert_eq!(plan.chunk_len(), 4);
        assert_eq!(plan.num_chunks(), 1);

        assert!(ChunkPlan::with_chunk_len(4, 0).is_err());
    }
}
