//! Reference DFT engine for the CPU runtime
//!
//! This is the correctness oracle: strictly sequential, no concurrency,
//! every accelerated backend is tested against it.

use super::kernels;
use super::{CpuClient, CpuRuntime};
use crate::algorithm::dft::{DftAlgorithms, validate_dft_buffers};
use crate::dtype::Complex64;
use crate::error::Result;

impl DftAlgorithms<CpuRuntime> for CpuClient {
    fn dft(&self, input: &[Complex64], output: &mut [Complex64]) -> Result<()> {
        validate_dft_buffers(input.len(), output.len())?;
        if input.is_empty() {
            return Ok(());
        }

        kernels::dft_seq(input, output);
        Ok(())
    }

    /// There is no device memory to bound on the host, so staging degenerates
    /// to the plain transform.
    fn dft_staged(&self, input: &[Complex64], output: &mut [Complex64]) -> Result<()> {
        self.dft(input, output)
    }
}

impl CpuClient {
    /// Multi-threaded direct DFT: rayon map over output bins
    ///
    /// Same contract and bit-identical results as [`DftAlgorithms::dft`]
    /// (parallelism is across bins; each bin's sum is unchanged). The
    /// reference `dft` stays sequential by contract — use this entry when
    /// throughput matters and no GPU is available.
    #[cfg(feature = "rayon")]
    pub fn dft_par(&self, input: &[Complex64], output: &mut [Complex64]) -> Result<()> {
        validate_dft_buffers(input.len(), output.len())?;
        if input.is_empty() {
            return Ok(());
        }

        kernels::dft_par(input, output);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn client() -> CpuClient {
        CpuClient::new(super::super::CpuDevice::new())
    }

    #[test]
    fn test_dft_empty_is_noop() {
        let c = client();
        let input: Vec<Complex64> = vec![];
        let mut output: Vec<Complex64> = vec![];
        c.dft(&input, &mut output).unwrap();
    }

    #[test]
    fn test_dft_single_sample_is_identity() {
        let c = client();
        let input = [Complex64::new(2.5, -1.25)];
        let mut output = [Complex64::ZERO];
        c.dft(&input, &mut output).unwrap();
        assert_eq!(output[0], input[0]);
    }

    #[test]
    fn test_dft_length_mismatch() {
        let c = client();
        let input = [Complex64::ONE; 4];
        let mut output = [Complex64::ZERO; 3];
        match c.dft(&input, &mut output) {
            Err(Error::LengthMismatch { input: 4, output: 3 }) => {}
            other => panic!("expected LengthMismatch, got {:?}", other),
        }
        // Failed call must not have written bins
        assert!(output.iter().all(|&b| b == Complex64::ZERO));
    }

    #[test]
    fn test_dft_impulse() {
        let c = client();
        let mut input = vec![Complex64::ZERO; 8];
        input[0] = Complex64::ONE;
        let mut output = vec![Complex64::ZERO; 8];
        c.dft(&input, &mut output).unwrap();

        for (k, bin) in output.iter().enumerate() {
            assert!(
                (*bin - Complex64::ONE).magnitude() < 1e-6,
                "bin {}: {}",
                k,
                bin
            );
        }
    }

    #[test]
    fn test_dft_all_ones() {
        let c = client();
        let input = vec![Complex64::ONE; 16];
        let mut output = vec![Complex64::ZERO; 16];
        c.dft(&input, &mut output).unwrap();

        assert!((output[0].re - 16.0).abs() < 1e-4);
        assert!(output[0].im.abs() < 1e-4);
        for bin in &output[1..] {
            assert!(bin.magnitude() < 1e-4, "expected ~0, got {}", bin);
        }
    }

    #[test]
    fn test_dft_staged_matches_dft() {
        let c = client();
        let input: Vec<Complex64> = (0..12)
            .map(|i| Complex64::new((i as f32).cos(), (i as f32) * 0.5))
            .collect();
        let mut direct = vec![Complex64::ZERO; 12];
        let mut staged = vec![Complex64::ZERO; 12];

        c.dft(&input, &mut direct).unwrap();
        c.dft_staged(&input, &mut staged).unwrap();
        assert_eq!(direct, staged);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_dft_par_bit_identical() {
        let c = client();
        // Above and below the parallel threshold
        for num in [16usize, 200] {
            let input: Vec<Complex64> = (0..num)
                .map(|i| Complex64::new((i as f32 * 0.7).sin(), (i as f32 * 0.3).cos()))
                .collect();
            let mut seq = vec![Complex64::ZERO; num];
            let mut par = vec![Complex64::ZERO; num];

            c.dft(&input, &mut seq).unwrap();
            c.dft_par(&input, &mut par).unwrap();
            assert_eq!(seq, par, "num = {}", num);
        }
    }
}
