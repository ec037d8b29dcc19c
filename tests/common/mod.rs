//! Common test utilities
#![allow(dead_code)]

use dftr::dtype::Complex64;
use dftr::runtime::Runtime;
use dftr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
#[cfg(feature = "cuda")]
use dftr::runtime::cuda::{CudaClient, CudaDevice, CudaRuntime};

/// Create a CPU client and device for testing
pub fn create_cpu_client() -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuRuntime::default_client(&device);
    (client, device)
}

/// Create a CUDA client and device, returning None if CUDA is unavailable
#[cfg(feature = "cuda")]
pub fn create_cuda_client() -> Option<(CudaClient, CudaDevice)> {
    if !dftr::runtime::cuda::is_cuda_available() {
        return None;
    }
    let init = std::panic::catch_unwind(|| {
        let device = CudaDevice::new(0);
        let client = CudaRuntime::default_client(&device);
        (client, device)
    });
    init.ok()
}

/// Assert two complex slices agree bin-by-bin within tolerance
///
/// Uses the formula: |a - b| <= atol + rtol * |b|
pub fn assert_allclose_c64(a: &[Complex64], b: &[Complex64], rtol: f32, atol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (k, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        let diff = (*x - *y).magnitude();
        let tol = atol + rtol * y.magnitude();
        assert!(
            diff <= tol,
            "{}: bin {} differs: {} vs {} (diff={}, tol={})",
            msg,
            k,
            x,
            y,
            diff,
            tol
        );
    }
}

/// Deterministic quasi-random test signal
///
/// Mixes incommensurate sinusoids so every bin carries energy; reproducible
/// without a PRNG dependency.
pub fn test_signal(num: usize) -> Vec<Complex64> {
    (0..num)
        .map(|n| {
            let t = n as f32;
            Complex64::new(
                (t * 0.731).sin() + 0.5 * (t * 0.211).cos(),
                (t * 0.397).cos() - 0.25 * (t * 1.117).sin(),
            )
        })
        .collect()
}
