//! Complex sample type for DFT sequences
//!
//! # Storage Format
//!
//! Complex numbers are stored in interleaved format (re, im, re, im...),
//! matching numpy, FFTW, and CUDA `float2` conventions. The type is
//! `bytemuck::Pod`, so host slices reinterpret as byte buffers for device
//! transfers without copying.
//!
//! # Arithmetic Operations
//!
//! Complex arithmetic follows standard mathematical definitions:
//! - Addition: `(a+bi) + (c+di) = (a+c) + (b+d)i`
//! - Multiplication: `(a+bi)(c+di) = (ac-bd) + (ad+bc)i`

use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

#[cfg(feature = "cuda")]
use cudarc::driver::DeviceRepr;
#[cfg(feature = "cuda")]
use cudarc::types::CudaTypeName;

/// 64-bit complex number with f32 real and imaginary parts
///
/// Memory layout: f32 × 2, interleaved format, matching CUDA's `float2`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Complex64 {
    /// Real part
    pub re: f32,
    /// Imaginary part
    pub im: f32,
}

impl Complex64 {
    /// Zero complex number
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    /// One (real unit)
    pub const ONE: Self = Self { re: 1.0, im: 0.0 };

    /// Imaginary unit i
    pub const I: Self = Self { re: 0.0, im: 1.0 };

    /// Create a new complex number
    #[inline]
    pub const fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    /// Create a complex number from polar form: r * e^(iθ)
    #[inline]
    pub fn from_polar(r: f32, theta: f32) -> Self {
        Self {
            re: r * theta.cos(),
            im: r * theta.sin(),
        }
    }

    /// Magnitude (absolute value): |z| = sqrt(re² + im²)
    #[inline]
    pub fn magnitude(self) -> f32 {
        (self.re * self.re + self.im * self.im).sqrt()
    }

    /// Squared magnitude: |z|² = re² + im²
    ///
    /// More efficient than `magnitude()` when you only need the squared value.
    #[inline]
    pub fn magnitude_squared(self) -> f32 {
        self.re * self.re + self.im * self.im
    }

    /// Phase angle (argument): atan2(im, re)
    #[inline]
    pub fn phase(self) -> f32 {
        self.im.atan2(self.re)
    }

    /// Complex conjugate: conj(a + bi) = a - bi
    #[inline]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }
}

impl Add for Complex64 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl Sub for Complex64 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl Mul for Complex64 {
    type Output = Self;

    /// Complex multiplication: (a+bi)(c+di) = (ac-bd) + (ad+bc)i
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

impl Neg for Complex64 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

impl fmt::Display for Complex64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.im >= 0.0 {
            write!(f, "{}+{}i", self.re, self.im)
        } else {
            write!(f, "{}{}i", self.re, self.im)
        }
    }
}

impl From<f32> for Complex64 {
    #[inline]
    fn from(re: f32) -> Self {
        Self { re, im: 0.0 }
    }
}

impl From<(f32, f32)> for Complex64 {
    #[inline]
    fn from((re, im): (f32, f32)) -> Self {
        Self { re, im }
    }
}

/// Complex64 maps to CUDA's float2 (two 32-bit floats in interleaved format)
#[cfg(feature = "cuda")]
impl CudaTypeName for Complex64 {
    const NAME: &'static str = "float2";
}

/// SAFETY: Complex64 is #[repr(C)] with two f32 fields, which matches CUDA float2 layout.
/// The type is Pod and Zeroable, ensuring safe memory representation for GPU transfers.
#[cfg(feature = "cuda")]
unsafe impl DeviceRepr for Complex64 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic() {
        let z = Complex64::new(3.0, 4.0);
        assert_eq!(z.re, 3.0);
        assert_eq!(z.im, 4.0);
        assert_eq!(z.magnitude(), 5.0);
    }

    #[test]
    fn test_arithmetic() {
        let a = Complex64::new(1.0, 2.0);
        let b = Complex64::new(3.0, -1.0);

        let sum = a + b;
        assert_eq!(sum, Complex64::new(4.0, 1.0));

        let diff = a - b;
        assert_eq!(diff, Complex64::new(-2.0, 3.0));

        // (1+2i)(3-i) = 3 - i + 6i - 2i² = 5 + 5i
        let product = a * b;
        assert_eq!(product, Complex64::new(5.0, 5.0));
    }

    #[test]
    fn test_conjugate() {
        let z = Complex64::new(3.0, 4.0);
        assert_eq!(z.conj(), Complex64::new(3.0, -4.0));
        // z * conj(z) = |z|²
        let prod = z * z.conj();
        assert_eq!(prod.re, z.magnitude_squared());
        assert_eq!(prod.im, 0.0);
    }

    #[test]
    fn test_polar() {
        let z = Complex64::from_polar(2.0, std::f32::consts::FRAC_PI_2);
        assert!(z.re.abs() < 1e-6);
        assert!((z.im - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_constants() {
        assert_eq!(Complex64::ZERO, Complex64::new(0.0, 0.0));
        assert_eq!(Complex64::ONE, Complex64::new(1.0, 0.0));
        assert_eq!(Complex64::I * Complex64::I, -Complex64::ONE);
    }

    #[test]
    fn test_pod_cast() {
        let samples = [Complex64::new(1.0, 2.0), Complex64::new(3.0, 4.0)];
        let bytes: &[u8] = bytemuck::cast_slice(&samples);
        assert_eq!(bytes.len(), 16);
        let back: &[Complex64] = bytemuck::cast_slice(bytes);
        assert_eq!(back, &samples);
    }

    #[test]
    fn test_size() {
        assert_eq!(std::mem::size_of::<Complex64>(), 8);
    }
}
