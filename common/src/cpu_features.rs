//! CPU feature detection for runtime SIMD dispatch.
//!
//! Detection runs once per process on first use and the result is immutable
//! afterwards, so it can be shared freely between threads. Use these functions
//! instead of the `is_*_feature_detected!` macros directly to avoid repeated
//! CPUID calls.

use std::sync::OnceLock;

/// CPU feature flags relevant to the pixel kernels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    pub ssse3: bool,
    pub sse4_1: bool,
    pub avx2: bool,
    pub neon: bool,
}

static FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

/// Get cached CPU features (detected once on first call).
#[inline]
pub fn get() -> CpuFeatures {
    *FEATURES.get_or_init(detect)
}

#[cfg(target_arch = "x86_64")]
fn detect() -> CpuFeatures {
    let features = CpuFeatures {
        ssse3: is_x86_feature_detected!("ssse3"),
        sse4_1: is_x86_feature_detected!("sse4.1"),
        avx2: is_x86_feature_detected!("avx2"),
        neon: false,
    };
    tracing::debug!(?features, "detected x86_64 cpu features");
    features
}

#[cfg(target_arch = "aarch64")]
fn detect() -> CpuFeatures {
    let features = CpuFeatures {
        neon: std::arch::is_aarch64_feature_detected!("neon"),
        ..CpuFeatures::default()
    };
    tracing::debug!(?features, "detected aarch64 cpu features");
    features
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect() -> CpuFeatures {
    CpuFeatures::default()
}

/// Check if SSE4.1 is available. Implies SSSE3 on every shipping CPU, but both
/// flags are checked.
#[inline]
pub fn has_sse4_1() -> bool {
    let f = get();
    f.ssse3 && f.sse4_1
}

/// Check if AVX2 is available.
#[inline]
pub fn has_avx2() -> bool {
    let f = get();
    f.avx2 && f.sse4_1
}

/// Check if NEON is available.
#[inline]
pub fn has_neon() -> bool {
    get().neon
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detection_is_cached() {
        assert_eq!(get(), get());
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn x86_64_has_no_neon() {
        assert!(!has_neon());
        // AVX2 dispatch also relies on the SSE4.1 tail kernels
        if has_avx2() {
            assert!(has_sse4_1());
        }
    }

    #[cfg(target_arch = "aarch64")]
    #[test]
    fn aarch64_has_no_x86_features() {
        assert!(!has_sse4_1());
        assert!(!has_avx2());
    }
}
