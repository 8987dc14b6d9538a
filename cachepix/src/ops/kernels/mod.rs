// Per-row transform kernels
//
// Every kernel receives exactly the `row_bytes` prefix of one row, so it can
// neither read nor write stride padding. Accelerated kernels process full
// vector groups and hand the remaining tail to the scalar implementation.
//
// Group widths:
// - SSE4.1: scale/rescale 16 bytes (u8) / 8 samples (u16); luma 16 px / 8 px
// - AVX2:   scale/rescale 32 bytes / 16 samples; luma 16 px / 16 px
// - NEON:   scale/rescale 16 bytes / 8 samples; luma 16 px / 8 px

pub(crate) mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx;
#[cfg(target_arch = "aarch64")]
pub(crate) mod neon;
#[cfg(target_arch = "x86_64")]
pub(crate) mod sse;

#[cfg(test)]
mod tests;

#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
use common::cpu_features;

use crate::ops::Backend;

// Rec. 601 luma weights
pub(crate) const LUMA_R: f32 = 0.299;
pub(crate) const LUMA_G: f32 = 0.587;
pub(crate) const LUMA_B: f32 = 0.114;

// Same weights in Q8 fixed point (sum 256)
pub(crate) const LUMA_R_Q8: u16 = 77;
pub(crate) const LUMA_G_Q8: u16 = 150;
pub(crate) const LUMA_B_Q8: u16 = 29;

/// In-place affine kernel: `row`, `scale`, `bias`, clamp ceiling.
pub(crate) type ScaleRowFn = fn(row: &mut [u8], scale: f32, bias: f32, max: f32);
/// Luminance kernel: `src` row, `dst` row of equal length, clamp ceiling.
pub(crate) type LumaRowFn = fn(src: &[u8], dst: &mut [u8], max: f32);
/// In-place maxval rescale kernel: `row`, old maxval, new maxval.
pub(crate) type RescaleRowFn = fn(row: &mut [u8], old_maxval: u16, new_maxval: u16);

/// One backend's full set of row kernels.
///
/// `*_u16` kernels operate on big-endian 16-bit samples.
pub struct RowKernels {
    pub(crate) backend: Backend,
    pub(crate) scale_u8: ScaleRowFn,
    pub(crate) scale_u16: ScaleRowFn,
    pub(crate) luma_u8: LumaRowFn,
    pub(crate) luma_u16: LumaRowFn,
    pub(crate) rescale_u8: RescaleRowFn,
    pub(crate) rescale_u16: RescaleRowFn,
}

impl RowKernels {
    pub fn backend(&self) -> Backend {
        self.backend
    }
}

impl std::fmt::Debug for RowKernels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowKernels")
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

/// Returns the kernel table for `backend`, or `None` if this CPU lacks the
/// required instructions.
pub(crate) fn kernels_for(backend: Backend) -> Option<&'static RowKernels> {
    match backend {
        Backend::Scalar => Some(&scalar::KERNELS),
        #[cfg(target_arch = "x86_64")]
        Backend::Sse41 if cpu_features::has_sse4_1() => Some(&sse::KERNELS),
        #[cfg(target_arch = "x86_64")]
        Backend::Avx2 if cpu_features::has_avx2() => Some(&avx::KERNELS),
        #[cfg(target_arch = "aarch64")]
        Backend::Neon if cpu_features::has_neon() => Some(&neon::KERNELS),
        _ => None,
    }
}
