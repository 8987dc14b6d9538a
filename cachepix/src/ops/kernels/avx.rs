// AVX2 kernels for x86_64
//
// RGB deinterleaving reuses the SSE shuffle helpers; arithmetic runs eight
// lanes wide. Luma uses the float reference weights, so every kernel here is
// exact against the scalar one.

#![allow(unsafe_op_in_unsafe_fn)]

use std::arch::x86_64::*;

use super::sse;
use super::{LUMA_B, LUMA_G, LUMA_R, RowKernels, scalar};
use crate::ops::Backend;

pub(crate) static KERNELS: RowKernels = RowKernels {
    backend: Backend::Avx2,
    scale_u8,
    scale_u16,
    luma_u8,
    luma_u16,
    rescale_u8,
    rescale_u16,
};

// SAFETY (all wrappers below): `KERNELS` is only handed out by `kernels_for`
// after AVX2 was detected.

fn scale_u8(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    unsafe { scale_u8_avx2(row, scale, bias, max) }
}

fn scale_u16(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    unsafe { scale_u16_avx2(row, scale, bias, max) }
}

fn luma_u8(src: &[u8], dst: &mut [u8], max: f32) {
    unsafe { luma_u8_avx2(src, dst, max) }
}

fn luma_u16(src: &[u8], dst: &mut [u8], max: f32) {
    unsafe { luma_u16_avx2(src, dst, max) }
}

fn rescale_u8(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    unsafe { rescale_u8_avx2(row, old_maxval, new_maxval) }
}

fn rescale_u16(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    unsafe { rescale_u16_avx2(row, old_maxval, new_maxval) }
}

// =============================================================================
// Helpers
// =============================================================================

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn bswap16_256(v: __m256i) -> __m256i {
    let mask = _mm256_setr_epi8(
        1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14, //
        1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14,
    );
    _mm256_shuffle_epi8(v, mask)
}

/// Packs two vectors of eight i32 into sixteen u16 in source order.
///
/// `packus_epi32` interleaves 128-bit lanes as [a0-3, b0-3 | a4-7, b4-7];
/// qword permutation 0, 2, 1, 3 restores [a0-7, b0-7].
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn pack_u16(a: __m256i, b: __m256i) -> __m256i {
    _mm256_permute4x64_epi64(_mm256_packus_epi32(a, b), 0xD8)
}

/// Packs four vectors of eight i32 (each in [0, 255]) into 32 bytes in source order.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn pack_u8(a: __m256i, b: __m256i, c: __m256i, d: __m256i) -> __m256i {
    // After packus_epi32 and packus_epi16 the dwords are:
    // [a0-3, b0-3, c0-3, d0-3 | a4-7, b4-7, c4-7, d4-7]
    let perm = _mm256_setr_epi32(0, 4, 1, 5, 2, 6, 3, 7);
    let packed = _mm256_packus_epi16(_mm256_packus_epi32(a, b), _mm256_packus_epi32(c, d));
    _mm256_permutevar8x32_epi32(packed, perm)
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn scale_epi32(v: __m256i, scale: __m256, bias: __m256, max: __m256) -> __m256i {
    let f = _mm256_add_ps(_mm256_mul_ps(_mm256_cvtepi32_ps(v), scale), bias);
    _mm256_cvtps_epi32(_mm256_min_ps(_mm256_max_ps(f, _mm256_setzero_ps()), max))
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn rescale_epi32(v: __m256i, old: __m256, new: __m256) -> __m256i {
    let q = _mm256_div_ps(_mm256_mul_ps(_mm256_cvtepi32_ps(v), new), old);
    _mm256_cvttps_epi32(_mm256_min_ps(q, new))
}

/// Rescales four i32 lanes in f64, returning four truncated i32.
#[inline]
#[target_feature(enable = "avx2")]
unsafe fn rescale_pd(v: __m128i, old: __m256d, new: __m256d) -> __m128i {
    let q = _mm256_div_pd(_mm256_mul_pd(_mm256_cvtepi32_pd(v), new), old);
    _mm256_cvttpd_epi32(_mm256_min_pd(q, new))
}

#[inline]
#[target_feature(enable = "avx2")]
unsafe fn luma_epi32(
    r: __m256i,
    g: __m256i,
    b: __m256i,
    weights: (__m256, __m256, __m256),
    max: __m256,
) -> __m256i {
    let (wr, wg, wb) = weights;
    let y = _mm256_add_ps(
        _mm256_add_ps(
            _mm256_mul_ps(_mm256_cvtepi32_ps(r), wr),
            _mm256_mul_ps(_mm256_cvtepi32_ps(g), wg),
        ),
        _mm256_mul_ps(_mm256_cvtepi32_ps(b), wb),
    );
    _mm256_cvtps_epi32(_mm256_min_ps(y, max))
}

// =============================================================================
// Scale / bias
// =============================================================================

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn scale_u8_avx2(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    let groups = row.len() / 32;
    let ptr = row.as_mut_ptr();

    let scale_v = _mm256_set1_ps(scale);
    let bias_v = _mm256_set1_ps(bias);
    let max_v = _mm256_set1_ps(max);

    macro_rules! scale8 {
        ($p:expr) => {
            scale_epi32(
                _mm256_cvtepu8_epi32(_mm_loadl_epi64($p as *const __m128i)),
                scale_v,
                bias_v,
                max_v,
            )
        };
    }

    for i in 0..groups {
        let p = ptr.add(i * 32);

        let a = scale8!(p);
        let b = scale8!(p.add(8));
        let c = scale8!(p.add(16));
        let d = scale8!(p.add(24));

        _mm256_storeu_si256(p as *mut __m256i, pack_u8(a, b, c, d));
    }

    scalar::scale_u8(&mut row[groups * 32..], scale, bias, max);
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn scale_u16_avx2(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    let groups = row.len() / 32;
    let ptr = row.as_mut_ptr();

    let scale_v = _mm256_set1_ps(scale);
    let bias_v = _mm256_set1_ps(bias);
    let max_v = _mm256_set1_ps(max);

    for i in 0..groups {
        let p = ptr.add(i * 32);
        let v = bswap16_256(_mm256_loadu_si256(p as *const __m256i));

        let lo = _mm256_cvtepu16_epi32(_mm256_castsi256_si128(v));
        let hi = _mm256_cvtepu16_epi32(_mm256_extracti128_si256(v, 1));

        let out = pack_u16(
            scale_epi32(lo, scale_v, bias_v, max_v),
            scale_epi32(hi, scale_v, bias_v, max_v),
        );
        _mm256_storeu_si256(p as *mut __m256i, bswap16_256(out));
    }

    scalar::scale_u16(&mut row[groups * 32..], scale, bias, max);
}

// =============================================================================
// Luminance
// =============================================================================

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn luma_u8_avx2(src: &[u8], dst: &mut [u8], max: f32) {
    debug_assert_eq!(src.len(), dst.len());

    let groups = src.len() / 48;
    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    let weights = (
        _mm256_set1_ps(LUMA_R),
        _mm256_set1_ps(LUMA_G),
        _mm256_set1_ps(LUMA_B),
    );
    let max_v = _mm256_set1_ps(max);

    for i in 0..groups {
        let [r, g, b] = sse::deinterleave_rgb_u8(src_ptr.add(i * 48));

        let lo = luma_epi32(
            _mm256_cvtepu8_epi32(r),
            _mm256_cvtepu8_epi32(g),
            _mm256_cvtepu8_epi32(b),
            weights,
            max_v,
        );
        let hi = luma_epi32(
            _mm256_cvtepu8_epi32(_mm_srli_si128(r, 8)),
            _mm256_cvtepu8_epi32(_mm_srli_si128(g, 8)),
            _mm256_cvtepu8_epi32(_mm_srli_si128(b, 8)),
            weights,
            max_v,
        );

        let y16 = pack_u16(lo, hi);
        let y = _mm_packus_epi16(
            _mm256_castsi256_si128(y16),
            _mm256_extracti128_si256(y16, 1),
        );
        sse::store_gray_u8(dst_ptr.add(i * 48), y);
    }

    scalar::luma_u8(&src[groups * 48..], &mut dst[groups * 48..], max);
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn luma_u16_avx2(src: &[u8], dst: &mut [u8], max: f32) {
    debug_assert_eq!(src.len(), dst.len());

    // 16 pixels of 6 bytes
    let groups = src.len() / 96;
    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    let weights = (
        _mm256_set1_ps(LUMA_R),
        _mm256_set1_ps(LUMA_G),
        _mm256_set1_ps(LUMA_B),
    );
    let max_v = _mm256_set1_ps(max);

    for i in 0..groups {
        let base = i * 96;
        let [r0, g0, b0] = sse::deinterleave_rgb_u16(src_ptr.add(base));
        let [r1, g1, b1] = sse::deinterleave_rgb_u16(src_ptr.add(base + 48));

        let y0 = luma_epi32(
            _mm256_cvtepu16_epi32(r0),
            _mm256_cvtepu16_epi32(g0),
            _mm256_cvtepu16_epi32(b0),
            weights,
            max_v,
        );
        let y1 = luma_epi32(
            _mm256_cvtepu16_epi32(r1),
            _mm256_cvtepu16_epi32(g1),
            _mm256_cvtepu16_epi32(b1),
            weights,
            max_v,
        );

        let y = pack_u16(y0, y1);
        sse::store_gray_u16(dst_ptr.add(base), _mm256_castsi256_si128(y));
        sse::store_gray_u16(dst_ptr.add(base + 48), _mm256_extracti128_si256(y, 1));
    }

    scalar::luma_u16(&src[groups * 96..], &mut dst[groups * 96..], max);
}

// =============================================================================
// Maxval rescale
// =============================================================================

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn rescale_u8_avx2(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    let groups = row.len() / 32;
    let ptr = row.as_mut_ptr();

    let old = _mm256_set1_ps(old_maxval as f32);
    let new = _mm256_set1_ps(new_maxval as f32);

    macro_rules! rescale8 {
        ($p:expr) => {
            rescale_epi32(
                _mm256_cvtepu8_epi32(_mm_loadl_epi64($p as *const __m128i)),
                old,
                new,
            )
        };
    }

    for i in 0..groups {
        let p = ptr.add(i * 32);

        let a = rescale8!(p);
        let b = rescale8!(p.add(8));
        let c = rescale8!(p.add(16));
        let d = rescale8!(p.add(24));

        _mm256_storeu_si256(p as *mut __m256i, pack_u8(a, b, c, d));
    }

    scalar::rescale_u8(&mut row[groups * 32..], old_maxval, new_maxval);
}

#[target_feature(enable = "avx2")]
pub(crate) unsafe fn rescale_u16_avx2(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    let groups = row.len() / 32;
    let ptr = row.as_mut_ptr();

    let old = _mm256_set1_pd(old_maxval as f64);
    let new = _mm256_set1_pd(new_maxval as f64);

    // Eight big-endian samples in, eight big-endian samples out
    macro_rules! rescale_half {
        ($v:expr) => {{
            let v = sse::bswap16($v);
            let lo = rescale_pd(_mm_cvtepu16_epi32(v), old, new);
            let hi = rescale_pd(_mm_cvtepu16_epi32(_mm_srli_si128(v, 8)), old, new);
            sse::bswap16(_mm_packus_epi32(lo, hi))
        }};
    }

    for i in 0..groups {
        let p = ptr.add(i * 32);
        let v = _mm256_loadu_si256(p as *const __m256i);

        let lo = rescale_half!(_mm256_castsi256_si128(v));
        let hi = rescale_half!(_mm256_extracti128_si256(v, 1));

        _mm256_storeu_si256(p as *mut __m256i, _mm256_set_m128i(hi, lo));
    }

    scalar::rescale_u16(&mut row[groups * 32..], old_maxval, new_maxval);
}
