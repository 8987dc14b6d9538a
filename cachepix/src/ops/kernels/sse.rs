// SSE4.1 kernels for x86_64
//
// RGB deinterleaving uses SSSE3 byte shuffles with masks generated at compile
// time. The 8-bit luma path uses Q8 fixed point, everything else matches the
// scalar arithmetic exactly.

#![allow(unsafe_op_in_unsafe_fn)]

use std::arch::x86_64::*;

use super::{LUMA_B, LUMA_B_Q8, LUMA_G, LUMA_G_Q8, LUMA_R, LUMA_R_Q8, RowKernels, scalar};
use crate::ops::Backend;

pub(crate) static KERNELS: RowKernels = RowKernels {
    backend: Backend::Sse41,
    scale_u8,
    scale_u16,
    luma_u8,
    luma_u16,
    rescale_u8,
    rescale_u16,
};

// SAFETY (all wrappers below): `KERNELS` is only handed out by `kernels_for`
// after SSE4.1 and SSSE3 were detected.

fn scale_u8(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    unsafe { scale_u8_sse41(row, scale, bias, max) }
}

fn scale_u16(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    unsafe { scale_u16_sse41(row, scale, bias, max) }
}

fn luma_u8(src: &[u8], dst: &mut [u8], max: f32) {
    unsafe { luma_u8_sse41(src, dst, max) }
}

fn luma_u16(src: &[u8], dst: &mut [u8], max: f32) {
    unsafe { luma_u16_sse41(src, dst, max) }
}

fn rescale_u8(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    unsafe { rescale_u8_sse41(row, old_maxval, new_maxval) }
}

fn rescale_u16(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    unsafe { rescale_u16_sse41(row, old_maxval, new_maxval) }
}

// =============================================================================
// Shuffle masks
// =============================================================================

/// `[channel][chunk]`: gathers channel `c` of 16 RGB u8 pixels from three
/// 16-byte chunks. Lanes sourced from another chunk are -1 (zeroed).
const fn deinterleave_u8_masks() -> [[[i8; 16]; 3]; 3] {
    let mut masks = [[[-1i8; 16]; 3]; 3];
    let mut c = 0;
    while c < 3 {
        let mut k = 0;
        while k < 16 {
            let src = 3 * k + c;
            masks[c][src / 16][k] = (src % 16) as i8;
            k += 1;
        }
        c += 1;
    }
    masks
}

/// `[chunk]`: spreads 16 gray bytes to R, G and B of 16 pixels.
const fn interleave_u8_masks() -> [[i8; 16]; 3] {
    let mut masks = [[0i8; 16]; 3];
    let mut j = 0;
    while j < 3 {
        let mut p = 0;
        while p < 16 {
            masks[j][p] = ((16 * j + p) / 3) as i8;
            p += 1;
        }
        j += 1;
    }
    masks
}

/// `[channel][chunk]`: gathers channel `c` of 8 RGB big-endian u16 pixels
/// into native u16 lanes.
const fn deinterleave_u16_masks() -> [[[i8; 16]; 3]; 3] {
    let mut masks = [[[-1i8; 16]; 3]; 3];
    let mut c = 0;
    while c < 3 {
        let mut k = 0;
        while k < 8 {
            let sample = 3 * k + c;
            let offset = (sample % 8) * 2;
            masks[c][sample / 8][2 * k] = (offset + 1) as i8;
            masks[c][sample / 8][2 * k + 1] = offset as i8;
            k += 1;
        }
        c += 1;
    }
    masks
}

/// `[chunk]`: spreads 8 native u16 gray values to big-endian R, G and B.
const fn interleave_u16_masks() -> [[i8; 16]; 3] {
    let mut masks = [[0i8; 16]; 3];
    let mut j = 0;
    while j < 3 {
        let mut p = 0;
        while p < 16 {
            let sample = 8 * j + p / 2;
            masks[j][p] = (2 * (sample / 3) + (1 - p % 2)) as i8;
            p += 1;
        }
        j += 1;
    }
    masks
}

static DEINTERLEAVE_U8: [[[i8; 16]; 3]; 3] = deinterleave_u8_masks();
static INTERLEAVE_U8: [[i8; 16]; 3] = interleave_u8_masks();
static DEINTERLEAVE_U16: [[[i8; 16]; 3]; 3] = deinterleave_u16_masks();
static INTERLEAVE_U16: [[i8; 16]; 3] = interleave_u16_masks();

// =============================================================================
// Shared helpers (also used by the AVX2 kernels)
// =============================================================================

#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn load_mask(mask: &[i8; 16]) -> __m128i {
    _mm_loadu_si128(mask.as_ptr() as *const __m128i)
}

/// Swaps the bytes of every 16-bit lane.
#[inline]
#[target_feature(enable = "sse4.1")]
pub(super) unsafe fn bswap16(v: __m128i) -> __m128i {
    let mask = _mm_setr_epi8(1, 0, 3, 2, 5, 4, 7, 6, 9, 8, 11, 10, 13, 12, 15, 14);
    _mm_shuffle_epi8(v, mask)
}

#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn deinterleave(src: *const u8, masks: &[[[i8; 16]; 3]; 3]) -> [__m128i; 3] {
    let chunks = [
        _mm_loadu_si128(src as *const __m128i),
        _mm_loadu_si128(src.add(16) as *const __m128i),
        _mm_loadu_si128(src.add(32) as *const __m128i),
    ];

    let mut channels = [_mm_setzero_si128(); 3];
    for (channel, channel_masks) in channels.iter_mut().zip(masks) {
        for (chunk, mask) in chunks.iter().zip(channel_masks) {
            *channel = _mm_or_si128(*channel, _mm_shuffle_epi8(*chunk, load_mask(mask)));
        }
    }
    channels
}

#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn store_gray(dst: *mut u8, y: __m128i, masks: &[[i8; 16]; 3]) {
    for (j, mask) in masks.iter().enumerate() {
        _mm_storeu_si128(
            dst.add(16 * j) as *mut __m128i,
            _mm_shuffle_epi8(y, load_mask(mask)),
        );
    }
}

/// Splits 16 RGB u8 pixels (48 bytes at `src`) into R, G and B byte vectors.
#[inline]
#[target_feature(enable = "sse4.1")]
pub(super) unsafe fn deinterleave_rgb_u8(src: *const u8) -> [__m128i; 3] {
    deinterleave(src, &DEINTERLEAVE_U8)
}

/// Writes 16 gray bytes to all three channels (48 bytes at `dst`).
#[inline]
#[target_feature(enable = "sse4.1")]
pub(super) unsafe fn store_gray_u8(dst: *mut u8, y: __m128i) {
    store_gray(dst, y, &INTERLEAVE_U8);
}

/// Splits 8 RGB big-endian u16 pixels (48 bytes at `src`) into native u16
/// R, G and B vectors.
#[inline]
#[target_feature(enable = "sse4.1")]
pub(super) unsafe fn deinterleave_rgb_u16(src: *const u8) -> [__m128i; 3] {
    deinterleave(src, &DEINTERLEAVE_U16)
}

/// Writes 8 native u16 gray values big-endian to all three channels.
#[inline]
#[target_feature(enable = "sse4.1")]
pub(super) unsafe fn store_gray_u16(dst: *mut u8, y: __m128i) {
    store_gray(dst, y, &INTERLEAVE_U16);
}

/// clamp(v * scale + bias, 0, max), rounded half to even.
#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn scale_epi32(v: __m128i, scale: __m128, bias: __m128, max: __m128) -> __m128i {
    let f = _mm_add_ps(_mm_mul_ps(_mm_cvtepi32_ps(v), scale), bias);
    _mm_cvtps_epi32(_mm_min_ps(_mm_max_ps(f, _mm_setzero_ps()), max))
}

/// min(v * new / old, new), truncated.
#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn rescale_epi32(v: __m128i, old: __m128, new: __m128) -> __m128i {
    let q = _mm_div_ps(_mm_mul_ps(_mm_cvtepi32_ps(v), new), old);
    _mm_cvttps_epi32(_mm_min_ps(q, new))
}

/// min(v * new / old, new) on two lanes in f64, truncated into the low two i32 lanes.
#[inline]
#[target_feature(enable = "sse4.1")]
unsafe fn rescale_pd(v: __m128d, old: __m128d, new: __m128d) -> __m128i {
    let q = _mm_div_pd(_mm_mul_pd(v, new), old);
    _mm_cvttpd_epi32(_mm_min_pd(q, new))
}

// =============================================================================
// Scale / bias
// =============================================================================

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn scale_u8_sse41(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    let groups = row.len() / 16;
    let ptr = row.as_mut_ptr();

    let scale_v = _mm_set1_ps(scale);
    let bias_v = _mm_set1_ps(bias);
    let max_v = _mm_set1_ps(max);

    for i in 0..groups {
        let p = ptr.add(i * 16);
        let v = _mm_loadu_si128(p as *const __m128i);

        let a = scale_epi32(_mm_cvtepu8_epi32(v), scale_v, bias_v, max_v);
        let b = scale_epi32(_mm_cvtepu8_epi32(_mm_srli_si128(v, 4)), scale_v, bias_v, max_v);
        let c = scale_epi32(_mm_cvtepu8_epi32(_mm_srli_si128(v, 8)), scale_v, bias_v, max_v);
        let d = scale_epi32(_mm_cvtepu8_epi32(_mm_srli_si128(v, 12)), scale_v, bias_v, max_v);

        let out = _mm_packus_epi16(_mm_packus_epi32(a, b), _mm_packus_epi32(c, d));
        _mm_storeu_si128(p as *mut __m128i, out);
    }

    scalar::scale_u8(&mut row[groups * 16..], scale, bias, max);
}

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn scale_u16_sse41(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    let groups = row.len() / 16;
    let ptr = row.as_mut_ptr();

    let scale_v = _mm_set1_ps(scale);
    let bias_v = _mm_set1_ps(bias);
    let max_v = _mm_set1_ps(max);

    for i in 0..groups {
        let p = ptr.add(i * 16);
        let v = bswap16(_mm_loadu_si128(p as *const __m128i));

        let lo = scale_epi32(_mm_cvtepu16_epi32(v), scale_v, bias_v, max_v);
        let hi = scale_epi32(_mm_cvtepu16_epi32(_mm_srli_si128(v, 8)), scale_v, bias_v, max_v);

        _mm_storeu_si128(p as *mut __m128i, bswap16(_mm_packus_epi32(lo, hi)));
    }

    scalar::scale_u16(&mut row[groups * 16..], scale, bias, max);
}

// =============================================================================
// Luminance
// =============================================================================

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn luma_u8_sse41(src: &[u8], dst: &mut [u8], max: f32) {
    debug_assert_eq!(src.len(), dst.len());

    let groups = src.len() / 48;
    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    let wr = _mm_set1_epi16(LUMA_R_Q8 as i16);
    let wg = _mm_set1_epi16(LUMA_G_Q8 as i16);
    let wb = _mm_set1_epi16(LUMA_B_Q8 as i16);
    let round = _mm_set1_epi16(128);
    let max_v = _mm_set1_epi8(max as u8 as i8);

    // (77 R + 150 G + 29 B + 128) >> 8, at most 65408 so u16 lanes never wrap
    macro_rules! weighted {
        ($r:expr, $g:expr, $b:expr) => {{
            let sum = _mm_add_epi16(
                _mm_add_epi16(_mm_mullo_epi16($r, wr), _mm_mullo_epi16($g, wg)),
                _mm_mullo_epi16($b, wb),
            );
            _mm_srli_epi16(_mm_add_epi16(sum, round), 8)
        }};
    }

    for i in 0..groups {
        let [r, g, b] = deinterleave_rgb_u8(src_ptr.add(i * 48));

        let lo = weighted!(
            _mm_cvtepu8_epi16(r),
            _mm_cvtepu8_epi16(g),
            _mm_cvtepu8_epi16(b)
        );
        let hi = weighted!(
            _mm_cvtepu8_epi16(_mm_srli_si128(r, 8)),
            _mm_cvtepu8_epi16(_mm_srli_si128(g, 8)),
            _mm_cvtepu8_epi16(_mm_srli_si128(b, 8))
        );

        let y = _mm_min_epu8(_mm_packus_epi16(lo, hi), max_v);
        store_gray_u8(dst_ptr.add(i * 48), y);
    }

    scalar::luma_u8(&src[groups * 48..], &mut dst[groups * 48..], max);
}

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn luma_u16_sse41(src: &[u8], dst: &mut [u8], max: f32) {
    debug_assert_eq!(src.len(), dst.len());

    let groups = src.len() / 48;
    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    let wr = _mm_set1_ps(LUMA_R);
    let wg = _mm_set1_ps(LUMA_G);
    let wb = _mm_set1_ps(LUMA_B);
    let max_v = _mm_set1_ps(max);

    macro_rules! luma {
        ($r:expr, $g:expr, $b:expr) => {{
            let y = _mm_add_ps(
                _mm_add_ps(
                    _mm_mul_ps(_mm_cvtepi32_ps($r), wr),
                    _mm_mul_ps(_mm_cvtepi32_ps($g), wg),
                ),
                _mm_mul_ps(_mm_cvtepi32_ps($b), wb),
            );
            _mm_cvtps_epi32(_mm_min_ps(y, max_v))
        }};
    }

    for i in 0..groups {
        let [r, g, b] = deinterleave_rgb_u16(src_ptr.add(i * 48));

        let lo = luma!(
            _mm_cvtepu16_epi32(r),
            _mm_cvtepu16_epi32(g),
            _mm_cvtepu16_epi32(b)
        );
        let hi = luma!(
            _mm_cvtepu16_epi32(_mm_srli_si128(r, 8)),
            _mm_cvtepu16_epi32(_mm_srli_si128(g, 8)),
            _mm_cvtepu16_epi32(_mm_srli_si128(b, 8))
        );

        store_gray_u16(dst_ptr.add(i * 48), _mm_packus_epi32(lo, hi));
    }

    scalar::luma_u16(&src[groups * 48..], &mut dst[groups * 48..], max);
}

// =============================================================================
// Maxval rescale
// =============================================================================

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn rescale_u8_sse41(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    let groups = row.len() / 16;
    let ptr = row.as_mut_ptr();

    let old = _mm_set1_ps(old_maxval as f32);
    let new = _mm_set1_ps(new_maxval as f32);

    for i in 0..groups {
        let p = ptr.add(i * 16);
        let v = _mm_loadu_si128(p as *const __m128i);

        let a = rescale_epi32(_mm_cvtepu8_epi32(v), old, new);
        let b = rescale_epi32(_mm_cvtepu8_epi32(_mm_srli_si128(v, 4)), old, new);
        let c = rescale_epi32(_mm_cvtepu8_epi32(_mm_srli_si128(v, 8)), old, new);
        let d = rescale_epi32(_mm_cvtepu8_epi32(_mm_srli_si128(v, 12)), old, new);

        let out = _mm_packus_epi16(_mm_packus_epi32(a, b), _mm_packus_epi32(c, d));
        _mm_storeu_si128(p as *mut __m128i, out);
    }

    scalar::rescale_u8(&mut row[groups * 16..], old_maxval, new_maxval);
}

#[target_feature(enable = "sse4.1")]
pub(crate) unsafe fn rescale_u16_sse41(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    let groups = row.len() / 16;
    let ptr = row.as_mut_ptr();

    let old = _mm_set1_pd(old_maxval as f64);
    let new = _mm_set1_pd(new_maxval as f64);

    macro_rules! rescale4 {
        ($v:expr) => {{
            let v = $v;
            _mm_unpacklo_epi64(
                rescale_pd(_mm_cvtepi32_pd(v), old, new),
                rescale_pd(_mm_cvtepi32_pd(_mm_srli_si128(v, 8)), old, new),
            )
        }};
    }

    for i in 0..groups {
        let p = ptr.add(i * 16);
        let v = bswap16(_mm_loadu_si128(p as *const __m128i));

        let lo = rescale4!(_mm_cvtepu16_epi32(v));
        let hi = rescale4!(_mm_cvtepu16_epi32(_mm_srli_si128(v, 8)));

        _mm_storeu_si128(p as *mut __m128i, bswap16(_mm_packus_epi32(lo, hi)));
    }

    scalar::rescale_u16(&mut row[groups * 16..], old_maxval, new_maxval);
}
