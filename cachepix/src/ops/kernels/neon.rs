// NEON kernels for aarch64
//
// 8-bit luma uses structured loads (`vld3q_u8`) and Q8 fixed point. 16-bit
// pixels are gathered with table lookups over 48 bytes, so no load needs
// 2-byte alignment.

#![allow(unsafe_op_in_unsafe_fn)]

use std::arch::aarch64::*;

use super::{LUMA_B, LUMA_B_Q8, LUMA_G, LUMA_G_Q8, LUMA_R, LUMA_R_Q8, RowKernels, scalar};
use crate::ops::Backend;

pub(crate) static KERNELS: RowKernels = RowKernels {
    backend: Backend::Neon,
    scale_u8,
    scale_u16,
    luma_u8,
    luma_u16,
    rescale_u8,
    rescale_u16,
};

// SAFETY (all wrappers below): `KERNELS` is only handed out by `kernels_for`
// after NEON was detected.

fn scale_u8(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    unsafe { scale_u8_neon(row, scale, bias, max) }
}

fn scale_u16(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    unsafe { scale_u16_neon(row, scale, bias, max) }
}

fn luma_u8(src: &[u8], dst: &mut [u8], max: f32) {
    unsafe { luma_u8_neon(src, dst, max) }
}

fn luma_u16(src: &[u8], dst: &mut [u8], max: f32) {
    unsafe { luma_u16_neon(src, dst, max) }
}

fn rescale_u8(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    unsafe { rescale_u8_neon(row, old_maxval, new_maxval) }
}

fn rescale_u16(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    unsafe { rescale_u16_neon(row, old_maxval, new_maxval) }
}

// =============================================================================
// Table lookup indices
// =============================================================================

/// `[channel]`: indices into 48 bytes of big-endian RGB u16 that gather one
/// channel of 8 pixels into native u16 lanes.
const fn gather_u16_indices() -> [[u8; 16]; 3] {
    let mut idx = [[0u8; 16]; 3];
    let mut c = 0;
    while c < 3 {
        let mut k = 0;
        while k < 8 {
            let sample = 3 * k + c;
            idx[c][2 * k] = (2 * sample + 1) as u8;
            idx[c][2 * k + 1] = (2 * sample) as u8;
            k += 1;
        }
        c += 1;
    }
    idx
}

/// `[chunk]`: spreads 8 native u16 gray values to big-endian R, G and B.
const fn spread_u16_indices() -> [[u8; 16]; 3] {
    let mut idx = [[0u8; 16]; 3];
    let mut j = 0;
    while j < 3 {
        let mut p = 0;
        while p < 16 {
            let sample = 8 * j + p / 2;
            idx[j][p] = (2 * (sample / 3) + (1 - p % 2)) as u8;
            p += 1;
        }
        j += 1;
    }
    idx
}

static GATHER_U16: [[u8; 16]; 3] = gather_u16_indices();
static SPREAD_U16: [[u8; 16]; 3] = spread_u16_indices();

// =============================================================================
// Helpers
// =============================================================================

#[inline]
#[target_feature(enable = "neon")]
unsafe fn bswap16(v: uint8x16_t) -> uint8x16_t {
    vrev16q_u8(v)
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn scale_u32x4(
    v: uint32x4_t,
    scale: float32x4_t,
    bias: float32x4_t,
    max: float32x4_t,
) -> uint32x4_t {
    let f = vaddq_f32(vmulq_f32(vcvtq_f32_u32(v), scale), bias);
    vcvtnq_u32_f32(vminq_f32(vmaxq_f32(f, vdupq_n_f32(0.0)), max))
}

#[inline]
#[target_feature(enable = "neon")]
unsafe fn rescale_u32x4(v: uint32x4_t, old: float32x4_t, new: float32x4_t) -> uint32x4_t {
    let q = vdivq_f32(vmulq_f32(vcvtq_f32_u32(v), new), old);
    vcvtq_u32_f32(vminq_f32(q, new))
}

/// Rescales four u32 lanes through f64, truncating.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn rescale_u32x4_f64(v: uint32x4_t, old: float64x2_t, new: float64x2_t) -> uint32x4_t {
    let half = |d: uint64x2_t| {
        let q = vdivq_f64(vmulq_f64(vcvtq_f64_u64(d), new), old);
        vmovn_u64(vcvtq_u64_f64(vminq_f64(q, new)))
    };
    vcombine_u32(
        half(vmovl_u32(vget_low_u32(v))),
        half(vmovl_u32(vget_high_u32(v))),
    )
}

/// Applies `f` to the four u32 quarters of sixteen u8 lanes and narrows back.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn map_u8x16(v: uint8x16_t, f: impl Fn(uint32x4_t) -> uint32x4_t) -> uint8x16_t {
    let lo = vmovl_u8(vget_low_u8(v));
    let hi = vmovl_u8(vget_high_u8(v));

    let lo = vcombine_u16(
        vmovn_u32(f(vmovl_u16(vget_low_u16(lo)))),
        vmovn_u32(f(vmovl_u16(vget_high_u16(lo)))),
    );
    let hi = vcombine_u16(
        vmovn_u32(f(vmovl_u16(vget_low_u16(hi)))),
        vmovn_u32(f(vmovl_u16(vget_high_u16(hi)))),
    );
    vcombine_u8(vmovn_u16(lo), vmovn_u16(hi))
}

/// Applies `f` to eight big-endian u16 samples held in sixteen bytes.
#[inline]
#[target_feature(enable = "neon")]
unsafe fn map_be_u16x8(v: uint8x16_t, f: impl Fn(uint32x4_t) -> uint32x4_t) -> uint8x16_t {
    let v = vreinterpretq_u16_u8(bswap16(v));
    let out = vcombine_u16(
        vmovn_u32(f(vmovl_u16(vget_low_u16(v)))),
        vmovn_u32(f(vmovl_u16(vget_high_u16(v)))),
    );
    bswap16(vreinterpretq_u8_u16(out))
}

// =============================================================================
// Scale / bias
// =============================================================================

#[target_feature(enable = "neon")]
pub(crate) unsafe fn scale_u8_neon(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    let groups = row.len() / 16;
    let ptr = row.as_mut_ptr();

    let scale_v = vdupq_n_f32(scale);
    let bias_v = vdupq_n_f32(bias);
    let max_v = vdupq_n_f32(max);

    for i in 0..groups {
        let p = ptr.add(i * 16);
        let out = map_u8x16(vld1q_u8(p), |v| scale_u32x4(v, scale_v, bias_v, max_v));
        vst1q_u8(p, out);
    }

    scalar::scale_u8(&mut row[groups * 16..], scale, bias, max);
}

#[target_feature(enable = "neon")]
pub(crate) unsafe fn scale_u16_neon(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    let groups = row.len() / 16;
    let ptr = row.as_mut_ptr();

    let scale_v = vdupq_n_f32(scale);
    let bias_v = vdupq_n_f32(bias);
    let max_v = vdupq_n_f32(max);

    for i in 0..groups {
        let p = ptr.add(i * 16);
        let out = map_be_u16x8(vld1q_u8(p), |v| scale_u32x4(v, scale_v, bias_v, max_v));
        vst1q_u8(p, out);
    }

    scalar::scale_u16(&mut row[groups * 16..], scale, bias, max);
}

// =============================================================================
// Luminance
// =============================================================================

#[target_feature(enable = "neon")]
pub(crate) unsafe fn luma_u8_neon(src: &[u8], dst: &mut [u8], max: f32) {
    debug_assert_eq!(src.len(), dst.len());

    let groups = src.len() / 48;
    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    let wr = vdup_n_u8(LUMA_R_Q8 as u8);
    let wg = vdup_n_u8(LUMA_G_Q8 as u8);
    let wb = vdup_n_u8(LUMA_B_Q8 as u8);
    let max_v = vdupq_n_u8(max as u8);

    // (77 R + 150 G + 29 B + 128) >> 8
    macro_rules! weighted {
        ($r:expr, $g:expr, $b:expr) => {{
            let acc = vmull_u8($r, wr);
            let acc = vmlal_u8(acc, $g, wg);
            let acc = vmlal_u8(acc, $b, wb);
            vrshrn_n_u16::<8>(acc)
        }};
    }

    for i in 0..groups {
        let px = vld3q_u8(src_ptr.add(i * 48));

        let lo = weighted!(
            vget_low_u8(px.0),
            vget_low_u8(px.1),
            vget_low_u8(px.2)
        );
        let hi = weighted!(
            vget_high_u8(px.0),
            vget_high_u8(px.1),
            vget_high_u8(px.2)
        );

        let y = vminq_u8(vcombine_u8(lo, hi), max_v);
        vst3q_u8(dst_ptr.add(i * 48), uint8x16x3_t(y, y, y));
    }

    scalar::luma_u8(&src[groups * 48..], &mut dst[groups * 48..], max);
}

#[target_feature(enable = "neon")]
pub(crate) unsafe fn luma_u16_neon(src: &[u8], dst: &mut [u8], max: f32) {
    debug_assert_eq!(src.len(), dst.len());

    let groups = src.len() / 48;
    let src_ptr = src.as_ptr();
    let dst_ptr = dst.as_mut_ptr();

    let wr = vdupq_n_f32(LUMA_R);
    let wg = vdupq_n_f32(LUMA_G);
    let wb = vdupq_n_f32(LUMA_B);
    let max_v = vdupq_n_f32(max);

    let gather = [
        vld1q_u8(GATHER_U16[0].as_ptr()),
        vld1q_u8(GATHER_U16[1].as_ptr()),
        vld1q_u8(GATHER_U16[2].as_ptr()),
    ];
    let spread = [
        vld1q_u8(SPREAD_U16[0].as_ptr()),
        vld1q_u8(SPREAD_U16[1].as_ptr()),
        vld1q_u8(SPREAD_U16[2].as_ptr()),
    ];

    macro_rules! luma {
        ($r:expr, $g:expr, $b:expr) => {{
            let y = vaddq_f32(
                vaddq_f32(
                    vmulq_f32(vcvtq_f32_u32($r), wr),
                    vmulq_f32(vcvtq_f32_u32($g), wg),
                ),
                vmulq_f32(vcvtq_f32_u32($b), wb),
            );
            vmovn_u32(vcvtnq_u32_f32(vminq_f32(y, max_v)))
        }};
    }

    for i in 0..groups {
        let s = src_ptr.add(i * 48);
        let table = uint8x16x3_t(vld1q_u8(s), vld1q_u8(s.add(16)), vld1q_u8(s.add(32)));

        let r = vreinterpretq_u16_u8(vqtbl3q_u8(table, gather[0]));
        let g = vreinterpretq_u16_u8(vqtbl3q_u8(table, gather[1]));
        let b = vreinterpretq_u16_u8(vqtbl3q_u8(table, gather[2]));

        let lo = luma!(
            vmovl_u16(vget_low_u16(r)),
            vmovl_u16(vget_low_u16(g)),
            vmovl_u16(vget_low_u16(b))
        );
        let hi = luma!(
            vmovl_u16(vget_high_u16(r)),
            vmovl_u16(vget_high_u16(g)),
            vmovl_u16(vget_high_u16(b))
        );
        let y = vreinterpretq_u8_u16(vcombine_u16(lo, hi));

        let d = dst_ptr.add(i * 48);
        vst1q_u8(d, vqtbl1q_u8(y, spread[0]));
        vst1q_u8(d.add(16), vqtbl1q_u8(y, spread[1]));
        vst1q_u8(d.add(32), vqtbl1q_u8(y, spread[2]));
    }

    scalar::luma_u16(&src[groups * 48..], &mut dst[groups * 48..], max);
}

// =============================================================================
// Maxval rescale
// =============================================================================

#[target_feature(enable = "neon")]
pub(crate) unsafe fn rescale_u8_neon(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    let groups = row.len() / 16;
    let ptr = row.as_mut_ptr();

    let old = vdupq_n_f32(old_maxval as f32);
    let new = vdupq_n_f32(new_maxval as f32);

    for i in 0..groups {
        let p = ptr.add(i * 16);
        let out = map_u8x16(vld1q_u8(p), |v| rescale_u32x4(v, old, new));
        vst1q_u8(p, out);
    }

    scalar::rescale_u8(&mut row[groups * 16..], old_maxval, new_maxval);
}

#[target_feature(enable = "neon")]
pub(crate) unsafe fn rescale_u16_neon(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    let groups = row.len() / 16;
    let ptr = row.as_mut_ptr();

    let old = vdupq_n_f64(old_maxval as f64);
    let new = vdupq_n_f64(new_maxval as f64);

    for i in 0..groups {
        let p = ptr.add(i * 16);
        let out = map_be_u16x8(vld1q_u8(p), |v| rescale_u32x4_f64(v, old, new));
        vst1q_u8(p, out);
    }

    scalar::rescale_u16(&mut row[groups * 16..], old_maxval, new_maxval);
}
