// Portable reference kernels
//
// These define the exact results every accelerated backend must reproduce
// (within ±1 for luma).

use super::{LUMA_B, LUMA_G, LUMA_R, RowKernels};
use crate::ops::Backend;

pub(crate) static KERNELS: RowKernels = RowKernels {
    backend: Backend::Scalar,
    scale_u8,
    scale_u16,
    luma_u8,
    luma_u16,
    rescale_u8,
    rescale_u16,
};

#[inline]
pub(crate) fn scale_sample(v: f32, scale: f32, bias: f32, max: f32) -> f32 {
    (v * scale + bias).clamp(0.0, max).round_ties_even()
}

#[inline]
pub(crate) fn luma(r: f32, g: f32, b: f32, max: f32) -> f32 {
    (r * LUMA_R + g * LUMA_G + b * LUMA_B)
        .min(max)
        .round_ties_even()
}

#[inline]
pub(crate) fn rescale_sample(v: u32, old_maxval: u32, new_maxval: u32) -> u32 {
    (v * new_maxval / old_maxval).min(new_maxval)
}

pub(crate) fn scale_u8(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    for v in row.iter_mut() {
        *v = scale_sample(*v as f32, scale, bias, max) as u8;
    }
}

pub(crate) fn scale_u16(row: &mut [u8], scale: f32, bias: f32, max: f32) {
    for chunk in row.chunks_exact_mut(2) {
        let v = u16::from_be_bytes([chunk[0], chunk[1]]);
        let out = scale_sample(v as f32, scale, bias, max) as u16;
        chunk.copy_from_slice(&out.to_be_bytes());
    }
}

pub(crate) fn luma_u8(src: &[u8], dst: &mut [u8], max: f32) {
    debug_assert_eq!(src.len(), dst.len());

    for (s, d) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
        let y = luma(s[0] as f32, s[1] as f32, s[2] as f32, max) as u8;
        d.fill(y);
    }
}

pub(crate) fn luma_u16(src: &[u8], dst: &mut [u8], max: f32) {
    debug_assert_eq!(src.len(), dst.len());

    for (s, d) in src.chunks_exact(6).zip(dst.chunks_exact_mut(6)) {
        let r = u16::from_be_bytes([s[0], s[1]]) as f32;
        let g = u16::from_be_bytes([s[2], s[3]]) as f32;
        let b = u16::from_be_bytes([s[4], s[5]]) as f32;
        let y = (luma(r, g, b, max) as u16).to_be_bytes();
        for sample in d.chunks_exact_mut(2) {
            sample.copy_from_slice(&y);
        }
    }
}

pub(crate) fn rescale_u8(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    let (old, new) = (old_maxval as u32, new_maxval as u32);
    for v in row.iter_mut() {
        *v = rescale_sample(*v as u32, old, new) as u8;
    }
}

pub(crate) fn rescale_u16(row: &mut [u8], old_maxval: u16, new_maxval: u16) {
    let (old, new) = (old_maxval as u32, new_maxval as u32);
    for chunk in row.chunks_exact_mut(2) {
        let v = u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
        let out = rescale_sample(v, old, new) as u16;
        chunk.copy_from_slice(&out.to_be_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_rounds_half_to_even() {
        let mut row = [1, 3, 5, 200];
        scale_u8(&mut row, 0.5, 0.0, 255.0);
        // 0.5 -> 0, 1.5 -> 2, 2.5 -> 2
        assert_eq!(row, [0, 2, 2, 100]);
    }

    #[test]
    fn scale_clamps_to_ceiling() {
        let mut row = [200, 0, 10];
        scale_u8(&mut row, 2.0, 10.0, 255.0);
        assert_eq!(row, [255, 10, 30]);

        let mut row = [100, 50];
        scale_u8(&mut row, 1.0, -60.0, 255.0);
        assert_eq!(row, [40, 0]);

        let mut row = [0x03, 0xE8, 0x00, 0x10];
        scale_u16(&mut row, 2.0, 0.0, 1023.0);
        // 1000 * 2 clamps to the 16-bit ceiling, 16 * 2 = 32
        assert_eq!(row, [0x03, 0xFF, 0x00, 0x20]);
    }

    #[test]
    fn scale_u16_is_big_endian() {
        let mut row = [0x01, 0x00, 0xFF, 0xFF];
        scale_u16(&mut row, 2.0, 1.0, 65535.0);
        // 256 * 2 + 1 = 513 = 0x0201, 65535 clamps
        assert_eq!(row, [0x02, 0x01, 0xFF, 0xFF]);
    }

    #[test]
    fn luma_reference_values() {
        let src = [255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let mut dst = [0; 12];
        luma_u8(&src, &mut dst, 255.0);
        assert_eq!(dst, [76, 76, 76, 150, 150, 150, 29, 29, 29, 255, 255, 255]);
    }

    #[test]
    fn luma_u16_writes_all_channels() {
        let src = [0x03, 0xFF, 0x03, 0xFF, 0x03, 0xFF];
        let mut dst = [0; 6];
        luma_u16(&src, &mut dst, 1023.0);
        assert_eq!(dst, [0x03, 0xFF, 0x03, 0xFF, 0x03, 0xFF]);
    }

    #[test]
    fn rescale_floors_and_clamps() {
        let mut row = [0, 1, 127, 255];
        rescale_u8(&mut row, 255, 15);
        assert_eq!(row, [0, 0, 7, 15]);

        // samples above the old maxval saturate at the new one
        let mut row = [200];
        rescale_u8(&mut row, 100, 50);
        assert_eq!(row, [50]);

        let mut row = [0x00, 0xFF];
        rescale_u16(&mut row, 255, 1023);
        assert_eq!(row, [0x03, 0xFF]);
    }
}
