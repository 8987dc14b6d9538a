//! AVX2 kernels called directly.

use super::{check_luma, check_rescale, check_scale};
use crate::image::SampleDepth;
use crate::ops::kernels::avx;
use common::cpu_features;

// =============================================================================
// Scale / bias
// =============================================================================

#[test]
fn test_avx_scale_u8_matches_scalar() {
    if !cpu_features::has_avx2() {
        return;
    }
    check_scale("avx scale_u8", SampleDepth::U8, |row, s, b, m| unsafe {
        avx::scale_u8_avx2(row, s, b, m)
    });
}

#[test]
fn test_avx_scale_u16_matches_scalar() {
    if !cpu_features::has_avx2() {
        return;
    }
    check_scale("avx scale_u16", SampleDepth::U16, |row, s, b, m| unsafe {
        avx::scale_u16_avx2(row, s, b, m)
    });
}

// =============================================================================
// Luma
// =============================================================================

#[test]
fn test_avx_luma_u8_within_tolerance() {
    if !cpu_features::has_avx2() {
        return;
    }
    check_luma("avx luma_u8", SampleDepth::U8, 0, |src, dst, m| unsafe {
        avx::luma_u8_avx2(src, dst, m)
    });
}

#[test]
fn test_avx_luma_u16_matches_scalar() {
    if !cpu_features::has_avx2() {
        return;
    }
    check_luma("avx luma_u16", SampleDepth::U16, 0, |src, dst, m| unsafe {
        avx::luma_u16_avx2(src, dst, m)
    });
}

// =============================================================================
// Maxval rescale
// =============================================================================

#[test]
fn test_avx_rescale_u8_matches_scalar() {
    if !cpu_features::has_avx2() {
        return;
    }
    check_rescale("avx rescale_u8", SampleDepth::U8, |row, old, new| unsafe {
        avx::rescale_u8_avx2(row, old, new)
    });
}

#[test]
fn test_avx_rescale_u16_matches_scalar() {
    if !cpu_features::has_avx2() {
        return;
    }
    check_rescale("avx rescale_u16", SampleDepth::U16, |row, old, new| unsafe {
        avx::rescale_u16_avx2(row, old, new)
    });
}
