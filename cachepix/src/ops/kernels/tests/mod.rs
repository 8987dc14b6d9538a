//! Row kernel correctness tests
//!
//! Every accelerated kernel is compared against the scalar reference on rows
//! whose lengths exercise full vector groups and scalar tails.
//!
//! Test modules:
//! - `common_tests`: dispatch tables, run through whatever this CPU supports
//! - `sse_tests`: x86_64 SSE4.1 kernels called directly
//! - `avx_tests`: x86_64 AVX2 kernels called directly
//! - `neon_tests`: aarch64 NEON kernels called directly



#[cfg(target_arch = "x86_64")]
mod avx_tests;


use super::scalar;
use crate::common::test_utils::{PADDING_SENTINEL, pattern_row};
use crate::common::image_diff::row_max_diff;
use crate::image::{CHANNELS, SampleDepth};

/// Pixel widths around every group size:
/// - 1, 7: shorter than any vector group
/// - 15, 16, 17: around the 16 px luma group
/// - 31, 32, 33: around the AVX2 scale group for 8-bit rows
/// - 100: several groups plus a tail
pub const TEST_WIDTHS: [usize; 9] = [1, 7, 15, 16, 17, 31, 32, 33, 100];

pub const SCALE_PARAMS: [(f32, f32); 5] = [
    (1.0, 0.0),
    (1.7, -12.3),
    (0.5, 0.0),
    (-1.0, 255.0),
    (3.0, 0.5),
];

pub fn maxvals_for(depth: SampleDepth) -> &'static [u16] {
    match depth {
        SampleDepth::U8 => &[1, 100, 255],
        SampleDepth::U16 => &[256, 1023, 65535],
    }
}

pub fn rescale_pairs_for(depth: SampleDepth) -> &'static [(u16, u16)] {
    match depth {
        SampleDepth::U8 => &[(255, 15), (255, 254), (100, 255), (1, 255), (255, 1), (7, 200)],
        SampleDepth::U16 => &[
            (65535, 256),
            (1023, 65535),
            (65535, 65534),
            (300, 4095),
            (4095, 1000),
        ],
    }
}

/// Pattern row for `width` pixels followed by a sentinel-filled tail.
///
/// Kernels get only the pixel prefix; the tail catches writes past it.
pub fn guarded_row(width: usize, maxval: u16) -> (Vec<u8>, usize) {
    let mut row = pattern_row(width * CHANNELS, maxval);
    let len = row.len();
    row.extend_from_slice(&[PADDING_SENTINEL; 64]);
    (row, len)
}

fn assert_tail_intact(row: &[u8], len: usize, label: &str) {
    assert!(
        row[len..].iter().all(|&b| b == PADDING_SENTINEL),
        "{}: wrote past the row",
        label
    );
}

fn assert_within(expected: &[u8], actual: &[u8], depth: SampleDepth, tolerance: u32, label: &str) {
    let diff = row_max_diff(expected, actual, depth);
    assert!(
        diff <= tolerance,
        "{}: max diff {} exceeds {}",
        label,
        diff,
        tolerance
    );
}

pub fn check_scale(name: &str, depth: SampleDepth, kernel: impl Fn(&mut [u8], f32, f32, f32)) {
    let reference = match depth {
        SampleDepth::U8 => scalar::scale_u8,
        SampleDepth::U16 => scalar::scale_u16,
    };

    for &maxval in maxvals_for(depth) {
        for width in TEST_WIDTHS {
            for (scale, bias) in SCALE_PARAMS {
                let label = format!(
                    "{} width={} maxval={} scale={} bias={}",
                    name, width, maxval, scale, bias
                );
                // 8-bit rows clamp to the sample range, 16-bit rows to maxval
                let max = match depth {
                    SampleDepth::U8 => u8::MAX as f32,
                    SampleDepth::U16 => maxval as f32,
                };

                let (mut expected, len) = guarded_row(width, maxval);
                reference(&mut expected[..len], scale, bias, max);

                let (mut actual, _) = guarded_row(width, maxval);
                kernel(&mut actual[..len], scale, bias, max);

                assert_within(&expected[..len], &actual[..len], depth, 0, &label);
                assert_tail_intact(&actual, len, &label);
            }
        }
    }
}

pub fn check_luma(
    name: &str,
    depth: SampleDepth,
    tolerance: u32,
    kernel: impl Fn(&[u8], &mut [u8], f32),
) {
    let reference = match depth {
        SampleDepth::U8 => scalar::luma_u8,
        SampleDepth::U16 => scalar::luma_u16,
    };

    for &maxval in maxvals_for(depth) {
        for width in TEST_WIDTHS {
            let label = format!("{} width={} maxval={}", name, width, maxval);
            let max = maxval as f32;
            let (src, len) = guarded_row(width, maxval);

            let mut expected = vec![0u8; len];
            reference(&src[..len], &mut expected, max);

            let mut actual = vec![PADDING_SENTINEL; len + 64];
            kernel(&src[..len], &mut actual[..len], max);

            assert_within(&expected, &actual[..len], depth, tolerance, &label);
            assert_tail_intact(&actual, len, &label);
        }
    }
}

pub fn check_rescale(name: &str, depth: SampleDepth, kernel: impl Fn(&mut [u8], u16, u16)) {
    let reference = match depth {
        SampleDepth::U8 => scalar::rescale_u8,
        SampleDepth::U16 => scalar::rescale_u16,
    };

    for &(old, new) in rescale_pairs_for(depth) {
        for width in TEST_WIDTHS {
            let label = format!("{} width={} {} -> {}", name, width, old, new);

            let (mut expected, len) = guarded_row(width, old);
            reference(&mut expected[..len], old, new);

            let (mut actual, _) = guarded_row(width, old);
            kernel(&mut actual[..len], old, new);

            assert_within(&expected[..len], &actual[..len], depth, 0, &label);
            assert_tail_intact(&actual, len, &label);
        }
    }
}
