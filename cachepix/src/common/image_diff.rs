//! Buffer comparison utilities for testing.

use crate::image::{PixelBuffer, SampleDepth};

fn assert_same_geometry(a: &PixelBuffer, b: &PixelBuffer) {
    assert_eq!(a.width(), b.width(), "width mismatch");
    assert_eq!(a.height(), b.height(), "height mismatch");
    assert_eq!(a.maxval(), b.maxval(), "maxval mismatch");
}

/// Maximum absolute per-sample difference. Only compares pixel data,
/// ignoring stride padding.
///
/// # Panics
/// Panics if the buffers differ in width, height or maxval.
pub fn max_sample_diff(a: &PixelBuffer, b: &PixelBuffer) -> u32 {
    assert_same_geometry(a, b);

    let depth = a.depth();
    a.rows()
        .zip(b.rows())
        .map(|(ra, rb)| row_max_diff(ra, rb, depth))
        .max()
        .unwrap_or(0)
}

/// Maximum absolute per-sample difference between two encoded rows.
pub fn row_max_diff(a: &[u8], b: &[u8], depth: SampleDepth) -> u32 {
    assert_eq!(a.len(), b.len(), "row length mismatch");

    match depth {
        SampleDepth::U8 => a
            .iter()
            .zip(b)
            .map(|(x, y)| x.abs_diff(*y) as u32)
            .max()
            .unwrap_or(0),
        SampleDepth::U16 => a
            .chunks_exact(2)
            .zip(b.chunks_exact(2))
            .map(|(x, y)| {
                u16::from_be_bytes([x[0], x[1]]).abs_diff(u16::from_be_bytes([y[0], y[1]])) as u32
            })
            .max()
            .unwrap_or(0),
    }
}

/// True if both buffers hold identical pixel data (ignoring stride padding).
///
/// # Panics
/// Panics if the buffers differ in width, height or maxval.
pub fn pixels_equal(a: &PixelBuffer, b: &PixelBuffer) -> bool {
    assert_same_geometry(a, b);
    a.rows().zip(b.rows()).all(|(ra, rb)| ra == rb)
}
