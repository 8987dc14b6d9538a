use crate::image::{PixelBuffer, SampleDepth};

/// Byte written into stride padding so tests can detect kernels touching it.
pub const PADDING_SENTINEL: u8 = 0xA5;

/// Deterministic sample for index `i`, spread over `[0, maxval]` and hitting
/// both extremes regularly.
pub fn pattern_sample(i: usize, maxval: u16) -> u16 {
    if i % 17 == 0 {
        return maxval;
    }
    if i % 19 == 0 {
        return 0;
    }
    let h = (i as u32).wrapping_mul(2_654_435_761).rotate_left(13);
    (h % (maxval as u32 + 1)) as u16
}

/// Encodes samples for `maxval` (big-endian when 16-bit).
pub fn encode_samples(samples: impl Iterator<Item = u16>, maxval: u16) -> Vec<u8> {
    match SampleDepth::from_maxval(maxval) {
        SampleDepth::U8 => samples.map(|s| s as u8).collect(),
        SampleDepth::U16 => samples.flat_map(u16::to_be_bytes).collect(),
    }
}

/// Row of `samples` pattern samples encoded for `maxval`.
pub fn pattern_row(samples: usize, maxval: u16) -> Vec<u8> {
    encode_samples((0..samples).map(|i| pattern_sample(i, maxval)), maxval)
}

/// Buffer filled with the sample pattern; padding holds [`PADDING_SENTINEL`].
pub fn pattern_buffer(width: u32, height: u32, maxval: u16) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(width, height, maxval).unwrap();
    buffer.bytes_mut().fill(PADDING_SENTINEL);

    let samples_per_row = width as usize * 3;
    for (y, row) in buffer.rows_mut().enumerate() {
        let start = y * samples_per_row;
        let samples = (start..start + samples_per_row).map(|i| pattern_sample(i, maxval));
        row.copy_from_slice(&encode_samples(samples, maxval));
    }
    buffer
}

/// True if every padding byte still holds [`PADDING_SENTINEL`].
pub fn padding_intact(buffer: &PixelBuffer) -> bool {
    let row_bytes = buffer.row_bytes();
    buffer
        .bytes()
        .chunks_exact(buffer.stride())
        .all(|row| row[row_bytes..].iter().all(|&b| b == PADDING_SENTINEL))
}
