use aligned_vec::{AVec, RuntimeAlign};

/// Default stride alignment, one cache line.
pub const DEFAULT_ALIGNMENT: usize = 64;

/// Pixel storage. The base address is aligned to at least [`DEFAULT_ALIGNMENT`].
pub(crate) type Storage = AVec<u8, RuntimeAlign>;

/// Rounds `n` up to a multiple of `alignment` (a power of two).
pub(crate) fn align_up(n: usize, alignment: usize) -> Option<usize> {
    debug_assert!(alignment.is_power_of_two());
    Some(n.checked_add(alignment - 1)? & !(alignment - 1))
}

/// Base-address alignment used when allocating storage for a stride alignment.
pub(crate) fn storage_alignment(alignment: usize) -> usize {
    alignment.max(DEFAULT_ALIGNMENT)
}

pub(crate) fn zeroed_storage(len: usize, alignment: usize) -> Storage {
    let mut storage = AVec::with_capacity(storage_alignment(alignment), len);
    storage.resize(len, 0);
    storage
}

pub(crate) fn storage_from_slice(bytes: &[u8], alignment: usize) -> Storage {
    let mut storage = AVec::with_capacity(storage_alignment(alignment), bytes.len());
    storage.extend_from_slice(bytes);
    storage
}

/// Copies `height` rows of `row_bytes` from `src` laid out with `src_stride`
/// into new storage laid out with `dst_stride`. Padding is zero-filled, never copied.
pub(crate) fn restride(
    src: &[u8],
    row_bytes: usize,
    height: usize,
    src_stride: usize,
    dst_stride: usize,
    alignment: usize,
) -> Storage {
    debug_assert!(src_stride >= row_bytes && dst_stride >= row_bytes);

    let mut dst = zeroed_storage(dst_stride * height, alignment);
    for y in 0..height {
        dst[y * dst_stride..y * dst_stride + row_bytes]
            .copy_from_slice(&src[y * src_stride..y * src_stride + row_bytes]);
    }
    dst
}

/// Strips stride padding, returning tightly packed rows.
pub(crate) fn strip_stride_padding(
    src: &[u8],
    row_bytes: usize,
    height: usize,
    stride: usize,
) -> Vec<u8> {
    if row_bytes == stride {
        return src[..row_bytes * height].to_vec();
    }

    let mut packed = Vec::with_capacity(row_bytes * height);
    for y in 0..height {
        packed.extend_from_slice(&src[y * stride..y * stride + row_bytes]);
    }
    packed
}
