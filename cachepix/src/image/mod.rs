mod io;
mod stride;
mod view;


use std::path::Path;

use crate::common::{Error, Result};

pub use stride::DEFAULT_ALIGNMENT;
pub use view::{PixelView, PixelViewMut};

use stride::{
    Storage, align_up, restride, storage_alignment, storage_from_slice, strip_stride_padding,
    zeroed_storage,
};

/// Fixed channel count: R, G, B.
pub const CHANNELS: usize = 3;

/// Sample width, decided by `maxval`.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum SampleDepth {
    /// One byte per sample, `maxval <= 255`.
    U8,
    /// Two big-endian bytes per sample, `maxval > 255`.
    U16,
}

impl SampleDepth {
    pub fn from_maxval(maxval: u16) -> Self {
        if maxval <= u8::MAX as u16 {
            SampleDepth::U8
        } else {
            SampleDepth::U16
        }
    }

    pub fn bytes_per_channel(self) -> usize {
        match self {
            SampleDepth::U8 => 1,
            SampleDepth::U16 => 2,
        }
    }
}

/// Geometry of a stride-aligned RGB buffer.
///
/// `stride` is always `align_up(row_bytes, alignment)`; the data size is
/// derived as `stride * height` and never stored.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub struct PixelDesc {
    pub width: u32,
    pub height: u32,
    pub maxval: u16,
    pub stride: usize,
    pub alignment: usize,
}

impl PixelDesc {
    pub fn new(width: u32, height: u32, maxval: u16) -> Result<Self> {
        Self::with_alignment(width, height, maxval, DEFAULT_ALIGNMENT)
    }

    pub fn with_alignment(width: u32, height: u32, maxval: u16, alignment: usize) -> Result<Self> {
        if width == 0 || height == 0 || maxval == 0 {
            return Err(Error::InvalidGeometry {
                width,
                height,
                maxval,
            });
        }
        if !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment));
        }

        let stride = row_bytes_for(width, maxval)
            .and_then(|row_bytes| align_up(row_bytes, alignment))
            .filter(|stride| stride.checked_mul(height as usize).is_some())
            .ok_or(Error::InvalidGeometry {
                width,
                height,
                maxval,
            })?;

        Ok(Self {
            width,
            height,
            maxval,
            stride,
            alignment,
        })
    }

    pub fn depth(&self) -> SampleDepth {
        SampleDepth::from_maxval(self.maxval)
    }

    pub fn bytes_per_channel(&self) -> usize {
        self.depth().bytes_per_channel()
    }

    pub fn bytes_per_pixel(&self) -> usize {
        CHANNELS * self.bytes_per_channel()
    }

    /// Returns the number of bytes per row without padding.
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    pub fn size_in_bytes(&self) -> usize {
        self.height as usize * self.stride
    }

    /// Byte offset of pixel `(x, y)`. Not bounds checked.
    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride + x as usize * self.bytes_per_pixel()
    }

    /// Returns true if stride equals row bytes (no padding).
    pub fn is_packed(&self) -> bool {
        self.stride == self.row_bytes()
    }

    /// Same width, height, maxval and data size.
    pub fn same_shape(&self, other: &PixelDesc) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.maxval == other.maxval
            && self.size_in_bytes() == other.size_in_bytes()
    }

    /// Checks the descriptor's own invariants. Does not look at any data.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 || self.maxval == 0 {
            return Err(Error::InvalidGeometry {
                width: self.width,
                height: self.height,
                maxval: self.maxval,
            });
        }
        if !self.alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(self.alignment));
        }

        let expected = expected_data_size(self.width, self.height, self.maxval, self.alignment)
            .ok_or_else(|| Error::Validation(format!("{} overflows usize", self)))?;
        let expected_stride = expected / self.height as usize;
        if self.stride != expected_stride {
            return Err(Error::Validation(format!(
                "stride {} does not match expected {} for {}",
                self.stride, expected_stride, self
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for PixelDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} maxval {} stride {} (align {})",
            self.width, self.height, self.maxval, self.stride, self.alignment
        )
    }
}

fn row_bytes_for(width: u32, maxval: u16) -> Option<usize> {
    (width as usize).checked_mul(CHANNELS * SampleDepth::from_maxval(maxval).bytes_per_channel())
}

/// `align_up(width * 3 * bpc, alignment) * height`, or `None` on overflow.
pub fn expected_data_size(width: u32, height: u32, maxval: u16, alignment: usize) -> Option<usize> {
    if !alignment.is_power_of_two() {
        return None;
    }
    let stride = align_up(row_bytes_for(width, maxval)?, alignment)?;
    stride.checked_mul(height as usize)
}

/// Owning RGB pixel buffer with stride-aligned rows.
///
/// Always valid: every constructor and mutator keeps the descriptor and the
/// storage in agreement.
pub struct PixelBuffer {
    desc: PixelDesc,
    bytes: Storage,
}

impl PixelBuffer {
    /// Zero-filled buffer with the default 64-byte stride alignment.
    pub fn new(width: u32, height: u32, maxval: u16) -> Result<PixelBuffer> {
        Self::new_empty(PixelDesc::new(width, height, maxval)?)
    }

    pub fn with_alignment(
        width: u32,
        height: u32,
        maxval: u16,
        alignment: usize,
    ) -> Result<PixelBuffer> {
        Self::new_empty(PixelDesc::with_alignment(width, height, maxval, alignment)?)
    }

    pub fn new_empty(desc: PixelDesc) -> Result<PixelBuffer> {
        desc.validate()?;

        let bytes = zeroed_storage(desc.size_in_bytes(), desc.alignment);

        Ok(PixelBuffer { desc, bytes })
    }

    /// Deep copy of a (possibly foreign) view.
    pub fn from_view(src: &PixelView<'_>) -> Result<PixelBuffer> {
        src.validate()?;

        let desc = *src.desc();
        let bytes = storage_from_slice(src.bytes(), desc.alignment);

        Ok(PixelBuffer { desc, bytes })
    }

    /// Builds a default-aligned buffer from tightly packed rows.
    pub fn from_packed(width: u32, height: u32, maxval: u16, packed: &[u8]) -> Result<PixelBuffer> {
        let desc = PixelDesc::new(width, height, maxval)?;
        let expected = desc.row_bytes() * desc.height as usize;
        if packed.len() != expected {
            return Err(Error::Validation(format!(
                "packed data is {} bytes, expected {} for {}x{} maxval {}",
                packed.len(),
                expected,
                width,
                height,
                maxval
            )));
        }

        let bytes = restride(
            packed,
            desc.row_bytes(),
            desc.height as usize,
            desc.row_bytes(),
            desc.stride,
            desc.alignment,
        );

        Ok(PixelBuffer { desc, bytes })
    }

    /// Parses a binary PPM (`P6`) stream into a default-aligned buffer.
    pub fn read_ppm<R: std::io::Read>(reader: R) -> Result<PixelBuffer> {
        io::read_ppm(reader)
    }

    pub fn read_file<P: AsRef<Path>>(path: P) -> Result<PixelBuffer> {
        io::load_ppm(path)
    }

    /// Writes a binary PPM with rows de-padded.
    pub fn write_ppm<W: std::io::Write>(&self, writer: W) -> Result<()> {
        io::write_ppm(self, writer)
    }

    /// Saves as PPM. Refuses to replace a non-empty file unless `overwrite` is set.
    pub fn save_file<P: AsRef<Path>>(&self, path: P, overwrite: bool) -> Result<()> {
        io::save_ppm(self, path, overwrite)
    }

    /// Returns the pixel rows without stride padding.
    pub fn to_packed(&self) -> Vec<u8> {
        strip_stride_padding(
            &self.bytes,
            self.desc.row_bytes(),
            self.desc.height as usize,
            self.desc.stride,
        )
    }

    pub fn desc(&self) -> &PixelDesc {
        &self.desc
    }

    pub fn width(&self) -> u32 {
        self.desc.width
    }

    pub fn height(&self) -> u32 {
        self.desc.height
    }

    pub fn maxval(&self) -> u16 {
        self.desc.maxval
    }

    pub fn stride(&self) -> usize {
        self.desc.stride
    }

    pub fn alignment(&self) -> usize {
        self.desc.alignment
    }

    pub fn depth(&self) -> SampleDepth {
        self.desc.depth()
    }

    pub fn data_size(&self) -> usize {
        self.desc.size_in_bytes()
    }

    pub fn row_bytes(&self) -> usize {
        self.desc.row_bytes()
    }

    pub fn bytes_per_channel(&self) -> usize {
        self.desc.bytes_per_channel()
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.desc.bytes_per_pixel()
    }

    pub fn is_packed(&self) -> bool {
        self.desc.is_packed()
    }

    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        self.desc.pixel_offset(x, y)
    }

    /// Returns the image bytes, padding included.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the image bytes as a mutable slice, padding included.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Non-owning alias of this buffer.
    pub fn view(&self) -> PixelView<'_> {
        PixelView::new(self.desc, &self.bytes)
    }

    pub fn view_mut(&mut self) -> PixelViewMut<'_> {
        PixelViewMut::new(self.desc, &mut self.bytes)
    }

    pub fn validate(&self) -> Result<()> {
        self.view().validate()
    }

    /// Iterates over the `row_bytes` prefix of every row.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_bytes = self.desc.row_bytes();
        self.bytes
            .chunks_exact(self.desc.stride)
            .map(move |row| &row[..row_bytes])
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        let row_bytes = self.desc.row_bytes();
        self.bytes
            .chunks_exact_mut(self.desc.stride)
            .map(move |row| &mut row[..row_bytes])
    }

    /// Replaces this buffer's storage and metadata with a deep copy of `src`.
    ///
    /// Storage is always reallocated, even when the sizes match.
    pub fn copy_from(&mut self, src: &PixelView<'_>) -> Result<()> {
        let copy = Self::from_view(src)?;
        tracing::debug!(from = %self.desc, to = %copy.desc, "Copied pixel buffer");
        *self = copy;
        Ok(())
    }

    /// Changes the stride alignment, re-laying out rows if the stride changes.
    ///
    /// Fails without touching the buffer if `alignment` is not a power of two.
    pub fn realign(&mut self, alignment: usize) -> Result<()> {
        if !alignment.is_power_of_two() {
            return Err(Error::InvalidAlignment(alignment));
        }
        self.validate()?;

        let desc = PixelDesc::with_alignment(
            self.desc.width,
            self.desc.height,
            self.desc.maxval,
            alignment,
        )?;

        if desc.stride == self.desc.stride && storage_alignment(self.desc.alignment) >= alignment {
            self.desc.alignment = alignment;
            return Ok(());
        }

        let bytes = restride(
            &self.bytes,
            self.desc.row_bytes(),
            self.desc.height as usize,
            self.desc.stride,
            desc.stride,
            alignment,
        );

        tracing::debug!(
            old_stride = self.desc.stride,
            new_stride = desc.stride,
            alignment,
            "Realigned pixel buffer"
        );

        self.desc = desc;
        self.bytes = bytes;

        Ok(())
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Result<[u16; 3]> {
        self.check_bounds(x, y)?;
        let offset = self.desc.pixel_offset(x, y);
        Ok(read_pixel(
            self.desc.depth(),
            &self.bytes[offset..offset + self.desc.bytes_per_pixel()],
        ))
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u16; 3]) -> Result<()> {
        self.check_bounds(x, y)?;
        self.check_samples(rgb)?;
        let offset = self.desc.pixel_offset(x, y);
        let bpp = self.desc.bytes_per_pixel();
        write_pixel(self.desc.depth(), &mut self.bytes[offset..offset + bpp], rgb);
        Ok(())
    }

    /// Sets every pixel to `rgb`. Padding is left untouched.
    pub fn fill(&mut self, rgb: [u16; 3]) -> Result<()> {
        self.check_samples(rgb)?;

        let depth = self.desc.depth();
        let bpp = self.desc.bytes_per_pixel();
        let mut pattern = [0u8; 6];
        write_pixel(depth, &mut pattern[..bpp], rgb);

        for row in self.rows_mut() {
            for pixel in row.chunks_exact_mut(bpp) {
                pixel.copy_from_slice(&pattern[..bpp]);
            }
        }

        Ok(())
    }

    /// Relabels the ceiling after an in-place rescale within the same sample width.
    pub(crate) fn set_maxval(&mut self, maxval: u16) {
        debug_assert_eq!(SampleDepth::from_maxval(maxval), self.desc.depth());
        self.desc.maxval = maxval;
    }

    fn check_bounds(&self, x: u32, y: u32) -> Result<()> {
        if x >= self.desc.width || y >= self.desc.height {
            return Err(Error::OutOfBounds {
                x,
                y,
                width: self.desc.width,
                height: self.desc.height,
            });
        }
        Ok(())
    }

    fn check_samples(&self, rgb: [u16; 3]) -> Result<()> {
        if let Some(sample) = rgb.iter().find(|&&s| s > self.desc.maxval) {
            return Err(Error::InvalidParameter(format!(
                "sample {} exceeds maxval {}",
                sample, self.desc.maxval
            )));
        }
        Ok(())
    }
}

impl Clone for PixelBuffer {
    fn clone(&self) -> Self {
        Self {
            desc: self.desc,
            bytes: storage_from_slice(&self.bytes, self.desc.alignment),
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("desc", &self.desc)
            .finish_non_exhaustive()
    }
}

fn read_pixel(depth: SampleDepth, pixel: &[u8]) -> [u16; 3] {
    match depth {
        SampleDepth::U8 => [pixel[0] as u16, pixel[1] as u16, pixel[2] as u16],
        SampleDepth::U16 => [
            u16::from_be_bytes([pixel[0], pixel[1]]),
            u16::from_be_bytes([pixel[2], pixel[3]]),
            u16::from_be_bytes([pixel[4], pixel[5]]),
        ],
    }
}

fn write_pixel(depth: SampleDepth, pixel: &mut [u8], rgb: [u16; 3]) {
    match depth {
        SampleDepth::U8 => {
            for (dst, &s) in pixel.iter_mut().zip(&rgb) {
                *dst = s as u8;
            }
        }
        SampleDepth::U16 => {
            for (dst, &s) in pixel.chunks_exact_mut(2).zip(&rgb) {
                dst.copy_from_slice(&s.to_be_bytes());
            }
        }
    }
}
