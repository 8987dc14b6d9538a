use crate::common::{Error, Result};
use crate::image::{PixelBuffer, PixelDesc};

/// Borrowed, read-only alias of pixel storage.
///
/// Views over a [`PixelBuffer`] are always valid. Views built with
/// [`PixelView::new`] over foreign bytes are checked by [`PixelView::validate`],
/// which every transform calls first.
#[derive(Clone, Copy, Debug)]
pub struct PixelView<'a> {
    desc: PixelDesc,
    bytes: &'a [u8],
}

/// Borrowed, mutable alias of pixel storage.
#[derive(Debug)]
pub struct PixelViewMut<'a> {
    desc: PixelDesc,
    bytes: &'a mut [u8],
}

fn validate_storage(desc: &PixelDesc, len: usize) -> Result<()> {
    desc.validate()?;

    if len != desc.size_in_bytes() {
        return Err(Error::Validation(format!(
            "data is {} bytes, expected {} for {}",
            len,
            desc.size_in_bytes(),
            desc
        )));
    }

    Ok(())
}

impl<'a> PixelView<'a> {
    pub fn new(desc: PixelDesc, bytes: &'a [u8]) -> Self {
        Self { desc, bytes }
    }

    pub fn desc(&self) -> &PixelDesc {
        &self.desc
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn validate(&self) -> Result<()> {
        validate_storage(&self.desc, self.bytes.len())
    }

    /// Row prefixes without padding. The view must be valid.
    pub(crate) fn rows(&self) -> impl Iterator<Item = &'a [u8]> + use<'a> {
        let row_bytes = self.desc.row_bytes();
        self.bytes
            .chunks_exact(self.desc.stride)
            .map(move |row| &row[..row_bytes])
    }

    pub fn to_buffer(&self) -> Result<PixelBuffer> {
        PixelBuffer::from_view(self)
    }
}

impl<'a> PixelViewMut<'a> {
    pub fn new(desc: PixelDesc, bytes: &'a mut [u8]) -> Self {
        Self { desc, bytes }
    }

    pub fn desc(&self) -> &PixelDesc {
        &self.desc
    }

    pub fn bytes(&self) -> &[u8] {
        self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        self.bytes
    }

    pub fn as_view(&self) -> PixelView<'_> {
        PixelView::new(self.desc, self.bytes)
    }

    pub fn validate(&self) -> Result<()> {
        validate_storage(&self.desc, self.bytes.len())
    }

    /// Mutable row prefixes without padding. The view must be valid.
    pub(crate) fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> {
        let row_bytes = self.desc.row_bytes();
        self.bytes
            .chunks_exact_mut(self.desc.stride)
            .map(move |row| &mut row[..row_bytes])
    }
}
