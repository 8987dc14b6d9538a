use crate::common::{Error, Result};
use crate::image::{PixelBuffer, PixelView, PixelViewMut, SampleDepth};
use crate::ops::Backend;
use crate::ops::kernels::LumaRowFn;

/// RGB to luminance with Rec. 601 weights, written to all three channels.
///
/// `Y = round(min(0.299 R + 0.587 G + 0.114 B, maxval))`. Fixed-point
/// backends may differ from the scalar result by one level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Grayscale;

fn luma_kernel(backend: Backend, depth: SampleDepth) -> Result<LumaRowFn> {
    let kernels = backend.kernels()?;
    Ok(match depth {
        SampleDepth::U8 => kernels.luma_u8,
        SampleDepth::U16 => kernels.luma_u16,
    })
}

impl Grayscale {
    /// Writes the luminance of `src` into `dst` with the best detected backend.
    ///
    /// `dst` must have the same width, height, maxval and data size as `src`.
    pub fn apply(&self, src: &PixelBuffer, dst: &mut PixelBuffer) -> Result<()> {
        self.apply_with(Backend::detect(), src, dst)
    }

    pub fn apply_with(
        &self,
        backend: Backend,
        src: &PixelBuffer,
        dst: &mut PixelBuffer,
    ) -> Result<()> {
        self.apply_view(backend, src.view(), dst.view_mut())
    }

    pub fn apply_view(
        &self,
        backend: Backend,
        src: PixelView<'_>,
        mut dst: PixelViewMut<'_>,
    ) -> Result<()> {
        src.validate()?;
        dst.validate()?;
        if !src.desc().same_shape(dst.desc()) {
            return Err(Error::ShapeMismatch(format!(
                "grayscale source {} does not match destination {}",
                src.desc(),
                dst.desc()
            )));
        }

        let desc = *src.desc();
        let kernel = luma_kernel(backend, desc.depth())?;
        let max = desc.maxval as f32;

        tracing::trace!(%backend, %desc, "Grayscale");

        for (src_row, dst_row) in src.rows().zip(dst.rows_mut()) {
            kernel(src_row, dst_row, max);
        }

        Ok(())
    }

    pub fn apply_in_place(&self, buffer: &mut PixelBuffer) -> Result<()> {
        self.apply_in_place_with(Backend::detect(), buffer)
    }

    pub fn apply_in_place_with(&self, backend: Backend, buffer: &mut PixelBuffer) -> Result<()> {
        buffer.validate()?;

        let desc = *buffer.desc();
        let kernel = luma_kernel(backend, desc.depth())?;
        let max = desc.maxval as f32;

        tracing::trace!(%backend, %desc, "Grayscale in place");

        let mut scratch = vec![0u8; desc.row_bytes()];
        for row in buffer.rows_mut() {
            scratch.copy_from_slice(row);
            kernel(&scratch, row, max);
        }

        Ok(())
    }
}
