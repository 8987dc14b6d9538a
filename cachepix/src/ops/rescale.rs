use crate::common::{Error, Result};
use crate::image::{PixelBuffer, PixelDesc, SampleDepth};
use crate::ops::Backend;
use crate::ops::kernels::RowKernels;

/// Rescales every sample to a new maxval: `min(v * new / old, new)`, floored.
///
/// Crossing the 255 boundary changes the sample width, which re-lays out the
/// buffer into new storage with a new stride. The old storage is released
/// only after the new buffer is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RescaleMaxval {
    pub maxval: u16,
}

impl RescaleMaxval {
    pub fn new(maxval: u16) -> Self {
        Self { maxval }
    }

    pub fn apply(&self, buffer: &mut PixelBuffer) -> Result<()> {
        self.apply_with(Backend::detect(), buffer)
    }

    pub fn apply_with(&self, backend: Backend, buffer: &mut PixelBuffer) -> Result<()> {
        if self.maxval == 0 {
            return Err(Error::InvalidGeometry {
                width: buffer.width(),
                height: buffer.height(),
                maxval: self.maxval,
            });
        }
        buffer.validate()?;
        let kernels = backend.kernels()?;

        let old = buffer.maxval();
        let new = self.maxval;
        if old == new {
            return Ok(());
        }

        tracing::trace!(%backend, desc = %buffer.desc(), new_maxval = new, "Rescale maxval");

        match (buffer.depth(), SampleDepth::from_maxval(new)) {
            (SampleDepth::U8, SampleDepth::U8) => {
                for row in buffer.rows_mut() {
                    (kernels.rescale_u8)(row, old, new);
                }
                buffer.set_maxval(new);
            }
            (SampleDepth::U16, SampleDepth::U16) => {
                for row in buffer.rows_mut() {
                    (kernels.rescale_u16)(row, old, new);
                }
                buffer.set_maxval(new);
            }
            (SampleDepth::U8, SampleDepth::U16) => widen(kernels, buffer, new)?,
            (SampleDepth::U16, SampleDepth::U8) => narrow(kernels, buffer, new)?,
        }

        Ok(())
    }
}

fn new_depth_buffer(buffer: &PixelBuffer, new_maxval: u16) -> Result<PixelBuffer> {
    PixelBuffer::new_empty(PixelDesc::with_alignment(
        buffer.width(),
        buffer.height(),
        new_maxval,
        buffer.alignment(),
    )?)
}

/// 8-bit to 16-bit: widen losslessly, then rescale at 16 bits.
fn widen(kernels: &RowKernels, buffer: &mut PixelBuffer, new_maxval: u16) -> Result<()> {
    let old_maxval = buffer.maxval();
    let mut out = new_depth_buffer(buffer, new_maxval)?;

    for (src, dst) in buffer.rows().zip(out.rows_mut()) {
        for (&s, d) in src.iter().zip(dst.chunks_exact_mut(2)) {
            d.copy_from_slice(&(s as u16).to_be_bytes());
        }
        (kernels.rescale_u16)(dst, old_maxval, new_maxval);
    }

    tracing::debug!(
        old_stride = buffer.stride(),
        new_stride = out.stride(),
        old_maxval,
        new_maxval,
        "Widened samples to 16 bits"
    );

    *buffer = out;
    Ok(())
}

/// 16-bit to 8-bit: rescale a scratch copy at 16 bits, then narrow.
fn narrow(kernels: &RowKernels, buffer: &mut PixelBuffer, new_maxval: u16) -> Result<()> {
    let old_maxval = buffer.maxval();
    let mut out = new_depth_buffer(buffer, new_maxval)?;
    let mut scratch = vec![0u8; buffer.row_bytes()];

    for (src, dst) in buffer.rows().zip(out.rows_mut()) {
        scratch.copy_from_slice(src);
        (kernels.rescale_u16)(&mut scratch, old_maxval, new_maxval);
        for (s, d) in scratch.chunks_exact(2).zip(dst.iter_mut()) {
            // rescaled values never exceed new_maxval <= 255
            *d = u16::from_be_bytes([s[0], s[1]]) as u8;
        }
    }

    tracing::debug!(
        old_stride = buffer.stride(),
        new_stride = out.stride(),
        old_maxval,
        new_maxval,
        "Narrowed samples to 8 bits"
    );

    *buffer = out;
    Ok(())
}
