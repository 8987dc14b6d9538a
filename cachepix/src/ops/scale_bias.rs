use crate::common::{Error, Result};
use crate::image::{PixelBuffer, PixelViewMut, SampleDepth};
use crate::ops::Backend;

/// Affine brightness/contrast: `round(clamp(v * scale + bias, 0, ceiling))`.
///
/// The ceiling is 255 for 8-bit samples and the buffer's `maxval` for 16-bit
/// samples.
///
/// Applied in place to every sample of every channel. All backends produce
/// identical bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBias {
    pub scale: f32,
    pub bias: f32,
}

impl Default for ScaleBias {
    fn default() -> Self {
        Self {
            scale: 1.0,
            bias: 0.0,
        }
    }
}

impl ScaleBias {
    pub fn new(scale: f32, bias: f32) -> Self {
        Self { scale, bias }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || !self.bias.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "scale {} and bias {} must be finite",
                self.scale, self.bias
            )));
        }
        Ok(())
    }

    /// Applies the transform with the best detected backend.
    pub fn apply(&self, buffer: &mut PixelBuffer) -> Result<()> {
        self.apply_with(Backend::detect(), buffer)
    }

    pub fn apply_with(&self, backend: Backend, buffer: &mut PixelBuffer) -> Result<()> {
        self.apply_view(backend, buffer.view_mut())
    }

    /// Applies the transform to a borrowed (possibly foreign) buffer.
    pub fn apply_view(&self, backend: Backend, mut view: PixelViewMut<'_>) -> Result<()> {
        view.validate()?;
        self.validate()?;
        let kernels = backend.kernels()?;

        let desc = *view.desc();
        let (kernel, max) = match desc.depth() {
            SampleDepth::U8 => (kernels.scale_u8, u8::MAX as f32),
            SampleDepth::U16 => (kernels.scale_u16, desc.maxval as f32),
        };

        tracing::trace!(%backend, %desc, scale = self.scale, bias = self.bias, "Scale/bias");

        for row in view.rows_mut() {
            kernel(row, self.scale, self.bias, max);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::image_diff::{max_sample_diff, pixels_equal};
    use crate::common::test_utils::{padding_intact, pattern_buffer};
    use crate::image::{PixelDesc, PixelView};

    #[test]
    fn brightens_and_saturates() {
        let mut buffer = PixelBuffer::new(1, 1, 255).unwrap();
        buffer.set_pixel(0, 0, [200, 0, 100]).unwrap();

        ScaleBias::new(2.0, 10.0)
            .apply_with(Backend::Scalar, &mut buffer)
            .unwrap();

        assert_eq!(buffer.get_pixel(0, 0).unwrap(), [255, 10, 210]);
    }

    #[test]
    fn clamps_8bit_to_255_and_16bit_to_maxval() {
        for backend in Backend::available() {
            // 8-bit ceiling is the sample range, not maxval
            let mut small = PixelBuffer::new(1, 1, 100).unwrap();
            small.fill([90, 90, 90]).unwrap();
            ScaleBias::new(2.0, 0.0)
                .apply_with(backend, &mut small)
                .unwrap();
            assert_eq!(small.get_pixel(0, 0).unwrap(), [180, 180, 180], "{}", backend);

            // full vector groups plus a tail
            let mut row = PixelBuffer::new(40, 1, 100).unwrap();
            row.fill([100, 70, 0]).unwrap();
            ScaleBias::new(3.0, 1.0).apply_with(backend, &mut row).unwrap();
            for x in 0..40 {
                assert_eq!(row.get_pixel(x, 0).unwrap(), [255, 211, 1], "{} x={}", backend, x);
            }
        }

        let mut wide = PixelBuffer::new(2, 1, 1000).unwrap();
        wide.fill([900, 0, 450]).unwrap();
        ScaleBias::new(2.0, -1.0).apply(&mut wide).unwrap();
        assert_eq!(wide.get_pixel(0, 0).unwrap(), [1000, 0, 899]);
    }

    #[test]
    fn identity_is_a_no_op() {
        for maxval in [255, 4095] {
            let original = pattern_buffer(33, 3, maxval);
            let mut buffer = original.clone();
            ScaleBias::default().apply(&mut buffer).unwrap();
            assert!(pixels_equal(&original, &buffer));
        }
    }

    #[test]
    fn padding_is_untouched() {
        for backend in Backend::available() {
            for maxval in [255, 65535] {
                let mut buffer = pattern_buffer(17, 4, maxval);
                ScaleBias::new(3.0, 7.0)
                    .apply_with(backend, &mut buffer)
                    .unwrap();
                assert!(padding_intact(&buffer), "{} maxval {}", backend, maxval);
            }
        }
    }

    #[test]
    fn backends_match_scalar_exactly() {
        let params = [
            ScaleBias::new(1.7, -12.3),
            ScaleBias::new(0.5, 0.0),
            ScaleBias::new(-1.0, 255.0),
            ScaleBias::new(1.0, 0.5),
        ];
        for maxval in [255, 200, 1023, 65535] {
            for width in [1, 7, 15, 16, 17, 31, 32, 33, 100] {
                for params in params {
                    let mut expected = pattern_buffer(width, 2, maxval);
                    params
                        .apply_with(Backend::Scalar, &mut expected)
                        .unwrap();

                    for backend in Backend::available() {
                        let mut actual = pattern_buffer(width, 2, maxval);
                        params.apply_with(backend, &mut actual).unwrap();
                        assert_eq!(
                            max_sample_diff(&expected, &actual),
                            0,
                            "{} width {} maxval {} {:?}",
                            backend,
                            width,
                            maxval,
                            params
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn round_trip_restores_within_one_level() {
        for maxval in [255, 65535] {
            let original = pattern_buffer(40, 2, maxval);
            let mut buffer = original.clone();

            // Halving never clamps, so doubling back is within rounding.
            ScaleBias::new(0.5, 0.0).apply(&mut buffer).unwrap();
            ScaleBias::new(2.0, 0.0).apply(&mut buffer).unwrap();

            assert!(max_sample_diff(&original, &buffer) <= 1);
        }
    }

    #[test]
    fn non_finite_parameters_are_rejected() {
        let mut buffer = PixelBuffer::new(4, 4, 255).unwrap();
        buffer.fill([10, 20, 30]).unwrap();
        let before = buffer.clone();

        for params in [
            ScaleBias::new(f32::NAN, 0.0),
            ScaleBias::new(1.0, f32::INFINITY),
            ScaleBias::new(f32::NEG_INFINITY, 1.0),
        ] {
            let result = params.apply(&mut buffer);
            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }
        assert!(pixels_equal(&before, &buffer));
    }

    #[test]
    fn foreign_view_is_validated() {
        let desc = PixelDesc::new(4, 2, 255).unwrap();

        // One byte short of two 64-byte rows
        let mut bytes = vec![0u8; desc.size_in_bytes() - 1];
        let result = ScaleBias::new(2.0, 0.0).apply_view(Backend::Scalar, PixelViewMut::new(desc, &mut bytes));
        assert!(matches!(result, Err(Error::Validation(_))));

        let bad_stride = PixelDesc { stride: 12, ..desc };
        let mut bytes = vec![0u8; bad_stride.size_in_bytes()];
        let result = ScaleBias::new(2.0, 0.0)
            .apply_view(Backend::Scalar, PixelViewMut::new(bad_stride, &mut bytes));
        assert!(matches!(result, Err(Error::Validation(_))));

        let mut bytes = vec![3u8; desc.size_in_bytes()];
        ScaleBias::new(2.0, 0.0)
            .apply_view(Backend::Scalar, PixelViewMut::new(desc, &mut bytes))
            .unwrap();
        let view = PixelView::new(desc, &bytes);
        assert_eq!(view.to_buffer().unwrap().get_pixel(3, 1).unwrap(), [6, 6, 6]);
        // padding of a foreign view is not touched either
        assert_eq!(bytes[12], 3);
    }

    #[test]
    fn unavailable_backend_is_rejected() {
        let Some(missing) = Backend::ALL.into_iter().find(|b| !b.is_available()) else {
            return;
        };

        let mut buffer = PixelBuffer::new(2, 2, 255).unwrap();
        let result = ScaleBias::default().apply_with(missing, &mut buffer);
        assert!(matches!(result, Err(Error::UnsupportedBackend(b)) if b == missing));
    }
}
