// Error handling and configuration
pub use crate::common::{Config, Error, Result};

// Buffers
pub use crate::image::{
    CHANNELS, DEFAULT_ALIGNMENT, PixelBuffer, PixelDesc, PixelView, PixelViewMut, SampleDepth,
    expected_data_size,
};

// Operations
pub use crate::ops::{Backend, Grayscale, RescaleMaxval, RowKernels, ScaleBias};
