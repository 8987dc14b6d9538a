mod backend;
mod grayscale;
pub(crate) mod kernels;
mod rescale;
mod scale_bias;

pub use backend::Backend;
pub use grayscale::Grayscale;
pub use kernels::RowKernels;
pub use rescale::RescaleMaxval;
pub use scale_bias::ScaleBias;
