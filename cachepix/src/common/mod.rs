pub(crate) mod config;
pub(crate) mod error;
#[cfg(test)]
pub(crate) mod image_diff;
#[cfg(test)]
pub(crate) mod test_utils;

// Public API
pub use config::Config;
pub use error::{Error, Result};
