//! Shared infrastructure for the cachepix workspace: CPU capability probing,
//! logging setup and test helpers.

pub mod cpu_features;
pub mod log_setup;
pub mod test_utils;
