use std::io;
use std::path::PathBuf;

use crate::ops::Backend;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid geometry: {width}x{height} maxval {maxval}")]
    InvalidGeometry { width: u32, height: u32, maxval: u16 },
    #[error("buffer validation failed: {0}")]
    Validation(String),
    #[error("buffer shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("alignment {0} is not a power of two")]
    InvalidAlignment(usize),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("pixel ({x}, {y}) is outside a {width}x{height} image")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("backend {0} is not available on this CPU")]
    UnsupportedBackend(Backend),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed PPM: {0}")]
    Format(String),
    #[error("refusing to overwrite non-empty file {}", .0.display())]
    FileExists(PathBuf),
    #[error("config error: {0}")]
    Config(String),
}

impl From<serde_yml::Error> for Error {
    fn from(e: serde_yml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
