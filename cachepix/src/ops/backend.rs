use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};
use crate::ops::kernels::{RowKernels, kernels_for};

/// Kernel family a transform runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Portable reference kernels, always available.
    Scalar,
    /// 128-bit x86_64 vectors.
    Sse41,
    /// 256-bit x86_64 vectors.
    Avx2,
    /// 128-bit aarch64 vectors.
    Neon,
}

static DETECTED: OnceLock<Backend> = OnceLock::new();

impl Backend {
    pub const ALL: [Backend; 4] = [Backend::Scalar, Backend::Sse41, Backend::Avx2, Backend::Neon];

    /// Detection order, best first.
    const PREFERENCE: [Backend; 4] = [Backend::Avx2, Backend::Sse41, Backend::Neon, Backend::Scalar];

    pub fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Sse41 => "sse41",
            Backend::Avx2 => "avx2",
            Backend::Neon => "neon",
        }
    }

    /// True if this CPU can run the backend's kernels.
    pub fn is_available(self) -> bool {
        kernels_for(self).is_some()
    }

    /// All backends this CPU can run, scalar first.
    pub fn available() -> Vec<Backend> {
        Self::ALL.into_iter().filter(|b| b.is_available()).collect()
    }

    /// Best available backend. Probed once per process.
    pub fn detect() -> Backend {
        *DETECTED.get_or_init(|| {
            let backend = Self::PREFERENCE
                .into_iter()
                .find(|b| b.is_available())
                .unwrap_or(Backend::Scalar);
            tracing::debug!(%backend, "Detected best pixel backend");
            backend
        })
    }

    /// Kernel table for this backend, or `UnsupportedBackend` if the CPU lacks it.
    pub fn kernels(self) -> Result<&'static RowKernels> {
        kernels_for(self).ok_or(Error::UnsupportedBackend(self))
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidParameter(format!("unknown backend '{}'", s)))
    }
}
