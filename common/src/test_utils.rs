//! Scratch files for tests that exercise the file layer.
//!
//! Everything lands in `<workspace>/test_output/`, which is created on first
//! use and shared by every crate in the workspace.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const OUTPUT_DIR: &str = "test_output";

/// `CARGO_MANIFEST_DIR` of this crate is `<workspace>/common`.
fn workspace_root() -> &'static Path {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir.parent().unwrap_or(manifest_dir)
}

/// Returns the shared output directory, creating it once per process.
pub fn test_output_dir() -> &'static Path {
    static DIR: OnceLock<PathBuf> = OnceLock::new();
    DIR.get_or_init(|| {
        let dir = workspace_root().join(OUTPUT_DIR);
        std::fs::create_dir_all(&dir)
            .unwrap_or_else(|e| panic!("Failed to create {}: {}", dir.display(), e));
        dir
    })
}

/// Path of `name` inside the output directory. An existing file is kept.
pub fn test_output_path(name: &str) -> PathBuf {
    test_output_dir().join(name)
}

/// Path of `name` inside the output directory with any file left over from
/// an earlier run removed, so overwrite checks start from a clean slate.
pub fn fresh_test_output_path(name: &str) -> PathBuf {
    let path = test_output_path(name);
    match std::fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => panic!("Failed to remove stale {}: {}", path.display(), e),
    }
    path
}
