pub mod validate_schema;

use std::path::{Path, PathBuf};

/// Resolve a caller-supplied path against the worktree root. Absolute
/// inputs pass through untouched; relative inputs are joined onto the
/// root. Never touches the filesystem and never fails; whether the
/// result exists is the spawned validator's problem.
pub fn resolve_path(root: &Path, value: &str) -> PathBuf {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}
