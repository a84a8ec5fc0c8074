pub mod registry;
pub mod types;

use std::path::{Path, PathBuf};

/// Per-call execution context. The worktree root is handed to every tool
/// invocation explicitly; tools hold no ambient state of their own.
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub worktree: PathBuf,
}

impl ToolContext {
    pub fn new(worktree: impl Into<PathBuf>) -> Self {
        Self { worktree: worktree.into() }
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }
}
