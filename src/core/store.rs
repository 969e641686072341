//! Store abstraction for Arborist's journal state.
//!
//! A store is the directory that holds the journal database, the broker event
//! log and the optional `arborist.toml` quota overrides.

use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the default store location.
pub const STORE_ENV_VAR: &str = "ARBORIST_HOME";

/// Directory name used when neither `--root` nor `ARBORIST_HOME` is given.
pub const DEFAULT_STORE_DIR: &str = ".arborist";

/// Store handle representing one journal workspace.
///
/// Both robots of a garden share one store; nothing in the handle is mutable.
#[derive(Debug, Clone)]
pub struct Store {
    /// Absolute or caller-relative path to the store root directory
    pub root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the store root: explicit path, then `ARBORIST_HOME`, then `./.arborist`.
    pub fn resolve(explicit: Option<&Path>, current_dir: &Path) -> Self {
        if let Some(root) = explicit {
            return Self::new(root);
        }
        match env::var(STORE_ENV_VAR) {
            Ok(value) if !value.trim().is_empty() => Self::new(value),
            _ => Self::new(current_dir.join(DEFAULT_STORE_DIR)),
        }
    }
}
