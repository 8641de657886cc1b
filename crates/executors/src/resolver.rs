//! Bundled-or-patched script resolution.
//!
//! User-applied patches live in a per-user overlay directory whose `scripts/`
//! subtree mirrors the bundled scripts tree by relative path. A patched file
//! always wins over the bundled one. Resolution is computed fresh on every
//! request; patches can be imported or cleared between runs.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;

pub const OVERLAY_SCRIPTS_DIR: &str = "scripts";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid script name '{0}': absolute paths and traversal segments are not allowed")]
    InvalidName(String),
    #[error("script '{0}' exists in neither the patch overlay nor the bundled scripts directory")]
    NotFound(String),
}

#[derive(Debug, Clone)]
pub struct ResolvedScript {
    pub path: PathBuf,
    pub is_patched: bool,
    pub working_dir: PathBuf,
}

#[derive(Clone)]
pub struct ScriptResolver {
    bundled_root: PathBuf,
    overlay_root: PathBuf,
}

impl ScriptResolver {
    pub fn new(bundled_root: PathBuf, overlay_root: PathBuf) -> Self {
        Self {
            bundled_root,
            overlay_root,
        }
    }

    pub fn overlay_scripts_root(&self) -> PathBuf {
        self.overlay_root.join(OVERLAY_SCRIPTS_DIR)
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedScript, ResolveError> {
        if !is_plain_relative(name) {
            return Err(ResolveError::InvalidName(name.to_string()));
        }

        let overlay_scripts = self.overlay_scripts_root();
        // When any overlay files exist, run from the overlay so support files
        // patched alongside the entry script stay importable.
        let working_dir = if dir_has_entries(&overlay_scripts) {
            overlay_scripts.clone()
        } else {
            self.bundled_root.clone()
        };

        let overlay_path = overlay_scripts.join(name);
        if overlay_path.is_file() {
            return Ok(ResolvedScript {
                path: overlay_path,
                is_patched: true,
                working_dir,
            });
        }

        let bundled_path = self.bundled_root.join(name);
        if bundled_path.is_file() {
            return Ok(ResolvedScript {
                path: bundled_path,
                is_patched: false,
                working_dir,
            });
        }

        Err(ResolveError::NotFound(name.to_string()))
    }
}

fn is_plain_relative(name: &str) -> bool {
    let path = Path::new(name);
    !name.is_empty()
        && path.is_relative()
        && path.components().all(|c| matches!(c, Component::Normal(_)))
}

fn dir_has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
