//! Patch overlay administration.
//!
//! A patch archive is a zip with a `patch.json` metadata entry plus a
//! `scripts/` tree that shadows the bundled scripts by relative path. Import
//! extracts to a staging directory next to the overlay root and swaps it in
//! with renames, so a failed import never leaves a half-written overlay and
//! the previous one survives intact.

use std::{
    io::{Cursor, Read},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::ZipArchive;

pub const MANIFEST_FILE: &str = "patch.json";
pub const SCRIPTS_DIR: &str = "scripts";

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("the uploaded file is not a valid patch archive: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("patch archive is missing its patch.json metadata entry")]
    MissingManifest,
    #[error("patch metadata is malformed: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Metadata record embedded in the archive by whoever built the patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchMetadata {
    pub version: String,
    pub description: String,
}

/// Manifest written into the overlay root on import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchManifest {
    pub version: String,
    pub description: String,
    pub imported_at: DateTime<Utc>,
    /// Script paths relative to the overlay `scripts/` root.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchStatus {
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PatchManifest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub version: String,
    pub description: String,
    pub file_count: usize,
}

#[derive(Clone)]
pub struct PatchOverlayService {
    overlay_root: PathBuf,
}

impl PatchOverlayService {
    pub fn new(overlay_root: PathBuf) -> Self {
        Self { overlay_root }
    }

    pub fn overlay_root(&self) -> &Path {
        &self.overlay_root
    }

    /// Import a patch archive, fully replacing any previous overlay.
    pub fn import(&self, archive: &[u8]) -> Result<ImportSummary, PatchError> {
        let mut zip = ZipArchive::new(Cursor::new(archive))?;

        // Validate metadata before touching the filesystem.
        let metadata: PatchMetadata = {
            let mut entry = zip
                .by_name(MANIFEST_FILE)
                .map_err(|_| PatchError::MissingManifest)?;
            let mut raw = String::new();
            entry.read_to_string(&mut raw)?;
            serde_json::from_str(&raw)?
        };

        let parent = self
            .overlay_root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&parent)?;
        // Staged in a sibling directory so the final rename stays on one filesystem.
        let staging = tempfile::tempdir_in(&parent)?;

        let mut files = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            let Some(rel) = entry.enclosed_name() else {
                // zip-slip: entries escaping the root are skipped outright
                continue;
            };
            if rel.as_os_str().is_empty() || rel == Path::new(MANIFEST_FILE) {
                continue;
            }
            let out = staging.path().join(&rel);
            if entry.is_dir() {
                std::fs::create_dir_all(&out)?;
                continue;
            }
            if let Some(dir) = out.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let mut outfile = std::fs::File::create(&out)?;
            std::io::copy(&mut entry, &mut outfile)?;
            if let Ok(script) = rel.strip_prefix(SCRIPTS_DIR) {
                files.push(script.to_string_lossy().replace('\\', "/"));
            }
        }

        let manifest = PatchManifest {
            version: metadata.version,
            description: metadata.description,
            imported_at: Utc::now(),
            files,
        };
        std::fs::write(
            staging.path().join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;

        let file_count = manifest.files.len();
        self.swap_in(staging.keep())?;

        tracing::info!(version = %manifest.version, file_count, "patch overlay imported");
        Ok(ImportSummary {
            version: manifest.version,
            description: manifest.description,
            file_count,
        })
    }

    pub fn status(&self) -> PatchStatus {
        if !self.overlay_root.is_dir() {
            return PatchStatus {
                active: false,
                manifest: None,
            };
        }
        let manifest = match std::fs::read_to_string(self.overlay_root.join(MANIFEST_FILE)) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(manifest) => Some(manifest),
                Err(err) => {
                    tracing::warn!(?err, "patch overlay manifest is malformed");
                    None
                }
            },
            Err(err) => {
                tracing::warn!(?err, "patch overlay is active but has no readable manifest");
                None
            }
        };
        PatchStatus {
            active: true,
            manifest,
        }
    }

    /// Delete the whole overlay. Returns whether anything was there to clear;
    /// calling again right away is a safe no-op.
    pub fn clear(&self) -> Result<bool, PatchError> {
        if !self.overlay_root.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&self.overlay_root)?;
        tracing::info!("patch overlay cleared");
        Ok(true)
    }

    fn swap_in(&self, staged: PathBuf) -> Result<(), PatchError> {
        let mut old_os = self.overlay_root.clone().into_os_string();
        old_os.push(".old");
        let old = PathBuf::from(old_os);

        let had_previous = self.overlay_root.exists();
        if had_previous {
            if old.exists() {
                std::fs::remove_dir_all(&old)?;
            }
            std::fs::rename(&self.overlay_root, &old)?;
        }
        match std::fs::rename(&staged, &self.overlay_root) {
            Ok(()) => {
                if had_previous {
                    let _ = std::fs::remove_dir_all(&old);
                }
                Ok(())
            }
            Err(err) => {
                // Put the previous overlay back; the failed import must not
                // leave a partial state behind.
                if had_previous {
                    let _ = std::fs::rename(&old, &self.overlay_root);
                }
                let _ = std::fs::remove_dir_all(&staged);
                Err(err.into())
            }
        }
    }
}
