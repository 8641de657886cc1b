//! Python interpreter discovery.

use std::path::{Path, PathBuf};

/// Points at a specific interpreter, bypassing PATH discovery.
pub const INTERPRETER_ENV: &str = "GRADEFLOW_PYTHON";

/// Resolve the interpreter used to run grading scripts.
///
/// The search order is:
/// 1. `GRADEFLOW_PYTHON`, taken verbatim when it is an absolute path to a
///    file, otherwise looked up on PATH.
/// 2. `python3`, then `python`, on PATH.
pub async fn resolve_interpreter() -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(INTERPRETER_ENV) {
        let path = Path::new(&explicit);
        if path.is_absolute() && path.is_file() {
            return Some(path.to_path_buf());
        }
        if let Some(found) = which(&explicit).await {
            return Some(found);
        }
        tracing::warn!(%explicit, "{INTERPRETER_ENV} is set but does not resolve, falling back to PATH");
    }

    for candidate in ["python3", "python"] {
        if let Some(found) = which(candidate).await {
            return Some(found);
        }
    }

    None
}

async fn which(executable: &str) -> Option<PathBuf> {
    let executable = executable.to_string();
    tokio::task::spawn_blocking(move || which::which(executable))
        .await
        .ok()
        .and_then(|result| result.ok())
}
