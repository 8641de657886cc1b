use std::path::PathBuf;

use thiserror::Error;
use utils::interpreter;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8710;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "no Python interpreter found on PATH; install Python 3 or set {} to a working interpreter",
        interpreter::INTERPRETER_ENV
    )]
    InterpreterNotFound,
    #[error("invalid GRADEFLOW_PORT value '{0}'")]
    InvalidPort(String),
    #[error("could not determine a per-user data directory for the patch overlay")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub bundled_scripts_dir: PathBuf,
    pub overlay_dir: PathBuf,
    pub interpreter: PathBuf,
    pub interpreter_args: Vec<String>,
}

impl Config {
    /// Environment overrides with sensible defaults. The overlay defaults to
    /// the per-user data directory so patches survive app reinstalls.
    pub async fn load() -> Result<Self, ConfigError> {
        let host = std::env::var("GRADEFLOW_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = match std::env::var("GRADEFLOW_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let bundled_scripts_dir = std::env::var("GRADEFLOW_SCRIPTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("scripts"));

        let overlay_dir = match std::env::var("GRADEFLOW_OVERLAY_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => directories::ProjectDirs::from("app", "gradeflow", "gradeflow")
                .ok_or(ConfigError::NoDataDir)?
                .data_dir()
                .join("patches"),
        };

        let interpreter = interpreter::resolve_interpreter()
            .await
            .ok_or(ConfigError::InterpreterNotFound)?;

        Ok(Self {
            host,
            port,
            bundled_scripts_dir,
            overlay_dir,
            interpreter,
            // unbuffered, so lines arrive as the script emits them
            interpreter_args: vec!["-u".to_string()],
        })
    }
}
