//! Subprocess execution with live line forwarding.

use std::{path::PathBuf, process::Stdio, sync::Arc};

use command_group::AsyncCommandGroup;
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    process::Command,
};
use utils::{
    protocol::{self, ParsedLine},
    router::LogRouter,
};

use crate::{resolver::ResolvedScript, result::ExecutionResult};

/// Cap on total captured stdout+stderr bytes. Exceeding it fails the run
/// outright rather than silently truncating.
pub const MAX_CAPTURED_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The interpreter could not be launched at all. Distinct from a script
    /// that ran and failed, so callers can tell "could not start" apart.
    #[error(
        "failed to launch interpreter '{interpreter}': {source}. \
         Install Python 3 or point GRADEFLOW_PYTHON at a working interpreter"
    )]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },
    #[error("script output exceeded the 10 MiB capture limit; the run was aborted as its result would be incomplete")]
    OutputLimitExceeded,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct ScriptRunner {
    interpreter: PathBuf,
    interpreter_args: Vec<String>,
    router: Arc<LogRouter>,
}

impl ScriptRunner {
    pub fn new(interpreter: PathBuf, interpreter_args: Vec<String>, router: Arc<LogRouter>) -> Self {
        Self {
            interpreter,
            interpreter_args,
            router,
        }
    }

    /// Run a resolved script to completion.
    ///
    /// Arguments are passed as discrete argv elements straight to the
    /// interpreter; no shell is involved, so an argument containing spaces,
    /// quotes, or metacharacters can never split or inject commands.
    ///
    /// Every stdout line is broadcast through the router the moment it is
    /// read, then classified into the result's log entries.
    pub async fn run(
        &self,
        script: &ResolvedScript,
        args: &[String],
    ) -> Result<ExecutionResult, ExecutorError> {
        let mut command = Command::new(&self.interpreter);
        command
            .args(&self.interpreter_args)
            .arg(&script.path)
            .args(args)
            .current_dir(&script.working_dir)
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // belt and braces next to `-u`: some scripts re-exec python
            .env("PYTHONUNBUFFERED", "1");

        let mut child = command.group_spawn().map_err(|source| ExecutorError::Spawn {
            interpreter: self.interpreter.display().to_string(),
            source,
        })?;

        let stdout = child
            .inner()
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not piped"))?;
        let stderr = child
            .inner()
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("child stderr was not piped"))?;

        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();

        let mut raw_stdout = String::new();
        let mut raw_stderr = String::new();
        let mut logs = Vec::new();
        let mut payload_candidate: Option<String> = None;
        let mut captured_bytes = 0usize;
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !(stdout_done && stderr_done) {
            tokio::select! {
                line = stdout_lines.next_line(), if !stdout_done => match line? {
                    Some(line) => {
                        captured_bytes += line.len() + 1;
                        if captured_bytes > MAX_CAPTURED_BYTES {
                            let _ = child.kill().await;
                            return Err(ExecutorError::OutputLimitExceeded);
                        }
                        self.router.broadcast_line(&line);
                        raw_stdout.push_str(&line);
                        raw_stdout.push('\n');
                        match protocol::parse_line(&line) {
                            ParsedLine::Log(entry) => logs.push(entry),
                            ParsedLine::PayloadCandidate(candidate) => {
                                payload_candidate = Some(candidate);
                            }
                            // dev lines reach the live stream only; blanks drop
                            ParsedLine::Dev(_) | ParsedLine::Blank => {}
                        }
                    }
                    None => stdout_done = true,
                },
                line = stderr_lines.next_line(), if !stderr_done => match line? {
                    Some(line) => {
                        captured_bytes += line.len() + 1;
                        if captured_bytes > MAX_CAPTURED_BYTES {
                            let _ = child.kill().await;
                            return Err(ExecutorError::OutputLimitExceeded);
                        }
                        raw_stderr.push_str(&line);
                        raw_stderr.push('\n');
                    }
                    None => stderr_done = true,
                },
            }
        }

        let status = child.wait().await?;
        let exit_code = status.code().unwrap_or(-1);

        let payload = payload_candidate.and_then(|raw| {
            match serde_json::from_str::<Map<String, Value>>(&raw) {
                Ok(map) => Some(map),
                Err(err) => {
                    // Non-fatal by design: fall back to exit-code success.
                    tracing::debug!(?err, %raw, "structured payload candidate failed to parse");
                    None
                }
            }
        });

        Ok(ExecutionResult {
            exit_code,
            raw_stdout,
            raw_stderr,
            payload,
            logs,
            is_patched: script.is_patched,
        })
    }
}
