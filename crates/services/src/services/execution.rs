//! Orchestrates one script run: fresh resolution, subprocess execution, and
//! the process-started / process-complete bracket on the live stream.

use std::sync::Arc;

use executors::{
    resolver::{ResolveError, ScriptResolver},
    runner::{ExecutorError, ScriptRunner},
};
use serde_json::Value;
use thiserror::Error;
use utils::router::LogRouter;

#[derive(Debug, Error)]
pub enum ExecutionServiceError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

pub struct ExecutionService {
    resolver: ScriptResolver,
    runner: ScriptRunner,
    router: Arc<LogRouter>,
}

impl ExecutionService {
    pub fn new(resolver: ScriptResolver, runner: ScriptRunner, router: Arc<LogRouter>) -> Self {
        Self {
            resolver,
            runner,
            router,
        }
    }

    /// Run a logical script with the given arguments and return the merged
    /// response body. Bracket events go out even when resolution or spawn
    /// fails, so a UI's in-progress state always closes.
    pub async fn run_script(
        &self,
        script: &str,
        args: &[String],
    ) -> Result<Value, ExecutionServiceError> {
        let context = match args.first() {
            Some(first) => format!("{script} {first}"),
            None => script.to_string(),
        };
        self.router.broadcast_process_started("scripts/run", &context);

        let outcome = self.run_inner(script, args).await;

        let success = match &outcome {
            Ok(body) => body.get("success").and_then(Value::as_bool).unwrap_or(false),
            Err(_) => false,
        };
        self.router
            .broadcast_process_complete("scripts/run", success, &context);

        outcome
    }

    async fn run_inner(
        &self,
        script: &str,
        args: &[String],
    ) -> Result<Value, ExecutionServiceError> {
        // Resolved fresh every time; a patch import between runs must take effect.
        let resolved = self.resolver.resolve(script)?;
        tracing::info!(%script, patched = resolved.is_patched, "running script");
        let result = self.runner.run(&resolved, args).await?;
        if !result.success() {
            tracing::warn!(%script, exit_code = result.exit_code, "script reported failure");
        }
        Ok(result.into_response_json(script))
    }
}
