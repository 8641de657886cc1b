use std::sync::Arc;

use executors::{resolver::ScriptResolver, runner::ScriptRunner};
use services::services::{
    config::Config, execution::ExecutionService, patches::PatchOverlayService,
};
use utils::router::LogRouter;

pub mod error;
pub mod routes;

/// Shared state injected into every route. Built once at startup; tests build
/// their own with sandboxed directories.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub execution: Arc<ExecutionService>,
    pub patches: Arc<PatchOverlayService>,
    pub router: Arc<LogRouter>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let router = Arc::new(LogRouter::new());
        let resolver = ScriptResolver::new(
            config.bundled_scripts_dir.clone(),
            config.overlay_dir.clone(),
        );
        let runner = ScriptRunner::new(
            config.interpreter.clone(),
            config.interpreter_args.clone(),
            router.clone(),
        );
        let execution = Arc::new(ExecutionService::new(resolver, runner, router.clone()));
        let patches = Arc::new(PatchOverlayService::new(config.overlay_dir.clone()));
        Self {
            config: Arc::new(config),
            execution,
            patches,
            router,
        }
    }
}
