use server::{routes, AppState};
use services::services::config::Config;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            ),
        )
        .init();

    let config = Config::load().await?;
    tracing::info!(
        scripts = %config.bundled_scripts_dir.display(),
        overlay = %config.overlay_dir.display(),
        interpreter = %config.interpreter.display(),
        "starting gradeflow backend"
    );

    let addr = format!("{}:{}", config.host, config.port);
    let app = routes::router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
