use axum::{
    routing::{get, IntoMakeService},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::AppState;

pub mod events;
pub mod health;
pub mod patches;
pub mod scripts;

pub fn router(state: AppState) -> IntoMakeService<Router> {
    let base_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(scripts::router())
        .merge(patches::router())
        .merge(events::router())
        .with_state(state);

    Router::new()
        .nest("/api", base_routes)
        // local desktop frontend, different port in dev
        .layer(CorsLayer::permissive())
        .into_make_service()
}
