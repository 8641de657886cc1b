use std::convert::Infallible;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    routing::get,
    Router,
};
use futures_util::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::AppState;

/// Live log stream. The first event is always `connected`; there is no
/// replay, clients reconnect with backoff and simply miss what they missed.
pub async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let (_handle, rx) = state.router.subscribe();
    // Dropping the receiver on disconnect makes the next broadcast evict
    // this subscriber from the registry.
    let stream = UnboundedReceiverStream::new(rx)
        .map(|event| Ok::<Event, Infallible>(event.to_sse_event()));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(events))
}
