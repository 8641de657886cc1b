use axum::response::sse::Event;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::protocol::LogEntry;

pub const EV_CONNECTED: &str = "connected";
pub const EV_LOG: &str = "log";
pub const EV_PROCESS_STARTED: &str = "process-started";
pub const EV_PROCESS_COMPLETE: &str = "process-complete";

/// One event on the live log stream. Fire-and-forget: there is no replay
/// buffer, a subscriber that connects late never sees earlier events.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StreamEvent {
    Connected,
    Log(LogEntry),
    ProcessStarted {
        endpoint: String,
        context: String,
    },
    ProcessComplete {
        endpoint: String,
        success: bool,
        context: String,
    },
}

impl StreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Connected => EV_CONNECTED,
            StreamEvent::Log(_) => EV_LOG,
            StreamEvent::ProcessStarted { .. } => EV_PROCESS_STARTED,
            StreamEvent::ProcessComplete { .. } => EV_PROCESS_COMPLETE,
        }
    }

    pub fn to_sse_event(&self) -> Event {
        let data = match self {
            StreamEvent::Connected => json!({}),
            StreamEvent::Log(entry) => {
                serde_json::to_value(entry).unwrap_or_else(|_| json!({}))
            }
            StreamEvent::ProcessStarted { endpoint, context } => {
                json!({ "endpoint": endpoint, "context": context })
            }
            StreamEvent::ProcessComplete {
                endpoint,
                success,
                context,
            } => json!({ "endpoint": endpoint, "success": success, "context": context }),
        };
        Event::default().event(self.name()).data(data.to_string())
    }
}
