//! Fan-out of live log events to connected stream subscribers.
//!
//! An explicit registry object rather than a module-level singleton, so the
//! HTTP layer injects one instance and tests can each spin up their own.

use std::{collections::HashMap, sync::RwLock};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

use crate::{
    protocol::{self, LogEntry, LogLevel, ParsedLine},
    stream_event::StreamEvent,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriberHandle(Uuid);

pub struct LogRouter {
    subscribers: RwLock<HashMap<Uuid, UnboundedSender<StreamEvent>>>,
}

impl LogRouter {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new subscriber. The `Connected` acknowledgement is queued
    /// before the receiver is handed back, so it is always the first event.
    pub fn subscribe(&self) -> (SubscriberHandle, UnboundedReceiver<StreamEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(StreamEvent::Connected);
        let id = Uuid::new_v4();
        self.subscribers.write().unwrap().insert(id, tx);
        (SubscriberHandle(id), rx)
    }

    /// Idempotent: removing an already-removed handle is a no-op.
    pub fn unsubscribe(&self, handle: &SubscriberHandle) {
        self.subscribers.write().unwrap().remove(&handle.0);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().unwrap().len()
    }

    /// Deliver to every live subscriber. A failed send drops only that
    /// subscriber; the rest still receive the event.
    pub fn broadcast(&self, event: StreamEvent) {
        let mut dead = Vec::new();
        {
            let subscribers = self.subscribers.read().unwrap();
            for (id, tx) in subscribers.iter() {
                if tx.send(event.clone()).is_err() {
                    dead.push(*id);
                }
            }
        }
        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().unwrap();
            for id in dead {
                subscribers.remove(&id);
            }
        }
    }

    /// Classify one raw subprocess line and broadcast it as a `log` event.
    /// `[DEV]` lines go out with their marker preserved so a developer console
    /// can filter on the prefix; payload candidates are results, not logs, and
    /// are not re-broadcast.
    pub fn broadcast_line(&self, line: &str) {
        match protocol::parse_line(line) {
            ParsedLine::Log(entry) => self.broadcast(StreamEvent::Log(entry)),
            ParsedLine::Dev(raw) => {
                self.broadcast(StreamEvent::Log(LogEntry::new(LogLevel::Info, raw)))
            }
            ParsedLine::PayloadCandidate(_) | ParsedLine::Blank => {}
        }
    }

    pub fn broadcast_process_started(&self, endpoint: &str, context: &str) {
        self.broadcast(StreamEvent::ProcessStarted {
            endpoint: endpoint.to_string(),
            context: context.to_string(),
        });
    }

    pub fn broadcast_process_complete(&self, endpoint: &str, success: bool, context: &str) {
        self.broadcast(StreamEvent::ProcessComplete {
            endpoint: endpoint.to_string(),
            success,
            context: context.to_string(),
        });
    }
}

impl Default for LogRouter {
    fn default() -> Self {
        Self::new()
    }
}
