pub mod interpreter;
pub mod protocol;
pub mod response;
pub mod router;
pub mod stream_event;
