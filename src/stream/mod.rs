//! Server-Sent-Events layer: the `/sse` endpoint and its consumer loop.
//!
//! Each connection subscribes to the broker and forwards its private queue
//! to the client, one SSE frame per event, until the client disconnects.

pub mod consumer;
pub mod handler;
pub mod messages;
