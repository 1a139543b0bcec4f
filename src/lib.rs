//! # bluecarbon-relay
//!
//! Server-Sent-Events relay for the Blue Carbon Registry.
//!
//! Request handlers that change registry state publish a
//! [`domain::RegistryEvent`] through the shared [`domain::EventBroker`];
//! every client connected to `/sse` receives each event published after it
//! subscribed. Delivery is best-effort: each subscriber has its own bounded
//! queue and a full queue drops the event for that subscriber only, so
//! publishers never wait on slow clients.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, EventSource)
//!     │
//!     ├── REST Handlers (api/)      POST /api/v1/events, /api/v1/telemetry
//!     ├── SSE Handler (stream/)     GET /sse
//!     │
//!     └── EventBroker (domain/)
//!             └── Subscription ×N   bounded mpsc queue per client
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod server;
pub mod stream;
