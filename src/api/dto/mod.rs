//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod event_dto;
pub mod log_dto;
pub mod telemetry_dto;

pub use common_dto::*;
pub use event_dto::*;
pub use log_dto::*;
pub use telemetry_dto::*;
