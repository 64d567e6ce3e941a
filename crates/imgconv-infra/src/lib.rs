//! Shared infrastructure for the image conversion service:
//! - Telemetry initialization
//! - Request ID middleware

pub mod middleware;
pub mod telemetry;

pub use middleware::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use telemetry::{init_telemetry, LogFormat};
