//! Dashboard HTTP API.
//!
//! Exposes the monitoring core, household, directory, records and
//! assistant as JSON endpoints under `/api/`, plus a WebSocket push
//! channel at `/ws`.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;
pub mod websocket;

pub use router::api_router;
pub use server::{start_api_server, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
