//! Aegis Server - Metrics API Gateway
//!
//! HTTP front end of the Aegis batch metrics engine. Decodes batch requests,
//! runs them on the engine off the async runtime, and reports one result per
//! request path.
//!
//! Key Features:
//! - Batch metrics queries over a JSON array of request paths
//! - Application metrics deletion
//! - Metrics record ingestion
//! - Request IDs, CORS, and HTTP tracing
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod request;
pub mod router;
pub mod state;

pub use config::ServerConfig;
pub use request::{decode_batch, PathRequestParser, RequestParser};
pub use router::create_router;
pub use state::AppState;
