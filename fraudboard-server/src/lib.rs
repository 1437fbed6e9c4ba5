//! fraudboard-server: HTTP dashboard over the cached query layer
//!
//! Serves one HTML page plus JSON endpoints exposing the same data.

pub mod error;
pub mod render;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{build_router, run_server, ServerConfig, ServerError};
pub use state::AppState;
