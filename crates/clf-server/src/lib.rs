//! # clf-server
//!
//! HTTP front end for the voice classifier.
//!
//! Routes:
//! - `POST /predict` - multipart upload with an `audio` field
//! - `GET /health` - liveness probe with model metadata

mod error;
mod handlers;
mod router;
mod state;

pub use error::ApiError;
pub use handlers::HealthResponse;
pub use router::{init, serve, ServerConfig};
pub use state::AppState;
