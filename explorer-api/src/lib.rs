//! HTTP API over the DAO explorer governance engine.

pub mod cache;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use cache::ResponseCache;
pub use config::ApiConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
