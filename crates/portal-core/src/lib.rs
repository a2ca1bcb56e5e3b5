// Client core for the portal platform, without any front-end dependencies

pub mod ai;
pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod push;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use state::AppState;
