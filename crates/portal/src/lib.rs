pub mod cli;
pub mod commands;
pub mod error;

pub use portal_core::{ai, api, config, document, push, services, store, utils};
