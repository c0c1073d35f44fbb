//! Client library for the entries approval API.
//!
//! - [`api`]: HTTP client with bearer-token handling and one call per endpoint
//! - [`session`]: persisted token and cached user
//! - [`routes`]: path-to-view table
//! - [`config`]: `config.toml` loading and path resolution

pub mod api;
pub mod config;
pub mod logging;
pub mod routes;
pub mod session;
