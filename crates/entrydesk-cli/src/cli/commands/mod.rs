//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod entries;
pub mod routes;

use entrydesk_core::api::ApiResponse;

/// Prints a response body as pretty JSON (or nothing for an empty body).
pub fn print_data(response: &ApiResponse) {
    if response.data.is_null() {
        return;
    }
    match serde_json::to_string_pretty(&response.data) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{}", response.data),
    }
}
