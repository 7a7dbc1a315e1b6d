// HTTP API routes
//
// This module contains the HTTP route handlers for pages and the JSON API.
// Each submodule handles a specific resource type with its own state.

pub mod common;
pub mod pages;
pub mod profile;
pub mod uploads;

// Re-export common types
pub use common::{ApiError, ErrorResponse, ListResponse};
