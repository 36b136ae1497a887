// HTTP API routes
//
// Each submodule handles a specific resource type with its own AppState.

pub mod common;
pub mod events;
pub mod responders;

// Re-export common types
pub use common::ErrorResponse;
