// Outreach Control Plane Library
// Decision: Shared library for the server binary and router tests

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Router assembly
pub mod app;

// Environment configuration
pub mod config;

// Services layer
pub mod services;
pub use services::{EventService, ResponderService};

// Storage layer
pub mod storage;

// OpenAPI spec generation
pub mod openapi;

pub use app::build_app;
pub use config::ServerConfig;
