// Storage layer for the outreach control plane
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// - Database: sqlx repository over PgPool
// - StorageBackend: enum dispatch implementing the core EventStore and ResponderStore traits

pub mod backend;
pub mod models;
pub mod repositories;

pub use backend::StorageBackend;
pub use models::*;
pub use repositories::Database;
