// Storage layer for the thesis portal
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// - StorageBackend: enum dispatch over Database (PostgreSQL) and InMemoryDatabase
// - DbProfileStore: implements the core ProfileStore trait for the session guard

pub mod backend;
pub mod memory;
pub mod models;
pub mod password;
pub mod profile_store;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use profile_store::DbProfileStore;
pub use repositories::Database;
