//! Music-store catalog core.
//!
//! Typed CRUD over the store's entities and relations, name-to-id
//! resolution for the display strings the UI trades in, a per-user action
//! trail, account management, and the fixed analytics views. The
//! presentation layer lives elsewhere; the binaries in this crate are thin
//! shells over the library.

pub mod analytics;
pub mod audit;
pub mod catalog_store;
pub mod config;
pub mod display;
pub mod sqlite_persistence;
pub mod user;
pub mod validation;

// Re-export commonly used types for convenience
pub use analytics::Report;
pub use audit::{ActionKind, AuditLogFilter, AuditLogger};
pub use catalog_store::{ResolveMode, SqliteCatalogStore};
pub use sqlite_persistence::Gateway;
pub use user::{SqliteUserStore, UserRole, UserStore};
