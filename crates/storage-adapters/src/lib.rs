//! # storage-adapters
//!
//! Persistence backends for the repository ports. `MemoryStore` is always
//! available; `PgStore` is compiled with the `db-postgres` feature.

pub mod memory;

#[cfg(feature = "db-postgres")]
pub mod postgres;

pub use memory::MemoryStore;

#[cfg(feature = "db-postgres")]
pub use postgres::PgStore;
