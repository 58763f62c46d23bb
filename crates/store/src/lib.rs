//! `sewa-store` — credential-store implementations.
//!
//! Two backends for the `sewa_auth::UserStore` seam: an in-memory map
//! (default for local runs and tests) and Postgres via sqlx.

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;
