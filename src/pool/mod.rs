//! Connection pool lifecycle management.
//!
//! [`ConnectionPoolManager`] keeps exactly one live pool per server and
//! serializes pool replacement per key. Connection checkout concurrency
//! within a pool is delegated to `sqlx`.

pub mod manager;

pub use manager::ConnectionPoolManager;
