//! SQLite backend for sessionkit.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. One [`SqliteBackend`] serves as both
//! the entity lookup and the session store.

mod encode;
mod schema;
mod store;

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::Settings;
pub use store::SqliteBackend;
