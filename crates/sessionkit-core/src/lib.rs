//! Session-bound entity resolution.
//!
//! Given the identity of the logged-in user, resolve:
//!
//! - the user entity itself ([`user::UserResolver`]),
//! - the single entity that points at the user through a declared property
//!   ([`subject::SubjectResolver`]),
//! - an ordered list of entities kept in the user's session
//!   ([`collection::SubjectCollection`]).
//!
//! Storage is abstracted behind [`lookup::EntityLookup`] and
//! [`session::SessionStore`]; this crate ships an in-memory implementation of
//! both and is otherwise free of database dependencies.

// Native `async fn` in traits; the traits spell out their `Send` bounds.
#![allow(async_fn_in_trait)]

pub mod collection;
pub mod context;
pub mod entity;
pub mod error;
pub mod identity;
pub mod lookup;
pub mod memory;
pub mod registry;
pub mod session;
pub mod subject;
pub mod user;

pub use error::{Error, ErrorKind, Result};

#[cfg(test)]
mod tests;
