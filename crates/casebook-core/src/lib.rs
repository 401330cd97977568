//! Core types and trait definitions for the Casebook repository layer.
//!
//! This crate is deliberately free of database dependencies. Storage
//! backends (`casebook-store-memory`, `casebook-store-sqlite`) implement the
//! traits in [`store`]; everything that must behave identically across
//! backends (ordering, cursors, similarity ranking, field validation) lives
//! here so both adapters share one implementation.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod error;
pub mod field;
pub mod model;
pub mod pagination;
pub mod record;
pub mod similarity;
pub mod store;

#[cfg(feature = "conformance")]
pub mod conformance;

pub use error::{Error, Result};
pub use record::EntityKind;
