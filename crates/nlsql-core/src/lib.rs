//! Core types and pipeline for the nlsql natural-language → SQL service.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! knowledge store, relational schema source and language model are reached
//! through the traits in [`store`], [`schema`] and [`model`]; backends live in
//! sibling crates.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod clean;
pub mod curator;
pub mod dialect;
pub mod document;
pub mod embed;
pub mod error;
pub mod fallback;
pub mod feedback;
pub mod generator;
pub mod library;
pub mod model;
pub mod prompt;
pub mod retriever;
pub mod schema;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
