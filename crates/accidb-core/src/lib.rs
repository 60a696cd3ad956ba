//! Core types and trait definitions for the accident ingestion pipeline.
//!
//! This crate has no HTTP or database dependencies. Source adapters, the
//! model-assisted extractor and the storage backend all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod batch;
pub mod cache;
pub mod entity;
pub mod error;
pub mod extract;
pub mod identity;
pub mod normalize;
pub mod record;
pub mod store;

pub use error::{Error, ExtractionError, Result, UnnormalizableRecord};
