//! Wiring for the `accidb` binary: configuration, input decoding and the
//! transform-then-load pipeline.

pub mod config;
pub mod error;
pub mod input;
pub mod pipeline;

pub use config::IngestConfig;
pub use error::{Error, Result};
pub use pipeline::{RunSummary, run};
